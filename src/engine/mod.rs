pub mod lifecycle;
pub mod pager;
