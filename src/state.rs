use std::sync::Arc;

use crate::engine::lifecycle::OrderService;
use crate::error::AppError;
use crate::geo::distance::DistanceResolver;
use crate::observability::metrics::Metrics;
use crate::store::OrderStore;

pub struct AppState {
    pub orders: OrderService,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(store: OrderStore, resolver: Arc<dyn DistanceResolver>) -> Result<Self, AppError> {
        let metrics = Metrics::new()
            .map_err(|err| AppError::Internal(format!("failed to register metrics: {err}")))?;

        Ok(Self {
            orders: OrderService::new(store, resolver, metrics.clone()),
            metrics,
        })
    }
}
