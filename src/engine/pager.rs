use crate::error::{AppError, PagingParameter, PagingProblem};

/// Parses a raw `page`/`limit` query value into a positive integer.
pub fn parse_param(param: PagingParameter, raw: Option<&str>) -> Result<usize, AppError> {
    let value: i64 = raw
        .map(str::trim)
        .ok_or(AppError::InvalidPagingParameter(param, PagingProblem::NotInteger))?
        .parse()
        .map_err(|_| AppError::InvalidPagingParameter(param, PagingProblem::NotInteger))?;

    if value <= 0 {
        return Err(AppError::InvalidPagingParameter(param, PagingProblem::NotPositive));
    }

    usize::try_from(value)
        .map_err(|_| AppError::InvalidPagingParameter(param, PagingProblem::NotInteger))
}

/// Returns the 1-based `page_number`-th chunk of `items` split into chunks of
/// `page_size`. The last chunk may be shorter.
pub fn page<T>(items: Vec<T>, page_number: usize, page_size: usize) -> Result<Vec<T>, AppError> {
    if page_number == 0 {
        return Err(AppError::InvalidPagingParameter(
            PagingParameter::Page,
            PagingProblem::NotPositive,
        ));
    }
    if page_size == 0 {
        return Err(AppError::InvalidPagingParameter(
            PagingParameter::Limit,
            PagingProblem::NotPositive,
        ));
    }

    let total = items.len().div_ceil(page_size);
    if page_number > total {
        return Err(AppError::PageOutOfRange {
            page: page_number,
            total,
        });
    }

    let start = (page_number - 1) * page_size;
    Ok(items.into_iter().skip(start).take(page_size).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_concatenate_back_to_the_input() {
        let items: Vec<u32> = (1..=23).collect();

        for size in 1..=30 {
            let total = items.len().div_ceil(size);
            let mut joined = Vec::new();
            for number in 1..=total {
                let chunk = page(items.clone(), number, size).unwrap();
                assert!(!chunk.is_empty());
                assert!(chunk.len() <= size);
                joined.extend(chunk);
            }
            assert_eq!(joined, items, "page size {size}");

            assert!(matches!(
                page(items.clone(), total + 1, size),
                Err(AppError::PageOutOfRange { .. })
            ));
        }
    }

    #[test]
    fn last_page_may_be_short() {
        let items: Vec<u32> = (1..=7).collect();
        assert_eq!(page(items.clone(), 2, 5).unwrap(), vec![6, 7]);
        assert_eq!(page(items, 1, 5).unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn empty_input_has_no_pages() {
        let err = page(Vec::<u32>::new(), 1, 10).unwrap_err();
        assert!(matches!(err, AppError::PageOutOfRange { page: 1, total: 0 }));
    }

    #[test]
    fn zero_page_or_size_is_rejected() {
        assert!(matches!(
            page(vec![1, 2, 3], 1, 0),
            Err(AppError::InvalidPagingParameter(PagingParameter::Limit, PagingProblem::NotPositive))
        ));
        assert!(matches!(
            page(vec![1, 2, 3], 0, 2),
            Err(AppError::InvalidPagingParameter(PagingParameter::Page, PagingProblem::NotPositive))
        ));
    }

    #[test]
    fn params_must_be_positive_integers() {
        assert_eq!(parse_param(PagingParameter::Page, Some("3")).unwrap(), 3);
        assert_eq!(parse_param(PagingParameter::Limit, Some(" 10 ")).unwrap(), 10);

        for raw in [Some("abc"), Some("1.5"), Some(""), None] {
            assert!(matches!(
                parse_param(PagingParameter::Page, raw),
                Err(AppError::InvalidPagingParameter(PagingParameter::Page, PagingProblem::NotInteger))
            ));
        }
        for raw in ["0", "-4"] {
            assert!(matches!(
                parse_param(PagingParameter::Limit, Some(raw)),
                Err(AppError::InvalidPagingParameter(PagingParameter::Limit, PagingProblem::NotPositive))
            ));
        }
    }
}
