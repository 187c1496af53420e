//! Pagination over insertion-ordered listings

use crate::outcome::{ApiError, ErrorCode};
use crate::params::RawParams;

/// Upper bound accepted for `MaxResults`
const MAX_PAGE_SIZE: i64 = 1000;

/// One page of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

/// Slice `items` according to `MaxResults` / `NextToken`
///
/// `explicit_ids` marks requests that named records by id; those cannot be
/// paginated.
pub fn paginate<T>(
    items: Vec<T>,
    params: &RawParams,
    explicit_ids: bool,
) -> Result<Page<T>, ApiError> {
    let max_results = params.int("MaxResults")?;
    let token = params.scalar("NextToken");

    if max_results.is_none() && token.is_none() {
        return Ok(Page {
            items,
            next_token: None,
        });
    }
    if explicit_ids {
        return Err(ApiError::new(
            ErrorCode::InvalidParameterCombination,
            "The parameter MaxResults cannot be used with a list of resource ids",
        ));
    }

    let size = match max_results {
        Some(n) if !(1..=MAX_PAGE_SIZE).contains(&n) => {
            return Err(ApiError::invalid_value("MaxResults", &n.to_string()));
        }
        Some(n) => n as usize,
        None => MAX_PAGE_SIZE as usize,
    };
    let start = match token {
        Some(raw) => raw
            .parse::<usize>()
            .ok()
            .filter(|offset| *offset <= items.len())
            .ok_or_else(|| ApiError::invalid_value("NextToken", raw))?,
        None => 0,
    };

    let end = (start + size).min(items.len());
    let next_token = (end < items.len()).then(|| end.to_string());
    let items = items.into_iter().skip(start).take(end - start).collect();

    Ok(Page { items, next_token })
}
