//! Sorting, name search and inclusive index ranges shared by list endpoints.

use std::cmp::Ordering;

use serde::Deserialize;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Case-insensitive substring match; no query matches everything.
pub fn name_matches(name: &str, query: Option<&str>) -> bool {
    match query.map(str::trim) {
        None | Some("") => true,
        Some(query) => name.to_lowercase().contains(&query.to_lowercase()),
    }
}

/// Keeps positions `from..=to`. A missing `to` runs to the end.
pub fn select_range<T>(
    items: Vec<T>,
    from: Option<usize>,
    to: Option<usize>,
) -> Result<Vec<T>, AppError> {
    let from = from.unwrap_or(0);
    let take = match to {
        Some(to) if to < from => {
            return Err(AppError::InvalidInput(format!(
                "range end {to} is before start {from}"
            )));
        }
        Some(to) => to - from + 1,
        None => usize::MAX,
    };

    Ok(items.into_iter().skip(from).take(take).collect())
}
