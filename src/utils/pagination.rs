use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json, RequestPartsExt,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: PaginatedMeta,
}

#[derive(Serialize, Clone)]
pub struct PaginatedMeta {
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, per_page: u32) -> Paginated<T> {
        Self {
            items,
            meta: PaginatedMeta {
                total,
                page,
                per_page,
            },
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Pagination {
    /// Number of documents to skip for the current page.
    pub fn skip(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    10
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Pagination {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extract::<Query<Pagination>>().await {
            Ok(Query(pagination)) => Ok(pagination),
            _ => Err((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid pagination options"})),
            )
                .into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_skips_nothing() {
        let pagination = Pagination {
            page: 1,
            per_page: 10,
        };
        assert_eq!(pagination.skip(), 0);
        assert_eq!(pagination.limit(), 10);
    }

    #[test]
    fn later_pages_skip_previous_items() {
        let pagination = Pagination {
            page: 3,
            per_page: 25,
        };
        assert_eq!(pagination.skip(), 50);
    }

    #[test]
    fn page_zero_is_treated_as_the_first_page() {
        let pagination = Pagination {
            page: 0,
            per_page: 10,
        };
        assert_eq!(pagination.skip(), 0);
    }

    #[test]
    fn defaults_apply_when_query_is_empty() {
        let pagination: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.per_page, 10);
    }
}
