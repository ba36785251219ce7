use async_trait::async_trait;
use query_core::{PagedResult, QueryParams};

use crate::error::ApiResult;

/// Paged data behind a list screen.
#[async_trait]
pub trait ListSource<E>: Send + Sync {
    async fn fetch_page(&self, params: &QueryParams) -> ApiResult<PagedResult<E>>;
}

/// Free-text search behind a typeahead.
#[async_trait]
pub trait SearchSource<T>: Send + Sync {
    async fn search(&self, term: &str, page: u32) -> ApiResult<PagedResult<T>>;
}

/// Display text of an entity inside a picker.
pub trait Labeled {
    fn label(&self) -> String;
}
