//! Generic CRUD client for one REST resource.
//!
//! Every backend entity exposes the same surface under its path:
//!
//! | operation       | method | path                         |
//! |-----------------|--------|------------------------------|
//! | inserir         | POST   | `<path>`                     |
//! | alterar         | PUT    | `<path>/<id>`                |
//! | listar          | GET    | `<path>?<query>`             |
//! | buscar_por_id   | GET    | `<path>/<id>`                |
//! | action          | PUT    | `<path>/<action>/<id>`       |
//!
//! Non-2xx responses become [`ApiError::Http`] carrying the server's message
//! when the body has one, otherwise the operation's generic message.

use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use query_core::{PagedResult, QueryParams, QueryStyle};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{extract_error_message, ApiError, ApiResult};
use crate::http::client::TracedClient;
use crate::ui::source::{ListSource, SearchSource};
use crate::validate::Validate;

/// Human-readable names used in generic error messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceNames {
    pub singular: String,
    pub plural: String,
}

impl ResourceNames {
    pub fn new(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            singular: singular.into(),
            plural: plural.into(),
        }
    }
}

/// Client for the resource at `<base>/<path>`.
///
/// `E` is the entity read back from the server, `D` the DTO sent on
/// create/update.
pub struct RestResource<E, D> {
    client: TracedClient,
    base: Url,
    path: String,
    names: ResourceNames,
    _marker: PhantomData<fn() -> (E, D)>,
}

impl<E, D> Clone for RestResource<E, D> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            base: self.base.clone(),
            path: self.path.clone(),
            names: self.names.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E, D> RestResource<E, D>
where
    E: DeserializeOwned,
    D: Serialize + Validate,
{
    pub fn new(client: TracedClient, base: Url, path: impl Into<String>, names: ResourceNames) -> Self {
        Self {
            client,
            base,
            path: path.into(),
            names,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn names(&self) -> &ResourceNames {
        &self.names
    }

    /// `<base>/<path>/<extra...>`, preserving any path prefix on `base`.
    pub fn url(&self, extra: &[&str]) -> ApiResult<Url> {
        let mut url = self.base.clone();
        {
            let mut segs = url
                .path_segments_mut()
                .map_err(|_| ApiError::network(format!("base url cannot hold a path: {}", self.base)))?;
            segs.pop_if_empty();
            segs.extend(self.path.split('/').filter(|s| !s.is_empty()));
            segs.extend(extra.iter().copied());
        }
        Ok(url)
    }

    #[instrument(name = "rest.inserir", skip_all, fields(resource = %self.path))]
    pub async fn inserir(&self, dto: &D) -> ApiResult<()> {
        dto.validate()?;
        let url = self.url(&[])?;
        let fallback = format!("Erro ao inserir {}.", self.names.singular);
        self.send(self.client.request(Method::POST, url).json(dto), &fallback)
            .await
            .map(drop)
    }

    #[instrument(name = "rest.alterar", skip_all, fields(resource = %self.path, id = %id))]
    pub async fn alterar(&self, id: impl Display + Send, dto: &D) -> ApiResult<()> {
        dto.validate()?;
        let id = id.to_string();
        let url = self.url(&[id.as_str()])?;
        let fallback = format!("Erro ao alterar {}.", self.names.singular);
        self.send(self.client.request(Method::PUT, url).json(dto), &fallback)
            .await
            .map(drop)
    }

    #[instrument(name = "rest.listar", skip_all, fields(resource = %self.path))]
    pub async fn listar(&self, params: &QueryParams) -> ApiResult<PagedResult<E>> {
        let mut url = self.url(&[])?;
        url.set_query(Some(&params.to_query_string()));
        debug!(query = url.query().unwrap_or_default(), "listing");
        let fallback = format!("Erro ao listar {}.", self.names.plural);
        let resp = self
            .send(self.client.request(Method::GET, url), &fallback)
            .await?;
        decode(resp).await
    }

    #[instrument(name = "rest.buscar_por_id", skip_all, fields(resource = %self.path, id = %id))]
    pub async fn buscar_por_id(&self, id: impl Display + Send) -> ApiResult<E> {
        let id = id.to_string();
        let url = self.url(&[id.as_str()])?;
        let fallback = format!("Erro ao buscar {}.", self.names.singular);
        let resp = self
            .send(self.client.request(Method::GET, url), &fallback)
            .await?;
        decode(resp).await
    }

    /// `PUT <path>/<action>/<id>` with an empty body.
    #[instrument(name = "rest.action", skip_all, fields(resource = %self.path, action = %action, id = %id))]
    pub async fn action(&self, action: &str, id: impl Display + Send) -> ApiResult<()> {
        let id = id.to_string();
        let url = self.url(&[action, id.as_str()])?;
        let fallback = format!("Erro ao atualizar {}.", self.names.singular);
        self.send(self.client.request(Method::PUT, url), &fallback)
            .await
            .map(drop)
    }

    /// Flip the active flag of one record.
    pub async fn ativar_inativar(&self, id: impl Display + Send) -> ApiResult<()> {
        self.action("AtivarInativar", id).await
    }

    async fn send(&self, builder: reqwest::RequestBuilder, fallback: &str) -> ApiResult<reqwest::Response> {
        let resp = self.client.send(builder).await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = extract_error_message(&body, fallback);
        debug!(status = status.as_u16(), %message, "request rejected");
        Err(ApiError::http(status.as_u16(), message))
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> ApiResult<T> {
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::decode(e.to_string()))
}

#[async_trait]
impl<E, D> ListSource<E> for RestResource<E, D>
where
    E: DeserializeOwned + Send + 'static,
    D: Serialize + Validate + Sync + 'static,
{
    async fn fetch_page(&self, params: &QueryParams) -> ApiResult<PagedResult<E>> {
        self.listar(params).await
    }
}

/// Typeahead search over a resource's list endpoint: one field, ascending
/// by that field, fixed page size.
pub struct ResourceSearch<E, D> {
    resource: Arc<RestResource<E, D>>,
    field: String,
    style: QueryStyle,
    page_size: u32,
}

impl<E, D> ResourceSearch<E, D> {
    pub fn new(
        resource: Arc<RestResource<E, D>>,
        field: impl Into<String>,
        style: QueryStyle,
        page_size: u32,
    ) -> Self {
        Self {
            resource,
            field: field.into(),
            style,
            page_size,
        }
    }

    /// Query sent for `term` on `page`.
    pub fn params(&self, term: &str, page: u32) -> QueryParams {
        QueryParams::new(self.page_size, self.style)
            .with_search(&self.field, term)
            .with_sort(&self.field, false)
            .with_page(page)
    }
}

#[async_trait]
impl<E, D> SearchSource<E> for ResourceSearch<E, D>
where
    E: DeserializeOwned + Send + 'static,
    D: Serialize + Validate + Sync + 'static,
{
    async fn search(&self, term: &str, page: u32) -> ApiResult<PagedResult<E>> {
        self.resource.listar(&self.params(term, page)).await
    }
}
