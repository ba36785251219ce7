//! Typeahead pickers used inside forms and list filters.

use std::sync::Arc;

use console_kit::{QueryStyle, ResourceSearch, SearchSource, Typeahead, TypeaheadBuilder};
use runtime::ConsoleConfig;

use crate::contract::client::MerakiApi;
use crate::contract::model::{Item, Unidade};

pub const UNIDADE_FIELD: &str = "sigla";
pub const ITEM_FIELD: &str = "descricao";

/// Units by `sigla`, sent as a search pair.
pub fn unidades(api: &MerakiApi, page_size: u32) -> Arc<dyn SearchSource<Unidade>> {
    Arc::new(ResourceSearch::new(
        api.unidades.clone(),
        UNIDADE_FIELD,
        QueryStyle::SearchPair,
        page_size,
    ))
}

/// Items by `descricao`, sent as a filter entry.
pub fn itens(api: &MerakiApi, page_size: u32) -> Arc<dyn SearchSource<Item>> {
    Arc::new(ResourceSearch::new(
        api.itens.clone(),
        ITEM_FIELD,
        QueryStyle::FilterMap,
        page_size,
    ))
}

/// Unit picker with the configured debounce and page size.
pub fn unidade_picker(api: &MerakiApi, cfg: &ConsoleConfig) -> TypeaheadBuilder<Unidade> {
    Typeahead::builder(unidades(api, cfg.typeahead.page_size)).debounce(cfg.debounce())
}

/// Item picker with the configured debounce and page size.
pub fn item_picker(api: &MerakiApi, cfg: &ConsoleConfig) -> TypeaheadBuilder<Item> {
    Typeahead::builder(itens(api, cfg.typeahead.page_size)).debounce(cfg.debounce())
}
