//! List screen presets and the fetch-for-edit flow.
//!
//! A [`ListScreen`] bundles what one list page needs besides its rows: the
//! resource it reads, the criteria shape the backend understands, the
//! search-field picker, the optional status filter, and the text shown when
//! a fetch fails.

use std::fmt::Display;
use std::sync::Arc;

use console_kit::{
    ListController, ListOptions, ListSource, Navigator, Notification, Notifier, QueryParams,
    QueryStyle, RestResource, Validate,
};
use query_core::DEFAULT_PAGE_SIZE;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::contract::client::{EntityKind, MerakiApi};
use crate::contract::model::{Cliente, Estoque, Item, Os, Servico, Unidade};

/// One entry of a screen's "search by" picker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchField {
    pub value: &'static str,
    pub label: &'static str,
}

/// Status picker shown next to the search box. `"all"` means no filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusFilter {
    pub field: &'static str,
    pub options: &'static [SearchField],
}

pub const ALL: &str = "all";

const CLIENTE_FIELDS: &[SearchField] = &[
    SearchField { value: "Nome", label: "Nome" },
    SearchField { value: "Cpf", label: "CPF" },
    SearchField { value: "Identificacao", label: "Identificação" },
];

const CATALOG_FIELDS: &[SearchField] = &[
    SearchField { value: "Descricao", label: "Descrição" },
    SearchField { value: "Identificacao", label: "Identificação" },
];

const UNIDADE_FIELDS: &[SearchField] = &[
    SearchField { value: "Sigla", label: "Sigla" },
    SearchField { value: "Descricao", label: "Descrição" },
];

const ESTOQUE_FIELDS: &[SearchField] = &[SearchField { value: "Descricao", label: "Descrição" }];

const OS_FIELDS: &[SearchField] = &[SearchField { value: "Observacao", label: "Observação" }];

const TIPO_PESSOA: StatusFilter = StatusFilter {
    field: "TipoPessoa",
    options: &[
        SearchField { value: ALL, label: "Todos" },
        SearchField { value: "0", label: "Pessoa Física" },
        SearchField { value: "1", label: "Pessoa Jurídica" },
    ],
};

const ATIVO: StatusFilter = StatusFilter {
    field: "Ativo",
    options: &[
        SearchField { value: ALL, label: "Todos" },
        SearchField { value: "1", label: "Ativo" },
        SearchField { value: "0", label: "Inativo" },
    ],
};

/// Stock lists are narrowed to one item through this filter key.
pub const ITEM_FILTER_KEY: &str = "IdItem";

type SourceFn<E> = fn(&MerakiApi) -> Arc<dyn ListSource<E>>;

/// Preset of one entity's list page.
pub struct ListScreen<E> {
    pub kind: EntityKind,
    pub title: &'static str,
    pub style: QueryStyle,
    pub search_fields: &'static [SearchField],
    pub status_filter: Option<StatusFilter>,
    pub failure_message: &'static str,
    pub page_size: u32,
    source: SourceFn<E>,
}

impl<E> Clone for ListScreen<E> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            title: self.title,
            style: self.style,
            search_fields: self.search_fields,
            status_filter: self.status_filter,
            failure_message: self.failure_message,
            page_size: self.page_size,
            source: self.source,
        }
    }
}

fn source<E, D>(resource: &Arc<RestResource<E, D>>) -> Arc<dyn ListSource<E>>
where
    E: DeserializeOwned + Send + 'static,
    D: Serialize + Validate + Send + Sync + 'static,
{
    resource.clone()
}

impl<E> ListScreen<E>
where
    E: Clone + Send + Sync + 'static,
{
    fn preset(kind: EntityKind, title: &'static str, failure_message: &'static str, source: SourceFn<E>) -> Self {
        Self {
            kind,
            title,
            style: QueryStyle::SearchPair,
            search_fields: &[],
            status_filter: None,
            failure_message,
            page_size: DEFAULT_PAGE_SIZE,
            source,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Parameters the screen mounts with and resets to.
    pub fn defaults(&self) -> QueryParams {
        QueryParams::new(self.page_size, self.style)
    }

    pub fn options(&self) -> ListOptions {
        ListOptions::new(self.failure_message)
    }

    /// First entry of the search picker, preselected on the page.
    pub fn default_search_field(&self) -> Option<&'static str> {
        self.search_fields.first().map(|f| f.value)
    }

    /// Case-insensitive lookup of a picker entry by value or label.
    pub fn search_field(&self, name: &str) -> Option<SearchField> {
        self.search_fields
            .iter()
            .find(|f| f.value.eq_ignore_ascii_case(name) || f.label.eq_ignore_ascii_case(name))
            .copied()
    }

    /// Search criteria for the search box and status picker.
    ///
    /// A non-blank term wins. With no term, a status other than
    /// [`ALL`] becomes the search pair. Otherwise the search is cleared.
    pub fn search_criteria(
        &self,
        field: &str,
        term: &str,
        status: Option<&str>,
    ) -> (Option<String>, Option<String>) {
        let term = term.trim();
        if !term.is_empty() {
            return (Some(field.to_string()), Some(term.to_string()));
        }
        match (self.status_filter, status) {
            (Some(filter), Some(value)) if value != ALL && !value.is_empty() => {
                (Some(filter.field.to_string()), Some(value.to_string()))
            }
            _ => (None, None),
        }
    }

    /// Apply the search box to a mounted controller.
    pub fn search(
        &self,
        ctl: &ListController<E>,
        field: &str,
        term: &str,
        status: Option<&str>,
    ) -> JoinHandle<()> {
        let (by, term) = self.search_criteria(field, term, status);
        ctl.set_search(by, term)
    }

    /// Mount a controller on this screen's resource.
    pub fn mount(&self, api: &MerakiApi, notifier: Arc<dyn Notifier>) -> ListController<E> {
        debug!(screen = self.title, page_size = self.page_size, "mounting list");
        ListController::mount((self.source)(api), notifier, self.defaults(), self.options())
    }
}

pub fn clientes() -> ListScreen<Cliente> {
    ListScreen {
        search_fields: CLIENTE_FIELDS,
        status_filter: Some(TIPO_PESSOA),
        ..ListScreen::preset(
            EntityKind::Cliente,
            "Clientes",
            "Não foi possível carregar os clientes.",
            |api| source(&api.clientes),
        )
    }
}

pub fn itens() -> ListScreen<Item> {
    ListScreen {
        search_fields: CATALOG_FIELDS,
        status_filter: Some(ATIVO),
        ..ListScreen::preset(
            EntityKind::Item,
            "Itens",
            "Não foi possível carregar os Itens.",
            |api| source(&api.itens),
        )
    }
}

pub fn servicos() -> ListScreen<Servico> {
    ListScreen {
        search_fields: CATALOG_FIELDS,
        status_filter: Some(ATIVO),
        ..ListScreen::preset(
            EntityKind::Servico,
            "Serviços",
            "Não foi possível carregar os serviços.",
            |api| source(&api.servicos),
        )
    }
}

pub fn unidades() -> ListScreen<Unidade> {
    ListScreen {
        search_fields: UNIDADE_FIELDS,
        ..ListScreen::preset(
            EntityKind::Unidade,
            "Unidades",
            "Não foi possível carregar as unidades.",
            |api| source(&api.unidades),
        )
    }
}

pub fn estoques() -> ListScreen<Estoque> {
    ListScreen {
        style: QueryStyle::FilterMap,
        search_fields: ESTOQUE_FIELDS,
        ..ListScreen::preset(
            EntityKind::Estoque,
            "Estoque",
            "Não foi possível carregar os Estoques.",
            |api| source(&api.estoques),
        )
    }
}

pub fn ordens() -> ListScreen<Os> {
    ListScreen {
        search_fields: OS_FIELDS,
        ..ListScreen::preset(
            EntityKind::Os,
            "Ordens de serviço",
            "Não foi possível carregar as ordens de serviço.",
            |api| source(&api.ordens),
        )
    }
}

/// Narrow a stock list to one item, or drop the narrowing with `None`.
pub fn filter_by_item(ctl: &ListController<Estoque>, item: Option<&Item>) -> JoinHandle<()> {
    match item {
        Some(item) => ctl.set_filter(ITEM_FILTER_KEY, item.id.to_string()),
        None => ctl.remove_filter(ITEM_FILTER_KEY),
    }
}

/// Fetch one record for its edit screen.
///
/// On success navigates to the edit route and returns the record. On
/// failure the user is notified with the server's message (or the generic
/// "Erro ao buscar ...") and nothing is navigated.
pub async fn open_for_edit<E, D>(
    resource: &RestResource<E, D>,
    id: impl Display + Send,
    navigator: &dyn Navigator,
    notifier: &dyn Notifier,
) -> Option<E>
where
    E: DeserializeOwned,
    D: Serialize + Validate,
{
    let id = id.to_string();
    match resource.buscar_por_id(&id).await {
        Ok(entity) => {
            navigator.navigate(&edit_route(resource.path(), &id));
            Some(entity)
        }
        Err(err) => {
            warn!(resource = resource.path(), %id, error = %err, "failed to open record for edit");
            notifier.notify(Notification::error("Erro", err.user_message()));
            None
        }
    }
}

fn edit_route(path: &str, id: &str) -> String {
    match EntityKind::from_path(path) {
        Some(kind) => kind.edit_route(id),
        None => {
            let slug = path.rsplit('/').next().unwrap_or(path).to_lowercase();
            format!("/alterar/{slug}/{id}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_carry_style_and_failure_text() {
        assert_eq!(estoques().style, QueryStyle::FilterMap);
        assert_eq!(clientes().style, QueryStyle::SearchPair);
        assert_eq!(itens().failure_message, "Não foi possível carregar os Itens.");
        assert_eq!(clientes().default_search_field(), Some("Nome"));
        assert_eq!(
            clientes().search_field("cpf"),
            Some(SearchField { value: "Cpf", label: "CPF" })
        );
    }

    #[test]
    fn defaults_use_configured_page_size() {
        let params = unidades().with_page_size(25).defaults();
        assert_eq!(params.page_size(), 25);
        assert_eq!(params.page_number(), 1);
        assert_eq!(params.sort_by(), None);
        assert_eq!(unidades().with_page_size(0).page_size, 1);
        assert_eq!(estoques().defaults().style(), QueryStyle::FilterMap);
    }

    #[test]
    fn term_wins_over_status_filter() {
        let screen = itens();
        assert_eq!(
            screen.search_criteria("Descricao", " parafuso ", Some("1")),
            (Some("Descricao".into()), Some("parafuso".into()))
        );
        assert_eq!(
            screen.search_criteria("Descricao", "", Some("0")),
            (Some("Ativo".into()), Some("0".into()))
        );
        assert_eq!(screen.search_criteria("Descricao", "", Some(ALL)), (None, None));
        assert_eq!(unidades().search_criteria("Sigla", "", Some("1")), (None, None));
    }
}
