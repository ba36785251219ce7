use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use console_kit::{ResourceNames, RestResource, Session, TracedClient, Validate};
use runtime::ConsoleConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::contract::error::UnknownEntity;
use crate::contract::model::{
    Cliente, ClienteDto, Estoque, EstoqueDto, Item, ItemDto, Os, OsDto, Servico, ServicoDto,
    Unidade, UnidadeDto,
};

pub type ClienteResource = RestResource<Cliente, ClienteDto>;
pub type ItemResource = RestResource<Item, ItemDto>;
pub type ServicoResource = RestResource<Servico, ServicoDto>;
pub type UnidadeResource = RestResource<Unidade, UnidadeDto>;
pub type EstoqueResource = RestResource<Estoque, EstoqueDto>;
pub type OsResource = RestResource<Os, OsDto>;

/// Backend resources managed by the console.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Cliente,
    Item,
    Servico,
    Unidade,
    Estoque,
    Os,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Cliente,
        EntityKind::Item,
        EntityKind::Servico,
        EntityKind::Unidade,
        EntityKind::Estoque,
        EntityKind::Os,
    ];

    /// Path of the resource under the API base.
    pub fn path(self) -> &'static str {
        match self {
            EntityKind::Cliente => "Cadastros/Cliente",
            EntityKind::Item => "Item",
            EntityKind::Servico => "Servico",
            EntityKind::Unidade => "Unidade",
            EntityKind::Estoque => "Estoque",
            EntityKind::Os => "Os",
        }
    }

    pub fn names(self) -> ResourceNames {
        let (singular, plural) = match self {
            EntityKind::Cliente => ("cliente", "clientes"),
            EntityKind::Item => ("item", "itens"),
            EntityKind::Servico => ("serviço", "serviços"),
            EntityKind::Unidade => ("unidade", "unidades"),
            EntityKind::Estoque => ("estoque", "estoques"),
            EntityKind::Os => ("ordem de serviço", "ordens de serviço"),
        };
        ResourceNames::new(singular, plural)
    }

    /// Route segment used by screen navigation.
    pub fn slug(self) -> &'static str {
        match self {
            EntityKind::Cliente => "cliente",
            EntityKind::Item => "item",
            EntityKind::Servico => "servico",
            EntityKind::Unidade => "unidade",
            EntityKind::Estoque => "estoque",
            EntityKind::Os => "os",
        }
    }

    /// Edit screen route of one record.
    pub fn edit_route(self, id: impl fmt::Display) -> String {
        format!("/alterar/{}/{id}", self.slug())
    }

    /// Kind served at `path`, compared case-insensitively.
    pub fn from_path(path: &str) -> Option<EntityKind> {
        let path = path.trim_matches('/');
        EntityKind::ALL
            .into_iter()
            .find(|k| k.path().eq_ignore_ascii_case(path))
    }

    /// The resource exposes `AtivarInativar`.
    pub fn supports_toggle(self) -> bool {
        matches!(self, EntityKind::Item | EntityKind::Servico | EntityKind::Estoque)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for EntityKind {
    type Err = UnknownEntity;

    /// Accepts the slug or the plural form, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        EntityKind::ALL
            .into_iter()
            .find(|k| {
                let names = k.names();
                needle == k.slug()
                    || needle == names.plural
                    || needle == format!("{}s", k.slug())
                    || needle == k.path().to_lowercase()
            })
            .ok_or_else(|| UnknownEntity(s.to_string()))
    }
}

/// All Meraki OS resources bound to one HTTP client.
#[derive(Clone)]
pub struct MerakiApi {
    client: TracedClient,
    base: Url,
    pub clientes: Arc<ClienteResource>,
    pub itens: Arc<ItemResource>,
    pub servicos: Arc<ServicoResource>,
    pub unidades: Arc<UnidadeResource>,
    pub estoques: Arc<EstoqueResource>,
    pub ordens: Arc<OsResource>,
}

impl MerakiApi {
    pub fn new(client: TracedClient, base: Url) -> Self {
        Self {
            clientes: bind(&client, &base, EntityKind::Cliente),
            itens: bind(&client, &base, EntityKind::Item),
            servicos: bind(&client, &base, EntityKind::Servico),
            unidades: bind(&client, &base, EntityKind::Unidade),
            estoques: bind(&client, &base, EntityKind::Estoque),
            ordens: bind(&client, &base, EntityKind::Os),
            client,
            base,
        }
    }

    /// Build from configuration: base URL, request timeout, and the
    /// configured token (if any) seeded into `session`.
    pub fn from_config(cfg: &ConsoleConfig, session: Session) -> anyhow::Result<Self> {
        let base = cfg.base_url()?;
        if let Some(token) = cfg.api.token.as_deref().filter(|t| !t.trim().is_empty()) {
            session.set(token, session.user());
        }
        let client = TracedClient::with_timeout(cfg.timeout(), session)
            .context("failed to build HTTP client")?;
        Ok(Self::new(client, base))
    }

    pub fn client(&self) -> &TracedClient {
        &self.client
    }

    pub fn session(&self) -> &Session {
        self.client.session()
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }
}

fn bind<E, D>(client: &TracedClient, base: &Url, kind: EntityKind) -> Arc<RestResource<E, D>>
where
    E: DeserializeOwned,
    D: Serialize + Validate,
{
    Arc::new(RestResource::new(client.clone(), base.clone(), kind.path(), kind.names()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_parses_slugs_plurals_and_paths() {
        assert_eq!("clientes".parse::<EntityKind>().unwrap(), EntityKind::Cliente);
        assert_eq!("Itens".parse::<EntityKind>().unwrap(), EntityKind::Item);
        assert_eq!("servicos".parse::<EntityKind>().unwrap(), EntityKind::Servico);
        assert_eq!("cadastros/cliente".parse::<EntityKind>().unwrap(), EntityKind::Cliente);
        assert_eq!("os".parse::<EntityKind>().unwrap(), EntityKind::Os);
        assert!("pedidos".parse::<EntityKind>().is_err());
    }

    #[test]
    fn edit_route_uses_slug() {
        assert_eq!(EntityKind::Estoque.edit_route(7), "/alterar/estoque/7");
        assert!(EntityKind::Item.supports_toggle());
        assert!(!EntityKind::Cliente.supports_toggle());
    }

    #[test]
    fn resources_are_rooted_at_base() {
        let base = Url::parse("http://api.local/v1/").unwrap();
        let api = MerakiApi::new(TracedClient::default(), base);
        assert_eq!(
            api.clientes.url(&["abc"]).unwrap().as_str(),
            "http://api.local/v1/Cadastros/Cliente/abc"
        );
        assert_eq!(api.ordens.path(), "Os");
        assert_eq!(api.servicos.names().plural, "serviços");
    }

    #[test]
    fn from_config_seeds_configured_token() {
        let mut cfg = ConsoleConfig::default();
        cfg.api.token = Some("tok".into());
        let session = Session::new();
        let api = MerakiApi::from_config(&cfg, session.clone()).unwrap();
        assert_eq!(session.token().as_deref(), Some("tok"));
        assert!(api.session().is_authenticated());
    }
}
