//! Meraki OS console: entity model, resource clients, list screen presets
//! and lookup pickers built on `console-kit`.

pub mod contract;
mod domain;
pub mod infra;
pub mod lookups;
pub mod screens;

pub use contract::client::{
    ClienteResource, EntityKind, EstoqueResource, ItemResource, MerakiApi, OsResource,
    ServicoResource, UnidadeResource,
};
pub use contract::error::UnknownEntity;
pub use contract::model::*;
pub use infra::auth::{AuthApi, AuthResponse};
pub use screens::{open_for_edit, ListScreen, SearchField, StatusFilter};
