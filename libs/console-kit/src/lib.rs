//! # Console Kit
//!
//! Headless building blocks for list/form screens backed by a REST API.
//!
//! - [`TracedClient`]: reqwest wrapper adding JSON headers, the session's
//!   bearer token and an `outgoing_http` span to every request.
//! - [`RestResource`]: generic CRUD client for one resource path.
//! - [`ListController`]: owns one [`QueryParams`] per list screen and
//!   re-fetches on every change, last request wins.
//! - [`Typeahead`]: debounced search-and-select state machine.
//! - [`Debouncer`] / [`RequestSequencer`]: the cancellation primitive both
//!   controllers share.
//!
//! Notifications and navigation are injected through [`Notifier`] and
//! [`Navigator`]; the kit never owns UI.

pub mod error;
pub mod http;
pub mod notify;
pub mod rest;
pub mod session;
pub mod ui;
pub mod validate;

pub use error::{extract_error_message, ApiError, ApiResult};
pub use http::client::TracedClient;
pub use notify::{Navigator, Notification, Notifier, Severity, TracingNavigator, TracingNotifier};
pub use rest::{ResourceNames, ResourceSearch, RestResource};
pub use session::{Session, UserInfo};
pub use ui::debounce::{Debouncer, RequestSequencer, Ticket};
pub use ui::list::{ListController, ListOptions, ListState, ListStatus};
pub use ui::source::{Labeled, ListSource, SearchSource};
pub use ui::typeahead::{Key, PageButton, Panel, Typeahead, TypeaheadBuilder, TypeaheadView};
pub use validate::{FieldError, Validate, ValidationErrors};

pub use query_core::{PagedResult, QueryParams, QueryStyle};
