//! List screen controller.
//!
//! Owns the screen's [`QueryParams`] and re-fetches whenever they change.
//! State is published through a `tokio::sync::watch` channel so any number
//! of views can observe it.
//!
//! Fetches never block each other; each one carries a [`Ticket`] and only the
//! most recently issued one may write its result into the state.

use std::sync::Arc;

use parking_lot::Mutex;
use query_core::QueryParams;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::notify::{Notification, Notifier};
use crate::ui::debounce::{RequestSequencer, Ticket};
use crate::ui::source::ListSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Snapshot of one list screen.
#[derive(Clone, Debug)]
pub struct ListState<E> {
    pub status: ListStatus,
    /// Parameters of the most recently requested fetch.
    pub params: QueryParams,
    pub items: Vec<E>,
    pub total_count: u64,
    pub total_pages: u32,
    /// User-facing reason of the last failed fetch.
    pub error: Option<String>,
}

impl<E> ListState<E> {
    fn initial(params: QueryParams) -> Self {
        Self {
            status: ListStatus::Idle,
            params,
            items: Vec::new(),
            total_count: 0,
            total_pages: 0,
            error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == ListStatus::Loading
    }
}

/// Texts shown when a fetch fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListOptions {
    pub failure_title: String,
    pub failure_message: String,
}

impl ListOptions {
    pub fn new(failure_message: impl Into<String>) -> Self {
        Self {
            failure_title: "Erro".to_string(),
            failure_message: failure_message.into(),
        }
    }
}

struct ListInner<E> {
    source: Arc<dyn ListSource<E>>,
    notifier: Arc<dyn Notifier>,
    options: ListOptions,
    defaults: QueryParams,
    params: Mutex<QueryParams>,
    sequencer: RequestSequencer,
    state: watch::Sender<ListState<E>>,
    cancel: CancellationToken,
}

/// Controller behind one list screen.
///
/// Every setter updates the parameters and starts a fetch; the returned
/// handle resolves once that fetch has been applied or discarded.
pub struct ListController<E> {
    inner: Arc<ListInner<E>>,
}

impl<E> ListController<E>
where
    E: Clone + Send + Sync + 'static,
{
    /// Create the controller and start the initial fetch with `defaults`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount(
        source: Arc<dyn ListSource<E>>,
        notifier: Arc<dyn Notifier>,
        defaults: QueryParams,
        options: ListOptions,
    ) -> Self {
        let (state, _) = watch::channel(ListState::initial(defaults.clone()));
        let inner = Arc::new(ListInner {
            source,
            notifier,
            options,
            params: Mutex::new(defaults.clone()),
            defaults,
            sequencer: RequestSequencer::new(),
            state,
            cancel: CancellationToken::new(),
        });
        let ctl = Self { inner };
        let _ = ctl.update(|_| {});
        ctl
    }

    pub fn state(&self) -> ListState<E> {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListState<E>> {
        self.inner.state.subscribe()
    }

    pub fn params(&self) -> QueryParams {
        self.inner.params.lock().clone()
    }

    /// Wait until no fetch is outstanding and return the resulting state.
    pub async fn settled(&self) -> ListState<E> {
        let mut rx = self.subscribe();
        let settled = match rx.wait_for(|s| s.status != ListStatus::Loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    pub fn set_search(&self, field: Option<String>, term: Option<String>) -> JoinHandle<()> {
        self.update(|p| p.set_search(field, term))
    }

    pub fn set_sort(&self, field: impl Into<String>) -> JoinHandle<()> {
        let field = field.into();
        self.update(|p| p.set_sort(field))
    }

    pub fn set_page(&self, page_number: u32) -> JoinHandle<()> {
        self.update(|p| p.set_page(page_number))
    }

    pub fn set_page_size(&self, page_size: u32) -> JoinHandle<()> {
        self.update(|p| p.set_page_size(page_size))
    }

    pub fn set_filter(&self, key: impl Into<String>, value: impl Into<String>) -> JoinHandle<()> {
        let (key, value) = (key.into(), value.into());
        self.update(|p| p.set_filter(key, value))
    }

    pub fn remove_filter(&self, key: &str) -> JoinHandle<()> {
        self.update(|p| p.remove_filter(key))
    }

    /// Back to the screen's default parameters.
    pub fn reset(&self) -> JoinHandle<()> {
        let defaults = self.inner.defaults.clone();
        self.update(|p| *p = defaults)
    }

    /// Re-fetch with unchanged parameters.
    pub fn refresh(&self) -> JoinHandle<()> {
        self.update(|_| {})
    }

    /// Stop all outstanding fetches; later results are never applied.
    pub fn close(&self) {
        self.inner.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    fn update(&self, change: impl FnOnce(&mut QueryParams)) -> JoinHandle<()> {
        let mut params = self.inner.params.lock();
        change(&mut params);
        let snapshot = params.clone();
        let ticket = self.inner.sequencer.issue();
        self.inner.state.send_modify(|s| {
            s.status = ListStatus::Loading;
            s.params = snapshot.clone();
            s.error = None;
        });
        drop(params);

        debug!(query = %snapshot.to_query_string(), "list fetch scheduled");
        let inner = Arc::clone(&self.inner);
        tokio::spawn(inner.run(ticket, snapshot))
    }
}

impl<E> ListInner<E>
where
    E: Clone + Send + Sync + 'static,
{
    async fn run(self: Arc<Self>, ticket: Ticket, params: QueryParams) {
        let result = tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!("list fetch cancelled");
                return;
            }
            r = self.source.fetch_page(&params) => r,
        };

        match result {
            Ok(page) => {
                let applied = self.state.send_if_modified(|s| {
                    if !self.accepts(ticket) {
                        return false;
                    }
                    s.status = ListStatus::Ready;
                    s.items = page.items;
                    s.total_count = page.total_count;
                    s.total_pages = page.total_pages;
                    s.error = None;
                    true
                });
                if !applied {
                    debug!("stale list result discarded");
                }
            }
            Err(err) => {
                let reason = err.user_message();
                let applied = self.state.send_if_modified(|s| {
                    if !self.accepts(ticket) {
                        return false;
                    }
                    s.status = ListStatus::Failed;
                    s.items.clear();
                    s.total_count = 0;
                    s.total_pages = 0;
                    s.error = Some(reason);
                    true
                });
                if applied {
                    warn!(error = %err, "list fetch failed");
                    self.notifier.notify(Notification::error(
                        self.options.failure_title.clone(),
                        self.options.failure_message.clone(),
                    ));
                } else {
                    debug!(error = %err, "stale list failure discarded");
                }
            }
        }
    }

    fn accepts(&self, ticket: Ticket) -> bool {
        !self.cancel.is_cancelled() && self.sequencer.is_current(ticket)
    }
}

impl<E> Drop for ListController<E> {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
    }
}
