//! Debounced search-and-select picker.
//!
//! The host feeds raw input events ([`Typeahead::input`], [`Typeahead::key`],
//! clicks) and renders [`TypeaheadView`]. Remote searches wait for a quiet
//! period after the last keystroke; Enter and page clicks search at once.
//! A result is only shown while the input still holds the term it was
//! fetched for.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::ui::debounce::{Debouncer, Ticket};
use crate::ui::source::{Labeled, SearchSource};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Enter,
    Backspace,
    Delete,
    ArrowUp,
    ArrowDown,
    Escape,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Panel {
    Closed,
    Open,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageButton {
    pub number: u32,
    /// The page currently displayed; rendered disabled.
    pub current: bool,
}

#[derive(Clone, Debug)]
pub struct TypeaheadView<T> {
    pub text: String,
    pub selected: Option<T>,
    pub panel: Panel,
    pub results: Vec<T>,
    pub highlighted: Option<usize>,
    pub page: u32,
    pub total_pages: u32,
    pub loading: bool,
    /// A search for the current text has completed.
    pub searched: bool,
}

impl<T> TypeaheadView<T> {
    fn empty() -> Self {
        Self {
            text: String::new(),
            selected: None,
            panel: Panel::Closed,
            results: Vec::new(),
            highlighted: None,
            page: 1,
            total_pages: 0,
            loading: false,
            searched: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.panel == Panel::Open
    }

    /// The panel should render its "no results" row.
    pub fn shows_no_results(&self) -> bool {
        self.is_open() && self.searched && !self.loading && self.results.is_empty()
    }

    pub fn page_buttons(&self) -> Vec<PageButton> {
        (1..=self.total_pages)
            .map(|number| PageButton {
                number,
                current: number == self.page,
            })
            .collect()
    }

    fn clear_results(&mut self) {
        self.results.clear();
        self.highlighted = None;
        self.page = 1;
        self.total_pages = 0;
        self.loading = false;
        self.searched = false;
    }
}

type SelectFn<T> = Box<dyn Fn(&T) + Send + Sync>;
type ClearFn = Box<dyn Fn() + Send + Sync>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    Show,
    SelectFirst,
}

struct Inner<T> {
    source: Arc<dyn SearchSource<T>>,
    on_select: Option<SelectFn<T>>,
    on_clear: Option<ClearFn>,
    view: watch::Sender<TypeaheadView<T>>,
    debouncer: Debouncer,
    cancel: CancellationToken,
}

pub struct TypeaheadBuilder<T> {
    source: Arc<dyn SearchSource<T>>,
    debounce: Duration,
    on_select: Option<SelectFn<T>>,
    on_clear: Option<ClearFn>,
}

impl<T> TypeaheadBuilder<T>
where
    T: Labeled + Clone + Send + Sync + 'static,
{
    pub fn debounce(mut self, delay: Duration) -> Self {
        self.debounce = delay;
        self
    }

    /// Called with the chosen item on every selection.
    pub fn on_select(mut self, f: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_select = Some(Box::new(f));
        self
    }

    /// Called whenever a previous selection is discarded by the user.
    pub fn on_clear(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_clear = Some(Box::new(f));
        self
    }

    pub fn build(self) -> Typeahead<T> {
        let (view, _) = watch::channel(TypeaheadView::empty());
        Typeahead {
            inner: Arc::new(Inner {
                source: self.source,
                on_select: self.on_select,
                on_clear: self.on_clear,
                view,
                debouncer: Debouncer::new(self.debounce),
                cancel: CancellationToken::new(),
            }),
        }
    }
}

/// Typeahead over any [`SearchSource`].
///
/// Event methods that start a search return its task handle; must be used
/// from within a Tokio runtime.
pub struct Typeahead<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Typeahead<T>
where
    T: Labeled + Clone + Send + Sync + 'static,
{
    pub fn builder(source: Arc<dyn SearchSource<T>>) -> TypeaheadBuilder<T> {
        TypeaheadBuilder {
            source,
            debounce: DEFAULT_DEBOUNCE,
            on_select: None,
            on_clear: None,
        }
    }

    pub fn view(&self) -> TypeaheadView<T> {
        self.inner.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TypeaheadView<T>> {
        self.inner.view.subscribe()
    }

    /// The input text changed.
    pub fn input(&self, text: impl Into<String>) -> Option<JoinHandle<()>> {
        let text = text.into();
        let mut cleared = false;
        let changed = self.inner.view.send_if_modified(|v| {
            if v.text == text {
                return false;
            }
            v.text = text.clone();
            if v.selected.take().is_some() {
                cleared = true;
            }
            v.clear_results();
            if text.is_empty() {
                v.panel = Panel::Closed;
            } else {
                v.panel = Panel::Open;
                v.loading = true;
            }
            true
        });

        if cleared {
            self.inner.fire_clear();
        }
        if !changed {
            return None;
        }
        if text.is_empty() {
            self.inner.debouncer.cancel();
            return None;
        }
        let inner = Arc::clone(&self.inner);
        Some(
            self.inner
                .debouncer
                .schedule(move |ticket| inner.fetch(ticket, text, 1, FetchMode::Show)),
        )
    }

    pub fn key(&self, key: Key) -> Option<JoinHandle<()>> {
        match key {
            Key::Enter => self.enter(),
            Key::Backspace | Key::Delete => {
                let had_selection = self.inner.view.send_if_modified(|v| {
                    if v.selected.take().is_none() {
                        return false;
                    }
                    v.text.clear();
                    v.panel = Panel::Closed;
                    v.clear_results();
                    true
                });
                if had_selection {
                    self.inner.debouncer.cancel();
                    self.inner.fire_clear();
                }
                None
            }
            Key::ArrowDown => {
                self.move_highlight(1);
                None
            }
            Key::ArrowUp => {
                self.move_highlight(-1);
                None
            }
            Key::Escape => {
                self.outside_click();
                None
            }
        }
    }

    /// Select the result at `index` in the displayed list.
    pub fn click_result(&self, index: usize) {
        let item = {
            let v = self.inner.view.borrow();
            if !v.is_open() {
                return;
            }
            v.results.get(index).cloned()
        };
        if let Some(item) = item {
            self.inner.commit(item);
        }
    }

    /// Fetch another page of results for the current text.
    pub fn click_page(&self, page: u32) -> Option<JoinHandle<()>> {
        let mut term = None;
        self.inner.view.send_if_modified(|v| {
            if !v.is_open() || page == v.page || page == 0 || page > v.total_pages {
                return false;
            }
            v.loading = true;
            term = Some(v.text.clone());
            true
        });
        let term = term?;
        let inner = Arc::clone(&self.inner);
        Some(
            self.inner
                .debouncer
                .fire_now(move |ticket| inner.fetch(ticket, term, page, FetchMode::Show)),
        )
    }

    /// Close the panel; the text reverts to the selection's label, or empty.
    pub fn outside_click(&self) {
        self.inner.debouncer.cancel();
        self.inner.view.send_if_modified(|v| {
            let label = v.selected.as_ref().map(Labeled::label).unwrap_or_default();
            if !v.is_open() && v.text == label {
                return false;
            }
            v.text = label;
            v.panel = Panel::Closed;
            v.clear_results();
            true
        });
    }

    /// Replace the selection from outside (e.g. when a form loads a record).
    /// Callbacks are not invoked.
    pub fn set_selected(&self, item: Option<T>) {
        self.inner.debouncer.cancel();
        self.inner.view.send_modify(|v| {
            v.text = item.as_ref().map(Labeled::label).unwrap_or_default();
            v.selected = item;
            v.panel = Panel::Closed;
            v.clear_results();
        });
    }

    fn enter(&self) -> Option<JoinHandle<()>> {
        let (pick, term) = {
            let v = self.inner.view.borrow();
            if v.is_open() && !v.results.is_empty() {
                let idx = v.highlighted.unwrap_or(0).min(v.results.len() - 1);
                (v.results.get(idx).cloned(), None)
            } else if v.selected.is_none() && !v.text.is_empty() {
                (None, Some(v.text.clone()))
            } else {
                (None, None)
            }
        };

        if let Some(item) = pick {
            self.inner.commit(item);
            return None;
        }
        let term = term?;
        self.inner.view.send_modify(|v| {
            v.panel = Panel::Open;
            v.loading = true;
        });
        let inner = Arc::clone(&self.inner);
        Some(
            self.inner
                .debouncer
                .fire_now(move |ticket| inner.fetch(ticket, term, 1, FetchMode::SelectFirst)),
        )
    }

    fn move_highlight(&self, step: isize) {
        self.inner.view.send_if_modified(|v| {
            if !v.is_open() || v.results.is_empty() {
                return false;
            }
            let last = v.results.len() - 1;
            let next = match (v.highlighted, step) {
                (None, _) => 0,
                (Some(i), s) if s > 0 => (i + 1).min(last),
                (Some(i), _) => i.saturating_sub(1),
            };
            let moved = v.highlighted != Some(next);
            v.highlighted = Some(next);
            moved
        });
    }
}

impl<T> Inner<T>
where
    T: Labeled + Clone + Send + Sync + 'static,
{
    async fn fetch(self: Arc<Self>, ticket: Ticket, term: String, page: u32, mode: FetchMode) {
        let result = tokio::select! {
            _ = self.cancel.cancelled() => return,
            r = self.source.search(&term, page) => r,
        };

        let mut pick = None;
        let applied = self.view.send_if_modified(|v| {
            if self.cancel.is_cancelled()
                || !self.debouncer.is_current(ticket)
                || !v.is_open()
                || v.text != term
            {
                return false;
            }
            match result {
                Ok(found) => {
                    v.results = found.items;
                    v.total_pages = found.total_pages;
                }
                Err(err) => {
                    debug!(error = %err, term = %term, "typeahead search failed");
                    v.results.clear();
                    v.total_pages = 0;
                }
            }
            v.page = page;
            v.loading = false;
            v.searched = true;
            v.highlighted = if v.results.is_empty() { None } else { Some(0) };
            if mode == FetchMode::SelectFirst {
                pick = v.results.first().cloned();
            }
            true
        });

        if !applied {
            debug!(term = %term, page, "stale typeahead result discarded");
            return;
        }
        if let Some(item) = pick {
            self.select(item);
        }
    }

    /// Abandon pending searches and select `item`.
    fn commit(&self, item: T) {
        self.debouncer.cancel();
        self.select(item);
    }

    fn select(&self, item: T) {
        let label = item.label();
        self.view.send_modify(|v| {
            v.text = label;
            v.selected = Some(item.clone());
            v.panel = Panel::Closed;
            v.clear_results();
        });
        if let Some(cb) = &self.on_select {
            cb(&item);
        }
    }

    fn fire_clear(&self) {
        if let Some(cb) = &self.on_clear {
            cb();
        }
    }
}

impl<T> Drop for Typeahead<T> {
    fn drop(&mut self) {
        self.inner.cancel.cancel();
        self.inner.debouncer.cancel();
    }
}
