//! List-query contract shared by every list screen: pagination, sort and
//! filter criteria, their query-string form, and the paged result shape
//! returned by the API.

mod codec;
mod error;
mod page;

pub use codec::{parse, serialize};
pub use error::Error;
pub use page::{total_pages, PagedResult};

use serde::{Deserialize, Serialize};

/// Page size used when a screen does not configure its own.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Which criteria shape a backend resource understands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStyle {
    /// `searchBy` + `searchTerm`
    #[default]
    SearchPair,
    /// `filters=key:value,key:value`
    FilterMap,
}

/// Insertion-ordered map of backend field name to filter value.
///
/// Upserting an existing key keeps its original position, so the
/// serialized `filters` parameter is stable across edits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterMap(Vec<(String, String)>);

impl FilterMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert or replace `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => Some(std::mem::replace(v, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(idx).1)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries that survive serialization (trimmed value non-empty).
    pub fn effective(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(_, v)| !v.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FilterMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Search/filter half of the query, tagged by the style the resource expects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Criteria {
    Search {
        search_by: Option<String>,
        search_term: Option<String>,
    },
    Filters {
        entries: FilterMap,
        /// Field written by the last `set_search`, so a new search field
        /// replaces it instead of piling up entries.
        search_key: Option<String>,
    },
}

impl Criteria {
    pub fn empty(style: QueryStyle) -> Self {
        match style {
            QueryStyle::SearchPair => Criteria::Search {
                search_by: None,
                search_term: None,
            },
            QueryStyle::FilterMap => Criteria::Filters {
                entries: FilterMap::new(),
                search_key: None,
            },
        }
    }

    pub fn style(&self) -> QueryStyle {
        match self {
            Criteria::Search { .. } => QueryStyle::SearchPair,
            Criteria::Filters { .. } => QueryStyle::FilterMap,
        }
    }
}

/// In-memory list query: page, sort and criteria.
///
/// Mutators follow the list-screen rules: anything that changes *what*
/// is listed (search, filters, page size) goes back to page 1, while sort
/// and explicit page changes keep the current page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryParams {
    pub(crate) page_number: u32,
    pub(crate) page_size: u32,
    pub(crate) sort_by: Option<String>,
    pub(crate) sort_descending: bool,
    pub(crate) criteria: Criteria,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, QueryStyle::SearchPair)
    }
}

impl QueryParams {
    pub fn new(page_size: u32, style: QueryStyle) -> Self {
        Self {
            page_number: 1,
            page_size: page_size.max(1),
            sort_by: None,
            sort_descending: false,
            criteria: Criteria::empty(style),
        }
    }

    // ---- builder-style helpers for presets ----

    pub fn with_sort(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.sort_by = Some(field.into());
        self.sort_descending = descending;
        self
    }

    pub fn with_page(mut self, page_number: u32) -> Self {
        self.page_number = page_number;
        self
    }

    pub fn with_search(mut self, field: impl Into<String>, term: impl Into<String>) -> Self {
        self.set_search(Some(field.into()), Some(term.into()));
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_filter(key, value);
        self
    }

    // ---- accessors ----

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn sort_by(&self) -> Option<&str> {
        self.sort_by.as_deref()
    }

    pub fn sort_descending(&self) -> bool {
        self.sort_descending
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn style(&self) -> QueryStyle {
        self.criteria.style()
    }

    /// Current search pair, whichever variant holds it.
    pub fn search(&self) -> (Option<&str>, Option<&str>) {
        match &self.criteria {
            Criteria::Search {
                search_by,
                search_term,
            } => (search_by.as_deref(), search_term.as_deref()),
            Criteria::Filters {
                entries,
                search_key,
            } => {
                let key = search_key.as_deref();
                (key, key.and_then(|k| entries.get(k)))
            }
        }
    }

    /// Filter entries, empty for the search-pair variant.
    pub fn filters(&self) -> Option<&FilterMap> {
        match &self.criteria {
            Criteria::Filters { entries, .. } => Some(entries),
            Criteria::Search { .. } => None,
        }
    }

    // ---- mutators ----

    /// Set the free-text search. On the filter variant this writes the
    /// equivalent `field → term` entry, dropping the previous search field.
    pub fn set_search(&mut self, field: Option<String>, term: Option<String>) {
        match &mut self.criteria {
            Criteria::Search {
                search_by,
                search_term,
            } => {
                *search_by = field;
                *search_term = term;
            }
            Criteria::Filters {
                entries,
                search_key,
            } => {
                if let Some(prev) = search_key.take() {
                    if field.as_deref() != Some(prev.as_str()) {
                        entries.remove(&prev);
                    }
                }
                if let Some(field) = field {
                    entries.insert(field.clone(), term.unwrap_or_default());
                    *search_key = Some(field);
                }
            }
        }
        self.page_number = 1;
    }

    /// Re-selecting the current field flips direction; a new field starts ascending.
    pub fn set_sort(&mut self, field: impl Into<String>) {
        let field = field.into();
        self.sort_descending = match self.sort_by.as_deref() {
            Some(current) if current == field => !self.sort_descending,
            _ => false,
        };
        self.sort_by = Some(field);
    }

    /// No clamping: callers check `1..=total_pages` before calling.
    pub fn set_page(&mut self, page_number: u32) {
        self.page_number = page_number;
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.max(1);
        self.page_number = 1;
    }

    /// Upsert one filter entry. An empty value is kept here and dropped at
    /// serialization time. On the search-pair variant the entry becomes the
    /// search pair.
    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        match &mut self.criteria {
            Criteria::Filters { entries, .. } => {
                entries.insert(key, value);
            }
            Criteria::Search {
                search_by,
                search_term,
            } => {
                *search_by = Some(key.into());
                *search_term = Some(value.into());
            }
        }
        self.page_number = 1;
    }

    /// Drop a filter entry entirely.
    pub fn remove_filter(&mut self, key: &str) {
        match &mut self.criteria {
            Criteria::Filters {
                entries,
                search_key,
            } => {
                entries.remove(key);
                if search_key.as_deref() == Some(key) {
                    *search_key = None;
                }
            }
            Criteria::Search {
                search_by,
                search_term,
            } => {
                if search_by.as_deref() == Some(key) {
                    *search_by = None;
                    *search_term = None;
                }
            }
        }
        self.page_number = 1;
    }

    /// Serialize to the backend query string.
    pub fn to_query_string(&self) -> String {
        serialize(self)
    }
}
