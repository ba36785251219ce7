use url::form_urlencoded;

use crate::{Criteria, Error, FilterMap, QueryParams, DEFAULT_PAGE_SIZE};

/// Serialize `params` into the query string the list endpoints expect.
///
/// `pageNumber`, `pageSize` and `sortDescending` are always present.
/// `searchBy`/`searchTerm` appear only with a non-empty term; `filters`
/// only when at least one entry has a non-blank value. `sortBy` comes last
/// and only when set.
pub fn serialize(params: &QueryParams) -> String {
    let mut out = form_urlencoded::Serializer::new(String::new());
    out.append_pair("pageNumber", &params.page_number.to_string());
    out.append_pair("pageSize", &params.page_size.to_string());
    out.append_pair("sortDescending", if params.sort_descending { "true" } else { "false" });

    match &params.criteria {
        Criteria::Search {
            search_by,
            search_term,
        } => {
            if let Some(term) = search_term.as_deref().filter(|t| !t.is_empty()) {
                if let Some(by) = search_by.as_deref().filter(|b| !b.is_empty()) {
                    out.append_pair("searchBy", by);
                }
                out.append_pair("searchTerm", term);
            }
        }
        Criteria::Filters { entries, .. } => {
            let joined = entries
                .effective()
                .map(|(k, v)| format!("{k}:{v}"))
                .collect::<Vec<_>>()
                .join(",");
            if !joined.is_empty() {
                out.append_pair("filters", &joined);
            }
        }
    }

    if let Some(sort_by) = params.sort_by.as_deref().filter(|s| !s.is_empty()) {
        out.append_pair("sortBy", sort_by);
    }

    out.finish()
}

/// Parse a query string produced by [`serialize`] (a leading `?` is accepted).
///
/// The variant is inferred: a `filters` parameter selects the filter-map
/// form, anything else the search pair. Missing page fields fall back to
/// page 1 and [`DEFAULT_PAGE_SIZE`].
pub fn parse(query: &str) -> Result<QueryParams, Error> {
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut page_number = 1;
    let mut page_size = DEFAULT_PAGE_SIZE;
    let mut sort_by = None;
    let mut sort_descending = false;
    let mut search_by = None;
    let mut search_term = None;
    let mut filters: Option<FilterMap> = None;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "pageNumber" => page_number = parse_positive(&value, Error::InvalidPageNumber)?,
            "pageSize" => page_size = parse_positive(&value, Error::InvalidPageSize)?,
            "sortDescending" => {
                sort_descending = match value.as_ref() {
                    "true" => true,
                    "false" => false,
                    other => return Err(Error::InvalidSortDirection(other.to_string())),
                }
            }
            "sortBy" => sort_by = Some(value.into_owned()).filter(|s| !s.is_empty()),
            "searchBy" => search_by = Some(value.into_owned()).filter(|s| !s.is_empty()),
            "searchTerm" => search_term = Some(value.into_owned()).filter(|s| !s.is_empty()),
            "filters" => filters = Some(parse_filters(&value)?),
            _ => {}
        }
    }

    let criteria = match filters {
        Some(_) if search_by.is_some() || search_term.is_some() => {
            return Err(Error::MixedCriteria)
        }
        Some(entries) => Criteria::Filters {
            entries,
            search_key: None,
        },
        None => Criteria::Search {
            search_by,
            search_term,
        },
    };

    Ok(QueryParams {
        page_number,
        page_size,
        sort_by,
        sort_descending,
        criteria,
    })
}

fn parse_positive(raw: &str, err: fn(String) -> Error) -> Result<u32, Error> {
    match raw.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(err(raw.to_string())),
    }
}

/// Entries are `key:value` joined by `,`. Values are not escaped, so a
/// segment without `:` continues the previous value.
fn parse_filters(raw: &str) -> Result<FilterMap, Error> {
    let mut entries: Vec<(String, String)> = Vec::new();
    for segment in raw.split(',') {
        match segment.split_once(':') {
            Some(("", _)) => return Err(Error::InvalidFilter(segment.to_string())),
            Some((key, value)) => entries.push((key.to_string(), value.to_string())),
            None => match entries.last_mut() {
                Some((_, value)) => {
                    value.push(',');
                    value.push_str(segment);
                }
                None if segment.is_empty() => {}
                None => return Err(Error::InvalidFilter(segment.to_string())),
            },
        }
    }
    Ok(entries.into_iter().collect())
}
