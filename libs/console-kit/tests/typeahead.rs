use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use console_kit::{
    ApiResult, Key, Labeled, PageButton, PagedResult, Panel, SearchSource, Typeahead,
};
use parking_lot::Mutex;
use tokio::time::sleep;

#[derive(Clone, Debug, PartialEq)]
struct Unit {
    sigla: String,
}

impl Labeled for Unit {
    fn label(&self) -> String {
        self.sigla.clone()
    }
}

const PAGE: usize = 2;

struct FakeSearch {
    catalog: Vec<&'static str>,
    delays_ms: HashMap<&'static str, u64>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl FakeSearch {
    fn new(catalog: Vec<&'static str>) -> Self {
        Self {
            catalog,
            delays_ms: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl SearchSource<Unit> for FakeSearch {
    async fn search(&self, term: &str, page: u32) -> ApiResult<PagedResult<Unit>> {
        self.calls.lock().push((term.to_string(), page));
        if let Some(ms) = self.delays_ms.get(term) {
            sleep(Duration::from_millis(*ms)).await;
        }
        let matches: Vec<Unit> = self
            .catalog
            .iter()
            .filter(|s| s.contains(term))
            .map(|s| Unit { sigla: s.to_string() })
            .collect();
        let total = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip((page as usize - 1) * PAGE)
            .take(PAGE)
            .collect();
        Ok(PagedResult::new(items, total, page, PAGE as u32))
    }
}

struct Harness {
    source: Arc<FakeSearch>,
    picker: Typeahead<Unit>,
    selected: Arc<Mutex<Vec<String>>>,
    clears: Arc<Mutex<usize>>,
}

fn harness(source: FakeSearch) -> Harness {
    let source = Arc::new(source);
    let selected = Arc::new(Mutex::new(Vec::new()));
    let clears = Arc::new(Mutex::new(0));
    let (sel, clr) = (selected.clone(), clears.clone());
    let picker = Typeahead::<Unit>::builder(source.clone())
        .debounce(Duration::from_millis(500))
        .on_select(move |u: &Unit| sel.lock().push(u.sigla.clone()))
        .on_clear(move || *clr.lock() += 1)
        .build();
    Harness {
        source,
        picker,
        selected,
        clears,
    }
}

fn catalog() -> Vec<&'static str> {
    vec!["abcde", "abcdf", "abcdz", "abx", "xyz"]
}

#[tokio::test(start_paused = true)]
async fn keystrokes_inside_window_collapse_into_one_search() {
    let h = harness(FakeSearch::new(catalog()));

    let first = h.picker.input("abc").expect("search scheduled");
    sleep(Duration::from_millis(200)).await;
    let last = h.picker.input("abcd").expect("search scheduled");
    last.await.unwrap();
    let _ = first.await;

    assert_eq!(h.source.calls(), vec![("abcd".to_string(), 1)]);
    let view = h.picker.view();
    assert_eq!(view.results.len(), 2);
    assert_eq!(view.total_pages, 2);
    assert!(!view.loading);
}

#[tokio::test(start_paused = true)]
async fn search_waits_for_quiet_period() {
    let h = harness(FakeSearch::new(catalog()));

    let _task = h.picker.input("ab");
    assert_eq!(h.picker.view().panel, Panel::Open);
    sleep(Duration::from_millis(499)).await;
    assert!(h.source.calls().is_empty());
    sleep(Duration::from_millis(2)).await;
    assert_eq!(h.source.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_stale_result_is_never_displayed() {
    let mut source = FakeSearch::new(catalog());
    source.delays_ms.insert("a", 2_000);
    let h = harness(source);

    let slow = h.picker.input("a").expect("scheduled");
    sleep(Duration::from_millis(600)).await;
    let fast = h.picker.input("ab").expect("scheduled");
    fast.await.unwrap();
    let _ = slow.await;
    sleep(Duration::from_millis(3_000)).await;

    let view = h.picker.view();
    assert_eq!(view.text, "ab");
    assert!(view.results.iter().all(|u| u.sigla.contains("ab")));
    assert_eq!(h.source.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn enter_searches_immediately_and_selects_first() {
    let h = harness(FakeSearch::new(catalog()));

    let _pending = h.picker.input("abx");
    h.picker.key(Key::Enter).expect("immediate search").await.unwrap();

    let view = h.picker.view();
    assert_eq!(view.selected, Some(Unit { sigla: "abx".into() }));
    assert_eq!(view.text, "abx");
    assert_eq!(view.panel, Panel::Closed);
    assert_eq!(*h.selected.lock(), vec!["abx".to_string()]);

    sleep(Duration::from_millis(1_000)).await;
    assert_eq!(h.source.calls(), vec![("abx".to_string(), 1)]);
}

#[tokio::test(start_paused = true)]
async fn enter_with_no_match_selects_nothing() {
    let h = harness(FakeSearch::new(catalog()));

    h.picker.input("qqq");
    h.picker.key(Key::Enter).expect("search").await.unwrap();

    let view = h.picker.view();
    assert!(view.selected.is_none());
    assert!(view.shows_no_results());
    assert!(h.selected.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn enter_on_results_picks_highlighted_row() {
    let h = harness(FakeSearch::new(catalog()));

    h.picker.input("abcd").expect("scheduled").await.unwrap();
    assert_eq!(h.picker.view().highlighted, Some(0));

    h.picker.key(Key::ArrowDown);
    h.picker.key(Key::ArrowDown);
    assert_eq!(h.picker.view().highlighted, Some(1));
    h.picker.key(Key::ArrowUp);
    h.picker.key(Key::ArrowDown);

    assert!(h.picker.key(Key::Enter).is_none());
    assert_eq!(h.picker.view().text, "abcdf");
    assert_eq!(*h.selected.lock(), vec!["abcdf".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn backspace_on_selection_clears_without_searching() {
    let h = harness(FakeSearch::new(catalog()));
    h.picker.input("xyz").expect("scheduled").await.unwrap();
    h.picker.click_result(0);
    assert_eq!(h.picker.view().text, "xyz");

    assert!(h.picker.key(Key::Backspace).is_none());
    sleep(Duration::from_millis(1_000)).await;

    let view = h.picker.view();
    assert!(view.selected.is_none());
    assert_eq!(view.text, "");
    assert_eq!(*h.clears.lock(), 1);
    assert_eq!(h.source.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn typing_over_selection_fires_clear() {
    let h = harness(FakeSearch::new(catalog()));
    h.picker.set_selected(Some(Unit { sigla: "KG".into() }));
    assert_eq!(h.picker.view().text, "KG");
    assert!(h.selected.lock().is_empty());

    h.picker.input("KGX");
    assert!(h.picker.view().selected.is_none());
    assert_eq!(*h.clears.lock(), 1);
}

#[tokio::test(start_paused = true)]
async fn outside_click_reverts_text() {
    let h = harness(FakeSearch::new(catalog()));

    h.picker.input("ab").expect("scheduled").await.unwrap();
    h.picker.outside_click();
    let view = h.picker.view();
    assert_eq!(view.text, "");
    assert_eq!(view.panel, Panel::Closed);
    assert!(view.results.is_empty());

    h.picker.set_selected(Some(Unit { sigla: "UN".into() }));
    h.picker.input("UNX");
    h.picker.set_selected(Some(Unit { sigla: "UN".into() }));
    h.picker.outside_click();
    assert_eq!(h.picker.view().text, "UN");
}

#[tokio::test(start_paused = true)]
async fn clearing_the_text_closes_the_panel() {
    let h = harness(FakeSearch::new(catalog()));
    let _ = h.picker.input("ab");
    assert!(h.picker.input("").is_none());
    sleep(Duration::from_millis(1_000)).await;

    assert_eq!(h.picker.view().panel, Panel::Closed);
    assert!(h.source.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn page_click_fetches_other_page_immediately() {
    let h = harness(FakeSearch::new(catalog()));
    h.picker.input("abcd").expect("scheduled").await.unwrap();

    let view = h.picker.view();
    assert_eq!(
        view.page_buttons(),
        vec![
            PageButton { number: 1, current: true },
            PageButton { number: 2, current: false },
        ]
    );
    assert!(h.picker.click_page(1).is_none());

    h.picker.click_page(2).expect("page fetch").await.unwrap();
    let view = h.picker.view();
    assert_eq!(view.page, 2);
    assert_eq!(view.results, vec![Unit { sigla: "abcdz".into() }]);
    assert_eq!(h.source.calls().last(), Some(&("abcd".to_string(), 2)));
}
