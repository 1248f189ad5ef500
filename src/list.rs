//! Generic list/search/paginate controller.
//!
//! One `ListController<T>` per entity view. It owns the fetched items, the
//! search term, an optional secondary filter and the current page, and
//! recomputes the filtered index on every change. Reloads are tagged with a
//! sequence number so that only the newest response is applied.

use tracing::debug;

use crate::model::Resource;
use crate::search;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// Issues monotonically increasing request tags.
#[derive(Clone, Debug, Default)]
pub struct RequestSequencer {
    latest: u64,
}

impl RequestSequencer {
    pub fn next(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }

    pub fn is_current(&self, tag: u64) -> bool {
        tag == self.latest
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer request was issued after this one; the response was dropped.
    Stale,
}

#[derive(Clone, Debug)]
pub struct ListController<T> {
    items: Vec<T>,
    filtered: Vec<usize>,
    search_term: String,
    facet: Option<String>,
    page: usize,
    page_size: usize,
    selected: usize,
    state: LoadState,
    seq: RequestSequencer,
}

impl<T: Resource> ListController<T> {
    pub fn new(page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            filtered: Vec::new(),
            search_term: String::new(),
            facet: None,
            page: 1,
            page_size: page_size.max(1),
            selected: 0,
            state: LoadState::Idle,
            seq: RequestSequencer::default(),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn facet(&self) -> Option<&str> {
        self.facet.as_deref()
    }

    /// Label of the active secondary filter, for the status line.
    pub fn facet_label(&self) -> Option<&'static str> {
        let want = self.facet.as_deref()?;
        T::facets().iter().find(|(v, _)| *v == want).map(|(_, l)| *l)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    /// At least 1, even for an empty result.
    pub fn total_pages(&self) -> usize {
        self.filtered.len().div_ceil(self.page_size).max(1)
    }

    /// Loaded and nothing matches the current filters.
    pub fn is_empty_result(&self) -> bool {
        self.state == LoadState::Loaded && self.filtered.is_empty()
    }

    /// Start a reload and return its tag.
    pub fn begin_load(&mut self) -> u64 {
        self.state = LoadState::Loading;
        self.seq.next()
    }

    pub fn latest_tag(&self) -> u64 {
        self.seq.latest()
    }

    /// Apply the result of the request tagged `tag`. Stale results are
    /// ignored; errors keep the previous items.
    pub fn finish_load(&mut self, tag: u64, result: Result<Vec<T>, String>) -> LoadOutcome {
        if !self.seq.is_current(tag) {
            debug!(noun = T::NOUN, tag, latest = self.seq.latest(), "discarding stale list response");
            return LoadOutcome::Stale;
        }
        match result {
            Ok(items) => {
                self.items = items;
                self.refilter();
                self.page = self.page.min(self.total_pages());
                self.clamp_selection();
                self.state = LoadState::Loaded;
            }
            Err(message) => {
                self.state = LoadState::Failed(message);
            }
        }
        LoadOutcome::Applied
    }

    /// Replace the items directly, keeping term, filter and page (clamped).
    pub fn set_items(&mut self, items: Vec<T>) {
        let tag = self.begin_load();
        self.finish_load(tag, Ok(items));
    }

    /// New search term: refilter and go back to page 1.
    pub fn set_search_term(&mut self, term: &str) {
        self.search_term = term.to_string();
        self.refilter();
        self.page = 1;
        self.selected = 0;
    }

    pub fn set_facet(&mut self, facet: Option<&str>) {
        self.facet = facet.map(str::to_string);
        self.refilter();
        self.page = 1;
        self.selected = 0;
    }

    /// Step through `None -> facets[0] -> ... -> None`.
    pub fn cycle_facet(&mut self) {
        let facets = T::facets();
        if facets.is_empty() {
            return;
        }
        let next = match self.facet.as_deref() {
            None => Some(facets[0].0),
            Some(cur) => facets
                .iter()
                .position(|(v, _)| *v == cur)
                .and_then(|i| facets.get(i + 1))
                .map(|(v, _)| *v),
        };
        self.set_facet(next);
    }

    /// Jump to `page` (1-based). Not clamped: a page past the end is empty.
    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.max(1);
        self.selected = 0;
    }

    pub fn next_page(&mut self) {
        if self.page < self.total_pages() {
            self.page += 1;
            self.selected = 0;
        }
    }

    pub fn prev_page(&mut self) {
        if self.page > 1 {
            self.page = (self.page - 1).min(self.total_pages());
            self.selected = 0;
        }
    }

    /// The current page: `0 <= len <= page_size`.
    pub fn page_items(&self) -> Vec<&T> {
        let start = (self.page - 1).saturating_mul(self.page_size);
        if start >= self.filtered.len() {
            return Vec::new();
        }
        let end = (start + self.page_size).min(self.filtered.len());
        self.filtered[start..end]
            .iter()
            .filter_map(|&i| self.items.get(i))
            .collect()
    }

    /// Selected row within the current page.
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn select_next(&mut self) {
        let len = self.page_items().len();
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.page_items().get(self.selected).copied()
    }

    pub fn find(&self, key: &str) -> Option<&T> {
        self.items.iter().find(|i| i.key() == key)
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn count_where(&self, pred: impl Fn(&T) -> bool) -> usize {
        self.items.iter().filter(|i| pred(i)).count()
    }

    /// Forget everything (logout).
    pub fn reset(&mut self) {
        let page_size = self.page_size;
        let seq = std::mem::take(&mut self.seq);
        *self = Self::new(page_size);
        // keep issuing fresh tags so late responses from before the reset are stale
        self.seq = seq;
        self.seq.next();
    }

    fn refilter(&mut self) {
        self.filtered = search::filter_indices(&self.items, &self.search_term, self.facet.as_deref());
    }

    fn clamp_selection(&mut self) {
        let len = self.page_items().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}

impl<T: Resource> Default for ListController<T> {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Type-erased view of a list for key handling and the status line.
pub trait ListNav {
    fn search_term(&self) -> &str;
    fn set_search_term(&mut self, term: &str);
    fn cycle_facet(&mut self);
    fn facet_label(&self) -> Option<&'static str>;
    fn next_page(&mut self);
    fn prev_page(&mut self);
    fn select_next(&mut self);
    fn select_prev(&mut self);
    fn page(&self) -> usize;
    fn total_pages(&self) -> usize;
    fn filtered_len(&self) -> usize;
    fn total(&self) -> usize;
    fn state(&self) -> &LoadState;
    fn selected_key(&self) -> Option<String>;
    fn selected_details(&self) -> Option<Vec<(&'static str, String)>>;
}

impl<T: Resource> ListNav for ListController<T> {
    fn search_term(&self) -> &str {
        ListController::search_term(self)
    }

    fn set_search_term(&mut self, term: &str) {
        ListController::set_search_term(self, term)
    }

    fn cycle_facet(&mut self) {
        ListController::cycle_facet(self)
    }

    fn facet_label(&self) -> Option<&'static str> {
        ListController::facet_label(self)
    }

    fn next_page(&mut self) {
        ListController::next_page(self)
    }

    fn prev_page(&mut self) {
        ListController::prev_page(self)
    }

    fn select_next(&mut self) {
        ListController::select_next(self)
    }

    fn select_prev(&mut self) {
        ListController::select_prev(self)
    }

    fn page(&self) -> usize {
        ListController::page(self)
    }

    fn total_pages(&self) -> usize {
        ListController::total_pages(self)
    }

    fn filtered_len(&self) -> usize {
        ListController::filtered_len(self)
    }

    fn total(&self) -> usize {
        ListController::total(self)
    }

    fn state(&self) -> &LoadState {
        ListController::state(self)
    }

    fn selected_key(&self) -> Option<String> {
        self.selected_item().map(Resource::key)
    }

    fn selected_details(&self) -> Option<Vec<(&'static str, String)>> {
        self.selected_item().map(Resource::details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InventoryItem, InventoryType, Patient};

    fn patients(n: usize) -> Vec<Patient> {
        (0..n)
            .map(|i| Patient {
                cedula: format!("{:08}", 10_000_000 + i),
                full_name: format!("Patient {i}"),
                ..Patient::default()
            })
            .collect()
    }

    fn loaded(n: usize) -> ListController<Patient> {
        let mut list = ListController::new(10);
        list.set_items(patients(n));
        list
    }

    #[test]
    fn pages_slice_filtered_items() {
        let mut list = loaded(25);
        assert_eq!(list.total_pages(), 3);
        assert_eq!(list.page_items().len(), 10);
        assert_eq!(list.page_items()[0].full_name, "Patient 0");
        list.go_to_page(3);
        assert_eq!(list.page_items().len(), 5);
        list.go_to_page(9);
        assert!(list.page_items().is_empty());
        assert_eq!(list.page(), 9);
    }

    #[test]
    fn next_and_prev_are_clamped() {
        let mut list = loaded(25);
        list.next_page();
        list.next_page();
        list.next_page();
        assert_eq!(list.page(), 3);
        list.prev_page();
        list.prev_page();
        list.prev_page();
        assert_eq!(list.page(), 1);
    }

    #[test]
    fn search_term_resets_page() {
        let mut list = loaded(25);
        list.go_to_page(2);
        list.set_search_term("patient 2");
        assert_eq!(list.page(), 1);
        // "Patient 2" and "Patient 20".."Patient 24"
        assert_eq!(list.filtered_len(), 6);
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut list: ListController<Patient> = ListController::new(10);
        let first = list.begin_load();
        let second = list.begin_load();
        assert_eq!(list.finish_load(second, Ok(patients(3))), LoadOutcome::Applied);
        assert_eq!(list.finish_load(first, Ok(patients(7))), LoadOutcome::Stale);
        assert_eq!(list.total(), 3);
        assert_eq!(list.state(), &LoadState::Loaded);
    }

    #[test]
    fn failed_reload_keeps_previous_items() {
        let mut list = loaded(4);
        let tag = list.begin_load();
        list.finish_load(tag, Err("boom".into()));
        assert_eq!(list.total(), 4);
        assert_eq!(list.state(), &LoadState::Failed("boom".into()));
    }

    #[test]
    fn reload_keeps_term_and_clamps_page() {
        let mut list = loaded(25);
        list.go_to_page(3);
        list.set_items(patients(12));
        assert_eq!(list.page(), 2);
        list.set_search_term("patient 1");
        list.set_items(patients(25));
        assert_eq!(list.search_term(), "patient 1");
        assert_eq!(list.filtered_len(), 11);
    }

    #[test]
    fn empty_result_is_reported() {
        let mut list = loaded(5);
        list.set_search_term("nobody");
        assert!(list.is_empty_result());
        assert_eq!(list.total_pages(), 1);
        assert!(list.selected_item().is_none());
    }

    #[test]
    fn facet_cycles_through_choices_and_back() {
        let mut list: ListController<InventoryItem> = ListController::new(10);
        list.set_items(vec![
            InventoryItem {
                name: "A".into(),
                item_type: Some(InventoryType::Medicamento),
                ..InventoryItem::default()
            },
            InventoryItem {
                name: "B".into(),
                item_type: Some(InventoryType::Equipo),
                ..InventoryItem::default()
            },
        ]);
        list.cycle_facet();
        assert_eq!(list.facet(), Some("MEDICAMENTO"));
        assert_eq!(list.filtered_len(), 1);
        for _ in 0..InventoryItem::facets().len() {
            list.cycle_facet();
        }
        assert_eq!(list.facet(), None);
        assert_eq!(list.filtered_len(), 2);
    }

    #[test]
    fn selection_stays_within_page() {
        let mut list = loaded(3);
        list.select_next();
        list.select_next();
        list.select_next();
        assert_eq!(list.selected_index(), 2);
        assert_eq!(list.selected_item().map(|p| p.full_name.as_str()), Some("Patient 2"));
        list.set_items(patients(1));
        assert_eq!(list.selected_index(), 0);
    }

    #[test]
    fn dyn_nav_drives_the_same_state() {
        let mut list = loaded(25);
        {
            let nav: &mut dyn ListNav = &mut list;
            nav.next_page();
            nav.select_next();
            assert_eq!(nav.page(), 2);
            assert_eq!(nav.selected_key().as_deref(), Some("10000011"));
            nav.set_search_term("patient 24");
            assert_eq!(nav.filtered_len(), 1);
        }
        assert_eq!(list.page(), 1);
    }

    #[test]
    fn reset_makes_in_flight_responses_stale() {
        let mut list = loaded(3);
        let tag = list.begin_load();
        list.reset();
        assert_eq!(list.finish_load(tag, Ok(patients(9))), LoadOutcome::Stale);
        assert_eq!(list.total(), 0);
    }
}
