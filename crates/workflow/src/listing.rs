//! Paginated, filterable view of the case collection.
//!
//! Page, page size and status filter are applied by the server. The search
//! text is applied locally to the page currently held, so a case that lives
//! on another page never matches.

use crate::{InFlight, Store};
use common::{Case, CasePage, CaseStatus, StatusFilter};
use repository::{CaseError, CaseRepository, ListQuery};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

pub const DEFAULT_ITEMS_PER_PAGE: u32 = 10;

/// A fetch the controller must run. `generation` identifies it when the
/// response comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingRequest {
    pub query: ListQuery,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    Applied,
    Failed(String),
    /// A newer request was issued; the response was dropped
    Stale,
}

/// Header counters. `total_cases` comes from the server, the others count
/// the page currently held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListingCounters {
    pub total_cases: u64,
    pub in_progress: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListingView<'a> {
    Loading,
    Empty,
    Table(Vec<&'a Case>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    page: u32,
    items_per_page: u32,
    status: StatusFilter,
    search: String,
    cases: Vec<Case>,
    total: u64,
    loaded: bool,
    error: Option<String>,
    generation: u64,
    in_flight: Option<ListingRequest>,
    /// Query of the page currently held
    shown: Option<ListQuery>,
}

impl Default for Listing {
    fn default() -> Self {
        Self {
            page: 1,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            status: StatusFilter::All,
            search: String::new(),
            cases: Vec::new(),
            total: 0,
            loaded: false,
            error: None,
            generation: 0,
            in_flight: None,
            shown: None,
        }
    }
}

impl Listing {
    /// Start from explicit parameters instead of page 1 of everything
    pub fn with_query(query: ListQuery) -> Self {
        Self {
            page: query.page,
            items_per_page: query.limit,
            status: query.status,
            ..Self::default()
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn items_per_page(&self) -> u32 {
        self.items_per_page
    }

    pub fn status_filter(&self) -> StatusFilter {
        self.status
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Cases of the current page, unfiltered by search
    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn query(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            limit: self.items_per_page,
            status: self.status,
        }
    }

    /// Re-fetch with the current parameters
    pub fn refresh(&mut self) -> Option<ListingRequest> {
        self.request()
    }

    /// Requested page is sent as-is, even past the last page
    pub fn go_to_page(&mut self, page: u32) -> Option<ListingRequest> {
        self.page = page;
        self.request()
    }

    pub fn set_items_per_page(&mut self, items_per_page: u32) -> Option<ListingRequest> {
        self.items_per_page = items_per_page;
        self.page = 1;
        self.request()
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) -> Option<ListingRequest> {
        self.status = status;
        self.page = 1;
        self.request()
    }

    /// Local only; no fetch
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Issue a request for the current query. Returns `None` when the very
    /// same query is already in flight.
    fn request(&mut self) -> Option<ListingRequest> {
        let query = self.query();
        if self.in_flight.is_some_and(|pending| pending.query == query) {
            return None;
        }
        self.generation += 1;
        let request = ListingRequest {
            query,
            generation: self.generation,
        };
        self.in_flight = Some(request);
        self.error = None;
        Some(request)
    }

    /// Store the response of request `generation`. Only the latest request
    /// may change the listing.
    pub fn apply(&mut self, generation: u64, result: Result<CasePage, CaseError>) -> ApplyResult {
        if generation != self.generation {
            return ApplyResult::Stale;
        }
        self.in_flight = None;
        match result {
            Ok(page) => {
                self.total = page.pagination.total;
                self.cases = page.cases;
                self.loaded = true;
                self.shown = Some(self.query());
                ApplyResult::Applied
            }
            Err(e) => {
                let message = e.user_message();
                self.error = Some(message.clone());
                self.restore_shown_query();
                ApplyResult::Failed(message)
            }
        }
    }

    /// Request `generation` was abandoned before its response arrived
    pub fn cancel(&mut self, generation: u64) {
        if self.in_flight.is_some_and(|pending| pending.generation == generation) {
            self.in_flight = None;
            self.restore_shown_query();
        }
    }

    /// Page, page size and filter go back to those of the held page
    fn restore_shown_query(&mut self) {
        if let Some(shown) = self.shown {
            self.page = shown.page;
            self.items_per_page = shown.limit;
            self.status = shown.status;
        }
    }

    /// `ceil(total / items_per_page)`, and 1 for an empty collection
    pub fn total_pages(&self) -> u32 {
        if self.total == 0 || self.items_per_page == 0 {
            return 1;
        }
        let pages = self.total.div_ceil(u64::from(self.items_per_page));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Current page narrowed by the search text (name or id, case-insensitive)
    pub fn visible_cases(&self) -> Vec<&Case> {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return self.cases.iter().collect();
        }
        self.cases
            .iter()
            .filter(|case| {
                case.name.to_lowercase().contains(&needle)
                    || case.id.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn counters(&self) -> ListingCounters {
        let count = |status: CaseStatus| self.cases.iter().filter(|c| c.status == status).count();
        ListingCounters {
            total_cases: self.total,
            in_progress: count(CaseStatus::Processing),
            completed: count(CaseStatus::Completed),
        }
    }

    /// Loading until the first page arrives, then empty or a table
    pub fn view(&self) -> ListingView<'_> {
        if !self.loaded && self.is_loading() {
            return ListingView::Loading;
        }
        let visible = self.visible_cases();
        if visible.is_empty() {
            ListingView::Empty
        } else {
            ListingView::Table(visible)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    Failed(String),
    /// A newer request overtook this one
    Superseded,
    /// Identical request already running; nothing was sent
    AlreadyLoading,
}

pub struct ListingController {
    repository: Arc<CaseRepository>,
    store: Store<Listing>,
}

impl ListingController {
    pub fn new(repository: Arc<CaseRepository>) -> Self {
        Self::with_listing(repository, Listing::default())
    }

    pub fn with_listing(repository: Arc<CaseRepository>, listing: Listing) -> Self {
        Self {
            repository,
            store: Store::new(listing),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Listing> {
        self.store.subscribe()
    }

    pub fn snapshot(&self) -> Listing {
        self.store.snapshot()
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        let request = self.store.update(Listing::refresh);
        self.run(request).await
    }

    pub async fn go_to_page(&self, page: u32) -> RefreshOutcome {
        let request = self.store.update(|listing| listing.go_to_page(page));
        self.run(request).await
    }

    pub async fn set_items_per_page(&self, items_per_page: u32) -> RefreshOutcome {
        let request = self
            .store
            .update(|listing| listing.set_items_per_page(items_per_page));
        self.run(request).await
    }

    pub async fn set_status_filter(&self, status: StatusFilter) -> RefreshOutcome {
        let request = self.store.update(|listing| listing.set_status_filter(status));
        self.run(request).await
    }

    pub fn set_search(&self, search: impl Into<String>) {
        let search = search.into();
        self.store.update(|listing| listing.set_search(search));
    }

    pub fn clear_error(&self) {
        self.store.update(Listing::clear_error);
    }

    async fn run(&self, request: Option<ListingRequest>) -> RefreshOutcome {
        let Some(request) = request else {
            debug!("identical listing request already in flight");
            return RefreshOutcome::AlreadyLoading;
        };

        let generation = request.generation;
        let in_flight = InFlight::new(&self.store, move |listing: &mut Listing| {
            listing.cancel(generation)
        });
        let result = self.repository.list_cases(&request.query).await;
        in_flight.complete();
        if let Err(e) = &result {
            warn!(page = request.query.page, error = %e, "listing fetch failed");
        }
        match self
            .store
            .update(|listing| listing.apply(request.generation, result))
        {
            ApplyResult::Applied => RefreshOutcome::Applied,
            ApplyResult::Failed(message) => RefreshOutcome::Failed(message),
            ApplyResult::Stale => {
                debug!(generation = request.generation, "dropped stale listing response");
                RefreshOutcome::Superseded
            }
        }
    }
}
