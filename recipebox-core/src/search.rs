//! Shared search and pagination state.
//!
//! [`SearchStore`] is the single source of truth for which recipes are being
//! viewed. It is a cheap cloneable handle: the list view and the create/import
//! actions each get a clone at construction and see the same state.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::FavoritesTag;
use crate::types::{Direction, PageInfo, SearchParams, SortField};

/// Mirror of the last server response's paging block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub size: u32,
    pub number: u32,
    pub total_elements: u64,
    pub total_pages: u32,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            size: crate::config::DEFAULT_PAGE_SIZE,
            number: 0,
            total_elements: 0,
            total_pages: 0,
        }
    }
}

impl From<PageInfo> for PaginationState {
    fn from(page: PageInfo) -> Self {
        Self {
            size: page.size,
            number: page.number,
            total_elements: page.total_elements,
            total_pages: page.total_pages,
        }
    }
}

/// A partial change to [`SearchParams`]. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchUpdate {
    /// `Some(None)` clears the name filter
    pub name: Option<Option<String>>,
    pub ingredients: Option<Vec<String>>,
    pub tag_ids: Option<Vec<String>>,
    pub sort_field: Option<SortField>,
    pub direction: Option<Direction>,
    pub size: Option<u32>,
}

impl SearchUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank names clear the filter.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        let name = name.into().trim().to_string();
        self.name = Some(if name.is_empty() { None } else { Some(name) });
        self
    }

    pub fn ingredients(mut self, ingredients: Vec<String>) -> Self {
        self.ingredients = Some(ingredients);
        self
    }

    pub fn tag_ids(mut self, tag_ids: Vec<String>) -> Self {
        self.tag_ids = Some(tag_ids);
        self
    }

    pub fn sort_field(mut self, sort_field: SortField) -> Self {
        self.sort_field = Some(sort_field);
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size.max(1));
        self
    }
}

/// Issued by [`SearchStore::begin_request`]; only the latest ticket's response is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTicket {
    pub seq: u64,
    /// Parameters to send, favorites filter included
    pub params: SearchParams,
    /// Store version the request was issued for
    pub version: u64,
    pub refresh: u64,
}

#[derive(Debug)]
struct SearchState {
    params: SearchParams,
    pagination: PaginationState,
    scroll_offset: u32,
    favorites_only: bool,
    favorites_tag_id: String,
    /// Bumped on every parameter change
    version: u64,
    /// Bumped after mutating actions elsewhere (create, edit, import, delete)
    refresh_counter: u64,
    /// Latest ticket handed out
    request_seq: u64,
}

impl SearchState {
    fn effective_params(&self) -> SearchParams {
        let mut params = self.params.clone();
        if self.favorites_only && !params.tag_ids.contains(&self.favorites_tag_id) {
            params.tag_ids.push(self.favorites_tag_id.clone());
        }
        params
    }
}

#[derive(Debug, Clone)]
pub struct SearchStore {
    inner: Arc<RwLock<SearchState>>,
}

impl SearchStore {
    pub fn new(favorites: &FavoritesTag, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        let params = SearchParams {
            size: page_size,
            ..Default::default()
        };
        let pagination = PaginationState {
            size: page_size,
            ..Default::default()
        };

        Self {
            inner: Arc::new(RwLock::new(SearchState {
                params,
                pagination,
                scroll_offset: 0,
                favorites_only: false,
                favorites_tag_id: favorites.id.clone(),
                version: 0,
                refresh_counter: 0,
                request_seq: 0,
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SearchState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SearchState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current parameters as the user set them.
    pub fn params(&self) -> SearchParams {
        self.read().params.clone()
    }

    /// Parameters as sent to the backend, with the favorites filter applied.
    pub fn effective_params(&self) -> SearchParams {
        self.read().effective_params()
    }

    pub fn pagination(&self) -> PaginationState {
        self.read().pagination
    }

    pub fn scroll_offset(&self) -> u32 {
        self.read().scroll_offset
    }

    pub fn favorites_only(&self) -> bool {
        self.read().favorites_only
    }

    pub fn favorites_tag_id(&self) -> String {
        self.read().favorites_tag_id.clone()
    }

    pub fn version(&self) -> u64 {
        self.read().version
    }

    pub fn refresh_counter(&self) -> u64 {
        self.read().refresh_counter
    }

    /// Whether a name, ingredient, tag, or favorites filter is in effect.
    pub fn has_active_filters(&self) -> bool {
        let state = self.read();
        state.favorites_only || state.params.has_active_filters()
    }

    /// Merge `update` into the current parameters. Always returns to the first page.
    pub fn update_search_params(&self, update: SearchUpdate) {
        let mut state = self.write();
        let params = &mut state.params;

        if let Some(name) = update.name {
            params.name = name;
        }
        if let Some(ingredients) = update.ingredients {
            params.ingredients = ingredients;
        }
        if let Some(tag_ids) = update.tag_ids {
            params.tag_ids = tag_ids;
        }
        if let Some(sort_field) = update.sort_field {
            params.sort_field = sort_field;
        }
        if let Some(direction) = update.direction {
            params.direction = direction;
        }
        if let Some(size) = update.size {
            params.size = size.max(1);
        }
        params.page_number = 0;
        state.scroll_offset = 0;
        state.version += 1;

        tracing::debug!(version = state.version, params = ?state.params, "search params updated");
    }

    /// Move to page `page` keeping filters, remembering where the list was scrolled.
    pub fn set_page(&self, page: u32, scroll_offset: u32) {
        let mut state = self.write();
        state.params.page_number = page;
        state.scroll_offset = scroll_offset;
        state.version += 1;
    }

    /// Returns the new value.
    pub fn toggle_favorites_only(&self) -> bool {
        let mut state = self.write();
        state.favorites_only = !state.favorites_only;
        state.params.page_number = 0;
        state.scroll_offset = 0;
        state.version += 1;
        state.favorites_only
    }

    /// Reset name, ingredient and tag filters and the sort order. Page size is kept.
    pub fn clear_filters(&self) {
        let mut state = self.write();
        let size = state.params.size;
        state.params = SearchParams {
            size,
            ..Default::default()
        };
        state.scroll_offset = 0;
        state.version += 1;
    }

    /// Add a trimmed ingredient filter. Returns false for blanks and duplicates.
    pub fn add_ingredient_filter(&self, ingredient: &str) -> bool {
        let ingredient = ingredient.trim();
        let mut ingredients = self.read().params.ingredients.clone();
        if ingredient.is_empty() || ingredients.iter().any(|i| i == ingredient) {
            return false;
        }
        ingredients.push(ingredient.to_string());
        self.update_search_params(SearchUpdate::new().ingredients(ingredients));
        true
    }

    pub fn remove_ingredient_filter(&self, ingredient: &str) {
        let mut ingredients = self.read().params.ingredients.clone();
        ingredients.retain(|i| i != ingredient);
        self.update_search_params(SearchUpdate::new().ingredients(ingredients));
    }

    /// Select or deselect a tag filter. Returns whether the tag is now selected.
    pub fn toggle_tag_filter(&self, tag_id: &str) -> bool {
        let mut tag_ids = self.read().params.tag_ids.clone();
        let selected = if tag_ids.iter().any(|t| t == tag_id) {
            tag_ids.retain(|t| t != tag_id);
            false
        } else {
            tag_ids.push(tag_id.to_string());
            true
        };
        self.update_search_params(SearchUpdate::new().tag_ids(tag_ids));
        selected
    }

    /// Signal that recipes changed on the backend and the current page is stale.
    pub fn bump_refresh(&self) -> u64 {
        let mut state = self.write();
        state.refresh_counter += 1;
        state.refresh_counter
    }

    /// Start a fetch. Any ticket issued earlier becomes stale.
    ///
    /// The parameters, version and sequence number are captured under one lock,
    /// so a ticket always carries the parameters of the version it names.
    pub fn begin_request(&self) -> RequestTicket {
        let mut state = self.write();
        state.request_seq += 1;
        RequestTicket {
            seq: state.request_seq,
            params: state.effective_params(),
            version: state.version,
            refresh: state.refresh_counter,
        }
    }

    /// Apply a response's paging block if `ticket` is still the latest request
    /// and the parameters have not changed since it was issued.
    ///
    /// Returns false, leaving state untouched, for superseded responses.
    pub fn accept_response(&self, ticket: &RequestTicket, page: &PageInfo) -> bool {
        let mut state = self.write();
        if ticket.seq != state.request_seq || ticket.version != state.version {
            tracing::debug!(
                ticket = ticket.seq,
                latest = state.request_seq,
                ticket_version = ticket.version,
                version = state.version,
                "discarding stale search response"
            );
            return false;
        }
        state.pagination = PaginationState::from(*page);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SearchStore {
        SearchStore::new(&FavoritesTag::default(), 10)
    }

    #[test]
    fn test_every_update_resets_page() {
        let updates = vec![
            SearchUpdate::new().name("soup"),
            SearchUpdate::new().name(""),
            SearchUpdate::new().ingredients(vec!["egg".to_string()]),
            SearchUpdate::new().tag_ids(vec!["t1".to_string()]),
            SearchUpdate::new().sort_field(SortField::Created),
            SearchUpdate::new().direction(Direction::Desc),
            SearchUpdate::new().size(25),
            SearchUpdate::new(),
        ];

        let store = store();
        for update in updates {
            store.set_page(4, 900);
            store.update_search_params(update);
            assert_eq!(store.params().page_number, 0);
            assert_eq!(store.scroll_offset(), 0);
        }
    }

    #[test]
    fn test_update_merges_only_given_fields() {
        let store = store();
        store.update_search_params(SearchUpdate::new().name("soup"));
        store.update_search_params(SearchUpdate::new().direction(Direction::Desc));

        let params = store.params();
        assert_eq!(params.name.as_deref(), Some("soup"));
        assert_eq!(params.direction, Direction::Desc);
        assert_eq!(params.sort_field, SortField::Name);
    }

    #[test]
    fn test_set_page_keeps_filters_and_scroll() {
        let store = store();
        store.update_search_params(SearchUpdate::new().name("soup"));
        store.set_page(3, 1200);

        let params = store.params();
        assert_eq!(params.page_number, 3);
        assert_eq!(params.name.as_deref(), Some("soup"));
        assert_eq!(store.scroll_offset(), 1200);
    }

    #[test]
    fn test_favorites_only_adds_reserved_tag() {
        let store = store();
        store.update_search_params(SearchUpdate::new().tag_ids(vec!["vegan".to_string()]));
        store.set_page(2, 0);

        assert!(store.toggle_favorites_only());
        assert_eq!(store.params().page_number, 0);
        assert_eq!(
            store.effective_params().tag_ids,
            vec!["vegan".to_string(), "favorite-tag-id".to_string()]
        );
        // The user's own filters are untouched
        assert_eq!(store.params().tag_ids, vec!["vegan".to_string()]);

        assert!(!store.toggle_favorites_only());
        assert_eq!(store.effective_params().tag_ids, vec!["vegan".to_string()]);
    }

    #[test]
    fn test_favorites_tag_not_duplicated() {
        let store = store();
        store.toggle_tag_filter("favorite-tag-id");
        store.toggle_favorites_only();
        assert_eq!(
            store.effective_params().tag_ids,
            vec!["favorite-tag-id".to_string()]
        );
    }

    #[test]
    fn test_clear_filters_preserves_size() {
        let store = store();
        store.update_search_params(
            SearchUpdate::new()
                .name("soup")
                .ingredients(vec!["leek".to_string()])
                .tag_ids(vec!["t1".to_string()])
                .sort_field(SortField::LastAccess)
                .direction(Direction::Desc)
                .size(30),
        );
        store.clear_filters();

        let params = store.params();
        assert_eq!(
            params,
            SearchParams {
                size: 30,
                ..Default::default()
            }
        );
        assert!(!store.has_active_filters());
    }

    #[test]
    fn test_ingredient_filters_trim_and_dedupe() {
        let store = store();
        assert!(store.add_ingredient_filter("  flour "));
        assert!(!store.add_ingredient_filter("flour"));
        assert!(!store.add_ingredient_filter("   "));
        assert_eq!(store.params().ingredients, vec!["flour".to_string()]);

        store.remove_ingredient_filter("flour");
        assert!(store.params().ingredients.is_empty());
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let store = store();
        let first = store.begin_request();
        store.update_search_params(SearchUpdate::new().name("pie"));
        let second = store.begin_request();

        let newer = PageInfo {
            size: 10,
            number: 0,
            total_elements: 3,
            total_pages: 1,
        };
        let older = PageInfo {
            size: 10,
            number: 0,
            total_elements: 42,
            total_pages: 5,
        };

        assert!(store.accept_response(&second, &newer));
        assert!(!store.accept_response(&first, &older));
        assert_eq!(store.pagination().total_elements, 3);
    }

    #[test]
    fn test_ticket_params_match_its_version() {
        let store = store();
        let list = store.clone();
        let ticket = list.begin_request();

        // Another handle changes the filters while the request is in flight
        store.update_search_params(SearchUpdate::new().name("pie"));
        let page = PageInfo {
            size: 10,
            number: 0,
            total_elements: 8,
            total_pages: 1,
        };
        assert!(!list.accept_response(&ticket, &page));
        assert_eq!(list.pagination().total_elements, 0);

        let retry = list.begin_request();
        assert_eq!(retry.version, store.version());
        assert_eq!(retry.params.name.as_deref(), Some("pie"));
        assert!(list.accept_response(&retry, &page));
    }

    #[test]
    fn test_blank_name_clears_filter() {
        let store = store();
        store.update_search_params(SearchUpdate::new().name("soup"));
        store.update_search_params(SearchUpdate::new().name("   "));
        assert_eq!(store.params().name, None);
        assert!(!store.has_active_filters());

        store.update_search_params(SearchUpdate::new().name("  pie "));
        assert_eq!(store.params().name.as_deref(), Some("pie"));
    }

    #[test]
    fn test_clones_share_state() {
        let store = store();
        let navbar = store.clone();
        navbar.bump_refresh();
        navbar.update_search_params(SearchUpdate::new().name("stew"));

        assert_eq!(store.refresh_counter(), 1);
        assert_eq!(store.params().name.as_deref(), Some("stew"));
    }
}
