//! The recipe list: one page of search results plus selection and deletion.

use futures::future::join_all;
use std::sync::Arc;

use crate::api::RecipeApi;
use crate::config::FavoritesTag;
use crate::error::ApiError;
use crate::search::SearchStore;
use crate::types::{Recipe, TagRef};

/// Shown instead of the list when a page comes back empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub title: String,
    pub message: String,
}

/// Result counts shown above the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSummary {
    /// "N recipes found"
    pub found: String,
    /// "Showing a-b of N", absent when the page is empty
    pub showing: Option<String>,
    /// "Page x of y", absent when there is at most one page
    pub page: Option<String>,
}

/// Per-id outcome of a bulk delete, in selection order.
#[derive(Debug, Default)]
pub struct DeleteReport {
    pub deleted: Vec<String>,
    pub failed: Vec<(String, ApiError)>,
}

impl DeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct RecipeListView<A: RecipeApi + ?Sized> {
    api: Arc<A>,
    store: SearchStore,
    favorites: FavoritesTag,
    recipes: Vec<Recipe>,
    /// Selected recipe ids, in selection order
    selected: Vec<String>,
    /// Store version and refresh counter of the last applied fetch
    fetched_at: Option<(u64, u64)>,
}

impl<A: RecipeApi + ?Sized> RecipeListView<A> {
    pub fn new(api: Arc<A>, store: SearchStore, favorites: FavoritesTag) -> Self {
        Self {
            api,
            store,
            favorites,
            recipes: Vec::new(),
            selected: Vec::new(),
            fetched_at: None,
        }
    }

    pub fn store(&self) -> &SearchStore {
        &self.store
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    /// Whether the store changed since the last applied fetch.
    pub fn needs_fetch(&self) -> bool {
        self.fetched_at != Some((self.store.version(), self.store.refresh_counter()))
    }

    /// Fetch only if parameters or the refresh counter moved. Returns whether a page was applied.
    pub async fn sync(&mut self) -> Result<bool, ApiError> {
        if !self.needs_fetch() {
            return Ok(false);
        }
        self.fetch().await
    }

    /// Fetch the current page unconditionally.
    ///
    /// Returns false if a newer request was issued while this one was in flight;
    /// its response is dropped.
    pub async fn fetch(&mut self) -> Result<bool, ApiError> {
        let ticket = self.store.begin_request();
        tracing::debug!(seq = ticket.seq, params = ?ticket.params, "fetching recipes");

        let page = self.api.search_recipes(&ticket.params).await?;
        if !self.store.accept_response(&ticket, &page.page) {
            return Ok(false);
        }

        self.recipes = page.content;
        let recipes = &self.recipes;
        self.selected
            .retain(|id| recipes.iter().any(|r| r.id.as_deref() == Some(id.as_str())));
        self.fetched_at = Some((ticket.version, ticket.refresh));
        Ok(true)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Returns whether `id` is selected afterwards.
    pub fn toggle_select(&mut self, id: &str) -> bool {
        if self.is_selected(id) {
            self.selected.retain(|s| s != id);
            false
        } else {
            self.selected.push(id.to_string());
            true
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self.recipes.iter().filter_map(|r| r.id.clone()).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    fn forget(&mut self, id: &str) {
        self.recipes.retain(|r| r.id.as_deref() != Some(id));
        self.selected.retain(|s| s != id);
    }

    pub async fn delete_recipe(&mut self, id: &str) -> Result<(), ApiError> {
        self.api.delete_recipe(id).await?;
        tracing::info!(id = %id, "recipe deleted");
        self.forget(id);
        Ok(())
    }

    /// Delete every selected recipe concurrently.
    ///
    /// Each id succeeds or fails on its own; there is no rollback. Failed ids
    /// stay visible and selected.
    pub async fn bulk_delete(&mut self) -> DeleteReport {
        let ids = self.selected.clone();
        let api = &self.api;
        let results = join_all(ids.iter().map(|id| api.delete_recipe(id))).await;

        let mut report = DeleteReport::default();
        for (id, result) in ids.into_iter().zip(results) {
            match result {
                Ok(()) => {
                    self.forget(&id);
                    report.deleted.push(id);
                }
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "failed to delete recipe");
                    report.failed.push((id, e));
                }
            }
        }

        tracing::info!(
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "bulk delete finished"
        );
        report
    }

    pub fn is_favorite(&self, recipe: &Recipe) -> bool {
        recipe.has_tag(&self.favorites.id)
    }

    /// Add or remove the favorites tag on one recipe. Returns the new favorite state.
    ///
    /// Only that recipe is replaced locally; a recipe that is not on the page
    /// is read from the backend first. With "favorites only" active an
    /// unfavorited recipe disappears from the page immediately, and the totals
    /// stay stale until the next fetch.
    pub async fn toggle_favorite(&mut self, id: &str) -> Result<bool, ApiError> {
        let index = self
            .recipes
            .iter()
            .position(|r| r.id.as_deref() == Some(id));
        let was_favorite = match index {
            Some(i) => self.is_favorite(&self.recipes[i]),
            None => {
                let recipe = self.api.get_recipe(id).await?;
                self.is_favorite(&recipe)
            }
        };

        let tag = [TagRef {
            id: self.favorites.id.clone(),
            name: self.favorites.name.clone(),
            existing_tag: true,
        }];
        let updated = if was_favorite {
            self.api.remove_recipe_tags(id, &tag).await?
        } else {
            self.api.add_recipe_tags(id, &tag).await?
        };
        let now_favorite = self.is_favorite(&updated);
        tracing::debug!(id = %id, favorite = now_favorite, "favorite toggled");

        if !now_favorite && self.store.favorites_only() {
            self.forget(id);
        } else if let Some(slot) = index.and_then(|i| self.recipes.get_mut(i)) {
            *slot = updated;
        }
        Ok(now_favorite)
    }

    /// `None` while the page has recipes.
    pub fn empty_state(&self) -> Option<EmptyState> {
        if !self.recipes.is_empty() {
            return None;
        }

        let message = if self.store.has_active_filters() {
            format!(
                "No recipes match your filter criteria ({}). Try removing some filters.",
                self.describe_criteria()
            )
        } else {
            "Add your first recipe to get started!".to_string()
        };

        Some(EmptyState {
            title: "No recipes found".to_string(),
            message,
        })
    }

    fn describe_criteria(&self) -> String {
        let params = self.store.params();
        let mut parts = Vec::new();
        if let Some(name) = params.name.as_deref().filter(|n| !n.trim().is_empty()) {
            parts.push(format!("name \"{}\"", name));
        }
        if !params.ingredients.is_empty() {
            parts.push(format!("ingredients: {}", params.ingredients.join(", ")));
        }
        if !params.tag_ids.is_empty() {
            parts.push(format!("{} tag(s)", params.tag_ids.len()));
        }
        if self.store.favorites_only() {
            parts.push("favorites only".to_string());
        }
        parts.join("; ")
    }

    pub fn summary(&self) -> ListSummary {
        let pagination = self.store.pagination();
        let suffix = if self.store.has_active_filters() {
            " matching your filters"
        } else {
            ""
        };
        let found = format!("{} recipes found{}", pagination.total_elements, suffix);

        let showing = (!self.recipes.is_empty()).then(|| {
            let start = u64::from(pagination.number) * u64::from(pagination.size) + 1;
            let end = ((u64::from(pagination.number) + 1) * u64::from(pagination.size))
                .min(pagination.total_elements);
            format!("Showing {}-{} of {}", start, end, pagination.total_elements)
        });

        let page = (pagination.total_pages > 1).then(|| {
            format!(
                "Page {} of {}",
                pagination.number + 1,
                pagination.total_pages
            )
        });

        ListSummary {
            found,
            showing,
            page,
        }
    }

    /// Returns false on the last page.
    pub fn next_page(&self, scroll_offset: u32) -> bool {
        let pagination = self.store.pagination();
        let next = match self.store.params().page_number.checked_add(1) {
            Some(next) if next < pagination.total_pages => next,
            _ => return false,
        };
        self.store.set_page(next, scroll_offset);
        true
    }

    /// Returns false on the first page.
    pub fn previous_page(&self, scroll_offset: u32) -> bool {
        let current = self.store.params().page_number;
        if current == 0 {
            return false;
        }
        let last = self.store.pagination().total_pages.saturating_sub(1);
        self.store.set_page((current - 1).min(last), scroll_offset);
        true
    }
}
