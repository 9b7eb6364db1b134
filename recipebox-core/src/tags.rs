//! Tag management: CRUD over tags plus the set of tags selected for a recipe.

use std::sync::Arc;

use crate::api::RecipeApi;
use crate::config::FavoritesTag;
use crate::error::{TagError, ValidationError};
use crate::notify::Notification;
use crate::types::{Tag, TagDraft};

pub const DEFAULT_TAG_COLOR: &str = "#FF5733";
pub const DEFAULT_TAG_CATEGORY: &str = "Other";

/// Categories offered when creating or editing a tag.
pub const TAG_CATEGORIES: &[&str] = &["Dietary", "Cuisine", "Meal Type", "Difficulty", "Other"];

/// How many tags are loaded for browsing.
const TAG_PAGE_SIZE: u32 = 100;

impl Default for TagDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: DEFAULT_TAG_COLOR.to_string(),
            description: String::new(),
            category: DEFAULT_TAG_CATEGORY.to_string(),
        }
    }
}

impl From<&Tag> for TagDraft {
    fn from(tag: &Tag) -> Self {
        Self {
            name: tag.name.clone(),
            color: tag.color.clone(),
            description: tag.description.clone().unwrap_or_default(),
            category: tag
                .category
                .clone()
                .unwrap_or_else(|| DEFAULT_TAG_CATEGORY.to_string()),
        }
    }
}

pub struct TagManager<A: RecipeApi + ?Sized> {
    api: Arc<A>,
    favorites: FavoritesTag,
    tags: Vec<Tag>,
    /// Tags chosen for the recipe being edited
    selected: Vec<Tag>,
    /// Tag whose edit is in progress; `None` means the form creates a new tag
    editing: Option<Tag>,
    pub draft: TagDraft,
    pub search_term: String,
    /// `None` shows every category
    pub category_filter: Option<String>,
}

impl<A: RecipeApi + ?Sized> TagManager<A> {
    pub fn new(api: Arc<A>, favorites: FavoritesTag) -> Self {
        Self {
            api,
            favorites,
            tags: Vec::new(),
            selected: Vec::new(),
            editing: None,
            draft: TagDraft::default(),
            search_term: String::new(),
            category_filter: None,
        }
    }

    /// Start from a recipe's current tags.
    pub fn with_selection(mut self, selected: Vec<Tag>) -> Self {
        self.selected = selected;
        self
    }

    pub async fn load(&mut self) -> Result<(), TagError> {
        let page = self.api.list_tags(0, TAG_PAGE_SIZE).await?;
        tracing::debug!(count = page.content.len(), "tags loaded");
        self.tags = page.content;
        Ok(())
    }

    /// Every loaded tag, favorites included.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn selected(&self) -> &[Tag] {
        &self.selected
    }

    pub fn into_selection(self) -> Vec<Tag> {
        self.selected
    }

    fn is_favorites(&self, tag: &Tag) -> bool {
        tag.id == self.favorites.id || tag.name == self.favorites.name
    }

    /// Browsable tags: search term over name and description, then category.
    /// The favorites tag is never listed.
    pub fn filtered(&self) -> Vec<&Tag> {
        let term = self.search_term.to_lowercase();
        self.tags
            .iter()
            .filter(|tag| !self.is_favorites(tag))
            .filter(|tag| {
                tag.name.to_lowercase().contains(&term)
                    || tag
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&term))
            })
            .filter(|tag| match &self.category_filter {
                Some(category) => tag.category.as_deref() == Some(category.as_str()),
                None => true,
            })
            .collect()
    }

    /// Categories present among loaded tags, in first-seen order, for filtering.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for category in self.tags.iter().filter_map(|t| t.category.as_deref()) {
            if !category.is_empty() && !categories.iter().any(|c| c == category) {
                categories.push(category.to_string());
            }
        }
        categories
    }

    pub fn editing(&self) -> Option<&Tag> {
        self.editing.as_ref()
    }

    /// Load `tag` into the form; the next save updates it.
    pub fn begin_edit(&mut self, tag: &Tag) {
        self.draft = TagDraft::from(tag);
        self.editing = Some(tag.clone());
    }

    pub fn reset_form(&mut self) {
        self.draft = TagDraft::default();
        self.editing = None;
    }

    /// Create a tag, or update the one being edited.
    ///
    /// An updated tag that is currently selected is replaced in the selection.
    pub async fn save(&mut self) -> Result<Notification, TagError> {
        let name = self.draft.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyTagName.into());
        }
        let draft = TagDraft {
            name: name.to_string(),
            color: self.draft.color.clone(),
            description: self.draft.description.trim().to_string(),
            category: self.draft.category.clone(),
        };

        let message = match self.editing.take() {
            Some(editing) => {
                let updated = match self.api.update_tag(&editing.id, &draft).await {
                    Ok(tag) => tag,
                    Err(e) => {
                        self.editing = Some(editing);
                        return Err(e.into());
                    }
                };
                tracing::info!(id = %updated.id, name = %updated.name, "tag updated");
                replace_by_id(&mut self.tags, &updated);
                replace_by_id(&mut self.selected, &updated);
                "Tag updated successfully"
            }
            None => {
                let created = self.api.create_tag(&draft).await?;
                tracing::info!(id = %created.id, name = %created.name, "tag created");
                self.tags.push(created);
                "Tag created successfully"
            }
        };

        self.reset_form();
        Ok(Notification::success(message))
    }

    /// Delete a tag everywhere, including from the selection.
    pub async fn delete(&mut self, id: &str) -> Result<Notification, TagError> {
        self.api.delete_tag(id).await?;
        tracing::info!(id = %id, "tag deleted");
        self.tags.retain(|t| t.id != id);
        self.selected.retain(|t| t.id != id);
        if self.editing.as_ref().is_some_and(|t| t.id == id) {
            self.reset_form();
        }
        Ok(Notification::success("Tag deleted successfully"))
    }

    pub fn add_to_selection(&mut self, tag: &Tag) -> Notification {
        if self.selected.iter().any(|t| t.id == tag.id) {
            return Notification::info("This tag is already added to the recipe");
        }
        self.selected.push(tag.clone());
        Notification::success(format!("Added \"{}\" to recipe", tag.name))
    }

    pub fn remove_from_selection(&mut self, id: &str) {
        self.selected.retain(|t| t.id != id);
    }
}

fn replace_by_id(tags: &mut [Tag], updated: &Tag) {
    for tag in tags.iter_mut().filter(|t| t.id == updated.id) {
        *tag = updated.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApi;
    use crate::notify::NotificationKind;

    fn tag(id: &str, name: &str, category: &str) -> Tag {
        Tag {
            id: id.to_string(),
            name: name.to_string(),
            color: DEFAULT_TAG_COLOR.to_string(),
            description: Some(format!("{} dishes", name)),
            category: Some(category.to_string()),
            usage_count: 0,
        }
    }

    async fn loaded() -> (Arc<MockApi>, TagManager<MockApi>) {
        let api = Arc::new(MockApi::new());
        api.insert_tag(tag("favorite-tag-id", "Favorite", "System"));
        api.insert_tag(tag("t1", "Vegan", "Dietary"));
        api.insert_tag(tag("t2", "Italian", "Cuisine"));
        api.insert_tag(tag("t3", "Quick", "Difficulty"));

        let mut manager = TagManager::new(api.clone(), FavoritesTag::default());
        manager.load().await.unwrap();
        (api, manager)
    }

    #[tokio::test]
    async fn test_filtered_hides_favorites() {
        let (_api, mut manager) = loaded().await;
        let names: Vec<_> = manager.filtered().iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["Italian", "Quick", "Vegan"]);

        manager.search_term = "DISHES".to_string();
        manager.category_filter = Some("Cuisine".to_string());
        let names: Vec<_> = manager.filtered().iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["Italian"]);

        assert_eq!(
            manager.categories(),
            vec!["System", "Cuisine", "Difficulty", "Dietary"]
        );
    }

    #[tokio::test]
    async fn test_empty_name_rejected_without_request() {
        let (api, mut manager) = loaded().await;
        manager.draft.name = "  ".to_string();
        let err = manager.save().await.unwrap_err();
        assert!(matches!(err, TagError::Invalid(ValidationError::EmptyTagName)));
        assert_eq!(api.calls(), vec!["GET /api/tags".to_string()]);
    }

    #[tokio::test]
    async fn test_create_uses_defaults_and_resets() {
        let (_api, mut manager) = loaded().await;
        manager.draft.name = " Spicy ".to_string();
        let note = manager.save().await.unwrap();

        assert_eq!(note.description, "Tag created successfully");
        let created = manager.tags().last().unwrap();
        assert_eq!(created.name, "Spicy");
        assert_eq!(created.color, "#FF5733");
        assert_eq!(created.category.as_deref(), Some("Other"));
        assert_eq!(manager.draft, TagDraft::default());
    }

    #[tokio::test]
    async fn test_duplicate_name_surfaces_server_message() {
        let (_api, mut manager) = loaded().await;
        manager.draft.name = "vegan".to_string();
        let err = manager.save().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to save tag: Server returned 409: Tag with this name already exists"
        );
    }

    #[tokio::test]
    async fn test_delete_removes_from_selection() {
        let (_api, manager) = loaded().await;
        let vegan = manager
            .tags()
            .iter()
            .find(|t| t.id == "t1")
            .cloned()
            .unwrap();
        let mut manager = manager.with_selection(vec![vegan.clone()]);

        manager.delete(&vegan.id).await.unwrap();
        assert!(manager.selected().is_empty());
        assert!(manager.tags().iter().all(|t| t.id != vegan.id));
    }

    #[tokio::test]
    async fn test_add_to_selection_once() {
        let (_api, mut manager) = loaded().await;
        let quick = tag("t3", "Quick", "Difficulty");
        assert_eq!(manager.add_to_selection(&quick).kind, NotificationKind::Success);
        assert_eq!(manager.add_to_selection(&quick).kind, NotificationKind::Info);
        manager.remove_from_selection("t3");
        assert!(manager.selected().is_empty());
    }
}
