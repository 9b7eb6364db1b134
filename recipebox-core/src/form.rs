//! Recipe authoring: local draft state, validation, preview and submit.

use crate::api::RecipeApi;
use crate::error::{SubmitError, ValidationError};
use crate::notify::Notification;
use crate::render::{html_to_text, RecipeView};
use crate::search::SearchStore;
use crate::types::{Image, Ingredient, Recipe, RecipePayload, Step, Tag, TagId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: String },
}

/// Result of a successful submit.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub recipe: Recipe,
    /// A success message, plus a warning if images could not be relinked
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone)]
pub struct RecipeForm {
    mode: FormMode,
    pub name: String,
    /// Rich text (HTML)
    pub description: String,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<Step>,
    /// Images already attached to the recipe being edited
    images: Vec<Image>,
}

impl Default for RecipeForm {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeForm {
    /// An empty form for a new recipe.
    pub fn new() -> Self {
        Self {
            mode: FormMode::Create,
            name: String::new(),
            description: String::new(),
            tags: Vec::new(),
            ingredients: Vec::new(),
            steps: Vec::new(),
            images: Vec::new(),
        }
    }

    /// Prefill from a persisted recipe for editing.
    ///
    /// The name is a plain string, so any markup stored in it is stripped.
    /// A recipe without an id opens in create mode.
    pub fn from_recipe(recipe: &Recipe) -> Self {
        let mode = match &recipe.id {
            Some(id) => FormMode::Edit { id: id.clone() },
            None => FormMode::Create,
        };
        let images = match mode {
            FormMode::Edit { .. } => recipe.images.clone(),
            FormMode::Create => Vec::new(),
        };

        Self {
            mode,
            name: html_to_text(&recipe.name),
            description: recipe.description.clone(),
            tags: recipe.tags.clone(),
            ingredients: recipe.ingredients.clone(),
            steps: recipe.steps.clone(),
            images,
        }
    }

    /// Prefill a new recipe from an imported draft.
    pub fn from_import(draft: Recipe) -> Self {
        Self {
            mode: FormMode::Create,
            name: html_to_text(&draft.name),
            description: draft.description,
            tags: draft.tags,
            ingredients: draft.ingredients,
            steps: draft.steps,
            images: Vec::new(),
        }
    }

    /// Replace the editable content with `draft`, keeping the mode and images.
    pub fn apply_draft(&mut self, draft: Recipe) {
        self.name = html_to_text(&draft.name);
        self.description = draft.description;
        self.tags = draft.tags;
        self.ingredients = draft.ingredients;
        self.steps = draft.steps;
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn recipe_id(&self) -> Option<&str> {
        match &self.mode {
            FormMode::Edit { id } => Some(id),
            FormMode::Create => None,
        }
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn add_ingredient(&mut self, ingredient: Ingredient) {
        self.ingredients.push(ingredient);
    }

    /// Returns false if `index` is out of range.
    pub fn update_ingredient(&mut self, index: usize, ingredient: Ingredient) -> bool {
        match self.ingredients.get_mut(index) {
            Some(slot) => {
                *slot = ingredient;
                true
            }
            None => false,
        }
    }

    pub fn remove_ingredient(&mut self, index: usize) -> Option<Ingredient> {
        (index < self.ingredients.len()).then(|| self.ingredients.remove(index))
    }

    pub fn move_ingredient(&mut self, from: usize, to: usize) -> bool {
        move_item(&mut self.ingredients, from, to)
    }

    pub fn add_step(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn update_step(&mut self, index: usize, step: Step) -> bool {
        match self.steps.get_mut(index) {
            Some(slot) => {
                *slot = step;
                true
            }
            None => false,
        }
    }

    pub fn remove_step(&mut self, index: usize) -> Option<Step> {
        (index < self.steps.len()).then(|| self.steps.remove(index))
    }

    pub fn move_step(&mut self, from: usize, to: usize) -> bool {
        move_item(&mut self.steps, from, to)
    }

    /// Returns false if a tag with the same id is already attached.
    pub fn add_tag(&mut self, tag: Tag) -> bool {
        if self.tags.iter().any(|t| t.id == tag.id) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn remove_tag(&mut self, tag_id: &str) {
        self.tags.retain(|t| t.id != tag_id);
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.ingredients.is_empty() {
            return Err(ValidationError::NoIngredients);
        }
        if self.steps.is_empty() {
            return Err(ValidationError::NoSteps);
        }
        if let Some((index, ingredient)) = self
            .ingredients
            .iter()
            .enumerate()
            .find(|(_, i)| !(i.quantity > 0.0))
        {
            return Err(ValidationError::NonPositiveQuantity {
                index,
                name: ingredient.name.clone(),
            });
        }
        Ok(())
    }

    /// Body for create and update requests.
    pub fn payload(&self) -> RecipePayload {
        RecipePayload {
            name: self.name.clone(),
            description: self.description.clone(),
            ingredients: self.ingredients.clone(),
            steps: self.steps.clone(),
            tags: self
                .tags
                .iter()
                .map(|t| TagId { id: t.id.clone() })
                .collect(),
        }
    }

    /// The form's content as an unsaved recipe.
    pub fn to_recipe(&self) -> Recipe {
        Recipe {
            id: self.recipe_id().map(str::to_string),
            name: self.name.clone(),
            description: self.description.clone(),
            ingredients: self.ingredients.clone(),
            steps: self.steps.clone(),
            tags: self.tags.clone(),
            images: self.images.clone(),
        }
    }

    /// Render the draft without saving it.
    pub fn preview(&self) -> Result<RecipeView, ValidationError> {
        self.validate()?;
        Ok(RecipeView::from(&self.to_recipe()))
    }

    /// Create or update the recipe.
    ///
    /// Nothing is sent if validation fails. In edit mode the existing images are
    /// relinked after the update; a relink failure is reported as a warning and
    /// the update itself stands.
    pub async fn submit<A: RecipeApi + ?Sized>(
        &self,
        api: &A,
        store: &SearchStore,
    ) -> Result<SubmitOutcome, SubmitError> {
        self.validate()?;
        let payload = self.payload();
        let mut notifications = Vec::new();

        let recipe = match &self.mode {
            FormMode::Create => {
                let recipe = api.create_recipe(&payload).await?;
                tracing::info!(id = ?recipe.id, name = %recipe.name, "recipe created");
                recipe
            }
            FormMode::Edit { id } => {
                let updated = api.update_recipe(id, &payload).await?;
                tracing::info!(id = %id, "recipe updated");
                self.relink_images(api, id, updated, &mut notifications)
                    .await
            }
        };

        store.bump_refresh();
        notifications.insert(0, Notification::success("Recipe has been saved"));
        Ok(SubmitOutcome {
            recipe,
            notifications,
        })
    }

    async fn relink_images<A: RecipeApi + ?Sized>(
        &self,
        api: &A,
        id: &str,
        updated: Recipe,
        notifications: &mut Vec<Notification>,
    ) -> Recipe {
        if self.images.is_empty() {
            return updated;
        }

        let image_ids: Vec<String> = self.images.iter().map(|i| i.id.clone()).collect();
        match api.link_images(id, &image_ids).await {
            Ok(recipe) => recipe,
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "failed to relink images");
                notifications.push(Notification::warning(format!(
                    "Recipe was saved but its images could not be kept: {}",
                    e
                )));
                updated
            }
        }
    }
}

fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApi;
    use crate::config::FavoritesTag;
    use crate::notify::NotificationKind;

    fn store() -> SearchStore {
        SearchStore::new(&FavoritesTag::default(), 10)
    }

    fn tea() -> RecipeForm {
        let mut form = RecipeForm::new();
        form.name = "Tea".to_string();
        form.add_ingredient(Ingredient::new("Water", "CUPS", 1.0));
        form.add_step(Step::new("Boil", "Boil the water"));
        form
    }

    fn image(id: &str) -> Image {
        Image {
            id: id.to_string(),
            filename: format!("{}.jpg", id),
            content_type: "image/jpeg".to_string(),
            description: None,
            is_primary: false,
            upload_date: None,
        }
    }

    #[tokio::test]
    async fn test_invalid_forms_send_nothing() {
        let mut blank_name = tea();
        blank_name.name = "   ".to_string();

        let mut no_ingredients = tea();
        no_ingredients.ingredients.clear();

        let mut no_steps = tea();
        no_steps.steps.clear();

        let mut zero_quantity = tea();
        zero_quantity.add_ingredient(Ingredient::new("Sugar", "GRAMS", 0.0));

        let api = MockApi::new();
        let store = store();
        for (form, expected) in [
            (blank_name, ValidationError::EmptyName),
            (no_ingredients, ValidationError::NoIngredients),
            (no_steps, ValidationError::NoSteps),
            (
                zero_quantity,
                ValidationError::NonPositiveQuantity {
                    index: 1,
                    name: "Sugar".to_string(),
                },
            ),
        ] {
            match form.submit(&api, &store).await {
                Err(SubmitError::Invalid(e)) => assert_eq!(e, expected),
                other => panic!("expected validation error, got {:?}", other.map(|o| o.recipe)),
            }
            assert_eq!(form.preview(), Err(expected));
        }

        assert!(api.calls().is_empty());
        assert_eq!(store.refresh_counter(), 0);
    }

    #[tokio::test]
    async fn test_create_posts_and_bumps_refresh() {
        let api = MockApi::new();
        let store = store();
        let mut form = tea();
        form.add_tag(Tag {
            id: "t1".to_string(),
            name: "Drinks".to_string(),
            ..Default::default()
        });

        let outcome = form.submit(&api, &store).await.unwrap();
        assert!(outcome.recipe.id.is_some());
        assert_eq!(api.calls(), vec!["POST /api/recipes".to_string()]);
        assert_eq!(store.refresh_counter(), 1);
        assert_eq!(outcome.notifications.len(), 1);
        assert_eq!(outcome.notifications[0].kind, NotificationKind::Success);
        assert_eq!(outcome.recipe.tags[0].id, "t1");
    }

    #[tokio::test]
    async fn test_edit_relinks_existing_images() {
        let api = MockApi::new();
        let stored = api.insert_recipe(Recipe {
            name: "<b>Tea</b>".to_string(),
            ingredients: vec![Ingredient::new("Water", "CUPS", 1.0)],
            steps: vec![Step::new("Boil", "")],
            images: vec![image("img-1")],
            ..Default::default()
        });
        let id = stored.id.clone().unwrap();

        let mut form = RecipeForm::from_recipe(&stored);
        assert_eq!(form.name, "Tea");
        assert_eq!(form.recipe_id(), Some(id.as_str()));
        form.name = "Green tea".to_string();

        let outcome = form.submit(&api, &store()).await.unwrap();
        assert_eq!(
            api.calls(),
            vec![
                format!("PUT /api/recipes/{}", id),
                format!("PATCH /api/recipes/{}/images/link", id),
            ]
        );
        assert_eq!(outcome.recipe.name, "Green tea");
        assert_eq!(outcome.recipe.images.len(), 1);
    }

    #[tokio::test]
    async fn test_relink_failure_is_a_warning() {
        let api = MockApi::new();
        let stored = api.insert_recipe(Recipe {
            name: "Tea".to_string(),
            ingredients: vec![Ingredient::new("Water", "CUPS", 1.0)],
            steps: vec![Step::new("Boil", "")],
            images: vec![image("img-1")],
            ..Default::default()
        });
        let id = stored.id.clone().unwrap();
        api.fail_on(&format!("PATCH /api/recipes/{}/images/link", id));

        let store = store();
        let outcome = RecipeForm::from_recipe(&stored)
            .submit(&api, &store)
            .await
            .unwrap();

        assert_eq!(store.refresh_counter(), 1);
        let kinds: Vec<_> = outcome.notifications.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![NotificationKind::Success, NotificationKind::Warning]
        );
        assert!(outcome.recipe.images.is_empty());
    }

    #[test]
    fn test_editing_helpers() {
        let mut form = tea();
        form.add_step(Step::new("Steep", ""));
        form.add_step(Step::new("Serve", ""));

        assert!(form.move_step(2, 0));
        let titles: Vec<_> = form.steps.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Serve", "Boil", "Steep"]);
        assert!(!form.move_step(0, 3));

        assert!(form.update_ingredient(0, Ingredient::new("Water", "MILLILITERS", 250.0)));
        assert!(!form.update_ingredient(5, Ingredient::new("Milk", "CUPS", 1.0)));
        assert!(form.remove_ingredient(3).is_none());
        assert_eq!(form.remove_step(1).map(|s| s.title), Some("Boil".to_string()));

        let tag = Tag {
            id: "t1".to_string(),
            ..Default::default()
        };
        assert!(form.add_tag(tag.clone()));
        assert!(!form.add_tag(tag));
        form.remove_tag("t1");
        assert!(form.tags.is_empty());
    }

    #[test]
    fn test_import_draft_opens_in_create_mode() {
        let form = RecipeForm::from_import(Recipe {
            id: Some("ignored".to_string()),
            name: "Pancakes".to_string(),
            images: vec![image("remote")],
            ..Default::default()
        });
        assert_eq!(form.mode(), &FormMode::Create);
        assert!(form.images().is_empty());
        assert_eq!(form.payload().name, "Pancakes");
    }

    #[test]
    fn test_apply_draft_keeps_mode_and_images() {
        let stored = Recipe {
            id: Some("r1".to_string()),
            name: "Tea".to_string(),
            images: vec![image("img-1")],
            ..Default::default()
        };
        let mut form = RecipeForm::from_recipe(&stored);
        form.apply_draft(Recipe {
            name: "Iced tea".to_string(),
            steps: vec![Step::new("Chill", "")],
            ..Default::default()
        });

        assert_eq!(form.recipe_id(), Some("r1"));
        assert_eq!(form.images().len(), 1);
        assert_eq!(form.name, "Iced tea");
        assert_eq!(form.steps.len(), 1);
    }
}
