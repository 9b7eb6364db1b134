//! In-memory backend for testing.
//!
//! Behaves like the real recipe service closely enough for the client-side
//! coordinators: ids are assigned on create, tag references resolve against the
//! tag store, searches filter and paginate. Every call is recorded as
//! `"METHOD /api/path"` and can be made to fail with [`MockApi::fail_on`].

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use super::RecipeApi;
use crate::error::ApiError;
use crate::types::{
    ConversionRequest, ConversionResponse, Direction, ExportFormat, Image, ImageUpload,
    ImportJob, ImportStatus, Page, PageInfo, Recipe, RecipePayload, SearchParams, SortField, Tag,
    TagDraft, TagRef, Unit,
};

#[derive(Default)]
struct MockState {
    recipes: Vec<Recipe>,
    tags: Vec<Tag>,
    units: Vec<Unit>,
    /// Image metadata and bytes by image id, independent of which recipe links them
    images: HashMap<String, (Image, Vec<u8>)>,
    /// Import URL -> job id
    import_urls: HashMap<String, String>,
    /// Job id -> scripted status responses; the last one repeats
    import_jobs: HashMap<String, VecDeque<ImportJob>>,
    failing: HashSet<String>,
    calls: Vec<String>,
    searches: Vec<SearchParams>,
    next_id: u64,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn resolve_tag(&self, id: &str, name: &str) -> Tag {
        self.tags
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .unwrap_or_else(|| Tag {
                id: id.to_string(),
                name: name.to_string(),
                ..Default::default()
            })
    }

    fn recipe_mut(&mut self, id: &str) -> Result<&mut Recipe, ApiError> {
        self.recipes
            .iter_mut()
            .find(|r| r.id.as_deref() == Some(id))
            .ok_or_else(|| ApiError::NotFound(format!("/api/recipes/{}", id)))
    }
}

/// Mock recipe backend.
#[derive(Default)]
pub struct MockApi {
    state: Mutex<MockState>,
}

#[allow(dead_code)]
impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a recipe, assigning an id if it has none. Returns the stored copy.
    pub fn insert_recipe(&self, mut recipe: Recipe) -> Recipe {
        let mut state = self.state.lock().unwrap();
        if recipe.id.is_none() {
            recipe.id = Some(state.next_id("recipe"));
        }
        for image in &recipe.images {
            state
                .images
                .insert(image.id.clone(), (image.clone(), Vec::new()));
        }
        state.recipes.push(recipe.clone());
        recipe
    }

    pub fn insert_tag(&self, tag: Tag) -> Tag {
        let mut state = self.state.lock().unwrap();
        state.tags.push(tag.clone());
        tag
    }

    pub fn with_units(self, units: Vec<Unit>) -> Self {
        self.state.lock().unwrap().units = units;
        self
    }

    /// Script the status responses for an import of `url`.
    ///
    /// Submitting `url` returns a `STARTED` job with `job_id`; each status poll
    /// then pops the next scripted job, repeating the last one forever.
    pub fn script_import(&self, url: &str, job_id: &str, statuses: Vec<ImportJob>) {
        let mut state = self.state.lock().unwrap();
        state
            .import_urls
            .insert(url.to_string(), job_id.to_string());
        state
            .import_jobs
            .insert(job_id.to_string(), statuses.into_iter().collect());
    }

    /// Make every call matching `"METHOD /api/path"` fail with a 500.
    pub fn fail_on(&self, call: &str) {
        self.state.lock().unwrap().failing.insert(call.to_string());
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, call: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.as_str() == call)
            .count()
    }

    /// Parameters of every search request received, in order.
    pub fn searches(&self) -> Vec<SearchParams> {
        self.state.lock().unwrap().searches.clone()
    }

    pub fn recipe(&self, id: &str) -> Option<Recipe> {
        self.state
            .lock()
            .unwrap()
            .recipes
            .iter()
            .find(|r| r.id.as_deref() == Some(id))
            .cloned()
    }

    pub fn recipe_count(&self) -> usize {
        self.state.lock().unwrap().recipes.len()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.state.lock().unwrap().tags.clone()
    }

    /// Record a call and apply any configured failure.
    fn record(&self, call: String) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let failing = state.failing.contains(&call);
        state.calls.push(call);
        if failing {
            return Err(ApiError::Status {
                status: 500,
                body: "Injected failure".to_string(),
            });
        }
        Ok(())
    }
}

fn paginate<T: Clone>(items: &[T], page: u32, size: u32) -> Page<T> {
    let size = size.max(1);
    let total = items.len() as u64;
    let total_pages = items.len().div_ceil(size as usize) as u32;
    let start = (page as usize).saturating_mul(size as usize);
    let content = items
        .iter()
        .skip(start)
        .take(size as usize)
        .cloned()
        .collect();

    Page {
        content,
        page: PageInfo {
            size,
            number: page,
            total_elements: total,
            total_pages,
        },
    }
}

fn matches_search(recipe: &Recipe, params: &SearchParams) -> bool {
    let name_ok = match params.name.as_deref() {
        Some(name) if !name.is_empty() => recipe
            .name
            .to_lowercase()
            .contains(&name.to_lowercase()),
        _ => true,
    };

    let ingredients_ok = params.ingredients.iter().all(|wanted| {
        let wanted = wanted.to_lowercase();
        recipe
            .ingredients
            .iter()
            .any(|i| i.name.to_lowercase().contains(&wanted))
    });

    let tags_ok = params.tag_ids.iter().all(|id| recipe.has_tag(id));

    name_ok && ingredients_ok && tags_ok
}

/// Unit dimension and factor to the dimension's base unit.
fn unit_factor(unit: &str) -> Option<(&'static str, f64)> {
    match unit.to_ascii_uppercase().as_str() {
        "GRAMS" => Some(("mass", 1.0)),
        "OUNCES" => Some(("mass", 28.349523125)),
        "POUNDS" => Some(("mass", 453.59237)),
        "MILLILITERS" => Some(("volume", 1.0)),
        "LITERS" => Some(("volume", 1000.0)),
        "CUPS" => Some(("volume", 236.5882365)),
        "TABLESPOONS" => Some(("volume", 14.78676478125)),
        "TEASPOONS" => Some(("volume", 4.92892159375)),
        _ => None,
    }
}

fn format_quantity(value: f64) -> String {
    let rounded = format!("{:.2}", value);
    rounded
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[async_trait]
impl RecipeApi for MockApi {
    async fn search_recipes(&self, params: &SearchParams) -> Result<Page<Recipe>, ApiError> {
        self.record("GET /api/recipes/search/advanced".to_string())?;
        let mut state = self.state.lock().unwrap();
        state.searches.push(params.clone());

        let mut matching: Vec<Recipe> = state
            .recipes
            .iter()
            .filter(|r| matches_search(r, params))
            .cloned()
            .collect();

        // Insertion order stands in for the date fields
        if params.sort_field == SortField::Name {
            matching.sort_by_key(|r| r.name.to_lowercase());
        }
        if params.direction == Direction::Desc {
            matching.reverse();
        }

        Ok(paginate(&matching, params.page_number, params.size))
    }

    async fn get_recipe(&self, id: &str) -> Result<Recipe, ApiError> {
        self.record(format!("GET /api/recipes/{}", id))?;
        let mut state = self.state.lock().unwrap();
        state.recipe_mut(id).map(|r| r.clone())
    }

    async fn create_recipe(&self, payload: &RecipePayload) -> Result<Recipe, ApiError> {
        self.record("POST /api/recipes".to_string())?;
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("recipe");
        let tags = payload
            .tags
            .iter()
            .map(|t| state.resolve_tag(&t.id, &t.id))
            .collect();

        let recipe = Recipe {
            id: Some(id),
            name: payload.name.clone(),
            description: payload.description.clone(),
            ingredients: payload.ingredients.clone(),
            steps: payload.steps.clone(),
            tags,
            images: Vec::new(),
        };
        state.recipes.push(recipe.clone());
        Ok(recipe)
    }

    async fn update_recipe(&self, id: &str, payload: &RecipePayload) -> Result<Recipe, ApiError> {
        self.record(format!("PUT /api/recipes/{}", id))?;
        let mut state = self.state.lock().unwrap();
        let tags: Vec<Tag> = payload
            .tags
            .iter()
            .map(|t| state.resolve_tag(&t.id, &t.id))
            .collect();

        // A full replace drops image links; clients relink the ones they keep.
        let recipe = state.recipe_mut(id)?;
        recipe.name = payload.name.clone();
        recipe.description = payload.description.clone();
        recipe.ingredients = payload.ingredients.clone();
        recipe.steps = payload.steps.clone();
        recipe.tags = tags;
        recipe.images.clear();
        Ok(recipe.clone())
    }

    async fn delete_recipe(&self, id: &str) -> Result<(), ApiError> {
        self.record(format!("DELETE /api/recipes/{}", id))?;
        let mut state = self.state.lock().unwrap();
        let before = state.recipes.len();
        state.recipes.retain(|r| r.id.as_deref() != Some(id));
        if state.recipes.len() == before {
            return Err(ApiError::NotFound(format!("/api/recipes/{}", id)));
        }
        Ok(())
    }

    async fn add_recipe_tags(&self, id: &str, tags: &[TagRef]) -> Result<Recipe, ApiError> {
        self.record(format!("PATCH /api/recipes/{}/tags", id))?;
        let mut state = self.state.lock().unwrap();
        let resolved: Vec<Tag> = tags
            .iter()
            .map(|t| state.resolve_tag(&t.id, &t.name))
            .collect();

        let recipe = state.recipe_mut(id)?;
        for tag in resolved {
            if !recipe.has_tag(&tag.id) {
                recipe.tags.push(tag);
            }
        }
        Ok(recipe.clone())
    }

    async fn remove_recipe_tags(&self, id: &str, tags: &[TagRef]) -> Result<Recipe, ApiError> {
        self.record(format!("DELETE /api/recipes/{}/tags", id))?;
        let mut state = self.state.lock().unwrap();
        let recipe = state.recipe_mut(id)?;
        recipe.tags.retain(|t| !tags.iter().any(|r| r.id == t.id));
        Ok(recipe.clone())
    }

    async fn add_image(&self, recipe_id: &str, upload: ImageUpload) -> Result<Recipe, ApiError> {
        self.record(format!("PATCH /api/recipes/{}/image", recipe_id))?;
        let mut state = self.state.lock().unwrap();
        let image_id = state.next_id("image");
        let is_primary = state.recipe_mut(recipe_id)?.images.is_empty();

        let image = Image {
            id: image_id.clone(),
            filename: upload.filename,
            content_type: upload.content_type,
            description: Some(upload.description),
            is_primary,
            upload_date: Some(chrono::Utc::now()),
        };
        state
            .images
            .insert(image_id, (image.clone(), upload.bytes));

        let recipe = state.recipe_mut(recipe_id)?;
        recipe.images.push(image);
        Ok(recipe.clone())
    }

    async fn set_primary_image(
        &self,
        recipe_id: &str,
        image_id: &str,
    ) -> Result<Recipe, ApiError> {
        self.record(format!(
            "PATCH /api/recipes/{}/image/{}/primary",
            recipe_id, image_id
        ))?;
        let mut state = self.state.lock().unwrap();
        let recipe = state.recipe_mut(recipe_id)?;
        if !recipe.images.iter().any(|i| i.id == image_id) {
            return Err(ApiError::NotFound(format!("/api/images/{}", image_id)));
        }
        for image in recipe.images.iter_mut() {
            image.is_primary = image.id == image_id;
        }
        Ok(recipe.clone())
    }

    async fn link_images(
        &self,
        recipe_id: &str,
        image_ids: &[String],
    ) -> Result<Recipe, ApiError> {
        self.record(format!("PATCH /api/recipes/{}/images/link", recipe_id))?;
        let mut state = self.state.lock().unwrap();
        let linked: Vec<Image> = image_ids
            .iter()
            .filter_map(|id| state.images.get(id).map(|(image, _)| image.clone()))
            .collect();

        let recipe = state.recipe_mut(recipe_id)?;
        recipe.images = linked;
        Ok(recipe.clone())
    }

    async fn fetch_image(&self, image_id: &str) -> Result<Vec<u8>, ApiError> {
        self.record(format!("GET /api/images/{}/image", image_id))?;
        let state = self.state.lock().unwrap();
        state
            .images
            .get(image_id)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| ApiError::NotFound(format!("/api/images/{}/image", image_id)))
    }

    async fn list_tags(&self, page: u32, size: u32) -> Result<Page<Tag>, ApiError> {
        self.record("GET /api/tags".to_string())?;
        let state = self.state.lock().unwrap();
        let mut tags = state.tags.clone();
        tags.sort_by_key(|t| t.name.to_lowercase());
        Ok(paginate(&tags, page, size))
    }

    async fn create_tag(&self, draft: &TagDraft) -> Result<Tag, ApiError> {
        self.record("POST /api/tags".to_string())?;
        let mut state = self.state.lock().unwrap();
        if state
            .tags
            .iter()
            .any(|t| t.name.eq_ignore_ascii_case(&draft.name))
        {
            return Err(ApiError::Status {
                status: 409,
                body: "Tag with this name already exists".to_string(),
            });
        }

        let tag = Tag {
            id: state.next_id("tag"),
            name: draft.name.clone(),
            color: draft.color.clone(),
            description: Some(draft.description.clone()),
            category: Some(draft.category.clone()),
            usage_count: 0,
        };
        state.tags.push(tag.clone());
        Ok(tag)
    }

    async fn update_tag(&self, id: &str, draft: &TagDraft) -> Result<Tag, ApiError> {
        self.record(format!("PUT /api/tags/{}", id))?;
        let mut state = self.state.lock().unwrap();
        let tag = state
            .tags
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("/api/tags/{}", id)))?;

        tag.name = draft.name.clone();
        tag.color = draft.color.clone();
        tag.description = Some(draft.description.clone());
        tag.category = Some(draft.category.clone());
        let updated = tag.clone();

        for recipe in state.recipes.iter_mut() {
            for t in recipe.tags.iter_mut().filter(|t| t.id == id) {
                *t = updated.clone();
            }
        }
        Ok(updated)
    }

    async fn delete_tag(&self, id: &str) -> Result<(), ApiError> {
        self.record(format!("DELETE /api/tags/{}", id))?;
        let mut state = self.state.lock().unwrap();
        state.tags.retain(|t| t.id != id);
        for recipe in state.recipes.iter_mut() {
            recipe.tags.retain(|t| t.id != id);
        }
        Ok(())
    }

    async fn list_units(&self) -> Result<Vec<Unit>, ApiError> {
        self.record("GET /api/units".to_string())?;
        Ok(self.state.lock().unwrap().units.clone())
    }

    async fn convert_units(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResponse, ApiError> {
        self.record("POST /api/units/convert".to_string())?;
        let unsupported = || ApiError::Status {
            status: 400,
            body: format!(
                "Cannot convert from {} to {}",
                request.from_unit, request.to_unit
            ),
        };

        let (from_dim, from_factor) = unit_factor(&request.from_unit).ok_or_else(unsupported)?;
        let (to_dim, to_factor) = unit_factor(&request.to_unit).ok_or_else(unsupported)?;
        if from_dim != to_dim {
            return Err(unsupported());
        }

        let converted = request.value * from_factor / to_factor;
        Ok(ConversionResponse {
            original_value: request.value,
            original_unit: request.from_unit.to_ascii_uppercase(),
            original_unit_name: request.from_unit.to_lowercase(),
            converted_value: converted,
            converted_unit: request.to_unit.to_ascii_uppercase(),
            converted_unit_name: request.to_unit.to_lowercase(),
            formatted_original_value: format_quantity(request.value),
            formatted_converted_value: format_quantity(converted),
        })
    }

    async fn can_convert(&self, from_unit: &str, to_unit: &str) -> Result<bool, ApiError> {
        self.record("GET /api/units/can-convert".to_string())?;
        Ok(matches!(
            (unit_factor(from_unit), unit_factor(to_unit)),
            (Some((a, _)), Some((b, _))) if a == b
        ))
    }

    async fn submit_import(&self, url: &str) -> Result<ImportJob, ApiError> {
        self.record("POST /api/recipes/import/jobs".to_string())?;
        let state = self.state.lock().unwrap();
        let job_id = state.import_urls.get(url).ok_or_else(|| ApiError::Status {
            status: 400,
            body: format!("Unsupported URL: {}", url),
        })?;

        Ok(ImportJob {
            job_id: job_id.clone(),
            status: ImportStatus::Started,
            result: None,
            error_message: None,
        })
    }

    async fn import_status(&self, job_id: &str) -> Result<ImportJob, ApiError> {
        self.record(format!("GET /api/recipes/import/jobs/{}", job_id))?;
        let mut state = self.state.lock().unwrap();
        let queue = state
            .import_jobs
            .get_mut(job_id)
            .ok_or_else(|| ApiError::NotFound(format!("/api/recipes/import/jobs/{}", job_id)))?;

        let job = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        job.ok_or_else(|| ApiError::Decode(format!("No scripted status for job {}", job_id)))
    }

    async fn export_recipe(&self, id: &str, format: ExportFormat) -> Result<Vec<u8>, ApiError> {
        self.record(format!("GET /api/recipes/export/{}/{}", id, format.path()))?;
        let mut state = self.state.lock().unwrap();
        let recipe = state.recipe_mut(id)?.clone();
        match format {
            ExportFormat::Json => {
                serde_json::to_vec_pretty(&recipe).map_err(|e| ApiError::Decode(e.to_string()))
            }
            ExportFormat::MarkdownZip => Ok(format!("# {}\n", recipe.name).into_bytes()),
        }
    }
}
