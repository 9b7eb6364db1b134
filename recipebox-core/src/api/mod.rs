//! Backend REST API access.
//!
//! Every request the client makes goes through [`RecipeApi`], so the
//! coordinators can run against [`MockApi`] in tests.

mod client;
mod mock;

pub use client::HttpRecipeApi;
pub use mock::MockApi;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::{
    ConversionRequest, ConversionResponse, ExportFormat, ImageUpload, ImportJob, Page, Recipe,
    RecipePayload, SearchParams, Tag, TagDraft, TagRef, Unit,
};

#[async_trait]
pub trait RecipeApi: Send + Sync {
    /// `GET /api/recipes/search/advanced`
    async fn search_recipes(&self, params: &SearchParams) -> Result<Page<Recipe>, ApiError>;

    /// `GET /api/recipes/{id}`
    async fn get_recipe(&self, id: &str) -> Result<Recipe, ApiError>;

    /// `POST /api/recipes`
    async fn create_recipe(&self, payload: &RecipePayload) -> Result<Recipe, ApiError>;

    /// `PUT /api/recipes/{id}`
    async fn update_recipe(&self, id: &str, payload: &RecipePayload) -> Result<Recipe, ApiError>;

    /// `DELETE /api/recipes/{id}`
    async fn delete_recipe(&self, id: &str) -> Result<(), ApiError>;

    /// `PATCH /api/recipes/{id}/tags`
    async fn add_recipe_tags(&self, id: &str, tags: &[TagRef]) -> Result<Recipe, ApiError>;

    /// `DELETE /api/recipes/{id}/tags`
    async fn remove_recipe_tags(&self, id: &str, tags: &[TagRef]) -> Result<Recipe, ApiError>;

    /// `PATCH /api/recipes/{id}/image` (multipart)
    async fn add_image(&self, recipe_id: &str, upload: ImageUpload) -> Result<Recipe, ApiError>;

    /// `PATCH /api/recipes/{id}/image/{imageId}/primary`
    async fn set_primary_image(&self, recipe_id: &str, image_id: &str)
        -> Result<Recipe, ApiError>;

    /// `PATCH /api/recipes/{id}/images/link`
    async fn link_images(&self, recipe_id: &str, image_ids: &[String])
        -> Result<Recipe, ApiError>;

    /// `GET /api/images/{id}/image`
    async fn fetch_image(&self, image_id: &str) -> Result<Vec<u8>, ApiError>;

    /// `GET /api/tags`
    async fn list_tags(&self, page: u32, size: u32) -> Result<Page<Tag>, ApiError>;

    /// `POST /api/tags`
    async fn create_tag(&self, draft: &TagDraft) -> Result<Tag, ApiError>;

    /// `PUT /api/tags/{id}`
    async fn update_tag(&self, id: &str, draft: &TagDraft) -> Result<Tag, ApiError>;

    /// `DELETE /api/tags/{id}`
    async fn delete_tag(&self, id: &str) -> Result<(), ApiError>;

    /// `GET /api/units`
    async fn list_units(&self) -> Result<Vec<Unit>, ApiError>;

    /// `POST /api/units/convert`
    async fn convert_units(&self, request: &ConversionRequest)
        -> Result<ConversionResponse, ApiError>;

    /// `GET /api/units/can-convert`
    async fn can_convert(&self, from_unit: &str, to_unit: &str) -> Result<bool, ApiError>;

    /// `POST /api/recipes/import/jobs`
    async fn submit_import(&self, url: &str) -> Result<ImportJob, ApiError>;

    /// `GET /api/recipes/import/jobs/{id}`
    async fn import_status(&self, job_id: &str) -> Result<ImportJob, ApiError>;

    /// `GET /api/recipes/export/{id}/json` or `.../markdown/zip`
    async fn export_recipe(&self, id: &str, format: ExportFormat) -> Result<Vec<u8>, ApiError>;
}
