//! reqwest-backed implementation of [`RecipeApi`].

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

use super::RecipeApi;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::types::{
    ConversionRequest, ConversionResponse, ExportFormat, ImageUpload, ImportJob, Page, Recipe,
    RecipePayload, SearchParams, Tag, TagDraft, TagRef, Unit,
};

const USER_AGENT: &str = concat!("recipebox/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the recipe backend.
#[derive(Clone)]
pub struct HttpRecipeApi {
    /// Shared reqwest client for connection pooling.
    inner: Arc<reqwest::Client>,
    /// Backend origin, always ending in `/`.
    base_url: Url,
}

impl HttpRecipeApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let inner = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            inner: Arc::new(inner),
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/api/{segments...}`, escaping each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(segments)?;
        Ok(self.inner.request(method, url))
    }

    /// Send a request and turn any non-2xx status into an error.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().to_string();

        if status.is_success() {
            tracing::debug!(url = %url, status = %status, "request succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(url = %url, status = %status, body = %body, "request failed");

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(url));
        }

        Err(ApiError::Status {
            status: status.as_u16(),
            body: summarize_error_body(&body),
        })
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::Decode(format!("{} (body: {})", e, truncate(&text, 200)))
        })
    }

    async fn json_body<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ApiError> {
        let request = self.request(method, segments)?.json(body);
        self.json(request).await
    }
}

/// Spring error bodies carry a `message`; prefer it over the raw JSON.
fn summarize_error_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| truncate(body, 500).to_string())
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[async_trait]
impl RecipeApi for HttpRecipeApi {
    async fn search_recipes(&self, params: &SearchParams) -> Result<Page<Recipe>, ApiError> {
        let request = self
            .request(Method::GET, &["recipes", "search", "advanced"])?
            .query(&params.to_query());
        self.json(request).await
    }

    async fn get_recipe(&self, id: &str) -> Result<Recipe, ApiError> {
        let request = self.request(Method::GET, &["recipes", id])?;
        self.json(request).await
    }

    async fn create_recipe(&self, payload: &RecipePayload) -> Result<Recipe, ApiError> {
        self.json_body(Method::POST, &["recipes"], payload).await
    }

    async fn update_recipe(&self, id: &str, payload: &RecipePayload) -> Result<Recipe, ApiError> {
        self.json_body(Method::PUT, &["recipes", id], payload).await
    }

    async fn delete_recipe(&self, id: &str) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &["recipes", id])?;
        self.send(request).await?;
        Ok(())
    }

    async fn add_recipe_tags(&self, id: &str, tags: &[TagRef]) -> Result<Recipe, ApiError> {
        self.json_body(Method::PATCH, &["recipes", id, "tags"], tags)
            .await
    }

    async fn remove_recipe_tags(&self, id: &str, tags: &[TagRef]) -> Result<Recipe, ApiError> {
        self.json_body(Method::DELETE, &["recipes", id, "tags"], tags)
            .await
    }

    async fn add_image(&self, recipe_id: &str, upload: ImageUpload) -> Result<Recipe, ApiError> {
        let part = reqwest::multipart::Part::bytes(upload.bytes)
            .file_name(upload.filename)
            .mime_str(&upload.content_type)?;

        let form = reqwest::multipart::Form::new()
            .part("image", part)
            .text("description", upload.description);

        let request = self
            .request(Method::PATCH, &["recipes", recipe_id, "image"])?
            .multipart(form);
        self.json(request).await
    }

    async fn set_primary_image(
        &self,
        recipe_id: &str,
        image_id: &str,
    ) -> Result<Recipe, ApiError> {
        let request = self.request(
            Method::PATCH,
            &["recipes", recipe_id, "image", image_id, "primary"],
        )?;
        self.json(request).await
    }

    async fn link_images(
        &self,
        recipe_id: &str,
        image_ids: &[String],
    ) -> Result<Recipe, ApiError> {
        self.json_body(
            Method::PATCH,
            &["recipes", recipe_id, "images", "link"],
            image_ids,
        )
        .await
    }

    async fn fetch_image(&self, image_id: &str) -> Result<Vec<u8>, ApiError> {
        let request = self.request(Method::GET, &["images", image_id, "image"])?;
        let response = self.send(request).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn list_tags(&self, page: u32, size: u32) -> Result<Page<Tag>, ApiError> {
        let request = self
            .request(Method::GET, &["tags"])?
            .query(&[("page", page), ("size", size)]);
        self.json(request).await
    }

    async fn create_tag(&self, draft: &TagDraft) -> Result<Tag, ApiError> {
        self.json_body(Method::POST, &["tags"], draft).await
    }

    async fn update_tag(&self, id: &str, draft: &TagDraft) -> Result<Tag, ApiError> {
        self.json_body(Method::PUT, &["tags", id], draft).await
    }

    async fn delete_tag(&self, id: &str) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &["tags", id])?;
        self.send(request).await?;
        Ok(())
    }

    async fn list_units(&self) -> Result<Vec<Unit>, ApiError> {
        let request = self.request(Method::GET, &["units"])?;
        self.json(request).await
    }

    async fn convert_units(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResponse, ApiError> {
        self.json_body(Method::POST, &["units", "convert"], request)
            .await
    }

    async fn can_convert(&self, from_unit: &str, to_unit: &str) -> Result<bool, ApiError> {
        let request = self
            .request(Method::GET, &["units", "can-convert"])?
            .query(&[("fromUnit", from_unit), ("toUnit", to_unit)]);
        self.json(request).await
    }

    async fn submit_import(&self, url: &str) -> Result<ImportJob, ApiError> {
        #[derive(Serialize)]
        struct ImportRequest<'a> {
            url: &'a str,
        }

        self.json_body(
            Method::POST,
            &["recipes", "import", "jobs"],
            &ImportRequest { url },
        )
        .await
    }

    async fn import_status(&self, job_id: &str) -> Result<ImportJob, ApiError> {
        let request = self.request(Method::GET, &["recipes", "import", "jobs", job_id])?;
        self.json(request).await
    }

    async fn export_recipe(&self, id: &str, format: ExportFormat) -> Result<Vec<u8>, ApiError> {
        let mut segments = vec!["recipes", "export", id];
        segments.extend(format.path().split('/'));

        let request = self.request(Method::GET, &segments)?;
        let response = self.send(request).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
