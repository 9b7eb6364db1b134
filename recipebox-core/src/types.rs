use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Treat an explicit JSON `null` the same as a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A recipe as returned by the backend, or as drafted locally before it is persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    /// Rich text (HTML)
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub ingredients: Vec<Ingredient>,
    #[serde(default, deserialize_with = "nullable")]
    pub steps: Vec<Step>,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<Tag>,
    #[serde(default, deserialize_with = "nullable")]
    pub images: Vec<Image>,
}

impl Recipe {
    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }

    pub fn primary_image(&self) -> Option<&Image> {
        self.images.iter().find(|i| i.is_primary)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    #[serde(rename = "ingredientName")]
    pub name: String,
    /// Unit identifier, e.g. "CUPS" or "GRAMS"
    pub unit: String,
    pub quantity: f64,
    /// Server-side rendering of the quantity (e.g. "1/2"); never sent back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_quantity: Option<String>,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, unit: impl Into<String>, quantity: f64) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            quantity,
            formatted_quantity: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub text: String,
}

impl Step {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }
}

/// A label shared across recipes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(default, deserialize_with = "nullable")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub usage_count: u32,
}

/// Tag reference body for the recipe tag add/remove endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRef {
    pub id: String,
    pub name: String,
    pub existing_tag: bool,
}

impl From<&Tag> for TagRef {
    fn from(tag: &Tag) -> Self {
        Self {
            id: tag.id.clone(),
            name: tag.name.clone(),
            existing_tag: !tag.id.is_empty(),
        }
    }
}

/// Tag reference inside a recipe payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagId {
    pub id: String,
}

/// Body for creating or updating a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDraft {
    pub name: String,
    pub color: String,
    pub description: String,
    pub category: String,
}

/// Image metadata. The bytes are fetched separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub filename: String,
    #[serde(default, deserialize_with = "nullable")]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<DateTime<Utc>>,
}

/// A new image for a recipe.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub description: String,
    pub bytes: Vec<u8>,
}

/// Body of `POST /api/recipes` and `PUT /api/recipes/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipePayload {
    pub name: String,
    pub description: String,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<Step>,
    pub tags: Vec<TagId>,
}

/// Paging block of the paginated envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub size: u32,
    pub number: u32,
    pub total_elements: u64,
    pub total_pages: u32,
}

/// The `{content, page}` envelope used by all list and search endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    pub page: PageInfo,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortField {
    #[default]
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "created_date")]
    Created,
    #[serde(rename = "modification_date")]
    Modified,
    #[serde(rename = "last_access_date")]
    LastAccess,
}

impl SortField {
    pub const ALL: &'static [SortField] = &[
        SortField::Name,
        SortField::Created,
        SortField::Modified,
        SortField::LastAccess,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Created => "created_date",
            SortField::Modified => "modification_date",
            SortField::LastAccess => "last_access_date",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortField::Name => "Name",
            SortField::Created => "Created Date",
            SortField::Modified => "Modified Date",
            SortField::LastAccess => "Last Access Date",
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortField::Name),
            "created" | "created_date" => Ok(SortField::Created),
            "modified" | "modification_date" => Ok(SortField::Modified),
            "last-access" | "last_access" | "last_access_date" => Ok(SortField::LastAccess),
            other => Err(format!("Unknown sort field: {}", other)),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            other => Err(format!("Unknown sort direction: {}", other)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the recipe list is currently asking the backend for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
    pub ingredients: Vec<String>,
    pub tag_ids: Vec<String>,
    pub sort_field: SortField,
    pub direction: Direction,
    /// Zero-based
    pub page_number: u32,
    pub size: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            name: None,
            ingredients: Vec::new(),
            tag_ids: Vec::new(),
            sort_field: SortField::Name,
            direction: Direction::Asc,
            page_number: 0,
            size: crate::config::DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchParams {
    /// Whether any name, ingredient, or tag filter is set.
    pub fn has_active_filters(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.trim().is_empty())
            || !self.ingredients.is_empty()
            || !self.tag_ids.is_empty()
    }

    /// Query string pairs for the advanced search endpoint.
    ///
    /// List filters are repeated keys. The backend names the tag list `tagsID`.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            query.push(("name", name.to_string()));
        }
        for ingredient in &self.ingredients {
            query.push(("ingredients", ingredient.clone()));
        }
        for tag_id in &self.tag_ids {
            query.push(("tagsID", tag_id.clone()));
        }
        query.push(("sort_field", self.sort_field.as_str().to_string()));
        query.push(("direction", self.direction.as_str().to_string()));
        query.push(("page_number", self.page_number.to_string()));
        query.push(("size", self.size.to_string()));
        query
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStatus {
    Started,
    InProgress,
    Completed,
    Failed,
}

impl ImportStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ImportStatus::Completed | ImportStatus::Failed)
    }
}

/// An asynchronous import job on the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportJob {
    pub job_id: String,
    pub status: ImportStatus,
    /// Recipe draft, present once the job completed
    #[serde(default)]
    pub result: Option<Recipe>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub system: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    pub value: f64,
    pub from_unit: String,
    pub to_unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    pub original_value: f64,
    pub original_unit: String,
    pub original_unit_name: String,
    pub converted_value: f64,
    pub converted_unit: String,
    pub converted_unit_name: String,
    pub formatted_original_value: String,
    pub formatted_converted_value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    MarkdownZip,
}

impl ExportFormat {
    /// Path segment after `/api/recipes/export/{id}/`.
    pub fn path(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::MarkdownZip => "markdown/zip",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::MarkdownZip => "zip",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ExportFormat::Json),
            "markdown" | "md" | "zip" => Ok(ExportFormat::MarkdownZip),
            other => Err(format!("Unknown export format: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_from_backend_json() {
        let json = r##"{
            "id": "r1",
            "name": "<p>Tomato soup</p>",
            "description": null,
            "ingredients": [
                {"ingredientName": "Tomato", "unit": "GRAMS", "quantity": 500.0, "formattedQuantity": "500"}
            ],
            "steps": [{"title": "Cook", "text": "Simmer for 20 minutes"}],
            "tags": [{"id": "favorite-tag-id", "name": "Favorite", "color": "#FFD700",
                      "description": "User's favorite recipes", "category": "System", "usageCount": 3}],
            "images": [{"id": "img1", "filename": "soup.jpg", "contentType": "image/jpeg",
                        "description": "Bowl", "isPrimary": true,
                        "uploadDate": "2024-05-01T10:00:00.000+00:00"}]
        }"##;

        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.id.as_deref(), Some("r1"));
        assert_eq!(recipe.description, "");
        assert_eq!(recipe.ingredients[0].name, "Tomato");
        assert_eq!(recipe.ingredients[0].formatted_quantity.as_deref(), Some("500"));
        assert!(recipe.has_tag("favorite-tag-id"));
        assert_eq!(recipe.tags[0].usage_count, 3);
        assert_eq!(recipe.primary_image().map(|i| i.id.as_str()), Some("img1"));
        assert!(recipe.images[0].upload_date.is_some());
    }

    #[test]
    fn test_payload_shape() {
        let payload = RecipePayload {
            name: "Tea".to_string(),
            description: String::new(),
            ingredients: vec![Ingredient::new("Water", "CUPS", 1.0)],
            steps: vec![Step::new("Boil", "Boil the water")],
            tags: vec![TagId {
                id: "t1".to_string(),
            }],
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "Tea",
                "description": "",
                "ingredients": [{"ingredientName": "Water", "unit": "CUPS", "quantity": 1.0}],
                "steps": [{"title": "Boil", "text": "Boil the water"}],
                "tags": [{"id": "t1"}]
            })
        );
    }

    #[test]
    fn test_tag_ref_wire_names() {
        let tag = Tag {
            id: "t1".to_string(),
            name: "Vegan".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(TagRef::from(&tag)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": "t1", "name": "Vegan", "existingTag": true})
        );
    }

    #[test]
    fn test_search_query_repeats_list_filters() {
        let params = SearchParams {
            name: Some("soup".to_string()),
            ingredients: vec!["tomato".to_string(), "basil".to_string()],
            tag_ids: vec!["t1".to_string()],
            sort_field: SortField::Modified,
            direction: Direction::Desc,
            page_number: 2,
            size: 20,
        };

        let query = params.to_query();
        assert_eq!(
            query,
            vec![
                ("name", "soup".to_string()),
                ("ingredients", "tomato".to_string()),
                ("ingredients", "basil".to_string()),
                ("tagsID", "t1".to_string()),
                ("sort_field", "modification_date".to_string()),
                ("direction", "desc".to_string()),
                ("page_number", "2".to_string()),
                ("size", "20".to_string()),
            ]
        );
    }

    #[test]
    fn test_search_query_omits_empty_name() {
        let params = SearchParams {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(params.to_query().iter().all(|(k, _)| *k != "name"));
        assert!(!params.has_active_filters());
    }

    #[test]
    fn test_import_job_status_names() {
        let job: ImportJob =
            serde_json::from_str(r#"{"jobId": "j1", "status": "IN_PROGRESS"}"#).unwrap();
        assert_eq!(job.status, ImportStatus::InProgress);
        assert!(job.result.is_none());
        assert!(!job.status.is_terminal());
    }

    #[test]
    fn test_sort_field_parsing() {
        assert_eq!("created".parse::<SortField>(), Ok(SortField::Created));
        assert_eq!(
            "last_access_date".parse::<SortField>(),
            Ok(SortField::LastAccess)
        );
        assert!("rating".parse::<SortField>().is_err());
        assert_eq!("DESC".parse::<Direction>(), Ok(Direction::Desc));
    }
}
