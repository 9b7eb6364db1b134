use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response body: {0}")]
    Decode(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl ApiError {
    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::NotFound(_) => Some(404),
            ApiError::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Client-side checks run before a recipe is submitted or previewed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Title, ingredients and steps cannot be empty")]
    EmptyName,

    #[error("Title, ingredients and steps cannot be empty")]
    NoIngredients,

    #[error("Title, ingredients and steps cannot be empty")]
    NoSteps,

    #[error("Quantity of ingredient #{} ({name}) must be greater than zero", .index + 1)]
    NonPositiveQuantity { index: usize, name: String },

    #[error("Tag name is required")]
    EmptyTagName,
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Cannot import recipe from URL: {url}. {source}")]
    Request {
        url: String,
        #[source]
        source: ApiError,
    },

    #[error("Cannot import recipe from URL: {url}. {}", .message.as_deref().unwrap_or("The import job failed"))]
    Failed {
        url: String,
        message: Option<String>,
    },

    #[error("Importing recipe from URL: {url} took too long.")]
    Timeout { url: String },

    #[error("Import job {job_id} completed without a recipe")]
    MissingResult { job_id: String },
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Recipe couldn't be saved: {0}")]
    Api(#[from] ApiError),
}

#[derive(Error, Debug)]
pub enum TagError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Failed to save tag: {0}")]
    Api(#[from] ApiError),
}
