pub mod api;
pub mod config;
pub mod error;
pub mod form;
pub mod import;
pub mod list;
pub mod notify;
pub mod render;
pub mod search;
pub mod tags;
pub mod types;
pub mod units;

pub use api::{HttpRecipeApi, MockApi, RecipeApi};
pub use config::{ClientConfig, ConfigError, FavoritesTag};
pub use error::{ApiError, ImportError, SubmitError, TagError, ValidationError};
pub use form::{FormMode, RecipeForm, SubmitOutcome};
pub use import::ImportFlow;
pub use list::{DeleteReport, EmptyState, ListSummary, RecipeListView};
pub use notify::{Notification, NotificationKind};
pub use render::{render_recipe, ImageCarousel, RecipeView, StepsMode, StepsViewer};
pub use search::{PaginationState, RequestTicket, SearchStore, SearchUpdate};
pub use tags::TagManager;
pub use types::{
    Direction, ExportFormat, Image, ImageUpload, ImportJob, ImportStatus, Ingredient, Page,
    PageInfo, Recipe, RecipePayload, SearchParams, SortField, Step, Tag, TagDraft, TagRef, Unit,
};
