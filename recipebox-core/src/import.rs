//! Import a recipe from a URL through the backend's asynchronous job API.
//!
//! The job is polled right after submission and then at most once more after
//! one poll interval. A job that is still running after that is reported as a
//! timeout; polling never continues beyond the single retry.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info_span, Instrument};
use url::Url;

use crate::api::RecipeApi;
use crate::config::ClientConfig;
use crate::error::{ApiError, ImportError};
use crate::form::RecipeForm;
use crate::types::{ImportJob, ImportStatus};

/// Number of status polls after submission.
const MAX_POLLS: u32 = 2;

pub struct ImportFlow<A: RecipeApi + ?Sized> {
    api: Arc<A>,
    poll_interval: Duration,
}

impl<A: RecipeApi + ?Sized> ImportFlow<A> {
    pub fn new(api: Arc<A>, config: &ClientConfig) -> Self {
        Self::with_poll_interval(api, config.import_poll_interval)
    }

    pub fn with_poll_interval(api: Arc<A>, poll_interval: Duration) -> Self {
        Self { api, poll_interval }
    }

    /// Import `url` and return a create-mode form prefilled with the result.
    pub async fn run(&self, url: &str) -> Result<RecipeForm, ImportError> {
        let url = url.trim();
        Url::parse(url).map_err(|e| ImportError::Request {
            url: url.to_string(),
            source: ApiError::InvalidUrl(format!("{}: {}", url, e)),
        })?;

        let job = self
            .api
            .submit_import(url)
            .await
            .map_err(|source| ImportError::Request {
                url: url.to_string(),
                source,
            })?;
        tracing::info!(url = %url, job_id = %job.job_id, "import job submitted");

        let span = info_span!("import_job", job_id = %job.job_id);
        self.poll(url, job).instrument(span).await
    }

    async fn poll(&self, url: &str, mut job: ImportJob) -> Result<RecipeForm, ImportError> {
        for attempt in 0..MAX_POLLS {
            if job.status.is_terminal() {
                break;
            }
            if attempt > 0 {
                tokio::time::sleep(self.poll_interval).await;
            }

            job = self
                .api
                .import_status(&job.job_id)
                .await
                .map_err(|source| ImportError::Request {
                    url: url.to_string(),
                    source,
                })?;
            tracing::debug!(attempt, status = ?job.status, "import job polled");
        }

        match job.status {
            ImportStatus::Completed => {
                let draft = job.result.ok_or_else(|| ImportError::MissingResult {
                    job_id: job.job_id.clone(),
                })?;
                tracing::info!(name = %draft.name, "import completed");
                Ok(RecipeForm::from_import(draft))
            }
            ImportStatus::Failed => {
                tracing::warn!(error = ?job.error_message, "import failed");
                Err(ImportError::Failed {
                    url: url.to_string(),
                    message: job.error_message,
                })
            }
            ImportStatus::Started | ImportStatus::InProgress => {
                tracing::warn!(status = ?job.status, "import did not finish in time");
                Err(ImportError::Timeout {
                    url: url.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApi;
    use crate::form::FormMode;
    use crate::types::{Ingredient, Recipe, Step};

    const URL: &str = "https://example.com/pancakes";

    fn job(status: ImportStatus, result: Option<Recipe>) -> ImportJob {
        ImportJob {
            job_id: "job-1".to_string(),
            status,
            result,
            error_message: None,
        }
    }

    fn pancakes() -> Recipe {
        Recipe {
            name: "Pancakes".to_string(),
            ingredients: vec![Ingredient::new("Flour", "GRAMS", 200.0)],
            steps: vec![Step::new("Mix", "Whisk everything")],
            ..Default::default()
        }
    }

    fn flow(api: &Arc<MockApi>) -> ImportFlow<MockApi> {
        ImportFlow::with_poll_interval(api.clone(), Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_completed_on_first_poll() {
        let api = Arc::new(MockApi::new());
        api.script_import(
            URL,
            "job-1",
            vec![job(ImportStatus::Completed, Some(pancakes()))],
        );

        let form = flow(&api).run(URL).await.unwrap();
        assert_eq!(form.mode(), &FormMode::Create);
        assert_eq!(form.name, "Pancakes");
        assert_eq!(api.call_count("GET /api/recipes/import/jobs/job-1"), 1);
    }

    #[tokio::test]
    async fn test_failed_job_stops_polling() {
        let api = Arc::new(MockApi::new());
        let mut failed = job(ImportStatus::Failed, None);
        failed.error_message = Some("No recipe found on page".to_string());
        api.script_import(URL, "job-1", vec![failed]);

        let err = flow(&api).run(URL).await.unwrap_err();
        assert!(matches!(
            err,
            ImportError::Failed { ref message, .. } if message.as_deref() == Some("No recipe found on page")
        ));
        assert_eq!(api.call_count("GET /api/recipes/import/jobs/job-1"), 1);
    }

    #[tokio::test]
    async fn test_completed_without_result() {
        let api = Arc::new(MockApi::new());
        api.script_import(URL, "job-1", vec![job(ImportStatus::Completed, None)]);

        let err = flow(&api).run(URL).await.unwrap_err();
        assert!(matches!(err, ImportError::MissingResult { .. }));
    }

    #[tokio::test]
    async fn test_rejected_submission() {
        let api = Arc::new(MockApi::new());
        let err = flow(&api).run("https://unknown.example/x").await.unwrap_err();
        assert!(matches!(err, ImportError::Request { .. }));
        assert_eq!(api.calls(), vec!["POST /api/recipes/import/jobs".to_string()]);
    }

    #[tokio::test]
    async fn test_status_error_stops_polling() {
        let api = Arc::new(MockApi::new());
        api.script_import(
            URL,
            "job-1",
            vec![job(ImportStatus::InProgress, None)],
        );
        api.fail_on("GET /api/recipes/import/jobs/job-1");

        let err = flow(&api).run(URL).await.unwrap_err();
        assert!(matches!(
            err,
            ImportError::Request {
                source: ApiError::Status { status: 500, .. },
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            format!(
                "Cannot import recipe from URL: {}. Server returned 500: Injected failure",
                URL
            )
        );
        assert_eq!(api.call_count("GET /api/recipes/import/jobs/job-1"), 1);
    }

    #[tokio::test]
    async fn test_invalid_url_sends_nothing() {
        let api = Arc::new(MockApi::new());
        let err = flow(&api).run("not a url").await.unwrap_err();
        assert!(matches!(
            err,
            ImportError::Request {
                source: ApiError::InvalidUrl(_),
                ..
            }
        ));
        assert!(api.calls().is_empty());
    }
}
