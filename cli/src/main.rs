mod export;
mod images;
mod import;
mod recipes;
mod tags;
mod units;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use recipebox_core::{
    ClientConfig, ExportFormat, HttpRecipeApi, ImportError, Notification, SearchStore,
    SubmitError, TagError, ValidationError,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "recipebox")]
#[command(about = "Browse and edit recipes on a recipebox server", long_about = None)]
struct Cli {
    /// Server URL (default: $RECIPEBOX_API_URL or http://localhost:8080)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List recipes matching a search
    List(recipes::ListArgs),
    /// Show one recipe
    Show {
        id: String,
        /// Show a single step ("Step i of n") instead of all steps
        #[arg(long)]
        step: Option<usize>,
        /// Also write the recipe as an editable JSON draft
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Create a recipe from a JSON draft
    Create {
        file: PathBuf,
        /// Render the draft without saving it
        #[arg(long)]
        preview: bool,
    },
    /// Replace a recipe's content with a JSON draft, keeping its images
    Edit {
        id: String,
        file: PathBuf,
        #[arg(long)]
        preview: bool,
    },
    /// Delete one or more recipes
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Toggle the favorite mark on a recipe
    Favorite { id: String },
    /// Import a recipe from a web page
    Import {
        url: String,
        /// Write the imported draft here instead of printing it
        #[arg(long)]
        output: Option<PathBuf>,
        /// Save the imported recipe right away
        #[arg(long)]
        save: bool,
    },
    /// Manage tags
    Tags {
        #[command(subcommand)]
        command: tags::TagCommand,
    },
    /// List units and convert quantities
    Units {
        #[command(subcommand)]
        command: units::UnitCommand,
    },
    /// Manage recipe images
    Image {
        #[command(subcommand)]
        command: images::ImageCommand,
    },
    /// Download a recipe export
    Export {
        id: String,
        /// json or markdown
        #[arg(long, default_value = "json")]
        format: ExportFormat,
        /// Output file (default: recipe-<id>.<ext>)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

/// Shared client state for one invocation.
pub struct App {
    pub config: ClientConfig,
    pub api: Arc<HttpRecipeApi>,
    pub store: SearchStore,
}

impl App {
    fn new(server: Option<&str>) -> Result<Self> {
        let mut config = ClientConfig::from_env().context("Invalid configuration")?;
        if let Some(server) = server {
            config = config
                .with_base_url(server)
                .with_context(|| format!("Invalid server URL: {}", server))?;
        }

        let api = HttpRecipeApi::new(&config).context("Failed to create HTTP client")?;
        let store = SearchStore::new(&config.favorites, config.page_size);
        tracing::debug!(base_url = %config.base_url, "client configured");

        Ok(Self {
            config,
            api: Arc::new(api),
            store,
        })
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Turn any failure into the notification shown to the user.
fn notification_for(err: &anyhow::Error) -> Notification {
    if let Some(e) = err.downcast_ref::<SubmitError>() {
        return e.into();
    }
    if let Some(e) = err.downcast_ref::<ImportError>() {
        return e.into();
    }
    if let Some(e) = err.downcast_ref::<TagError>() {
        return e.into();
    }
    if let Some(e) = err.downcast_ref::<ValidationError>() {
        return e.into();
    }
    Notification::error(format!("{:#}", err))
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("{}", notification_for(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let app = App::new(cli.server.as_deref())?;

    match cli.command {
        Commands::List(args) => recipes::list(&app, args).await?,
        Commands::Show { id, step, save } => {
            recipes::show(&app, &id, step, save.as_deref()).await?;
        }
        Commands::Create { file, preview } => recipes::create(&app, &file, preview).await?,
        Commands::Edit { id, file, preview } => {
            recipes::edit(&app, &id, &file, preview).await?;
        }
        Commands::Delete { ids } => recipes::delete(&app, &ids).await?,
        Commands::Favorite { id } => recipes::favorite(&app, &id).await?,
        Commands::Import { url, output, save } => {
            import::import(&app, &url, output.as_deref(), save).await?;
        }
        Commands::Tags { command } => tags::run(&app, command).await?,
        Commands::Units { command } => units::run(&app, command).await?,
        Commands::Image { command } => images::run(&app, command).await?,
        Commands::Export { id, format, output } => {
            export::export_recipe(&app, &id, format, output).await?;
        }
    }

    Ok(())
}
