use anyhow::{Context, Result};
use clap::Subcommand;
use recipebox_core::tags::{DEFAULT_TAG_CATEGORY, DEFAULT_TAG_COLOR, TAG_CATEGORIES};
use recipebox_core::TagManager;

use crate::recipes::print_notification;
use crate::App;

#[derive(Subcommand)]
pub enum TagCommand {
    /// List tags
    List {
        /// Match against name and description
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// Create a tag
    Create {
        name: String,
        #[arg(long, default_value = DEFAULT_TAG_COLOR)]
        color: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = DEFAULT_TAG_CATEGORY, value_parser = clap::builder::PossibleValuesParser::new(TAG_CATEGORIES.iter().copied()))]
        category: String,
    },
    /// Update a tag; omitted fields keep their current value
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_parser = clap::builder::PossibleValuesParser::new(TAG_CATEGORIES.iter().copied()))]
        category: Option<String>,
    },
    /// Delete a tag
    Delete { id: String },
}

pub async fn run(app: &App, command: TagCommand) -> Result<()> {
    let mut manager = TagManager::new(app.api.clone(), app.config.favorites.clone());

    match command {
        TagCommand::List { search, category } => {
            manager.load().await?;
            manager.search_term = search;
            manager.category_filter = category;

            let tags = manager.filtered();
            if tags.is_empty() {
                println!("No tags found");
                println!("Categories: {}", manager.categories().join(", "));
                return Ok(());
            }
            for tag in tags {
                println!(
                    "{:<24} {:<20} {:<8} {:<12} {}",
                    tag.id,
                    tag.name,
                    tag.color,
                    tag.category.as_deref().unwrap_or(""),
                    tag.usage_count
                );
            }
        }
        TagCommand::Create {
            name,
            color,
            description,
            category,
        } => {
            manager.draft.name = name;
            manager.draft.color = color;
            manager.draft.description = description;
            manager.draft.category = category;
            print_notification(&manager.save().await?);
        }
        TagCommand::Update {
            id,
            name,
            color,
            description,
            category,
        } => {
            manager.load().await?;
            let current = manager
                .tags()
                .iter()
                .find(|t| t.id == id)
                .cloned()
                .with_context(|| format!("No tag with id {}", id))?;

            manager.begin_edit(&current);
            if let Some(name) = name {
                manager.draft.name = name;
            }
            if let Some(color) = color {
                manager.draft.color = color;
            }
            if let Some(description) = description {
                manager.draft.description = description;
            }
            if let Some(category) = category {
                manager.draft.category = category;
            }
            print_notification(&manager.save().await?);
        }
        TagCommand::Delete { id } => {
            print_notification(&manager.delete(&id).await?);
        }
    }

    Ok(())
}
