use anyhow::{Context, Result};
use clap::Subcommand;
use recipebox_core::{ImageCarousel, ImageUpload, RecipeApi};
use std::fs;
use std::path::{Path, PathBuf};

use crate::App;

#[derive(Subcommand)]
pub enum ImageCommand {
    /// List a recipe's images, primary first
    List { recipe_id: String },
    /// Upload an image file to a recipe
    Add {
        recipe_id: String,
        path: PathBuf,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Make an image the recipe's primary image
    Primary { recipe_id: String, image_id: String },
    /// Download an image
    Get {
        image_id: String,
        /// Output file (default: <image_id>)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

pub async fn run(app: &App, command: ImageCommand) -> Result<()> {
    match command {
        ImageCommand::List { recipe_id } => {
            let recipe = app
                .api
                .get_recipe(&recipe_id)
                .await
                .with_context(|| format!("Failed to load recipe {}", recipe_id))?;
            let carousel = ImageCarousel::new(recipe.images);
            if carousel.is_empty() {
                println!("No images");
                return Ok(());
            }
            for image in carousel.images() {
                let primary = if image.is_primary { " (primary)" } else { "" };
                println!(
                    "{:<24} {}{}{}",
                    image.id,
                    image.filename,
                    primary,
                    image
                        .description
                        .as_deref()
                        .filter(|d| !d.is_empty())
                        .map(|d| format!("  {}", d))
                        .unwrap_or_default()
                );
            }
        }
        ImageCommand::Add {
            recipe_id,
            path,
            description,
        } => {
            let bytes = fs::read(&path)
                .with_context(|| format!("Failed to read image: {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());

            let upload = ImageUpload {
                filename,
                content_type: content_type(&path).to_string(),
                description,
                bytes,
            };
            let recipe = app
                .api
                .add_image(&recipe_id, upload)
                .await
                .context("Failed to upload image")?;
            println!("Recipe {} now has {} images", recipe_id, recipe.images.len());
        }
        ImageCommand::Primary {
            recipe_id,
            image_id,
        } => {
            app.api
                .set_primary_image(&recipe_id, &image_id)
                .await
                .context("Failed to set primary image")?;
            println!("Primary image set to {}", image_id);
        }
        ImageCommand::Get { image_id, output } => {
            let output = output.unwrap_or_else(|| PathBuf::from(&image_id));
            let bytes = app
                .api
                .fetch_image(&image_id)
                .await
                .with_context(|| format!("Failed to download image {}", image_id))?;
            fs::write(&output, &bytes)
                .with_context(|| format!("Failed to write to file: {}", output.display()))?;
            println!("Saved image to: {} ({} bytes)", output.display(), bytes.len());
        }
    }
    Ok(())
}

fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
