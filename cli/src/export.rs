use anyhow::{Context, Result};
use recipebox_core::{ExportFormat, RecipeApi};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use crate::App;

/// Download a recipe export and write it to disk
pub async fn export_recipe(
    app: &App,
    recipe_id: &str,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let output_path = output
        .unwrap_or_else(|| PathBuf::from(format!("recipe-{}.{}", recipe_id, format.extension())));

    let bytes = app
        .api
        .export_recipe(recipe_id, format)
        .await
        .with_context(|| format!("Failed to export recipe {}", recipe_id))?;

    let mut file = File::create(&output_path)
        .with_context(|| format!("Failed to create file: {}", output_path.display()))?;

    file.write_all(&bytes)
        .with_context(|| format!("Failed to write to file: {}", output_path.display()))?;

    println!(
        "Exported recipe to: {} ({} bytes)",
        output_path.display(),
        bytes.len()
    );

    Ok(())
}
