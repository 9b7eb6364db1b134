use anyhow::{Context, Result};
use clap::Args;
use recipebox_core::{
    render_recipe, Direction, Notification, Recipe, RecipeApi, RecipeForm, RecipeListView,
    RecipeView, SearchUpdate, SortField, StepsViewer,
};
use std::fs;
use std::path::Path;

use crate::App;

#[derive(Args)]
pub struct ListArgs {
    /// Name contains (case-insensitive)
    #[arg(long)]
    name: Option<String>,
    /// Must contain this ingredient (repeatable)
    #[arg(long = "ingredient")]
    ingredients: Vec<String>,
    /// Must carry this tag id (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// name, created, modified or last-access
    #[arg(long)]
    sort: Option<SortField>,
    /// asc or desc
    #[arg(long)]
    direction: Option<Direction>,
    /// Zero-based page number
    #[arg(long, default_value_t = 0)]
    page: u32,
    #[arg(long)]
    size: Option<u32>,
    /// Only favorite recipes
    #[arg(long)]
    favorites: bool,
    /// Print the raw page as JSON
    #[arg(long)]
    json: bool,
}

pub async fn list(app: &App, args: ListArgs) -> Result<()> {
    let store = app.store.clone();
    let mut update = SearchUpdate::new()
        .ingredients(args.ingredients)
        .tag_ids(args.tags);
    if let Some(name) = args.name {
        update = update.name(name);
    }
    if let Some(sort) = args.sort {
        update = update.sort_field(sort);
    }
    if let Some(direction) = args.direction {
        update = update.direction(direction);
    }
    if let Some(size) = args.size {
        update = update.size(size);
    }
    store.update_search_params(update);
    if args.favorites {
        store.toggle_favorites_only();
    }
    if args.page > 0 {
        store.set_page(args.page, 0);
    }

    let mut view = RecipeListView::new(app.api.clone(), store, app.config.favorites.clone());
    view.sync().await.context("Failed to fetch recipes")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(view.recipes())?);
        return Ok(());
    }

    if let Some(empty) = view.empty_state() {
        println!("{}", empty.title);
        println!("{}", empty.message);
        return Ok(());
    }

    let summary = view.summary();
    println!("{}", summary.found);
    if let Some(showing) = &summary.showing {
        println!("{}", showing);
    }
    println!();
    for recipe in view.recipes() {
        let star = if view.is_favorite(recipe) { " *" } else { "" };
        let view_model = RecipeView::from(recipe);
        let tags = if view_model.tags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", view_model.tags.join(", "))
        };
        println!(
            "{:<24} {}{}{}",
            recipe.id.as_deref().unwrap_or("-"),
            view_model.name,
            star,
            tags
        );
    }
    if let Some(page) = &summary.page {
        println!();
        println!("{}", page);
    }

    Ok(())
}

pub async fn show(app: &App, id: &str, step: Option<usize>, save: Option<&Path>) -> Result<()> {
    let recipe = app
        .api
        .get_recipe(id)
        .await
        .with_context(|| format!("Failed to load recipe {}", id))?;

    if let Some(path) = save {
        write_draft(path, &recipe)?;
        println!("Saved draft to: {}", path.display());
    }

    let view = RecipeView::from(&recipe);
    match step {
        None => print!("{}", render_recipe(&view)),
        Some(number) => {
            let mut viewer = StepsViewer::new(view.steps.clone());
            viewer.toggle_mode();
            for _ in 1..number {
                viewer.next();
            }
            println!("{}", view.name);
            println!();
            print!("{}", viewer.render());
        }
    }
    Ok(())
}

pub async fn create(app: &App, file: &Path, preview: bool) -> Result<()> {
    let form = RecipeForm::from_import(read_draft(file)?);
    submit_or_preview(app, form, preview).await
}

pub async fn edit(app: &App, id: &str, file: &Path, preview: bool) -> Result<()> {
    let current = app
        .api
        .get_recipe(id)
        .await
        .with_context(|| format!("Failed to load recipe {}", id))?;

    let mut form = RecipeForm::from_recipe(&current);
    form.apply_draft(read_draft(file)?);
    submit_or_preview(app, form, preview).await
}

async fn submit_or_preview(app: &App, form: RecipeForm, preview: bool) -> Result<()> {
    if preview {
        let view = form.preview()?;
        println!("Recipe Preview");
        println!();
        print!("{}", render_recipe(&view));
        return Ok(());
    }

    let outcome = form.submit(app.api.as_ref(), &app.store).await?;
    for note in &outcome.notifications {
        print_notification(note);
    }
    if let Some(id) = &outcome.recipe.id {
        println!("Recipe id: {}", id);
    }
    Ok(())
}

pub async fn delete(app: &App, ids: &[String]) -> Result<()> {
    let mut view =
        RecipeListView::new(app.api.clone(), app.store.clone(), app.config.favorites.clone());

    if let [id] = ids {
        view.delete_recipe(id)
            .await
            .with_context(|| format!("Failed to delete recipe {}", id))?;
        print_notification(&Notification::success(format!("Deleted recipe {}", id)));
        return Ok(());
    }

    for id in ids {
        view.toggle_select(id);
    }
    let report = view.bulk_delete().await;
    for id in &report.deleted {
        println!("Deleted: {}", id);
    }
    for (id, err) in &report.failed {
        eprintln!("Failed:  {} ({})", id, err);
    }

    if !report.is_complete() {
        anyhow::bail!(
            "{} of {} recipes could not be deleted",
            report.failed.len(),
            ids.len()
        );
    }
    print_notification(&Notification::success(format!(
        "Deleted {} recipes",
        report.deleted.len()
    )));
    Ok(())
}

pub async fn favorite(app: &App, id: &str) -> Result<()> {
    let mut view =
        RecipeListView::new(app.api.clone(), app.store.clone(), app.config.favorites.clone());
    let favorite = view
        .toggle_favorite(id)
        .await
        .with_context(|| format!("Failed to update favorites for recipe {}", id))?;

    let message = if favorite {
        "Added to favorites"
    } else {
        "Removed from favorites"
    };
    print_notification(&Notification::success(message));
    Ok(())
}

pub fn print_notification(note: &Notification) {
    if note.is_error() {
        eprintln!("{}", note);
    } else {
        println!("{}", note);
    }
}

pub fn read_draft(path: &Path) -> Result<Recipe> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read draft: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse draft JSON: {}", path.display()))
}

pub fn write_draft(path: &Path, recipe: &Recipe) -> Result<()> {
    let json = serde_json::to_string_pretty(recipe)?;
    fs::write(path, json).with_context(|| format!("Failed to write draft: {}", path.display()))
}
