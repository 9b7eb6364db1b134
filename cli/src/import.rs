use anyhow::Result;
use recipebox_core::{ImportFlow, Notification};
use std::path::Path;

use crate::recipes::{print_notification, write_draft};
use crate::App;

/// Import a recipe from a web page into a draft, optionally saving it.
pub async fn import(app: &App, url: &str, output: Option<&Path>, save: bool) -> Result<()> {
    println!("Importing {}... (this may take a while)", url.trim());

    let flow = ImportFlow::new(app.api.clone(), &app.config);
    let form = flow.run(url).await?;

    print_notification(&Notification::success(format!(
        "Imported \"{}\" ({} ingredients, {} steps)",
        form.name,
        form.ingredients.len(),
        form.steps.len()
    )));

    let draft = form.to_recipe();
    match output {
        Some(path) => {
            write_draft(path, &draft)?;
            println!("Saved draft to: {}", path.display());
        }
        None if !save => println!("{}", serde_json::to_string_pretty(&draft)?),
        None => {}
    }

    if save {
        let outcome = form.submit(app.api.as_ref(), &app.store).await?;
        for note in &outcome.notifications {
            print_notification(note);
        }
        if let Some(id) = &outcome.recipe.id {
            println!("Recipe id: {}", id);
        }
    }

    Ok(())
}
