use anyhow::{Context, Result};
use clap::Subcommand;
use recipebox_core::units::{convert_ingredient, find_unit};
use recipebox_core::{Ingredient, RecipeApi};

use crate::App;

#[derive(Subcommand)]
pub enum UnitCommand {
    /// List the units the server knows
    List,
    /// Convert a quantity between units (id, symbol or name)
    Convert {
        value: f64,
        from: String,
        to: String,
    },
}

pub async fn run(app: &App, command: UnitCommand) -> Result<()> {
    let units = app.api.list_units().await.context("Failed to load units")?;

    match command {
        UnitCommand::List => {
            for unit in &units {
                println!(
                    "{:<16} {:<8} {:<20} {}",
                    unit.id, unit.symbol, unit.name, unit.system
                );
            }
        }
        UnitCommand::Convert { value, from, to } => {
            let from_unit =
                find_unit(&units, &from).with_context(|| format!("Unknown unit: {}", from))?;
            let to_unit = find_unit(&units, &to).with_context(|| format!("Unknown unit: {}", to))?;

            let ingredient = Ingredient::new("", from_unit.id.clone(), value);
            match convert_ingredient(app.api.as_ref(), &ingredient, &to_unit.id).await? {
                Some(converted) => println!(
                    "{} {} = {} {}",
                    value,
                    from_unit.symbol,
                    converted
                        .formatted_quantity
                        .unwrap_or_else(|| converted.quantity.to_string()),
                    to_unit.symbol
                ),
                None => anyhow::bail!("Cannot convert {} to {}", from_unit.name, to_unit.name),
            }
        }
    }

    Ok(())
}
