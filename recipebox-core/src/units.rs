//! Unit lookup and ingredient conversion through the backend.

use crate::api::RecipeApi;
use crate::error::ApiError;
use crate::types::{ConversionRequest, Ingredient, Unit};

/// Find a unit by id, symbol or name, ignoring case.
pub fn find_unit<'a>(units: &'a [Unit], query: &str) -> Option<&'a Unit> {
    let query = query.trim();
    units.iter().find(|u| {
        u.id.eq_ignore_ascii_case(query)
            || u.symbol.eq_ignore_ascii_case(query)
            || u.name.eq_ignore_ascii_case(query)
    })
}

/// Convert an ingredient's quantity to `to_unit`.
///
/// Returns `None` without converting when the backend reports the two units
/// as incompatible (e.g. grams to cups).
pub async fn convert_ingredient<A: RecipeApi + ?Sized>(
    api: &A,
    ingredient: &Ingredient,
    to_unit: &str,
) -> Result<Option<Ingredient>, ApiError> {
    if ingredient.unit.eq_ignore_ascii_case(to_unit) {
        return Ok(Some(ingredient.clone()));
    }
    if !api.can_convert(&ingredient.unit, to_unit).await? {
        tracing::debug!(from = %ingredient.unit, to = %to_unit, "units are not convertible");
        return Ok(None);
    }

    let response = api
        .convert_units(&ConversionRequest {
            value: ingredient.quantity,
            from_unit: ingredient.unit.clone(),
            to_unit: to_unit.to_string(),
            format: None,
        })
        .await?;

    Ok(Some(Ingredient {
        name: ingredient.name.clone(),
        unit: response.converted_unit,
        quantity: response.converted_value,
        formatted_quantity: Some(response.formatted_converted_value),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApi;

    fn unit(id: &str, symbol: &str, name: &str) -> Unit {
        Unit {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            system: "METRIC".to_string(),
        }
    }

    #[test]
    fn test_find_unit() {
        let units = vec![unit("GRAMS", "g", "gram"), unit("LITERS", "l", "liter")];
        assert_eq!(find_unit(&units, "G").map(|u| u.id.as_str()), Some("GRAMS"));
        assert_eq!(find_unit(&units, " liter ").map(|u| u.id.as_str()), Some("LITERS"));
        assert!(find_unit(&units, "cup").is_none());
    }

    #[tokio::test]
    async fn test_convert_ingredient() {
        let api = MockApi::new();
        let butter = Ingredient::new("Butter", "POUNDS", 1.0);

        let grams = convert_ingredient(&api, &butter, "GRAMS")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(grams.unit, "GRAMS");
        assert_eq!(grams.formatted_quantity.as_deref(), Some("453.59"));

        assert!(convert_ingredient(&api, &butter, "CUPS")
            .await
            .unwrap()
            .is_none());
        assert_eq!(api.call_count("POST /api/units/convert"), 1);
    }
}
