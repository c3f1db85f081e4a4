use crate::ingredients::parse_ingredient;
use crate::model::{EnergyValue, Recipe};
use html_escape::decode_html_entities;
use log::debug;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use std::convert::TryFrom;

#[derive(Debug, Deserialize)]
struct JsonLdRecipe {
    name: String,
    #[serde(rename = "recipeYield")]
    recipe_yield: String,
    #[serde(rename = "recipeInstructions")]
    recipe_instructions: Vec<InstructionStep>,
    #[serde(rename = "recipeIngredient")]
    recipe_ingredient: Vec<String>,
    nutrition: Nutrition,
}

#[derive(Debug, Deserialize)]
struct TextObject {
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstructionStep {
    String(String),
    HowToStep(TextObject),
}

#[derive(Debug, Deserialize)]
struct Nutrition {
    #[serde(default = "zero")]
    calories: Value,
    #[serde(rename = "proteinContent", default = "zero")]
    protein_content: Value,
    #[serde(rename = "fatContent", default = "zero")]
    fat_content: Value,
    #[serde(rename = "carbohydrateContent", default = "zero")]
    carbohydrate_content: Value,
}

fn zero() -> Value {
    Value::from(0.0)
}

impl TryFrom<Value> for JsonLdRecipe {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value)
    }
}

fn decode_html_symbols(text: &str) -> String {
    // Entities may arrive escaped twice (`&amp;quot;`)
    decode_html_entities(&decode_html_entities(text)).into_owned()
}

/// First whitespace-delimited token of "4 порции", falling back to 1
fn serves_amount(recipe_yield: &str) -> u32 {
    recipe_yield
        .split_whitespace()
        .next()
        .and_then(|token| token.parse::<u32>().ok())
        .filter(|amount| *amount > 0)
        .unwrap_or(1)
}

impl From<JsonLdRecipe> for Recipe {
    fn from(json_ld_recipe: JsonLdRecipe) -> Self {
        let text = json_ld_recipe
            .recipe_instructions
            .iter()
            .map(|step| match step {
                InstructionStep::String(text) => text,
                InstructionStep::HowToStep(obj) => &obj.text,
            })
            .enumerate()
            .map(|(idx, step)| format!("{}. {}", idx + 1, decode_html_symbols(step.trim_end())))
            .collect::<Vec<String>>()
            .join("\n");

        let nutrition = json_ld_recipe.nutrition;

        Recipe {
            name: decode_html_symbols(&json_ld_recipe.name),
            serves_amount: serves_amount(&json_ld_recipe.recipe_yield),
            ingredients: json_ld_recipe
                .recipe_ingredient
                .iter()
                .map(|line| parse_ingredient(&decode_html_symbols(line)))
                .collect(),
            text,
            energy_value_per_serving: EnergyValue {
                calories: nutrition.calories,
                protein: nutrition.protein_content,
                fat: nutrition.fat_content,
                carbohydrates: nutrition.carbohydrate_content,
            },
        }
    }
}

/// Required fields of a listing entry and the JSON type each must have
const EXPECTED_FIELDS: [(&str, fn(&Value) -> bool); 5] = [
    ("name", Value::is_string),
    ("recipeYield", Value::is_string),
    ("recipeInstructions", Value::is_array),
    ("recipeIngredient", Value::is_array),
    ("nutrition", Value::is_object),
];

/// Whether a listing entry is tagged `"@type": "Recipe"`
pub fn is_recipe(element: &Value) -> bool {
    element.get("@type").and_then(Value::as_str) == Some("Recipe")
}

/// Reshape one listing entry into a [`Recipe`].
///
/// Entries that are not objects, or that miss any required field or carry it
/// with the wrong type, are rejected.
pub fn extract_recipe(element: &Value) -> Option<Recipe> {
    if !element.is_object() {
        return None;
    }

    for (field, has_expected_type) in EXPECTED_FIELDS {
        if !element.get(field).is_some_and(has_expected_type) {
            debug!("Skipping recipe: field '{}' is missing or mistyped", field);
            return None;
        }
    }

    match JsonLdRecipe::try_from(element.clone()) {
        Ok(recipe) => Some(Recipe::from(recipe)),
        Err(e) => {
            debug!("Skipping recipe: {}", e);
            None
        }
    }
}

/// Locate the first `application/ld+json` block that parses as JSON
pub fn find_ld_json(document: &Html) -> Option<Value> {
    let selector = Selector::parse("script[type='application/ld+json']").ok()?;

    document.select(&selector).find_map(|script| {
        let json_text = script.inner_html();
        match serde_json::from_str::<Value>(json_text.trim()) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Invalid JSON-LD block: {}", e);
                None
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn well_formed() -> Value {
        json!({
            "@type": "Recipe",
            "name": "Сырники",
            "recipeYield": "4 порции",
            "recipeInstructions": [
                "Смешать творог с яйцом.   ",
                "Обжарить на сковороде."
            ],
            "recipeIngredient": [
                "Творог 500 г",
                "Яйцо куриное 1 штука",
                "Соль по вкусу"
            ],
            "nutrition": {
                "@type": "NutritionInformation",
                "calories": "245 ккал",
                "proteinContent": "18 г",
                "fatContent": 9.5,
                "carbohydrateContent": "21 г"
            }
        })
    }

    #[test]
    fn test_extract_well_formed_recipe() {
        let recipe = extract_recipe(&well_formed()).unwrap();

        assert_eq!(recipe.name, "Сырники");
        assert_eq!(recipe.serves_amount, 4);
        assert_eq!(
            recipe.text,
            "1. Смешать творог с яйцом.\n2. Обжарить на сковороде."
        );

        let names: Vec<&str> = recipe.ingredients.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Творог", "Яйцо куриное", "Соль"]);
        assert_eq!(recipe.ingredients[0].unit, "г");
        assert_eq!(recipe.ingredients[0].amount, 500.0);

        assert_eq!(recipe.energy_value_per_serving.calories, json!("245 ккал"));
        assert_eq!(recipe.energy_value_per_serving.protein, json!("18 г"));
        assert_eq!(recipe.energy_value_per_serving.fat, json!(9.5));
        assert_eq!(recipe.energy_value_per_serving.carbohydrates, json!("21 г"));
    }

    #[test]
    fn test_how_to_step_instructions() {
        let mut element = well_formed();
        element["recipeInstructions"] = json!([
            {"@type": "HowToStep", "text": "Первый шаг"},
            {"@type": "HowToStep", "text": "Второй шаг"}
        ]);

        let recipe = extract_recipe(&element).unwrap();
        assert_eq!(recipe.text, "1. Первый шаг\n2. Второй шаг");
    }

    #[test]
    fn test_decodes_html_entities() {
        let mut element = well_formed();
        element["name"] = json!("Салат &quot;Оливье&quot;");

        let recipe = extract_recipe(&element).unwrap();
        assert_eq!(recipe.name, "Салат \"Оливье\"");
    }

    #[test]
    fn test_decodes_double_escaped_entities() {
        let mut element = well_formed();
        element["name"] = json!("Салат &amp;quot;Оливье&amp;quot;");
        element["recipeIngredient"] = json!(["Сыр &amp;laquo;Российский&amp;raquo; 100 г"]);

        let recipe = extract_recipe(&element).unwrap();
        assert_eq!(recipe.name, "Салат \"Оливье\"");
        assert_eq!(recipe.ingredients[0].name, "Сыр «Российский»");
    }

    #[test]
    fn test_missing_nutrition_fields_default_to_zero() {
        let mut element = well_formed();
        element["nutrition"] = json!({"calories": 100});

        let recipe = extract_recipe(&element).unwrap();
        assert_eq!(recipe.energy_value_per_serving.calories, json!(100));
        assert_eq!(recipe.energy_value_per_serving.fat, json!(0.0));
    }

    #[test]
    fn test_unparsable_yield_serves_one() {
        let mut element = well_formed();
        element["recipeYield"] = json!("несколько порций");
        assert_eq!(extract_recipe(&element).unwrap().serves_amount, 1);

        element["recipeYield"] = json!("");
        assert_eq!(extract_recipe(&element).unwrap().serves_amount, 1);
    }

    #[test]
    fn test_rejects_missing_or_mistyped_fields() {
        for field in ["name", "recipeYield", "recipeInstructions", "recipeIngredient", "nutrition"] {
            let mut element = well_formed();
            element.as_object_mut().unwrap().remove(field);
            assert!(extract_recipe(&element).is_none(), "missing {}", field);
        }

        let mut element = well_formed();
        element["recipeYield"] = json!(4);
        assert!(extract_recipe(&element).is_none());

        let mut element = well_formed();
        element["nutrition"] = json!(["245 ккал"]);
        assert!(extract_recipe(&element).is_none());

        let mut element = well_formed();
        element["recipeIngredient"] = json!([1, 2]);
        assert!(extract_recipe(&element).is_none());
    }

    #[test]
    fn test_rejects_non_objects() {
        assert!(extract_recipe(&json!("Recipe")).is_none());
        assert!(extract_recipe(&json!([well_formed()])).is_none());
    }

    #[test]
    fn test_is_recipe() {
        assert!(is_recipe(&well_formed()));
        assert!(!is_recipe(&json!({"@type": "ItemList"})));
        assert!(!is_recipe(&json!({"name": "untyped"})));
    }

    #[test]
    fn test_find_ld_json_skips_invalid_blocks() {
        let html = r#"
            <html>
            <head>
                <script type="application/ld+json">{ not json</script>
                <script type="application/ld+json">{"@type": "ItemList", "itemListElement": []}</script>
            </head>
            <body></body>
            </html>
        "#;

        let document = Html::parse_document(html);
        let value = find_ld_json(&document).unwrap();
        assert_eq!(value["@type"], "ItemList");
    }

    #[test]
    fn test_find_ld_json_without_block() {
        let document = Html::parse_document("<html><body><p>Рецепты</p></body></html>");
        assert!(find_ld_json(&document).is_none());
    }
}
