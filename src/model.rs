use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

/// A harvested recipe, written to disk as one JSON record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub name: String,
    pub serves_amount: u32,
    pub ingredients: Vec<IngredientAmount>,
    /// Numbered steps ("1. ...\n2. ...")
    pub text: String,
    pub energy_value_per_serving: EnergyValue,
}

/// Nutrition values per serving, copied verbatim from the page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyValue {
    pub calories: Value,
    pub protein: Value,
    pub fat: Value,
    pub carbohydrates: Value,
}

impl Default for EnergyValue {
    fn default() -> Self {
        Self {
            calories: Value::from(0.0),
            protein: Value::from(0.0),
            fat: Value::from(0.0),
            carbohydrates: Value::from(0.0),
        }
    }
}

/// One parsed ingredient line.
///
/// Serializes as `{"<name>": {"<unit>": <amount>}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientAmount {
    pub name: String,
    pub unit: String,
    pub amount: f64,
}

struct UnitAmount<'a>(&'a str, f64);

impl Serialize for UnitAmount<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.0, &self.1)?;
        map.end()
    }
}

impl Serialize for IngredientAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &UnitAmount(&self.unit, self.amount))?;
        map.end()
    }
}
