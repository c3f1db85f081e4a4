use crate::error::HarvestError;
use crate::model::Recipe;
use log::info;
use std::path::Path;
use tokio::fs;

/// Write each recipe to `<dir>/<index>.json`, indented with two spaces.
///
/// Returns the number of files written.
pub async fn save_recipes(dir: &Path, recipes: &[Recipe]) -> Result<usize, HarvestError> {
    fs::create_dir_all(dir).await?;

    for (idx, recipe) in recipes.iter().enumerate() {
        let json = serde_json::to_string_pretty(recipe)?;
        fs::write(dir.join(format!("{}.json", idx)), json).await?;
    }

    info!("Saved {} recipes to {}", recipes.len(), dir.display());
    Ok(recipes.len())
}
