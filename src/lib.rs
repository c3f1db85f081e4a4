pub mod config;
pub mod controller;
pub mod error;
pub mod extractors;
pub mod fetcher;
pub mod ingredients;
pub mod model;
pub mod proxy;
pub mod storage;

use log::warn;
use std::path::Path;

pub use crate::config::HarvestConfig;
pub use controller::{ControllerState, HarvestController, StepOutcome};
pub use error::HarvestError;
pub use fetcher::{PageSource, RecipePageFetcher};
pub use ingredients::parse_ingredient;
pub use model::{EnergyValue, IngredientAmount, Recipe};
pub use proxy::{drive, Authentication, CircuitController, TorController};
pub use storage::save_recipes;

/// Outcome of a full harvest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Recipe records written
    pub recipes: usize,
    /// Failed page attempts
    pub errors: u32,
}

/// Harvest every listing page through Tor and write the recipes to `output`.
///
/// Fails before any page is requested if the Tor control port cannot be
/// reached or refuses authentication.
pub async fn harvest(config: &HarvestConfig, output: &Path) -> Result<HarvestSummary, HarvestError> {
    let mut tor = TorController::connect(&config.control_address())
        .await?
        .with_cooldown(config.newnym_cooldown());
    let auth = Authentication::from_config(config).await?;
    tor.authenticate(&auth).await?;

    let client = fetcher::proxied_client(config)?;
    let fetcher = RecipePageFetcher::new(client, config.listing_url.as_str());

    let summary = harvest_with(fetcher, &mut tor, config, output).await;

    if let Err(e) = tor.quit().await {
        warn!("Failed to close Tor control connection: {}", e);
    }

    summary
}

/// Run the harvest loop over any page source and circuit controller
pub async fn harvest_with<S, C>(
    source: S,
    circuit: &mut C,
    config: &HarvestConfig,
    output: &Path,
) -> Result<HarvestSummary, HarvestError>
where
    S: PageSource,
    C: CircuitController,
{
    let mut controller = HarvestController::new(source, config.pages_amount, config.retries_amount);
    let summary = drive(&mut controller, circuit).await;

    let recipes: Vec<Recipe> = summary.pages.into_iter().flatten().collect();
    let written = save_recipes(output, &recipes).await?;

    Ok(HarvestSummary {
        recipes: written,
        errors: summary.errors,
    })
}
