use crate::config::HarvestConfig;
use crate::error::HarvestError;
use crate::extractors::{extract_recipe, find_ld_json, is_recipe};
use crate::model::Recipe;
use async_trait::async_trait;
use log::debug;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Proxy};
use scraper::Html;
use serde_json::Value;

pub const USER_AGENTS: [&str; 6] = [
    // firefox
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:55.0) Gecko/20100101 Firefox/55.0",
    // chrome
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/57.0.2987.110 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/61.0.3163.79 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/61.0.3163.91 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/62.0.3202.89 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/63.0.3239.108 Safari/537.36",
];

pub const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Anything that can produce the recipes of one listing page
#[async_trait]
pub trait PageSource: Send {
    async fn fetch_page(&mut self, page: u32) -> Result<Vec<Recipe>, HarvestError>;
}

/// Build an HTTP client that sends all traffic through the Tor SOCKS listener
pub fn proxied_client(config: &HarvestConfig) -> Result<Client, HarvestError> {
    let client = Client::builder()
        .timeout(config.request_timeout())
        .proxy(Proxy::all(config.socks_proxy_url())?)
        .build()?;

    Ok(client)
}

/// Browser-like headers with a User-Agent picked from [`USER_AGENTS`]
pub fn random_headers<R: Rng + ?Sized>(rng: &mut R) -> Result<HeaderMap, HarvestError> {
    let user_agent = USER_AGENTS.choose(rng).copied().unwrap_or(USER_AGENTS[0]);

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    Ok(headers)
}

/// Extract every recipe from a listing page body.
///
/// A page without an ld+json `itemListElement` list yields nothing.
pub fn recipes_from_html(html: &str) -> Vec<Recipe> {
    let document = Html::parse_document(html);

    let Some(listing) = find_ld_json(&document) else {
        debug!("No JSON-LD block found on the page");
        return Vec::new();
    };

    let Some(items) = listing.get("itemListElement").and_then(Value::as_array) else {
        // Not parsable
        debug!("JSON-LD block has no itemListElement list");
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| is_recipe(item))
        .filter_map(extract_recipe)
        .collect()
}

/// Fetches listing pages from the recipe site
pub struct RecipePageFetcher<R = StdRng> {
    client: Client,
    listing_url: String,
    rng: R,
}

impl RecipePageFetcher<StdRng> {
    pub fn new(client: Client, listing_url: impl Into<String>) -> Self {
        Self::with_rng(client, listing_url, StdRng::from_os_rng())
    }
}

impl<R: Rng + Send> RecipePageFetcher<R> {
    pub fn with_rng(client: Client, listing_url: impl Into<String>, rng: R) -> Self {
        Self {
            client,
            listing_url: listing_url.into(),
            rng,
        }
    }

    /// Request one listing page. Transport failures and non-success statuses
    /// are returned as [`HarvestError::FetchError`]; no retry happens here.
    pub async fn fetch(&mut self, page: u32) -> Result<Vec<Recipe>, HarvestError> {
        let headers = random_headers(&mut self.rng)?;

        debug!("Fetching {}?page={}", self.listing_url, page);
        let html = self
            .client
            .get(&self.listing_url)
            .query(&[("page", page)])
            .headers(headers)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(recipes_from_html(&html))
    }
}

#[async_trait]
impl<R: Rng + Send> PageSource for RecipePageFetcher<R> {
    async fn fetch_page(&mut self, page: u32) -> Result<Vec<Recipe>, HarvestError> {
        self.fetch(page).await
    }
}
