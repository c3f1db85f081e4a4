//! Page-by-page harvesting with bounded retries.
//!
//! The controller fetches one page per [`HarvestController::resume`] call and
//! waits for the caller to report whether that result was accepted. A page is
//! retried until it succeeds or runs out of attempts, then the controller moves
//! on to the next page.

use crate::error::HarvestError;
use crate::fetcher::PageSource;
use crate::model::Recipe;
use log::{debug, warn};

/// Outcome of the most recently produced page, reported back by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step succeeded, move on
    Ok,
    /// Error occurred during the request, retry the page
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// `page` has not been requested yet
    Advancing { page: u32 },
    /// `page` was produced on attempt number `attempt` (1-based)
    AwaitingOutcome { page: u32, attempt: u32 },
    /// Every configured page has been attempted
    Exhausted,
}

/// Result produced for one attempt at one page
pub type PageResult = Result<Vec<Recipe>, HarvestError>;

pub struct HarvestController<S> {
    source: S,
    pages_amount: u32,
    retries_amount: u32,
    state: ControllerState,
}

impl<S: PageSource> HarvestController<S> {
    pub fn new(source: S, pages_amount: u32, retries_amount: u32) -> Self {
        Self {
            source,
            pages_amount,
            retries_amount: retries_amount.max(1),
            state: ControllerState::Advancing { page: 1 },
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn source(&self) -> &S {
        &self.source
    }

    /// Report the outcome of the previous step and produce the next page result.
    ///
    /// The outcome is ignored before the first page has been produced.
    /// Returns `None` once all pages have been attempted.
    pub async fn resume(&mut self, outcome: StepOutcome) -> Option<PageResult> {
        loop {
            match self.state {
                ControllerState::Exhausted => return None,
                ControllerState::Advancing { page } => {
                    if page > self.pages_amount {
                        debug!("All {} pages attempted", self.pages_amount);
                        self.state = ControllerState::Exhausted;
                        return None;
                    }
                    return Some(self.produce(page, 1).await);
                }
                ControllerState::AwaitingOutcome { page, attempt } => match outcome {
                    StepOutcome::Ok => {
                        self.state = ControllerState::Advancing { page: page + 1 };
                    }
                    StepOutcome::Error if attempt >= self.retries_amount => {
                        warn!("Failed to load page {}", page);
                        self.state = ControllerState::Advancing { page: page + 1 };
                    }
                    StepOutcome::Error => {
                        return Some(self.produce(page, attempt + 1).await);
                    }
                },
            }
        }
    }

    async fn produce(&mut self, page: u32, attempt: u32) -> PageResult {
        debug!(
            "Loading page {}/{} (attempt {}/{})",
            page, self.pages_amount, attempt, self.retries_amount
        );
        self.state = ControllerState::AwaitingOutcome { page, attempt };
        self.source.fetch_page(page).await
    }
}
