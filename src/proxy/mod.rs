mod driver;
mod tor;

pub use driver::{drive, DriveSummary};
pub use tor::{Authentication, TorController, NEWNYM_WAIT};

use crate::error::HarvestError;
use async_trait::async_trait;
use std::time::Duration;

/// Source of fresh anonymizing identities
#[async_trait]
pub trait CircuitController: Send {
    /// Switch to a new circuit and return how long to wait before it is usable
    async fn rotate(&mut self) -> Result<Duration, HarvestError>;
}
