use super::CircuitController;
use crate::controller::{HarvestController, StepOutcome};
use crate::fetcher::PageSource;
use crate::model::Recipe;
use log::{debug, error, info, warn};
use tokio::time::sleep;

/// Everything a completed run produced
#[derive(Debug, Default)]
pub struct DriveSummary {
    /// Accepted page results in production order
    pub pages: Vec<Vec<Recipe>>,
    /// Number of failed attempts across the run
    pub errors: u32,
}

/// Pump the controller to completion, rotating the circuit after every
/// accepted page and waiting out the cooldown before the next request.
///
/// A failed attempt is fed back as [`StepOutcome::Error`] so the controller
/// retries the page; no rotation or cooldown happens in that case.
pub async fn drive<S, C>(controller: &mut HarvestController<S>, circuit: &mut C) -> DriveSummary
where
    S: PageSource,
    C: CircuitController,
{
    let mut summary = DriveSummary::default();
    let mut outcome = StepOutcome::Ok;

    while let Some(result) = controller.resume(outcome).await {
        match result {
            Ok(recipes) => {
                summary.pages.push(recipes);
                outcome = StepOutcome::Ok;

                match circuit.rotate().await {
                    Ok(cooldown) => {
                        debug!("Requested new circuit, waiting {:?}", cooldown);
                        sleep(cooldown).await;
                    }
                    Err(e) => warn!("Failed to rotate circuit: {}", e),
                }
            }
            Err(e) => {
                if e.is_recoverable() {
                    warn!("Could not reach URL: {}", e);
                } else {
                    error!("Page attempt failed: {}", e);
                }
                outcome = StepOutcome::Error;
                summary.errors += 1;
            }
        }
    }

    info!("Got {} errors", summary.errors);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarvestError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::time::Instant;

    /// Transport error from a request that cannot be sent
    async fn failed_request() -> HarvestError {
        let err = reqwest::Client::new()
            .get("http://[not a host]/recepty")
            .send()
            .await
            .unwrap_err();
        HarvestError::FetchError(err)
    }

    /// Plays back scripted results; `false` means a failed attempt
    struct ScriptedSource {
        script: VecDeque<bool>,
        requested: Vec<u32>,
    }

    impl ScriptedSource {
        fn new(script: &[bool]) -> Self {
            Self {
                script: script.iter().copied().collect(),
                requested: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch_page(&mut self, page: u32) -> Result<Vec<Recipe>, HarvestError> {
            self.requested.push(page);
            if self.script.pop_front().unwrap_or(true) {
                Ok(Vec::new())
            } else {
                Err(failed_request().await)
            }
        }
    }

    struct CountingCircuit {
        rotations: u32,
        cooldown: Duration,
        fail: bool,
    }

    impl CountingCircuit {
        fn new(cooldown: Duration) -> Self {
            Self {
                rotations: 0,
                cooldown,
                fail: false,
            }
        }
    }

    #[async_trait]
    impl CircuitController for CountingCircuit {
        async fn rotate(&mut self) -> Result<Duration, HarvestError> {
            self.rotations += 1;
            if self.fail {
                return Err(HarvestError::ProxyControlError("552 Unrecognized signal".to_string()));
            }
            Ok(self.cooldown)
        }
    }

    #[tokio::test]
    async fn test_failed_request_is_recoverable() {
        assert!(failed_request().await.is_recoverable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_retries_same_page_without_rotation() {
        let mut controller = HarvestController::new(ScriptedSource::new(&[false, true, true]), 2, 10);
        let mut circuit = CountingCircuit::new(Duration::from_secs(10));

        let started = Instant::now();
        let summary = drive(&mut controller, &mut circuit).await;

        assert_eq!(controller.source().requested, vec![1, 1, 2]);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.pages.len(), 2);
        assert_eq!(circuit.rotations, 2);
        // Only accepted pages pay the cooldown
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(20) && elapsed < Duration::from_secs(21));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_tally_counts_every_failure() {
        // Page 2 never succeeds
        let mut script = vec![true];
        script.extend([false; 10]);
        script.push(true);

        let mut controller = HarvestController::new(ScriptedSource::new(&script), 3, 10);
        let mut circuit = CountingCircuit::new(Duration::from_secs(10));
        let summary = drive(&mut controller, &mut circuit).await;

        assert_eq!(controller.source().requested.len(), 12);
        assert_eq!(summary.errors, 10);
        assert_eq!(summary.pages.len(), 2);
        assert_eq!(circuit.rotations, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotation_failure_does_not_stop_run() {
        let mut controller = HarvestController::new(ScriptedSource::new(&[]), 3, 10);
        let mut circuit = CountingCircuit::new(Duration::from_secs(10));
        circuit.fail = true;

        let started = Instant::now();
        let summary = drive(&mut controller, &mut circuit).await;

        assert_eq!(summary.pages.len(), 3);
        assert_eq!(summary.errors, 0);
        assert_eq!(circuit.rotations, 3);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
