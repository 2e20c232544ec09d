use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::{
    agent::{
        grounding::GroundingResolver,
        planning::Step,
        types::{ActionKind, ErrorType, StepResult},
    },
    driver::UiDriver,
    error::Result,
    shared::context::QaConfig,
    ui::UiSnapshot,
};

const DEFAULT_WAIT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub total_executions: usize,
    pub successful_executions: usize,
    pub success_rate: f64,
}

/// Drives steps through the device one at a time and keeps the run's
/// execution history.
pub struct Executor {
    driver: Box<dyn UiDriver>,
    resolver: GroundingResolver,
    config: Arc<QaConfig>,
    history: Vec<StepResult>,
}

impl Executor {
    pub fn new(driver: Box<dyn UiDriver>, config: Arc<QaConfig>) -> Self {
        Self {
            driver,
            resolver: GroundingResolver::new(),
            config,
            history: Vec::new(),
        }
    }

    /// Reset the device and forget the previous run.
    pub async fn reset(&mut self) -> Result<UiSnapshot> {
        self.history.clear();
        self.driver.reset().await
    }

    pub async fn observe(&mut self) -> Result<UiSnapshot> {
        self.driver.observe().await
    }

    /// Execute one step against the snapshot captured just before it.
    ///
    /// Grounding and driver problems become failed results; `Err` means the
    /// device is gone.
    pub async fn execute_step(&mut self, step: &Step, snapshot: &UiSnapshot) -> Result<StepResult> {
        let started = Instant::now();
        info!("Executor: step {} {} '{}'", step.id, step.action_kind, step.target);

        let result = if step.action_kind == ActionKind::Wait {
            let wait = parse_wait_duration(&step.target).unwrap_or_else(|| {
                warn!("Executor: unparsable wait '{}', waiting {:?}", step.target, DEFAULT_WAIT);
                DEFAULT_WAIT
            });
            sleep(wait).await;
            StepResult {
                step_id: step.id,
                success: true,
                action_taken: None,
                error: None,
                error_kind: None,
                snapshot_after: self.driver.observe().await?,
                duration: started.elapsed(),
            }
        } else {
            self.perform(step, snapshot, started).await?
        };

        if !result.success {
            warn!(
                "Executor: step {} failed: {}",
                step.id,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        self.history.push(result.clone());
        Ok(result)
    }

    async fn perform(&mut self, step: &Step, snapshot: &UiSnapshot, started: Instant) -> Result<StepResult> {
        let resolution = match self.resolver.resolve(step, snapshot) {
            Ok(resolution) => resolution,
            Err(e) => {
                return Ok(StepResult {
                    step_id: step.id,
                    success: false,
                    action_taken: None,
                    error: Some(e.to_string()),
                    error_kind: Some(ErrorType::ElementNotFound),
                    snapshot_after: self.driver.observe().await?,
                    duration: started.elapsed(),
                });
            }
        };
        debug!("Executor: step {} grounded via {:?}", step.id, resolution.grounding);

        let action = resolution.action;
        let (success, error, error_kind) = match timeout(step.timeout, self.driver.step(&action)).await {
            Err(_) => (
                false,
                Some(format!("Driver action timed out after {:?}", step.timeout)),
                Some(ErrorType::Timeout),
            ),
            Ok(Err(e)) if !e.is_fatal() => {
                (false, Some(e.to_string()), Some(ErrorType::DriverFailure))
            }
            Ok(Err(e)) => return Err(e),
            Ok(Ok(response)) if response.success => {
                if response.ui_changed && self.config.settle_time_ms > 0 {
                    sleep(self.config.settle_time()).await;
                }
                (true, None, None)
            }
            Ok(Ok(response)) => {
                let error = response
                    .error
                    .unwrap_or_else(|| "Driver reported failure".to_string());
                (false, Some(error), Some(ErrorType::DriverFailure))
            }
        };

        Ok(StepResult {
            step_id: step.id,
            success,
            action_taken: Some(action),
            error,
            error_kind,
            snapshot_after: self.driver.observe().await?,
            duration: started.elapsed(),
        })
    }

    /// Execute steps in order, stopping after the first failure that has no fallback.
    pub async fn execute_plan(&mut self, steps: &[Step]) -> Result<Vec<StepResult>> {
        let mut results = Vec::with_capacity(steps.len());
        for step in steps {
            let snapshot = self.driver.observe().await?;
            let result = self.execute_step(step, &snapshot).await?;
            let stop = !result.success && step.fallback.is_none();
            results.push(result);
            if stop {
                error!(
                    "Executor: step {} failed without fallback, skipping {} remaining steps",
                    step.id,
                    steps.len() - results.len()
                );
                break;
            }
        }
        Ok(results)
    }

    pub fn history(&self) -> &[StepResult] {
        &self.history
    }

    pub fn execution_summary(&self) -> ExecutionSummary {
        let total = self.history.len();
        let successful = self.history.iter().filter(|r| r.success).count();
        ExecutionSummary {
            total_executions: total,
            successful_executions: successful,
            success_rate: if total == 0 {
                0.0
            } else {
                successful as f64 / total as f64
            },
        }
    }
}

/// Parse "<n> [ms|s|sec|second(s)|min|minute(s)]"; a bare number is seconds.
pub fn parse_wait_duration(target: &str) -> Option<Duration> {
    let target = target.trim().to_lowercase();
    let number_end = target
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(target.len());
    let value: f64 = target[..number_end].parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    let unit = target[number_end..].split_whitespace().next().unwrap_or("");
    let seconds = match unit {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => value,
        "ms" | "millisecond" | "milliseconds" => value / 1000.0,
        "m" | "min" | "mins" | "minute" | "minutes" => value * 60.0,
        _ => return None,
    };
    Duration::try_from_secs_f64(seconds).ok()
}
