use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{
    agent::{
        planning::{ErrorContext, Step},
        types::{ErrorType, StepResult},
        verification::{
            heuristic::HeuristicVerifier,
            status::{VerificationOutcome, VerificationStatus},
        },
    },
    error::agent_error::AgentError,
    judgment::JudgmentStrategy,
    prompt::builder::build_verification_prompt,
    shared::context::QaConfig,
    utils::string_util::JsonPayload,
};

#[derive(Debug, Deserialize)]
struct RawJudgment {
    status: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    bug_description: Option<String>,
}

/// A parsed judgment verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct Judgment {
    pub status: VerificationStatus,
    pub reason: String,
    pub confidence: f64,
    pub bug_description: Option<String>,
}

impl Judgment {
    pub fn parse(response: &str) -> Result<Self, AgentError> {
        let raw: RawJudgment = serde_json::from_str(response.json_payload())
            .map_err(|e| AgentError::JudgmentParse(e.to_string()))?;
        let status = VerificationStatus::parse(&raw.status)
            .ok_or_else(|| AgentError::JudgmentParse(format!("unknown status: {}", raw.status)))?;
        let confidence = raw
            .confidence
            .filter(|c| c.is_finite())
            .unwrap_or(0.5)
            .clamp(0.0, 1.0);
        Ok(Self {
            status,
            reason: raw.reason,
            confidence,
            bug_description: raw.bug_description.filter(|d| !d.trim().is_empty()),
        })
    }
}

pub struct Verifier {
    judgment: Arc<dyn JudgmentStrategy>,
    heuristic: HeuristicVerifier,
    replan_threshold: f64,
}

impl Verifier {
    pub fn new(judgment: Arc<dyn JudgmentStrategy>, config: &QaConfig) -> Self {
        Self {
            judgment,
            heuristic: HeuristicVerifier::new(
                config.heuristic_pass_confidence,
                config.heuristic_confidence,
            ),
            replan_threshold: config.replan_confidence_threshold,
        }
    }

    /// Classify one step. Failed executions are FAILED and force replanning.
    pub async fn verify_step(&self, step: &Step, result: &StepResult) -> VerificationOutcome {
        if !result.success {
            return VerificationOutcome {
                step_id: result.step_id,
                status: VerificationStatus::Failed,
                reason: result
                    .error
                    .clone()
                    .unwrap_or_else(|| "Unknown error".to_string()),
                confidence: 1.0,
                needs_replanning: true,
                bug_description: None,
                resulting_state: result.snapshot_after.clone(),
            };
        }

        let prompt = build_verification_prompt(&step.expected_outcome, &result.snapshot_after);
        let judgment = match self.judgment.generate(&prompt).await {
            Ok(response) => Judgment::parse(&response)
                .inspect_err(|e| warn!("Verifier: discarding judgment for step {}: {}", step.id, e))
                .ok(),
            Err(e) => {
                debug!("Verifier: judgment unavailable: {}", e);
                None
            }
        };

        let judgment = judgment.unwrap_or_else(|| {
            let verdict = self.heuristic.verify(&step.expected_outcome, &result.snapshot_after);
            Judgment {
                status: verdict.status,
                reason: verdict.reason,
                confidence: verdict.confidence,
                bug_description: None,
            }
        });

        VerificationOutcome {
            step_id: result.step_id,
            status: judgment.status,
            reason: judgment.reason,
            confidence: judgment.confidence,
            needs_replanning: false,
            bug_description: judgment.bug_description,
            resulting_state: result.snapshot_after.clone(),
        }
    }

    /// One outcome per result, in result order.
    pub async fn verify_results(&self, steps: &[Step], results: &[StepResult]) -> Vec<VerificationOutcome> {
        let mut outcomes = Vec::with_capacity(results.len());
        for (index, result) in results.iter().enumerate() {
            let outcome = match step_for(steps, index, result.step_id) {
                Some(step) => self.verify_step(step, result).await,
                None => VerificationOutcome {
                    step_id: result.step_id,
                    status: VerificationStatus::Unknown,
                    reason: "No step matches this result".to_string(),
                    confidence: 0.0,
                    needs_replanning: false,
                    bug_description: None,
                    resulting_state: result.snapshot_after.clone(),
                },
            };
            info!(
                "Verifier: step {} {} ({:.2}): {}",
                outcome.step_id, outcome.status, outcome.confidence, outcome.reason
            );
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Any forced replan, or any failure more confident than the threshold.
    pub fn needs_replanning(&self, outcomes: &[VerificationOutcome]) -> bool {
        outcomes.iter().any(|o| {
            o.needs_replanning
                || (o.status == VerificationStatus::Failed && o.confidence > self.replan_threshold)
        })
    }

    /// Failure context from the most recent outcome only.
    pub fn replan_context<'a>(
        &self,
        steps: &'a [Step],
        results: &[StepResult],
        outcomes: &[VerificationOutcome],
    ) -> Option<(&'a Step, ErrorContext)> {
        let index = outcomes.len().checked_sub(1)?;
        let last = &outcomes[index];
        let step = step_for(steps, index, last.step_id)?;
        let error_type = results
            .get(index)
            .filter(|r| r.step_id == last.step_id)
            .or_else(|| results.iter().find(|r| r.step_id == last.step_id))
            .and_then(|r| r.error_kind)
            .unwrap_or(ErrorType::VerificationFailed);
        Some((
            step,
            ErrorContext {
                error_type,
                message: last.reason.clone(),
                current_state: last.resulting_state.clone(),
            },
        ))
    }
}

/// Results follow plan order, so the step at the same position is preferred
/// over an id lookup.
fn step_for(steps: &[Step], index: usize, step_id: u32) -> Option<&Step> {
    steps
        .get(index)
        .filter(|s| s.id == step_id)
        .or_else(|| steps.iter().find(|s| s.id == step_id))
}
