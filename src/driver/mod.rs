//! Boundary to the device (physical, emulated or simulated).

pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{agent::types::Action, error::Result, ui::UiSnapshot};

pub use mock::{ActionLog, MockDriver};

/// Outcome of one submitted action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub ui_changed: bool,
}

impl DriverResponse {
    pub fn ok(ui_changed: bool) -> Self {
        Self {
            success: true,
            error: None,
            ui_changed,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ui_changed: false,
        }
    }
}

/// A driver reports action-level problems through `DriverResponse::failed`
/// (or a non-fatal `AgentError::DriverFailure`); `DriverDisconnected` and
/// other fatal errors abort the run.
///
/// `screenshot` actions must never change UI state.
#[async_trait]
pub trait UiDriver: Send + Sync {
    async fn reset(&mut self) -> Result<UiSnapshot>;

    async fn observe(&mut self) -> Result<UiSnapshot>;

    async fn step(&mut self, action: &Action) -> Result<DriverResponse>;
}
