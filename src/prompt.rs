//! Confirmation gates.

use crate::error::DeployError;
use crate::traits::Confirm;

/// Answers every prompt the same way without asking anyone.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl AutoConfirm {
    pub fn yes() -> Self {
        Self(true)
    }

    pub fn no() -> Self {
        Self(false)
    }
}

impl Confirm for AutoConfirm {
    async fn confirm(&self, message: &str) -> Result<bool, DeployError> {
        tracing::debug!(answer = self.0, "auto-confirm: {}", message);
        Ok(self.0)
    }
}

/// Asks on the terminal. Blocks a worker thread, not the runtime.
#[cfg(feature = "interactive")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConfirm {
    /// Answer used when the user just presses enter.
    pub default: bool,
}

#[cfg(feature = "interactive")]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, message: &str) -> Result<bool, DeployError> {
        let prompt = format!("{message}\nConfirm");
        let default = self.default;
        tokio::task::spawn_blocking(move || {
            dialoguer::Confirm::new()
                .with_prompt(prompt)
                .default(default)
                .interact()
                .map_err(|e| DeployError::Prompt(e.to_string()))
        })
        .await
        .map_err(|e| DeployError::Prompt(format!("prompt task failed: {e}")))?
    }
}

/// Text shown before a first deployment of `name`.
pub fn deploy_message(name: &str, contract: &str, args: &[serde_json::Value]) -> String {
    let params = serde_json::to_string_pretty(args).unwrap_or_else(|_| format!("{args:?}"));
    format!("Deploy \"{name}\" ({contract}) with params:\n{params}")
}
