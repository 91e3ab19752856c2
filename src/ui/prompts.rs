//! Confirmation prompt with a non-interactive fallback

use super::context::UiContext;
use crate::error::{CofferError, CofferResult};

/// Ask for confirmation.
///
/// `--yes` approves, a non-interactive session gets `default`.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> CofferResult<bool> {
    if ctx.auto_yes() {
        return Ok(true);
    }
    if !ctx.is_interactive() {
        return Ok(default);
    }

    // cliclack blocks on stdin
    let message = message.to_string();
    let answer = tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message).initial_value(default).interact()
    })
    .await
    .map_err(|e| CofferError::Internal(format!("prompt task failed: {}", e)))?;

    answer.map_err(|e| CofferError::User(format!("Prompt failed: {}", e)))
}
