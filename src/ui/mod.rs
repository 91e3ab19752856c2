//! Terminal output for the `coffer` binary
//!
//! Uses `cliclack` for spinners and prompts in an interactive terminal and
//! falls back to plain lines in CI or when output is piped. Anything a
//! script may want to capture (resolved paths, listings) is printed by the
//! commands themselves on stdout; progress goes to stderr.

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{key_value, remark, step_info, step_ok, step_ok_detail, step_warn, step_warn_hint};
pub use progress::TaskSpinner;
pub use prompts::confirm;
