//! Wipe command - delete the whole local cache

use super::blocking;
use crate::cache::{disk_usage, format_bytes};
use crate::cli::args::WipeArgs;
use crate::datastore::Datastore;
use crate::error::CofferResult;
use crate::ui::{self, UiContext};

/// Execute the wipe command
pub async fn execute(args: WipeArgs, datastore: Datastore) -> CofferResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let root = datastore.cache_dir().root().to_path_buf();

    if !root.exists() {
        ui::step_info(&ctx, &format!("Cache {} is already empty", root.display()));
        return Ok(());
    }

    let scan_root = root.clone();
    let usage = blocking(move || disk_usage(&scan_root)).await?;
    let prompt = format!("Delete {} ({})?", root.display(), format_bytes(usage));
    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::step_warn_hint(&ctx, "Not confirmed, cache kept", "Pass --yes to skip the prompt");
        return Ok(());
    }

    blocking(move || datastore.wipe_cache()).await?;
    ui::step_ok_detail(&ctx, "Cache wiped", &root.display().to_string());

    Ok(())
}
