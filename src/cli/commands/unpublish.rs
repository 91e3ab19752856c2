//! Unpublish command - delete an artifact version from the remote store

use super::blocking;
use crate::cli::args::UnpublishArgs;
use crate::datastore::Datastore;
use crate::error::CofferResult;
use crate::ui::{self, UiContext};

/// Execute the unpublish command
pub async fn execute(args: UnpublishArgs, datastore: Datastore) -> CofferResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let spec = args.coordinate;

    let prompt = format!(
        "Delete {} (file and directory) from {}?",
        spec,
        datastore.store().describe()
    );
    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::step_warn_hint(&ctx, "Not confirmed, nothing deleted", "Pass --yes to skip the prompt");
        return Ok(());
    }

    let label = spec.to_string();
    blocking(move || datastore.unpublish(&spec.group, &spec.name, spec.version)).await?;

    ui::step_ok(&ctx, &format!("Unpublished {}", label));
    ui::remark(&ctx, "Local caches keep their copies until evicted or wiped");
    Ok(())
}
