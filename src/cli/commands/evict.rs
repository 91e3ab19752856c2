//! Evict command - drop one artifact from the local cache

use super::blocking;
use crate::cli::args::EvictArgs;
use crate::datastore::Datastore;
use crate::error::CofferResult;
use crate::ui::{self, UiContext};

/// Execute the evict command
pub async fn execute(args: EvictArgs, datastore: Datastore) -> CofferResult<()> {
    let ctx = UiContext::detect();
    let coordinate = args.coordinate.with_kind(args.kind())?;

    let target = coordinate.clone();
    if blocking(move || datastore.evict(&target)).await? {
        ui::step_ok(&ctx, &format!("Evicted {}", coordinate));
    } else {
        ui::step_info(&ctx, &format!("{} is not cached", coordinate));
    }

    Ok(())
}
