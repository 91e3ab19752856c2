//! Fetch command - resolve an artifact to a local path

use super::blocking;
use crate::cli::args::FetchArgs;
use crate::datastore::{Datastore, Resolution};
use crate::error::{CofferError, CofferResult};
use crate::ui::{TaskSpinner, UiContext};
use tracing::debug;

/// Execute the fetch command. The resolved path is the only line on stdout.
pub async fn execute(args: FetchArgs, datastore: Datastore) -> CofferResult<()> {
    let ctx = UiContext::detect();
    let coordinate = args.coordinate.with_kind(args.kind())?;

    let resolution = if datastore.is_cached(&coordinate) {
        debug!(coordinate = %coordinate, "already cached");
        Resolution::Found(datastore.cache_dir().entry_path(&coordinate))
    } else {
        let mut spinner = TaskSpinner::new(&ctx);
        spinner.start(&format!("Fetching {}", coordinate));

        let target = coordinate.clone();
        match blocking(move || datastore.resolve(&target)).await {
            Ok(resolution @ Resolution::Found(_)) => {
                spinner.stop(&format!("Fetched {}", coordinate));
                resolution
            }
            Ok(resolution) => {
                spinner.clear();
                resolution
            }
            Err(e) => {
                spinner.stop_error(&format!("Failed to fetch {}", coordinate));
                return Err(e);
            }
        }
    };

    match resolution {
        Resolution::Found(path) => {
            println!("{}", path.display());
            Ok(())
        }
        Resolution::NotFound(missing) => Err(CofferError::does_not_exist(missing)),
    }
}
