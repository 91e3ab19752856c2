//! Publish command - upload a file or directory

use super::blocking;
use crate::cache::format_bytes;
use crate::cli::args::PublishArgs;
use crate::coordinate::Kind;
use crate::datastore::Datastore;
use crate::error::{CofferError, CofferResult};
use crate::ui::{self, TaskSpinner, UiContext};
use std::io;

/// Execute the publish command
pub async fn execute(args: PublishArgs, datastore: Datastore) -> CofferResult<()> {
    let ctx = UiContext::detect();
    let PublishArgs { path, coordinate } = args;

    let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            CofferError::PathNotFound(path.clone())
        } else {
            CofferError::io(format!("reading {}", path.display()), e)
        }
    })?;
    let kind = if metadata.is_dir() {
        Kind::Directory
    } else {
        Kind::File
    };

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Publishing {} as {} ({})", path.display(), coordinate, kind));

    let result = blocking(move || match kind {
        Kind::File => datastore.publish_file(
            &path,
            &coordinate.group,
            &coordinate.name,
            coordinate.version,
        ),
        Kind::Directory => datastore.publish_directory(
            &path,
            &coordinate.group,
            &coordinate.name,
            coordinate.version,
        ),
    })
    .await;

    let published = match result {
        Ok(published) => published,
        Err(e) => {
            spinner.stop_error("Publish failed");
            return Err(e);
        }
    };

    spinner.stop(&format!("Published {}", published.coordinate));
    ui::key_value(&ctx, "key", &published.key);
    ui::key_value(&ctx, "size", &format_bytes(published.bytes));
    ui::key_value(&ctx, "sha256", &published.sha256);

    Ok(())
}
