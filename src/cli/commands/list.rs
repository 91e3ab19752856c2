//! List command - show cached artifacts

use super::blocking;
use crate::cache::{format_bytes, CachedEntry};
use crate::cli::args::{ListArgs, OutputFormat};
use crate::datastore::Datastore;
use crate::error::CofferResult;
use crate::ui::{self, UiContext};
use console::style;

/// Execute the list command
pub async fn execute(args: ListArgs, datastore: Datastore) -> CofferResult<()> {
    let root = datastore.cache_dir().root().to_path_buf();
    let entries = blocking(move || datastore.cached_entries()).await?;

    if entries.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, &format!("Nothing cached in {}", root.display()));
            }
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&entries),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Plain => print_plain(&entries),
    }

    Ok(())
}

fn print_table(entries: &[CachedEntry]) {
    println!(
        "{:<40} {:<10} {:>10} {:<17}",
        style("COORDINATE").bold(),
        style("KIND").bold(),
        style("SIZE").bold(),
        style("CACHED").bold()
    );
    println!("{}", "-".repeat(80));

    let mut total = 0;
    for entry in entries {
        let c = &entry.coordinate;
        let kind = match c.kind() {
            crate::coordinate::Kind::File => style("file").cyan(),
            crate::coordinate::Kind::Directory => style("directory").magenta(),
        };
        println!(
            "{:<40} {:<10} {:>10} {:<17}",
            format!("{}:{}:{}", c.group(), c.name(), c.version()),
            kind,
            format_bytes(entry.size_bytes),
            entry.cached_at.format("%Y-%m-%d %H:%M")
        );
        total += entry.size_bytes;
    }

    println!();
    println!("{} artifact(s), {}", entries.len(), format_bytes(total));
}

fn print_plain(entries: &[CachedEntry]) {
    for entry in entries {
        println!("{}", entry.path.display());
    }
}
