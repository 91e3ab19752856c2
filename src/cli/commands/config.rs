//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::schema::StoreBackend;
use crate::config::{Config, ConfigManager};
use crate::error::{CofferError, CofferResult};
use crate::ui::{self, UiContext};
use std::path::PathBuf;

/// Keys accepted by `config set`
const SETTABLE_KEYS: &[&str] = &[
    "cache.root",
    "store.backend",
    "store.path",
    "store.url",
    "store.token_env",
    "store.timeout_secs",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, manager: &ConfigManager, config: &Config) -> CofferResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => {
            let mut updated = config.clone();
            set_value(&mut updated, &key, &value)?;
            manager.save(&updated).await?;
            ui::step_ok(&UiContext::detect(), &format!("Set {} = {}", key, value));
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> CofferResult<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> CofferResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());

    Ok(())
}

/// Apply one dotted key to `config`
fn set_value(config: &mut Config, key: &str, value: &str) -> CofferResult<()> {
    match key {
        "cache.root" => config.cache.root = Some(PathBuf::from(value)),
        "store.backend" => {
            config.store.backend = match value {
                "local" => StoreBackend::Local,
                "http" => StoreBackend::Http,
                other => {
                    return Err(CofferError::User(format!(
                        "Unknown store backend: {} (expected local or http)",
                        other
                    )))
                }
            }
        }
        "store.path" => config.store.path = Some(PathBuf::from(value)),
        "store.url" => config.store.url = Some(value.to_string()),
        "store.token_env" => config.store.token_env = Some(value.to_string()),
        "store.timeout_secs" => {
            config.store.timeout_secs = value
                .parse()
                .map_err(|_| CofferError::User(format!("Invalid number: {}", value)))?
        }
        _ => {
            return Err(CofferError::User(format!(
                "Unknown config key: {} (valid keys: {})",
                key,
                SETTABLE_KEYS.join(", ")
            )))
        }
    }
    Ok(())
}
