// ABOUTME: Demo binary: a menu bar status item whose popover shows a configurable message
// ABOUTME: Loads config.toml (creating it on first run), sets up logging and runs NSApplication

use anyhow::Result;
use barpop::config::Config;
use barpop::logging;
use std::path::PathBuf;
use tracing::{info, warn};

struct Args {
    config_path: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut config_path = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config needs a path"))?;
                config_path = Some(PathBuf::from(path));
            }
            "--help" | "-h" => {
                println!("Usage: barpop [--config PATH]");
                std::process::exit(0);
            }
            other => anyhow::bail!("Unknown argument: {other}"),
        }
    }

    Ok(Args { config_path })
}

/// Returns the config and, on first run, the path a default file was written to.
fn load_config(explicit: Option<PathBuf>) -> Result<(Config, Option<PathBuf>)> {
    let mut created = None;
    let config_path = match explicit {
        Some(path) => path,
        None => {
            let path = Config::default_config_path()?;
            if !path.exists() {
                Config::save_default_config(&path)?;
                created = Some(path.clone());
            }
            path
        }
    };

    let mut config = Config::load_from_file(&config_path)?;
    config.expand_path()?;
    config.validate()?;
    Ok((config, created))
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let loaded = load_config(args.config_path);
    let config = match &loaded {
        Ok((config, _)) => config.clone(),
        Err(_) => Config::default(),
    };

    // Subscriber first, so config problems are reported through it.
    logging::init(config.log_level().unwrap_or(tracing::Level::INFO));
    match loaded {
        Ok((_, Some(created))) => {
            info!("Created default configuration at: {}", created.display())
        }
        Ok((_, None)) => {}
        Err(e) => warn!("Failed to load config: {e:#}. Using defaults."),
    }

    run(config)
}

#[cfg(target_os = "macos")]
fn run(config: Config) -> Result<()> {
    use anyhow::Context;
    use barpop::controller::{Callbacks, StatusItemOptions};
    use barpop::platform::macos::{TextContent, status_item};
    use objc2::MainThreadMarker;
    use objc2_app_kit::{NSApplication, NSApplicationActivationPolicy};

    let mtm = MainThreadMarker::new().context("barpop must run on the main thread")?;
    let app = NSApplication::sharedApplication(mtm);
    // Menu bar only: no Dock icon, no main menu.
    app.setActivationPolicy(NSApplicationActivationPolicy::Accessory);

    let options = config.status_item_options().unwrap_or_else(|e| {
        warn!("Failed to load status icon: {e:#}. Showing the title only.");
        let title = if config.status_item.title.is_empty() {
            "Barpop"
        } else {
            config.status_item.title.as_str()
        };
        StatusItemOptions::titled(title)
    });

    let content = TextContent {
        message: config.popover.message.clone(),
        size: config.popover_size(),
    };
    let callbacks = Callbacks::new()
        .on_appear(|| info!("Popover appeared"))
        .on_disappear(|| info!("Popover disappeared"));

    let _status_item = status_item(
        mtm,
        options,
        &content,
        callbacks,
        config.popover_settings(),
    )?;

    info!("Barpop is running, click the menu bar icon to open the popover");
    app.run();

    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn run(_config: Config) -> Result<()> {
    anyhow::bail!("barpop needs the macOS menu bar; this platform has no status bar backend")
}
