//! Markup checker
//!
//! Loads a markup file, replays it into a registry, and reports the health
//! of every paragraph. Exits non-zero when any paragraph is unhealthy, so
//! the check can gate an export pipeline.

use std::process::ExitCode;

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pagemark::export::read_markup_file;
use pagemark::validate::ParagraphHealth;
use pagemark::Config;

fn load_config() -> anyhow::Result<Config> {
    if let Ok(path) = std::env::var("PAGEMARK_CONFIG") {
        return Config::from_json_file(&path)
            .with_context(|| format!("failed to load config from {}", path));
    }
    Config::from_env().context("failed to load config from environment")
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagemark=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run() {
        Ok(unhealthy) if unhealthy == 0 => ExitCode::SUCCESS,
        Ok(unhealthy) => {
            tracing::error!(unhealthy, "Markup check failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<usize> {
    let config = load_config()?;
    config.validate().context("invalid configuration")?;

    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: pagemark <markup-file.xml>");
    };

    tracing::info!(path = %path, "Checking markup file");
    let registry =
        read_markup_file(&path).with_context(|| format!("failed to read {}", path))?;

    let mut unhealthy = 0usize;
    for (paragraph_id, entry) in registry.entries() {
        match entry.health {
            ParagraphHealth::Finished => {
                tracing::info!(paragraph_id = %paragraph_id, "ok");
            }
            health => {
                unhealthy += 1;
                tracing::warn!(paragraph_id = %paragraph_id, ?health, "unhealthy paragraph");
            }
        }
    }

    tracing::info!(
        paragraphs = registry.entries().count(),
        unhealthy,
        "Markup check complete"
    );
    Ok(unhealthy)
}
