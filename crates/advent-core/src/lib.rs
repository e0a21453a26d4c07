//! Date and task computation for a promotional advent calendar.
//!
//! A configured date range is turned into one [`calendar::CalendarDay`] per
//! day, each carrying a task from a (possibly shorter) task list, with
//! `is_today`/`is_active` flags derived from a local or UTC notion of today.
//! [`controller::AdventCalendar`] owns that list and keeps it current.

pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod content;
pub mod controller;
pub mod datetime;
pub mod diagnostics;
pub mod error;
pub mod grid;
pub mod locale;
pub mod render;
pub mod time;
pub mod watch;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

pub use calendar::{CalendarDay, DateRange};
pub use controller::{AdventCalendar, CalendarSettings};
pub use error::CalendarError;
pub use time::{Clock, TimeFacade, TimeMode};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting advent CLI"
    );

    let mut cfg = config::CalendarConfig::load(cli.config.as_deref())?;
    cfg.apply_overrides(cli.overrides());

    let tasks = match cli.tasks.as_deref() {
        Some(path) => content::load_tasks(path)?,
        None => std::mem::take(&mut cfg.tasks),
    };
    debug!(count = tasks.len(), "task content ready");

    let settings = cfg.settings().with_context(|| {
        format!(
            "invalid configuration in {}",
            cfg.loaded_from
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unknown>".to_string())
        )
    })?;

    let renderer = render::Renderer::new(!cli.no_color);
    commands::dispatch(
        cli.command.clone().unwrap_or_default(),
        settings,
        tasks,
        &renderer,
    )?;

    info!("done");
    Ok(())
}
