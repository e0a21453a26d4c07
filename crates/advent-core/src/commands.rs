use std::io::{self, Write};
use std::time::Duration;

use anyhow::Context;
use tracing::{info, instrument, warn};

use crate::cli::Command;
use crate::content::TaskContent;
use crate::controller::{AdventCalendar, CalendarSettings};
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::render::Renderer;
use crate::watch::{ClockEvent, RolloverWatcher};

#[instrument(skip(settings, tasks, renderer))]
pub fn dispatch(
    command: Command,
    settings: CalendarSettings,
    tasks: Vec<TaskContent>,
    renderer: &Renderer,
) -> anyhow::Result<()> {
    match command {
        Command::Days { json } => {
            let cal = build(settings, tasks, &mut TracingSink)?;
            let out = io::stdout().lock();
            if json {
                renderer.write_days_json(out, &cal)
            } else {
                renderer.write_days(out, &cal)
            }
        }
        Command::Grid => {
            let cal = build(settings, tasks, &mut TracingSink)?;
            renderer.write_grid(io::stdout().lock(), &cal)
        }
        Command::Check => check(settings, tasks, io::stdout().lock()),
        Command::Watch { interval } => watch(settings, tasks, Duration::from_secs(interval.max(1))),
    }
}

fn build(
    settings: CalendarSettings,
    tasks: Vec<TaskContent>,
    sink: &mut dyn DiagnosticSink,
) -> anyhow::Result<AdventCalendar<TaskContent>> {
    AdventCalendar::new(settings, tasks, sink).context("failed to build the calendar")
}

/// Builds the calendar once and reports what it found.
pub fn check<W: Write>(
    settings: CalendarSettings,
    tasks: Vec<TaskContent>,
    mut out: W,
) -> anyhow::Result<()> {
    let range = settings.range;
    let task_count = tasks.len();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let cal = build(settings, tasks, &mut diagnostics)?;

    writeln!(out, "range     {} .. {}", range.start(), range.end())?;
    writeln!(out, "days      {}", cal.days().len())?;
    writeln!(out, "tasks     {task_count}")?;
    writeln!(out, "mode      {:?}", cal.facade().mode())?;
    writeln!(out, "week      starts {}", cal.first_day_of_week())?;
    writeln!(out, "today     {}", cal.today())?;
    for diagnostic in &diagnostics {
        writeln!(out, "warning   {diagnostic}")?;
        TracingSink.emit(diagnostic.clone());
    }
    if diagnostics.is_empty() {
        writeln!(out, "ok")?;
    }
    Ok(())
}

fn watch(settings: CalendarSettings, tasks: Vec<TaskContent>, interval: Duration) -> anyhow::Result<()> {
    let mut cal = build(settings, tasks, &mut TracingSink)?;
    if cal.facade().clock().is_fixed() {
        warn!("current moment is fixed; no rollover will be observed");
    }

    let watcher = RolloverWatcher::start(cal.facade().clone(), interval)
        .context("failed to start rollover poller")?;
    info!(interval_secs = interval.as_secs(), "watching for day changes");
    print_active(&cal)?;

    loop {
        let Some(ClockEvent::DayChanged(day)) = watcher.wait(Duration::from_secs(3600)) else {
            continue;
        };
        if cal.refresh_today() {
            info!(%day, "applied day rollover");
            print_active(&cal)?;
        }
    }
}

fn print_active(cal: &AdventCalendar<TaskContent>) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    match cal.active_day() {
        Some(day) => writeln!(
            out,
            "{}  day {}: {}",
            cal.facade().display_long(day.date),
            day.id,
            day.task.title
        )?,
        None => writeln!(out, "{}  no task today", cal.today())?,
    }
    out.flush()?;
    Ok(())
}
