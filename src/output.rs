use std::io::{self, Write};

use serde::Serialize;

use crate::app::{OutcomeStatus, ProgressEvent, ProgressSink, RunReport};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(report: &RunReport) -> io::Result<()> {
        Self::print_json(report)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Forwards progress events to the log.
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => {
                tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "{}", event.message)
            }
            None => tracing::info!("{}", event.message),
        }
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_report(report: &RunReport) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        Self::write_report(&mut stdout, report)
    }

    pub fn write_report<W: Write>(out: &mut W, report: &RunReport) -> io::Result<()> {
        writeln!(out, "icb-fetch summary ({})", report.download_dir)?;
        writeln!(
            out,
            "  installed: {}  failed: {}  planned: {}",
            report.installed(),
            report.failed(),
            report.items.len() - report.installed() - report.failed()
        )?;
        for item in &report.items {
            match item.status {
                OutcomeStatus::Installed => writeln!(
                    out,
                    "  + {} -> {} ({} files)",
                    item.name,
                    item.destination,
                    item.files.unwrap_or_default()
                )?,
                OutcomeStatus::Planned => {
                    writeln!(out, "  ~ {} <- {}", item.name, item.archive_url)?
                }
                OutcomeStatus::Failed => writeln!(
                    out,
                    "  ! {} failed (reached {}): {}",
                    item.name,
                    item.stage,
                    item.error.as_deref().unwrap_or("unknown error")
                )?,
            }
        }
        Ok(())
    }
}
