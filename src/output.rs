use std::fmt::Display;
use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink, RunOutcome};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

impl OutputMode {
    pub fn from_flag(non_interactive: bool) -> Self {
        if non_interactive {
            Self::NonInteractive
        } else {
            Self::Interactive
        }
    }

    /// Writes the `Error:` line. Interactive runs keep it next to the status
    /// lines on stdout; non-interactive stdout is reserved for JSON.
    pub fn write_error<O: Write, E: Write>(
        self,
        message: &dyn Display,
        stdout: &mut O,
        stderr: &mut E,
    ) -> io::Result<()> {
        let line = format!("Error: {message}\n");
        match self {
            Self::Interactive => stdout.write_all(line.as_bytes()),
            Self::NonInteractive => stderr.write_all(line.as_bytes()),
        }
    }

    pub fn print_error(self, message: &dyn Display) {
        let _ = self.write_error(message, &mut io::stdout(), &mut io::stderr());
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_outcome(outcome: &RunOutcome) -> io::Result<()> {
        Self::print_json(outcome)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Plain console reporting: the match count and the saved file names on
/// stdout, everything else to the log.
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn found_line(count: usize) -> String {
        format!("Found {count} records.")
    }

    pub fn saved_line(outcome: &RunOutcome) -> Option<String> {
        match outcome {
            RunOutcome::Saved {
                csv_path,
                plot_path,
                ..
            } => Some(format!("Saved {csv_path} and {plot_path}")),
            RunOutcome::NoRecords { .. } => None,
        }
    }

    pub fn print_outcome(outcome: &RunOutcome) {
        if let Some(line) = Self::saved_line(outcome) {
            println!("{line}");
        }
    }
}

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Found { count } => println!("{}", Self::found_line(count)),
            other => tracing::debug!("{other}"),
        }
    }
}
