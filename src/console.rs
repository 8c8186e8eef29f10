//! Interactive query console.
//!
//! Reads one query per line, resolves it and prints the results:
//!
//! ```text
//! > 2024-05-01T12:03:00Z
//! 2024-05-01T12:00:00Z	[<-2024-05-01T12:03:00Z]	(37.000000,-122.000000)
//! > 37.0,-122.0
//! 2024-05-01T12:00:00Z	(37.000000,-122.000000)
//! > tomorrow
//! Parse error.
//! ```
//!
//! Time queries use nearest matching and always annotate snapped results.
//! Blank lines are ignored. The loop ends at end of input, or when the
//! shutdown flag is raised.
//!
//! Lines are read on a helper thread and handed over a channel so the loop
//! can notice Ctrl+C while the reader is blocked on stdin.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::cli::OutputFormat;
use crate::index::{NearbyIndex, TimeSeries};
use crate::query::parse_query;
use crate::resolver::{QueryEngine, ResolveError, ResolveOptions};

/// Prompt printed before each line.
pub const DEFAULT_PROMPT: &str = "> ";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How the console loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    /// Input was exhausted.
    EndOfInput,
    /// The shutdown flag was raised.
    Interrupted,
}

/// Errors that end the console loop.
#[derive(thiserror::Error, Debug)]
pub enum ConsoleError {
    /// Reading input or writing output failed.
    #[error("Console I/O error: {0}")]
    Io(#[from] io::Error),

    /// The index failed while resolving a query.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Read-eval-print loop over a [`QueryEngine`].
#[derive(Debug, Clone)]
pub struct Console {
    prompt: String,
    format: OutputFormat,
    enrich: bool,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl Console {
    /// Create a console with the default prompt and text output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            format: OutputFormat::Text,
            enrich: false,
            shutdown_flag: None,
        }
    }

    /// Set the prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the output format.
    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Request reverse geocoding for every result.
    #[must_use]
    pub fn with_enrich(mut self, enrich: bool) -> Self {
        self.enrich = enrich;
        self
    }

    /// Stop when the flag is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Run until end of input or shutdown.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError`] on I/O failure or an index fault. Parse
    /// errors and misses are printed and the loop continues.
    pub fn run<T, L, R, W>(
        &self,
        engine: &mut QueryEngine<T, L>,
        input: R,
        mut output: W,
    ) -> Result<ConsoleExit, ConsoleError>
    where
        T: TimeSeries,
        L: NearbyIndex,
        R: BufRead + Send + 'static,
        W: Write,
    {
        let (tx, rx) = mpsc::channel::<io::Result<String>>();
        thread::spawn(move || {
            let mut input = input;
            let mut buf = Vec::new();
            loop {
                buf.clear();
                let line = match input.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => Ok(decode_line(&buf)),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => Err(e),
                };
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        });

        loop {
            write!(output, "{}", self.prompt)?;
            output.flush()?;

            let line = loop {
                match rx.recv_timeout(POLL_INTERVAL) {
                    Ok(line) => break Some(line?),
                    Err(RecvTimeoutError::Timeout) => {
                        if self.is_shutdown_requested() {
                            writeln!(output)?;
                            return Ok(ConsoleExit::Interrupted);
                        }
                    }
                    Err(RecvTimeoutError::Disconnected) => break None,
                }
            };

            let Some(line) = line else {
                writeln!(output)?;
                log::debug!("Console input closed");
                return Ok(ConsoleExit::EndOfInput);
            };

            self.handle_line(engine, &line, &mut output)?;
        }
    }

    /// Parse, resolve and print a single line.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError`] on I/O failure or an index fault.
    pub fn handle_line<T, L, W>(
        &self,
        engine: &mut QueryEngine<T, L>,
        line: &str,
        mut output: W,
    ) -> Result<(), ConsoleError>
    where
        T: TimeSeries,
        L: NearbyIndex,
        W: Write,
    {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        let query = match parse_query(line) {
            Ok(query) => query,
            Err(e) => {
                log::debug!("{e}");
                writeln!(output, "Parse error.")?;
                return Ok(());
            }
        };

        let options = ResolveOptions::default()
            .with_enrich(self.enrich)
            .with_annotate(true);

        match engine.resolve(&query, options) {
            Ok(mut results) => results.print_to(self.format, &mut output)?,
            Err(e) if e.is_not_found() => writeln!(output, "{e}")?,
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}

/// Strip the line terminator; bytes that are not UTF-8 become U+FFFD and
/// fail at the parser like any other malformed line.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
