//! Per-project harvest log.
//!
//! Every project's run produces a `<identifier>.harvest.log` capturing all
//! informational and error output with severity prefixes. Debug detail is
//! buffered and only written out when an error occurs, so the log stays
//! readable for clean runs while still aiding post-mortems.

use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Severity-prefixed log writer for one project's harvest.
pub struct HarvestLog {
    file: Option<File>,
    /// Buffered debug lines, flushed ahead of the first error.
    debug_buffer: Vec<String>,
    echo: bool,
}

impl HarvestLog {
    /// Log to a file, echoing warnings and errors to stderr.
    pub fn to_file(path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            file: Some(File::create(path)?),
            debug_buffer: Vec::new(),
            echo: true,
        })
    }

    /// Log to stderr only (single-project mode without an output directory).
    pub fn stderr_only() -> Self {
        Self {
            file: None,
            debug_buffer: Vec::new(),
            echo: true,
        }
    }

    pub fn info(&mut self, msg: impl AsRef<str>) {
        tracing::info!("{}", msg.as_ref());
        self.write_line("INFO", msg.as_ref(), false);
    }

    pub fn warn(&mut self, msg: impl AsRef<str>) {
        tracing::warn!("{}", msg.as_ref());
        self.write_line("WARN", msg.as_ref(), self.echo);
    }

    /// Flushes any buffered debug detail first so the error has context.
    pub fn error(&mut self, msg: impl AsRef<str>) {
        self.flush_debug();
        tracing::error!("{}", msg.as_ref());
        self.write_line("ERROR", msg.as_ref(), self.echo);
    }

    /// Buffered: only reaches the log file if an error follows.
    pub fn debug(&mut self, msg: impl AsRef<str>) {
        tracing::debug!("{}", msg.as_ref());
        self.debug_buffer.push(msg.as_ref().to_string());
    }

    /// Write out any buffered debug lines.
    pub fn flush_debug(&mut self) {
        let lines = std::mem::take(&mut self.debug_buffer);
        for line in lines {
            self.write_line("DEBUG", &line, false);
        }
    }

    fn write_line(&mut self, severity: &str, msg: &str, echo: bool) {
        if let Some(file) = &mut self.file {
            // A failing log write must not abort the harvest.
            let _ = writeln!(file, "[{severity}] {msg}");
        }
        if echo || self.file.is_none() {
            eprintln!("[{severity}] {msg}");
        }
    }
}
