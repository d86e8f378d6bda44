//! Shared output layer: human text or stable JSON.

use std::io::{self, Write};

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text.
    Human,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    /// Resolve from the `--json` flag.
    pub const fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Human }
    }
}

/// Render a left-aligned key/value line in human output.
pub fn kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<18} {}", format!("{key}:"), value.as_ref())
}

/// Render an optional value, skipping the line entirely when absent.
pub fn kv_opt(w: &mut dyn Write, key: &str, value: Option<impl AsRef<str>>) -> io::Result<()> {
    match value {
        Some(value) => kv(w, key, value),
        None => Ok(()),
    }
}

/// Render a comma-joined list, skipping the line when empty.
pub fn kv_list(w: &mut dyn Write, key: &str, values: &[String]) -> io::Result<()> {
    if values.is_empty() {
        Ok(())
    } else {
        kv(w, key, values.join(", "))
    }
}
