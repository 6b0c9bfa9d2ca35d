//! Result markers appended to the core output.
//!
//! The proxy control script greps the core file for these to decide
//! whether a restart is safe.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

pub const SUCCESS_MARKER: &str = "__SUCCESS__";
pub const ERROR_MARKER: &str = "__CONF_GEN_ERROR__";

/// Outcome of a run as recorded in the core output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failed(String),
}

impl RunStatus {
    /// Text appended to the core file, surrounding newlines included.
    pub fn marker(&self) -> String {
        match self {
            RunStatus::Success => format!("\n#{SUCCESS_MARKER}\n"),
            RunStatus::Failed(message) => format!("\n#{ERROR_MARKER}:{message}\n"),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            RunStatus::Success => 0,
            RunStatus::Failed(_) => 1,
        }
    }
}

/// Append the marker if the core file exists. Write failures are only logged.
pub fn append_status(core_conf: &Path, status: &RunStatus) {
    if !core_conf.exists() {
        tracing::debug!(path = %core_conf.display(), "No core output to mark");
        return;
    }

    let result = OpenOptions::new()
        .append(true)
        .open(core_conf)
        .and_then(|mut file| file.write_all(status.marker().as_bytes()));
    if let Err(e) = result {
        tracing::warn!(path = %core_conf.display(), error = %e, "Failed to append generation status");
    }
}
