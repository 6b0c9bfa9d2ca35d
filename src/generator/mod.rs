//! Generation pipeline.
//!
//! # Data Flow
//! ```text
//! GenerateOptions
//!     → load directory snapshot + localconfig
//!     → pipeline.rs (registry → collect → resolve → overrides → client CA)
//!     → outputs.rs (template, output) pairs → template expander
//!     → status.rs marker appended to the core output
//! ```

pub mod options;
pub mod outputs;
pub mod pipeline;
pub mod status;

use std::io;

use crate::directory::{LocalConfig, SnapshotDirectory, SystemResolver};
use crate::error::Result;

pub use options::{GenerateOptions, Paths, RunMode};
pub use pipeline::{conclude, Generator, Outcome};
pub use status::RunStatus;

/// Run the generator against its configured snapshot. Returns the exit code.
pub fn create_conf(options: &GenerateOptions) -> i32 {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if options.mode == RunMode::DisplayDefaults {
        return match pipeline::display_defaults(options, &mut out) {
            Ok(()) => 0,
            Err(e) => {
                tracing::error!(error = %e, "Failed to display default variables");
                1
            }
        };
    }

    let (directory, local) = match load_sources(options) {
        Ok(sources) => sources,
        Err(e) => return conclude(options, Err(e)),
    };
    Generator::new(&directory, &SystemResolver, &local, options).execute(&mut out)
}

fn load_sources(options: &GenerateOptions) -> Result<(SnapshotDirectory, LocalConfig)> {
    tracing::debug!(path = %options.directory_snapshot.display(), "Loading directory snapshot");
    let directory = SnapshotDirectory::load(&options.directory_snapshot)?;
    let local = match &options.local_config {
        Some(path) => LocalConfig::load(path)?,
        None => LocalConfig::default(),
    };
    Ok((directory, local))
}
