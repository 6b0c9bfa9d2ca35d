//! Template expansion subsystem.
//!
//! # Data Flow
//! ```text
//! <tprefix>.<name>.template
//!     → directive.rs (first line: plain, explode domain(...), explode server(...))
//!     → expander.rs (per-item variables, capture/replay)
//!     → fill.rs (`${key}` substitution per line)
//!     → <prefix>.<name>
//! ```
//!
//! # Design Decisions
//! - Output is buffered and written only after the whole template expanded
//! - Templates are read whole; they are small
//! - Comment lines are written for the first exploded block only

pub mod directive;
pub mod expander;
pub mod fill;

pub use directive::{parse_directive, Directive, DomainPredicate};
pub use expander::{TemplateExpander, TemplateLineCache};
pub use fill::fill_line;
