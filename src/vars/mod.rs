//! Configuration variables: registry, resolution, and rendering.
//!
//! # Data Flow
//! ```text
//! defaults.rs ──▶ VarRegistry (ordered ConfVar descriptors)
//!                    │ resolve_all(Sources)
//!                    ▼
//!     ConfVar::update ── custom strategy (custom.rs) or kind-driven read
//!                    │   from config / server / localconfig
//!                    ▼
//!     ConfVar::format ── custom strategy or kind-driven rendering
//!                    ▼
//!                 VarMap (key → config text) ──▶ template expansion
//! ```
//!
//! # Design Decisions
//! - Values carry their shape (`Value`) and are checked against the declared
//!   `ValueKind` after every update
//! - Custom behavior is a pair of boxed closures on the descriptor, not a type
//!   hierarchy
//! - All inputs arrive through a request-scoped `Sources`; nothing is global

pub mod custom;
pub mod defaults;
pub mod registry;
pub mod sources;
pub mod value;
pub mod var;

pub use defaults::build_default_vars;
pub use registry::{VarMap, VarRegistry};
pub use sources::Sources;
pub use value::{KeyValue, OverrideSource, Value, ValueKind};
pub use var::ConfVar;
