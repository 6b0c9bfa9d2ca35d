//! Directory collection: domains, servers, and upstream lists.
//!
//! # Data Flow
//! ```text
//! Directory ──▶ domains.rs  ──▶ DomainCollection (slots + listen addresses)
//!           ──▶ servers.rs  ──▶ Vec<ServerAttrItem>
//!           ──▶ upstream.rs ──▶ server directives per role (read by vars)
//! ```

pub mod domains;
pub mod servers;
pub mod upstream;

pub use domains::{DomainAttrItem, DomainCollection, DomainCollector, DomainSlot};
pub use servers::{load_servers, ServerAttrItem};
