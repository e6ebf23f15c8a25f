//! Atris query resolver library
//!
//! Natural-language questions about the Audius network are classified,
//! routed to a catalog endpoint or a local popularity ranking, executed
//! against a pool of discovery nodes and rendered as text.

pub mod catalog;
pub mod config;
pub mod executor;
pub mod formatter;
pub mod nodes;
pub mod popularity;
pub mod resolver;
pub mod server;

// Re-export commonly used types for convenience
pub use catalog::{load_catalog, Catalog};
pub use resolver::{FormattedResponse, ResolveError, Resolver};
pub use server::{run_server, RequestsLoggingLevel};
