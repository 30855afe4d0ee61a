//! HTTP server for the donation request workflow
//!
//! - `ServerBuilder` wires stores, catalog and identity provider together
//! - `ServerHost` holds the shared state handed to handlers
//! - `router` and `handlers` expose the REST surface

pub mod builder;
pub mod extractors;
pub mod handlers;
pub mod host;
pub mod router;

pub use builder::ServerBuilder;
pub use extractors::Authenticated;
pub use handlers::ApiResponse;
pub use host::ServerHost;
pub use router::build_router;
