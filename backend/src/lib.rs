//! Localisation string manager library.
//!
//! Projects group apps; each app owns a string table whose edits are tracked
//! until they are published as an immutable, numbered version. The crate is
//! laid out hexagonally: [`domain`] holds the rules, [`inbound`] exposes them
//! over HTTP and [`outbound`] persists them.

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
