//! HTTP inbound adapter exposing REST endpoints.

pub mod apps;
pub mod envelope;
pub mod error;
pub mod health;
pub mod identity;
pub mod projects;
pub mod routes;
pub mod schemas;
pub mod state;
pub mod strings;
#[cfg(test)]
pub mod test_utils;
pub mod validation;
pub mod versions;

pub use error::ApiResult;
