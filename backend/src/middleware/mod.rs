//! Request middleware.
//!
//! Purpose: request lifecycle concerns shared by every route, currently the
//! trace identifier attached to each request and response.

pub mod trace;

pub use trace::Trace;
