//! Shared error type and composite trait for the record store.
//!
//! The record store is split into one driven port per aggregate so services
//! depend only on what they touch. Every backend implements all of them, and
//! [`RecordStore`] names that combination for the composition root.

use super::define_port_error;
use super::{
    AppRepository, MembershipRepository, ProjectRepository, StringItemRepository, UserRepository,
    VersionRepository,
};

define_port_error! {
    /// Errors raised by record store adapters.
    ///
    /// A missing record is not an error; lookups return `Ok(None)`.
    pub enum RecordStoreError {
        /// The backend could not be reached.
        Connection { message: String } =>
            "record store connection failed: {message}",
        /// A query or mutation failed during execution.
        Query { message: String } =>
            "record store query failed: {message}",
        /// A stored document could not be encoded or decoded.
        Serialization { message: String } =>
            "record store serialization failed: {message}",
        /// A uniqueness constraint or concurrent write rejected the mutation.
        Conflict { message: String } =>
            "record store conflict: {message}",
    }
}

/// Every driven persistence port, implemented by one backend.
pub trait RecordStore:
    UserRepository
    + ProjectRepository
    + MembershipRepository
    + AppRepository
    + StringItemRepository
    + VersionRepository
{
}

impl<T> RecordStore for T where
    T: UserRepository
        + ProjectRepository
        + MembershipRepository
        + AppRepository
        + StringItemRepository
        + VersionRepository
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RecordStoreError::connection("refused"), "record store connection failed: refused")]
    #[case(RecordStoreError::query("syntax"), "record store query failed: syntax")]
    #[case(
        RecordStoreError::serialization("eof"),
        "record store serialization failed: eof"
    )]
    #[case(RecordStoreError::conflict("email taken"), "record store conflict: email taken")]
    fn messages_name_the_failure(#[case] error: RecordStoreError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }
}
