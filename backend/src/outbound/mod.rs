//! Outbound adapters implementing the domain's driven ports.
//!
//! - **memory**: maps behind a mutex with a JSON recovery snapshot.
//! - **persistence**: PostgreSQL via Diesel.
//! - **document**: Redis documents with sorted-set indexes.
//! - **snapshot_archive**: byte-budgeted store for constrained snapshots.
//!
//! Adapters translate between domain types and storage representations and
//! contain no business rules.

pub mod document;
pub mod memory;
pub mod persistence;
pub mod snapshot_archive;
