//! # vaultstore_core
//!
//! **Responsibility**: Transport-independent domain types shared by every
//! component of the data plane — error taxonomy, object/vector/job models,
//! and the chunking/eligibility predicates used by the indexing pipeline.

pub mod chunking;
pub mod error;
pub mod models;

pub use error::CoreError;
