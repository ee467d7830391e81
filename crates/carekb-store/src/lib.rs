//! In-memory reference backends for the core collaborator traits.
//!
//! These are the stores tests and the CLI run against; production
//! deployments swap in database-backed implementations behind the same
//! traits.

pub mod memdoc;
pub mod memvec;

pub use memdoc::MemoryDocumentStore;
pub use memvec::MemoryVectorStore;
