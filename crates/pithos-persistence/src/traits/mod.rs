//! Persistence traits for the storage abstraction layer
//!
//! The bot engine only sees these traits, so tests and alternative backends
//! can swap the storage without touching command handling.

pub mod member;
pub mod motion;
pub mod vote;

pub use member::MemberPersistence;
pub use motion::MotionPersistence;
pub use vote::VotePersistence;

use async_trait::async_trait;

/// Unified persistence service trait
#[async_trait]
pub trait PersistenceService: MemberPersistence + MotionPersistence + VotePersistence + Send + Sync {
    /// Name of the database backend in use
    fn backend_name(&self) -> &'static str;

    /// Health check for the storage backend
    async fn health_check(&self) -> anyhow::Result<()>;
}
