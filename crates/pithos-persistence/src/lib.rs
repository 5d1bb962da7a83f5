//! Pithos Persistence - Database entities and persistence layer
//!
//! This crate provides:
//! - SeaORM entity definitions for members, motions, options, and votes
//! - Persistence trait abstractions used by the bot engine
//! - Domain model types for persistence operations
//! - The SQL backend (SQLite by default)

pub mod entity;
pub mod model;
pub mod sql;
pub mod traits;

// Re-export sea-orm for convenience
pub use sea_orm;

// Re-export entity prelude
pub use entity::prelude::*;

// Re-export persistence traits
pub use traits::{MemberPersistence, MotionPersistence, PersistenceService, VotePersistence};

// Re-export SQL backend
pub use sql::SqlPersistService;

// Re-export model types
pub use model::{DelegateInfo, MemberInfo, MotionInfo, MotionOptionInfo, NewMotion, VoteInfo};
