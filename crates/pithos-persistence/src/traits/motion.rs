//! Motion persistence trait

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::model::{MotionInfo, NewMotion};

/// Motion persistence operations
#[async_trait]
pub trait MotionPersistence: Send + Sync {
    /// Create a motion and its options atomically
    async fn motion_create(&self, motion: NewMotion, now: NaiveDateTime) -> anyhow::Result<MotionInfo>;

    /// Get a motion with its options
    async fn motion_get(&self, motion_id: i32) -> anyhow::Result<Option<MotionInfo>>;

    /// Motions still accepting votes at `now`, soonest expiry first
    async fn motion_find_running(&self, now: NaiveDateTime) -> anyhow::Result<Vec<MotionInfo>>;

    /// Motions past their expiry whose result has not been published
    async fn motion_find_expired_open(&self, now: NaiveDateTime) -> anyhow::Result<Vec<MotionInfo>>;

    /// Mark a motion's result as published
    async fn motion_mark_closed(&self, motion_id: i32) -> anyhow::Result<bool>;
}
