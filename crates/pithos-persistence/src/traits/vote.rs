//! Vote persistence trait

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::model::VoteInfo;

/// Direct vote persistence operations
#[async_trait]
pub trait VotePersistence: Send + Sync {
    /// Insert or replace a member's direct vote on a motion
    async fn vote_cast(
        &self,
        member_id: i64,
        motion_id: i32,
        selection: i32,
        now: NaiveDateTime,
    ) -> anyhow::Result<()>;

    /// Remove a member's direct vote. Returns whether a vote existed.
    async fn vote_withdraw(&self, member_id: i64, motion_id: i32) -> anyhow::Result<bool>;

    /// Get a member's direct vote on a motion
    async fn vote_get(&self, member_id: i64, motion_id: i32) -> anyhow::Result<Option<VoteInfo>>;

    /// All direct votes on a motion
    async fn vote_find_by_motion(&self, motion_id: i32) -> anyhow::Result<Vec<VoteInfo>>;
}
