//! Member persistence trait

use async_trait::async_trait;
use pithos_common::DelegationType;

use crate::model::MemberInfo;

/// Member persistence operations
#[async_trait]
pub trait MemberPersistence: Send + Sync {
    /// Get a member by Discord user id
    async fn member_get(&self, member_id: i64) -> anyhow::Result<Option<MemberInfo>>;

    /// Register the member if unknown and return it. New members accept delegates.
    async fn member_ensure(&self, member_id: i64) -> anyhow::Result<MemberInfo>;

    /// Find all registered members
    async fn member_find_all(&self) -> anyhow::Result<Vec<MemberInfo>>;

    /// Set whether others may delegate to this member
    async fn member_set_accepts_delegates(
        &self,
        member_id: i64,
        accepts: bool,
    ) -> anyhow::Result<bool>;

    /// Set or clear the member's delegation. Both members must exist.
    async fn member_set_delegate(
        &self,
        member_id: i64,
        delegate: Option<(i64, DelegationType)>,
    ) -> anyhow::Result<bool>;

    /// Members delegating directly to `member_id`
    async fn member_find_constituents(&self, member_id: i64) -> anyhow::Result<Vec<MemberInfo>>;
}
