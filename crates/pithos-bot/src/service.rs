//! Voting service
//!
//! Business rules on top of the persistence traits: vote validation,
//! delegation checks, and tally computation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use pithos_common::{DelegationType, PithosError, mention};
use pithos_democracy::{Delegation, DelegationError, DelegationGraph, TallyResult, tally};
use pithos_persistence::{DelegateInfo, MemberInfo, MotionInfo, NewMotion, PersistenceService};
use tokio::sync::Mutex;

/// Longest motion duration accepted, in days
pub const MAX_MOTION_DAYS: i64 = 365;

/// Discord ids fit in 63 bits; storage uses signed columns.
pub fn member_id(user_id: u64) -> anyhow::Result<i64> {
    i64::try_from(user_id)
        .map_err(|_| PithosError::IllegalArgument(format!("`{}` is not a valid user id", user_id)).into())
}

/// Delegation state of one member as shown to them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationStatus {
    pub accepts_delegates: bool,
    pub delegate: Option<DelegateInfo>,
    /// Members reached by following the delegation, in order
    pub chain: Vec<i64>,
    /// Members delegating directly to this member
    pub constituents: Vec<i64>,
}

#[derive(Clone)]
pub struct VotingService {
    persistence: Arc<dyn PersistenceService>,
    max_delegation_depth: usize,
    /// Held from the cycle check until the delegation is stored
    delegation_lock: Arc<Mutex<()>>,
}

impl VotingService {
    pub fn new(persistence: Arc<dyn PersistenceService>, max_delegation_depth: usize) -> Self {
        Self {
            persistence,
            max_delegation_depth,
            delegation_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn persistence(&self) -> &Arc<dyn PersistenceService> {
        &self.persistence
    }

    // ========================================================================
    // Motions
    // ========================================================================

    pub async fn create_motion(
        &self,
        author_id: u64,
        description: String,
        options: Vec<String>,
        days: i64,
        now: NaiveDateTime,
    ) -> anyhow::Result<MotionInfo> {
        if !(1..=MAX_MOTION_DAYS).contains(&days) {
            return Err(PithosError::IllegalArgument(format!(
                "a motion must last between 1 and {} days",
                MAX_MOTION_DAYS
            ))
            .into());
        }

        let author = member_id(author_id)?;
        self.persistence.member_ensure(author).await?;
        self.persistence
            .motion_create(
                NewMotion {
                    description,
                    author_id: author,
                    expires: now + Duration::days(days),
                    options,
                },
                now,
            )
            .await
    }

    pub async fn motion(&self, motion_id: i32) -> anyhow::Result<MotionInfo> {
        self.persistence
            .motion_get(motion_id)
            .await?
            .ok_or_else(|| PithosError::MotionNotFound(motion_id).into())
    }

    pub async fn running_motions(&self, now: NaiveDateTime) -> anyhow::Result<Vec<MotionInfo>> {
        self.persistence.motion_find_running(now).await
    }

    pub async fn expired_open_motions(&self, now: NaiveDateTime) -> anyhow::Result<Vec<MotionInfo>> {
        self.persistence.motion_find_expired_open(now).await
    }

    pub async fn mark_closed(&self, motion_id: i32) -> anyhow::Result<bool> {
        self.persistence.motion_mark_closed(motion_id).await
    }

    // ========================================================================
    // Votes
    // ========================================================================

    /// Cast or replace a direct vote. Returns the motion voted on.
    pub async fn cast_vote(
        &self,
        user_id: u64,
        motion_id: i32,
        option_no: i32,
        now: NaiveDateTime,
    ) -> anyhow::Result<MotionInfo> {
        let motion = self.running_motion(motion_id, now).await?;
        if !motion.has_option(option_no) {
            return Err(PithosError::InvalidOption {
                motion_id,
                option_no,
            }
            .into());
        }

        let member = member_id(user_id)?;
        self.persistence.member_ensure(member).await?;
        self.persistence
            .vote_cast(member, motion_id, option_no, now)
            .await?;
        tracing::info!(member, motion_id, option_no, "Vote cast");
        Ok(motion)
    }

    /// Withdraw a direct vote. Returns whether there was one.
    pub async fn withdraw_vote(
        &self,
        user_id: u64,
        motion_id: i32,
        now: NaiveDateTime,
    ) -> anyhow::Result<bool> {
        let member = member_id(user_id)?;
        self.running_motion(motion_id, now).await?;
        let withdrawn = self.persistence.vote_withdraw(member, motion_id).await?;
        if withdrawn {
            tracing::info!(member, motion_id, "Vote withdrawn");
        }
        Ok(withdrawn)
    }

    async fn running_motion(&self, motion_id: i32, now: NaiveDateTime) -> anyhow::Result<MotionInfo> {
        let motion = self.motion(motion_id).await?;
        if !motion.is_running(now) {
            return Err(PithosError::MotionClosed(motion_id).into());
        }
        Ok(motion)
    }

    // ========================================================================
    // Delegation
    // ========================================================================

    /// Current delegation graph of all registered members
    pub async fn delegation_graph(&self) -> anyhow::Result<DelegationGraph> {
        let members = self.persistence.member_find_all().await?;
        Ok(graph_from_members(&members, self.max_delegation_depth))
    }

    pub async fn delegate(
        &self,
        user_id: u64,
        delegate_user_id: u64,
        kind: DelegationType,
    ) -> anyhow::Result<()> {
        let from = member_id(user_id)?;
        let to = member_id(delegate_user_id)?;

        if from == to {
            return Err(rejected(DelegationError::SelfDelegation));
        }

        self.persistence.member_ensure(from).await?;
        let target = self.persistence.member_ensure(to).await?;
        if !target.accepts_delegates {
            return Err(PithosError::DelegationRejected(format!(
                "{} does not accept delegates",
                mention(delegate_user_id)
            ))
            .into());
        }

        let _guard = self.delegation_lock.lock().await;
        let mut graph = self.delegation_graph().await?;
        graph
            .delegate(from, Delegation { to, kind })
            .map_err(rejected)?;

        self.persistence
            .member_set_delegate(from, Some((to, kind)))
            .await?;
        tracing::info!(from, to, kind = %kind, "Delegation set");
        Ok(())
    }

    /// Remove the member's delegation. Returns whether there was one.
    pub async fn clear_delegation(&self, user_id: u64) -> anyhow::Result<bool> {
        let member = member_id(user_id)?;
        let Some(info) = self.persistence.member_get(member).await? else {
            return Ok(false);
        };
        if info.delegate.is_none() {
            return Ok(false);
        }
        self.persistence.member_set_delegate(member, None).await?;
        tracing::info!(member, "Delegation cleared");
        Ok(true)
    }

    pub async fn set_accepts_delegates(&self, user_id: u64, accepts: bool) -> anyhow::Result<()> {
        let member = member_id(user_id)?;
        self.persistence.member_ensure(member).await?;
        self.persistence
            .member_set_accepts_delegates(member, accepts)
            .await?;
        Ok(())
    }

    pub async fn delegation_status(&self, user_id: u64) -> anyhow::Result<DelegationStatus> {
        let member = member_id(user_id)?;
        let info = self.persistence.member_ensure(member).await?;
        let graph = self.delegation_graph().await?;
        let constituents = self
            .persistence
            .member_find_constituents(member)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();

        Ok(DelegationStatus {
            accepts_delegates: info.accepts_delegates,
            delegate: info.delegate,
            chain: graph.chain(member),
            constituents,
        })
    }

    // ========================================================================
    // Tally
    // ========================================================================

    pub async fn tally(&self, motion: &MotionInfo) -> anyhow::Result<TallyResult> {
        let members = self.persistence.member_find_all().await?;
        let graph = graph_from_members(&members, self.max_delegation_depth);
        let direct: HashMap<i64, i32> = self
            .persistence
            .vote_find_by_motion(motion.id)
            .await?
            .into_iter()
            .map(|v| (v.member_id, v.selection))
            .collect();

        Ok(tally(
            motion.options.len(),
            members.iter().map(|m| m.id),
            &direct,
            &graph,
        ))
    }
}

fn graph_from_members(members: &[MemberInfo], max_depth: usize) -> DelegationGraph {
    DelegationGraph::from_edges(
        members.iter().filter_map(|m| {
            m.delegate.map(|d| {
                (
                    m.id,
                    Delegation {
                        to: d.delegate_id,
                        kind: d.delegation_type,
                    },
                )
            })
        }),
        max_depth,
    )
}

fn rejected(err: DelegationError) -> anyhow::Error {
    let reason = match err {
        DelegationError::SelfDelegation => "you cannot delegate to yourself".to_string(),
        DelegationError::Cycle { to, .. } => format!(
            "{} already delegates to you, directly or through others",
            mention(to as u64)
        ),
    };
    PithosError::DelegationRejected(reason).into()
}
