//! Domain model types for persistence operations
//!
//! These are backend-agnostic structures returned by the persistence traits.

use chrono::NaiveDateTime;
use pithos_common::DelegationType;
use serde::{Deserialize, Serialize};

use crate::entity::{member, motion, motion_option, vote};

/// A guild member known to the bot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub id: i64,
    pub accepts_delegates: bool,
    pub delegate: Option<DelegateInfo>,
}

/// Outgoing delegation of a member
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateInfo {
    pub delegate_id: i64,
    pub delegation_type: DelegationType,
}

impl From<member::Model> for MemberInfo {
    fn from(model: member::Model) -> Self {
        // A delegate without a type falls back to transitive; the write path
        // always sets both columns together.
        let delegate = model.delegate_id.map(|delegate_id| DelegateInfo {
            delegate_id,
            delegation_type: model
                .delegation_type
                .and_then(DelegationType::from_code)
                .unwrap_or_default(),
        });
        Self {
            id: model.id,
            accepts_delegates: model.accepts_delegates,
            delegate,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionOptionInfo {
    pub option_no: i32,
    pub description: String,
}

impl From<motion_option::Model> for MotionOptionInfo {
    fn from(model: motion_option::Model) -> Self {
        Self {
            option_no: model.option_no,
            description: model.description,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionInfo {
    pub id: i32,
    pub description: String,
    pub author_id: i64,
    pub created: NaiveDateTime,
    pub expires: NaiveDateTime,
    pub closed: bool,
    /// Sorted by option number
    pub options: Vec<MotionOptionInfo>,
}

impl MotionInfo {
    pub fn from_models(model: motion::Model, mut options: Vec<motion_option::Model>) -> Self {
        options.sort_by_key(|o| o.option_no);
        Self {
            id: model.id,
            description: model.description,
            author_id: model.author_id,
            created: model.gmt_create,
            expires: model.expires,
            closed: model.closed,
            options: options.into_iter().map(MotionOptionInfo::from).collect(),
        }
    }

    /// Voting is open strictly before the expiry instant
    pub fn is_running(&self, now: NaiveDateTime) -> bool {
        !self.closed && now < self.expires
    }

    pub fn has_option(&self, option_no: i32) -> bool {
        self.options.iter().any(|o| o.option_no == option_no)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteInfo {
    pub member_id: i64,
    pub motion_id: i32,
    pub selection: i32,
    pub cast_at: NaiveDateTime,
}

impl From<vote::Model> for VoteInfo {
    fn from(model: vote::Model) -> Self {
        Self {
            member_id: model.member_id,
            motion_id: model.motion_id,
            selection: model.selection,
            cast_at: model.gmt_modified,
        }
    }
}

/// Input for creating a motion
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewMotion {
    pub description: String,
    pub author_id: i64,
    pub expires: NaiveDateTime,
    pub options: Vec<String>,
}
