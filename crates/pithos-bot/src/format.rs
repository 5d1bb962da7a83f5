//! Rendering of motions and results as chat text

use chrono::NaiveDateTime;
use pithos_common::mention;
use pithos_democracy::TallyResult;
use pithos_persistence::MotionInfo;

use crate::service::DelegationStatus;

pub fn datetime(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn option_label(motion: &MotionInfo, option_no: i32) -> String {
    let description = motion
        .options
        .iter()
        .find(|o| o.option_no == option_no)
        .map(|o| o.description.as_str())
        .unwrap_or("?");
    format!("[{}] {}", option_no, description)
}

/// Announcement posted to the motion channel when a motion is filed
pub fn motion_announcement(author_display_name: &str, motion: &MotionInfo) -> String {
    let mut text = format!(
        ":loudspeaker: New motion filed by {}\n{}",
        author_display_name, motion.description
    );
    for option in &motion.options {
        text.push_str(&format!("\n[{}] {}", option.option_no, option.description));
    }
    text.push_str(&format!("\nVoting ends {}", datetime(motion.expires)));
    text.push_str(&format!("\nVote with `vote {} <option>`", motion.id));
    text
}

/// One line of `motion list`
pub fn motion_line(motion: &MotionInfo) -> String {
    format!(
        "`#{}` {} - Voting ends {}",
        motion.id,
        motion.description,
        datetime(motion.expires)
    )
}

pub fn motion_details(motion: &MotionInfo, now: NaiveDateTime) -> String {
    let mut text = format!("**Motion #{}**: {}", motion.id, motion.description);
    for option in &motion.options {
        text.push_str(&format!("\n[{}] {}", option.option_no, option.description));
    }
    let status = if motion.is_running(now) {
        format!("Voting ends {}", datetime(motion.expires))
    } else if motion.closed {
        format!("Closed, voting ended {}", datetime(motion.expires))
    } else {
        format!("Voting ended {}, results pending", datetime(motion.expires))
    };
    text.push('\n');
    text.push_str(&status);
    text
}

/// Result summary; `final_result` selects the wording for a closed motion
pub fn tally_summary(motion: &MotionInfo, result: &TallyResult, final_result: bool) -> String {
    let heading = if final_result { "Results" } else { "Interim results" };
    let mut text = format!(
        "**{} for motion #{}**: {}",
        heading, motion.id, motion.description
    );

    for option in &result.options {
        text.push_str(&format!(
            "\n{} - {} ({} direct, {} delegated)",
            option_label(motion, option.option_no),
            option.total(),
            option.direct,
            option.delegated
        ));
    }

    text.push_str(&format!(
        "\nTurnout: {} of {} members, {} abstained",
        result.turnout(),
        result.eligible,
        result.abstained
    ));

    let winners = result.winners();
    let verdict = match winners.as_slice() {
        [] => "No votes were cast".to_string(),
        [single] => format!(
            "{}: {}",
            if final_result { "Winner" } else { "Leading" },
            option_label(motion, *single)
        ),
        tied => format!(
            "Tie between {}",
            tied.iter()
                .map(|o| option_label(motion, *o))
                .collect::<Vec<_>>()
                .join(" and ")
        ),
    };
    text.push('\n');
    text.push_str(&verdict);
    text
}

pub fn delegation_status(status: &DelegationStatus) -> String {
    let mut text = match &status.delegate {
        Some(delegate) => format!(
            "You delegate to {} ({})",
            mention(delegate.delegate_id as u64),
            delegate.delegation_type
        ),
        None => "You do not delegate your vote".to_string(),
    };

    if status.chain.len() > 1 {
        let chain = status
            .chain
            .iter()
            .map(|id| mention(*id as u64))
            .collect::<Vec<_>>()
            .join(" -> ");
        text.push_str(&format!("\nDelegation chain: {}", chain));
    }

    if status.constituents.is_empty() {
        text.push_str("\nNobody delegates to you");
    } else {
        let constituents = status
            .constituents
            .iter()
            .map(|id| mention(*id as u64))
            .collect::<Vec<_>>()
            .join(", ");
        text.push_str(&format!(
            "\n{} member(s) delegate to you: {}",
            status.constituents.len(),
            constituents
        ));
    }

    text.push_str(if status.accepts_delegates {
        "\nYou accept new delegates"
    } else {
        "\nYou do not accept new delegates"
    });
    text
}
