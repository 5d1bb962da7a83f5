//! End-to-end engine tests: chat messages in, recorded replies out

use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use pithos_bot::{Author, Bot, BotSettings, IncomingMessage, MockMessenger, NewMotionFlow};
use pithos_persistence::{MemberPersistence, MotionPersistence, PersistenceService, SqlPersistService};

const GENERAL: u64 = 100;
const DM: u64 = 500;
const MOTIONS: u64 = 10;
const ARCHIVE: u64 = 20;

struct Harness {
    bot: Bot,
    messenger: Arc<MockMessenger>,
    persistence: Arc<dyn PersistenceService>,
    clock: Arc<Mutex<NaiveDateTime>>,
}

fn start_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

async fn persistence() -> Arc<dyn PersistenceService> {
    Arc::new(
        SqlPersistService::connect("sqlite::memory:", 1)
            .await
            .expect("in-memory database"),
    )
}

fn harness_with(persistence: Arc<dyn PersistenceService>) -> Harness {
    let messenger = Arc::new(MockMessenger::new());
    let clock = Arc::new(Mutex::new(start_time()));
    let shared = clock.clone();
    let bot = Bot::new(
        BotSettings::new(MOTIONS, ARCHIVE),
        persistence.clone(),
        messenger.clone(),
    )
    .with_clock(Arc::new(move || *shared.lock().unwrap()));
    Harness {
        bot,
        messenger,
        persistence,
        clock,
    }
}

async fn harness() -> Harness {
    harness_with(persistence().await)
}

impl Harness {
    async fn say(&self, user: u64, content: &str) {
        self.send(user, GENERAL, false, content).await;
    }

    async fn dm(&self, user: u64, content: &str) {
        self.send(user, DM, true, content).await;
    }

    async fn send(&self, user: u64, channel_id: u64, is_direct: bool, content: &str) {
        let message = IncomingMessage {
            author: Author::new(user, format!("user{}", user))
                .with_display_name(format!("User {}", user)),
            channel_id,
            is_direct,
            content: content.to_string(),
        };
        self.bot.handle_message(&message).await;
    }

    /// Replies in the general channel since the last call
    fn replies(&self) -> Vec<String> {
        self.messenger
            .take()
            .into_iter()
            .filter_map(|sent| match sent {
                pithos_bot::Sent::Channel {
                    channel_id: GENERAL,
                    content,
                } => Some(content),
                _ => None,
            })
            .collect()
    }

    fn last_reply(&self) -> String {
        self.replies().pop().unwrap_or_default()
    }

    fn advance(&self, by: Duration) {
        let mut now = self.clock.lock().unwrap();
        *now += by;
    }

    async fn create_motion(&self, author: u64, options: &[&str], days: i64) -> i32 {
        self.bot
            .voting()
            .create_motion(
                author,
                "Paint all benches green.".to_string(),
                options.iter().map(|o| o.to_string()).collect(),
                days,
                self.bot.now(),
            )
            .await
            .unwrap()
            .id
    }
}

#[tokio::test]
async fn test_unknown_and_missing_commands() {
    let h = harness().await;

    h.say(1, "!").await;
    assert_eq!(h.last_reply(), "Missing command");

    h.say(1, "!frobnicate now").await;
    assert_eq!(h.last_reply(), "`frobnicate` - No such command. Try `!help`");

    h.say(1, "!motion").await;
    let reply = h.last_reply();
    assert!(reply.starts_with("Missing sub-command:\n**motion** offers the following services:"));

    h.say(1, "!motion delete 1").await;
    assert!(h.last_reply().starts_with("Not a valid sub-command:\n"));

    // Plain chatter without an active flow is ignored
    h.say(1, "hello there").await;
    assert!(h.messenger.take().is_empty());
}

#[tokio::test]
async fn test_help() {
    let h = harness().await;

    h.say(1, "!help").await;
    let reply = h.last_reply();
    let lines: Vec<&str> = reply.lines().collect();
    assert_eq!(lines.len(), h.bot.commands().len());
    assert!(lines[0].starts_with("**help**"));
    assert!(reply.contains("**motion** - Interact with motions"));

    h.say(1, "!HELP Motion NEW").await;
    assert_eq!(h.last_reply(), "**motion new** - File a new motion");

    h.say(1, "!help motion frobnicate").await;
    assert_eq!(
        h.last_reply(),
        "(motion) No such command: frobnicate - try 'help motion'?"
    );

    h.say(1, "!help nothing").await;
    assert_eq!(h.last_reply(), "No such command: nothing - try help");
}

#[tokio::test]
async fn test_new_motion_flow() {
    let h = harness().await;

    h.say(1, "!motion new").await;
    assert_eq!(
        h.messenger.channel_messages(GENERAL),
        vec!["Alright! I'll ask you some questions in PM to set up that motion.".to_string()]
    );
    assert_eq!(
        h.messenger.direct_messages(1),
        vec![NewMotionFlow::FIRST_QUESTION.to_string()]
    );
    h.messenger.take();

    let steps = [
        ("Paint all benches green.", "Please write a description for option 1"),
        ("Green", "Please write a description for option 2"),
        (
            "Blue",
            "Please write a description for option 3, or type 'done' to finish",
        ),
        (
            "Leave them",
            "Please write a description for option 4, or type 'done' to finish",
        ),
        ("Done", "How many days do you want your motion to last?"),
        ("a week", "Not a valid number"),
        ("0", "a motion must last between 1 and 365 days"),
    ];
    for (input, question) in steps {
        h.dm(1, input).await;
        assert_eq!(h.messenger.direct_messages(1).last().unwrap(), question);
    }
    assert!(h.bot.flows().is_active(1));

    h.dm(1, "7").await;
    assert!(!h.bot.flows().is_active(1));

    let confirmation = h.messenger.direct_messages(1).pop().unwrap();
    assert_eq!(
        confirmation,
        "Your motion #1 has been filed. Voting ends 2024-06-08 12:00 UTC"
    );

    let announcement = h.messenger.channel_messages(MOTIONS);
    assert_eq!(announcement.len(), 1);
    assert!(announcement[0].starts_with(
        ":loudspeaker: New motion filed by User 1\nPaint all benches green.\n[1] Green\n[2] Blue\n[3] Leave them"
    ));

    let motion = h.bot.voting().motion(1).await.unwrap();
    assert_eq!(motion.options.len(), 3);
    assert_eq!(motion.expires, start_time() + Duration::days(7));

    // Further messages are plain chatter again
    h.messenger.take();
    h.dm(1, "thanks").await;
    assert!(h.messenger.take().is_empty());
}

#[tokio::test]
async fn test_one_flow_per_user_and_cancel() {
    let h = harness().await;

    h.say(1, "!motion new").await;
    h.messenger.take();

    h.say(1, "!motion new").await;
    assert_eq!(
        h.messenger.direct_messages(1),
        vec![
            "You are already in a command. Try !cancel if you want to cancel the current command."
                .to_string()
        ]
    );
    assert!(h.messenger.channel_messages(GENERAL).is_empty());

    h.say(1, "!cancel").await;
    assert_eq!(h.last_reply(), "Cancelled");
    assert!(!h.bot.flows().is_active(1));

    h.say(1, "!cancel").await;
    assert_eq!(h.last_reply(), "Nothing to cancel");
}

#[tokio::test]
async fn test_vote_and_unvote() {
    let h = harness().await;
    let motion_id = h.create_motion(1, &["Yes", "No"], 3).await;

    h.say(2, &format!("!vote #{} 2", motion_id)).await;
    assert_eq!(
        h.last_reply(),
        format!("Your vote on motion #{} is recorded: [2] No", motion_id)
    );

    h.say(2, &format!("!vote {} 9", motion_id)).await;
    assert_eq!(h.last_reply(), format!("motion #{} has no option 9", motion_id));

    h.say(2, "!vote 99 1").await;
    assert_eq!(h.last_reply(), "motion #99 does not exist");

    h.say(2, "!vote soon 1").await;
    assert_eq!(h.last_reply(), "`soon` is not a motion number");

    h.say(2, "!vote").await;
    assert_eq!(h.last_reply(), "Usage: `vote <motion> <option>`");

    h.say(2, &format!("!unvote {}", motion_id)).await;
    assert_eq!(
        h.last_reply(),
        format!("Your vote on motion #{} was withdrawn", motion_id)
    );
    h.say(2, &format!("!unvote {}", motion_id)).await;
    assert_eq!(
        h.last_reply(),
        format!("You have not voted on motion #{}", motion_id)
    );
}

#[tokio::test]
async fn test_delegation_commands() {
    let h = harness().await;

    h.say(2, "!delegate to <@3>").await;
    assert_eq!(h.last_reply(), "You now delegate to <@3> (transitive)");

    h.say(3, "!delegate to <@!2> fixed").await;
    assert_eq!(
        h.last_reply(),
        "delegation rejected: <@2> already delegates to you, directly or through others"
    );

    h.say(3, "!delegate to <@3>").await;
    assert_eq!(
        h.last_reply(),
        "delegation rejected: you cannot delegate to yourself"
    );

    h.say(4, "!proxy refuse").await;
    assert_eq!(h.last_reply(), "You no longer accept new delegates");
    h.say(3, "!delegate to 4").await;
    assert_eq!(
        h.last_reply(),
        "delegation rejected: <@4> does not accept delegates"
    );

    h.say(3, "!delegate to <@2> sometimes").await;
    assert!(h.last_reply().contains("sometimes"));

    h.say(3, "!delegate show").await;
    let reply = h.last_reply();
    assert!(reply.starts_with("You do not delegate your vote"));
    assert!(reply.contains("1 member(s) delegate to you: <@2>"));

    h.say(2, "!delegate clear").await;
    assert_eq!(h.last_reply(), "You no longer delegate your vote");
    h.say(2, "!delegate clear").await;
    assert_eq!(h.last_reply(), "You were not delegating your vote");
}

#[tokio::test]
async fn test_opposite_delegations_at_once_store_no_loop() {
    let h = harness().await;

    tokio::join!(h.say(1, "!delegate to <@2>"), h.say(2, "!delegate to <@1>"));

    let first = h.persistence.member_get(1).await.unwrap().unwrap();
    let second = h.persistence.member_get(2).await.unwrap().unwrap();
    let stored = [first.delegate, second.delegate]
        .iter()
        .filter(|d| d.is_some())
        .count();
    assert_eq!(stored, 1);

    let replies = h.replies();
    assert_eq!(replies.len(), 2);
    assert_eq!(
        replies
            .iter()
            .filter(|r| r.starts_with("delegation rejected:"))
            .count(),
        1
    );
}

#[tokio::test]
async fn test_refusing_proxy_keeps_existing_constituents() {
    let h = harness().await;
    let motion_id = h.create_motion(1, &["Yes", "No"], 3).await;

    h.say(2, "!delegate to <@3>").await;
    h.say(3, &format!("!vote {} 2", motion_id)).await;
    h.say(3, "!proxy refuse").await;
    assert_eq!(h.last_reply(), "You no longer accept new delegates");

    h.say(3, "!delegate show").await;
    assert!(h.last_reply().contains("1 member(s) delegate to you: <@2>"));

    h.say(1, &format!("!motion results {}", motion_id)).await;
    let reply = h.last_reply();
    assert!(reply.contains("[2] No - 2 (1 direct, 1 delegated)"));
}

#[tokio::test]
async fn test_delegate_to_out_of_range_id() {
    let h = harness().await;

    h.say(2, &format!("!delegate to {}", u64::MAX)).await;
    assert_eq!(
        h.last_reply(),
        format!("`{}` is not a valid user id", u64::MAX)
    );
    assert!(h.persistence.member_get(2).await.unwrap().is_none());
}

#[tokio::test]
async fn test_results_follow_delegations() {
    let h = harness().await;
    let motion_id = h.create_motion(1, &["Yes", "No"], 3).await;

    h.say(1, &format!("!vote {} 1", motion_id)).await;
    h.say(2, "!delegate to <@1>").await;
    // Fixed delegation to a member who did not vote directly abstains
    h.say(3, "!delegate to <@2> fixed").await;
    h.say(4, &format!("!vote {} 2", motion_id)).await;
    h.messenger.take();

    h.say(5, &format!("!motion results {}", motion_id)).await;
    let reply = h.last_reply();
    assert!(reply.starts_with(&format!("**Interim results for motion #{}**", motion_id)));
    assert!(reply.contains("[1] Yes - 2 (1 direct, 1 delegated)"));
    assert!(reply.contains("[2] No - 1 (1 direct, 0 delegated)"));
    // Asking for results does not register member 5
    assert!(reply.contains("Turnout: 3 of 4 members, 1 abstained"));
    assert!(reply.ends_with("Leading: [1] Yes"));

    // A direct vote overrides the delegation
    h.say(2, &format!("!vote {} 2", motion_id)).await;
    h.messenger.take();
    h.say(5, &format!("!motion results {}", motion_id)).await;
    let reply = h.last_reply();
    assert!(reply.contains("[2] No - 3 (2 direct, 1 delegated)"));
    assert!(reply.ends_with("Leading: [2] No"));
}

#[tokio::test]
async fn test_motion_list_and_show() {
    let h = harness().await;

    h.say(1, "!motion list").await;
    assert_eq!(h.last_reply(), "No currently running motions");

    let first = h.create_motion(1, &["Yes", "No"], 2).await;
    let second = h.create_motion(1, &["Yes", "No"], 1).await;

    h.say(1, "!motion list").await;
    let reply = h.last_reply();
    let lines: Vec<&str> = reply.lines().collect();
    assert_eq!(lines.len(), 2);
    // Soonest to expire first
    assert!(lines[0].starts_with(&format!("`#{}`", second)));
    assert!(lines[1].starts_with(&format!("`#{}`", first)));

    h.say(1, &format!("!motion show {}", first)).await;
    let reply = h.last_reply();
    assert!(reply.starts_with(&format!("**Motion #{}**: Paint all benches green.", first)));
    assert!(reply.contains("\n[1] Yes\n[2] No\n"));
    assert!(reply.ends_with("Voting ends 2024-06-03 12:00 UTC"));
}

#[tokio::test]
async fn test_close_expired_motions() {
    let h = harness().await;
    let motion_id = h.create_motion(1, &["Yes", "No"], 1).await;
    h.say(1, &format!("!vote {} 1", motion_id)).await;
    h.messenger.take();

    assert_eq!(h.bot.close_expired_motions(h.bot.now()).await.unwrap(), 0);

    h.advance(Duration::days(1));
    assert_eq!(h.bot.close_expired_motions(h.bot.now()).await.unwrap(), 1);

    let archive = h.messenger.channel_messages(ARCHIVE);
    assert_eq!(archive.len(), 1);
    assert!(archive[0].starts_with(&format!("**Results for motion #{}**", motion_id)));
    assert!(archive[0].ends_with("Winner: [1] Yes"));

    // Closed motions are swept only once and no longer take votes
    assert_eq!(h.bot.close_expired_motions(h.bot.now()).await.unwrap(), 0);
    h.say(2, &format!("!vote {} 2", motion_id)).await;
    assert_eq!(
        h.last_reply(),
        format!("motion #{} is no longer accepting votes", motion_id)
    );

    h.say(2, &format!("!motion results {}", motion_id)).await;
    assert!(h.last_reply().starts_with("**Results for motion"));
}

#[tokio::test]
async fn test_unreachable_archive_keeps_motion_open() {
    let persistence = persistence().await;
    let failing = harness_with(persistence.clone());
    failing.messenger.fail_channel(ARCHIVE);

    let motion_id = failing.create_motion(1, &["Yes", "No"], 1).await;
    failing.advance(Duration::days(2));
    assert_eq!(
        failing
            .bot
            .close_expired_motions(failing.bot.now())
            .await
            .unwrap(),
        0
    );
    let motion = failing.persistence.motion_get(motion_id).await.unwrap().unwrap();
    assert!(!motion.closed);

    // The next sweep with a working channel closes it
    let working = harness_with(persistence);
    working.advance(Duration::days(2));
    assert_eq!(
        working
            .bot
            .close_expired_motions(working.bot.now())
            .await
            .unwrap(),
        1
    );
    assert_eq!(working.messenger.channel_messages(ARCHIVE).len(), 1);
}
