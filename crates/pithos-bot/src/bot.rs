//! Bot engine
//!
//! Routes incoming chat messages to commands or to the author's active flow,
//! and closes motions whose voting period has ended.

use std::sync::Arc;

use chrono::NaiveDateTime;
use pithos_common::{DEFAULT_COMMAND_PREFIX, DEFAULT_MAX_DELEGATION_DEPTH, user_facing};
use pithos_persistence::PersistenceService;

use crate::command::cancel::CancelCommand;
use crate::command::delegate::delegate_group;
use crate::command::help::HelpCommand;
use crate::command::motion::motion_group;
use crate::command::proxy::proxy_group;
use crate::command::vote::{UnvoteCommand, VoteCommand};
use crate::command::{CommandContext, CommandSet};
use crate::flow::FlowRegistry;
use crate::format;
use crate::messenger::{IncomingMessage, Messenger};
use crate::service::VotingService;

const GENERIC_FAILURE: &str = "Something went wrong, please try again later.";

/// Source of the current time, UTC
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

#[derive(Debug, Clone)]
pub struct BotSettings {
    pub command_prefix: String,
    /// Channel where new motions are announced
    pub motion_channel_id: u64,
    /// Channel where final results are posted
    pub archive_channel_id: u64,
    pub max_delegation_depth: usize,
}

impl BotSettings {
    pub fn new(motion_channel_id: u64, archive_channel_id: u64) -> Self {
        Self {
            command_prefix: DEFAULT_COMMAND_PREFIX.to_string(),
            motion_channel_id,
            archive_channel_id,
            max_delegation_depth: DEFAULT_MAX_DELEGATION_DEPTH,
        }
    }
}

pub struct Bot {
    settings: BotSettings,
    messenger: Arc<dyn Messenger>,
    voting: VotingService,
    commands: CommandSet,
    flows: FlowRegistry,
    clock: Clock,
}

impl Bot {
    pub fn new(
        settings: BotSettings,
        persistence: Arc<dyn PersistenceService>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        let voting = VotingService::new(persistence, settings.max_delegation_depth);
        Self {
            settings,
            messenger,
            voting,
            commands: default_commands(),
            flows: FlowRegistry::new(),
            clock: Arc::new(|| chrono::Utc::now().naive_utc()),
        }
    }

    /// Replace the clock, e.g. to drive expiry in tests
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    pub fn messenger(&self) -> &Arc<dyn Messenger> {
        &self.messenger
    }

    pub fn voting(&self) -> &VotingService {
        &self.voting
    }

    pub fn commands(&self) -> &CommandSet {
        &self.commands
    }

    pub fn flows(&self) -> &FlowRegistry {
        &self.flows
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    /// Handle one chat message. Errors are reported to the user, never returned.
    pub async fn handle_message(&self, message: &IncomingMessage) {
        tracing::debug!(
            "[{}] <{}> {}",
            message.channel_id,
            message.author.name,
            message.content
        );

        let result = match message.content.strip_prefix(self.settings.command_prefix.as_str()) {
            Some(command_line) => self.run_command(command_line, message).await,
            None => self.step_flow(message).await,
        };

        if let Err(err) = result {
            self.report_error(message, err).await;
        }
    }

    async fn run_command(&self, command_line: &str, message: &IncomingMessage) -> anyhow::Result<()> {
        let ctx = CommandContext { bot: self, message };
        let args: Vec<&str> = command_line.split_whitespace().collect();

        let Some((name, rest)) = args.split_first() else {
            return ctx.reply("Missing command").await;
        };

        match self.commands.get(name) {
            Some(command) => {
                tracing::debug!(command = %name.to_lowercase(), user = message.author.id, "Executing command");
                command.execute(rest, &ctx).await
            }
            None => {
                ctx.reply(&format!(
                    "`{}` - No such command. Try `{}help`",
                    name, self.settings.command_prefix
                ))
                .await
            }
        }
    }

    async fn step_flow(&self, message: &IncomingMessage) -> anyhow::Result<()> {
        let user_id = message.author.id;
        let Some(flow) = self.flows.get(user_id) else {
            return Ok(());
        };

        let mut active = flow.lock().await;
        let result = active.step(&message.content, self).await;
        if active.is_finished() {
            drop(active);
            self.flows.finish(user_id, &flow);
            tracing::debug!(user = user_id, "Flow finished");
        }
        result
    }

    async fn report_error(&self, message: &IncomingMessage, err: anyhow::Error) {
        let reply = match user_facing(&err) {
            Some(e) => e.to_string(),
            None => {
                tracing::error!(
                    user = message.author.id,
                    channel = message.channel_id,
                    "Failed to handle message: {:#}",
                    err
                );
                GENERIC_FAILURE.to_string()
            }
        };

        if let Err(e) = self
            .messenger
            .send_to_channel(message.channel_id, &reply)
            .await
        {
            tracing::warn!(channel = message.channel_id, "Failed to send error reply: {:#}", e);
        }
    }

    /// Post final results of every expired motion and close it.
    ///
    /// A motion stays open if its results could not be posted, so the next
    /// sweep retries it. Returns the number of motions closed.
    pub async fn close_expired_motions(&self, now: NaiveDateTime) -> anyhow::Result<usize> {
        let expired = self.voting.expired_open_motions(now).await?;
        let mut closed = 0;

        for motion in expired {
            let result = async {
                let tally = self.voting.tally(&motion).await?;
                self.messenger
                    .send_to_channel(
                        self.settings.archive_channel_id,
                        &format::tally_summary(&motion, &tally, true),
                    )
                    .await?;
                self.voting.mark_closed(motion.id).await
            }
            .await;

            match result {
                Ok(true) => {
                    closed += 1;
                    tracing::info!(motion_id = motion.id, "Motion closed");
                }
                Ok(false) => {
                    tracing::debug!(motion_id = motion.id, "Motion was already closed");
                }
                Err(e) => {
                    tracing::error!(motion_id = motion.id, "Failed to close motion: {:#}", e);
                }
            }
        }

        Ok(closed)
    }
}

fn default_commands() -> CommandSet {
    CommandSet::new()
        .with(HelpCommand)
        .with(CancelCommand)
        .with(motion_group())
        .with(VoteCommand)
        .with(UnvoteCommand)
        .with(delegate_group())
        .with(proxy_group())
}
