//! Discord adapter
//!
//! Converts gateway events into engine calls and delivers the engine's
//! replies through the Discord HTTP API.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use pithos_bot::{Author, Bot, IncomingMessage, Messenger};
use pithos_common::{DISCORD_MESSAGE_LIMIT, PithosError, split_message};
use serenity::all::{ChannelId, GatewayIntents, GuildId, Http, UserId};
use serenity::client::{Client, Context, EventHandler};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use tracing::{error, info, warn};

pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
}

fn messaging_error(e: serenity::Error) -> anyhow::Error {
    PithosError::MessagingError(e.to_string()).into()
}

fn channel(id: u64) -> anyhow::Result<ChannelId> {
    if id == 0 {
        return Err(PithosError::MessagingError("channel id 0".to_string()).into());
    }
    Ok(ChannelId::new(id))
}

/// [`Messenger`] backed by the Discord HTTP API
pub struct SerenityMessenger {
    http: Arc<Http>,
}

impl SerenityMessenger {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    async fn say(&self, channel_id: ChannelId, content: &str) -> anyhow::Result<()> {
        for chunk in split_message(content, DISCORD_MESSAGE_LIMIT) {
            channel_id
                .say(&*self.http, chunk)
                .await
                .map_err(messaging_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for SerenityMessenger {
    async fn send_to_channel(&self, channel_id: u64, content: &str) -> anyhow::Result<()> {
        self.say(channel(channel_id)?, content).await
    }

    async fn send_direct(&self, user_id: u64, content: &str) -> anyhow::Result<()> {
        if user_id == 0 {
            return Err(PithosError::MessagingError("user id 0".to_string()).into());
        }
        let dm = UserId::new(user_id)
            .create_dm_channel(&*self.http)
            .await
            .map_err(messaging_error)?;
        self.say(dm.id, content).await
    }
}

/// Gateway event handler for one guild
pub struct DiscordHandler {
    bot: Arc<Bot>,
    guild_id: GuildId,
    /// Application id from the configuration, checked against the gateway's
    client_id: Option<u64>,
    /// Set once the bot is known to be a member of the guild
    active: AtomicBool,
}

impl DiscordHandler {
    pub fn new(bot: Arc<Bot>, guild_id: u64) -> anyhow::Result<Self> {
        if guild_id == 0 {
            return Err(PithosError::ConfigError("`discord.server_id` must not be 0".to_string()).into());
        }
        Ok(Self {
            bot,
            guild_id: GuildId::new(guild_id),
            client_id: None,
            active: AtomicBool::new(false),
        })
    }

    pub fn with_client_id(mut self, client_id: Option<u64>) -> Self {
        self.client_id = client_id;
        self
    }

    fn client_id_mismatch(&self, application_id: u64) -> bool {
        self.client_id.is_some_and(|id| id != application_id)
    }

    async fn check_channels(&self, ctx: &Context) {
        let channels = match self.guild_id.channels(&ctx.http).await {
            Ok(channels) => channels,
            Err(e) => {
                warn!(guild_id = %self.guild_id, "Could not list server channels: {}", e);
                return;
            }
        };

        let settings = self.bot.settings();
        for (key, id) in [
            ("discord.motion_channel_id", settings.motion_channel_id),
            ("discord.archive_channel_id", settings.archive_channel_id),
        ] {
            let exists = channel(id).is_ok_and(|c| channels.contains_key(&c));
            if !exists {
                error!(channel_id = id, "`{}` names a channel that does not exist on the server", key);
            }
        }
    }
}

fn incoming(msg: &Message) -> IncomingMessage {
    let display_name = msg
        .member
        .as_ref()
        .and_then(|m| m.nick.clone())
        .or_else(|| msg.author.global_name.clone())
        .unwrap_or_else(|| msg.author.name.clone());

    IncomingMessage {
        author: Author::new(msg.author.id.get(), msg.author.name.clone())
            .with_display_name(display_name),
        channel_id: msg.channel_id.get(),
        is_direct: msg.guild_id.is_none(),
        content: msg.content.clone(),
    }
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        let application_id = ready.application.id.get();
        if self.client_id_mismatch(application_id) {
            warn!(
                configured = self.client_id,
                application_id, "`discord.client_id` does not match the token's application"
            );
        }
        if !ready.guilds.iter().any(|g| g.id == self.guild_id) {
            error!(
                guild_id = %self.guild_id,
                "The bot is not a member of the configured server; invite it and restart"
            );
            return;
        }

        self.check_channels(&ctx).await;
        self.active.store(true, Ordering::SeqCst);
        info!(user = %ready.user.name, "Running, connected");
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        if msg.author.bot || !self.active.load(Ordering::SeqCst) {
            return;
        }
        if msg.guild_id.is_some_and(|id| id != self.guild_id) {
            return;
        }

        self.bot.handle_message(&incoming(&msg)).await;
    }
}

/// Build a gateway client that feeds `handler`
pub async fn build_client(token: &str, handler: DiscordHandler) -> anyhow::Result<Client> {
    Client::builder(token, intents())
        .event_handler(handler)
        .await
        .map_err(|e| PithosError::MessagingError(format!("failed to create Discord client: {}", e)).into())
}

#[cfg(test)]
mod tests {
    use pithos_bot::{BotSettings, MockMessenger};
    use pithos_persistence::SqlPersistService;

    use super::*;

    #[test]
    fn test_intents() {
        let intents = intents();
        assert!(intents.contains(GatewayIntents::MESSAGE_CONTENT));
        assert!(intents.contains(GatewayIntents::DIRECT_MESSAGES));
        assert!(!intents.contains(GatewayIntents::GUILD_PRESENCES));
    }

    #[test]
    fn test_channel_id_zero_is_rejected() {
        assert!(channel(0).is_err());
        assert_eq!(channel(42).unwrap(), ChannelId::new(42));
    }

    #[tokio::test]
    async fn test_handler_requires_guild() {
        let persistence = Arc::new(SqlPersistService::connect("sqlite::memory:", 1).await.unwrap());
        let bot = Arc::new(Bot::new(
            BotSettings::new(1, 2),
            persistence,
            Arc::new(MockMessenger::new()),
        ));
        assert!(DiscordHandler::new(bot.clone(), 0).is_err());

        let handler = DiscordHandler::new(bot, 99).unwrap();
        assert_eq!(handler.guild_id, GuildId::new(99));
        assert!(!handler.active.load(Ordering::SeqCst));
        assert!(!handler.client_id_mismatch(5));

        let handler = handler.with_client_id(Some(111));
        assert!(!handler.client_id_mismatch(111));
        assert!(handler.client_id_mismatch(5));
    }
}
