//! Seam between the bot engine and the chat platform
//!
//! The engine only produces text for a channel or a user; the platform
//! adapter decides how that text is delivered.

mod mock;

pub use mock::{MockMessenger, Sent};

use async_trait::async_trait;

/// Outgoing side of the chat platform
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Post `content` to a guild or DM channel
    async fn send_to_channel(&self, channel_id: u64, content: &str) -> anyhow::Result<()>;

    /// Send `content` to a user as a direct message
    async fn send_direct(&self, user_id: u64, content: &str) -> anyhow::Result<()>;
}

/// Author of an incoming message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: u64,
    /// Account name
    pub name: String,
    /// Name shown in the guild (nickname or global display name)
    pub display_name: String,
}

impl Author {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id,
            display_name: name.clone(),
            name,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }
}

/// A chat message handed to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub author: Author,
    pub channel_id: u64,
    /// Sent in a direct-message channel
    pub is_direct: bool,
    pub content: String,
}
