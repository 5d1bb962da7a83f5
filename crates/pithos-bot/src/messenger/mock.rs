//! In-memory `Messenger` that records everything it is asked to send

use std::sync::Mutex;

use async_trait::async_trait;

use super::Messenger;

/// A message recorded by [`MockMessenger`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Channel { channel_id: u64, content: String },
    Direct { user_id: u64, content: String },
}

impl Sent {
    pub fn content(&self) -> &str {
        match self {
            Sent::Channel { content, .. } | Sent::Direct { content, .. } => content,
        }
    }
}

#[derive(Debug, Default)]
pub struct MockMessenger {
    sent: Mutex<Vec<Sent>>,
    fail_channels: Mutex<Vec<u64>>,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send to `channel_id` fail
    pub fn fail_channel(&self, channel_id: u64) {
        self.fail_channels
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(channel_id);
    }

    /// Drain recorded messages
    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Messages sent to `channel_id` so far, without draining
    pub fn channel_messages(&self, channel_id: u64) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter_map(|s| match s {
                Sent::Channel {
                    channel_id: id,
                    content,
                } if *id == channel_id => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    /// Direct messages sent to `user_id` so far, without draining
    pub fn direct_messages(&self, user_id: u64) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter_map(|s| match s {
                Sent::Direct { user_id: id, content } if *id == user_id => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, sent: Sent) {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(sent);
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_to_channel(&self, channel_id: u64, content: &str) -> anyhow::Result<()> {
        if self
            .fail_channels
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&channel_id)
        {
            anyhow::bail!("channel {} is unreachable", channel_id);
        }
        self.record(Sent::Channel {
            channel_id,
            content: content.to_string(),
        });
        Ok(())
    }

    async fn send_direct(&self, user_id: u64, content: &str) -> anyhow::Result<()> {
        self.record(Sent::Direct {
            user_id,
            content: content.to_string(),
        });
        Ok(())
    }
}
