//! Pithos Bot - chat command engine
//!
//! Platform independent: incoming messages arrive as [`IncomingMessage`]
//! values and replies leave through a [`Messenger`].

pub mod bot;
pub mod command;
pub mod flow;
pub mod format;
pub mod messenger;
pub mod service;

pub use bot::{Bot, BotSettings, Clock};
pub use command::{Command, CommandContext, CommandGroup, CommandSet};
pub use flow::{Flow, FlowRegistry, NewMotionFlow};
pub use messenger::{Author, IncomingMessage, Messenger, MockMessenger, Sent};
pub use service::{DelegationStatus, MAX_MOTION_DAYS, VotingService};
