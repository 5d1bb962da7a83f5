//! Command tree
//!
//! A command either does its work directly or dispatches to named
//! sub-commands. Names are matched case-insensitively. Help texts are built
//! from the tree, so registering a command is enough to document it.

pub mod cancel;
pub mod delegate;
pub mod help;
pub mod motion;
pub mod proxy;
pub mod vote;

use async_trait::async_trait;
use pithos_common::PithosError;

use crate::bot::Bot;
use crate::messenger::IncomingMessage;

/// Everything a command needs to act on one incoming message
pub struct CommandContext<'a> {
    pub bot: &'a Bot,
    pub message: &'a IncomingMessage,
}

impl CommandContext<'_> {
    /// Reply in the channel the command came from
    pub async fn reply(&self, content: &str) -> anyhow::Result<()> {
        self.bot
            .messenger()
            .send_to_channel(self.message.channel_id, content)
            .await
    }

    /// Send a direct message to the command's author
    pub async fn reply_direct(&self, content: &str) -> anyhow::Result<()> {
        self.bot
            .messenger()
            .send_direct(self.message.author.id, content)
            .await
    }

    pub fn author_id(&self) -> u64 {
        self.message.author.id
    }

    pub fn prefix(&self) -> &str {
        &self.bot.settings().command_prefix
    }
}

#[async_trait]
pub trait Command: Send + Sync {
    /// Name used to activate this command
    fn name(&self) -> &str;

    /// Single line help message
    fn short_help(&self) -> String;

    /// Sub-commands, if this command only dispatches
    fn subcommands(&self) -> Option<&CommandSet> {
        None
    }

    /// Longer help; by default lists the sub-commands
    fn long_help(&self) -> String {
        match self.subcommands() {
            Some(subcommands) if !subcommands.is_empty() => {
                let mut help = format!("**{}** offers the following services:", self.name());
                for subcommand in subcommands.iter() {
                    help.push_str(&format!("\n- {}", subcommand.short_help()));
                }
                help
            }
            _ => self.short_help(),
        }
    }

    /// Run this command with `args`, ignoring sub-commands
    async fn execute_direct(&self, args: &[&str], ctx: &CommandContext<'_>) -> anyhow::Result<()>;

    /// Run this command, dispatching to a sub-command when there are any
    async fn execute(&self, args: &[&str], ctx: &CommandContext<'_>) -> anyhow::Result<()> {
        let subcommands = match self.subcommands() {
            Some(subcommands) if !subcommands.is_empty() => subcommands,
            _ => return self.execute_direct(args, ctx).await,
        };

        let Some((first, rest)) = args.split_first() else {
            return ctx
                .reply(&format!("Missing sub-command:\n{}", self.long_help()))
                .await;
        };

        match subcommands.get(first) {
            Some(subcommand) => subcommand.execute(rest, ctx).await,
            None => {
                ctx.reply(&format!("Not a valid sub-command:\n{}", self.long_help()))
                    .await
            }
        }
    }
}

/// Ordered set of commands, looked up by lower-cased name
#[derive(Default)]
pub struct CommandSet {
    commands: Vec<Box<dyn Command>>,
}

impl CommandSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command, replacing any command with the same name
    pub fn register(&mut self, command: Box<dyn Command>) {
        let name = command.name().to_lowercase();
        self.commands.retain(|c| c.name().to_lowercase() != name);
        self.commands.push(command);
    }

    pub fn with(mut self, command: impl Command + 'static) -> Self {
        self.register(Box::new(command));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        let name = name.to_lowercase();
        self.commands
            .iter()
            .find(|c| c.name().to_lowercase() == name)
            .map(|c| c.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Command> {
        self.commands.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// A command that only dispatches to its sub-commands
pub struct CommandGroup {
    name: &'static str,
    short_help: &'static str,
    subcommands: CommandSet,
}

impl CommandGroup {
    pub fn new(name: &'static str, short_help: &'static str, subcommands: CommandSet) -> Self {
        Self {
            name,
            short_help,
            subcommands,
        }
    }
}

#[async_trait]
impl Command for CommandGroup {
    fn name(&self) -> &str {
        self.name
    }

    fn short_help(&self) -> String {
        self.short_help.to_string()
    }

    fn subcommands(&self) -> Option<&CommandSet> {
        Some(&self.subcommands)
    }

    async fn execute_direct(&self, _args: &[&str], _ctx: &CommandContext<'_>) -> anyhow::Result<()> {
        // Only contains sub-commands
        Ok(())
    }
}

/// Parse a motion reference such as `3` or `#3`
pub fn parse_motion_id(arg: &str) -> anyhow::Result<i32> {
    arg.trim_start_matches('#')
        .parse::<i32>()
        .map_err(|_| PithosError::IllegalArgument(format!("`{}` is not a motion number", arg)).into())
}

/// Parse a 1-based option number
pub fn parse_option_no(arg: &str) -> anyhow::Result<i32> {
    arg.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<i32>()
        .map_err(|_| PithosError::IllegalArgument(format!("`{}` is not an option number", arg)).into())
}
