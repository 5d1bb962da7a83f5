//! `proxy` command group: whether others may delegate to you

use async_trait::async_trait;

use super::{Command, CommandContext, CommandGroup, CommandSet};

pub fn proxy_group() -> CommandGroup {
    CommandGroup::new(
        "proxy",
        "**proxy** - Choose whether others may delegate to you",
        CommandSet::new().with(AcceptCommand).with(RefuseCommand),
    )
}

pub struct AcceptCommand;

#[async_trait]
impl Command for AcceptCommand {
    fn name(&self) -> &str {
        "accept"
    }

    fn short_help(&self) -> String {
        "**proxy accept** - Allow others to delegate to you".to_string()
    }

    async fn execute_direct(&self, _args: &[&str], ctx: &CommandContext<'_>) -> anyhow::Result<()> {
        ctx.bot
            .voting()
            .set_accepts_delegates(ctx.author_id(), true)
            .await?;
        ctx.reply("Others may now delegate to you").await
    }
}

pub struct RefuseCommand;

#[async_trait]
impl Command for RefuseCommand {
    fn name(&self) -> &str {
        "refuse"
    }

    fn short_help(&self) -> String {
        "**proxy refuse** - Stop accepting new delegates".to_string()
    }

    fn long_help(&self) -> String {
        "`proxy refuse` - Stop accepting new delegates. \
         Members who already delegate to you keep their delegation."
            .to_string()
    }

    async fn execute_direct(&self, _args: &[&str], ctx: &CommandContext<'_>) -> anyhow::Result<()> {
        ctx.bot
            .voting()
            .set_accepts_delegates(ctx.author_id(), false)
            .await?;
        ctx.reply("You no longer accept new delegates").await
    }
}
