//! `delegate` command group

use async_trait::async_trait;
use pithos_common::{DelegationType, PithosError, mention, parse_user_ref};

use super::{Command, CommandContext, CommandGroup, CommandSet};
use crate::format;

pub fn delegate_group() -> CommandGroup {
    CommandGroup::new(
        "delegate",
        "**delegate** - Let someone else vote for you",
        CommandSet::new()
            .with(ToCommand)
            .with(ClearCommand)
            .with(ShowCommand),
    )
}

pub struct ToCommand;

#[async_trait]
impl Command for ToCommand {
    fn name(&self) -> &str {
        "to"
    }

    fn short_help(&self) -> String {
        "**delegate to <@member> [transitive|fixed]** - Delegate your vote".to_string()
    }

    fn long_help(&self) -> String {
        "`delegate to <@member>` - Your vote follows wherever your delegate's vote goes, \
         including their own delegation\n\
         `delegate to <@member> fixed` - Your vote follows only your delegate's own direct vote"
            .to_string()
    }

    async fn execute_direct(&self, args: &[&str], ctx: &CommandContext<'_>) -> anyhow::Result<()> {
        let Some(target) = args.first() else {
            return ctx
                .reply("Usage: `delegate to <@member> [transitive|fixed]`")
                .await;
        };
        let delegate_id = parse_user_ref(target).ok_or_else(|| {
            PithosError::IllegalArgument(format!("`{}` is not a member mention", target))
        })?;
        let kind = match args.get(1) {
            Some(kind) => kind
                .parse::<DelegationType>()
                .map_err(PithosError::IllegalArgument)?,
            None => DelegationType::default(),
        };

        ctx.bot
            .voting()
            .delegate(ctx.author_id(), delegate_id, kind)
            .await?;
        ctx.reply(&format!(
            "You now delegate to {} ({})",
            mention(delegate_id),
            kind
        ))
        .await
    }
}

pub struct ClearCommand;

#[async_trait]
impl Command for ClearCommand {
    fn name(&self) -> &str {
        "clear"
    }

    fn short_help(&self) -> String {
        "**delegate clear** - Stop delegating your vote".to_string()
    }

    async fn execute_direct(&self, _args: &[&str], ctx: &CommandContext<'_>) -> anyhow::Result<()> {
        if ctx.bot.voting().clear_delegation(ctx.author_id()).await? {
            ctx.reply("You no longer delegate your vote").await
        } else {
            ctx.reply("You were not delegating your vote").await
        }
    }
}

pub struct ShowCommand;

#[async_trait]
impl Command for ShowCommand {
    fn name(&self) -> &str {
        "show"
    }

    fn short_help(&self) -> String {
        "**delegate show** - Show your delegate and constituents".to_string()
    }

    async fn execute_direct(&self, _args: &[&str], ctx: &CommandContext<'_>) -> anyhow::Result<()> {
        let status = ctx.bot.voting().delegation_status(ctx.author_id()).await?;
        ctx.reply(&format::delegation_status(&status)).await
    }
}
