//! `motion` command group

use async_trait::async_trait;

use super::{Command, CommandContext, CommandGroup, CommandSet, parse_motion_id};
use crate::flow::NewMotionFlow;
use crate::format;

pub fn motion_group() -> CommandGroup {
    CommandGroup::new(
        "motion",
        "**motion** - Interact with motions",
        CommandSet::new()
            .with(ListCommand)
            .with(NewCommand)
            .with(ShowCommand)
            .with(ResultsCommand),
    )
}

pub struct ListCommand;

#[async_trait]
impl Command for ListCommand {
    fn name(&self) -> &str {
        "list"
    }

    fn short_help(&self) -> String {
        "**motion list** - List running motions".to_string()
    }

    async fn execute_direct(&self, _args: &[&str], ctx: &CommandContext<'_>) -> anyhow::Result<()> {
        let motions = ctx.bot.voting().running_motions(ctx.bot.now()).await?;
        if motions.is_empty() {
            return ctx.reply("No currently running motions").await;
        }
        let text = motions
            .iter()
            .map(format::motion_line)
            .collect::<Vec<_>>()
            .join("\n");
        ctx.reply(&text).await
    }
}

pub struct NewCommand;

#[async_trait]
impl Command for NewCommand {
    fn name(&self) -> &str {
        "new"
    }

    fn short_help(&self) -> String {
        "**motion new** - File a new motion".to_string()
    }

    async fn execute_direct(&self, _args: &[&str], ctx: &CommandContext<'_>) -> anyhow::Result<()> {
        let author = ctx.message.author.clone();
        if !ctx
            .bot
            .flows()
            .start(author.id, Box::new(NewMotionFlow::new(author.clone())))
        {
            return ctx
                .reply_direct(&format!(
                    "You are already in a command. Try {}cancel if you want to cancel the current command.",
                    ctx.prefix()
                ))
                .await;
        }

        tracing::debug!(user = author.id, "Started new motion flow");
        if !ctx.message.is_direct {
            ctx.reply("Alright! I'll ask you some questions in PM to set up that motion.")
                .await?;
        }
        ctx.reply_direct(NewMotionFlow::FIRST_QUESTION).await
    }
}

pub struct ShowCommand;

#[async_trait]
impl Command for ShowCommand {
    fn name(&self) -> &str {
        "show"
    }

    fn short_help(&self) -> String {
        "**motion show <id>** - Show a motion and its options".to_string()
    }

    async fn execute_direct(&self, args: &[&str], ctx: &CommandContext<'_>) -> anyhow::Result<()> {
        let Some(arg) = args.first() else {
            return ctx.reply("Usage: `motion show <id>`").await;
        };
        let motion = ctx.bot.voting().motion(parse_motion_id(arg)?).await?;
        ctx.reply(&format::motion_details(&motion, ctx.bot.now()))
            .await
    }
}

pub struct ResultsCommand;

#[async_trait]
impl Command for ResultsCommand {
    fn name(&self) -> &str {
        "results"
    }

    fn short_help(&self) -> String {
        "**motion results <id>** - Show the current tally of a motion".to_string()
    }

    async fn execute_direct(&self, args: &[&str], ctx: &CommandContext<'_>) -> anyhow::Result<()> {
        let Some(arg) = args.first() else {
            return ctx.reply("Usage: `motion results <id>`").await;
        };
        let voting = ctx.bot.voting();
        let motion = voting.motion(parse_motion_id(arg)?).await?;
        let result = voting.tally(&motion).await?;
        let final_result = !motion.is_running(ctx.bot.now());
        ctx.reply(&format::tally_summary(&motion, &result, final_result))
            .await
    }
}
