//! `vote` and `unvote`

use async_trait::async_trait;

use super::{Command, CommandContext, parse_motion_id, parse_option_no};

pub struct VoteCommand;

#[async_trait]
impl Command for VoteCommand {
    fn name(&self) -> &str {
        "vote"
    }

    fn short_help(&self) -> String {
        "**vote** - Vote on a motion. Try `help vote`".to_string()
    }

    fn long_help(&self) -> String {
        "`vote <motion> <option>` - Cast or change your vote on a running motion. \
         A direct vote always takes precedence over your delegation."
            .to_string()
    }

    async fn execute_direct(&self, args: &[&str], ctx: &CommandContext<'_>) -> anyhow::Result<()> {
        let [motion_arg, option_arg, ..] = args else {
            return ctx.reply("Usage: `vote <motion> <option>`").await;
        };
        let motion_id = parse_motion_id(motion_arg)?;
        let option_no = parse_option_no(option_arg)?;

        let motion = ctx
            .bot
            .voting()
            .cast_vote(ctx.author_id(), motion_id, option_no, ctx.bot.now())
            .await?;
        let description = motion
            .options
            .iter()
            .find(|o| o.option_no == option_no)
            .map(|o| o.description.as_str())
            .unwrap_or_default();
        ctx.reply(&format!(
            "Your vote on motion #{} is recorded: [{}] {}",
            motion_id, option_no, description
        ))
        .await
    }
}

pub struct UnvoteCommand;

#[async_trait]
impl Command for UnvoteCommand {
    fn name(&self) -> &str {
        "unvote"
    }

    fn short_help(&self) -> String {
        "**unvote** - Withdraw your direct vote. Try `help unvote`".to_string()
    }

    fn long_help(&self) -> String {
        "`unvote <motion>` - Withdraw your direct vote on a running motion. \
         Your delegation, if any, applies again."
            .to_string()
    }

    async fn execute_direct(&self, args: &[&str], ctx: &CommandContext<'_>) -> anyhow::Result<()> {
        let Some(motion_arg) = args.first() else {
            return ctx.reply("Usage: `unvote <motion>`").await;
        };
        let motion_id = parse_motion_id(motion_arg)?;

        let withdrawn = ctx
            .bot
            .voting()
            .withdraw_vote(ctx.author_id(), motion_id, ctx.bot.now())
            .await?;
        if withdrawn {
            ctx.reply(&format!("Your vote on motion #{} was withdrawn", motion_id))
                .await
        } else {
            ctx.reply(&format!("You have not voted on motion #{}", motion_id))
                .await
        }
    }
}
