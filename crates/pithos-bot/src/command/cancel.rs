use async_trait::async_trait;

use super::{Command, CommandContext};

pub struct CancelCommand;

#[async_trait]
impl Command for CancelCommand {
    fn name(&self) -> &str {
        "cancel"
    }

    fn short_help(&self) -> String {
        "**cancel** - Cancel an ongoing command".to_string()
    }

    async fn execute_direct(&self, _args: &[&str], ctx: &CommandContext<'_>) -> anyhow::Result<()> {
        if ctx.bot.flows().cancel(ctx.author_id()) {
            tracing::debug!(user = ctx.author_id(), "Flow cancelled");
            ctx.reply("Cancelled").await
        } else {
            ctx.reply("Nothing to cancel").await
        }
    }
}
