use async_trait::async_trait;

use super::{Command, CommandContext};

pub struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn short_help(&self) -> String {
        "**help** - Help with operating this bot. Try `help <command>`".to_string()
    }

    fn long_help(&self) -> String {
        "`help` - List all commands\n`help <command>` - Show more detailed information for a command"
            .to_string()
    }

    async fn execute_direct(&self, args: &[&str], ctx: &CommandContext<'_>) -> anyhow::Result<()> {
        let Some((first, rest)) = args.split_first() else {
            let help = ctx
                .bot
                .commands()
                .iter()
                .map(|c| c.short_help())
                .collect::<Vec<_>>()
                .join("\n");
            return ctx.reply(&help).await;
        };

        let cmd_name = first.to_lowercase();
        let Some(mut command) = ctx.bot.commands().get(&cmd_name) else {
            return ctx
                .reply(&format!("No such command: {} - try help", cmd_name))
                .await;
        };

        for (i, sub_name) in rest.iter().enumerate() {
            let sub_name = sub_name.to_lowercase();
            match command.subcommands().and_then(|s| s.get(&sub_name)) {
                Some(subcommand) => command = subcommand,
                None => {
                    let so_far = args[..=i].join(" ");
                    return ctx
                        .reply(&format!(
                            "({}) No such command: {} - try 'help {}'?",
                            so_far, sub_name, so_far
                        ))
                        .await;
                }
            }
        }

        ctx.reply(&command.long_help()).await
    }
}
