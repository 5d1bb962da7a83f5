use async_trait::async_trait;
use pithos_common::user_facing;

use super::Flow;
use crate::bot::Bot;
use crate::format;
use crate::messenger::Author;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Description,
    FirstOption,
    SecondOption,
    MoreOptions,
    Duration,
    Done,
}

/// Asks for a description, at least two options, and a duration, then files the motion
pub struct NewMotionFlow {
    user: Author,
    phase: Phase,
    description: String,
    options: Vec<String>,
}

impl NewMotionFlow {
    pub const FIRST_QUESTION: &'static str = "Please give me a short one- or two-line description of your motion \
         (E.g. 'Paint all benches green.' or 'What will we do with all that cotton candy?').";

    pub fn new(user: Author) -> Self {
        Self {
            user,
            phase: Phase::Description,
            description: String::new(),
            options: Vec::new(),
        }
    }

    async fn ask(&self, bot: &Bot, question: &str) -> anyhow::Result<()> {
        bot.messenger().send_direct(self.user.id, question).await
    }

    async fn file_motion(&mut self, bot: &Bot, days: i64) -> anyhow::Result<()> {
        let created = bot
            .voting()
            .create_motion(
                self.user.id,
                self.description.clone(),
                self.options.clone(),
                days,
                bot.now(),
            )
            .await;

        let motion = match created {
            Ok(motion) => motion,
            Err(err) => {
                if let Some(e) = user_facing(&err) {
                    // Stay in this phase so the user can enter another duration
                    return self.ask(bot, &e.to_string()).await;
                }
                return Err(err);
            }
        };
        self.phase = Phase::Done;

        bot.messenger()
            .send_to_channel(
                bot.settings().motion_channel_id,
                &format::motion_announcement(&self.user.display_name, &motion),
            )
            .await?;
        self.ask(
            bot,
            &format!(
                "Your motion #{} has been filed. Voting ends {}",
                motion.id,
                format::datetime(motion.expires)
            ),
        )
        .await
    }
}

#[async_trait]
impl Flow for NewMotionFlow {
    async fn step(&mut self, input: &str, bot: &Bot) -> anyhow::Result<()> {
        let input = input.trim();
        match self.phase {
            Phase::Description => {
                self.description = input.to_string();
                self.phase = Phase::FirstOption;
                self.ask(bot, "Please write a description for option 1").await
            }
            Phase::FirstOption => {
                self.options.push(input.to_string());
                self.phase = Phase::SecondOption;
                self.ask(bot, "Please write a description for option 2").await
            }
            Phase::SecondOption => {
                self.options.push(input.to_string());
                self.phase = Phase::MoreOptions;
                self.ask(
                    bot,
                    "Please write a description for option 3, or type 'done' to finish",
                )
                .await
            }
            Phase::MoreOptions => {
                if input.eq_ignore_ascii_case("done") {
                    self.phase = Phase::Duration;
                    self.ask(bot, "How many days do you want your motion to last?")
                        .await
                } else {
                    self.options.push(input.to_string());
                    self.ask(
                        bot,
                        &format!(
                            "Please write a description for option {}, or type 'done' to finish",
                            self.options.len() + 1
                        ),
                    )
                    .await
                }
            }
            Phase::Duration => match input.parse::<i64>() {
                Ok(days) => self.file_motion(bot, days).await,
                Err(_) => self.ask(bot, "Not a valid number").await,
            },
            Phase::Done => Ok(()),
        }
    }

    fn is_finished(&self) -> bool {
        self.phase == Phase::Done
    }
}
