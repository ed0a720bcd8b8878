use anyhow::Result;
use inquire::Text;
use inquire::ui::{Attributes, Color, RenderConfig, StyleSheet, Styled};

use super::command::{Input, SlashCommand, SlashCommandCompleter, parse_input};
use super::ui;
use crate::config::ResolvedConfig;
use crate::conversation::{ConversationSession, SendOutcome, SessionError};
use crate::ui::Spinner;

/// The interactive chat loop around a [`ConversationSession`].
///
/// The credential is kept in memory only, so that `/reset` can start a fresh
/// conversation without asking for it again.
pub struct ChatSession {
    config: ResolvedConfig,
    conversation: ConversationSession,
    credential: Option<String>,
}

impl ChatSession {
    /// Wraps an already initialized conversation.
    pub const fn new(
        config: ResolvedConfig,
        conversation: ConversationSession,
        credential: Option<String>,
    ) -> Self {
        Self {
            config,
            conversation,
            credential,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        ui::print_header(self.conversation.backend_description().as_deref());

        let prompt_style = Styled::new("❯")
            .with_fg(Color::LightBlue)
            .with_attr(Attributes::BOLD);
        let mut render_config = RenderConfig::default()
            .with_prompt_prefix(prompt_style)
            .with_answered_prompt_prefix(prompt_style);

        // Non-highlighted suggestions: gray
        render_config.option = StyleSheet::new().with_fg(Color::Grey);
        // Highlighted suggestion: purple
        render_config.selected_option = Some(StyleSheet::new().with_fg(Color::DarkMagenta));

        loop {
            let line = Text::new("")
                .with_render_config(render_config)
                .with_autocomplete(SlashCommandCompleter)
                .with_help_message("Type a message, /help for commands, Ctrl+C to quit")
                .prompt();

            match line {
                Ok(line) => {
                    if !self.handle_input(parse_input(&line)).await {
                        break;
                    }
                }
                Err(
                    inquire::InquireError::OperationCanceled
                    | inquire::InquireError::OperationInterrupted,
                ) => {
                    println!(); // Clear line before goodbye message
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        ui::print_goodbye();
        Ok(())
    }

    /// Handles one line of input. Returns `false` when the loop should end.
    async fn handle_input(&mut self, input: Input) -> bool {
        match input {
            Input::Empty => true,
            Input::Text(text) => {
                let result = {
                    let _spinner = Spinner::new("Thinking...");
                    self.conversation.send(&text).await
                };
                Self::print_outcome(result);
                true
            }
            Input::Command(cmd) => self.handle_command(cmd).await,
        }
    }

    async fn handle_command(&mut self, cmd: SlashCommand) -> bool {
        match cmd {
            SlashCommand::Config => ui::print_config(&self.config),
            SlashCommand::Help => ui::print_help(),
            SlashCommand::History => ui::print_history(self.conversation.history()),
            SlashCommand::Reset => self.reset().await,
            SlashCommand::Retry => {
                let result = {
                    let _spinner = Spinner::new("Retrying...");
                    self.conversation.retry().await
                };
                Self::print_outcome(result);
            }
            SlashCommand::Quit => return false,
            SlashCommand::Unknown(cmd) => {
                ui::print_error(&format!("Unknown command: /{cmd}"));
            }
        }
        true
    }

    async fn reset(&mut self) {
        self.conversation.reset();

        match self
            .conversation
            .initialize(self.credential.as_deref())
            .await
        {
            Ok(()) => ui::print_success("Started a new conversation"),
            Err(e) => ui::print_error(&e.to_string()),
        }
    }

    fn print_outcome(result: Result<SendOutcome, SessionError>) {
        match result {
            Ok(SendOutcome::Answered(answer)) => ui::print_answer(&answer),
            Ok(SendOutcome::Failed { kind, message }) => {
                ui::print_error(&message);
                if kind.is_retryable() {
                    crate::status!("Type /retry to try again.\n");
                }
            }
            Err(e) => ui::print_error(&e.to_string()),
        }
    }
}
