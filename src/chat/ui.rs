//! Chat mode UI components.

use crate::config::ResolvedConfig;
use crate::conversation::{Role, Turn};
use crate::ui::Style;

use super::command::SLASH_COMMANDS;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn print_header(description: Option<&str>) {
    println!(
        "{} {} - Interactive Chat",
        Style::header("convo"),
        Style::version(format!("v{VERSION}"))
    );
    if let Some(description) = description {
        println!("{}", Style::secondary(format!("Connected: {description}")));
    }
    println!();
}

pub fn print_goodbye() {
    println!("{}", Style::success("Goodbye!"));
}

pub fn print_config(config: &ResolvedConfig) {
    let backend = &config.backend;
    println!("{}", Style::header("Configuration"));
    println!(
        "  {}   {}",
        Style::label("provider"),
        Style::value(&config.provider_name)
    );
    println!(
        "  {}      {}",
        Style::label("model"),
        Style::value(&backend.model)
    );
    println!(
        "  {}       {}",
        Style::label("mode"),
        Style::value(backend.style)
    );
    println!(
        "  {}   {}",
        Style::label("endpoint"),
        Style::secondary(&backend.endpoint)
    );
    println!();
}

pub fn print_help() {
    println!("{}", Style::header("Available commands"));
    for (command, description) in SLASH_COMMANDS {
        println!(
            "  {}  {}",
            Style::command(format!("{command:<8}")),
            Style::secondary(description)
        );
    }
    println!();
}

fn speaker(role: Role) -> String {
    match role {
        Role::User => Style::user(role),
        Role::Assistant => Style::assistant(role),
    }
}

pub fn print_turn(turn: &Turn) {
    println!("{}", speaker(turn.role()));
    println!("{}", turn.content());
    println!();
}

pub fn print_answer(answer: &str) {
    print_turn(&Turn::assistant(answer));
}

/// Re-renders the whole conversation, oldest turn first.
pub fn print_history<'a>(turns: impl ExactSizeIterator<Item = &'a Turn>) {
    if turns.len() == 0 {
        println!("{}", Style::secondary("No messages yet."));
        println!();
        return;
    }
    for turn in turns {
        print_turn(turn);
    }
}

pub fn print_success(message: &str) {
    println!("{} {message}", Style::success("✓"));
    println!();
}

pub fn print_error(message: &str) {
    eprintln!("{} {message}", Style::error("Error:"));
    eprintln!();
}
