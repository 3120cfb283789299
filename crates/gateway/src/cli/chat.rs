//! `codemitra chat`: interactive REPL command.
//!
//! Opens a readline-based loop that sends each line through the turn
//! orchestrator and prints the assistant's reply. Supports slash-commands
//! for session management, model switching, and other REPL conveniences.

use std::sync::Arc;

use cm_domain::config::Config;
use cm_domain::Turn;
use cm_providers::GenerateOptions;

use crate::bootstrap;
use crate::runtime::{TurnOrchestrator, ERROR_TAG};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run the interactive chat REPL.
pub async fn chat(
    config: Arc<Config>,
    mut session_key: String,
    mut model: Option<String>,
) -> anyhow::Result<()> {
    let state = bootstrap::build_app_state(config)?;
    bootstrap::probe_model(&state).await;

    let history_path = dirs::home_dir()
        .unwrap_or_default()
        .join(".codemitra")
        .join("chat_history.txt");
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    // Banner goes to stderr so stdout only carries answers.
    eprintln!("CodeMITRA interactive chat");
    eprintln!("Session: {session_key}  |  Type /help for commands, Ctrl+D to exit");
    eprintln!();

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                rl.add_history_entry(&line).ok();

                if trimmed.starts_with('/') {
                    let action = handle_slash_command(trimmed, &mut session_key, &mut model);
                    match action {
                        SlashAction::Exit => break,
                        SlashAction::Reset => {
                            let dropped = state.orchestrator.reset(&session_key).await;
                            eprintln!("Conversation cleared ({dropped} message(s) dropped).");
                        }
                        SlashAction::History => {
                            print_history(&state.orchestrator.view(&session_key));
                        }
                        SlashAction::Continue => {}
                    }
                    continue;
                }

                send_message(&state.orchestrator, &session_key, &model, trimmed).await;
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();

    eprintln!("Goodbye!");
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Slash command handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// What the REPL loop should do after a slash command.
#[derive(Debug, PartialEq, Eq)]
enum SlashAction {
    Continue,
    Reset,
    History,
    Exit,
}

fn handle_slash_command(
    input: &str,
    session_key: &mut String,
    model: &mut Option<String>,
) -> SlashAction {
    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|s| !s.is_empty());

    match cmd {
        "/exit" | "/quit" => return SlashAction::Exit,

        "/session" => {
            if let Some(name) = arg {
                *session_key = name.to_string();
                eprintln!("Session switched to: {session_key}");
            } else {
                eprintln!("Current session: {session_key}");
                eprintln!("Usage: /session <name>");
            }
        }

        "/model" => {
            if let Some(name) = arg {
                *model = Some(name.to_string());
                eprintln!("Model set to: {name}");
            } else {
                eprintln!("Current model: {}", model.as_deref().unwrap_or("(default)"));
                eprintln!("Usage: /model <name>");
            }
        }

        "/reset" => return SlashAction::Reset,

        "/history" => return SlashAction::History,

        "/clear" => {
            // Clear screen, cursor to top-left.
            eprint!("\x1B[2J\x1B[1;1H");
        }

        "/help" => {
            eprintln!("Commands:");
            eprintln!("  /session <name>  Switch to a named session");
            eprintln!("  /model <name>    Set the model (e.g. codeMITRA)");
            eprintln!("  /reset           Forget this session's conversation");
            eprintln!("  /history         Show the conversation so far");
            eprintln!("  /clear           Clear the screen");
            eprintln!("  /exit, /quit     Exit the chat");
            eprintln!("  /help            Show this help");
        }

        other => {
            eprintln!("Unknown command: {other}  (type /help for a list)");
        }
    }

    SlashAction::Continue
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Output
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn send_message(
    orchestrator: &Arc<TurnOrchestrator>,
    session_key: &str,
    model: &Option<String>,
    user_message: &str,
) {
    let opts = GenerateOptions::with_model(model.clone());
    let turns = orchestrator.respond(session_key, user_message, &opts).await;

    let Some(latest) = turns.last() else {
        return;
    };
    if latest.assistant.starts_with(ERROR_TAG) {
        eprintln!("\x1B[31m{}\x1B[0m", latest.assistant);
    } else {
        println!("{}", latest.assistant);
    }
    println!();
}

fn print_history(turns: &[Turn]) {
    if turns.is_empty() {
        eprintln!("(no messages yet)");
        return;
    }
    for turn in turns {
        println!("you> {}", turn.user);
        println!("{}", turn.assistant);
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str) -> (SlashAction, String, Option<String>) {
        let mut key = "cli:chat".to_string();
        let mut model = None;
        let action = handle_slash_command(input, &mut key, &mut model);
        (action, key, model)
    }

    #[test]
    fn exit_and_quit_stop_the_loop() {
        assert_eq!(run("/exit").0, SlashAction::Exit);
        assert_eq!(run("/quit").0, SlashAction::Exit);
    }

    #[test]
    fn session_switches_key() {
        let (action, key, _) = run("/session  homework ");
        assert_eq!(action, SlashAction::Continue);
        assert_eq!(key, "homework");
    }

    #[test]
    fn session_without_name_keeps_key() {
        let (_, key, _) = run("/session");
        assert_eq!(key, "cli:chat");
    }

    #[test]
    fn model_sets_override() {
        let (_, _, model) = run("/model llama3");
        assert_eq!(model.as_deref(), Some("llama3"));
    }

    #[test]
    fn reset_and_history_are_delegated() {
        assert_eq!(run("/reset").0, SlashAction::Reset);
        assert_eq!(run("/history").0, SlashAction::History);
    }

    #[test]
    fn unknown_command_continues() {
        assert_eq!(run("/frobnicate").0, SlashAction::Continue);
    }
}
