mod commands;
mod helper;
mod logging;
mod render;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result, anyhow};
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;

use commands::{COMMANDS, Command};
use empamind_application::{ConversationStore, SendOutcome, StoreOptions};
use empamind_core::auth::AuthSession;
use empamind_core::conversation::{AudioClip, AudioFormat, RejectReason};
use empamind_infrastructure::{ConfigService, EmpaMindPaths, TokenAuthSession, transport_from_config};
use helper::CliHelper;

/// Entry point for the EmpaMind REPL.
///
/// Loads configuration, picks the HTTP or demo transport, wires the
/// conversation store and runs a rustyline loop. Store events are rendered
/// by a background task so streaming replies appear while the prompt waits.
#[tokio::main]
async fn main() -> Result<()> {
    let paths = EmpaMindPaths::new(None);
    let _log_guard = logging::init_logging(&paths.log_dir()?)?;

    let config_service = ConfigService::new_default()?;
    tracing::info!("[Main] Loading config from {}", config_service.path().display());
    let config = config_service.load()?;
    let auth = Arc::new(TokenAuthSession::from_config(&config));
    let transport = transport_from_config(&config, auth.clone());
    let store = Arc::new(ConversationStore::with_options(
        transport,
        auth.clone(),
        StoreOptions::from_config(&config),
    ));

    let renderer = tokio::spawn(render::run(store.subscribe()));

    println!("{}", "=== EmpaMind ===".bright_magenta().bold());
    if !store.mode().is_remote() {
        println!(
            "{}",
            "Demo mode: no API endpoint configured, replies are canned.".yellow()
        );
    } else if let Some(user) = auth.current_user().await {
        println!("{}", format!("Signed in as {}", user.username).bright_green());
    } else {
        println!(
            "{}",
            "Not signed in. Set EMPAMIND_ID_TOKEN to reach your chats.".yellow()
        );
    }
    println!(
        "{}",
        "Type a message to talk, /help for commands, /quit to exit.".bright_black()
    );
    println!();

    store.load_chat_list().await;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let Some(parsed) = commands::parse(&line) else {
                    continue;
                };
                let _ = rl.add_history_entry(&line);

                match parsed {
                    Ok(command) => {
                        if !handle_command(command, &store, &auth).await {
                            println!("{}", "Take care. Goodbye!".bright_green());
                            break;
                        }
                    }
                    Err(usage) => println!("{}", usage.yellow()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    store.shutdown().await;
    renderer.abort();
    Ok(())
}

/// Runs one command. Returns `false` when the REPL should exit.
async fn handle_command(
    command: Command,
    store: &Arc<ConversationStore>,
    auth: &Arc<TokenAuthSession>,
) -> bool {
    match command {
        Command::Send(text) => {
            let store = store.clone();
            tokio::spawn(async move {
                report(store.send_text(&text).await);
            });
        }
        Command::Voice {
            path,
            response_format,
        } => match load_clip(&path).await {
            Ok(clip) => {
                let store = store.clone();
                tokio::spawn(async move {
                    report(store.send_voice(clip, response_format).await);
                });
            }
            Err(err) => println!("{}", format!("{err:#}").red()),
        },
        Command::NewChat => {
            store.start_new_chat().await;
            println!("{}", "Started a new chat.".bright_black());
        }
        Command::ListChats => {
            if store.mode().is_remote() && !auth.is_authenticated().await {
                println!("{}", "Sign in to see your chats.".yellow());
            } else {
                store.load_chat_list().await;
                let current = store.snapshot().await.chat_id;
                render::print_chat_list(&store.chat_list().await, current.as_deref());
            }
        }
        Command::Select(chat_id) => {
            store.select_chat(&chat_id).await;
            println!("{}", format!("--- {} ---", chat_id).bright_black());
            render::print_conversation(&store.snapshot().await);
        }
        Command::Rename { chat_id, title } => {
            if store.rename_chat(&chat_id, &title).await {
                println!("{}", format!("Renamed {} to \"{}\".", chat_id, title).bright_black());
            }
        }
        Command::Delete(chat_id) => {
            if store.delete_chat(&chat_id).await {
                println!("{}", format!("Deleted {}.", chat_id).bright_black());
            }
        }
        Command::Clear => {
            store.clear_chat().await;
            println!("{}", "Cleared.".bright_black());
        }
        Command::Logout => {
            auth.sign_out().await;
            store.start_new_chat().await;
            println!("{}", "Signed out.".bright_black());
        }
        Command::Help => print_help(),
        Command::Quit => return false,
    }
    true
}

fn report(outcome: SendOutcome) {
    match outcome {
        SendOutcome::Rejected(RejectReason::Busy) => {
            println!("{}", "Still waiting for the previous reply.".yellow());
        }
        SendOutcome::Discarded => {
            println!(
                "{}",
                "A reply arrived for a chat you already left; it was not shown.".bright_black()
            );
        }
        // Errors reach the screen through the store's error events
        SendOutcome::Delivered | SendOutcome::Failed(_) | SendOutcome::Rejected(_) => {}
    }
}

async fn load_clip(path: &Path) -> Result<AudioClip> {
    let format = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(AudioFormat::from_extension)
        .ok_or_else(|| {
            anyhow!(
                "Unsupported audio file {}: use .webm, .ogg, .mp3 or .wav",
                path.display()
            )
        })?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(AudioClip::new(bytes, format))
}

fn print_help() {
    for (name, description) in COMMANDS {
        println!("  {:<8} {}", name.bright_cyan(), description);
    }
}
