//! Interactive chat view on top of rustyline.

use super::Env;
use super::documents::print_sweep;
use crate::renderer::TerminalRenderer;
use anyhow::Result;
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::sync::Arc;
use tagchat_application::{DispatchOutcome, TagchatApp};
use tagchat_core::TagchatError;
use tagchat_core::host::Document;

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Open(&'a str),
    Sweep,
    Toggle,
    Help,
    Unknown(&'a str),
    Message(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return Input::Message(line);
    };
    let (name, argument) = match command.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (command, ""),
    };
    match name {
        "quit" | "exit" => Input::Quit,
        "open" if !argument.is_empty() => Input::Open(argument),
        "sweep" => Input::Sweep,
        "toggle" => Input::Toggle,
        "help" => Input::Help,
        _ => Input::Unknown(trimmed),
    }
}

fn print_help() {
    println!(
        "{}",
        "Enter sends a message. /open <doc> opens a document, /sweep evicts stale sessions, /toggle switches tag dispatch, /quit saves and exits."
            .bright_black()
    );
}

pub async fn run(env: &Env, doc: Option<&str>) -> Result<()> {
    let app = env.start().await?;
    let view = app.open_view(Arc::new(TerminalRenderer::new()));

    if let Some(path) = doc {
        open_document(&app, path).await;
    }

    println!("{}", "=== tagchat ===".bright_magenta().bold());
    print_help();

    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline(">> ") {
            Ok(line) => match parse_input(&line) {
                Input::Quit => break,
                Input::Open(path) => open_document(&app, path).await,
                Input::Sweep => print_sweep(&app.sweeper().sweep().await),
                Input::Toggle => {
                    let active = app.dispatcher().toggle();
                    println!("Tag dispatch {}", if active { "on" } else { "off" });
                }
                Input::Help => print_help(),
                Input::Unknown(command) => {
                    println!("{}", format!("Unknown command: {command}").bright_black())
                }
                Input::Message(text) => {
                    let _ = rl.add_history_entry(text);
                    match view.send(text).await {
                        // failures were already shown as notices
                        Ok(_) | Err(TagchatError::EmptyInput) => {}
                        Err(err) => eprintln!("{}", format!("Error: {err}").red()),
                    }
                }
            },
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    app.shutdown().await?;
    println!("{}", "Saved. Goodbye!".bright_green());
    Ok(())
}

async fn open_document(app: &TagchatApp, path: &str) {
    let doc = Document::from_path(path);
    if let DispatchOutcome::Skipped(reason) = app.dispatcher().dispatch(Some(&doc)).await {
        println!("{}", format!("No session for {}: {}", doc.name, reason).bright_black());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("/quit"), Input::Quit);
        assert_eq!(parse_input(" /open  Notes.md "), Input::Open("Notes.md"));
        assert_eq!(parse_input("/open"), Input::Unknown("/open"));
        assert_eq!(parse_input("/sweep"), Input::Sweep);
        assert_eq!(parse_input("/nope"), Input::Unknown("/nope"));
        assert_eq!(parse_input("hello"), Input::Message("hello"));
        assert_eq!(parse_input(""), Input::Message(""));
    }
}
