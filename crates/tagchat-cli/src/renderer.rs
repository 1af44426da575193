//! Terminal rendering of sessions and notices.

use colored::Colorize;
use std::sync::Mutex;
use tagchat_application::ViewRenderer;
use tagchat_core::notice::Notice;
use tagchat_core::session::{Role, Session, Turn};

/// Prints turns as `Role:` followed by the content lines.
///
/// Only turns not yet printed for the same session are written, so a
/// session pushed twice (before and after the reply) prints each turn once.
#[derive(Default)]
pub struct TerminalRenderer {
    printed: Mutex<Option<(String, usize)>>,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ViewRenderer for TerminalRenderer {
    fn render_session(&self, session: &Session) {
        let mut printed = self
            .printed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let start = match printed.as_ref() {
            Some((key, count)) if *key == session.key && *count <= session.turns.len() => *count,
            _ => {
                print_header(session);
                0
            }
        };
        for turn in &session.turns[start..] {
            print_turn(turn);
        }
        *printed = Some((session.key.clone(), session.turns.len()));
    }

    fn render_notice(&self, notice: &Notice) {
        print_notice(notice);
    }
}

pub fn print_header(session: &Session) {
    let title = if session.is_detached() {
        "(last active)"
    } else {
        session.key.as_str()
    };
    println!("{}", format!("=== {title} ===").bright_magenta().bold());
}

pub fn print_turn(turn: &Turn) {
    let label = format!("{}:", turn.role.display_name());
    let label = match turn.role {
        Role::System => label.bright_black(),
        Role::User => label.green(),
        Role::Assistant => label.bright_blue(),
    };
    println!("{}", label.bold());
    for line in turn.content.lines() {
        println!("{line}");
    }
    println!();
}

pub fn print_session(session: &Session) {
    print_header(session);
    for turn in &session.turns {
        print_turn(turn);
    }
}

pub fn print_notice(notice: &Notice) {
    eprintln!("{}", notice.to_string().yellow());
}
