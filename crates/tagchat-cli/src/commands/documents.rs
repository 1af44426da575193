//! One-shot commands over document sessions.

use super::Env;
use crate::renderer::{print_notice, print_session};
use anyhow::{Result, bail};
use chrono::Utc;
use colored::Colorize;
use tagchat_application::{DispatchOutcome, SweepReport, elapsed_days};
use tagchat_core::host::Document;

pub async fn open(env: &Env, path: &str) -> Result<()> {
    let app = env.start().await?;
    let doc = Document::from_path(path);

    match app.dispatcher().dispatch(Some(&doc)).await {
        DispatchOutcome::Skipped(reason) => {
            println!("{}", format!("No session for {}: {}", doc.name, reason).bright_black());
        }
        DispatchOutcome::CacheHit(session) => print_session(&session),
        DispatchOutcome::Created { session, failure } => {
            print_session(&session);
            if let Some(failure) = failure {
                print_notice(&failure.notice());
            }
        }
    }

    app.shutdown().await?;
    Ok(())
}

pub async fn send(env: &Env, path: &str, text: &str) -> Result<()> {
    let app = env.start().await?;
    let doc = Document::from_path(path);

    let result = app.conversation().append_user_turn(doc.key(), text).await;
    let (session, failure) = match result {
        Ok(reply) => reply,
        Err(err) if err.is_not_found() => {
            bail!("No session for {}; open it first", doc.name)
        }
        Err(err) => return Err(err.into()),
    };

    print_session(&session);
    if let Some(failure) = failure {
        print_notice(&failure.notice());
    }

    app.shutdown().await?;
    Ok(())
}

pub async fn show(env: &Env, path: &str) -> Result<()> {
    let app = env.start().await?;
    let doc = Document::from_path(path);

    match app.conversation().current_session(doc.key()).await {
        Some(session) => print_session(&session),
        None => println!("{}", format!("No session for {}", doc.name).bright_black()),
    }

    app.shutdown().await?;
    Ok(())
}

pub async fn list(env: &Env) -> Result<()> {
    let app = env.start().await?;
    let sessions = app.store().snapshot().await;

    if sessions.is_empty() {
        println!("{}", "No sessions".bright_black());
    }
    let now = Utc::now();
    for session in &sessions {
        println!(
            "{}  {} turns, updated {} ({} day(s) ago)",
            session.key.bold(),
            session.turns.len(),
            session.last_updated.format("%Y-%m-%d %H:%M"),
            elapsed_days(session.last_updated, now)
        );
    }

    app.shutdown().await?;
    Ok(())
}

/// Sweeps on start (as every command does) and again on demand, then
/// reports both passes.
pub async fn sweep(env: &Env) -> Result<()> {
    let app = env.start().await?;
    let again = app.sweeper().sweep().await;

    let mut evicted = app.boot_sweep().evicted.clone();
    evicted.extend(again.evicted);
    print_sweep(&SweepReport {
        examined: app.boot_sweep().examined,
        evicted,
    });

    app.shutdown().await?;
    Ok(())
}

pub fn print_sweep(report: &SweepReport) {
    println!(
        "Examined {} session(s), evicted {}",
        report.examined,
        report.evicted.len()
    );
    for key in &report.evicted {
        println!("  {}", key.red());
    }
}
