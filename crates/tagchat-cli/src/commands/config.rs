//! Settings commands.

use super::Env;
use crate::ConfigField;
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use tagchat_core::config::{Settings, normalize_tag};

pub async fn show(env: &Env) -> Result<()> {
    let app = env.start().await?;
    print_settings(&app.settings().settings());
    println!("{} {}", "state file:".bright_black(), env.state_file.display());
    Ok(())
}

pub async fn set(env: &Env, field: ConfigField, value: &str) -> Result<()> {
    let app = env.start().await?;
    let settings = app.settings();

    match field {
        ConfigField::ApiKey => settings.set_api_key(value).await?,
        ConfigField::Tags => settings.set_tags_csv(value).await?,
        ConfigField::Templates => settings.set_template_paths_csv(value).await?,
        ConfigField::Behavior => settings.set_system_behavior(value).await?,
        ConfigField::Retention => {
            settings.set_retention_days_str(value).await?;
        }
        ConfigField::Model => settings.set_model(value).await?,
    }

    print_settings(&settings.settings());
    app.shutdown().await?;
    Ok(())
}

pub fn import(env: &Env, path: &Path) -> Result<()> {
    let imported = env
        .repository()
        .import_legacy(path)
        .with_context(|| format!("Failed to import {}", path.display()))?;

    println!(
        "Imported {} session(s) into {}",
        imported.sessions.len(),
        env.state_file.display()
    );
    print_settings(&imported.settings);
    Ok(())
}

fn print_settings(settings: &Settings) {
    let row = |name: &str, value: String| println!("{:>16} {}", name.bright_black(), value);

    row("api_key", mask(&settings.api_key));
    row("model", settings.model.clone());
    for (index, binding) in settings.tag_bindings().iter().enumerate() {
        let template = binding.template_path.as_deref().unwrap_or("(missing)");
        row(&format!("binding {}", index + 1), format!("#{} -> {}", normalize_tag(&binding.tag), template));
    }
    row("system_behavior", settings.system_behavior.clone());
    row("retention_days", settings.retention_days.to_string());
    row(
        "last_active",
        format!("{} turn(s)", settings.last_active.turns.len()),
    );
}

fn mask(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    match chars.len() {
        0 => "(not set)".to_string(),
        n if n <= 8 => "*".repeat(n),
        n => {
            let head: String = chars[..3].iter().collect();
            let tail: String = chars[n - 4..].iter().collect();
            format!("{head}...{tail}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_hides_the_middle() {
        assert_eq!(mask(""), "(not set)");
        assert_eq!(mask("short"), "*****");
        assert_eq!(mask("sk-abcdefghijkl"), "sk-...ijkl");
    }
}
