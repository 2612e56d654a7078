use crate::config::Config;
use crate::core::keychain;
use dialoguer::{Confirm, Password, theme::ColorfulTheme};

use super::LoginArgs;

pub fn auth_login(args: LoginArgs, config: &Config) -> anyhow::Result<()> {
    let api_key = match args.api_key {
        Some(key) => validate_api_key(&key)?,
        None => prompt_api_key()?,
    };

    keychain::store_gemini_key(&api_key)?;

    println!("Stored Gemini API key in system keychain");
    if std::env::var(&config.gemini.api_key_env).is_ok() {
        println!(
            "Note: {} is set and takes precedence over the keychain",
            config.gemini.api_key_env
        );
    }

    Ok(())
}

pub fn auth_logout() -> anyhow::Result<()> {
    if keychain::gemini_key().is_none() {
        println!("No API key stored");
        return Ok(());
    }

    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Remove the stored Gemini API key?")
        .default(true)
        .interact()?;

    if confirmed {
        if keychain::forget_gemini_key()? {
            println!("Removed API key from system keychain");
        } else {
            println!("No API key stored");
        }
    }

    Ok(())
}

fn validate_api_key(key: &str) -> anyhow::Result<String> {
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("API key cannot be empty");
    }
    if key.chars().any(char::is_whitespace) {
        anyhow::bail!("API key must not contain whitespace");
    }
    Ok(key.to_string())
}

fn prompt_api_key() -> anyhow::Result<String> {
    let api_key = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Enter Gemini API key")
        .interact()?;

    validate_api_key(&api_key)
}
