use anyhow::{anyhow, Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use sha2::{Digest, Sha256};
use std::io::{self, BufRead, IsTerminal, Write};

use crate::db::{AuthOutcome, Database};

pub const PASSWORD_ENV: &str = "SCOUT_PASSWORD";

/// Lowercase hex SHA-256 of the master password.
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[derive(Debug, PartialEq, Eq)]
enum Entry {
    Typing,
    Done,
    Cancelled,
}

fn apply_key(buffer: &mut String, key: KeyEvent) -> Entry {
    match key.code {
        KeyCode::Enter => Entry::Done,
        KeyCode::Esc => Entry::Cancelled,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Entry::Cancelled,
        KeyCode::Char(c) => {
            buffer.push(c);
            Entry::Typing
        }
        KeyCode::Backspace => {
            buffer.pop();
            Entry::Typing
        }
        _ => Entry::Typing,
    }
}

fn read_keys() -> Result<String> {
    let mut password = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match apply_key(&mut password, key) {
            Entry::Typing => {}
            Entry::Done => return Ok(password),
            Entry::Cancelled => return Err(anyhow!("Password entry cancelled")),
        }
    }
}

/// Reads a line from the terminal with echo off.
fn read_hidden() -> Result<String> {
    enable_raw_mode()?;
    let result = read_keys();
    disable_raw_mode()?;
    eprintln!();
    result
}

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    eprint!("Master password: ");
    io::stderr().flush()?;
    if io::stdin().is_terminal() {
        return read_hidden();
    }
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Gate for every command that touches searches.
pub fn require_auth(db: &Database) -> Result<()> {
    let password = read_password()?;
    if password.is_empty() {
        return Err(anyhow!("A master password is required"));
    }
    match db.check_master_password(&hash_password(&password))? {
        AuthOutcome::Initialized => {
            eprintln!("Master password set.");
            Ok(())
        }
        AuthOutcome::Accepted => Ok(()),
        AuthOutcome::Rejected => Err(anyhow!("Invalid password")),
    }
}
