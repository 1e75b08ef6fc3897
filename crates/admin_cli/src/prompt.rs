//! Hidden password entry on the controlling terminal.

use std::{error::Error, io::Write};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    style::Print,
    terminal::{self, ClearType},
};

type PromptResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

const ATTEMPTS: usize = 3;

/// Raw mode for as long as the value lives.
struct RawMode;

impl RawMode {
    fn enable() -> PromptResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn say(out: &mut impl Write, line: &str) -> PromptResult<()> {
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(line)
    )?;
    out.flush()?;
    Ok(())
}

/// Read one line without echoing it. Each typed character shows as `*`.
fn read_hidden(prompt: &str) -> PromptResult<String> {
    let _raw = RawMode::enable()?;
    let mut out = std::io::stderr();
    say(&mut out, prompt)?;

    let mut typed = String::new();
    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => break,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                return Err("interrupted".into());
            }
            KeyCode::Backspace if typed.pop().is_some() => {
                execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                typed.push(ch);
                execute!(out, Print("*"))?;
            }
            _ => continue,
        }
        out.flush()?;
    }

    execute!(out, Print("\r\n"))?;
    Ok(typed)
}

/// Ask for a new password and its confirmation until both match.
///
/// Returns both entries; length rules are checked at sign-up.
pub fn new_password() -> PromptResult<(String, String)> {
    let mut out = std::io::stderr();
    for _ in 0..ATTEMPTS {
        let password = read_hidden("Password: ")?;
        if password.is_empty() {
            say(&mut out, "Password must not be empty.\r\n")?;
            continue;
        }
        let confirmation = read_hidden("Confirm password: ")?;
        if password == confirmation {
            return Ok((password, confirmation));
        }
        say(&mut out, "Passwords do not match. Try again.\r\n")?;
    }
    Err("too many attempts".into())
}
