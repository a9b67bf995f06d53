//! Input contracts for the three panel fields.
//!
//! Pure functions: raw field text in, wire-ready line or a reason out.
//! The session performs no validation of its own; everything it sends
//! passes through here first (or is a fixed shortcut label).

use thiserror::Error;

/// Which field the text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Exactly one letter A-Z.
    Letter,
    /// One or more letters A-Z.
    Word,
    /// Anything non-empty, sent as typed.
    Manual,
}

impl InputKind {
    pub fn label(self) -> &'static str {
        match self {
            InputKind::Letter => "Letter",
            InputKind::Word => "Word",
            InputKind::Manual => "Command",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Enter a letter first!")]
    EmptyLetter,

    #[error("Enter a word first!")]
    EmptyWord,

    #[error("Enter a command first!")]
    EmptyCommand,

    #[error("Enter one letter only!")]
    TooLong,

    #[error("English letters only (A-Z)!")]
    NotLatinLetters,
}

/// The 26 fixed letter shortcuts, sent verbatim.
pub const SHORTCUTS: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

/// Validate and normalize field text into the line to send.
pub fn validate(kind: InputKind, raw: &str) -> Result<String, InputError> {
    match kind {
        InputKind::Letter => letter(raw),
        InputKind::Word => word(raw),
        InputKind::Manual => manual(raw),
    }
}

fn letter(raw: &str) -> Result<String, InputError> {
    let text = raw.trim().to_uppercase();
    if text.is_empty() {
        return Err(InputError::EmptyLetter);
    }
    if text.chars().count() > 1 {
        return Err(InputError::TooLong);
    }
    if !is_latin_upper(&text) {
        return Err(InputError::NotLatinLetters);
    }
    Ok(text)
}

fn word(raw: &str) -> Result<String, InputError> {
    let text = raw.trim().to_uppercase();
    if text.is_empty() {
        return Err(InputError::EmptyWord);
    }
    if !is_latin_upper(&text) {
        return Err(InputError::NotLatinLetters);
    }
    Ok(text)
}

fn manual(raw: &str) -> Result<String, InputError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(InputError::EmptyCommand);
    }
    Ok(text.to_string())
}

fn is_latin_upper(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_uppercase())
}
