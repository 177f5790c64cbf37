//! The interactive terminal collaborator. Prompt mechanics (echo
//! toggling, line reading, yes/no, bounded integers) are an external
//! concern to the vault core — this module supplies the concrete
//! implementation the crate needs to run as a CLI, kept behind the
//! `Prompter` trait so `vault.rs` never depends on a real terminal.
//! `ScriptedPrompter` drives the vault engine in tests.

use crate::error::{Error, Result};
use crate::secure::SensitiveBuffer;

pub trait Prompter {
    /// Read a line of printable text (item names, usernames, other info).
    fn read_line(&mut self, prompt: &str) -> Result<String>;

    /// Read a passphrase with echo suppressed, into sensitive memory.
    fn read_passphrase(&mut self, prompt: &str) -> Result<SensitiveBuffer>;

    /// Read a bounded unsigned integer, re-prompting until a valid value
    /// in `min..=max` is given.
    fn read_bounded_uint(&mut self, prompt: &str, min: u64, max: u64) -> Result<u64>;

    /// Ask a yes/no question with a default taken on an empty answer.
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;

    /// Emit an informational message.
    fn message(&mut self, msg: &str);

    /// Emit a single visible dot, used during authentication backoff.
    fn tick(&mut self);
}

/// Real terminal implementation: line-buffered stdin, echo-suppressed
/// passphrase reads via `rpassword`.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        use std::io::Write;
        print!("{prompt}");
        std::io::stdout().flush().ok();
        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .map_err(|e| Error::internal(format!("reading input: {e}")))?;
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }

    fn read_passphrase(&mut self, prompt: &str) -> Result<SensitiveBuffer> {
        let passphrase =
            rpassword::prompt_password(prompt).map_err(|e| Error::internal(format!("reading passphrase: {e}")))?;
        let buf = SensitiveBuffer::from_bytes(passphrase.as_bytes());
        buf
    }

    fn read_bounded_uint(&mut self, prompt: &str, min: u64, max: u64) -> Result<u64> {
        loop {
            let line = self.read_line(prompt)?;
            match line.trim().parse::<u64>() {
                Ok(v) if v >= min && v <= max => return Ok(v),
                _ => self.message(&format!("Please enter a number between {min} and {max}.")),
            }
        }
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let suffix = if default { "[Y/n]" } else { "[y/N]" };
        let line = self.read_line(&format!("{prompt} {suffix} "))?;
        let trimmed = line.trim().to_ascii_lowercase();
        match trimmed.as_str() {
            "" => Ok(default),
            "y" | "yes" => Ok(true),
            "n" | "no" => Ok(false),
            _ => self.confirm(prompt, default),
        }
    }

    fn message(&mut self, msg: &str) {
        println!("{msg}");
    }

    fn tick(&mut self) {
        use std::io::Write;
        print!(".");
        std::io::stdout().flush().ok();
    }
}

/// Test double: plays back a fixed script of canned answers. Panics if
/// the vault asks for more input than the script provides — that is
/// always a test bug, not a runtime condition.
#[cfg(any(test, feature = "test-support"))]
pub struct ScriptedPrompter {
    lines: std::collections::VecDeque<String>,
    passphrases: std::collections::VecDeque<Vec<u8>>,
    confirms: std::collections::VecDeque<bool>,
    uints: std::collections::VecDeque<u64>,
    pub messages: Vec<String>,
    pub ticks: usize,
}

#[cfg(any(test, feature = "test-support"))]
impl ScriptedPrompter {
    pub fn new() -> Self {
        Self {
            lines: Default::default(),
            passphrases: Default::default(),
            confirms: Default::default(),
            uints: Default::default(),
            messages: Vec::new(),
            ticks: 0,
        }
    }

    pub fn with_lines<S: AsRef<str>>(mut self, lines: impl IntoIterator<Item = S>) -> Self {
        self.lines.extend(lines.into_iter().map(|l| l.as_ref().to_string()));
        self
    }

    pub fn with_passphrases<S: AsRef<str>>(mut self, passphrases: impl IntoIterator<Item = S>) -> Self {
        self.passphrases
            .extend(passphrases.into_iter().map(|p| p.as_ref().as_bytes().to_vec()));
        self
    }

    pub fn with_confirms(mut self, confirms: impl IntoIterator<Item = bool>) -> Self {
        self.confirms.extend(confirms);
        self
    }

    pub fn with_uints(mut self, uints: impl IntoIterator<Item = u64>) -> Self {
        self.uints.extend(uints);
        self
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Prompter for ScriptedPrompter {
    fn read_line(&mut self, _prompt: &str) -> Result<String> {
        self.lines
            .pop_front()
            .ok_or_else(|| Error::internal("ScriptedPrompter: no more scripted lines"))
    }

    fn read_passphrase(&mut self, _prompt: &str) -> Result<SensitiveBuffer> {
        let bytes = self
            .passphrases
            .pop_front()
            .ok_or_else(|| Error::internal("ScriptedPrompter: no more scripted passphrases"))?;
        SensitiveBuffer::from_bytes(&bytes)
    }

    fn read_bounded_uint(&mut self, _prompt: &str, _min: u64, _max: u64) -> Result<u64> {
        self.uints
            .pop_front()
            .ok_or_else(|| Error::internal("ScriptedPrompter: no more scripted uints"))
    }

    fn confirm(&mut self, _prompt: &str, default: bool) -> Result<bool> {
        Ok(self.confirms.pop_front().unwrap_or(default))
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn tick(&mut self) {
        self.ticks += 1;
    }
}
