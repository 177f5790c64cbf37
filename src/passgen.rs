//! Password-generation configuration and symbol draw.
//!
//! The symbol alphabet and its rejection-sampled draw are an external
//! collaborator to the vault core; this module is the concrete
//! implementation the CLI needs to actually offer `create`'s
//! optionally-auto-generated password. The part the core cares about
//! is the CONFIG byte layout itself, since that's what the system
//! record encrypts and persists.
//!
//! Uses the ordinary, non-duplicated alphabet rather than reproducing
//! the duplicated-letter alphabet (two `w` for `e`, two `W` for `E`)
//! some legacy generators carry.

use crate::codec::CONFIG_LEN;
use crate::error::{Error, Result};
use crate::rand_source;
use crate::secure::SensitiveBuffer;

pub const MIN_PASSWORD_LEN: u8 = 8;
pub const MAX_PASSWORD_LEN: u8 = 63;

const NUMBERS: &[u8] = b"0123456789";
const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SPECIALS: &[u8] = b"!@#$%^&*()-_=+[]{};:,.<>?/";

/// Password-generation settings: which symbol classes to draw from and
/// how long a generated password should be. This is exactly the CONFIG
/// plaintext encrypted into the system record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PasswordConfig {
    pub use_numbers: bool,
    pub use_letters: bool,
    pub use_specials: bool,
    pub length: u8,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            use_numbers: true,
            use_letters: true,
            use_specials: true,
            length: 20,
        }
    }
}

impl PasswordConfig {
    pub fn encode(&self) -> [u8; CONFIG_LEN] {
        [
            self.use_numbers as u8,
            self.use_letters as u8,
            self.use_specials as u8,
            self.length,
        ]
    }

    pub fn decode(buf: &[u8; CONFIG_LEN]) -> Result<Self> {
        let config = Self {
            use_numbers: buf[0] != 0,
            use_letters: buf[1] != 0,
            use_specials: buf[2] != 0,
            length: buf[3],
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.use_numbers || self.use_letters || self.use_specials) {
            return Err(Error::user("at least one of numbers/letters/specials must be enabled"));
        }
        if self.length < MIN_PASSWORD_LEN || self.length > MAX_PASSWORD_LEN {
            return Err(Error::user(format!(
                "generated password length must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN}"
            )));
        }
        Ok(())
    }

    fn alphabet(&self) -> Vec<u8> {
        let mut alphabet = Vec::new();
        if self.use_numbers {
            alphabet.extend_from_slice(NUMBERS);
        }
        if self.use_letters {
            alphabet.extend_from_slice(LETTERS);
        }
        if self.use_specials {
            alphabet.extend_from_slice(SPECIALS);
        }
        alphabet
    }
}

/// Draw a password of `config.length` printable characters from
/// `config`'s alphabet, via rejection sampling against the random byte
/// source so every symbol in the alphabet is equally likely regardless
/// of the alphabet's size.
pub fn generate(config: &PasswordConfig) -> Result<SensitiveBuffer> {
    config.validate()?;
    let alphabet = config.alphabet();
    let mut out = SensitiveBuffer::acquire(config.length as usize)?;
    let bound = alphabet.len() as u32;
    let limit = (u32::MAX / bound) * bound;

    for slot in out.as_mut_slice().iter_mut() {
        loop {
            let draw = draw_u32()?;
            if draw < limit {
                *slot = alphabet[(draw % bound) as usize];
                break;
            }
        }
    }
    Ok(out)
}

fn draw_u32() -> Result<u32> {
    let bytes: [u8; 4] = rand_source::bytes()?;
    Ok(u32::from_le_bytes(bytes))
}
