//! Text to Morse encoding.
//!
//! [`encode`] is a pure function: it upper-cases its input, maps every
//! character through the static [`SYMBOL_TABLE`], silently drops characters
//! the table doesn't know and joins the surviving tokens with single spaces.
//!
//! The result is a [`MorseString`], which only ever contains the four glyphs
//! `.`, `-`, ` ` and `/`.

mod table;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use table::{lookup, SYMBOL_TABLE};

/// One glyph of an encoded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// Short pulse (`.`).
    Dot,
    /// Long pulse (`-`).
    Dash,
    /// Boundary between two letters (` `).
    LetterGap,
    /// Boundary between two words (`/`).
    WordGap,
}

impl Token {
    /// Parses a single glyph.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '.' => Some(Self::Dot),
            '-' => Some(Self::Dash),
            ' ' => Some(Self::LetterGap),
            '/' => Some(Self::WordGap),
            _ => None,
        }
    }

    /// Returns the glyph for this token.
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::Dot => '.',
            Self::Dash => '-',
            Self::LetterGap => ' ',
            Self::WordGap => '/',
        }
    }

    /// True for tokens that produce a vibration pulse.
    #[must_use]
    pub fn is_pulse(self) -> bool {
        matches!(self, Self::Dot | Self::Dash)
    }
}

/// An encoded message.
///
/// Every character is one of `.`, `-`, ` ` or `/`. Construct one with
/// [`encode`] or parse an existing Morse string with [`str::parse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MorseString(String);

impl MorseString {
    /// Returns the encoded text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when nothing survived encoding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the tokens left to right.
    pub fn tokens(&self) -> impl Iterator<Item = Token> + '_ {
        // Construction guarantees every char is a valid glyph.
        self.0.chars().filter_map(Token::from_char)
    }

    /// Number of dots and dashes, i.e. how many pulses playback will issue.
    #[must_use]
    pub fn pulse_count(&self) -> usize {
        self.tokens().filter(|t| t.is_pulse()).count()
    }
}

impl fmt::Display for MorseString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MorseString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<MorseString> for String {
    fn from(value: MorseString) -> Self {
        value.0
    }
}

/// Error returned when parsing text that contains non-Morse characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMorseError {
    /// The offending character.
    pub found: char,
    /// Byte offset of the offending character.
    pub position: usize,
}

impl fmt::Display for ParseMorseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid Morse glyph {:?} at position {}; expected '.', '-', ' ' or '/'",
            self.found, self.position
        )
    }
}

impl std::error::Error for ParseMorseError {}

impl FromStr for MorseString {
    type Err = ParseMorseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((position, found)) = s.char_indices().find(|(_, c)| Token::from_char(*c).is_none()) {
            return Err(ParseMorseError { found, position });
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for MorseString {
    type Error = ParseMorseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Encodes text as Morse.
///
/// Input is upper-cased first, so encoding is case-insensitive. Characters
/// without a table entry contribute nothing, not even a separator: `"A!B"`
/// encodes to `".- -..."`. Empty input, or input made only of unknown
/// characters, yields an empty [`MorseString`].
#[must_use]
pub fn encode(input: &str) -> MorseString {
    let encoded = input
        .to_uppercase()
        .chars()
        .filter_map(lookup)
        .collect::<Vec<_>>()
        .join(" ");

    debug!(
        input_chars = input.chars().count(),
        output_len = encoded.len(),
        "Encoded message"
    );

    MorseString(encoded)
}
