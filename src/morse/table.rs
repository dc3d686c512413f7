//! Static character-to-Morse symbol table.
//!
//! Covers the letters A-Z, the digits 0-9 and the space character. The space
//! maps to the word separator `/` so that encoding a sentence keeps its word
//! boundaries.

/// Every character the table knows about, paired with its Morse token.
///
/// Order is alphabetical, then digits, then space.
pub const SYMBOL_TABLE: [(char, &str); 37] = [
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
    ('0', "-----"),
    ('1', ".----"),
    ('2', "..---"),
    ('3', "...--"),
    ('4', "....-"),
    ('5', "....."),
    ('6', "-...."),
    ('7', "--..."),
    ('8', "---.."),
    ('9', "----."),
    (' ', "/"),
];

/// Looks up the Morse token for an already upper-cased character.
///
/// Returns `None` for anything outside the table; callers drop those
/// characters rather than substituting a placeholder.
#[must_use]
pub fn lookup(c: char) -> Option<&'static str> {
    SYMBOL_TABLE
        .iter()
        .find(|(key, _)| *key == c)
        .map(|(_, token)| *token)
}
