//! Glyph codec for fixed-capacity name arrays.
//!
//! Names are stored in the record table as a brace-delimited list of charmap
//! macros, e.g. `{_P, _o, _t, _i, _o, _n, _END}`. A name holds at most
//! [`NAME_CAPACITY`] glyphs followed by the `_END` sentinel. Some words have a
//! dedicated multi-token compression that occupies a single glyph slot.
//!
//! Neither direction fails: unknown characters degrade to quoted
//! single-character tokens and decoding never yields more than
//! [`NAME_CAPACITY`] glyphs.

use itemdex_core::NAME_CAPACITY;

/// Marks the intentional end of a name.
pub const SENTINEL: &str = "_END";

/// Literal space.
pub const SPACE_TOKEN: &str = "_SPACE";

/// Punctuation and accent tokens, valid in both directions.
const PUNCTUATION: &[(&str, char)] = &[
    ("_PERIOD", '.'),
    ("_HYPHEN", '-'),
    ("_APOSTROPHE", '\''),
    ("_EXCLAMATION", '!'),
    ("_QUESTION", '?'),
    ("_eACUTE", 'é'),
    ("_NEWLINE", '\n'),
    ("_AT", '@'),
];

/// A reserved word that encodes to a fixed token run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionPattern {
    pub word: &'static str,
    pub tokens: &'static [&'static str],
}

/// Checked in this order; the first match wins.
pub const COMPRESSION_PATTERNS: &[CompressionPattern] = &[
    CompressionPattern {
        word: "Pokeblock",
        tokens: &["_PO", "_KE", "_BL", "_OC", "_OK"],
    },
    CompressionPattern {
        word: "Pokéblock",
        tokens: &["_P", "_o", "_k", "_eACUTE", "_BL", "_OC", "_OK"],
    },
];

// ============================================================================
// DECODE
// ============================================================================

/// Decode a comma-separated token list into display text.
pub fn decode(token_text: &str) -> String {
    decode_glyphs(token_text).concat().trim().to_string()
}

/// Decode into individual glyphs (a compressed word counts as one glyph).
pub fn decode_glyphs(token_text: &str) -> Vec<String> {
    let tokens: Vec<&str> = token_text.split(',').map(str::trim).collect();
    let mut glyphs = Vec::new();
    let mut i = 0;

    while i < tokens.len() && glyphs.len() < NAME_CAPACITY {
        if tokens[i] == SENTINEL {
            break;
        }
        if let Some(pattern) = match_pattern(&tokens[i..]) {
            glyphs.push(pattern.word.to_string());
            i += pattern.tokens.len();
            continue;
        }
        glyphs.push(decode_token(tokens[i]));
        i += 1;
    }

    glyphs
}

fn match_pattern(tokens: &[&str]) -> Option<&'static CompressionPattern> {
    COMPRESSION_PATTERNS
        .iter()
        .find(|p| tokens.len() >= p.tokens.len() && tokens[..p.tokens.len()] == *p.tokens)
}

fn decode_token(token: &str) -> String {
    if token == SPACE_TOKEN {
        return " ".to_string();
    }
    if let Some(&(_, c)) = PUNCTUATION.iter().find(|(t, _)| *t == token) {
        return c.to_string();
    }

    let chars: Vec<char> = token.chars().collect();
    if chars.len() == 3 && chars[0] == '\'' {
        return chars[1].to_string();
    }
    if chars.first() == Some(&'_') {
        if chars.len() == 2 {
            return chars[1].to_string();
        }
        return capitalize(&chars[1..]);
    }
    token.trim_matches('_').to_string()
}

fn capitalize(chars: &[char]) -> String {
    let mut iter = chars.iter();
    match iter.next() {
        Some(first) => first
            .to_uppercase()
            .chain(iter.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

// ============================================================================
// ENCODE
// ============================================================================

/// Encode display text as `", "`-joined tokens ending in the sentinel.
pub fn encode(text: &str) -> String {
    encode_tokens(text).join(", ")
}

/// Encode display text into at most `NAME_CAPACITY` tokens plus the sentinel.
pub fn encode_tokens(text: &str) -> Vec<String> {
    for pattern in COMPRESSION_PATTERNS {
        if let Some(rest) = text.strip_prefix(pattern.word) {
            let mut tokens: Vec<String> = pattern.tokens.iter().map(|t| t.to_string()).collect();
            let mut suffix = encode_tokens(rest);
            suffix.pop();
            tokens.extend(suffix);
            tokens.truncate(NAME_CAPACITY);
            tokens.push(SENTINEL.to_string());
            return tokens;
        }
    }

    let mut tokens = Vec::new();
    for ch in text.chars().filter(|c| is_encodable(*c)) {
        tokens.push(encode_char(ch));
        if tokens.len() > NAME_CAPACITY {
            tokens.truncate(NAME_CAPACITY);
        }
    }
    tokens.push(SENTINEL.to_string());
    tokens
}

/// Commas and backslashes cannot survive inside a quoted token; control
/// characters other than newline have no glyph.
fn is_encodable(ch: char) -> bool {
    match ch {
        ',' | '\\' => false,
        '\n' => true,
        c => !c.is_control(),
    }
}

fn encode_char(ch: char) -> String {
    if ch == ' ' {
        return SPACE_TOKEN.to_string();
    }
    if let Some(&(token, _)) = PUNCTUATION.iter().find(|(_, c)| *c == ch) {
        return token.to_string();
    }
    if ch.is_ascii_digit() || ch.is_alphabetic() {
        return format!("_{}", ch);
    }
    format!("'{}'", ch)
}

/// Pass text through the codec so it matches what a save would write back.
pub fn normalize(text: &str) -> String {
    decode(&encode(text))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_simple_name() {
        assert_eq!(decode("_H,_I,_END"), "HI");
        assert_eq!(decode("_H, _i, _END"), "Hi");
    }

    #[test]
    fn test_decode_token_categories() {
        assert_eq!(decode("_SPACE, _A, _SPACE, _END"), "A");
        assert_eq!(decode("_A, _SPACE, _B"), "A B");
        assert_eq!(decode("_A, _PERIOD, _eACUTE"), "A.é");
        assert_eq!(decode("'x', '#'"), "x#");
        assert_eq!(decode("_PO, _X"), "PoX");
        assert_eq!(decode("_BALL_"), "Ball_");
        assert_eq!(decode("__odd__, PLAIN"), "_odd__PLAIN");
        assert_eq!(decode("RAW_"), "RAW");
    }

    #[test]
    fn test_decode_stops_at_sentinel() {
        assert_eq!(decode("_A, _END, _B, _C"), "A");
    }

    #[test]
    fn test_decode_caps_glyphs_without_sentinel() {
        let tokens = vec!["_A"; 20].join(", ");
        assert_eq!(decode(&tokens), "A".repeat(NAME_CAPACITY));
    }

    #[test]
    fn test_decode_compression_counts_one_glyph() {
        let glyphs = decode_glyphs("_PO, _KE, _BL, _OC, _OK, _SPACE, _C, _a, _s, _e, _END");
        assert_eq!(glyphs.len(), 6);
        assert_eq!(glyphs.concat(), "Pokeblock Case");

        let accented = decode("_P, _o, _k, _eACUTE, _BL, _OC, _OK, _END");
        assert_eq!(accented, "Pokéblock");
    }

    #[test]
    fn test_encode_simple_name() {
        assert_eq!(encode("Hi"), "_H, _i, _END");
        assert_eq!(encode("X-9!"), "_X, _HYPHEN, _9, _EXCLAMATION, _END");
        assert_eq!(encode("a#"), "_a, '#', _END");
    }

    #[test]
    fn test_encode_drops_unquotable_characters() {
        assert_eq!(encode("a,b\\c\t"), "_a, _b, _c, _END");
        assert_eq!(normalize("Ball, Ultra"), "Ball Ultra");
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode_tokens(""), vec![SENTINEL.to_string()]);
    }

    #[test]
    fn test_encode_truncates_to_capacity() {
        let tokens = encode_tokens("ABCDEFGHIJKLMNOP");
        assert_eq!(tokens.len(), NAME_CAPACITY + 1);
        assert_eq!(tokens[NAME_CAPACITY - 1], "_M");
        assert_eq!(tokens.last().map(String::as_str), Some(SENTINEL));
    }

    #[test]
    fn test_encode_pokeblock_case() {
        let tokens = encode_tokens("Pokeblock Case");
        assert_eq!(
            tokens,
            vec!["_PO", "_KE", "_BL", "_OC", "_OK", "_SPACE", "_C", "_a", "_s", "_e", "_END"]
        );
        assert_eq!(decode(&encode("Pokeblock Case")), "Pokeblock Case");
    }

    #[test]
    fn test_encode_compressed_prefix_respects_capacity() {
        let tokens = encode_tokens("PokeblockABCDEFGHIJ");
        assert_eq!(tokens.len(), NAME_CAPACITY + 1);
        assert_eq!(tokens.iter().filter(|t| *t == SENTINEL).count(), 1);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Potion "), "Potion");
        assert_eq!(normalize("ABCDEFGHIJKLMNOP"), "ABCDEFGHIJKLM");
    }
}
