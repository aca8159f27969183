//! Place-name extraction.
//!
//! Place names are found from capitalization and a handful of prepositions.
//! A prepositional match ("in Fremont", "for Cape Town") wins over a bare
//! capitalized run ("Do I need umbrella Newark?"), and a lowercase
//! prepositional phrase ("weather in fremont") is the last resort.

use serde::{Deserialize, Serialize};

use crate::lexicon::{is_stopword, PLACE_PREPOSITIONS};

/// Lowercase words allowed inside a multi-word place name.
const CONNECTORS: &[&str] = &["de", "del", "da", "la", "le", "upon", "of", "on"];

/// Abbreviations that lead a place name and keep their period: "St. Louis".
const NAME_ABBREVIATIONS: &[&str] = &["st", "ste", "mt", "ft", "pt"];

/// Most words taken from an all-lowercase prepositional phrase.
const MAX_LOWERCASE_WORDS: usize = 3;

/// Where a location came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    /// Introduced by a preposition in the message
    Explicit,
    /// A capitalized name elsewhere in the message
    Inferred,
    /// Configured default location
    Default,
    /// Carried over from earlier in the conversation
    Remembered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationMatch {
    pub name: String,
    pub source: LocationSource,
}

impl LocationMatch {
    pub fn new(name: impl Into<String>, source: LocationSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    word: String,
    comma: bool,
    /// Ends with sentence punctuation such as `?`
    terminal: bool,
}

impl Token {
    fn lower(&self) -> String {
        self.word.to_ascii_lowercase()
    }

    fn is_name_word(&self) -> bool {
        !self.comma
            && self
                .word
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_uppercase())
            && !is_stopword(&self.word)
    }

    fn is_plain_word(&self) -> bool {
        !self.comma
            && !self.word.is_empty()
            && self.word.chars().all(|c| c.is_ascii_alphabetic() || c == '-' || c == '.')
            && !is_stopword(&self.word)
    }
}

fn tokenize(text: &str) -> Vec<Token> {
    let spaced = text.replace(',', " , ");
    let mut tokens = Vec::new();

    for raw in spaced.split_whitespace() {
        if raw == "," {
            tokens.push(Token {
                word: String::new(),
                comma: true,
                terminal: false,
            });
            continue;
        }

        let mut terminal = raw.ends_with(['?', '!', '.', ';', ':']);
        let mut word = raw
            .trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '\'' && c != '-')
            .trim_matches('-')
            .to_string();
        if let Some(stripped) = word.strip_suffix("'s") {
            word = stripped.to_string();
        }
        word = word.trim_matches('\'').to_string();
        if word.is_empty() {
            continue;
        }
        if raw.ends_with('.') && is_name_abbreviation(&word) {
            word.push('.');
            terminal = false;
        }

        tokens.push(Token {
            word,
            comma: false,
            terminal,
        });
    }

    tokens
}

/// Collect a capitalized run starting at `start`. Returns the name and the
/// index after the run, or `None` if no name word starts there.
fn capitalized_run(tokens: &[Token], start: usize) -> Option<(String, usize)> {
    let first = tokens.get(start)?;
    if !first.is_name_word() {
        return None;
    }

    let mut words = vec![first.word.clone()];
    let mut i = start + 1;
    let mut stopped = first.terminal;

    while !stopped && i < tokens.len() {
        let tok = &tokens[i];
        if tok.is_name_word() {
            words.push(tok.word.clone());
            stopped = tok.terminal;
            i += 1;
        } else if CONNECTORS.contains(&tok.lower().as_str())
            && tokens.get(i + 1).is_some_and(Token::is_name_word)
        {
            words.push(tok.word.clone());
            i += 1;
        } else {
            break;
        }
    }

    let mut name = words.join(" ");

    // A single qualifier after a comma: "Newark, CA", "Paris, France"
    if !stopped && tokens.get(i).is_some_and(|t| t.comma) {
        let mut qualifier = Vec::new();
        let mut j = i + 1;
        while let Some(tok) = tokens.get(j) {
            if !tok.is_name_word() && !is_region_code(&tok.word) {
                break;
            }
            qualifier.push(tok.word.clone());
            j += 1;
            if tok.terminal {
                break;
            }
        }
        if !qualifier.is_empty() {
            name = format!("{}, {}", name, qualifier.join(" "));
            i = j;
        }
    }

    Some((name, i))
}

fn is_name_abbreviation(word: &str) -> bool {
    word.starts_with(|c: char| c.is_ascii_uppercase())
        && NAME_ABBREVIATIONS.contains(&word.to_ascii_lowercase().as_str())
}

/// Two-letter uppercase codes such as "CA" or "UK" (stopword check aside).
fn is_region_code(word: &str) -> bool {
    word.len() == 2 && word.chars().all(|c| c.is_ascii_uppercase())
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Extract a place name from a normalized message.
pub fn extract_location(text: &str) -> Option<LocationMatch> {
    let tokens = tokenize(text);

    // 1. "in Fremont", "for Cape Town tonight"
    for (i, tok) in tokens.iter().enumerate() {
        if tok.comma || tok.terminal || !PLACE_PREPOSITIONS.contains(&tok.lower().as_str()) {
            continue;
        }
        if let Some((name, _)) = capitalized_run(&tokens, i + 1) {
            return Some(LocationMatch::new(name, LocationSource::Explicit));
        }
    }

    // 2. Last capitalized run anywhere: "Do I need umbrella Newark?"
    let mut last = None;
    let mut i = 0;
    while i < tokens.len() {
        match capitalized_run(&tokens, i) {
            Some((name, next)) => {
                last = Some(name);
                i = next.max(i + 1);
            }
            None => i += 1,
        }
    }
    if let Some(name) = last {
        return Some(LocationMatch::new(name, LocationSource::Inferred));
    }

    // 3. Lowercase typing: "weather in fremont tomorrow"
    for (i, tok) in tokens.iter().enumerate() {
        if tok.comma || tok.terminal || !PLACE_PREPOSITIONS.contains(&tok.lower().as_str()) {
            continue;
        }
        let mut words = Vec::new();
        for next in tokens.iter().skip(i + 1).take(MAX_LOWERCASE_WORDS) {
            if !next.is_plain_word() {
                break;
            }
            words.push(title_case(&next.word));
            if next.terminal {
                break;
            }
        }
        if !words.is_empty() {
            return Some(LocationMatch::new(words.join(" "), LocationSource::Inferred));
        }
    }

    None
}
