//! Word lists shared by the extractors.

use chrono::Weekday;

/// Words and phrases that make a message a weather question.
pub const TRIGGER_WORDS: &[&str] = &[
    "weather",
    "rain",
    "raining",
    "rainy",
    "umbrella",
    "sunny",
    "sun",
    "snow",
    "snowing",
    "cold",
    "hot",
    "temperature",
    "forecast",
    "warm",
    "wind",
    "windy",
    "storm",
    "stormy",
    "drizzle",
    "chilly",
    "freezing",
    "jacket",
    "sweater",
    "coat",
    "boots",
    "walk",
    "outside",
    "picnic",
    "go out",
    "going out",
    "nice out",
];

/// Prepositions that usually introduce a place name.
pub const PLACE_PREPOSITIONS: &[&str] = &["in", "near", "around", "at", "for", "to"];

/// Capitalized words that are never part of a place name.
const STOPWORDS: &[&str] = &[
    // pronouns and question words
    "i", "i'm", "i'll", "i've", "im", "we", "you", "it", "it's", "its", "my", "me", "what",
    "what's", "whats", "when", "where", "which", "who", "how", "how's", "why", "will", "would",
    "should", "shall", "could", "can", "do", "does", "did", "is", "are", "am", "was", "be",
    "the", "a", "an", "so", "and", "or", "but", "please", "hello", "hi", "hey", "okay", "ok",
    "yes", "no", "thanks", "thank", "dear", "buddy", "any", "anything", "tell", "give", "show",
    "check", "need", "going", "go", "let", "let's", "there", "there's", "today", "tonight",
    "tomorrow", "now", "later", "this", "next", "weekend", "morning", "afternoon", "evening",
    "night", "noon", "midnight", "here", "looks", "look", "wear", "bring", "take", "want",
    "like", "maybe", "just", "also", "oh", "well", "sure", "good", "great", "safe",
    // weekdays and months
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "january",
    "february", "march", "april", "may", "june", "july", "august", "september", "october",
    "november", "december",
    // units
    "celsius", "fahrenheit", "c", "f", "am", "pm",
];

/// Whether a (case-insensitive) word can never be part of a place name.
pub fn is_stopword(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    let lower = lower.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '\'');
    STOPWORDS.contains(&lower) || is_trigger_word(lower)
}

/// Trigger words, plurals included ("Temperatures", "Storms").
fn is_trigger_word(lower: &str) -> bool {
    TRIGGER_WORDS.contains(&lower)
        || lower
            .strip_suffix('s')
            .is_some_and(|singular| TRIGGER_WORDS.contains(&singular))
}

/// Parse an English weekday name or common abbreviation.
pub fn parse_weekday(word: &str) -> Option<Weekday> {
    let day = match word.to_ascii_lowercase().as_str() {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thur" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopwords_are_case_insensitive() {
        assert!(is_stopword("Will"));
        assert!(is_stopword("WEATHER"));
        assert!(is_stopword("Friday?"));
        assert!(!is_stopword("Fremont"));
    }

    #[test]
    fn place_prepositions() {
        assert_eq!(PLACE_PREPOSITIONS, ["in", "near", "around", "at", "for", "to"]);
    }

    #[test]
    fn plural_trigger_words_are_stopwords() {
        assert!(is_stopword("Temperatures"));
        assert!(is_stopword("storms"));
        assert!(!is_stopword("Paris"));
    }

    #[test]
    fn weekday_names_and_abbreviations() {
        assert_eq!(parse_weekday("Friday"), Some(Weekday::Fri));
        assert_eq!(parse_weekday("thurs"), Some(Weekday::Thu));
        assert_eq!(parse_weekday("someday"), None);
    }
}
