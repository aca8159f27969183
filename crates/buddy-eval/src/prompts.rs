//! Evaluation prompts: a built-in set of real questions, or JSONL files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalCase {
    pub prompt: String,
    #[serde(default)]
    pub expected_location: Option<String>,
}

impl EvalCase {
    pub fn new(prompt: &str, expected_location: Option<&str>) -> Self {
        Self {
            prompt: prompt.to_string(),
            expected_location: expected_location.map(String::from),
        }
    }
}

/// Questions as people actually typed them, with the place each one names.
const BUILTIN: &[(&str, &str)] = &[
    ("Will it rain in Fremont tomorrow morning?", "Fremont"),
    ("Weather Fremont tomorrow?", "Fremont"),
    ("Do I need umbrella Newark?", "Newark"),
    ("Is it cold out in Portland now?", "Portland"),
    ("Can I walk outside Tokyo later or no?", "Tokyo"),
    ("Rain coming in Seattle this weekend?", "Seattle"),
    ("Jacket or sweater for Cape Town tonight?", "Cape Town"),
    ("Is it warm enough Paris for picnic?", "Paris"),
    ("I go out Newark today \u{2014} okay?", "Newark"),
    ("What\u{2019}s the weather thing in Fremont next Friday?", "Fremont"),
    ("Will it be nice out in Sydney tomorrow morning?", "Sydney"),
    ("Is it safe to walk in Portland tonight?", "Portland"),
    ("I\u{2019}m going to Fremont \u{2014} rain or not?", "Fremont"),
    ("Should I wear boots in Newark today?", "Newark"),
    ("What's the weather like in Andaman island?", "Andaman"),
    ("What's the weather near Mount Rainer,WA?", "Mount Rainer, WA"),
];

pub fn builtin_cases() -> Vec<EvalCase> {
    BUILTIN
        .iter()
        .map(|(prompt, location)| EvalCase::new(prompt, Some(location)))
        .collect()
}

/// Load cases from a JSONL file: one `{"prompt": ..., "expected_location": ...}`
/// object per line. Blank lines are skipped.
pub fn load_jsonl(path: &Path) -> EvalResult<Vec<EvalCase>> {
    let reader = BufReader::new(File::open(path)?);
    let mut cases = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let case: EvalCase = serde_json::from_str(&line).map_err(|source| EvalError::Json {
            line: index + 1,
            source,
        })?;
        cases.push(case);
    }

    tracing::info!("Loaded {} evaluation prompts from {:?}", cases.len(), path);
    Ok(cases)
}
