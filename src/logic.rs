//! Business logic layer - Turning a decoded payload into a word record

use crate::consts::{limits, DEFINITIONS_PATH, EXAMPLES_PATH, TRANSLATIONS_PATH};
use crate::utils::{dedup, extract, strip_emphasis};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything known about one word in one target language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub name: String,
    pub lang: String,
    pub translations: Vec<String>,
    pub synonyms: Vec<String>,
    pub definitions: Vec<String>,
    pub examples: Vec<String>,
}

impl TranslationRecord {
    pub fn empty(word: &str, lang: &str) -> Self {
        Self {
            name: word.to_string(),
            lang: lang.to_string(),
            ..Self::default()
        }
    }

    /// Upstream had no entry for the word
    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
            && self.synonyms.is_empty()
            && self.definitions.is_empty()
            && self.examples.is_empty()
    }
}

/// Build the record for `word`. Missing or oddly shaped sections give empty lists.
pub fn assemble(payload: &Value, word: &str, lang: &str) -> TranslationRecord {
    let mut record = TranslationRecord::empty(word, lang);
    if payload.as_array().map_or(0, Vec::len) < limits::MIN_PAYLOAD_LEN {
        return record;
    }

    let (translations, synonyms) = detailed_translations(payload);
    record.translations = translations;
    record.synonyms = dedup(synonyms);
    record.definitions = definitions(payload);
    record.examples = examples(payload);
    record
}

fn strings(value: Option<&Value>) -> impl Iterator<Item = String> + '_ {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_str().map(str::to_string))
}

fn items(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value.and_then(Value::as_array).into_iter().flatten()
}

fn detailed_translations(payload: &Value) -> (Vec<String>, Vec<String>) {
    let mut translations = Vec::new();
    let mut synonyms = Vec::new();

    for group in items(extract(payload, TRANSLATIONS_PATH)) {
        for details in items(group.get(1)) {
            if let Some(text) = details.get(0).and_then(Value::as_str) {
                translations.push(text.to_string());
            }
            synonyms.extend(strings(details.get(2)));
        }
    }
    (translations, synonyms)
}

fn definitions(payload: &Value) -> Vec<String> {
    items(extract(payload, DEFINITIONS_PATH))
        .filter(|category| category.as_array().map_or(0, Vec::len) >= 2)
        .flat_map(|category| items(category.get(1)))
        .filter_map(|entry| entry.get(0).and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

fn examples(payload: &Value) -> Vec<String> {
    let listing = extract(payload, EXAMPLES_PATH).and_then(|part| part.get(0));
    items(listing)
        .filter_map(|entry| entry.get(1).and_then(Value::as_str))
        .map(strip_emphasis)
        .collect()
}
