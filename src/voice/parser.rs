//! Voice phrase parser
//!
//! Turns one finalized utterance into a [`ParsedIntent`]. Parsing is pure and
//! total: every input, including empty or garbled text, yields a value.
//!
//! Accepted time encodings: `20:26`, `20 26`, `20.26`, `2026`, `926`, and the
//! spoken forms of those ("twenty twenty six", "nine twenty six").

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use super::time::ClockTime;
use super::vocabulary::{implicit_intent, is_walkout, IntentVocabulary};

/// Operational time fields an utterance can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeField {
    GateStart,
    GateEnd,
    FirstBus,
    LastBus,
    PrmPickup,
}

impl TimeField {
    /// Order in which synonym lists are tested; the first hit wins
    pub const PRIORITY: [TimeField; 5] = [
        TimeField::GateStart,
        TimeField::GateEnd,
        TimeField::FirstBus,
        TimeField::LastBus,
        TimeField::PrmPickup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeField::GateStart => "gateStart",
            TimeField::GateEnd => "gateEnd",
            TimeField::FirstBus => "firstBus",
            TimeField::LastBus => "lastBus",
            TimeField::PrmPickup => "prmPickup",
        }
    }
}

impl fmt::Display for TimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured result of parsing one utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ParsedIntent {
    /// Set an operational time field
    TimeUpdate { field: TimeField, hhmm: ClockTime },
    /// Passengers walk to the aircraft; always `true` when produced by the parser
    WalkoutFlag { value: bool },
    /// Free text to append to the flight remark
    RemarkText { text: String },
    Unrecognized,
}

impl ParsedIntent {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, ParsedIntent::Unrecognized)
    }
}

static STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_: ]+").expect("strip regex is valid"));

static SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

static SEPARATED_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([0-9]{1,2})[:\s.]([0-9]{2})\b").expect("separated time regex is valid")
});

static FOUR_DIGIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]{4})\b").expect("four digit regex is valid"));

static THREE_DIGIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]{3})\b").expect("three digit regex is valid"));

/// Spoken numbers zero..fifty-nine, matched longest phrase first
static NUMBER_WORDS: LazyLock<(Regex, HashMap<String, u32>)> = LazyLock::new(|| {
    const UNITS: [&str; 20] = [
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
        "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
        "nineteen",
    ];
    const TENS: [&str; 4] = ["twenty", "thirty", "forty", "fifty"];

    let mut words: HashMap<String, u32> = HashMap::new();
    for (value, word) in UNITS.iter().enumerate() {
        words.insert(word.to_string(), value as u32);
    }
    for (i, tens) in TENS.iter().enumerate() {
        let base = (i as u32 + 2) * 10;
        words.insert(tens.to_string(), base);
        for (ones, unit) in UNITS.iter().enumerate().skip(1).take(9) {
            words.insert(format!("{tens} {unit}"), base + ones as u32);
        }
    }

    let mut keys: Vec<&String> = words.keys().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let alternation = keys
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");

    let re = Regex::new(&format!(r"\b(?:{alternation})\b")).expect("number word regex is valid");
    (re, words)
});

/// Lowercase, replace everything but word characters, colons and spaces with a
/// space, collapse whitespace and trim
pub fn normalize(input: &str) -> String {
    let lower = input.to_lowercase();
    let stripped = STRIP_RE.replace_all(&lower, " ");
    SPACE_RE.replace_all(&stripped, " ").trim().to_string()
}

/// Replace spoken number words with their digits ("twenty six" → "26")
pub fn words_to_digits(input: &str) -> String {
    let (re, words) = &*NUMBER_WORDS;
    re.replace_all(input, |caps: &Captures| {
        words
            .get(&caps[0])
            .map(|n| n.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}

/// Find a time of day anywhere in `s`.
///
/// Rules, first success wins: `H{1,2}[: .]MM`, then a bare `HHMM`, then a bare
/// `HMM`. Only the first occurrence of each rule is considered; an out-of-range
/// candidate falls through to the next rule.
pub fn normalize_time_tokens(s: &str) -> Option<ClockTime> {
    extract_time(&words_to_digits(&normalize(s)))
}

fn extract_time(text: &str) -> Option<ClockTime> {
    let number = |s: &str| s.parse::<u32>().ok();

    if let Some(caps) = SEPARATED_TIME_RE.captures(text) {
        if let Some(t) = number(&caps[1])
            .zip(number(&caps[2]))
            .and_then(|(h, m)| ClockTime::new(h, m))
        {
            return Some(t);
        }
    }

    if let Some(caps) = FOUR_DIGIT_RE.captures(text) {
        let run = &caps[1];
        if let Some(t) = number(&run[..2])
            .zip(number(&run[2..]))
            .and_then(|(h, m)| ClockTime::new(h, m))
        {
            return Some(t);
        }
    }

    if let Some(caps) = THREE_DIGIT_RE.captures(text) {
        let run = &caps[1];
        if let Some(t) = number(&run[..1])
            .zip(number(&run[1..]))
            .and_then(|(h, m)| ClockTime::new(h, m))
        {
            return Some(t);
        }
    }

    None
}

/// Everything after the leading "remark" keyword, with the caller's casing
fn remark_body(raw: &str) -> String {
    let start = raw
        .to_ascii_lowercase()
        .find("remark")
        .map(|i| i + "remark".len())
        .unwrap_or(0);

    raw[start..]
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | ',' | '-' | '.'))
        .trim_end()
        .to_string()
}

/// Phrase parser bound to a vocabulary
#[derive(Debug, Clone, Default)]
pub struct PhraseParser {
    vocabulary: IntentVocabulary,
}

impl PhraseParser {
    pub fn new(vocabulary: IntentVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &IntentVocabulary {
        &self.vocabulary
    }

    pub fn parse(&self, raw: &str) -> ParsedIntent {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return ParsedIntent::Unrecognized;
        }

        if normalized.starts_with("remark ") {
            return ParsedIntent::RemarkText {
                text: remark_body(raw),
            };
        }

        if is_walkout(&normalized) {
            return ParsedIntent::WalkoutFlag { value: true };
        }

        let digitized = words_to_digits(&normalized);

        // Implicit patterns only get a turn when no synonym matched at all
        let field = match self.vocabulary.match_intent(&digitized) {
            Some(field) => field,
            None => match implicit_intent(&digitized) {
                Some(field) => field,
                None => return ParsedIntent::Unrecognized,
            },
        };

        match extract_time(&digitized) {
            Some(hhmm) => ParsedIntent::TimeUpdate { field, hhmm },
            None => ParsedIntent::Unrecognized,
        }
    }
}

static DEFAULT_PARSER: LazyLock<PhraseParser> = LazyLock::new(PhraseParser::default);

/// Parse with the built-in vocabulary
pub fn parse_phrase(raw: &str) -> ParsedIntent {
    DEFAULT_PARSER.parse(raw)
}
