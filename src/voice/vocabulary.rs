//! Intent vocabulary for the phrase parser
//!
//! Synonym lists are configuration: they ship with a curated default and can be
//! replaced from the config file. Matching is plain substring containment against
//! normalized, digitized text, checked intent by intent in [`TimeField::PRIORITY`]
//! order, so a careless synonym can swallow phrases meant for a later intent.
//! [`IntentVocabulary::issues`] reports those cases.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use super::parser::{normalize, normalize_time_tokens, words_to_digits, TimeField};
use super::time::ClockTime;

static WALKOUT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bwalk ?out\b",
        r"\bno bus(es)?\b",
        r"\bwalk to (the )?aircraft\b",
        r"\bwalk out to (the )?aircraft\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("walkout pattern is valid"))
    .collect()
});

static IMPLICIT_PATTERNS: LazyLock<Vec<(Regex, TimeField)>> = LazyLock::new(|| {
    [
        // gate-based
        (r"\bgate\s*(?:open|opening|start)\b", TimeField::GateStart),
        (
            r"\bgate\s*(?:close|closing|closed|end|ending|closure)\b",
            TimeField::GateEnd,
        ),
        // flight-based
        (r"\b(?:open|opening)\s+flight\b", TimeField::GateStart),
        (r"\bflight\s*(?:open|opening)\b", TimeField::GateStart),
        (r"\b(?:close|closing|closed|closure)\s+flight\b", TimeField::GateEnd),
        (r"\bflight\s*(?:close|closing|closed|closure)\b", TimeField::GateEnd),
        // buses & PRM
        (r"\bfirst\s*bus\b", TimeField::FirstBus),
        (r"\blast\s*bus\b", TimeField::LastBus),
        (r"\bprm(?:\s*(?:pickup|lift))?\b", TimeField::PrmPickup),
    ]
    .into_iter()
    .map(|(p, field)| (Regex::new(p).expect("implicit pattern is valid"), field))
    .collect()
});

/// True when the normalized phrase means "no bus, passengers walk to the aircraft"
pub fn is_walkout(normalized: &str) -> bool {
    WALKOUT_PATTERNS.iter().any(|re| re.is_match(normalized))
}

/// Looser gate/flight/bus/PRM phrasing, used only when no synonym matched
pub fn implicit_intent(normalized: &str) -> Option<TimeField> {
    IMPLICIT_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(normalized))
        .map(|(_, field)| *field)
}

/// Synonym lists per time intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentVocabulary {
    pub gate_start: Vec<String>,
    pub gate_end: Vec<String>,
    pub first_bus: Vec<String>,
    pub last_bus: Vec<String>,
    pub prm_pickup: Vec<String>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for IntentVocabulary {
    fn default() -> Self {
        Self {
            gate_start: owned(&[
                "gate start",
                "start gate",
                "gate open",
                "open gate",
                "gate opening",
                "opening gate",
                "gate starter",
                "open flight",
                "flight open",
                "flight opening",
            ]),
            gate_end: owned(&[
                "gate end",
                "end gate",
                "gate close",
                "close gate",
                "close the gate",
                "closing gate",
                "gate closing",
                "gate closed",
                "closed gate",
                "gate closure",
                "close flight",
                "flight close",
                "flight closed",
                "flight closing",
                // common mishearing of "gate close"
                "great close",
            ]),
            first_bus: owned(&["first bus", "1st bus", "first buss"]),
            last_bus: owned(&["last bus", "final bus", "bus last", "bus final", "end bus"]),
            prm_pickup: owned(&[
                "prm",
                "prm pickup",
                "prm pick up",
                "ambulift",
                "ambu lift",
                "ambuilift",
                "elevator",
                "maas",
                "wchr",
                "wchs",
                "wchc",
                "dpna",
            ]),
        }
    }
}

/// A problem found in a vocabulary by [`IntentVocabulary::issues`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VocabularyIssue {
    /// Empty synonym; it matches every phrase
    Empty { field: TimeField },
    /// The synonym changes under normalization, so it can never match as written
    Unreachable {
        field: TimeField,
        synonym: String,
        normalized: String,
    },
    /// A higher-priority synonym is contained in a lower-priority one, so the
    /// lower-priority phrase always resolves to the wrong intent
    Shadowed {
        synonym: String,
        field: TimeField,
        shadowed: String,
        shadowed_field: TimeField,
    },
    /// Digits in the synonym are picked up by time extraction ahead of the
    /// spoken time
    CapturesTime { field: TimeField, synonym: String },
}

impl fmt::Display for VocabularyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field}: empty synonym matches everything"),
            Self::Unreachable {
                field,
                synonym,
                normalized,
            } => write!(
                f,
                "{field}: synonym {synonym:?} normalizes to {normalized:?} and never matches"
            ),
            Self::Shadowed {
                synonym,
                field,
                shadowed,
                shadowed_field,
            } => write!(
                f,
                "{field}: synonym {synonym:?} shadows {shadowed_field} synonym {shadowed:?}"
            ),
            Self::CapturesTime { field, synonym } => write!(
                f,
                "{field}: synonym {synonym:?} contains digits that time extraction picks up"
            ),
        }
    }
}

impl IntentVocabulary {
    pub fn synonyms(&self, field: TimeField) -> &[String] {
        match field {
            TimeField::GateStart => &self.gate_start,
            TimeField::GateEnd => &self.gate_end,
            TimeField::FirstBus => &self.first_bus,
            TimeField::LastBus => &self.last_bus,
            TimeField::PrmPickup => &self.prm_pickup,
        }
    }

    /// First intent, in priority order, with a synonym contained in `text`
    pub fn match_intent(&self, text: &str) -> Option<TimeField> {
        TimeField::PRIORITY
            .into_iter()
            .find(|field| self.synonyms(*field).iter().any(|s| text.contains(s.as_str())))
    }

    /// Lint the vocabulary for synonyms that cannot work as intended
    pub fn issues(&self) -> Vec<VocabularyIssue> {
        let mut issues = Vec::new();
        let probe = ClockTime::new(12, 34);

        for field in TimeField::PRIORITY {
            for synonym in self.synonyms(field) {
                if synonym.trim().is_empty() {
                    issues.push(VocabularyIssue::Empty { field });
                    continue;
                }

                let normalized = words_to_digits(&normalize(synonym));
                if normalized != *synonym {
                    issues.push(VocabularyIssue::Unreachable {
                        field,
                        synonym: synonym.clone(),
                        normalized,
                    });
                    continue;
                }

                if normalize_time_tokens(&format!("{synonym} 12:34")) != probe {
                    issues.push(VocabularyIssue::CapturesTime {
                        field,
                        synonym: synonym.clone(),
                    });
                }
            }
        }

        for (i, field) in TimeField::PRIORITY.into_iter().enumerate() {
            for later in TimeField::PRIORITY.into_iter().skip(i + 1) {
                for synonym in self.synonyms(field).iter().filter(|s| !s.trim().is_empty()) {
                    for shadowed in self.synonyms(later) {
                        if shadowed.contains(synonym.as_str()) {
                            issues.push(VocabularyIssue::Shadowed {
                                synonym: synonym.clone(),
                                field,
                                shadowed: shadowed.clone(),
                                shadowed_field: later,
                            });
                        }
                    }
                }
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vocabulary_is_clean() {
        let issues = IntentVocabulary::default().issues();
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
    }

    #[test]
    fn test_bare_end_shadows_end_bus() {
        let mut vocab = IntentVocabulary::default();
        vocab.gate_end.push("end".to_string());

        let issues = vocab.issues();
        assert!(issues.contains(&VocabularyIssue::Shadowed {
            synonym: "end".to_string(),
            field: TimeField::GateEnd,
            shadowed: "end bus".to_string(),
            shadowed_field: TimeField::LastBus,
        }));
    }

    #[test]
    fn test_uppercase_and_punctuation_are_unreachable() {
        let mut vocab = IntentVocabulary::default();
        vocab.prm_pickup.push("PRM".to_string());
        vocab.prm_pickup.push("i'm beautiful".to_string());

        let unreachable: Vec<_> = vocab
            .issues()
            .into_iter()
            .filter(|i| matches!(i, VocabularyIssue::Unreachable { .. }))
            .collect();
        assert_eq!(unreachable.len(), 2);
    }

    #[test]
    fn test_spoken_number_synonym_is_unreachable() {
        let mut vocab = IntentVocabulary::default();
        vocab.first_bus.push("bus one".to_string());

        assert!(vocab.issues().iter().any(|i| matches!(
            i,
            VocabularyIssue::Unreachable { normalized, .. } if normalized == "bus 1"
        )));
    }

    #[test]
    fn test_digit_synonym_captures_time() {
        let mut vocab = IntentVocabulary::default();
        vocab.first_bus.push("bus 1".to_string());

        assert!(vocab.issues().contains(&VocabularyIssue::CapturesTime {
            field: TimeField::FirstBus,
            synonym: "bus 1".to_string(),
        }));
    }

    #[test]
    fn test_empty_synonym_flagged() {
        let mut vocab = IntentVocabulary::default();
        vocab.last_bus.push(String::new());
        assert!(vocab
            .issues()
            .contains(&VocabularyIssue::Empty { field: TimeField::LastBus }));
    }

    #[test]
    fn test_priority_order_wins() {
        let vocab = IntentVocabulary::default();
        // both a gate-start and a first-bus synonym are present
        assert_eq!(
            vocab.match_intent("gate open first bus"),
            Some(TimeField::GateStart)
        );
    }

    #[test]
    fn test_walkout_patterns() {
        assert!(is_walkout("walkout"));
        assert!(is_walkout("walk out to aircraft"));
        assert!(is_walkout("no buses today"));
        assert!(is_walkout("no bus"));
        assert!(!is_walkout("first bus 20 30"));
        assert!(!is_walkout("walked outside"));
    }

    #[test]
    fn test_implicit_intent() {
        assert_eq!(implicit_intent("gateopen 2026"), Some(TimeField::GateStart));
        assert_eq!(implicit_intent("closure flight at 2026"), Some(TimeField::GateEnd));
        assert_eq!(implicit_intent("prm lift 1015"), Some(TimeField::PrmPickup));
        assert_eq!(implicit_intent("coffee break"), None);
    }
}
