// Property tests for the voice phrase parser
//
// These check the parser against every valid clock time, every built-in
// synonym, and arbitrary noise.

use flightops::voice::{normalize_time_tokens, parse_phrase, IntentVocabulary, ParsedIntent, TimeField};
use proptest::prelude::*;

const WALKOUT_PHRASES: [&str; 6] = [
    "walkout",
    "walk out",
    "no bus",
    "no buses",
    "walk to the aircraft",
    "walk out to aircraft",
];

fn valid_time() -> impl Strategy<Value = (u32, u32)> {
    (0u32..24, 0u32..60)
}

fn field_and_synonym() -> impl Strategy<Value = (TimeField, String)> {
    let vocab = IntentVocabulary::default();
    let pairs: Vec<(TimeField, String)> = TimeField::PRIORITY
        .into_iter()
        .flat_map(|field| {
            vocab
                .synonyms(field)
                .iter()
                .map(move |s| (field, s.clone()))
                .collect::<Vec<_>>()
        })
        .collect();
    proptest::sample::select(pairs)
}

proptest! {
    #[test]
    fn synonym_with_clock_time_updates_that_field(
        (field, synonym) in field_and_synonym(),
        (h, m) in valid_time(),
    ) {
        let hhmm = format!("{h:02}:{m:02}");
        match parse_phrase(&format!("{synonym} {hhmm}")) {
            ParsedIntent::TimeUpdate { field: got, hhmm: t } => {
                prop_assert_eq!(got, field);
                prop_assert_eq!(t.to_string(), hhmm);
            }
            other => prop_assert!(false, "{synonym:?} {hhmm} parsed as {other:?}"),
        }
    }

    #[test]
    fn digit_encodings_recover_the_same_time((h, m) in valid_time()) {
        let expected = format!("{h:02}:{m:02}");
        let encodings = [
            format!("{h}{m:02}"),
            format!("{h:02}{m:02}"),
            format!("{h:02} {m:02}"),
            format!("{h:02}.{m:02}"),
            format!("{h}:{m:02}"),
        ];
        for encoded in encodings {
            let got = normalize_time_tokens(&encoded).map(|t| t.to_string());
            prop_assert_eq!(got.as_deref(), Some(expected.as_str()), "encoded as {:?}", encoded);
        }
    }

    #[test]
    fn walkout_wins_over_times(
        phrase in proptest::sample::select(WALKOUT_PHRASES.to_vec()),
        (h, m) in valid_time(),
        time_first in any::<bool>(),
    ) {
        let text = if time_first {
            format!("last bus {h:02}:{m:02} {phrase}")
        } else {
            format!("{phrase} first bus {h:02}{m:02}")
        };
        prop_assert_eq!(parse_phrase(&text), ParsedIntent::WalkoutFlag { value: true });
    }

    #[test]
    fn out_of_range_numerals_never_update(
        (h, m) in (0u32..100, 0u32..100).prop_filter("out of range", |(h, m)| *h >= 24 || *m >= 60),
        separator in proptest::sample::select(vec![":", " ", ".", ""]),
    ) {
        let text = format!("gate open {h:02}{separator}{m:02}");
        let parsed = parse_phrase(&text);
        prop_assert!(
            !matches!(parsed, ParsedIntent::TimeUpdate { .. }),
            "{:?} parsed as {:?}", text, parsed
        );
    }

    #[test]
    fn parsing_is_deterministic(text in ".{0,80}") {
        prop_assert_eq!(parse_phrase(&text), parse_phrase(&text));
    }

    #[test]
    fn time_updates_always_carry_valid_times(text in "[a-z0-9 :.]{0,40}") {
        if let ParsedIntent::TimeUpdate { hhmm, .. } = parse_phrase(&text) {
            prop_assert!(hhmm.hour() < 24 && hhmm.minute() < 60);
        }
    }
}

#[test]
fn test_remark_keeps_original_text() {
    assert_eq!(
        parse_phrase("remark gate agent waiting on catering"),
        ParsedIntent::RemarkText {
            text: "gate agent waiting on catering".to_string()
        }
    );
    assert_eq!(
        parse_phrase("REMARK Gate Agent waiting on Catering"),
        ParsedIntent::RemarkText {
            text: "Gate Agent waiting on Catering".to_string()
        }
    );
}

#[test]
fn test_spoken_times() {
    assert_eq!(
        parse_phrase("gate open twenty twenty six"),
        ParsedIntent::TimeUpdate {
            field: TimeField::GateStart,
            hhmm: "20:26".parse().unwrap(),
        }
    );
    assert_eq!(
        parse_phrase("last bus nine fifteen"),
        ParsedIntent::TimeUpdate {
            field: TimeField::LastBus,
            hhmm: "09:15".parse().unwrap(),
        }
    );
}
