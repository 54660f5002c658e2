//! Property tests for syntax repair and truncation recovery

use proptest::prelude::*;
use serde_json::{json, Value};
use townsmith::llm::{attempt_repair, extract_documents, sanitize};
use townsmith::town::TownDocument;

/// Characters generators actually produce, weighted towards JSON syntax
fn json_ish_char() -> impl Strategy<Value = char> {
    prop_oneof![
        4 => prop::sample::select(vec![
            '{', '}', '[', ']', ':', ',', '"', '\'', '\\', '/', '*', '\n', '\t', ' ', 'n', 'u',
        ]),
        2 => prop::char::range('a', 'z'),
        1 => prop::char::range('0', '9'),
        1 => any::<char>(),
    ]
}

fn json_ish_text() -> impl Strategy<Value = String> {
    prop::collection::vec(json_ish_char(), 0..200).prop_map(|chars| chars.into_iter().collect())
}

fn building_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z ]{0,12}"
}

/// A valid town document with a handful of buildings
fn town_json() -> impl Strategy<Value = String> {
    (
        building_name(),
        prop::collection::vec((building_name(), -50i32..50, 4u32..20), 1..6),
    )
        .prop_map(|(town, buildings)| {
            let buildings: Vec<String> = buildings
                .into_iter()
                .map(|(name, z, width)| {
                    json!({"name": name, "zone": "commercial", "side": "Left", "zPos": z, "width": width})
                        .to_string()
                })
                .collect();
            // Name first, so every truncation point keeps it
            format!(
                r#"{{"name": "T {}", "streets": [{{"name": "Main", "centerX": 0, "centerZ": 0, "length": 40}}], "buildings": [{}]}}"#,
                town,
                buildings.join(", ")
            )
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn sanitize_is_idempotent(text in json_ish_text()) {
        let once = sanitize(&text);
        prop_assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn sanitize_never_panics_on_arbitrary_text(text in any::<String>()) {
        let _ = sanitize(&text);
        let _ = attempt_repair(&text);
        let _ = extract_documents(&text);
    }

    #[test]
    fn sanitize_preserves_valid_json(
        entries in prop::collection::vec(("[a-zA-Z_]{1,8}", any::<String>(), -1.0e6f64..1.0e6), 0..8)
    ) {
        let mut object = serde_json::Map::new();
        for (key, text, number) in entries {
            object.insert(key, json!([text, number, null, true]));
        }
        let original = Value::Object(object);
        let rendered = serde_json::to_string_pretty(&original).unwrap();

        let reparsed: Value = serde_json::from_str(&sanitize(&rendered)).unwrap();
        prop_assert_eq!(reparsed, original);
    }

    #[test]
    fn truncated_document_recovers_complete_buildings(doc in town_json(), frac in 0.0f64..1.0) {
        let streets_end = doc.find("}]").unwrap();
        let first_building_end = doc[streets_end + 2..].find('}').map(|i| streets_end + 2 + i).unwrap();
        let span = doc.len() - first_building_end - 1;
        let cut = first_building_end + 1 + (span as f64 * frac) as usize;

        let parsed = TownDocument::parse(&doc[..cut]).unwrap();
        prop_assert!(parsed.document.name.starts_with("T "));
        prop_assert!(!parsed.document.buildings.is_empty());
        prop_assert!(parsed.document.buildings.iter().all(|b| b.zone.as_deref() == Some("commercial")));
    }
}

#[test]
fn test_truncation_inside_string_recovers() {
    let doc = r#"{"name": "Tombstone", "buildings": [{"name": "Bank", "zone": "bank"}, {"name": "Sal"#;
    let repaired = attempt_repair(doc).unwrap();
    let parsed: TownDocument = serde_json::from_str(&repaired).unwrap();
    assert_eq!(parsed.buildings.len(), 1);
    assert_eq!(parsed.buildings[0].name, "Bank");
}
