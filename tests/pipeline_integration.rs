//! End-to-end tests: generator text in, placements and saved records out

use townsmith::core::types::Vec3;
use townsmith::core::{TownConfig, TownError};
use townsmith::llm::sanitize;
use townsmith::spawn::{
    BlockedGround, FileStore, MemoryStore, OpenWorld, Placement, PlacementPolicy,
    RecordingBuilder, TownSpawner, TownStore,
};
use townsmith::town::layout::{END_MARGIN, GUTTER};
use townsmith::town::{auto_pack, normalize, Auditor, Side, TownDocument, ZoneCatalog};

const TOMBSTONE: &str = r#"{
    "name": "Tombstone",
    "streets": [{"name": "Allen Street", "zone": "main_street", "centerX": 0, "centerZ": 0, "length": 80}],
    "buildings": [
        {"name": "Bird Cage", "zone": "saloon", "side": "Left", "zPos": -10, "interior": "Saloon"},
        {"name": "Wells Fargo", "zone": "bank", "side": "Right", "zPos": 10, "interior": "Bank"},
        {"name": "Church", "zone": "church", "side": "End", "zPos": 1}
    ],
    "props": [{"type": "water trough", "x": 4, "z": 0}],
    "npcs": [{"prefab": "cowboy", "name": "Ike", "x": 0, "z": 5}]
}"#;

fn memory_spawner() -> TownSpawner<RecordingBuilder, MemoryStore, OpenWorld> {
    TownSpawner::new(
        TownConfig::default(),
        RecordingBuilder::new(),
        MemoryStore::new(),
        OpenWorld,
    )
}

fn temp_store(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("townsmith_it_{}", name));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn with_edit(text: &str, edit: bool) -> String {
    text.replacen("\"name\": \"Tombstone\",", &format!("\"name\": \"Tombstone\", \"edit\": {},", edit), 1)
}

#[test]
fn test_missing_streets_and_buildings_fail_audit() {
    let zones = ZoneCatalog::builtin();
    let report = Auditor::new(&zones, None).audit(r#"{"name":"X"}"#);

    assert!(report.len() >= 2);
    assert!(report.errors.iter().any(|e| e.starts_with("Missing 'streets'")));
    assert!(report.errors.iter().any(|e| e.starts_with("Missing 'buildings'")));
    assert!(report.feedback().contains("1. "));
}

#[test]
fn test_clean_audit_builds_everything() {
    let zones = ZoneCatalog::builtin();
    let report = Auditor::new(&zones, None).audit(TOMBSTONE);
    assert!(report.is_clean(), "unexpected findings: {:?}", report.errors);

    let mut spawner = memory_spawner();
    let outcome = spawner.build(TOMBSTONE, Vec3::ZERO).unwrap();
    assert_eq!(outcome.summary.buildings, 3);
    assert_eq!(outcome.summary.skipped, 0);
    assert_eq!(outcome.summary.placed(), 6);
}

#[test]
fn test_null_dimension_keeps_every_building() {
    let raw = r#"{"name": "Contention", "edit": null,
        "streets": [{"name": "Main", "centerX": 0, "centerZ": 0, "length": 80}],
        "buildings": [
            {"name": "A", "zone": "commercial", "side": "Left", "zPos": -20},
            {"name": "B", "zone": "commercial", "side": "Left", "zPos": 0, "width": null},
            {"name": "C", "zone": "commercial", "side": "Left", "zPos": 20}
        ]}"#;
    let zones = ZoneCatalog::builtin();
    assert!(Auditor::new(&zones, None).audit(raw).is_clean());

    let mut spawner = memory_spawner();
    let outcome = spawner.build(raw, Vec3::ZERO).unwrap();
    assert_eq!(outcome.summary.buildings, 3);
    assert!(!outcome.summary.repaired);
}

#[test]
fn test_comment_with_brace_does_not_cut_document() {
    let raw = "Here you go:\n{'name': 'Galeyville', // rustlers' hideout }\n\
        'streets': [{'name': 'Main', 'length': 40}],\n\
        'buildings': [{'name': 'Saloon', 'zone': 'saloon', 'side': 'Left'}]}";
    let mut spawner = memory_spawner();
    let outcome = spawner.build(raw, Vec3::ZERO).unwrap();
    assert!(!outcome.summary.repaired);
    assert_eq!(outcome.summary.streets, 1);
    assert_eq!(outcome.summary.buildings, 1);
}

#[test]
fn test_nested_position_becomes_left_offset() {
    let raw = r#"{
        "name": "Bisbee",
        "streets": [{"name": "Main", "centerX": 0, "centerZ": 0, "length": 100}],
        "buildings": [{"name": "Assay Office", "zone": "civic", "position": {"x": -5, "z": -40}}]
    }"#;
    let mut doc = TownDocument::parse(raw).unwrap().document;
    normalize(&mut doc);

    let building = &doc.buildings[0];
    assert_eq!(building.side.as_deref(), Some("Left"));
    assert_eq!(building.z_pos, Some(-40.0));
    assert_eq!(building.street_index, 0);
}

#[test]
fn test_crowded_side_grows_street_and_centres_row() {
    let raw = r#"{
        "name": "Galeyville",
        "streets": [{"name": "Main", "centerX": 0, "centerZ": 0, "length": 30}],
        "buildings": [
            {"name": "A", "zone": "commercial", "side": "Left", "zPos": 0},
            {"name": "B", "zone": "commercial", "side": "Left", "zPos": 1},
            {"name": "C", "zone": "commercial", "side": "Left", "zPos": 2}
        ]
    }"#;
    let mut doc = TownDocument::parse(raw).unwrap().document;
    normalize(&mut doc);
    auto_pack(&mut doc, &ZoneCatalog::builtin());

    assert!(doc.streets[0].length >= 3.0 * 13.0 + 2.0 * GUTTER + END_MARGIN);
    let offsets: Vec<f32> = doc.buildings.iter().map(|b| b.z_pos.unwrap()).collect();
    assert_eq!(offsets, vec![-15.0, 0.0, 15.0]);
    assert_eq!(offsets[1] - offsets[0], offsets[2] - offsets[1]);
}

#[test]
fn test_rebuild_without_edit_replaces_town() {
    let mut spawner = memory_spawner();
    let first = spawner.build(&with_edit(TOMBSTONE, false), Vec3::new(0.0, 0.0, 0.0)).unwrap();
    let second = spawner.build(&with_edit(TOMBSTONE, false), Vec3::new(500.0, 0.0, 0.0)).unwrap();

    assert_eq!(first.summary.buildings, second.summary.buildings);
    assert_eq!(second.origin, Vec3::new(500.0, 0.0, 0.0));
    assert_eq!(spawner.registry().len(), 1);
    assert_eq!(spawner.builder().removed(), ["Tombstone".to_string()]);

    // Only the second build's entities remain
    let standing = spawner.builder().town("Tombstone").count();
    assert_eq!(standing, second.summary.placed());
    assert!(spawner
        .builder()
        .buildings("Tombstone")
        .iter()
        .all(|b| b.position.x > 400.0));

    let saved = spawner.store().load("Tombstone").unwrap().unwrap();
    assert_eq!(saved.origin(), second.origin);
}

#[test]
fn test_rebuild_with_edit_reuses_origin() {
    let mut spawner = memory_spawner();
    let first = spawner.build(&with_edit(TOMBSTONE, false), Vec3::new(40.0, 2.0, -30.0)).unwrap();
    let second = spawner.build(&with_edit(TOMBSTONE, true), Vec3::new(900.0, 0.0, 900.0)).unwrap();

    assert_eq!(second.origin, first.origin);
    assert_eq!(spawner.registry().get("Tombstone").unwrap().origin, first.origin);
    assert_eq!(spawner.builder().town("Tombstone").count(), second.summary.placed());
}

#[test]
fn test_edit_reuses_origin_from_saved_record() {
    let dir = temp_store("edit_saved");
    {
        let mut spawner = TownSpawner::new(
            TownConfig::default(),
            RecordingBuilder::new(),
            FileStore::open(&dir).unwrap(),
            OpenWorld,
        );
        spawner.build(TOMBSTONE, Vec3::new(75.0, 0.0, 25.0)).unwrap();
    }

    // A fresh spawner knows the town only from its saved record
    let mut spawner = TownSpawner::new(
        TownConfig::default(),
        RecordingBuilder::new(),
        FileStore::open(&dir).unwrap(),
        OpenWorld,
    );
    let outcome = spawner.build(&with_edit(TOMBSTONE, true), Vec3::ZERO).unwrap();
    assert_eq!(outcome.origin, Vec3::new(75.0, 0.0, 25.0));
    assert_eq!(spawner.builder().removed(), ["Tombstone".to_string()]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_building_beyond_world_radius_skipped() {
    let raw = r#"{
        "name": "Edge",
        "streets": [{"name": "Main", "centerX": 10, "centerZ": 0, "length": 40}],
        "buildings": [
            {"name": "Inside", "zone": "commercial", "side": "Left", "zPos": 0},
            {"name": "Outside", "zone": "commercial", "side": "Right", "zPos": 0}
        ]
    }"#;
    let mut spawner = memory_spawner();
    let outcome = spawner.build(raw, Vec3::new(1985.0, 0.0, 0.0)).unwrap();

    assert_eq!(outcome.summary.buildings, 1);
    assert_eq!(outcome.summary.skipped, 1);
    assert_eq!(outcome.summary.streets, 1);
    let standing = spawner.builder().buildings("Edge");
    assert_eq!(standing.len(), 1);
    assert_eq!(standing[0].name, "Inside");
    assert_eq!(standing[0].side, Side::Left);
}

#[test]
fn test_blocked_ground_skips_entities_and_nudges_origin() {
    let mut ground = BlockedGround::with_cell_size(50.0);
    ground.block(0, 0);
    let mut spawner = TownSpawner::new(
        TownConfig::default(),
        RecordingBuilder::new(),
        MemoryStore::new(),
        ground,
    );
    let outcome = spawner.build(TOMBSTONE, Vec3::new(10.0, 0.0, 10.0)).unwrap();
    assert_ne!(outcome.origin, Vec3::new(10.0, 0.0, 10.0));
    assert!(!spawner.policy().is_forbidden(outcome.origin));
}

#[test]
fn test_batch_offsets_successive_towns() {
    let response = format!(
        "Here are your towns:\n```json\n{}\n```\nand a second one\n{}\nand one more {{\"name\": ",
        TOMBSTONE,
        TOMBSTONE.replace("Tombstone", "Contention")
    );
    let mut spawner = memory_spawner();
    let entries = spawner.build_response(&response, Vec3::new(100.0, 0.0, 0.0));

    assert_eq!(entries.len(), 3);
    let first = entries[0].result.as_ref().unwrap();
    let second = entries[1].result.as_ref().unwrap();
    assert_eq!(first.origin, Vec3::new(100.0, 0.0, 0.0));
    assert_eq!(second.origin, Vec3::new(100.0 + TownConfig::default().town_spacing, 0.0, 0.0));
    assert!(entries[2].result.is_err());
    assert_eq!(spawner.registry().names(), vec!["Contention", "Tombstone"]);
}

#[test]
fn test_failed_document_does_not_stop_batch() {
    let response = format!("{{\"name\": \"\"}} {}", TOMBSTONE);
    let mut spawner = memory_spawner();
    let entries = spawner.build_response(&response, Vec3::ZERO);

    assert_eq!(entries.len(), 2);
    assert!(!entries[0].is_ok());
    assert!(entries[1].is_ok());
    // A failure does not advance the origin
    assert_eq!(entries[1].result.as_ref().unwrap().origin, Vec3::ZERO);
}

#[test]
fn test_saved_text_is_repaired_not_normalized() {
    let sloppy = "{'name': 'Charleston', // mining camp\n 'buildings': [{'name': 'Mill',},],}";
    let mut spawner = memory_spawner();
    spawner.build(sloppy, Vec3::new(1.0, 2.0, 3.0)).unwrap();

    let saved = spawner.store().load("Charleston").unwrap().unwrap();
    assert_eq!(saved.document_text, sanitize(sloppy));
    assert_eq!(saved.origin(), Vec3::new(1.0, 2.0, 3.0));
    // The synthesized street lives only in the built world
    assert!(!saved.document_text.contains("Main Street"));
}

#[test]
fn test_restore_rebuilds_identically() {
    let dir = temp_store("restore");
    let original: Vec<Placement> = {
        let mut spawner = TownSpawner::new(
            TownConfig::default(),
            RecordingBuilder::new(),
            FileStore::open(&dir).unwrap(),
            OpenWorld,
        );
        spawner.build(TOMBSTONE, Vec3::new(-120.0, 4.0, 60.0)).unwrap();
        spawner.builder().placements().to_vec()
    };

    let mut spawner = TownSpawner::new(
        TownConfig::default(),
        RecordingBuilder::new(),
        FileStore::open(&dir).unwrap(),
        OpenWorld,
    );
    let outcome = spawner.restore("Tombstone").unwrap();
    assert_eq!(outcome.origin, Vec3::new(-120.0, 4.0, 60.0));
    assert_eq!(spawner.builder().placements(), original.as_slice());

    assert!(matches!(spawner.restore("Nowhere"), Err(TownError::NotFound(_))));

    let restored = spawner.restore_all().unwrap();
    assert_eq!(restored.len(), 1);
    assert!(restored[0].1.is_ok());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_remove_deletes_saved_record() {
    let dir = temp_store("remove");
    let mut spawner = TownSpawner::new(
        TownConfig::default(),
        RecordingBuilder::new(),
        FileStore::open(&dir).unwrap(),
        OpenWorld,
    );
    spawner.build(TOMBSTONE, Vec3::ZERO).unwrap();
    assert_eq!(spawner.store().names().unwrap(), vec!["Tombstone"]);

    assert!(spawner.remove("Tombstone").unwrap());
    assert!(spawner.store().names().unwrap().is_empty());
    assert!(spawner.builder().placements().is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_truncated_response_still_builds() {
    let cut = TOMBSTONE.find("\"props\"").unwrap();
    let truncated = &TOMBSTONE[..cut];
    let mut spawner = memory_spawner();
    let outcome = spawner.build(truncated, Vec3::ZERO).unwrap();

    assert!(outcome.summary.repaired);
    assert_eq!(outcome.summary.buildings, 3);
    assert_eq!(outcome.summary.props, 0);
}

#[test]
fn test_config_extra_zone_accepted_by_audit_and_packer() {
    let config = TownConfig::parse_toml(
        r#"
        npc_prefabs = ["cowboy"]

        [[extra_zones]]
        key = "mine"
        plot_width = 30.0
        plot_depth = 20.0
        "#,
    )
    .unwrap();
    let zones = ZoneCatalog::with_extra(&config.extra_zones);
    let raw = r#"{
        "name": "Goldfield",
        "streets": [{"name": "Main", "centerX": 0, "centerZ": 0, "length": 20}],
        "buildings": [
            {"name": "Shaft 1", "zone": "mine", "side": "Left"},
            {"name": "Shaft 2", "zone": "mine", "side": "Left"}
        ],
        "npcs": [{"prefab": "miner", "name": "Jack"}]
    }"#;

    let report = Auditor::from_config(&zones, &config).audit(raw);
    assert_eq!(report.len(), 1);
    assert!(report.errors[0].contains("unknown prefab 'miner'"));

    let mut doc = TownDocument::parse(raw).unwrap().document;
    normalize(&mut doc);
    auto_pack(&mut doc, &zones);
    assert_eq!(doc.streets[0].length, 30.0 * 2.0 + GUTTER + END_MARGIN);
}
