//! Pre-flight audit of generator output
//!
//! The audit never changes the document and never fails: it returns a list
//! of corrective messages written for the generator to read, so a driver
//! can feed them back as a re-prompt. The wording of each message is part
//! of that contract.

use crate::core::config::TownConfig;
use crate::town::normalize::interior_is_valid;
use crate::town::schema::{Building, TownDocument};
use crate::town::zones::{infer_zone, InteriorStyle, Side, ZoneCatalog};

/// Result of auditing one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditReport {
    pub errors: Vec<String>,
}

impl AuditReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nothing to correct: safe to normalize, pack and build
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, message: String) {
        self.errors.push(message);
    }

    /// Numbered correction block to append to the next generator prompt
    pub fn feedback(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        let mut text = String::from(
            "Your town JSON has problems. Fix every item below and resend the complete JSON:\n",
        );
        for (i, error) in self.errors.iter().enumerate() {
            text.push_str(&format!("{}. {}\n", i + 1, error));
        }
        text
    }
}

/// Checks documents against the zones and prefabs a caller accepts
pub struct Auditor<'a> {
    zones: &'a ZoneCatalog,
    npc_prefabs: Option<&'a [String]>,
}

impl<'a> Auditor<'a> {
    pub fn new(zones: &'a ZoneCatalog, npc_prefabs: Option<&'a [String]>) -> Self {
        Self { zones, npc_prefabs }
    }

    /// Use the allow-list from a config alongside an already built catalog
    pub fn from_config(zones: &'a ZoneCatalog, config: &'a TownConfig) -> Self {
        Self::new(zones, config.npc_prefabs.as_deref())
    }

    /// Audit raw generator text, after syntax repair but before normalization
    pub fn audit(&self, raw_text: &str) -> AuditReport {
        match TownDocument::parse(raw_text) {
            Ok(parsed) => self.audit_document(&parsed.document),
            Err(e) => AuditReport {
                errors: vec![format!(
                    "JSON parse error: {}. Respond with a single valid JSON object.",
                    e
                )],
            },
        }
    }

    /// Audit an already deserialized, not yet normalized document
    pub fn audit_document(&self, doc: &TownDocument) -> AuditReport {
        let mut report = AuditReport::new();

        if doc.name.trim().is_empty() {
            report.push("Missing 'name': the town needs a non-empty \"name\".".into());
        }

        self.check_streets(doc, &mut report);
        self.check_buildings(doc, &mut report);
        self.check_npcs(doc, &mut report);

        report
    }

    fn check_streets(&self, doc: &TownDocument, report: &mut AuditReport) {
        if doc.streets.is_empty() {
            report.push(
                "Missing 'streets': add at least one street with \"name\", \"centerX\", \"centerZ\" and \"length\"."
                    .into(),
            );
            return;
        }
        for (i, street) in doc.streets.iter().enumerate() {
            if street.name.trim().is_empty() {
                report.push(format!("streets[{}]: missing 'name'.", i));
            }
            if !street.has_centerline() && !street.has_polyline() {
                report.push(format!(
                    "streets[{}] '{}': needs \"centerX\"/\"centerZ\" with \"length\" > 0, or a \"points\" polyline with at least 2 points.",
                    i, street.name
                ));
            }
        }
    }

    fn check_buildings(&self, doc: &TownDocument, report: &mut AuditReport) {
        if doc.buildings.is_empty() {
            report.push("Missing 'buildings': add at least one building.".into());
            return;
        }

        for (i, building) in doc.buildings.iter().enumerate() {
            self.check_building(i, building, report);
        }

        if doc.buildings.iter().any(|b| b.position.is_some()) {
            report.push(
                "Buildings use nested \"position\" objects. Use flat \"side\", \"zPos\" and \"streetIndex\" relative to a street instead."
                    .into(),
            );
        }
    }

    fn check_building(&self, i: usize, building: &Building, report: &mut AuditReport) {
        let name = building.name.trim();
        if name.is_empty() {
            report.push(format!("buildings[{}]: missing 'name'.", i));
        }

        match building.zone.as_deref().map(str::trim) {
            None | Some("") => report.push(format!(
                "buildings[{}] '{}': missing 'zone'. Suggested: \"zone\": \"{}\".",
                i,
                name,
                infer_zone(building.interior.as_deref(), name)
            )),
            Some(zone) if !self.zones.contains(zone) => report.push(format!(
                "buildings[{}] '{}': unknown zone '{}'. Valid zones: {}.",
                i,
                name,
                zone,
                self.zones.keys().collect::<Vec<_>>().join(", ")
            )),
            Some(_) => {}
        }

        match building.side.as_deref() {
            None if building.position.is_none() => report.push(format!(
                "buildings[{}] '{}': missing 'side'. Use \"Left\", \"Right\" or \"End\".",
                i, name
            )),
            Some(side) if Side::parse(side).is_none() => report.push(format!(
                "buildings[{}] '{}': invalid side '{}'. Use \"Left\", \"Right\" or \"End\".",
                i, name, side
            )),
            _ => {}
        }

        if !interior_is_valid(building) {
            report.push(format!(
                "buildings[{}] '{}': unknown interior '{}'. Valid interiors: {}.",
                i,
                name,
                building.interior.as_deref().unwrap_or_default(),
                InteriorStyle::ALL
                    .iter()
                    .map(InteriorStyle::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
    }

    fn check_npcs(&self, doc: &TownDocument, report: &mut AuditReport) {
        for (i, npc) in doc.npcs.iter().enumerate() {
            let prefab = npc.prefab.trim();
            if prefab.is_empty() {
                report.push(format!("npcs[{}]: missing 'prefab'.", i));
            }
            if npc.name.trim().is_empty() {
                report.push(format!("npcs[{}]: missing 'name'.", i));
            }
            if let Some(allowed) = self.npc_prefabs {
                if !prefab.is_empty() && !allowed.iter().any(|p| p.eq_ignore_ascii_case(prefab)) {
                    report.push(format!(
                        "npcs[{}] '{}': unknown prefab '{}'. Valid prefabs: {}.",
                        i,
                        npc.name.trim(),
                        prefab,
                        allowed.join(", ")
                    ));
                }
            }
        }
    }
}
