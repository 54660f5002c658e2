//! Auto-packing of buildings along street sides
//!
//! Buildings sharing a street side are laid out contiguously, centred on
//! the street midpoint, in the order the generator placed them. A street
//! too short for its occupants grows; layouts are never rejected.

use crate::town::schema::TownDocument;
use crate::town::zones::{Side, ZoneCatalog};
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

/// Spacing between neighbouring plots on one side of a street
pub const GUTTER: f32 = 2.0;

/// Length kept free at the street ends beyond the packed row
pub const END_MARGIN: f32 = 10.0;

/// Width of the street surface itself
pub const STREET_WIDTH: f32 = 12.0;

/// Gap between the street edge and a building's facade
pub const SETBACK: f32 = 2.0;

/// A street whose length changed while packing
#[derive(Debug, Clone, PartialEq)]
pub struct StreetExtension {
    pub street_index: usize,
    pub old_length: f32,
    pub new_length: f32,
}

/// What `auto_pack` changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackReport {
    /// `(street, side)` groups with two or more buildings that were laid out
    pub groups_packed: usize,
    pub extended: Vec<StreetExtension>,
}

/// Total along-street width a row of plots needs, gutters included
pub fn required_width(plot_widths: &[f32]) -> f32 {
    if plot_widths.is_empty() {
        return 0.0;
    }
    plot_widths.iter().sum::<f32>() + GUTTER * (plot_widths.len() - 1) as f32
}

/// Remove overlap between buildings on the same street side, in place.
///
/// `End` buildings are not packed. Groups of one keep their offset.
pub fn auto_pack(doc: &mut TownDocument, zones: &ZoneCatalog) -> PackReport {
    let mut report = PackReport::default();

    let mut groups: BTreeMap<(usize, Side), Vec<usize>> = BTreeMap::new();
    for (i, building) in doc.buildings.iter().enumerate() {
        let side = building.layout_side();
        if side == Side::End {
            continue;
        }
        groups.entry((building.street_index, side)).or_default().push(i);
    }

    for ((street_index, side), mut members) in groups {
        if members.len() < 2 {
            continue;
        }
        let Some(street) = doc.streets.get_mut(street_index) else {
            continue;
        };

        // Stable: equal offsets keep document order
        members.sort_by_key(|&i| OrderedFloat(doc.buildings[i].offset()));

        let plots: Vec<f32> = members
            .iter()
            .map(|&i| plot_width(&doc.buildings[i].zone, zones))
            .collect();
        let total = required_width(&plots);

        if total > street.length - END_MARGIN {
            let old_length = street.length;
            street.length = total + END_MARGIN;
            tracing::debug!(
                "Extended street '{}' from {:.1} to {:.1} for {} buildings on the {} side",
                street.name,
                old_length,
                street.length,
                members.len(),
                side
            );
            report.extended.push(StreetExtension {
                street_index,
                old_length,
                new_length: street.length,
            });
        }

        let mut cursor = -total / 2.0;
        for (&i, &plot) in members.iter().zip(&plots) {
            doc.buildings[i].z_pos = Some(cursor + plot / 2.0);
            cursor += plot + GUTTER;
        }
        report.groups_packed += 1;
    }

    report
}

fn plot_width(zone: &Option<String>, zones: &ZoneCatalog) -> f32 {
    zones.plot(zone.as_deref().unwrap_or_default()).0
}
