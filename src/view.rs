//! View models for the client-side map renderer. Each map gets its peak
//! metrics, animation frames, and a session-fixed color range; the browser
//! does the actual choropleth drawing.

use crate::data::RiskTable;
use crate::projection::{self, ColorRanges, Frame, PeakSummary};
use crate::types::RiskIndex;
use serde::Serialize;

/// Render parameters for one animated choropleth.
#[derive(Debug, Serialize)]
pub struct MapView {
    pub index: RiskIndex,
    pub title: &'static str,
    pub color_scale: &'static str,
    pub color_range: [f64; 2],
    pub peak: PeakSummary,
    pub frames: Vec<Frame>,
}

/// Everything the page needs after a year selection. A year with no rows
/// carries a warning instead of maps; selecting it is not an error.
#[derive(Debug, Serialize)]
pub struct YearView {
    pub year: i32,
    pub warning: Option<String>,
    pub maps: Vec<MapView>,
}

pub fn build_year_view(table: &RiskTable, ranges: &ColorRanges, year: i32) -> YearView {
    let slice = projection::year_slice(table, year);

    if slice.is_empty() {
        return YearView {
            year,
            warning: Some(format!(
                "No summer-season rows for {}. Pick another year from the list.",
                year
            )),
            maps: Vec::new(),
        };
    }

    let maps = RiskIndex::ALL
        .iter()
        .filter_map(|&index| {
            // Peak lookup cannot fail here; the slice is non-empty.
            let peak = projection::peak(&slice, index).ok()?;
            Some(MapView {
                index,
                title: index.title(),
                color_scale: index.color_scale(),
                color_range: ranges.range(index),
                peak,
                frames: projection::frames(&slice, index),
            })
        })
        .collect();

    YearView {
        year,
        warning: None,
        maps,
    }
}
