//! Pure projections from the loaded dataset to render parameters. No UI or
//! HTTP types in here, so year selection logic is testable on its own.

use crate::data::RiskTable;
use crate::error::DashboardError;
use crate::types::{RiskIndex, YearSlice};
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;

/// Fixed color ranges per index, spanning the ENTIRE dataset rather than
/// the selected year, so colors compare across years within one session.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ColorRanges {
    hazard_max: f64,
    vulnerability_max: f64,
    final_risk_max: f64,
}

impl ColorRanges {
    pub fn range(&self, index: RiskIndex) -> [f64; 2] {
        let max = match index {
            RiskIndex::Hazard => self.hazard_max,
            RiskIndex::Vulnerability => self.vulnerability_max,
            RiskIndex::FinalRisk => self.final_risk_max,
        };
        [0.0, max]
    }
}

pub fn color_ranges(table: &RiskTable) -> ColorRanges {
    let max_of = |index: RiskIndex| {
        table
            .records()
            .iter()
            .map(|r| r.score(index))
            .fold(0.0_f64, f64::max)
    };
    ColorRanges {
        hazard_max: max_of(RiskIndex::Hazard),
        vulnerability_max: max_of(RiskIndex::Vulnerability),
        final_risk_max: max_of(RiskIndex::FinalRisk),
    }
}

/// Narrow the table to one calendar year. A year with no rows yields an
/// empty slice, which is a valid value for the caller to handle.
pub fn year_slice(table: &RiskTable, year: i32) -> YearSlice<'_> {
    let records = table
        .records()
        .iter()
        .filter(|r| r.date.year() == year)
        .collect();
    YearSlice { year, records }
}

/// The peak-value summary shown above each map.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PeakSummary {
    pub region_name: String,
    pub date: String,
    pub value: f64,
}

/// Row with the maximum score for the index. Guarded: an empty slice is
/// an `EmptyYear` error, not a panic.
pub fn peak(slice: &YearSlice<'_>, index: RiskIndex) -> Result<PeakSummary, DashboardError> {
    let best = slice
        .records
        .iter()
        .max_by(|a, b| a.score(index).total_cmp(&b.score(index)))
        .ok_or(DashboardError::EmptyYear(slice.year))?;
    Ok(PeakSummary {
        region_name: best.region_name.clone(),
        date: best.date.format("%Y-%m-%d").to_string(),
        value: best.score(index),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameEntry {
    pub code: String,
    pub name: String,
    pub value: f64,
}

/// One animation step: every region's value on one date.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub date: String,
    pub entries: Vec<FrameEntry>,
}

/// One frame per distinct date in the slice, in date order.
pub fn frames(slice: &YearSlice<'_>, index: RiskIndex) -> Vec<Frame> {
    let mut by_date: BTreeMap<String, Vec<FrameEntry>> = BTreeMap::new();
    for record in &slice.records {
        by_date
            .entry(record.date.format("%Y-%m-%d").to_string())
            .or_default()
            .push(FrameEntry {
                code: record.region_code.clone(),
                name: record.region_name.clone(),
                value: record.score(index),
            });
    }
    by_date
        .into_iter()
        .map(|(date, entries)| Frame { date, entries })
        .collect()
}
