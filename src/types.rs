use chrono::NaiveDate;
use serde::Serialize;

/// One row of the risk dataset after normalization.
#[derive(Debug, Clone)]
pub struct RiskRecord {
    /// Municipal subdivision code (SGG_Code), normalized so it joins
    /// against the boundary document's `properties.code`.
    pub region_code: String,
    pub region_name: String,
    pub date: NaiveDate,
    pub hazard: f64,
    pub vulnerability: f64,
    pub final_risk: f64,
}

impl RiskRecord {
    pub fn score(&self, index: RiskIndex) -> f64 {
        match index {
            RiskIndex::Hazard => self.hazard,
            RiskIndex::Vulnerability => self.vulnerability,
            RiskIndex::FinalRisk => self.final_risk,
        }
    }
}

/// The three precomputed risk sub-indices. Their computation is upstream;
/// we only display them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskIndex {
    Hazard,
    Vulnerability,
    FinalRisk,
}

impl RiskIndex {
    pub const ALL: [RiskIndex; 3] = [
        RiskIndex::Hazard,
        RiskIndex::Vulnerability,
        RiskIndex::FinalRisk,
    ];

    /// Source column in Final_Risk_Deploy.csv.
    pub fn column(self) -> &'static str {
        match self {
            RiskIndex::Hazard => "Future_Risk_Score",
            RiskIndex::Vulnerability => "최종_취약성_점수",
            RiskIndex::FinalRisk => "Final_Risk",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            RiskIndex::Hazard => "Future Hazard Index",
            RiskIndex::Vulnerability => "Final Vulnerability Score",
            RiskIndex::FinalRisk => "Composite Risk Index",
        }
    }

    /// Plotly continuous color scale name.
    pub fn color_scale(self) -> &'static str {
        match self {
            RiskIndex::Hazard => "YlOrBr",
            RiskIndex::Vulnerability => "Purples",
            RiskIndex::FinalRisk => "Reds",
        }
    }
}

/// Records of one calendar year, borrowed from the full table.
/// An empty slice is a valid value; callers must not assume rows exist.
#[derive(Debug, Clone)]
pub struct YearSlice<'a> {
    pub year: i32,
    pub records: Vec<&'a RiskRecord>,
}

impl YearSlice<'_> {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
