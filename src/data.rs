use crate::error::DashboardError;
use crate::types::{RiskIndex, RiskRecord};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::info;

const COL_CODE: &str = "SGG_Code";
const COL_DATE: &str = "Date";
const COL_PROVINCE: &str = "시도";
const COL_DISTRICT: &str = "시군구";

/// July-September, the summer season window of the scenario data.
const SUMMER_MONTHS: [u32; 3] = [7, 8, 9];

/// The loaded risk dataset. Immutable after startup.
#[derive(Debug)]
pub struct RiskTable {
    records: Vec<RiskRecord>,
    /// SHA-256 of the source file bytes, so clients can tell apart
    /// dashboards serving different dataset revisions.
    fingerprint: String,
}

impl RiskTable {
    pub fn records(&self) -> &[RiskRecord] {
        &self.records
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Distinct calendar years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        let set: BTreeSet<i32> = self.records.iter().map(|r| r.date.year()).collect();
        set.into_iter().collect()
    }

    /// Distinct region codes present, ascending.
    pub fn region_codes(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.region_code.clone()).collect()
    }

    #[cfg(test)]
    pub fn from_records(records: Vec<RiskRecord>) -> Self {
        RiskTable {
            records,
            fingerprint: String::new(),
        }
    }
}

pub fn load(path: &Path, summer_only: bool) -> Result<RiskTable, DashboardError> {
    if !path.exists() {
        return Err(DashboardError::MissingFile(path.to_path_buf()));
    }
    let bytes = fs::read(path)
        .map_err(|e| DashboardError::format(format!("cannot read {:?}: {}", path, e)))?;

    let fingerprint = hex::encode(Sha256::digest(&bytes));

    // The deploy file is exported UTF-8 with BOM; strip it before the
    // header row is parsed or the first column name comes back mangled.
    let body = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(&bytes);

    let mut rdr = ReaderBuilder::new().from_reader(body);
    let headers = rdr
        .headers()
        .map_err(|e| DashboardError::format(format!("cannot read CSV header: {}", e)))?
        .clone();

    let col = |name: &str| -> Result<usize, DashboardError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DashboardError::format(format!("required column '{}' not found", name)))
    };
    let opt_col = |name: &str| headers.iter().position(|h| h == name);

    let code_idx = col(COL_CODE)?;
    let date_idx = col(COL_DATE)?;
    let hazard_idx = col(RiskIndex::Hazard.column())?;
    let vulner_idx = col(RiskIndex::Vulnerability.column())?;
    let risk_idx = col(RiskIndex::FinalRisk.column())?;

    // Province/district columns are present in some exports only; when they
    // are missing every region gets the synthetic fallback label.
    let province_idx = opt_col(COL_PROVINCE);
    let district_idx = opt_col(COL_DISTRICT);

    let mut records = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result
            .map_err(|e| DashboardError::format(format!("row {}: {}", line + 2, e)))?;

        let raw_code = record.get(code_idx).unwrap_or("");
        if raw_code.trim().is_empty() {
            continue;
        }
        let region_code = normalize_code(raw_code);

        let date = parse_date(record.get(date_idx).unwrap_or("")).ok_or_else(|| {
            DashboardError::format(format!(
                "row {}: unparseable date '{}'",
                line + 2,
                record.get(date_idx).unwrap_or("")
            ))
        })?;

        if summer_only && !SUMMER_MONTHS.contains(&date.month()) {
            continue;
        }

        let score = |idx: usize, name: &str| -> Result<f64, DashboardError> {
            record
                .get(idx)
                .unwrap_or("")
                .trim()
                .parse::<f64>()
                .map_err(|_| {
                    DashboardError::format(format!(
                        "row {}: column '{}' is not a number",
                        line + 2,
                        name
                    ))
                })
        };

        let region_name = derive_name(
            &region_code,
            province_idx.and_then(|i| record.get(i)),
            district_idx.and_then(|i| record.get(i)),
        );

        records.push(RiskRecord {
            region_name,
            date,
            hazard: score(hazard_idx, RiskIndex::Hazard.column())?,
            vulnerability: score(vulner_idx, RiskIndex::Vulnerability.column())?,
            final_risk: score(risk_idx, RiskIndex::FinalRisk.column())?,
            region_code,
        });
    }

    records.sort_by(|a, b| (a.date, &a.region_code).cmp(&(b.date, &b.region_code)));

    info!(
        rows = records.len(),
        fingerprint = %&fingerprint[..12],
        "loaded risk dataset from {:?}",
        path
    );

    Ok(RiskTable {
        records,
        fingerprint,
    })
}

/// Normalize a region code so CSV values join against boundary keys
/// regardless of numeric formatting: "11010", " 11010 " and "11010.0"
/// all become "11010".
pub fn normalize_code(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some((int_part, frac_part)) = trimmed.split_once('.') {
        if !frac_part.is_empty() && frac_part.bytes().all(|b| b == b'0') {
            return int_part.to_string();
        }
    }
    trimmed.to_string()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    // Some exports carry a time component.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.date())
        .ok()
}

/// Province + district when the mapping columns are available, otherwise
/// the synthetic "region code: {code}" label.
fn derive_name(code: &str, province: Option<&str>, district: Option<&str>) -> String {
    match (
        province.map(str::trim).filter(|s| !s.is_empty()),
        district.map(str::trim).filter(|s| !s.is_empty()),
    ) {
        (Some(p), Some(d)) => format!("{} {}", p, d),
        _ => format!("region code: {}", code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FULL_HEADER: &str = "SGG_Code,Date,Future_Risk_Score,최종_취약성_점수,Final_Risk,시도,시군구";

    fn write_csv(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        // BOM, as the deploy export writes it.
        file.write_all(b"\xef\xbb\xbf").unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_rows_and_strips_bom() {
        let file = write_csv(&[
            FULL_HEADER,
            "11010,2027-07-01,0.5,0.3,0.4,서울특별시,종로구",
            "11020,2027-07-01,0.6,0.2,0.5,서울특별시,중구",
        ]);
        let table = load(file.path(), true).unwrap();
        assert_eq!(table.records().len(), 2);
        assert_eq!(table.records()[0].region_code, "11010");
        assert_eq!(table.records()[0].region_name, "서울특별시 종로구");
        assert_eq!(table.years(), vec![2027]);
    }

    #[test]
    fn summer_filter_drops_off_season_rows() {
        let file = write_csv(&[
            FULL_HEADER,
            "11010,2027-03-01,0.5,0.3,0.4,서울특별시,종로구",
            "11010,2027-08-15,0.5,0.3,0.4,서울특별시,종로구",
            "11010,2027-09-30,0.5,0.3,0.4,서울특별시,종로구",
        ]);
        let table = load(file.path(), true).unwrap();
        assert_eq!(table.records().len(), 2);

        let unfiltered = load(file.path(), false).unwrap();
        assert_eq!(unfiltered.records().len(), 3);
    }

    #[test]
    fn float_formatted_codes_normalize() {
        let file = write_csv(&[
            FULL_HEADER,
            "11010.0,2027-07-01,0.5,0.3,0.4,서울특별시,종로구",
        ]);
        let table = load(file.path(), true).unwrap();
        assert_eq!(table.records()[0].region_code, "11010");
    }

    #[test]
    fn normalize_code_cases() {
        assert_eq!(normalize_code("11010"), "11010");
        assert_eq!(normalize_code(" 11010 "), "11010");
        assert_eq!(normalize_code("11010.0"), "11010");
        assert_eq!(normalize_code("11010.00"), "11010");
        // A genuine fraction is not an integer code; leave it alone.
        assert_eq!(normalize_code("11010.5"), "11010.5");
    }

    #[test]
    fn falls_back_to_synthetic_label_without_mapping_columns() {
        let file = write_csv(&[
            "SGG_Code,Date,Future_Risk_Score,최종_취약성_점수,Final_Risk",
            "11010,2027-07-01,0.5,0.3,0.4",
        ]);
        let table = load(file.path(), true).unwrap();
        assert_eq!(table.records()[0].region_name, "region code: 11010");
    }

    #[test]
    fn missing_required_column_is_a_format_error() {
        let file = write_csv(&[
            "SGG_Code,Date,Future_Risk_Score,최종_취약성_점수",
            "11010,2027-07-01,0.5,0.3",
        ]);
        let err = load(file.path(), true).unwrap_err();
        assert!(matches!(err, DashboardError::Format(_)), "{:?}", err);
    }

    #[test]
    fn missing_file_is_its_own_error() {
        let err = load(Path::new("/nonexistent/Final_Risk_Deploy.csv"), true).unwrap_err();
        assert!(matches!(err, DashboardError::MissingFile(_)));
    }

    #[test]
    fn datetime_stamped_cells_parse() {
        let file = write_csv(&[
            FULL_HEADER,
            "11010,2027-07-01 00:00:00,0.5,0.3,0.4,서울특별시,종로구",
        ]);
        let table = load(file.path(), true).unwrap();
        assert_eq!(
            table.records()[0].date,
            NaiveDate::from_ymd_opt(2027, 7, 1).unwrap()
        );
    }
}
