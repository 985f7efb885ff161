use crate::data::normalize_code;
use crate::error::DashboardError;
use geojson::GeoJson;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// The municipal boundary feature collection. Treated as an opaque,
/// immutable resource: geometry goes to the client byte-for-byte, we only
/// index the region codes for join diagnostics.
#[derive(Debug)]
pub struct BoundaryDocument {
    /// Verbatim GeoJSON body, served as-is.
    raw: String,
    codes: BTreeSet<String>,
    feature_count: usize,
}

impl BoundaryDocument {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn codes(&self) -> &BTreeSet<String> {
        &self.codes
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.codes.contains(code)
    }
}

/// Load the boundary document, preferring the local cache. The upstream
/// file is static, so a cache hit never revalidates.
pub async fn load(url: &str, cache: Option<&Path>) -> Result<BoundaryDocument, DashboardError> {
    if let Some(path) = cache {
        if path.exists() {
            info!("reading boundary document from cache {:?}", path);
            let body = fs::read_to_string(path)
                .map_err(|e| DashboardError::format(format!("cannot read {:?}: {}", path, e)))?;
            return parse_document(&body);
        }
    }

    info!("fetching boundary document from {}", url);
    let response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|source| DashboardError::Network {
            url: url.to_string(),
            source,
        })?;
    let body = response.text().await.map_err(|source| DashboardError::Network {
        url: url.to_string(),
        source,
    })?;

    let document = parse_document(&body)?;

    if let Some(path) = cache {
        if let Err(e) = fs::write(path, &body) {
            warn!("could not write boundary cache {:?}: {}", path, e);
        }
    }

    Ok(document)
}

/// Validate the body as a GeoJSON FeatureCollection and index the
/// `properties.code` values. Codes may arrive as JSON strings or numbers;
/// both are normalized to the same form the CSV codes use.
pub fn parse_document(body: &str) -> Result<BoundaryDocument, DashboardError> {
    let geojson: GeoJson = body
        .parse()
        .map_err(|e| DashboardError::format(format!("boundary document is not valid GeoJSON: {}", e)))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => {
            return Err(DashboardError::format(
                "boundary document must be a FeatureCollection",
            ))
        }
    };

    let mut codes = BTreeSet::new();
    let feature_count = collection.features.len();

    for feature in &collection.features {
        let code = feature
            .properties
            .as_ref()
            .and_then(|props| props.get("code"));
        match code {
            Some(serde_json::Value::String(s)) => {
                codes.insert(normalize_code(s));
            }
            Some(serde_json::Value::Number(n)) => {
                codes.insert(normalize_code(&n.to_string()));
            }
            _ => {}
        }
    }

    info!(
        features = feature_count,
        coded = codes.len(),
        "parsed boundary document"
    );

    Ok(BoundaryDocument {
        raw: body.to_string(),
        codes,
        feature_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(code: &str) -> String {
        format!(
            r#"{{"type":"Feature","properties":{{"code":{},"name":"test"}},
               "geometry":{{"type":"Polygon","coordinates":[[[127.0,37.0],[127.1,37.0],[127.1,37.1],[127.0,37.0]]]}}}}"#,
            code
        )
    }

    fn collection(codes: &[&str]) -> String {
        let features: Vec<String> = codes.iter().map(|c| feature(c)).collect();
        format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            features.join(",")
        )
    }

    #[test]
    fn indexes_string_codes() {
        let doc = parse_document(&collection(&[r#""11010""#, r#""11020""#])).unwrap();
        assert_eq!(doc.feature_count(), 2);
        assert!(doc.contains_code("11010"));
        assert!(doc.contains_code("11020"));
    }

    #[test]
    fn numeric_codes_join_against_string_csv_codes() {
        let doc = parse_document(&collection(&["11010"])).unwrap();
        assert!(doc.contains_code("11010"));
        assert!(doc.contains_code(&normalize_code("11010.0")));
    }

    #[test]
    fn rejects_bare_geometry() {
        let body = r#"{"type":"Point","coordinates":[127.0,37.0]}"#;
        let err = parse_document(body).unwrap_err();
        assert!(matches!(err, DashboardError::Format(_)));
    }

    #[test]
    fn rejects_invalid_json() {
        let err = parse_document("not json at all").unwrap_err();
        assert!(matches!(err, DashboardError::Format(_)));
    }

    #[test]
    fn features_without_codes_are_tolerated() {
        let body = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"name":"no code"},"geometry":null}]}"#;
        let doc = parse_document(body).unwrap();
        assert_eq!(doc.feature_count(), 1);
        assert!(doc.codes().is_empty());
    }
}
