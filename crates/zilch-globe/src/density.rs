//! Density records and the distribution payload.
//!
//! The data service delivers the distribution as a JSON array of
//! `{"Latitude", "Longitude", "ZipCodes"}` objects, optionally wrapped in a
//! JSONP callback. Entries that lack a usable field are skipped one by one so a
//! single bad entry never costs the whole overlay.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One geographic sample: a location and the number of zip codes in it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityRecord {
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "ZipCodes")]
    pub count: u32,
}

impl DensityRecord {
    pub fn new(latitude: f64, longitude: f64, count: u32) -> Self {
        Self {
            longitude,
            latitude,
            count,
        }
    }

    /// Whether the coordinates can be projected.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
    }
}

/// Parsed distribution payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DensityPayload {
    /// Records that parsed cleanly, in payload order.
    pub records: Vec<DensityRecord>,
    /// Number of entries dropped as malformed.
    pub skipped: usize,
}

impl DensityPayload {
    /// Sum of all record counts.
    pub fn total_count(&self) -> u64 {
        self.records.iter().map(|r| u64::from(r.count)).sum()
    }
}

/// Parse a JSON or JSONP distribution payload.
///
/// Fails only if the payload is not an array; bad entries are logged and
/// counted in [`DensityPayload::skipped`].
pub fn parse_payload(text: &str) -> Result<DensityPayload> {
    let json = strip_jsonp(text)?;
    let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;

    let mut payload = DensityPayload {
        records: Vec::with_capacity(entries.len()),
        skipped: 0,
    };

    for (index, entry) in entries.into_iter().enumerate() {
        match DensityRecord::deserialize(&entry) {
            Ok(record) if record.is_valid() => payload.records.push(record),
            Ok(record) => {
                tracing::warn!(
                    index,
                    latitude = record.latitude,
                    longitude = record.longitude,
                    "Skipping density record with out-of-range coordinates"
                );
                payload.skipped += 1;
            }
            Err(e) => {
                tracing::warn!(index, "Skipping malformed density record: {e}");
                payload.skipped += 1;
            }
        }
    }

    tracing::info!(
        "Parsed density payload: {} records, {} skipped",
        payload.records.len(),
        payload.skipped
    );

    Ok(payload)
}

/// Remove a `callback( ... );` wrapper if present.
fn strip_jsonp(text: &str) -> Result<&str> {
    let trimmed = text.trim().trim_end_matches(';').trim_end();
    if trimmed.starts_with('[') {
        return Ok(trimmed);
    }

    let Some(open) = trimmed.find('(') else {
        return Err(Error::Payload {
            detail: "expected a JSON array or a JSONP callback".to_string(),
        });
    };
    let callback = &trimmed[..open];
    let valid_callback = !callback.is_empty()
        && callback
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.'));
    if !valid_callback || !trimmed.ends_with(')') {
        return Err(Error::Payload {
            detail: "malformed JSONP wrapper".to_string(),
        });
    }

    Ok(&trimmed[open + 1..trimmed.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let payload = parse_payload(
            r#"[{"Latitude":40,"Longitude":-74,"ZipCodes":1200},
                {"Latitude":51,"Longitude":0,"ZipCodes":300}]"#,
        )
        .unwrap();

        assert_eq!(payload.skipped, 0);
        assert_eq!(
            payload.records,
            vec![
                DensityRecord::new(40.0, -74.0, 1200),
                DensityRecord::new(51.0, 0.0, 300),
            ]
        );
        assert_eq!(payload.total_count(), 1500);
    }

    #[test]
    fn test_parse_jsonp() {
        let payload =
            parse_payload("JSON_CALLBACK([{\"Latitude\":1,\"Longitude\":2,\"ZipCodes\":3}]);\n")
                .unwrap();
        assert_eq!(payload.records, vec![DensityRecord::new(1.0, 2.0, 3)]);
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let payload = parse_payload(
            r#"[{"Latitude":10,"Longitude":20,"ZipCodes":5},
                {"Latitude":10,"ZipCodes":5},
                {"Latitude":"north","Longitude":20,"ZipCodes":5},
                {"Latitude":95,"Longitude":20,"ZipCodes":5},
                {"Latitude":10,"Longitude":20,"ZipCodes":-1},
                42]"#,
        )
        .unwrap();

        assert_eq!(payload.records, vec![DensityRecord::new(10.0, 20.0, 5)]);
        assert_eq!(payload.skipped, 5);
    }

    #[test]
    fn test_empty_array() {
        let payload = parse_payload("[]").unwrap();
        assert!(payload.records.is_empty());
        assert_eq!(payload.skipped, 0);
    }

    #[test]
    fn test_non_array_payload_fails() {
        assert!(matches!(
            parse_payload(r#"{"Latitude":1}"#),
            Err(Error::Payload { .. })
        ));
        assert!(matches!(
            parse_payload("alert(1"),
            Err(Error::Payload { .. })
        ));
        assert!(matches!(
            parse_payload("cb({\"a\":1})"),
            Err(Error::Payload { .. })
        ));
    }
}
