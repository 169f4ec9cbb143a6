//! Gating and presentation policy for the step flow.
//!
//! Holds the required OCR field set that decides whether the edit step can
//! be left, the confidence banding used to flag doubtful fields, and the
//! checks a selected file must pass before it is recorded as an upload.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::FieldValue;

/// Fields that must be present and non-blank before the edit step opens its gate.
pub const REQUIRED_FIELDS: [&str; 4] = ["reportNumber", "date", "violationType", "fineAmount"];

/// MIME types accepted for upload.
pub const ACCEPTED_TYPES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];

/// Default upload ceiling: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Returns `true` when every required field is present and non-blank after trimming.
///
/// The whole set is checked on every call, so the result does not depend on
/// the order in which fields were filled in or edited.
pub fn has_all_required(fields: &BTreeMap<String, FieldValue>) -> bool {
    REQUIRED_FIELDS
        .iter()
        .all(|name| fields.get(*name).is_some_and(|value| !value.is_blank()))
}

/// Lists required fields that are missing or blank, in declaration order.
pub fn missing_required(fields: &BTreeMap<String, FieldValue>) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|name| fields.get(*name).is_none_or(FieldValue::is_blank))
        .collect()
}

/// Reliability band for an OCR confidence score. Presentation only, never gating.
///
/// Variants are declared from least to most reliable so the derived ordering
/// follows the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfidenceBand {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceBand {
    /// Classifies a score in `[0, 1]`. Lower bounds are inclusive.
    pub fn classify(score: f64) -> Self {
        if score >= 0.9 {
            ConfidenceBand::VeryHigh
        } else if score >= 0.8 {
            ConfidenceBand::High
        } else if score >= 0.65 {
            ConfidenceBand::Medium
        } else if score >= 0.5 {
            ConfidenceBand::Low
        } else {
            ConfidenceBand::VeryLow
        }
    }

    /// Band for a field, treating an unscored field as score 0.
    pub fn for_field(scores: &BTreeMap<String, f64>, field: &str) -> Self {
        Self::classify(scores.get(field).copied().unwrap_or(0.0))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceBand::VeryHigh => "very-high",
            ConfidenceBand::High => "high",
            ConfidenceBand::Medium => "medium",
            ConfidenceBand::Low => "low",
            ConfidenceBand::VeryLow => "very-low",
        }
    }

    /// Whether the user should be prompted to double-check the field.
    pub fn needs_review(self) -> bool {
        self <= ConfidenceBand::Low
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a selected file was refused before upload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("unsupported file type `{0}`, expected JPG, PNG or PDF")]
    UnsupportedType(String),

    #[error("file is too large ({size} bytes, maximum {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("file name is empty")]
    EmptyName,
}

/// Infers the MIME type of an upload candidate from its extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

/// Checks a file's name, type and size against the upload policy.
pub fn validate_upload(
    file_name: &str,
    file_type: &str,
    file_size: u64,
    max_bytes: u64,
) -> Result<(), UploadRejection> {
    if file_name.trim().is_empty() {
        return Err(UploadRejection::EmptyName);
    }
    if !ACCEPTED_TYPES.contains(&file_type) {
        return Err(UploadRejection::UnsupportedType(file_type.to_string()));
    }
    if file_size > max_bytes {
        return Err(UploadRejection::TooLarge {
            size: file_size,
            max: max_bytes,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, FieldValue)]) -> BTreeMap<String, FieldValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn all_required_present() {
        let f = fields(&[
            ("reportNumber", "A-123".into()),
            ("date", "2024-03-05".into()),
            ("violationType", "speeding".into()),
            ("fineAmount", "500".into()),
        ]);
        assert!(has_all_required(&f));
        assert!(missing_required(&f).is_empty());
    }

    #[test]
    fn whitespace_only_counts_as_blank() {
        let f = fields(&[
            ("reportNumber", "A-123".into()),
            ("date", "2024-03-05".into()),
            ("violationType", "   ".into()),
            ("fineAmount", "500".into()),
        ]);
        assert!(!has_all_required(&f));
        assert_eq!(missing_required(&f), vec!["violationType"]);
    }

    #[test]
    fn numeric_value_counts_as_present() {
        let f = fields(&[
            ("reportNumber", "A-123".into()),
            ("date", "2024-03-05".into()),
            ("violationType", "speeding".into()),
            ("fineAmount", FieldValue::Number(250.0)),
        ]);
        assert!(has_all_required(&f));
    }

    #[test]
    fn missing_fields_listed_in_order() {
        let f = fields(&[("date", "2024-03-05".into())]);
        assert_eq!(
            missing_required(&f),
            vec!["reportNumber", "violationType", "fineAmount"]
        );
    }

    #[test]
    fn confidence_band_boundaries() {
        assert_eq!(ConfidenceBand::classify(0.9), ConfidenceBand::VeryHigh);
        assert_eq!(ConfidenceBand::classify(0.89999), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::classify(0.8), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::classify(0.65), ConfidenceBand::Medium);
        assert_eq!(ConfidenceBand::classify(0.5), ConfidenceBand::Low);
        assert_eq!(ConfidenceBand::classify(0.49999), ConfidenceBand::VeryLow);
        assert_eq!(ConfidenceBand::classify(0.0), ConfidenceBand::VeryLow);
        assert_eq!(ConfidenceBand::classify(1.0), ConfidenceBand::VeryHigh);
    }

    #[test]
    fn confidence_band_is_monotonic() {
        let mut previous = ConfidenceBand::classify(0.0);
        for i in 1..=1000 {
            let band = ConfidenceBand::classify(f64::from(i) / 1000.0);
            assert!(band >= previous, "band dropped at {i}");
            previous = band;
        }
    }

    #[test]
    fn unscored_field_is_very_low() {
        let scores = BTreeMap::from([("date".to_string(), 0.95)]);
        assert_eq!(
            ConfidenceBand::for_field(&scores, "date"),
            ConfidenceBand::VeryHigh
        );
        assert_eq!(
            ConfidenceBand::for_field(&scores, "location"),
            ConfidenceBand::VeryLow
        );
        assert!(ConfidenceBand::VeryLow.needs_review());
        assert!(!ConfidenceBand::Medium.needs_review());
    }

    #[test]
    fn band_display_uses_kebab_case() {
        assert_eq!(ConfidenceBand::VeryHigh.to_string(), "very-high");
        assert_eq!(
            serde_json::to_string(&ConfidenceBand::VeryLow).unwrap(),
            r#""very-low""#
        );
    }

    #[test]
    fn mime_inferred_from_extension() {
        assert_eq!(mime_for_path(Path::new("ticket.JPG")), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("scan.png")), Some("image/png"));
        assert_eq!(mime_for_path(Path::new("doc.pdf")), Some("application/pdf"));
        assert_eq!(mime_for_path(Path::new("notes.txt")), None);
        assert_eq!(mime_for_path(Path::new("noext")), None);
    }

    #[test]
    fn upload_policy() {
        assert!(validate_upload("a.jpg", "image/jpeg", 1024, DEFAULT_MAX_UPLOAD_BYTES).is_ok());
        assert_eq!(
            validate_upload("a.gif", "image/gif", 1024, DEFAULT_MAX_UPLOAD_BYTES),
            Err(UploadRejection::UnsupportedType("image/gif".into()))
        );
        assert_eq!(
            validate_upload("big.pdf", "application/pdf", 11 * 1024 * 1024, DEFAULT_MAX_UPLOAD_BYTES),
            Err(UploadRejection::TooLarge {
                size: 11 * 1024 * 1024,
                max: DEFAULT_MAX_UPLOAD_BYTES
            })
        );
        assert_eq!(
            validate_upload(" ", "image/png", 1, DEFAULT_MAX_UPLOAD_BYTES),
            Err(UploadRejection::EmptyName)
        );
    }
}
