use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use titler_core::Location;

use crate::error::{ArxivError, Result};

// Viewer file name: <base>[v<digits>].pdf
static PDF_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^v]+)(v([0-9]*))?\.pdf$").unwrap());

/// A submission ID taken from a PDF viewer path, version suffix stripped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArxivId {
    /// The file name it was extracted from, e.g. `1706.03762v5.pdf`.
    pub raw: String,
    /// Version-independent ID, e.g. `1706.03762`.
    pub id: String,
    pub version: Option<u32>,
}

impl fmt::Display for ArxivId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Year and month encoded in the first four digits of a new-style ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeBucket {
    pub year: String,
    pub month: String,
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.year, self.month)
    }
}

/// Last `/`-separated segment of `path`.
fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

pub fn is_pdf_path(path: &str) -> bool {
    last_segment(path).ends_with(".pdf")
}

/// Extract the submission ID from a viewer path such as `/pdf/1706.03762v5.pdf`.
pub fn extract_id(path: &str) -> Result<ArxivId> {
    let name = last_segment(path);
    let caps = PDF_NAME
        .captures(name)
        .ok_or_else(|| ArxivError::NoMatch(path.to_string()))?;

    Ok(ArxivId {
        raw: name.to_string(),
        id: caps[1].to_string(),
        version: caps.get(3).and_then(|v| v.as_str().parse().ok()),
    })
}

/// `YYMM...` → (`20YY`, `MM`). Not validated against a calendar.
pub fn extract_time_bucket(id: &str) -> TimeBucket {
    let year: String = id.chars().take(2).collect();
    TimeBucket {
        year: format!("20{year}"),
        month: id.chars().skip(2).take(2).collect(),
    }
}

/// Abstract page path for a viewer path: `/pdf/` → `/abs/`, `.pdf` dropped.
pub fn abs_path_for(pdf_path: &str) -> String {
    pdf_path.replacen("/pdf/", "/abs/", 1).replacen(".pdf", "", 1)
}

/// Split a page URL into the origin and path the page logic works from.
pub fn parse_location(url: &str) -> Result<Location> {
    let parsed = Url::parse(url).map_err(|e| ArxivError::InvalidUrl(url.to_string(), e.to_string()))?;
    if !parsed.has_host() {
        return Err(ArxivError::InvalidUrl(url.to_string(), "no host".to_string()));
    }
    Ok(Location::new(
        parsed.origin().ascii_serialization(),
        parsed.path(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versioned_path() {
        let id = extract_id("/pdf/1706.03762v5.pdf").unwrap();
        assert_eq!(id.id, "1706.03762");
        assert_eq!(id.version, Some(5));
        assert_eq!(id.raw, "1706.03762v5.pdf");
    }

    #[test]
    fn unversioned_path() {
        let id = extract_id("/pdf/2107.12345.pdf").unwrap();
        assert_eq!(id.id, "2107.12345");
        assert_eq!(id.version, None);
    }

    #[test]
    fn bare_file_name() {
        assert_eq!(extract_id("0704.0001v1.pdf").unwrap().id, "0704.0001");
    }

    #[test]
    fn versions_share_an_id() {
        let a = extract_id("/pdf/2301.04567v1.pdf").unwrap();
        let b = extract_id("/pdf/2301.04567v3.pdf").unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn reject_non_pdf() {
        assert!(matches!(
            extract_id("/abs/1706.03762"),
            Err(ArxivError::NoMatch(_))
        ));
        assert!(extract_id("/pdf/1706.03762v5.pdf.bak").is_err());
    }

    #[test]
    fn reject_missing_base() {
        assert!(extract_id("/pdf/v2.pdf").is_err());
        assert!(extract_id("/pdf/.pdf").is_err());
        assert!(extract_id("/pdf/").is_err());
    }

    #[test]
    fn time_bucket_from_digits() {
        let bucket = extract_time_bucket("2107123");
        assert_eq!(bucket.year, "2021");
        assert_eq!(bucket.month, "07");
        assert_eq!(bucket.to_string(), "2021.07");
        assert_eq!(extract_time_bucket("2107.99999"), bucket);
    }

    #[test]
    fn time_bucket_short_id_is_not_validated() {
        let bucket = extract_time_bucket("9");
        assert_eq!(bucket.year, "209");
        assert_eq!(bucket.month, "");
    }

    #[test]
    fn pdf_path_detection() {
        assert!(is_pdf_path("/pdf/1706.03762v5.pdf"));
        assert!(!is_pdf_path("/abs/1706.03762v5"));
    }

    #[test]
    fn abs_path_from_pdf_path() {
        assert_eq!(abs_path_for("/pdf/1706.03762v5.pdf"), "/abs/1706.03762v5");
    }

    #[test]
    fn location_from_url() {
        let location = parse_location("https://arxiv.org/pdf/1706.03762v5.pdf?x=1#page=2").unwrap();
        assert_eq!(location.origin, "https://arxiv.org");
        assert_eq!(location.pathname, "/pdf/1706.03762v5.pdf");
        assert_eq!(location.last_segment(), "1706.03762v5.pdf");
    }

    #[test]
    fn location_rejects_garbage() {
        assert!(matches!(
            parse_location("arxiv.org/pdf/1706.03762.pdf"),
            Err(ArxivError::InvalidUrl(_, _))
        ));
        assert!(parse_location("mailto:someone@example.com").is_err());
    }
}
