//! Shared models used across the resume search crates.

use serde::{Deserialize, Serialize};

/// Department stored when the upload carries none.
pub const DEFAULT_DEPARTMENT: &str = "General";

/// Sentinel candidate name when extraction finds nothing usable.
pub const NAME_NOT_FOUND: &str = "Name Not Found";

/// Unique id for a stored resume, assigned at ingestion and immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResumeId(pub String);

impl std::fmt::Display for ResumeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields produced by a document extractor for one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    /// Full extracted text of the document.
    pub text: String,
    /// Candidate name, or [`NAME_NOT_FOUND`] when no heuristic matched.
    pub name: String,
    /// First email address found, or empty.
    pub email: String,
    /// Best-effort years-of-experience estimate.
    pub experience_years: u32,
}

/// Metadata attached to each stored vector and returned with search results.
///
/// `experience_years` is always a non-negative integer and `department` is
/// never empty; [`ResumePayload::compose`] enforces both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumePayload {
    pub s3_url: String,
    pub candidate_name: String,
    pub email: String,
    pub experience_years: u32,
    pub department: String,
    /// Full text, used for keyword matching only.
    pub resume_text: String,
}

impl ResumePayload {
    /// Build the stored payload from extracted fields plus caller overrides.
    ///
    /// A non-empty override wins over the extracted value; an override that
    /// is present but unparseable stores 0 rather than falling back. Absent
    /// department maps to [`DEFAULT_DEPARTMENT`].
    pub fn compose(
        extracted: &ExtractedFields,
        s3_url: impl Into<String>,
        department_override: Option<&str>,
        experience_override: Option<&str>,
    ) -> Self {
        let experience_years = match experience_override.map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_experience_years(Some(raw)).unwrap_or(0),
            _ => extracted.experience_years,
        };
        let department = match department_override.map(str::trim) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => DEFAULT_DEPARTMENT.to_string(),
        };
        Self {
            s3_url: s3_url.into(),
            candidate_name: extracted.name.clone(),
            email: extracted.email.clone(),
            experience_years,
            department,
            resume_text: extracted.text.clone(),
        }
    }
}

/// One record in the vector collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub id: ResumeId,
    pub vector: Vec<f32>,
    pub payload: ResumePayload,
}

/// Parse a free-form experience-years field into a non-negative integer.
///
/// `None`, empty, the literal string `"None"`, negative, fractional, or
/// otherwise unparseable input yields `None`; callers pick their default.
pub fn parse_experience_years(raw: Option<&str>) -> Option<u32> {
    let raw = raw?.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
        return None;
    }
    raw.parse::<u32>().ok()
}

/// Named experience-years range used for filtering.
///
/// The inclusive bounds here are the single source of truth for bucket
/// membership at both ingestion and query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceBucket {
    ZeroToTwo,
    ThreeToFive,
    SixToTen,
    TenPlus,
    Any,
}

/// Rejected bucket tag, reported before any index access.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown experience bucket: {0:?} (expected 0-2, 3-5, 6-10, 10+ or Any)")]
pub struct BucketParseError(pub String);

impl ExperienceBucket {
    /// Parse a bucket tag. Empty and `Any` (case-insensitive) mean no
    /// constraint; anything else unknown is an error.
    pub fn parse(tag: &str) -> Result<Self, BucketParseError> {
        let tag = tag.trim();
        if tag.is_empty() || tag.eq_ignore_ascii_case("any") {
            return Ok(Self::Any);
        }
        match tag {
            "0-2" => Ok(Self::ZeroToTwo),
            "3-5" => Ok(Self::ThreeToFive),
            "6-10" => Ok(Self::SixToTen),
            "10+" => Ok(Self::TenPlus),
            other => Err(BucketParseError(other.to_string())),
        }
    }

    /// Inclusive bounds as `(min, max)`; `None` means unbounded.
    pub fn bounds(self) -> (Option<u32>, Option<u32>) {
        match self {
            Self::ZeroToTwo => (Some(0), Some(2)),
            Self::ThreeToFive => (Some(3), Some(5)),
            Self::SixToTen => (Some(6), Some(10)),
            Self::TenPlus => (Some(10), None),
            Self::Any => (None, None),
        }
    }

    /// Whether `years` falls in this bucket (both bounds inclusive).
    pub fn contains(self, years: u32) -> bool {
        let (min, max) = self.bounds();
        min.map_or(true, |m| years >= m) && max.map_or(true, |m| years <= m)
    }

    pub fn is_any(self) -> bool {
        self == Self::Any
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            Self::ZeroToTwo => "0-2",
            Self::ThreeToFive => "3-5",
            Self::SixToTen => "6-10",
            Self::TenPlus => "10+",
            Self::Any => "Any",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extracted(years: u32) -> ExtractedFields {
        ExtractedFields {
            text: "worked on backend services".into(),
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            experience_years: years,
        }
    }

    #[test]
    fn experience_parsing_handles_sentinels() {
        assert_eq!(parse_experience_years(None), None);
        assert_eq!(parse_experience_years(Some("")), None);
        assert_eq!(parse_experience_years(Some("  ")), None);
        assert_eq!(parse_experience_years(Some("None")), None);
        assert_eq!(parse_experience_years(Some("none")), None);
        assert_eq!(parse_experience_years(Some("7")), Some(7));
        assert_eq!(parse_experience_years(Some(" 12 ")), Some(12));
        assert_eq!(parse_experience_years(Some("-3")), None);
        assert_eq!(parse_experience_years(Some("2.5")), None);
        assert_eq!(parse_experience_years(Some("five")), None);
    }

    #[test]
    fn compose_prefers_overrides_and_defaults_department() {
        let p = ResumePayload::compose(&extracted(4), "s3://x", Some("Engineering"), Some("9"));
        assert_eq!(p.experience_years, 9);
        assert_eq!(p.department, "Engineering");

        let p = ResumePayload::compose(&extracted(4), "s3://x", None, None);
        assert_eq!(p.experience_years, 4);
        assert_eq!(p.department, DEFAULT_DEPARTMENT);

        // Present-but-garbage override stores 0 rather than silently keeping
        // the extracted estimate.
        let p = ResumePayload::compose(&extracted(4), "s3://x", Some(""), Some("lots"));
        assert_eq!(p.experience_years, 0);
        assert_eq!(p.department, DEFAULT_DEPARTMENT);
    }

    #[test]
    fn bucket_membership_is_exact_at_boundaries() {
        let b = |t: &str| ExperienceBucket::parse(t).expect("valid tag");
        assert!(b("0-2").contains(2));
        assert!(!b("3-5").contains(2));
        assert!(b("3-5").contains(3));
        assert!(b("3-5").contains(5));
        assert!(b("6-10").contains(10));
        assert!(b("10+").contains(10));
        assert!(!b("6-10").contains(11));
        assert!(b("10+").contains(40));
        assert!(b("Any").contains(0));
    }

    #[test]
    fn bucket_parse_accepts_any_aliases_and_rejects_junk() {
        assert_eq!(ExperienceBucket::parse("").unwrap(), ExperienceBucket::Any);
        assert_eq!(ExperienceBucket::parse("any").unwrap(), ExperienceBucket::Any);
        assert_eq!(ExperienceBucket::parse("Any").unwrap(), ExperienceBucket::Any);
        assert!(ExperienceBucket::parse("2-4").is_err());
        assert!(ExperienceBucket::parse("10").is_err());
    }
}
