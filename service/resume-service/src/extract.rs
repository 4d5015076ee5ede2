use std::sync::OnceLock;

use regex::Regex;
use resume_model::{ExtractedFields, NAME_NOT_FOUND};

use crate::ExtractError;

/// Turns an uploaded file into text plus a few structured fields.
///
/// Implementations own the format parsing; the service only cares about the
/// resulting [`ExtractedFields`].
pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, file_bytes: &[u8], file_name: &str) -> Result<ExtractedFields, ExtractError>;
}

/// Reference extractor for UTF-8 text content. Accepts the supported resume
/// extensions and rejects everything else; binary PDF/DOCX parsers plug in
/// behind the same trait and reuse [`scan_fields`].
pub struct PlainTextExtractor;

const SUPPORTED_EXTENSIONS: [&str; 3] = ["pdf", "docx", "txt"];

impl DocumentExtractor for PlainTextExtractor {
    fn extract(&self, file_bytes: &[u8], file_name: &str) -> Result<ExtractedFields, ExtractError> {
        let extension = file_name
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ExtractError::UnsupportedFormat(extension));
        }
        let text = std::str::from_utf8(file_bytes)
            .map_err(|_| ExtractError::Failed("file content is not valid UTF-8 text".into()))?;
        Ok(scan_fields(text))
    }
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\w.-]+@[\w.-]+").expect("email regex compiles"))
}

fn experience_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Leading non-digit guard instead of a lookbehind, so "2023 years" does
    // not read as 23 years.
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[^\d])(\d{1,2})\s*(?:years?|yrs?)").expect("experience regex compiles")
    })
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:[A-Z][a-z'\-]+\s+){1,3}[A-Z][a-z'\-]+").expect("name regex compiles")
    })
}

fn junk_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)classification|controlled|address|phone|email|linkedin|github|objective|education|skills|experience|certifications",
        )
        .expect("junk-word regex compiles")
    })
}

fn symbol_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\d\-+()|/]").expect("symbol regex compiles"))
}

/// Scan raw resume text for email, experience years and a candidate name.
///
/// The name heuristic searches the few lines around the email address for
/// runs of capitalized words, after stripping section headers and contact
/// noise, and keeps the longest plausible run.
pub fn scan_fields(text: &str) -> ExtractedFields {
    let email = email_re()
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let experience_years = experience_re()
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(0);

    let mut candidate_name = String::new();
    if !email.is_empty() {
        let lines: Vec<&str> = text.lines().collect();
        let email_line = lines
            .iter()
            .position(|line| line.contains(&email))
            .unwrap_or(0);
        let start = email_line.saturating_sub(5);
        for line in &lines[start..=email_line.min(lines.len().saturating_sub(1))] {
            let cleaned = junk_re().replace_all(line, "");
            let cleaned = symbol_re().replace_all(&cleaned, "");
            let best = name_re()
                .find_iter(cleaned.trim())
                .map(|m| m.as_str().trim())
                .max_by_key(|m| m.len());
            if let Some(full_name) = best {
                if full_name.split_whitespace().count() >= 2 && full_name.len() < 40 {
                    candidate_name = full_name.to_string();
                    break;
                }
            }
        }
    }

    ExtractedFields {
        text: text.to_string(),
        name: if candidate_name.is_empty() {
            NAME_NOT_FOUND.to_string()
        } else {
            candidate_name
        },
        email,
        experience_years,
    }
}
