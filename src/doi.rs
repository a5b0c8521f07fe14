//! DOI validation, normalization, and decomposition.
//!
//! A DOI such as `10.6084/m9.figshare.30511304` is split into a repository
//! locator (`10.6084`) and a resource path (`/m9.figshare.30511304`). Some
//! repositories mint DOIs whose locator spans two segments; those are
//! recognised by a keyword in the second segment.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::error::RetrieveError;

/// Case-insensitive scheme marker accepted in front of a DOI.
const DOI_SCHEME: &str = "doi:";

/// Keywords marking a locator that spans two path segments.
const VARIABLE_WIDTH_KEYWORDS: &[&str] = &["zenodo"];

/// Full DOI grammar: `10.` + registrant (first segment 4+ digits, nested
/// numeric segments allowed) + `/` + non-empty, whitespace-free suffix.
#[allow(clippy::expect_used)]
static DOI_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    // Static pattern, safe to panic
    Regex::new(r"^10\.\d{4,9}(?:\.\d+)*/\S+$").expect("DOI grammar regex is valid")
});

/// A syntactically valid DOI, stored without its `doi:` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Doi(String);

impl Doi {
    /// Validates and normalizes `input` into a [`Doi`].
    ///
    /// Accepts an optional case-insensitive `doi:` prefix, surrounding
    /// whitespace and percent-encoding.
    ///
    /// # Errors
    ///
    /// Returns [`RetrieveError::InvalidDoi`] when the input uses `doi://`,
    /// or does not follow the `10.XXXX/suffix` grammar.
    pub fn parse(input: &str) -> Result<Self, RetrieveError> {
        let normalized = normalize_doi(input)?;
        check_grammar(&normalized)?;
        trace!(doi = %normalized, "DOI validated");
        Ok(Self(normalized))
    }

    /// Returns the DOI without any prefix.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the DOI into its locator and resource path.
    #[must_use]
    pub fn parts(&self) -> DoiParts {
        split_doi(&self.0)
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Doi {
    type Err = RetrieveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Doi {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The two logical segments of a DOI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoiParts {
    /// Registrant prefix plus optional sub-namespace, e.g. `10.5281/zenodo.17544720`.
    pub locator: String,
    /// Resource path with its leading `/` restored, e.g. `/m9.figshare.30511304`.
    pub path: String,
}

impl DoiParts {
    /// Reassembles the DOI from its segments.
    #[must_use]
    pub fn rejoin(&self) -> String {
        if self.path == "/" {
            self.locator.clone()
        } else {
            format!("{}{}", self.locator, self.path)
        }
    }

    /// Returns the resource path without its leading separator.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.path.strip_prefix('/').unwrap_or(&self.path)
    }
}

/// Checks that `doi` is a well-formed DOI.
///
/// # Errors
///
/// Returns [`RetrieveError::InvalidDoi`] describing the first violated rule.
pub fn validate(doi: &str) -> Result<(), RetrieveError> {
    Doi::parse(doi).map(|_| ())
}

/// Returns true if `doi` passes [`validate`].
#[must_use]
pub fn is_valid_doi(doi: &str) -> bool {
    validate(doi).is_ok()
}

/// Validates `doi` and splits it into locator and resource path.
///
/// # Errors
///
/// Returns [`RetrieveError::InvalidDoi`] if validation fails.
pub fn parse_doi(doi: &str) -> Result<DoiParts, RetrieveError> {
    Ok(Doi::parse(doi)?.parts())
}

/// Strips the scheme marker, URL-decodes, and trims whitespace.
fn normalize_doi(input: &str) -> Result<String, RetrieveError> {
    let trimmed = input.trim();

    let without_scheme = if trimmed.len() >= DOI_SCHEME.len()
        && trimmed.is_char_boundary(DOI_SCHEME.len())
        && trimmed[..DOI_SCHEME.len()].eq_ignore_ascii_case(DOI_SCHEME)
    {
        let rest = &trimmed[DOI_SCHEME.len()..];
        if rest.starts_with("//") {
            return Err(RetrieveError::doi_protocol_separator(input));
        }
        rest.trim_start()
    } else {
        trimmed
    };

    let decoded = match urlencoding::decode(without_scheme) {
        Ok(decoded) => decoded.trim().to_string(),
        Err(_) => without_scheme.to_string(),
    };
    Ok(decoded)
}

/// Applies the DOI grammar, reporting which rule failed.
fn check_grammar(doi: &str) -> Result<(), RetrieveError> {
    if DOI_GRAMMAR.is_match(doi) {
        return Ok(());
    }

    if !doi.starts_with("10.") {
        return Err(RetrieveError::invalid_doi(doi, "DOI must start with '10.'"));
    }

    let Some(slash_pos) = doi.find('/') else {
        return Err(RetrieveError::invalid_doi(doi, "DOI has no suffix after '/'"));
    };

    let registrant = &doi[3..slash_pos];
    if registrant.is_empty() {
        return Err(RetrieveError::invalid_doi(
            doi,
            "missing registrant code after '10.'",
        ));
    }

    let first_segment = registrant.split('.').next().unwrap_or("");
    if first_segment.len() < 4 || !first_segment.chars().all(|c| c.is_ascii_digit()) {
        return Err(RetrieveError::invalid_doi(
            doi,
            "registrant code must have at least 4 digits",
        ));
    }

    if doi[slash_pos + 1..].is_empty() {
        return Err(RetrieveError::invalid_doi(doi, "DOI has no suffix after '/'"));
    }

    Err(RetrieveError::invalid_doi(
        doi,
        "DOI contains whitespace or a malformed registrant code",
    ))
}

fn split_doi(doi: &str) -> DoiParts {
    let parts: Vec<&str> = doi.split('/').collect();

    let variable_width = parts.get(1).is_some_and(|segment| {
        let lower = segment.to_ascii_lowercase();
        VARIABLE_WIDTH_KEYWORDS
            .iter()
            .any(|keyword| lower.contains(keyword))
    });

    let split_at = if variable_width {
        2.min(parts.len())
    } else {
        parts.len().saturating_sub(1)
    };

    DoiParts {
        locator: parts[..split_at].join("/"),
        path: format!("/{}", parts[split_at..].join("/")),
    }
}
