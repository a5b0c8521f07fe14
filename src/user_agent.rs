//! Shared User-Agent string for outbound HTTP requests.

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/ssciwr/pooch-doi";

/// Default User-Agent for DOI resolution and adapter requests.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("doi-dispatch/{version} (research-data-tool; +{PROJECT_UA_URL})")
}
