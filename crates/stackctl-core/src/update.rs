//! Latest-release lookup on crates.io.
//!
//! Informational only: `stackctl info` shows whether a newer release exists.

use std::time::Duration;

use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

const CRATES_IO_API: &str = "https://crates.io/api/v1/crates";
const TIMEOUT: Duration = Duration::from_secs(3);

/// Errors from the version check.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The HTTP request failed or returned an error status.
    #[error("request failed: {0}")]
    Http(#[from] Box<ureq::Error>),

    /// The response body could not be read.
    #[error("failed to read response: {0}")]
    Io(#[from] std::io::Error),

    /// The response was not the expected JSON.
    #[error("unexpected response: {0}")]
    Parse(#[from] serde_json::Error),

    /// A version string is not valid semver.
    #[error("invalid version: {0}")]
    Version(#[from] semver::Error),
}

/// Result alias for the version check.
pub type UpdateResult<T> = Result<T, UpdateError>;

/// How the running version relates to the latest release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateStatus {
    /// Running the latest release.
    UpToDate,
    /// A newer release exists.
    Outdated {
        /// The newest published version.
        latest: Version,
    },
    /// Running something newer than anything published.
    Ahead,
}

#[derive(Deserialize)]
struct CrateResponse {
    #[serde(rename = "crate")]
    krate: CrateInfo,
}

#[derive(Deserialize)]
struct CrateInfo {
    max_stable_version: Option<String>,
    max_version: String,
}

/// Extract the newest stable (or, failing that, newest) version from a
/// crates.io API response body.
pub fn parse_latest(body: &str) -> UpdateResult<Version> {
    let response: CrateResponse = serde_json::from_str(body)?;
    let raw = response
        .krate
        .max_stable_version
        .unwrap_or(response.krate.max_version);
    Ok(Version::parse(&raw)?)
}

/// Fetch the latest published version of `crate_name`.
#[instrument]
pub fn fetch_latest_version(crate_name: &str) -> UpdateResult<Version> {
    let agent = ureq::AgentBuilder::new()
        .timeout(TIMEOUT)
        .user_agent(concat!("stackctl/", env!("CARGO_PKG_VERSION")))
        .build();
    let body = agent
        .get(&format!("{CRATES_IO_API}/{crate_name}"))
        .call()
        .map_err(Box::new)?
        .into_string()?;
    let latest = parse_latest(&body)?;
    debug!(%latest, "latest release");
    Ok(latest)
}

/// Compare the running version with the latest release.
pub fn compare(current: &Version, latest: &Version) -> UpdateStatus {
    match current.cmp(latest) {
        std::cmp::Ordering::Equal => UpdateStatus::UpToDate,
        std::cmp::Ordering::Less => UpdateStatus::Outdated {
            latest: latest.clone(),
        },
        std::cmp::Ordering::Greater => UpdateStatus::Ahead,
    }
}

/// Look up `crate_name` and compare it against the `current` version string.
pub fn check(crate_name: &str, current: &str) -> UpdateResult<UpdateStatus> {
    let current = Version::parse(current)?;
    let latest = fetch_latest_version(crate_name)?;
    Ok(compare(&current, &latest))
}
