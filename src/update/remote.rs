//! Optional remote version marker: a plain-text file holding a version.

use std::time::Duration;

use super::version::VersionTuple;
use super::{UpdateError, UpdateResult};

const MARKER_TIMEOUT: Duration = Duration::from_secs(5);

/// Best-effort lookup of the latest published version.
pub trait RemoteMarker {
    /// `None` when the marker is disabled, unreachable, or malformed.
    fn latest_version(&self) -> Option<VersionTuple>;
}

/// Fetches the marker over HTTP(S).
pub struct HttpMarker {
    pub url: Option<String>,
}

impl RemoteMarker for HttpMarker {
    fn latest_version(&self) -> Option<VersionTuple> {
        let url = self.url.as_deref()?;
        match fetch_marker(url) {
            Ok(version) => version,
            Err(e) => {
                log::debug!("remote version marker unavailable: {}", e);
                None
            }
        }
    }
}

fn fetch_marker(url: &str) -> UpdateResult<Option<VersionTuple>> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(format!("ai-installer/{}", env!("AI_INSTALLER_VERSION")))
        .timeout(MARKER_TIMEOUT)
        .build()?;

    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(UpdateError::Fetch(format!("HTTP {} from {}", status, url)));
    }

    Ok(parse_marker(&response.text()?))
}

/// The marker must hold a bare version, optionally `v`-prefixed.
pub fn parse_marker(body: &str) -> Option<VersionTuple> {
    let line = body.lines().next()?.trim();
    let bare = line.strip_prefix('v').unwrap_or(line);
    if bare.is_empty() || !bare.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    VersionTuple::find_in(bare)
}
