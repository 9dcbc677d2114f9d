//! Release feed queries
//!
//! The feed is queried with the tool's product code, restricted to the latest
//! stable release, and answers with a document keyed by that code:
//!
//! ```json
//! {"CL": [{"build": "241.15989.155", "version": "2024.1.2",
//!          "downloads": {"linux": {"link": "https://...", "size": 1073741824}}}]}
//! ```

use optup_core::types::{NetworkConfig, ReleaseSource};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, UpdateError};
use crate::version::VersionId;

/// Metadata of the latest release of one tool
#[derive(Debug, Clone)]
pub struct ReleaseInfo {
    /// Feed code the release was looked up under
    pub code: String,

    /// Build identifier, compared against the installed marker
    pub build: VersionId,

    /// Marketing version, informational only
    pub version: Option<String>,

    /// Archive for the consulted platform
    pub download: DownloadDescriptor,
}

/// Where to fetch an archive and how large the feed says it is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadDescriptor {
    pub url: String,
    pub size: u64,
}

impl DownloadDescriptor {
    /// Last path segment of the URL, used as the local file name
    pub fn file_name(&self) -> &str {
        let path = self.url.split(['?', '#']).next().unwrap_or(&self.url);
        path.rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("download")
    }
}

#[derive(Debug, Deserialize)]
struct FeedRelease {
    build: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    downloads: HashMap<String, FeedDownload>,
}

#[derive(Debug, Deserialize)]
struct FeedDownload {
    link: String,
    size: FeedSize,
}

/// The feed has been seen to send sizes both as numbers and as numeric strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedSize {
    Number(u64),
    Text(String),
}

/// Build the HTTP client shared by feed queries and archive downloads
pub fn http_client(network: &NetworkConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(&network.user_agent);
    if let Some(secs) = network.http_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| UpdateError::fetch(&network.feed_url, e))
}

/// Client for the release metadata endpoint
pub struct ReleaseClient {
    client: reqwest::Client,
    feed_url: String,
    platform: String,
}

impl ReleaseClient {
    /// Create a client for `feed_url`, consulting downloads for `platform`
    pub fn new(
        client: reqwest::Client,
        feed_url: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            client,
            feed_url: feed_url.into(),
            platform: platform.into(),
        }
    }

    /// Query the latest stable release for a tool
    ///
    /// Issues exactly one request. Callers keep the returned value for the
    /// rest of the run instead of asking again.
    pub async fn latest_release(&self, source: &ReleaseSource) -> Result<ReleaseInfo> {
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();

        debug!("Fetching latest release for {} from {}", source.code, self.feed_url);

        let url = reqwest::Url::parse_with_params(
            &self.feed_url,
            &[
                ("code", source.code.as_str()),
                ("latest", "true"),
                ("type", "release"),
                ("_", timestamp.as_str()),
            ],
        )
        .map_err(|e| UpdateError::fetch(&self.feed_url, e))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpdateError::fetch(&self.feed_url, e))?;

        if !response.status().is_success() {
            return Err(UpdateError::remote_feed(
                &source.code,
                format!("HTTP status {}", response.status()),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UpdateError::fetch(&self.feed_url, e))?;

        debug!("Latest release info: {}", String::from_utf8_lossy(&body));

        let platform = source.platform.as_deref().unwrap_or(&self.platform);
        parse_feed(&body, &source.code, platform)
    }
}

/// Decode a feed document into the release for `code` on `platform`
pub fn parse_feed(body: &[u8], code: &str, platform: &str) -> Result<ReleaseInfo> {
    let mut document: HashMap<String, Vec<FeedRelease>> = serde_json::from_slice(body)
        .map_err(|e| UpdateError::remote_feed(code, format!("malformed document: {}", e)))?;

    let mut releases = document
        .remove(code)
        .ok_or_else(|| UpdateError::remote_feed(code, "feed code missing from response"))?;

    if releases.is_empty() {
        return Err(UpdateError::remote_feed(code, "no releases listed"));
    }
    let mut release = releases.swap_remove(0);

    let download = release.downloads.remove(platform).ok_or_else(|| {
        UpdateError::remote_feed(code, format!("no download for platform '{}'", platform))
    })?;

    let size = match download.size {
        FeedSize::Number(n) => n,
        FeedSize::Text(text) => text.trim().parse().map_err(|_| {
            UpdateError::remote_feed(code, format!("invalid download size '{}'", text))
        })?,
    };

    let build = VersionId::parse(&release.build)?;

    Ok(ReleaseInfo {
        code: code.to_string(),
        build,
        version: release.version,
        download: DownloadDescriptor {
            url: download.link,
            size,
        },
    })
}
