use anyhow::{bail, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::models::Ecosystem;

pub const DEFAULT_BASE_URL: &str = "https://api.deps.dev/v3alpha";

const USER_AGENT: &str = concat!("depledger/", env!("CARGO_PKG_VERSION"));

/// Registry response for a package version; only the license list matters
/// here.
#[derive(Debug, Deserialize)]
pub struct VersionInfo {
    #[serde(default)]
    pub licenses: Vec<String>,
}

/// Client for the deps.dev version lookup:
/// `GET /systems/{ecosystem}/packages/{name}/versions/{version}`.
pub struct RegistryClient {
    client: Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Look up one exact version. `Ok(None)` means the package or version is
    /// unknown to the registry ("no license data", not a failure). Any other
    /// non-2xx status or transport problem is an error.
    pub async fn version(
        &self,
        ecosystem: Ecosystem,
        name: &str,
        version: &str,
    ) -> Result<Option<VersionInfo>> {
        // Go module paths and scoped npm names contain '/'.
        let url = format!(
            "{}/systems/{}/packages/{}/versions/{}",
            self.base_url,
            ecosystem,
            urlencoding::encode(name),
            urlencoding::encode(version),
        );

        let response = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            bail!("registry returned http status {}", response.status());
        }

        Ok(Some(response.json().await?))
    }
}
