//! Relman Maven - build fetcher for Maven-layout repositories
//!
//! Builds live at
//! `<repository>/<group path>/<artifact>/<version>/<artifact>-<version>.<ext>`,
//! where the group path is the group id with `.` replaced by `/`. Every
//! segment is percent-encoded.

use async_trait::async_trait;
use relman_core::{ArtifactCoordinates, ArtifactFetcher, BuildArtifact, FetchError};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maven repository settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MavenConfig {
    /// Repository base URL
    pub repository: String,
    /// Group id, dot separated
    pub group_id: String,
    /// Basic-auth user
    pub username: Option<String>,
    /// Basic-auth password
    pub password: Option<String>,
    /// Build file extension
    pub extension: String,
    /// MIME type attached to fetched builds
    pub content_type: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for MavenConfig {
    fn default() -> Self {
        Self {
            repository: String::new(),
            group_id: String::new(),
            username: None,
            password: None,
            extension: "apk".to_string(),
            content_type: BuildArtifact::APK_CONTENT_TYPE.to_string(),
            timeout_secs: 300,
        }
    }
}

impl MavenConfig {
    /// Create config for a repository and group
    #[must_use]
    pub fn new(repository: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            group_id: group_id.into(),
            ..Self::default()
        }
    }

    /// With basic-auth credentials
    #[inline]
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// With file extension
    #[inline]
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

/// Fetcher setup failure
#[derive(Debug, thiserror::Error)]
pub enum MavenError {
    /// Repository URL unusable as a base
    #[error("invalid repository url '{0}'")]
    InvalidRepository(String),

    /// Group id empty
    #[error("maven group id is empty")]
    EmptyGroup,

    /// HTTP client could not be built
    #[error("cannot create http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Downloads builds over HTTP
#[derive(Debug, Clone)]
pub struct MavenArtifactFetcher {
    client: Client,
    repository: Url,
    group_path: Vec<String>,
    credentials: Option<(String, Option<String>)>,
    extension: String,
    content_type: String,
}

impl MavenArtifactFetcher {
    /// Create fetcher
    ///
    /// # Errors
    /// - `MavenError::InvalidRepository` if the URL cannot carry path segments
    /// - `MavenError::EmptyGroup` for an empty group id
    /// - `MavenError::Client` if the HTTP client cannot be built
    pub fn new(config: MavenConfig) -> Result<Self, MavenError> {
        let repository = Url::parse(&config.repository)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| MavenError::InvalidRepository(config.repository.clone()))?;

        let group_path: Vec<String> = config
            .group_id
            .split('.')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if group_path.is_empty() {
            return Err(MavenError::EmptyGroup);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            repository,
            group_path,
            credentials: config.username.map(|user| (user, config.password)),
            extension: config.extension,
            content_type: config.content_type,
        })
    }

    /// URL of the build at `coordinates`
    ///
    /// # Errors
    /// - `FetchError::InvalidLocation` for empty coordinates
    pub fn locate(&self, coordinates: &ArtifactCoordinates) -> Result<Url, FetchError> {
        let ArtifactCoordinates {
            artifact_id,
            version,
        } = coordinates;
        if artifact_id.is_empty() || version.is_empty() {
            return Err(FetchError::InvalidLocation(coordinates.to_string()));
        }

        let file = format!("{artifact_id}-{version}.{}", self.extension);
        let mut url = self.repository.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidLocation(self.repository.to_string()))?
            .pop_if_empty()
            .extend(&self.group_path)
            .extend([artifact_id, version, &file]);

        Ok(url)
    }
}

#[async_trait]
impl ArtifactFetcher for MavenArtifactFetcher {
    async fn fetch(&self, coordinates: &ArtifactCoordinates) -> Result<BuildArtifact, FetchError> {
        let url = self.locate(coordinates)?;
        tracing::info!(%url, "downloading build");

        let mut request = self.client.get(url.clone());
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, password.as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(FetchError::NotFound(coordinates.clone())),
            status => {
                return Err(FetchError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                })
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;

        tracing::debug!(%url, bytes = bytes.len(), "downloaded build");
        Ok(BuildArtifact::new(coordinates.clone(), bytes.to_vec())
            .with_content_type(self.content_type.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(repository: &str) -> MavenArtifactFetcher {
        MavenArtifactFetcher::new(MavenConfig::new(repository, "com.example.mobile")).unwrap()
    }

    #[test]
    fn maven_layout() {
        let url = fetcher("https://repo.example.com/releases/")
            .locate(&ArtifactCoordinates::new("wallet", "1.4.0"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://repo.example.com/releases/com/example/mobile/wallet/1.4.0/wallet-1.4.0.apk"
        );
    }

    #[test]
    fn repository_without_trailing_slash() {
        let url = fetcher("https://repo.example.com/releases")
            .locate(&ArtifactCoordinates::new("wallet", "1.4.0"))
            .unwrap();
        assert!(url.path().starts_with("/releases/com/example/mobile/"));
    }

    #[test]
    fn segments_are_escaped() {
        let url = fetcher("https://repo.example.com/")
            .locate(&ArtifactCoordinates::new("wallet", "1.4.0 rc/1"))
            .unwrap();
        assert_eq!(
            url.path(),
            "/com/example/mobile/wallet/1.4.0%20rc%2F1/wallet-1.4.0%20rc%2F1.apk"
        );
    }

    #[test]
    fn invalid_setup_rejected() {
        assert!(matches!(
            MavenArtifactFetcher::new(MavenConfig::new("not a url", "com.example")),
            Err(MavenError::InvalidRepository(_))
        ));
        assert!(matches!(
            MavenArtifactFetcher::new(MavenConfig::new("https://repo.example.com", "")),
            Err(MavenError::EmptyGroup)
        ));
    }

    #[test]
    fn empty_coordinates_rejected() {
        let err = fetcher("https://repo.example.com/")
            .locate(&ArtifactCoordinates::new("wallet", ""))
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidLocation(_)));
    }
}
