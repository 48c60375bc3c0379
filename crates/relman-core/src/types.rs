//! Core types for the engine
//!
//! Defines the identifiers and value types shared by the engine and its
//! collaborators:
//! - Application and edit identifiers
//! - Artifact coordinates and fetched builds
//! - Engine configuration

use crate::error::InputError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Application identifier on the publishing service (e.g. `com.example.app`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(String);

impl AppId {
    /// Create an application id
    ///
    /// # Errors
    /// - `InputError::AppId` when blank or containing whitespace
    pub fn new(id: impl Into<String>) -> Result<Self, InputError> {
        let id = id.into();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(InputError::AppId(id));
        }
        Ok(Self(id))
    }

    /// Id as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AppId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of an open edit, assigned by the transport
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditId(String);

impl EditId {
    /// Wrap a transport-assigned id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EditId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle to one open edit: the transport's id plus the target application
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EditHandle {
    /// Application the edit belongs to
    pub app_id: AppId,
    /// Transport-assigned edit id
    pub edit_id: EditId,
}

impl EditHandle {
    /// Create handle
    #[inline]
    #[must_use]
    pub fn new(app_id: AppId, edit_id: EditId) -> Self {
        Self { app_id, edit_id }
    }
}

/// Coordinates of a build in the artifact repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactCoordinates {
    /// Artifact id, also the short application name
    pub artifact_id: String,
    /// Artifact version
    pub version: String,
}

impl ArtifactCoordinates {
    /// Create coordinates
    #[inline]
    #[must_use]
    pub fn new(artifact_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }
}

impl Display for ArtifactCoordinates {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.artifact_id, self.version)
    }
}

/// A fetched build, ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    /// Where the build came from
    pub coordinates: ArtifactCoordinates,
    /// MIME type sent with the upload
    pub content_type: String,
    /// Build contents
    pub bytes: Vec<u8>,
}

impl BuildArtifact {
    /// Default MIME type for Android packages
    pub const APK_CONTENT_TYPE: &'static str = "application/vnd.android.package-archive";

    /// Create an APK build
    #[inline]
    #[must_use]
    pub fn new(coordinates: ArtifactCoordinates, bytes: Vec<u8>) -> Self {
        Self {
            coordinates,
            content_type: Self::APK_CONTENT_TYPE.to_string(),
            bytes,
        }
    }

    /// With MIME type
    #[inline]
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Size in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the build is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Prefix joined to short application names as `prefix.name`
    pub app_id_prefix: Option<String>,
    /// Serialize commands touching the same application
    pub serialize_per_app: bool,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With application id prefix
    #[inline]
    #[must_use]
    pub fn with_app_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.app_id_prefix = Some(prefix.into());
        self
    }

    /// With per-application serialization on or off
    #[inline]
    #[must_use]
    pub fn with_serialize_per_app(mut self, enabled: bool) -> Self {
        self.serialize_per_app = enabled;
        self
    }

    /// Fully qualified id for a short application name
    #[must_use]
    pub fn qualify(&self, app_id: &AppId) -> AppId {
        match self.app_id_prefix.as_deref().map(|p| p.trim_end_matches('.')) {
            Some(prefix) if !prefix.is_empty() => AppId(format!("{prefix}.{}", app_id.0)),
            _ => app_id.clone(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_id_prefix: None,
            serialize_per_app: true,
        }
    }
}
