//! Release history entries

use crate::version::VersionCode;
use serde::{Deserialize, Serialize};

/// Release note text in one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    /// BCP-47 language tag, e.g. `en-US`
    pub language: String,
    /// Note body
    pub text: String,
}

impl LocalizedText {
    /// Create localized text
    #[inline]
    #[must_use]
    pub fn new(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            text: text.into(),
        }
    }
}

/// One entry in a track's release history
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Release {
    /// Display name assigned by the service, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Builds shipped by this release
    #[serde(default)]
    pub version_codes: Vec<VersionCode>,
    /// Localized release notes
    #[serde(default)]
    pub release_notes: Vec<LocalizedText>,
}

impl Release {
    /// Create a release for the given builds
    #[inline]
    #[must_use]
    pub fn new(version_codes: impl IntoIterator<Item = VersionCode>) -> Self {
        Self {
            name: None,
            version_codes: version_codes.into_iter().collect(),
            release_notes: Vec::new(),
        }
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// With an additional localized note
    #[inline]
    #[must_use]
    pub fn with_note(mut self, language: impl Into<String>, text: impl Into<String>) -> Self {
        self.release_notes.push(LocalizedText::new(language, text));
        self
    }

    /// Whether this release ships the given build
    #[inline]
    #[must_use]
    pub fn contains(&self, code: VersionCode) -> bool {
        self.version_codes.contains(&code)
    }
}
