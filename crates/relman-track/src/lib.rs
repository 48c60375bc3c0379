//! Release track model
//!
//! The in-memory shape of an application's distribution tracks as read from
//! the publishing service inside one edit:
//!
//! - [`VersionCode`]: integer identity of one uploaded build
//! - [`UserFraction`]: staged-rollout share in `[0, 1]`
//! - [`TrackName`] / [`Track`]: a named channel with ordered version codes
//! - [`Release`]: release history entries carrying localized notes
//! - [`TrackSet`]: the snapshot of every track taken when an edit is opened
//!
//! # Example
//!
//! ```rust
//! use relman_track::{Track, TrackName, TrackSet, VersionCode};
//!
//! let internal = Track::new(TrackName::internal()).with_version_codes([VersionCode::new(5).unwrap()]);
//! let snapshot = TrackSet::from_tracks(vec![internal]);
//!
//! let beta = snapshot.resolve(&TrackName::beta());
//! assert!(beta.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod fraction;
mod release;
mod track;
mod track_set;
mod version;

pub use error::TrackError;
pub use fraction::UserFraction;
pub use release::{LocalizedText, Release};
pub use track::{Track, TrackName};
pub use track_set::TrackSet;
pub use version::VersionCode;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
