//! Track snapshots
//!
//! A [`TrackSet`] is taken once, right after an edit is opened, and every
//! reconciliation decision for that edit is computed against it. It is never
//! refreshed; the engine mutates it in memory and writes tracks back.

use crate::track::{Track, TrackName};
use crate::version::VersionCode;
use serde::{Deserialize, Serialize};

/// Ordered snapshot of one application's tracks
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackSet {
    tracks: Vec<Track>,
}

impl TrackSet {
    /// Build a snapshot from tracks in service order
    #[inline]
    #[must_use]
    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    /// Track with the given name, if the service reported one
    #[inline]
    #[must_use]
    pub fn get(&self, name: &TrackName) -> Option<&Track> {
        self.tracks.iter().find(|track| track.name() == name)
    }

    /// Resolve a track by name
    ///
    /// Returns a copy of the reported track, or an empty track when the
    /// service has none yet, so operations proceed uniformly on new apps.
    #[must_use]
    pub fn resolve(&self, name: &TrackName) -> Track {
        self.get(name)
            .cloned()
            .unwrap_or_else(|| Track::new(name.clone()))
    }

    /// Copy `track` over the same-named snapshot entry
    ///
    /// Returns `false` (and changes nothing) when the snapshot has no such
    /// track; resolved-but-unreported tracks stay outside the snapshot.
    pub fn sync(&mut self, track: &Track) -> bool {
        match self.tracks.iter_mut().find(|t| t.name() == track.name()) {
            Some(existing) => {
                existing.clone_from(track);
                true
            }
            None => false,
        }
    }

    /// Names of tracks currently holding `code`
    #[must_use]
    pub fn tracks_containing(&self, code: VersionCode) -> Vec<&TrackName> {
        self.tracks
            .iter()
            .filter(|track| track.contains(code))
            .map(Track::name)
            .collect()
    }

    /// Iterate tracks in service order
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }

    /// Iterate tracks mutably in service order
    #[inline]
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Track> {
        self.tracks.iter_mut()
    }

    /// Number of tracks
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the service reported no tracks
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl IntoIterator for TrackSet {
    type Item = Track;
    type IntoIter = std::vec::IntoIter<Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.into_iter()
    }
}

impl<'a> IntoIterator for &'a TrackSet {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}

impl FromIterator<Track> for TrackSet {
    fn from_iter<I: IntoIterator<Item = Track>>(iter: I) -> Self {
        Self::from_tracks(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fraction::UserFraction;
    use proptest::prelude::*;

    fn vc(value: i64) -> VersionCode {
        VersionCode::new(value).unwrap()
    }

    fn sample() -> TrackSet {
        TrackSet::from_tracks(vec![
            Track::new(TrackName::internal()).with_version_codes([vc(5)]),
            Track::new(TrackName::beta()).with_version_codes([vc(4), vc(5)]),
            Track::new(TrackName::production()).with_version_codes([vc(3)]),
        ])
    }

    #[test]
    fn resolve_existing_track_copies_it() {
        let set = sample();
        let beta = set.resolve(&TrackName::beta());
        assert_eq!(beta.version_codes(), &[vc(4), vc(5)]);
    }

    #[test]
    fn resolve_missing_track_is_empty() {
        let set = sample();
        let rollout = set.resolve(&TrackName::rollout());
        assert_eq!(rollout.name(), &TrackName::rollout());
        assert!(rollout.is_empty());
        assert_eq!(rollout.user_fraction(), UserFraction::ZERO);
        assert!(set.get(&TrackName::rollout()).is_none());
    }

    #[test]
    fn sync_replaces_reported_track_only() {
        let mut set = sample();

        let mut beta = set.resolve(&TrackName::beta());
        beta.take_version_codes();
        assert!(set.sync(&beta));
        assert!(set.get(&TrackName::beta()).unwrap().is_empty());

        let alpha = Track::new(TrackName::alpha()).with_version_codes([vc(9)]);
        assert!(!set.sync(&alpha));
        assert!(set.get(&TrackName::alpha()).is_none());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn tracks_containing_preserves_order() {
        let set = sample();
        let names = set.tracks_containing(vc(5));
        assert_eq!(names, vec![&TrackName::internal(), &TrackName::beta()]);
        assert!(set.tracks_containing(vc(42)).is_empty());
    }

    #[test]
    fn serializes_as_list() {
        let set = TrackSet::from_tracks(vec![Track::new(TrackName::alpha())]);
        let json = serde_json::to_string(&set).unwrap();
        assert!(json.starts_with('['));
        let back: TrackSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    proptest! {
        #[test]
        fn prop_removal_leaves_code_nowhere(
            layout in proptest::collection::vec(proptest::collection::vec(1i64..20, 0..6), 1..5),
            target in 1i64..20,
        ) {
            let mut set: TrackSet = layout
                .into_iter()
                .enumerate()
                .map(|(i, codes)| {
                    Track::new(TrackName::new(format!("t{i}")).unwrap())
                        .with_version_codes(codes.into_iter().map(vc))
                })
                .collect();

            for track in set.iter_mut() {
                track.remove_version_code(vc(target));
            }

            prop_assert!(set.tracks_containing(vc(target)).is_empty());
        }
    }
}
