//! Lighting profile model and configuration-document parsing.
//!
//! A downloaded archive holds one or more XML documents. Each parses into a
//! [`LightingEffect`]; the usable ones are bundled into a [`ProfileStub`] for
//! the persistence layer.

pub mod colour;
mod error;
mod parser;

use serde::{Deserialize, Serialize};

pub use error::ProfileError;
pub use parser::{parse_profile_file, parse_profile_str};

use crate::link::CandidateLink;

/// What one configuration document describes.
///
/// All lists hold unique values in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightingEffect {
    /// Profile name; empty when the document does not carry one.
    pub name: String,
    /// Device names the profile targets.
    pub devices: Vec<String>,
    /// Colours as lowercase `#rrggbb`.
    pub colours: Vec<String>,
    /// Effect kinds, never `none`.
    pub effects: Vec<String>,
}

impl LightingEffect {
    /// A document counts only if it names at least one device and one colour.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.devices.is_empty() && !self.colours.is_empty()
    }
}

/// Profile record handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStub {
    /// Candidate link the profile was extracted from.
    pub origin_link_id: i64,
    /// Post that owns the link; at most one profile per post is stored.
    pub parent_post_id: String,
    /// Canonical download URL.
    pub download_url: String,
    /// Usable effects, at least one.
    pub lighting_effects: Vec<LightingEffect>,
}

impl ProfileStub {
    /// Builds a stub from `effects`, dropping unusable entries.
    ///
    /// Returns `None` when nothing usable remains.
    #[must_use]
    pub fn new(
        link: &CandidateLink,
        download_url: impl Into<String>,
        effects: Vec<LightingEffect>,
    ) -> Option<Self> {
        let lighting_effects: Vec<LightingEffect> =
            effects.into_iter().filter(LightingEffect::is_usable).collect();
        if lighting_effects.is_empty() {
            return None;
        }
        Some(Self {
            origin_link_id: link.id,
            parent_post_id: link.parent_post_id.clone(),
            download_url: download_url.into(),
            lighting_effects,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn effect(devices: &[&str], colours: &[&str]) -> LightingEffect {
        LightingEffect {
            name: "n".to_string(),
            devices: devices.iter().map(ToString::to_string).collect(),
            colours: colours.iter().map(ToString::to_string).collect(),
            effects: Vec::new(),
        }
    }

    #[test]
    fn test_is_usable_requires_devices_and_colours() {
        assert!(effect(&["kbd"], &["#ffffff"]).is_usable());
        assert!(!effect(&[], &["#ffffff"]).is_usable());
        assert!(!effect(&["kbd"], &[]).is_usable());
    }

    #[test]
    fn test_profile_stub_drops_unusable_effects() {
        let link = CandidateLink::new(7, "post-1", "https://drive.google.com/open?id=X");
        let stub = ProfileStub::new(
            &link,
            "https://drive.google.com/uc?id=X&export=download",
            vec![effect(&[], &["#000000"]), effect(&["kbd"], &["#ff0000"])],
        )
        .unwrap();
        assert_eq!(stub.origin_link_id, 7);
        assert_eq!(stub.parent_post_id, "post-1");
        assert_eq!(stub.lighting_effects.len(), 1);
    }

    #[test]
    fn test_profile_stub_none_without_usable_effects() {
        let link = CandidateLink::new(1, "p", "u");
        assert!(ProfileStub::new(&link, "u", Vec::new()).is_none());
        assert!(ProfileStub::new(&link, "u", vec![effect(&["kbd"], &[])]).is_none());
    }

    #[test]
    fn test_lighting_effect_json_shape() {
        let json = serde_json::to_value(effect(&["kbd"], &["#ff0000"])).unwrap();
        assert_eq!(json["devices"][0], "kbd");
        assert_eq!(json["colours"][0], "#ff0000");
        assert!(json["effects"].as_array().unwrap().is_empty());
    }
}
