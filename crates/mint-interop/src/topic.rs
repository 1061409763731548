// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

//! Topic registry.
//!
//! Every exchangeable type has exactly one canonical topic string. The topic
//! is both the subscribe prefix on the wire and the cache key, so the strings
//! here must match what the peer publishes byte for byte.
//!
//! Registration is explicit: adding a type means adding a line to the
//! `register_topics!` invocation below.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{
    BoundingBoxCorners, CameraConfiguration, CameraProjection, CameraView,
    DatasetRenderConfiguration, Mat4, ModelPose, StereoCameraConfiguration, StereoCameraView,
    StereoCameraViewRelative, Vec4,
};

/// A value that can be sent and received under its own canonical topic.
pub trait Exchangeable: Serialize + DeserializeOwned {
    /// Canonical topic name.
    const TOPIC: &'static str;
}

/// Canonical topic of `T`.
pub fn topic_of<T: Exchangeable>() -> &'static str {
    T::TOPIC
}

macro_rules! register_topics {
    ($($ty:ty => $name:literal),+ $(,)?) => {
        $(
            impl Exchangeable for $ty {
                const TOPIC: &'static str = $name;
            }
        )+

        /// Topics of all registered types.
        pub const REGISTERED_TOPICS: &[&str] = &[$($name),+];
    };
}

register_topics! {
    BoundingBoxCorners => "BoundingBoxCorners",
    DatasetRenderConfiguration => "DatasetRenderConfiguration",
    ModelPose => "ModelPose",
    StereoCameraConfiguration => "StereoCameraConfiguration",
    CameraConfiguration => "CameraConfiguration",
    CameraProjection => "CameraProjection",
    StereoCameraView => "StereoCameraView",
    StereoCameraViewRelative => "StereoCameraViewRelative",
    CameraView => "CameraView",
    Mat4 => "mat4",
    Vec4 => "vec4",
}

/// Whether `name` is the canonical topic of a registered type.
pub fn is_registered(name: &str) -> bool {
    REGISTERED_TOPICS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_topic_names() {
        assert_eq!(topic_of::<BoundingBoxCorners>(), "BoundingBoxCorners");
        assert_eq!(topic_of::<StereoCameraViewRelative>(), "StereoCameraViewRelative");
        assert_eq!(topic_of::<Mat4>(), "mat4");
        assert_eq!(Vec4::TOPIC, "vec4");
    }

    #[test]
    fn test_registry_is_unique() {
        let unique: HashSet<_> = REGISTERED_TOPICS.iter().collect();
        assert_eq!(unique.len(), REGISTERED_TOPICS.len());
        assert_eq!(REGISTERED_TOPICS.len(), 11);
    }

    #[test]
    fn test_is_registered() {
        assert!(is_registered("ModelPose"));
        assert!(is_registered("mat4"));
        assert!(!is_registered("Mat4"));
        assert!(!is_registered("timestamp"));
        assert!(!is_registered(""));
    }
}
