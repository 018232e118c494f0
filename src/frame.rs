//! Assessed frames and roadside activity observations.
//!
//! A [`Frame`] is one dashcam image after visual assessment: its capture
//! time, the observed surface, per-component distress scores and what was
//! seen beside the road. Frames are produced by a
//! [`FrameAssessor`](crate::assessment::FrameAssessor) or decoded from JSON.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::condition::{ComponentScores, SurfaceType};
use crate::error::{Result, SurveyError};

/// One assessed dashcam frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Position in the capture sequence
    pub index: usize,
    /// Seconds since the Unix epoch (UTC)
    pub capture_time: f64,
    #[serde(default)]
    pub surface_type: SurfaceType,
    /// Distress scores 0 (none) to 5 (severe); negative means not scored
    #[serde(default)]
    pub component_scores: ComponentScores,
    #[serde(default)]
    pub activity: ActivityObservation,
}

impl Frame {
    /// A frame with unknown surface and no scores.
    pub fn new(index: usize, capture_time: f64) -> Self {
        Self {
            index,
            capture_time,
            surface_type: SurfaceType::Unknown,
            component_scores: ComponentScores::new(),
            activity: ActivityObservation::default(),
        }
    }
}

/// Decode a JSON array of frames.
pub fn frames_from_json(json: &str) -> Result<Vec<Frame>> {
    serde_json::from_str(json).map_err(|e| SurveyError::FrameParse {
        message: e.to_string(),
    })
}

// ============================================================================
// Activity observation
// ============================================================================

/// Predominant land use beside the road.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LandUse {
    Residential,
    Commercial,
    Agricultural,
    Institutional,
    Industrial,
    Mixed,
    Undeveloped,
    #[default]
    Unknown,
}

/// Overall roadside activity. `Unknown` ranks lowest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    #[default]
    Unknown,
    None,
    Low,
    Moderate,
    High,
}

/// Ordinal presence of pedestrians or a vehicle type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PresenceLevel {
    #[default]
    None,
    Few,
    Some,
    Many,
}

impl PresenceLevel {
    /// Bucket a head count: 1 few, 2-4 some, 5+ many.
    pub fn from_count(count: u32) -> Self {
        match count {
            0 => PresenceLevel::None,
            1 => PresenceLevel::Few,
            2..=4 => PresenceLevel::Some,
            _ => PresenceLevel::Many,
        }
    }
}

/// Footpath provision. Ordered worst to best.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FootpathQuality {
    #[default]
    None,
    Poor,
    Good,
}

/// What was seen beside the road in one frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityObservation {
    pub land_use: LandUse,
    pub activity_level: ActivityLevel,
    pub pedestrian_presence: PresenceLevel,
    pub school_children: bool,
    pub vendors: bool,
    pub footpath: FootpathQuality,
    pub pedestrians_on_carriageway: bool,
    /// Facility tags such as `school` or `health_facility`; `none` is ignored
    pub facilities: BTreeSet<String>,
    /// Presence per vehicle type, e.g. `boda_bodas`, `trucks`
    pub vehicles: BTreeMap<String, PresenceLevel>,
}
