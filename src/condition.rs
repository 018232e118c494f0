//! # Condition Scoring
//!
//! Converts per-component distress scores into a composite Visual Condition
//! Index (VCI, 0 = perfect to 100 = worst) and derives a roughness (IRI)
//! estimate with an uncertainty band.
//!
//! Components left unscored in a frame are excluded and the remaining weights
//! renormalized, so a frame with only a few assessable components still gets a
//! comparable index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::frame::Frame;
use crate::round1;

/// Index returned when no component of a frame could be scored.
pub const NEUTRAL_CONDITION_INDEX: f64 = 50.0;

/// Highest distress score.
pub const MAX_COMPONENT_SCORE: i32 = 5;

/// Scores at or above this mark a component as a notable distress type.
pub const DISTRESS_TYPE_THRESHOLD: i32 = 3;

/// Per-component distress scores. Negative values mean "not assessable".
pub type ComponentScores = BTreeMap<DistressComponent, i32>;

// ============================================================================
// Surface and components
// ============================================================================

/// Road surface observed in a frame.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceType {
    #[serde(alias = "asphalt")]
    PavedAsphalt,
    #[serde(alias = "concrete")]
    PavedConcrete,
    #[serde(alias = "dbst")]
    SurfaceTreatment,
    Gravel,
    Earth,
    #[default]
    Unknown,
}

impl SurfaceType {
    pub const ALL: [SurfaceType; 6] = [
        SurfaceType::PavedAsphalt,
        SurfaceType::PavedConcrete,
        SurfaceType::SurfaceTreatment,
        SurfaceType::Gravel,
        SurfaceType::Earth,
        SurfaceType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceType::PavedAsphalt => "paved_asphalt",
            SurfaceType::PavedConcrete => "paved_concrete",
            SurfaceType::SurfaceTreatment => "surface_treatment",
            SurfaceType::Gravel => "gravel",
            SurfaceType::Earth => "earth",
            SurfaceType::Unknown => "unknown",
        }
    }

    /// Lenient parse of a collaborator's surface tag. Unrecognized tags map
    /// to `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        match tag.as_str() {
            "paved_asphalt" | "asphalt" => SurfaceType::PavedAsphalt,
            "paved_concrete" | "concrete" => SurfaceType::PavedConcrete,
            "surface_treatment" | "dbst" => SurfaceType::SurfaceTreatment,
            "gravel" => SurfaceType::Gravel,
            "earth" => SurfaceType::Earth,
            _ => SurfaceType::Unknown,
        }
    }

    /// Asphalt and concrete. A surface treatment seal is neither paved nor
    /// unpaved.
    pub fn is_paved(&self) -> bool {
        matches!(self, SurfaceType::PavedAsphalt | SurfaceType::PavedConcrete)
    }

    pub fn is_unpaved(&self) -> bool {
        matches!(self, SurfaceType::Gravel | SurfaceType::Earth)
    }

    /// Human-readable label used in descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            SurfaceType::PavedAsphalt => "asphalt",
            SurfaceType::PavedConcrete => "concrete",
            SurfaceType::SurfaceTreatment => "surface treatment",
            SurfaceType::Gravel => "gravel",
            SurfaceType::Earth => "earth",
            SurfaceType::Unknown => "unknown surface",
        }
    }
}

/// A scored distress component.
///
/// The assessment model prefixes names by surface class
/// (`unpaved_potholes`, `paved_surface_distress`); both spellings decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistressComponent {
    #[serde(alias = "unpaved_potholes")]
    Potholes,
    #[serde(alias = "unpaved_corrugation")]
    Corrugation,
    #[serde(alias = "unpaved_erosion")]
    Erosion,
    #[serde(alias = "unpaved_loose_material")]
    LooseMaterial,
    #[serde(alias = "unpaved_gravel_condition")]
    GravelCondition,
    #[serde(alias = "paved_surface_distress")]
    SurfaceDistress,
    #[serde(alias = "paved_deformation")]
    Deformation,
    #[serde(alias = "paved_edge_condition")]
    EdgeCondition,
    #[serde(alias = "paved_patching")]
    Patching,
    #[serde(alias = "unpaved_drainage", alias = "paved_drainage")]
    Drainage,
    #[serde(alias = "unpaved_road_profile")]
    RoadProfile,
    #[serde(alias = "unpaved_riding_quality", alias = "paved_riding_quality")]
    RidingQuality,
}

impl DistressComponent {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistressComponent::Potholes => "potholes",
            DistressComponent::Corrugation => "corrugation",
            DistressComponent::Erosion => "erosion",
            DistressComponent::LooseMaterial => "loose_material",
            DistressComponent::GravelCondition => "gravel_condition",
            DistressComponent::SurfaceDistress => "surface_distress",
            DistressComponent::Deformation => "deformation",
            DistressComponent::EdgeCondition => "edge_condition",
            DistressComponent::Patching => "patching",
            DistressComponent::Drainage => "drainage",
            DistressComponent::RoadProfile => "road_profile",
            DistressComponent::RidingQuality => "riding_quality",
        }
    }
}

const UNPAVED_WEIGHTS: [(DistressComponent, f64); 8] = [
    (DistressComponent::Potholes, 0.20),
    (DistressComponent::Corrugation, 0.15),
    (DistressComponent::Erosion, 0.15),
    (DistressComponent::LooseMaterial, 0.10),
    (DistressComponent::GravelCondition, 0.10),
    (DistressComponent::Drainage, 0.15),
    (DistressComponent::RoadProfile, 0.05),
    (DistressComponent::RidingQuality, 0.10),
];

const PAVED_WEIGHTS: [(DistressComponent, f64); 6] = [
    (DistressComponent::SurfaceDistress, 0.30),
    (DistressComponent::Deformation, 0.20),
    (DistressComponent::Drainage, 0.15),
    (DistressComponent::EdgeCondition, 0.15),
    (DistressComponent::Patching, 0.10),
    (DistressComponent::RidingQuality, 0.10),
];

/// Component weights for a surface. Only asphalt and concrete use the paved
/// table; surface treatment and unknown surfaces use the unpaved one.
pub fn weights_for(surface: SurfaceType) -> &'static [(DistressComponent, f64)] {
    if surface.is_paved() {
        &PAVED_WEIGHTS
    } else {
        &UNPAVED_WEIGHTS
    }
}

/// A usable score: `None` when negative, clamped to 0..=5 otherwise.
#[inline]
pub fn normalize_score(raw: i32) -> Option<i32> {
    if raw < 0 {
        None
    } else {
        Some(raw.min(MAX_COMPONENT_SCORE))
    }
}

// ============================================================================
// Condition index
// ============================================================================

/// Weighted composite index, 0 (perfect) to 100 (worst), one decimal.
///
/// Only components with a non-negative score contribute; the result is
/// normalized by the weights actually scored. Returns
/// [`NEUTRAL_CONDITION_INDEX`] when nothing was scored.
///
/// ```rust
/// use corridor_survey::condition::{compute_condition_index, ComponentScores, DistressComponent, SurfaceType};
///
/// let mut scores = ComponentScores::new();
/// scores.insert(DistressComponent::Potholes, 5);
/// scores.insert(DistressComponent::Erosion, -1);
/// assert_eq!(compute_condition_index(SurfaceType::Gravel, &scores), 100.0);
/// ```
pub fn compute_condition_index(surface: SurfaceType, scores: &ComponentScores) -> f64 {
    let mut weighted_sum = 0.0;
    let mut scored_weight = 0.0;

    for &(component, weight) in weights_for(surface) {
        if let Some(score) = scores.get(&component).copied().and_then(normalize_score) {
            weighted_sum += f64::from(score) * weight;
            scored_weight += weight;
        }
    }

    if scored_weight == 0.0 {
        return NEUTRAL_CONDITION_INDEX;
    }

    round1(weighted_sum / (f64::from(MAX_COMPONENT_SCORE) * scored_weight) * 100.0)
}

/// Whether any component of the surface's weight table carries a score.
pub fn has_scored_component(surface: SurfaceType, scores: &ComponentScores) -> bool {
    weights_for(surface).iter().any(|(component, _)| {
        scores
            .get(component)
            .copied()
            .and_then(normalize_score)
            .is_some()
    })
}

// ============================================================================
// Roughness
// ============================================================================

/// Roughness estimate in m/km with an uncertainty band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoughnessEstimate {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

/// Estimate roughness from a condition index and surface.
///
/// ```rust
/// use corridor_survey::{roughness, SurfaceType};
///
/// let r = roughness(0.0, SurfaceType::Gravel);
/// assert_eq!((r.low, r.mid, r.high), (3.9, 6.0, 8.1));
/// ```
pub fn roughness(condition_index: f64, surface: SurfaceType) -> RoughnessEstimate {
    let (raw_mid, uncertainty) = match surface {
        SurfaceType::PavedAsphalt | SurfaceType::PavedConcrete => {
            (16.07 * (-0.026 * (100.0 - condition_index)).exp(), 0.25)
        }
        SurfaceType::SurfaceTreatment => (18.0 * (-0.024 * (100.0 - condition_index)).exp(), 0.30),
        SurfaceType::Gravel => (6.0 + (condition_index / 100.0) * 14.0, 0.35),
        SurfaceType::Earth => (8.0 + (condition_index / 100.0) * 16.0, 0.40),
        SurfaceType::Unknown => (12.0, 0.50),
    };

    let mid = round1(raw_mid);
    let low = round1(raw_mid * (1.0 - uncertainty)).max(1.0).min(mid);
    let high = round1(mid * (1.0 + uncertainty)).min(24.0).max(mid);

    RoughnessEstimate { low, mid, high }
}

// ============================================================================
// Classes
// ============================================================================

/// Discrete condition class derived from roughness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionClass {
    VeryGood,
    Good,
    Fair,
    Poor,
    VeryPoor,
    Impassable,
}

impl ConditionClass {
    pub const ALL: [ConditionClass; 6] = [
        ConditionClass::VeryGood,
        ConditionClass::Good,
        ConditionClass::Fair,
        ConditionClass::Poor,
        ConditionClass::VeryPoor,
        ConditionClass::Impassable,
    ];

    /// Classify a roughness `mid` value (m/km).
    pub fn from_roughness(mid: f64) -> Self {
        if mid <= 3.0 {
            ConditionClass::VeryGood
        } else if mid <= 5.0 {
            ConditionClass::Good
        } else if mid <= 8.0 {
            ConditionClass::Fair
        } else if mid <= 12.0 {
            ConditionClass::Poor
        } else if mid <= 16.0 {
            ConditionClass::VeryPoor
        } else {
            ConditionClass::Impassable
        }
    }

    pub fn band(&self) -> ConditionBand {
        match self {
            ConditionClass::VeryGood | ConditionClass::Good => ConditionBand::Good,
            ConditionClass::Fair => ConditionBand::Fair,
            ConditionClass::Poor => ConditionBand::Poor,
            ConditionClass::VeryPoor | ConditionClass::Impassable => ConditionBand::Bad,
        }
    }

    /// Map colour: green family, amber, orange, red family.
    pub fn color(&self) -> &'static str {
        match self {
            ConditionClass::VeryGood => "#1f7a4d",
            ConditionClass::Good => "#2d5f4a",
            ConditionClass::Fair => "#9a6b2f",
            ConditionClass::Poor => "#c4652a",
            ConditionClass::VeryPoor => "#a83a2f",
            ConditionClass::Impassable => "#6e1f1a",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionClass::VeryGood => "very_good",
            ConditionClass::Good => "good",
            ConditionClass::Fair => "fair",
            ConditionClass::Poor => "poor",
            ConditionClass::VeryPoor => "very_poor",
            ConditionClass::Impassable => "impassable",
        }
    }

    /// Human-readable label used in descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            ConditionClass::VeryGood => "very good",
            ConditionClass::Good => "good",
            ConditionClass::Fair => "fair",
            ConditionClass::Poor => "poor",
            ConditionClass::VeryPoor => "very poor",
            ConditionClass::Impassable => "impassable",
        }
    }
}

/// Coarse four-band view of [`ConditionClass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionBand {
    Good,
    Fair,
    Poor,
    Bad,
}

impl ConditionBand {
    pub fn color(&self) -> &'static str {
        match self {
            ConditionBand::Good => "#2d5f4a",
            ConditionBand::Fair => "#9a6b2f",
            ConditionBand::Poor => "#c4652a",
            ConditionBand::Bad => "#a83a2f",
        }
    }
}

/// Overall distress severity of a frame, from its condition index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistressSeverity {
    None,
    Low,
    Moderate,
    High,
    Severe,
}

impl DistressSeverity {
    pub fn from_index(condition_index: f64) -> Self {
        if condition_index < 10.0 {
            DistressSeverity::None
        } else if condition_index < 30.0 {
            DistressSeverity::Low
        } else if condition_index < 50.0 {
            DistressSeverity::Moderate
        } else if condition_index < 70.0 {
            DistressSeverity::High
        } else {
            DistressSeverity::Severe
        }
    }
}

/// Components scored at or above [`DISTRESS_TYPE_THRESHOLD`], in component order.
pub fn distress_types(scores: &ComponentScores) -> Vec<DistressComponent> {
    scores
        .iter()
        .filter(|&(_, &score)| {
            normalize_score(score).map_or(false, |s| s >= DISTRESS_TYPE_THRESHOLD)
        })
        .map(|(&component, _)| component)
        .collect()
}

// ============================================================================
// Frame scoring
// ============================================================================

/// Scores derived for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameScore {
    pub condition_index: f64,
    pub roughness: RoughnessEstimate,
    pub class: ConditionClass,
}

/// Score a single frame.
pub fn score_frame(frame: &Frame) -> FrameScore {
    let condition_index = compute_condition_index(frame.surface_type, &frame.component_scores);
    let roughness = roughness(condition_index, frame.surface_type);
    FrameScore {
        condition_index,
        roughness,
        class: ConditionClass::from_roughness(roughness.mid),
    }
}

/// Score many frames, preserving order.
#[cfg(feature = "parallel")]
pub fn score_all(frames: &[&Frame]) -> Vec<FrameScore> {
    frames.par_iter().map(|frame| score_frame(frame)).collect()
}

/// Score many frames, preserving order.
#[cfg(not(feature = "parallel"))]
pub fn score_all(frames: &[&Frame]) -> Vec<FrameScore> {
    frames.iter().map(|frame| score_frame(frame)).collect()
}
