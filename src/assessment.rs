//! Visual-assessment collaborator interface.
//!
//! The model that looks at dashcam images lives outside this crate. It is
//! represented by the [`FrameAssessor`] trait: given a frame's position in
//! the sequence and its capture time, return the observed surface, distress
//! scores and roadside activity. [`ScriptedAssessor`] and
//! [`CyclingAssessor`] are deterministic, stateless stand-ins for tests and
//! demos.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::condition::{ComponentScores, DistressComponent, SurfaceType};
use crate::frame::{ActivityLevel, ActivityObservation, FootpathQuality, Frame, LandUse, PresenceLevel};

/// What the assessment model reports for one frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameAssessment {
    pub surface_type: SurfaceType,
    pub component_scores: ComponentScores,
    pub activity: ActivityObservation,
}

impl FrameAssessment {
    /// Turn the assessment into a frame at the given position and time.
    pub fn into_frame(self, index: usize, capture_time: f64) -> Frame {
        Frame {
            index,
            capture_time,
            surface_type: self.surface_type,
            component_scores: self.component_scores,
            activity: self.activity,
        }
    }
}

/// The external visual-assessment model.
pub trait FrameAssessor {
    /// Assess the frame at `index`, captured at `capture_time`.
    fn assess(&self, index: usize, capture_time: f64) -> FrameAssessment;
}

/// Assess a frame for each capture time, indexing frames from 0.
pub fn assess_frames<A: FrameAssessor + ?Sized>(assessor: &A, capture_times: &[f64]) -> Vec<Frame> {
    capture_times
        .iter()
        .enumerate()
        .map(|(index, &time)| assessor.assess(index, time).into_frame(index, time))
        .collect()
}

// ============================================================================
// Scripted
// ============================================================================

/// Replays a fixed list of assessments, cycling when frames outnumber it.
///
/// An empty script assesses every frame as unknown and unscored.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAssessor {
    script: Vec<FrameAssessment>,
}

impl ScriptedAssessor {
    pub fn new(script: Vec<FrameAssessment>) -> Self {
        Self { script }
    }

    /// One assessment per surface/score pair, with no roadside activity.
    pub fn from_uniform_scores(steps: &[(SurfaceType, i32)]) -> Self {
        let script = steps
            .iter()
            .map(|&(surface, score)| FrameAssessment {
                surface_type: surface,
                component_scores: crate::condition::weights_for(surface)
                    .iter()
                    .map(|&(component, _)| (component, score))
                    .collect(),
                activity: ActivityObservation::default(),
            })
            .collect();
        Self { script }
    }
}

impl FrameAssessor for ScriptedAssessor {
    fn assess(&self, index: usize, _capture_time: f64) -> FrameAssessment {
        if self.script.is_empty() {
            return FrameAssessment::default();
        }
        self.script[index % self.script.len()].clone()
    }
}

// ============================================================================
// Cycling
// ============================================================================

const CYCLE_SURFACES: [SurfaceType; 4] = [
    SurfaceType::PavedAsphalt,
    SurfaceType::PavedAsphalt,
    SurfaceType::Gravel,
    SurfaceType::Earth,
];

// potholes, corrugation, erosion, loose material, gravel, drainage, profile, riding
const UNPAVED_PROFILES: [[i32; 8]; 10] = [
    [1, 1, 0, 1, 1, 1, 1, 1],
    [0, 0, 1, 0, 1, 1, 0, 1],
    [2, 2, 2, 1, 2, 2, 2, 2],
    [2, 2, 1, 2, 2, 2, 1, 2],
    [3, 3, 3, 3, 3, 3, 3, 3],
    [1, 0, 1, 0, 1, 1, 1, 1],
    [0, 1, 0, 1, 0, 1, 0, 1],
    [2, 1, 2, 1, 2, 2, 2, 2],
    [3, 3, 2, 3, 3, 3, 3, 4],
    [4, 4, 4, 4, 4, 4, 4, 5],
];

// surface distress, deformation, edge, patching, drainage, riding
const PAVED_PROFILES: [[i32; 6]; 10] = [
    [1, 0, 1, 0, 1, 1],
    [0, 1, 0, 1, 1, 1],
    [2, 1, 2, 1, 2, 2],
    [2, 2, 2, 2, 2, 2],
    [3, 3, 3, 3, 3, 3],
    [1, 0, 0, 1, 1, 1],
    [0, 0, 1, 0, 1, 0],
    [2, 2, 1, 2, 2, 2],
    [3, 3, 3, 2, 3, 4],
    [4, 4, 4, 4, 4, 5],
];

const UNPAVED_ORDER: [DistressComponent; 8] = [
    DistressComponent::Potholes,
    DistressComponent::Corrugation,
    DistressComponent::Erosion,
    DistressComponent::LooseMaterial,
    DistressComponent::GravelCondition,
    DistressComponent::Drainage,
    DistressComponent::RoadProfile,
    DistressComponent::RidingQuality,
];

const PAVED_ORDER: [DistressComponent; 6] = [
    DistressComponent::SurfaceDistress,
    DistressComponent::Deformation,
    DistressComponent::EdgeCondition,
    DistressComponent::Patching,
    DistressComponent::Drainage,
    DistressComponent::RidingQuality,
];

/// Cycles through canned surface and distress profiles.
///
/// The profile for a frame depends only on `seed` and the frame index, so
/// the same inputs always produce the same assessments. `run_length` holds
/// each profile for that many consecutive frames, which turns the default
/// frame-by-frame churn into stretches a sectioner can group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CyclingAssessor {
    seed: u64,
    run_length: usize,
}

impl CyclingAssessor {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            run_length: 1,
        }
    }

    pub fn with_run_length(mut self, run_length: usize) -> Self {
        self.run_length = run_length.max(1);
        self
    }

    fn step(&self, index: usize) -> usize {
        (self.seed as usize).wrapping_add(index / self.run_length)
    }
}

impl FrameAssessor for CyclingAssessor {
    fn assess(&self, index: usize, _capture_time: f64) -> FrameAssessment {
        let step = self.step(index);
        let surface = CYCLE_SURFACES[step % CYCLE_SURFACES.len()];

        let component_scores: ComponentScores = if surface.is_paved() {
            let profile = PAVED_PROFILES[step % PAVED_PROFILES.len()];
            PAVED_ORDER.iter().copied().zip(profile).collect()
        } else {
            let profile = UNPAVED_PROFILES[step % UNPAVED_PROFILES.len()];
            UNPAVED_ORDER.iter().copied().zip(profile).collect()
        };

        let counts = RoadsideCounts {
            pedestrian_count: (step % 4) as u32,
            pedestrians_on_road: step % 3 == 0,
            cyclist_motorcycle_count: (step % 3) as u32,
            vehicle_types: if step % 2 == 0 {
                vec!["boda_boda".to_string(), "car".to_string()]
            } else {
                vec!["bicycle".to_string(), "none".to_string()]
            },
            facilities_visible: match step % 4 {
                0 => vec!["commercial".to_string(), "market".to_string()],
                1 => vec!["none".to_string()],
                2 => vec!["school".to_string()],
                _ => vec!["health_centre".to_string()],
            },
            nmt_infrastructure: ["no_provision", "usable_shoulder", "separated_footpath", "no_provision"]
                [step % 4]
                .to_string(),
        };

        FrameAssessment {
            surface_type: surface,
            component_scores,
            activity: counts.into_observation(),
        }
    }
}

// ============================================================================
// Raw roadside counts
// ============================================================================

/// Raw roadside counts as reported by the assessment model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadsideCounts {
    pub pedestrian_count: u32,
    pub pedestrians_on_road: bool,
    pub cyclist_motorcycle_count: u32,
    pub vehicle_types: Vec<String>,
    pub facilities_visible: Vec<String>,
    pub nmt_infrastructure: String,
}

impl RoadsideCounts {
    /// Bucket the counts into an [`ActivityObservation`].
    ///
    /// Land use is not assessed from counts and is reported as mixed.
    pub fn into_observation(self) -> ActivityObservation {
        let has_vehicle = |names: &[&str]| {
            self.vehicle_types
                .iter()
                .any(|v| names.contains(&v.as_str()))
        };
        let seen = |names: &[&str]| {
            if has_vehicle(names) {
                PresenceLevel::Some
            } else {
                PresenceLevel::None
            }
        };

        let boda_bodas = match self.cyclist_motorcycle_count {
            0 => PresenceLevel::None,
            1 | 2 => PresenceLevel::Some,
            _ => PresenceLevel::Many,
        };

        let mut vehicles = BTreeMap::new();
        vehicles.insert("boda_bodas".to_string(), boda_bodas);
        vehicles.insert("bicycles".to_string(), seen(&["bicycle"]));
        vehicles.insert("minibus_taxi".to_string(), seen(&["minibus_matatu"]));
        vehicles.insert("cars".to_string(), seen(&["car", "suv_pickup"]));
        vehicles.insert(
            "trucks".to_string(),
            seen(&["light_truck", "heavy_truck", "semi_trailer"]),
        );

        let vendors = self
            .facilities_visible
            .iter()
            .any(|f| f == "market" || f == "commercial");

        let facilities: BTreeSet<String> = self
            .facilities_visible
            .iter()
            .map(|f| facility_tag(f).to_string())
            .collect();

        let footpath = match self.nmt_infrastructure.as_str() {
            "separated_footpath" => FootpathQuality::Good,
            "usable_shoulder" => FootpathQuality::Poor,
            _ => FootpathQuality::None,
        };

        let activity_level = if self.pedestrian_count > 0 || self.cyclist_motorcycle_count > 0 {
            ActivityLevel::Moderate
        } else {
            ActivityLevel::Low
        };

        ActivityObservation {
            land_use: LandUse::Mixed,
            activity_level,
            pedestrian_presence: PresenceLevel::from_count(self.pedestrian_count),
            school_children: false,
            vendors,
            footpath,
            pedestrians_on_carriageway: self.pedestrians_on_road,
            facilities,
            vehicles,
        }
    }
}

/// Normalize a facility name to the tag used in equity summaries.
fn facility_tag(name: &str) -> &str {
    match name {
        "health_centre" => "health_facility",
        "market" => "market_stalls",
        "place_of_worship" => "church",
        "commercial" => "shops",
        other => other,
    }
}
