//! # Corridor Survey
//!
//! Road condition sectioning from dashcam frame assessments and a GPS track.
//!
//! This library provides:
//! - GPX track parsing and time-based position interpolation
//! - A weighted Visual Condition Index (VCI) with roughness (IRI) estimates
//! - Noise-tolerant sectioning into homogeneous road sections
//! - Per-section condition, equity and intervention summaries
//! - A densified GeoJSON corridor for map rendering
//!
//! ## Features
//!
//! - **`parallel`** - Score and position frames in parallel with rayon
//! - **`cli`** - Build the `corridor-survey` command line driver
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use corridor_survey::{
//!     run_survey, CyclingAssessor, SurveyConfig, TrackStore, Trackpoint,
//!     assessment::assess_frames,
//! };
//!
//! // A straight 3 km northbound track sampled every 10 seconds
//! let points: Vec<Trackpoint> = (0..=30)
//!     .map(|i| Trackpoint::new(i as f64 * 10.0, 0.38 + i as f64 * 0.0009, 32.61))
//!     .collect();
//! let track = TrackStore::new(points);
//!
//! // Frames every 5 seconds, assessed by a deterministic test double
//! let times: Vec<f64> = (0..=60).map(|i| i as f64 * 5.0).collect();
//! let frames = assess_frames(&CyclingAssessor::new(7).with_run_length(20), &times);
//!
//! let corridor = run_survey(&frames, &track, &SurveyConfig::default()).unwrap();
//! for section in &corridor.sections {
//!     println!("{}", section.description);
//! }
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, SurveyError};

// Geographic utilities (distance, interpolation, bounds)
pub mod geo_utils;

// Algorithm toolbox - standalone access to the individual algorithms
pub mod algorithms;

// GPS track parsing and range queries
pub mod track;
pub use track::{TrackStore, Trackpoint};

// Frame capture time -> position interpolation
pub mod resolver;
pub use resolver::{FrameClock, Placement, PositionResolver, ResolvedPosition};

// Assessed frames and roadside activity observations
pub mod frame;
pub use frame::{
    ActivityLevel, ActivityObservation, FootpathQuality, Frame, LandUse, PresenceLevel,
};

// Visual-assessment collaborator interface and test doubles
pub mod assessment;
pub use assessment::{CyclingAssessor, FrameAssessment, FrameAssessor, ScriptedAssessor};

// Condition index, roughness and condition classes
pub mod condition;
pub use condition::{
    compute_condition_index, roughness, ConditionBand, ConditionClass, DistressComponent,
    FrameScore, RoughnessEstimate, SurfaceType,
};

// Homogeneous section detection and per-section aggregation
pub mod sections;
pub use sections::{
    partition_frames, BreakGranularity, BreakReason, ConditionSummary, EquityConcern,
    EquitySummary, FrameSample, FrameSpan, SectionConfig,
};

// Treatment recommendation and costing
pub mod intervention;
pub use intervention::{Intervention, InterventionCode, RouteSummary};

// Section geometry, output packaging and GeoJSON export
pub mod corridor;
pub use corridor::{ConditionPanel, Corridor, EquityPanel, FramePoint, Section};

// End-to-end survey pipeline
pub mod pipeline;
pub use pipeline::{run_survey, Diagnostic, SurveyConfig};

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use corridor_survey::GpsPoint;
/// let point = GpsPoint::new(0.3476, 32.5825); // Kampala
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box for a path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }
}

/// Round to one decimal place, the precision used for scores and roughness.
#[inline]
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Round to `places` decimal places.
#[inline]
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// ============================================================================
// Tests
// ============================================================================
