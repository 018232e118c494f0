//! # Algorithm Toolbox
//!
//! Direct access to the individual survey algorithms, for callers that want
//! to run one stage on its own instead of the full [`run_survey`] pipeline.
//!
//! ## Core Algorithms
//!
//! - **Position Resolution**: time-based interpolation along a GPS track
//! - **Condition Scoring**: weighted condition index and roughness estimate
//! - **Sectioning**: noise-tolerant partition into homogeneous spans
//! - **Aggregation**: per-section condition and equity summaries
//! - **Intervention Advice**: treatment selection and costing
//! - **Densification**: path refinement for map rendering
//!
//! ## Geographic Utilities
//!
//! - **Haversine Distance**: Great-circle distance between GPS points
//! - **Polyline Length**: Total distance along a path
//! - **Bounds Computation**: Bounding box for GPS tracks
//!
//! # Example
//!
//! ```rust
//! use corridor_survey::algorithms::{
//!     compute_condition_index, roughness, ConditionClass, ComponentScores,
//!     DistressComponent, SurfaceType,
//! };
//!
//! let mut scores = ComponentScores::new();
//! scores.insert(DistressComponent::Potholes, 3);
//! scores.insert(DistressComponent::Drainage, -1);
//!
//! let index = compute_condition_index(SurfaceType::Gravel, &scores);
//! assert_eq!(index, 60.0);
//!
//! let estimate = roughness(index, SurfaceType::Gravel);
//! assert_eq!(ConditionClass::from_roughness(estimate.mid), ConditionClass::VeryPoor);
//! ```
//!
//! [`run_survey`]: crate::run_survey

// =============================================================================
// Core Types (re-exported from lib)
// =============================================================================

pub use crate::{Bounds, GpsPoint};

// =============================================================================
// Geographic Utilities
// =============================================================================

pub use crate::geo_utils::{
    compute_bounds, haversine_distance, lerp_point, polyline_length,
};

// =============================================================================
// Position Resolution
// =============================================================================

/// Time-interpolated positions along a track
pub use crate::resolver::{PositionResolver, ResolvedPosition};
/// Dashcam clock conversion
pub use crate::resolver::{start_time_from_clip_name, FrameClock};
/// Frame thinning by along-track spacing
pub use crate::resolver::select_by_spacing;

// =============================================================================
// Condition Scoring
// =============================================================================

pub use crate::condition::{
    compute_condition_index, distress_types, normalize_score, roughness, score_frame,
    weights_for, ComponentScores, ConditionBand, ConditionClass, DistressComponent,
    DistressSeverity, FrameScore, RoughnessEstimate, SurfaceType,
};

// =============================================================================
// Sectioning and Aggregation
// =============================================================================

/// Main sectioning function
pub use crate::sections::partition_frames;
/// Sectioner input and output
pub use crate::sections::{BreakReason, FrameSample, FrameSpan, SectionConfig};
/// Per-section statistics
pub use crate::sections::{aggregate_condition, median, mode, ConditionSummary};
/// Per-section equity profile
pub use crate::sections::{aggregate_equity, classify_equity_concern, EquityConcern};

// =============================================================================
// Intervention Advice
// =============================================================================

pub use crate::intervention::{
    catalogue, get_intervention, recommend, summarize_route, InterventionSpec,
};

// =============================================================================
// Densification
// =============================================================================

/// Refine a path so consecutive points are at most a given step apart
pub use crate::corridor::densify;
