//! # Corridor Assembly
//!
//! Builds the final [`Section`] records: each section's path is taken from
//! the raw GPS track between its first frame and the next section's first
//! frame, then densified so the rendered line follows the road instead of
//! cutting chords between sparse frame positions.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::condition::{
    distress_types, ConditionClass, DistressComponent, DistressSeverity, FrameScore,
    RoughnessEstimate, SurfaceType,
};
use crate::error::{Result, SurveyError};
use crate::frame::{FootpathQuality, Frame};
use crate::geo_utils::{haversine_distance, lerp_point};
use crate::intervention::{format_usd, plural, recommend, Intervention, RouteSummary};
use crate::pipeline::Diagnostic;
use crate::resolver::{Placement, ResolvedPosition};
use crate::sections::{
    aggregate_condition, aggregate_equity, BreakReason, EquityConcern, EquitySummary, FrameSpan,
};
use crate::{round1, round_to, GpsPoint};

/// Upper bound on pieces per raw segment, guarding against corrupt coordinates.
const MAX_PIECES_PER_SEGMENT: usize = 100_000;

// ============================================================================
// Densification
// ============================================================================

/// Insert interpolated points so no two consecutive points are more than
/// `max_step_km` apart.
///
/// Original points are kept. Paths with fewer than two points are returned
/// unchanged.
///
/// ```rust
/// use corridor_survey::GpsPoint;
/// use corridor_survey::corridor::densify;
/// use corridor_survey::geo_utils::haversine_distance;
///
/// // ~1.2 km due north
/// let path = vec![GpsPoint::new(0.38, 32.61), GpsPoint::new(0.3908, 32.61)];
/// let dense = densify(&path, 0.25);
/// assert!(dense.len() >= 5);
/// assert!(dense.windows(2).all(|w| haversine_distance(&w[0], &w[1]) <= 250.0));
/// ```
pub fn densify(path: &[GpsPoint], max_step_km: f64) -> Vec<GpsPoint> {
    let max_step_m = max_step_km * 1000.0;
    if path.len() < 2 || !(max_step_m > 0.0) || !max_step_m.is_finite() {
        return path.to_vec();
    }

    let mut dense = Vec::with_capacity(path.len());
    dense.push(path[0]);

    for segment in path.windows(2) {
        let (a, b) = (&segment[0], &segment[1]);
        let distance = haversine_distance(a, b);
        if !distance.is_finite() || distance <= max_step_m {
            dense.push(*b);
            continue;
        }

        let mut pieces = (distance / max_step_m).ceil() as usize;
        while pieces < MAX_PIECES_PER_SEGMENT && !pieces_fit(a, b, pieces, max_step_m) {
            pieces += 1;
        }

        for k in 1..pieces {
            dense.push(lerp_point(a, b, k as f64 / pieces as f64));
        }
        dense.push(*b);
    }

    dense
}

/// Whether splitting `a..b` into `pieces` equal parameter steps keeps every
/// step within `max_step_m`.
fn pieces_fit(a: &GpsPoint, b: &GpsPoint, pieces: usize, max_step_m: f64) -> bool {
    let mut previous = *a;
    for k in 1..=pieces {
        let next = if k == pieces {
            *b
        } else {
            lerp_point(a, b, k as f64 / pieces as f64)
        };
        if haversine_distance(&previous, &next) > max_step_m {
            return false;
        }
        previous = next;
    }
    true
}

// ============================================================================
// Sections
// ============================================================================

/// One homogeneous stretch of road.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Position along the route, from 0
    pub index: usize,
    pub start_time: f64,
    pub end_time: f64,
    /// First frame of the time-ordered sequence in this section
    pub first_frame: usize,
    pub frame_count: usize,
    pub surface_type: SurfaceType,
    /// Median frame condition index
    pub condition_index: f64,
    pub roughness: RoughnessEstimate,
    pub condition_class: ConditionClass,
    /// Track distance covered, km
    pub length_km: f64,
    pub path: Vec<GpsPoint>,
    pub distress_summary: BTreeMap<DistressComponent, Option<f64>>,
    pub equity_summary: EquitySummary,
    pub intervention: Intervention,
    pub closed_by: BreakReason,
    pub description: String,
    pub color: String,
}

/// Everything needed to build one section.
#[derive(Debug, Clone, Copy)]
pub struct SectionInput<'a> {
    pub index: usize,
    pub span: &'a FrameSpan,
    /// The section's frames, time-ordered
    pub frames: &'a [&'a Frame],
    /// Scores parallel to `frames`
    pub scores: &'a [FrameScore],
    pub start_time: f64,
    pub end_time: f64,
}

/// Build a section from its frames and raw track path.
pub fn assemble_section(input: SectionInput<'_>, raw_path: &[GpsPoint], max_step_km: f64) -> Section {
    let condition = aggregate_condition(input.frames, input.scores);
    let equity_summary = aggregate_equity(input.frames.iter().map(|f| &f.activity));

    // Meter precision; rounding never crosses the length bounds
    let length_km = round_to(input.span.length_km, 3);
    let intervention = recommend(condition.surface_type, condition.condition_class, length_km);

    let description = format!(
        "Section {}: {:.2} km {} in {} condition (IRI ~{:.1} m/km). {} at USD {}. Equity concern {}.",
        input.index + 1,
        length_km,
        condition.surface_type.label(),
        condition.condition_class.label(),
        condition.roughness.mid,
        intervention.name,
        format_usd(intervention.section_cost),
        equity_summary.equity_concern.as_str()
    );

    Section {
        index: input.index,
        start_time: input.start_time,
        end_time: input.end_time.max(input.start_time),
        first_frame: input.span.start,
        frame_count: input.span.len(),
        surface_type: condition.surface_type,
        condition_index: condition.condition_index,
        roughness: condition.roughness,
        condition_class: condition.condition_class,
        length_km,
        path: densify(raw_path, max_step_km),
        distress_summary: condition.distress_summary,
        equity_summary,
        color: condition.condition_class.color().to_string(),
        intervention,
        closed_by: input.span.closed_by,
        description,
    }
}

// ============================================================================
// Frame points
// ============================================================================

/// One scored frame placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePoint {
    pub frame_index: usize,
    pub capture_time: f64,
    pub position: GpsPoint,
    pub placement: Placement,
    /// Section containing the frame
    pub section_index: usize,
    pub surface_type: SurfaceType,
    pub condition_index: f64,
    pub roughness: RoughnessEstimate,
    pub condition_class: ConditionClass,
    pub distress_types: Vec<DistressComponent>,
    pub distress_severity: DistressSeverity,
    /// Colour of the frame's condition band
    pub color: String,
}

impl FramePoint {
    pub fn new(
        frame: &Frame,
        score: &FrameScore,
        position: &ResolvedPosition,
        section_index: usize,
    ) -> Self {
        Self {
            frame_index: frame.index,
            capture_time: frame.capture_time,
            position: position.point,
            placement: position.placement,
            section_index,
            surface_type: frame.surface_type,
            condition_index: score.condition_index,
            roughness: score.roughness,
            condition_class: score.class,
            distress_types: distress_types(&frame.component_scores),
            distress_severity: DistressSeverity::from_index(score.condition_index),
            color: score.class.band().color().to_string(),
        }
    }
}

// ============================================================================
// Condition panel
// ============================================================================

/// Route-level condition overview.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionPanel {
    pub section_count: usize,
    pub frame_count: usize,
    pub total_length_km: f64,
    /// Length-weighted mean of section roughness mids (m/km)
    pub mean_roughness: Option<f64>,
    /// Surface covering the most length
    pub dominant_surface: Option<SurfaceType>,
    /// Condition class covering the most length
    pub dominant_condition: Option<ConditionClass>,
    /// Share of route length per class, percent with one decimal
    pub condition_share_pct: BTreeMap<ConditionClass, f64>,
    /// Components scored 3 or worse in at least one frame
    pub distress_types_found: BTreeSet<DistressComponent>,
    pub narrative: String,
}

impl ConditionPanel {
    pub fn build(sections: &[Section], frames: &[&Frame]) -> Self {
        let total_length: f64 = sections.iter().map(|s| s.length_km).sum();

        let mut surface_length: BTreeMap<SurfaceType, f64> = BTreeMap::new();
        let mut class_length: BTreeMap<ConditionClass, f64> = BTreeMap::new();
        for section in sections {
            *surface_length.entry(section.surface_type).or_insert(0.0) += section.length_km;
            *class_length.entry(section.condition_class).or_insert(0.0) += section.length_km;
        }

        let mean_roughness = if sections.is_empty() {
            None
        } else if total_length > 0.0 {
            let weighted: f64 = sections
                .iter()
                .map(|s| s.roughness.mid * s.length_km)
                .sum();
            Some(round1(weighted / total_length))
        } else {
            let sum: f64 = sections.iter().map(|s| s.roughness.mid).sum();
            Some(round1(sum / sections.len() as f64))
        };

        let condition_share_pct = class_length
            .iter()
            .map(|(&class, &length)| {
                let share = if total_length > 0.0 {
                    round1(length / total_length * 100.0)
                } else {
                    0.0
                };
                (class, share)
            })
            .collect();

        let distress_types_found = frames
            .iter()
            .flat_map(|f| distress_types(&f.component_scores))
            .collect();

        let mut panel = Self {
            section_count: sections.len(),
            frame_count: frames.len(),
            total_length_km: round_to(total_length, 3),
            mean_roughness,
            dominant_surface: longest(&surface_length),
            dominant_condition: longest(&class_length),
            condition_share_pct,
            distress_types_found,
            narrative: String::new(),
        };
        panel.narrative = panel.describe();
        panel
    }

    fn describe(&self) -> String {
        let (Some(surface), Some(condition), Some(roughness)) =
            (self.dominant_surface, self.dominant_condition, self.mean_roughness)
        else {
            return "No frames were surveyed, so no condition overview is available.".to_string();
        };

        let distress = if self.distress_types_found.is_empty() {
            "No significant distress was observed.".to_string()
        } else {
            let names: Vec<String> = self
                .distress_types_found
                .iter()
                .map(|c| c.as_str().replace('_', " "))
                .collect();
            format!("The principal distress types observed were {}.", names.join(", "))
        };

        format!(
            "A dashcam survey analysed {} frame{} along {:.2} km of road in {} section{}. \
             The road is predominantly {} in {} condition, with an estimated average \
             International Roughness Index (IRI) of {:.1} m/km. {}",
            self.frame_count,
            plural(self.frame_count),
            self.total_length_km,
            self.section_count,
            plural(self.section_count),
            surface.label(),
            condition.label(),
            roughness,
            distress
        )
    }
}

// ============================================================================
// Equity panel
// ============================================================================

/// Route-level rollup of the section equity summaries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EquityPanel {
    pub section_count: usize,
    pub high_concern_sections: usize,
    pub moderate_concern_sections: usize,
    /// Sections where some stretch has no footpath
    pub no_footpath_sections: usize,
    pub school_children_observed: bool,
    pub vendors_observed: bool,
    pub facilities_seen: BTreeSet<String>,
    pub narrative: String,
}

impl EquityPanel {
    pub fn build(sections: &[Section]) -> Self {
        let mut panel = Self {
            section_count: sections.len(),
            ..Self::default()
        };

        for section in sections {
            let equity = &section.equity_summary;
            match equity.equity_concern {
                EquityConcern::High => panel.high_concern_sections += 1,
                EquityConcern::Moderate => panel.moderate_concern_sections += 1,
                EquityConcern::Low => {}
            }
            if equity.nmt_footpath == FootpathQuality::None {
                panel.no_footpath_sections += 1;
            }
            panel.school_children_observed |= equity.school_children_observed;
            panel.vendors_observed |= equity.vendors_observed;
            panel
                .facilities_seen
                .extend(equity.facilities_seen.iter().cloned());
        }

        panel.narrative = panel.describe();
        panel
    }

    fn describe(&self) -> String {
        if self.section_count == 0 {
            return "No road sections were surveyed, so no equity assessment is available."
                .to_string();
        }

        let mut parts = vec![format!(
            "Roadside activity was assessed over {} section{}. {} section{} showed high equity \
             concern, with pedestrians present and no footpath provision{}.",
            self.section_count,
            plural(self.section_count),
            self.high_concern_sections,
            plural(self.high_concern_sections),
            if self.moderate_concern_sections > 0 {
                format!(
                    ", and {} showed moderate concern",
                    self.moderate_concern_sections
                )
            } else {
                String::new()
            }
        )];
        parts.push(format!(
            "{} of {} section{} have no footpath along some stretch.",
            self.no_footpath_sections,
            self.section_count,
            plural(self.section_count)
        ));

        if self.school_children_observed {
            parts.push(
                "School children were observed, raising safety concerns where there is no \
                 dedicated pedestrian infrastructure."
                    .to_string(),
            );
        }
        if self.vendors_observed {
            parts.push(
                "Roadside vendors were active along the corridor, confirming its role in local \
                 commerce."
                    .to_string(),
            );
        }
        if !self.facilities_seen.is_empty() {
            let facilities: Vec<String> = self
                .facilities_seen
                .iter()
                .map(|f| f.replace('_', " "))
                .collect();
            parts.push(format!("Facilities seen: {}.", facilities.join(", ")));
        }
        if self.high_concern_sections > 0 {
            parts.push(
                "The proposed works should include NMT provision (footpaths and pedestrian \
                 crossings), prioritising the high-concern sections where pedestrians share \
                 the carriageway with motorised traffic."
                    .to_string(),
            );
        }

        parts.join(" ")
    }
}

/// Key with the largest total; ties go to the smallest key.
fn longest<K: Ord + Copy>(lengths: &BTreeMap<K, f64>) -> Option<K> {
    let mut best: Option<(K, f64)> = None;
    for (&key, &length) in lengths {
        if best.map_or(true, |(_, best_length)| length > best_length) {
            best = Some((key, length));
        }
    }
    best.map(|(key, _)| key)
}

// ============================================================================
// Corridor
// ============================================================================

/// The result of one survey run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corridor {
    pub sections: Vec<Section>,
    /// Every frame with a usable capture time, in capture order
    pub frames: Vec<FramePoint>,
    pub panel: ConditionPanel,
    pub equity_panel: EquityPanel,
    pub route_summary: RouteSummary,
    /// Degraded-input warnings, in the order they were detected
    pub diagnostics: Vec<Diagnostic>,
}

impl Corridor {
    /// A GeoJSON `FeatureCollection` with one `LineString` per section.
    ///
    /// Coordinates are `[longitude, latitude]`. Every section attribute
    /// except the path is attached as a property. The route summary and
    /// condition panel ride along as foreign members.
    pub fn to_geojson(&self) -> Result<Value> {
        let mut features = Vec::with_capacity(self.sections.len());

        for section in &self.sections {
            let coordinates: Vec<[f64; 2]> = section
                .path
                .iter()
                .map(|p| [p.longitude, p.latitude])
                .collect();

            let mut properties = serde_json::to_value(section).map_err(|e| SurveyError::Internal {
                message: format!("section {} did not serialize: {}", section.index, e),
            })?;
            if let Some(map) = properties.as_object_mut() {
                map.remove("path");
            }

            features.push(json!({
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": coordinates,
                },
                "properties": properties,
            }));
        }

        let route_summary = serde_json::to_value(&self.route_summary).map_err(|e| {
            SurveyError::Internal {
                message: format!("route summary did not serialize: {}", e),
            }
        })?;
        let panel = serde_json::to_value(&self.panel).map_err(|e| SurveyError::Internal {
            message: format!("condition panel did not serialize: {}", e),
        })?;
        let equity_panel = serde_json::to_value(&self.equity_panel).map_err(|e| {
            SurveyError::Internal {
                message: format!("equity panel did not serialize: {}", e),
            }
        })?;

        Ok(json!({
            "type": "FeatureCollection",
            "features": features,
            "route_summary": route_summary,
            "condition_panel": panel,
            "equity_panel": equity_panel,
        }))
    }

    /// A GeoJSON `FeatureCollection` with one `Point` per frame.
    ///
    /// Frames without a track position (empty track) are left out.
    pub fn frames_geojson(&self) -> Result<Value> {
        let mut features = Vec::with_capacity(self.frames.len());

        for frame in &self.frames {
            if frame.placement == Placement::NoTrack {
                continue;
            }

            let mut properties = serde_json::to_value(frame).map_err(|e| SurveyError::Internal {
                message: format!("frame {} did not serialize: {}", frame.frame_index, e),
            })?;
            if let Some(map) = properties.as_object_mut() {
                map.remove("position");
            }

            features.push(json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [frame.position.longitude, frame.position.latitude],
                },
                "properties": properties,
            }));
        }

        Ok(json!({
            "type": "FeatureCollection",
            "features": features,
        }))
    }

    /// [`to_geojson`](Self::to_geojson) rendered as pretty-printed JSON.
    pub fn to_geojson_string(&self) -> Result<String> {
        let value = self.to_geojson()?;
        serde_json::to_string_pretty(&value).map_err(|e| SurveyError::Internal {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::score_frame;
    use crate::geo_utils::polyline_length;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn gravel_frames(count: usize) -> Vec<Frame> {
        (0..count)
            .map(|i| {
                let mut frame = Frame::new(i, i as f64 * 10.0);
                frame.surface_type = SurfaceType::Gravel;
                frame.component_scores.insert(DistressComponent::Potholes, 3);
                frame.component_scores.insert(DistressComponent::Erosion, 1);
                frame
            })
            .collect()
    }

    #[test]
    fn test_densify_long_segment() {
        // ~1.2 km due north with only two raw points
        let path = vec![GpsPoint::new(0.38, 32.61), GpsPoint::new(0.3908, 32.61)];
        let raw_length = polyline_length(&path);
        assert!(approx_eq(raw_length, 1200.9, 1.0));

        let dense = densify(&path, 0.25);
        assert!(dense.len() >= 5);
        assert_eq!(dense.first(), path.first());
        assert_eq!(dense.last(), path.last());
        for w in dense.windows(2) {
            assert!(haversine_distance(&w[0], &w[1]) <= 250.0);
        }
        assert!(approx_eq(polyline_length(&dense), raw_length, 0.01));
    }

    #[test]
    fn test_densify_keeps_short_paths() {
        let path = vec![
            GpsPoint::new(0.380, 32.610),
            GpsPoint::new(0.381, 32.610),
            GpsPoint::new(0.382, 32.611),
        ];
        assert_eq!(densify(&path, 0.25), path);
        assert_eq!(densify(&path[..1], 0.25), path[..1].to_vec());
        assert!(densify(&[], 0.25).is_empty());
    }

    #[test]
    fn test_densify_exact_multiple() {
        // 1 km, four maximal steps: rounding must not push a step past the bound
        let a = GpsPoint::new(0.0, 32.0);
        let b = GpsPoint::new(1.0 / 111.195_08, 32.0);
        let dense = densify(&[a, b], 0.25);
        assert!(dense.len() >= 5);
        assert!(dense
            .windows(2)
            .all(|w| haversine_distance(&w[0], &w[1]) <= 250.0));
    }

    #[test]
    fn test_assemble_section() {
        let frames = gravel_frames(4);
        let refs: Vec<&Frame> = frames.iter().collect();
        let scores: Vec<FrameScore> = frames.iter().map(score_frame).collect();
        let span = FrameSpan {
            start: 0,
            end: 4,
            length_km: 0.7504,
            closed_by: BreakReason::SurfaceChange,
        };
        let raw_path = vec![GpsPoint::new(0.38, 32.61), GpsPoint::new(0.38675, 32.61)];

        let section = assemble_section(
            SectionInput {
                index: 2,
                span: &span,
                frames: &refs,
                scores: &scores,
                start_time: 0.0,
                end_time: 40.0,
            },
            &raw_path,
            0.25,
        );

        assert_eq!(section.length_km, 0.75);
        assert_eq!(section.frame_count, 4);
        assert_eq!(section.surface_type, SurfaceType::Gravel);
        assert_eq!(section.intervention.section_cost, 600_000.0);
        assert_eq!(section.color, section.condition_class.color());
        assert!(section.path.len() >= 4);
        assert!(section.description.starts_with("Section 3: 0.75 km gravel"));
        assert!(section.description.contains("Upgrade to DBST"));
    }

    #[test]
    fn test_condition_panel_weights_by_length() {
        let frames = gravel_frames(2);
        let refs: Vec<&Frame> = frames.iter().collect();
        let scores: Vec<FrameScore> = frames.iter().map(score_frame).collect();
        let short_span = FrameSpan {
            start: 0,
            end: 1,
            length_km: 0.5,
            closed_by: BreakReason::ConditionChange,
        };
        let long_span = FrameSpan {
            start: 1,
            end: 2,
            length_km: 1.5,
            closed_by: BreakReason::EndOfRoute,
        };
        let path = vec![GpsPoint::new(0.38, 32.61), GpsPoint::new(0.381, 32.61)];

        let mut short = assemble_section(
            SectionInput {
                index: 0,
                span: &short_span,
                frames: &refs[..1],
                scores: &scores[..1],
                start_time: 0.0,
                end_time: 10.0,
            },
            &path,
            0.25,
        );
        let mut long = assemble_section(
            SectionInput {
                index: 1,
                span: &long_span,
                frames: &refs[1..],
                scores: &scores[1..],
                start_time: 10.0,
                end_time: 10.0,
            },
            &path,
            0.25,
        );
        short.roughness.mid = 4.0;
        short.condition_class = ConditionClass::Good;
        long.roughness.mid = 12.0;
        long.condition_class = ConditionClass::Poor;

        let panel = ConditionPanel::build(&[short, long], &refs);
        assert_eq!(panel.total_length_km, 2.0);
        assert_eq!(panel.mean_roughness, Some(10.0));
        assert_eq!(panel.dominant_condition, Some(ConditionClass::Poor));
        assert_eq!(panel.dominant_surface, Some(SurfaceType::Gravel));
        assert_eq!(panel.condition_share_pct[&ConditionClass::Good], 25.0);
        assert_eq!(panel.condition_share_pct[&ConditionClass::Poor], 75.0);
        assert!(panel.distress_types_found.contains(&DistressComponent::Potholes));
        assert!(!panel.distress_types_found.contains(&DistressComponent::Erosion));
    }

    #[test]
    fn test_empty_panel() {
        let panel = ConditionPanel::build(&[], &[]);
        assert_eq!(panel.mean_roughness, None);
        assert_eq!(panel.dominant_surface, None);
        assert!(panel.condition_share_pct.is_empty());
        assert_eq!(
            panel.narrative,
            "No frames were surveyed, so no condition overview is available."
        );
    }

    fn gravel_section(index: usize, frames: &[&Frame], scores: &[FrameScore]) -> Section {
        let span = FrameSpan {
            start: 0,
            end: frames.len(),
            length_km: 0.5,
            closed_by: BreakReason::EndOfRoute,
        };
        let path = vec![GpsPoint::new(0.38, 32.61), GpsPoint::new(0.3845, 32.61)];
        assemble_section(
            SectionInput {
                index,
                span: &span,
                frames,
                scores,
                start_time: 0.0,
                end_time: 10.0,
            },
            &path,
            0.25,
        )
    }

    #[test]
    fn test_condition_panel_narrative() {
        let frames = gravel_frames(3);
        let refs: Vec<&Frame> = frames.iter().collect();
        let scores: Vec<FrameScore> = frames.iter().map(score_frame).collect();
        let section = gravel_section(0, &refs, &scores);

        let panel = ConditionPanel::build(&[section], &refs);
        assert!(panel
            .narrative
            .starts_with("A dashcam survey analysed 3 frames along 0.50 km of road in 1 section."));
        assert!(panel.narrative.contains("predominantly gravel"));
        assert!(panel
            .narrative
            .ends_with("The principal distress types observed were potholes."));
    }

    #[test]
    fn test_frame_point_severity_and_band_color() {
        let frames = gravel_frames(1);
        let score = score_frame(&frames[0]);
        let position = ResolvedPosition {
            point: GpsPoint::new(0.38, 32.61),
            elevation: None,
            placement: Placement::Interpolated,
        };

        let point = FramePoint::new(&frames[0], &score, &position, 4);
        assert_eq!(point.section_index, 4);
        assert_eq!(point.distress_types, vec![DistressComponent::Potholes]);
        assert_eq!(
            point.distress_severity,
            DistressSeverity::from_index(score.condition_index)
        );
        assert_eq!(point.color, score.class.band().color());
    }

    #[test]
    fn test_equity_panel_counts() {
        use crate::frame::PresenceLevel;

        let frames = gravel_frames(2);
        let refs: Vec<&Frame> = frames.iter().collect();
        let scores: Vec<FrameScore> = frames.iter().map(score_frame).collect();

        let mut high = gravel_section(0, &refs, &scores);
        high.equity_summary.pedestrian_presence = PresenceLevel::Many;
        high.equity_summary.nmt_footpath = FootpathQuality::None;
        high.equity_summary.equity_concern = EquityConcern::High;
        high.equity_summary.school_children_observed = true;

        let mut moderate = gravel_section(1, &refs, &scores);
        moderate.equity_summary.nmt_footpath = FootpathQuality::Poor;
        moderate.equity_summary.equity_concern = EquityConcern::Moderate;

        let mut low = gravel_section(2, &refs, &scores);
        low.equity_summary.nmt_footpath = FootpathQuality::Good;
        low.equity_summary.equity_concern = EquityConcern::Low;
        low.equity_summary.facilities_seen.insert("health_centre".to_string());

        let panel = EquityPanel::build(&[high, moderate, low]);
        assert_eq!(panel.section_count, 3);
        assert_eq!(panel.high_concern_sections, 1);
        assert_eq!(panel.moderate_concern_sections, 1);
        assert_eq!(panel.no_footpath_sections, 1);
        assert!(panel.school_children_observed);
        assert!(!panel.vendors_observed);
        assert!(panel.narrative.contains(
            "1 section showed high equity concern, with pedestrians present and no footpath \
             provision, and 1 showed moderate concern."
        ));
        assert!(panel.narrative.contains("School children were observed"));
        assert!(panel.narrative.contains("Facilities seen: health centre."));
        assert!(panel.narrative.contains("NMT provision"));
    }

    #[test]
    fn test_empty_equity_panel() {
        let panel = EquityPanel::build(&[]);
        assert_eq!(panel.high_concern_sections, 0);
        assert_eq!(
            panel.narrative,
            "No road sections were surveyed, so no equity assessment is available."
        );
    }
}
