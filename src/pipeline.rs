//! # Survey Pipeline
//!
//! Runs one trip end to end: positions every frame on the GPS track, scores
//! it, partitions the sequence into sections and assembles the corridor.
//!
//! Noisy field data never aborts a run. Frames outside the track, unscored
//! frames, an empty track or an empty frame list all produce a usable (if
//! degraded) [`Corridor`] with a [`Diagnostic`] explaining what happened.

use std::time::Instant;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::condition::{has_scored_component, score_all};
use crate::corridor::{
    assemble_section, ConditionPanel, Corridor, EquityPanel, FramePoint, SectionInput,
};
use crate::error::Result;
use crate::frame::Frame;
use crate::intervention::summarize_route;
use crate::resolver::PositionResolver;
use crate::sections::{partition_frames, BreakReason, FrameSample, SectionConfig};
use crate::track::TrackStore;

/// Configuration for a survey run.
///
/// Frame capture times arrive already on the UTC epoch clock; the dashcam
/// offset belongs to [`FrameClock`](crate::resolver::FrameClock).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    pub sections: SectionConfig,
}

/// A degraded-input warning attached to a survey result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The track has no points; every position is (0, 0)
    EmptyTrack,
    /// Track samples arrived out of time order and were re-sorted
    TrackResorted,
    /// Track samples dropped for missing time or invalid coordinates
    TrackPointsSkipped { count: usize },
    /// No frames were supplied
    NoFrames,
    /// Frames with a NaN or infinite capture time, left out of the survey
    InvalidCaptureTimes { frame_indices: Vec<usize> },
    /// Frames arrived out of capture order and were re-sorted
    FramesReordered,
    /// Frames captured before or after the track, clamped to its ends
    FramesOutsideTrack { frame_indices: Vec<usize> },
    /// Frames with no usable component score, given the neutral index
    UnscoredFrames { frame_indices: Vec<usize> },
    /// A section was closed by the length limit rather than a change in the road
    ForcedLengthBreak { section_index: usize },
    /// A section exceeds the length limit because of a single long frame gap
    OversizedSection { section_index: usize, length_km: f64 },
    /// A section other than the last is below the length floor
    ShortSection { section_index: usize, length_km: f64 },
}

/// Run a survey over one trip.
///
/// Fails only when `config` is invalid.
pub fn run_survey(frames: &[Frame], track: &TrackStore, config: &SurveyConfig) -> Result<Corridor> {
    config.sections.validate()?;
    let start = Instant::now();
    let section_config = &config.sections;

    let mut diagnostics = Vec::new();
    track_diagnostics(track, &mut diagnostics);

    if frames.is_empty() {
        warn!("[Survey] No frames supplied, returning an empty corridor");
        diagnostics.push(Diagnostic::NoFrames);
        return Ok(empty_corridor(diagnostics));
    }

    let (mut ordered, invalid): (Vec<&Frame>, Vec<&Frame>) =
        frames.iter().partition(|f| f.capture_time.is_finite());
    if !invalid.is_empty() {
        warn!(
            "[Survey] {} frames have no valid capture time and were left out",
            invalid.len()
        );
        diagnostics.push(Diagnostic::InvalidCaptureTimes {
            frame_indices: invalid.iter().map(|f| f.index).collect(),
        });
    }
    if ordered.is_empty() {
        return Ok(empty_corridor(diagnostics));
    }

    // Time-ordered view of the frames; ties keep sequence order
    let in_order = ordered.windows(2).all(|w| {
        w[0].capture_time
            .total_cmp(&w[1].capture_time)
            .then(w[0].index.cmp(&w[1].index))
            .is_le()
    });
    if !in_order {
        ordered.sort_by(|a, b| {
            a.capture_time
                .total_cmp(&b.capture_time)
                .then(a.index.cmp(&b.index))
        });
        warn!("[Survey] Frames were not in capture order, re-sorted");
        diagnostics.push(Diagnostic::FramesReordered);
    }

    let times: Vec<f64> = ordered.iter().map(|f| f.capture_time).collect();
    let resolver = PositionResolver::new(track);

    // Positions
    let positions = resolver.resolve_all(&times);
    let outside: Vec<usize> = ordered
        .iter()
        .zip(&positions)
        .filter(|(_, position)| position.placement.is_outside())
        .map(|(frame, _)| frame.index)
        .collect();
    if !outside.is_empty() && !track.is_empty() {
        warn!(
            "[Survey] {} frames fall outside the track and were clamped to its ends",
            outside.len()
        );
        diagnostics.push(Diagnostic::FramesOutsideTrack {
            frame_indices: outside,
        });
    }

    // Scores
    let scores = score_all(&ordered);
    let unscored: Vec<usize> = ordered
        .iter()
        .filter(|f| !has_scored_component(f.surface_type, &f.component_scores))
        .map(|f| f.index)
        .collect();
    if !unscored.is_empty() {
        warn!(
            "[Survey] {} frames had no usable component scores",
            unscored.len()
        );
        diagnostics.push(Diagnostic::UnscoredFrames {
            frame_indices: unscored,
        });
    }

    // Sectioning
    let samples: Vec<FrameSample> = (0..ordered.len())
        .map(|i| FrameSample {
            surface: ordered[i].surface_type,
            class: scores[i].class,
            gap_to_next_km: times
                .get(i + 1)
                .map_or(0.0, |&next| resolver.distance_between_m(times[i], next) / 1000.0),
        })
        .collect();
    let spans = partition_frames(&samples, section_config);

    // Assembly
    let mut sections = Vec::with_capacity(spans.len());
    for (index, span) in spans.iter().enumerate() {
        let is_last = index + 1 == spans.len();
        let start_time = times[span.start];
        let end_time = spans
            .get(index + 1)
            .map_or(times[span.end - 1], |next| times[next.start]);
        let raw_path = resolver.path_between(start_time, end_time);

        let section = assemble_section(
            SectionInput {
                index,
                span,
                frames: &ordered[span.start..span.end],
                scores: &scores[span.start..span.end],
                start_time,
                end_time,
            },
            &raw_path,
            section_config.max_path_step_km,
        );

        if span.closed_by == BreakReason::LengthLimit {
            diagnostics.push(Diagnostic::ForcedLengthBreak {
                section_index: index,
            });
        }
        if section.length_km > section_config.max_section_km {
            warn!(
                "[Survey] Section {} is {:.3} km, longer than the {:.1} km limit",
                index, section.length_km, section_config.max_section_km
            );
            diagnostics.push(Diagnostic::OversizedSection {
                section_index: index,
                length_km: section.length_km,
            });
        } else if !is_last && section.length_km < section_config.min_section_km {
            warn!(
                "[Survey] Section {} is {:.3} km, shorter than the {:.1} km floor",
                index, section.length_km, section_config.min_section_km
            );
            diagnostics.push(Diagnostic::ShortSection {
                section_index: index,
                length_km: section.length_km,
            });
        }

        sections.push(section);
    }

    let frame_points: Vec<FramePoint> = spans
        .iter()
        .enumerate()
        .flat_map(|(index, span)| (span.start..span.end).map(move |i| (index, i)))
        .map(|(index, i)| FramePoint::new(ordered[i], &scores[i], &positions[i], index))
        .collect();

    let panel = ConditionPanel::build(&sections, &ordered);
    let equity_panel = EquityPanel::build(&sections);
    let route_summary = summarize_route(&sections);

    info!(
        "[Survey] {} frames -> {} sections over {:.2} km in {}ms ({} diagnostics)",
        ordered.len(),
        sections.len(),
        panel.total_length_km,
        start.elapsed().as_millis(),
        diagnostics.len()
    );

    Ok(Corridor {
        sections,
        frames: frame_points,
        panel,
        equity_panel,
        route_summary,
        diagnostics,
    })
}

fn empty_corridor(diagnostics: Vec<Diagnostic>) -> Corridor {
    Corridor {
        sections: Vec::new(),
        frames: Vec::new(),
        panel: ConditionPanel::build(&[], &[]),
        equity_panel: EquityPanel::build(&[]),
        route_summary: summarize_route(&[]),
        diagnostics,
    }
}

fn track_diagnostics(track: &TrackStore, diagnostics: &mut Vec<Diagnostic>) {
    if track.skipped_points() > 0 {
        diagnostics.push(Diagnostic::TrackPointsSkipped {
            count: track.skipped_points(),
        });
    }
    if track.is_empty() {
        warn!("[Survey] Track has no points, all positions fall back to (0, 0)");
        diagnostics.push(Diagnostic::EmptyTrack);
    } else if track.was_resorted() {
        warn!("[Survey] Track points were out of time order, re-sorted");
        diagnostics.push(Diagnostic::TrackResorted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{weights_for, SurfaceType};
    use crate::track::Trackpoint;

    fn straight_track(points: usize) -> TrackStore {
        TrackStore::new(
            (0..points)
                .map(|i| Trackpoint::new(i as f64 * 10.0, 0.38 + i as f64 * 0.0009, 32.61))
                .collect(),
        )
    }

    fn frame(index: usize, time: f64, surface: SurfaceType, score: i32) -> Frame {
        let mut frame = Frame::new(index, time);
        frame.surface_type = surface;
        frame.component_scores = weights_for(surface)
            .iter()
            .map(|&(component, _)| (component, score))
            .collect();
        frame
    }

    #[test]
    fn test_empty_frames() {
        let track = straight_track(10);
        let corridor = run_survey(&[], &track, &SurveyConfig::default()).unwrap();
        assert!(corridor.sections.is_empty());
        assert_eq!(corridor.diagnostics, vec![Diagnostic::NoFrames]);
        assert_eq!(corridor.route_summary.dominant_intervention.as_str(), "RM");
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let track = straight_track(10);
        let config = SurveyConfig {
            sections: SectionConfig {
                max_section_km: 0.1,
                ..SectionConfig::default()
            },
        };
        assert!(run_survey(&[], &track, &config).is_err());
    }

    #[test]
    fn test_config_reads_partial_json() {
        let config: SurveyConfig =
            serde_json::from_str(r#"{"sections": {"min_section_km": 0.5}}"#).unwrap();
        assert_eq!(config.sections.min_section_km, 0.5);
        assert_eq!(config.sections.max_section_km, 2.0);

        let value = serde_json::to_value(SurveyConfig::default()).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["sections"]);
    }

    #[test]
    fn test_non_finite_capture_times_are_left_out() {
        let track = straight_track(10);
        let frames = vec![
            frame(0, 0.0, SurfaceType::Gravel, 1),
            frame(1, f64::NAN, SurfaceType::Gravel, 1),
            frame(2, 20.0, SurfaceType::Gravel, 1),
            frame(3, f64::INFINITY, SurfaceType::Gravel, 1),
        ];
        let corridor = run_survey(&frames, &track, &SurveyConfig::default()).unwrap();

        assert!(corridor.diagnostics.contains(&Diagnostic::InvalidCaptureTimes {
            frame_indices: vec![1, 3],
        }));
        let total: usize = corridor.sections.iter().map(|s| s.frame_count).sum();
        assert_eq!(total, 2);
        assert_eq!(corridor.frames.len(), 2);
    }

    #[test]
    fn test_only_invalid_capture_times() {
        let track = straight_track(10);
        let frames = vec![frame(0, f64::NAN, SurfaceType::Earth, 2)];
        let corridor = run_survey(&frames, &track, &SurveyConfig::default()).unwrap();

        assert!(corridor.sections.is_empty());
        assert_eq!(
            corridor.diagnostics,
            vec![Diagnostic::InvalidCaptureTimes {
                frame_indices: vec![0],
            }]
        );
    }

    #[test]
    fn test_frame_points_follow_sections() {
        let track = straight_track(40);
        let mut frames: Vec<Frame> = (0..10)
            .map(|i| frame(i, i as f64 * 20.0, SurfaceType::Gravel, 1))
            .collect();
        frames.extend((10..20).map(|i| frame(i, i as f64 * 20.0, SurfaceType::PavedAsphalt, 1)));

        let corridor = run_survey(&frames, &track, &SurveyConfig::default()).unwrap();
        assert_eq!(corridor.sections.len(), 2);
        assert_eq!(corridor.frames.len(), 20);
        for point in &corridor.frames {
            let section = &corridor.sections[point.section_index];
            assert!(point.frame_index >= section.first_frame);
            assert!(point.frame_index < section.first_frame + section.frame_count);
        }
    }

    #[test]
    fn test_empty_track_degrades() {
        let frames: Vec<Frame> = (0..5)
            .map(|i| frame(i, i as f64, SurfaceType::Gravel, 2))
            .collect();
        let corridor = run_survey(&frames, &TrackStore::empty(), &SurveyConfig::default()).unwrap();

        assert_eq!(corridor.sections.len(), 1);
        assert_eq!(corridor.sections[0].length_km, 0.0);
        assert!(corridor.sections[0].path.len() >= 2);
        assert!(corridor.diagnostics.contains(&Diagnostic::EmptyTrack));
    }

    #[test]
    fn test_reordered_frames_are_sorted() {
        let track = straight_track(40);
        let mut frames: Vec<Frame> = (0..20)
            .map(|i| frame(i, i as f64 * 20.0, SurfaceType::Gravel, 1))
            .collect();
        frames.swap(3, 11);

        let corridor = run_survey(&frames, &track, &SurveyConfig::default()).unwrap();
        assert!(corridor.diagnostics.contains(&Diagnostic::FramesReordered));
        let total: usize = corridor.sections.iter().map(|s| s.frame_count).sum();
        assert_eq!(total, 20);
    }

    #[test]
    fn test_frames_outside_track_are_reported() {
        let track = straight_track(10);
        let frames = vec![
            frame(0, -50.0, SurfaceType::Gravel, 1),
            frame(1, 20.0, SurfaceType::Gravel, 1),
            frame(2, 500.0, SurfaceType::Gravel, 1),
        ];
        let corridor = run_survey(&frames, &track, &SurveyConfig::default()).unwrap();
        assert!(corridor.diagnostics.contains(&Diagnostic::FramesOutsideTrack {
            frame_indices: vec![0, 2],
        }));
    }

    #[test]
    fn test_unscored_frames_are_reported() {
        let track = straight_track(10);
        let frames = vec![
            frame(0, 0.0, SurfaceType::Earth, -1),
            frame(1, 10.0, SurfaceType::Earth, 3),
        ];
        let corridor = run_survey(&frames, &track, &SurveyConfig::default()).unwrap();
        assert!(corridor.diagnostics.contains(&Diagnostic::UnscoredFrames {
            frame_indices: vec![0],
        }));
    }
}
