//! # Homogeneous Section Detection
//!
//! Partitions a time-ordered frame sequence into contiguous road sections
//! that are each uniform in surface type and condition class.
//!
//! ## Algorithm
//! Frames are scanned in order while accumulating the track distance covered
//! by the current section. Before each frame the sectioner decides whether
//! that frame opens a new section:
//!
//! 1. Nothing breaks below the length floor (`min_section_km`).
//! 2. Above the floor, a change of surface breaks immediately.
//! 3. Above the floor, a change of condition class breaks only when the
//!    following `smoothing_window` frames confirm the new class, so a single
//!    noisy frame never splits a section.
//!
//! "Change" is measured against the section's established identity: the
//! most frequent surface and condition key among the frames taken so far.
//! The identity only moves when another value strictly outnumbers it, so a
//! noisy opening frame is outvoted by the frames that follow it.
//! 4. Independently of the floor, a break is forced before the section would
//!    grow past `max_section_km`.
//!
//! The decision sees only surface, condition class and geometry. Roadside
//! activity is summarized after sectioning and never moves a boundary.

pub mod aggregate;
pub mod equity;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::condition::{ConditionClass, SurfaceType};
use crate::error::{Result, SurveyError};

pub use aggregate::{aggregate_condition, median, mode, ConditionSummary};
pub use equity::{aggregate_equity, classify_equity_concern, EquityConcern, EquitySummary};

/// Which view of the condition class a break compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakGranularity {
    /// The six condition classes
    #[default]
    Class,
    /// The four coarse condition bands
    Band,
}

/// Configuration for section detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionConfig {
    /// Length a section must reach before it may break (km)
    pub min_section_km: f64,
    /// Length at which a break is forced (km)
    pub max_section_km: f64,
    /// Frames after a class change that must confirm it
    pub smoothing_window: usize,
    /// Longest step between consecutive points of a section path (km)
    pub max_path_step_km: f64,
    /// Compare condition classes or coarse bands
    pub break_granularity: BreakGranularity,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            min_section_km: 0.3,     // 300m
            max_section_km: 2.0,     // 2km
            smoothing_window: 2,     // two confirming frames
            max_path_step_km: 0.25,  // 250m between rendered path points
            break_granularity: BreakGranularity::Class,
        }
    }
}

impl SectionConfig {
    /// Reject bounds no partition could satisfy.
    pub fn validate(&self) -> Result<()> {
        let finite = [self.min_section_km, self.max_section_km, self.max_path_step_km]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(SurveyError::Config {
                message: "section lengths must be finite".to_string(),
            });
        }
        if self.min_section_km < 0.0 {
            return Err(SurveyError::Config {
                message: format!("min_section_km must be >= 0, got {}", self.min_section_km),
            });
        }
        if self.max_section_km <= self.min_section_km {
            return Err(SurveyError::Config {
                message: format!(
                    "max_section_km ({}) must exceed min_section_km ({})",
                    self.max_section_km, self.min_section_km
                ),
            });
        }
        if self.max_path_step_km <= 0.0 {
            return Err(SurveyError::Config {
                message: format!(
                    "max_path_step_km must be > 0, got {}",
                    self.max_path_step_km
                ),
            });
        }
        Ok(())
    }
}

/// What the sectioner knows about one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    pub surface: SurfaceType,
    pub class: ConditionClass,
    /// Track distance to the next frame (km); ignored for the last frame
    pub gap_to_next_km: f64,
}

/// Why a section ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakReason {
    SurfaceChange,
    ConditionChange,
    LengthLimit,
    EndOfRoute,
}

/// A contiguous run of frames forming one section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSpan {
    /// First frame (inclusive)
    pub start: usize,
    /// One past the last frame
    pub end: usize,
    /// Track distance from the first frame to the next span's first frame (km)
    pub length_km: f64,
    pub closed_by: BreakReason,
}

impl FrameSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

fn condition_key(class: ConditionClass, granularity: BreakGranularity) -> u8 {
    match granularity {
        BreakGranularity::Class => class as u8,
        BreakGranularity::Band => class.band() as u8,
    }
}

/// Running mode of the values seen in the open section.
#[derive(Debug, Clone)]
struct RunningMode<T> {
    counts: Vec<(T, usize)>,
    current: usize,
}

impl<T: Copy + PartialEq> RunningMode<T> {
    fn new(first: T) -> Self {
        Self {
            counts: vec![(first, 1)],
            current: 0,
        }
    }

    fn value(&self) -> T {
        self.counts[self.current].0
    }

    fn push(&mut self, value: T) {
        let slot = match self.counts.iter().position(|(v, _)| *v == value) {
            Some(slot) => {
                self.counts[slot].1 += 1;
                slot
            }
            None => {
                self.counts.push((value, 1));
                self.counts.len() - 1
            }
        };
        // Ties keep the established value
        if self.counts[slot].1 > self.counts[self.current].1 {
            self.current = slot;
        }
    }
}

/// Partition frames into homogeneous spans.
///
/// The spans are ordered, disjoint and together cover every sample. An
/// empty input produces no spans.
///
/// ```rust
/// use corridor_survey::{partition_frames, ConditionClass, FrameSample, SectionConfig, SurfaceType};
///
/// let samples: Vec<FrameSample> = (0..20)
///     .map(|i| FrameSample {
///         surface: if i < 10 { SurfaceType::Gravel } else { SurfaceType::PavedAsphalt },
///         class: ConditionClass::Fair,
///         gap_to_next_km: 0.05,
///     })
///     .collect();
///
/// let spans = partition_frames(&samples, &SectionConfig::default());
/// assert_eq!(spans.len(), 2);
/// assert_eq!(spans[1].start, 10);
/// ```
pub fn partition_frames(samples: &[FrameSample], config: &SectionConfig) -> Vec<FrameSpan> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }

    let gap = |i: usize| {
        if i + 1 < n {
            samples[i].gap_to_next_km.max(0.0)
        } else {
            0.0
        }
    };
    let key = |i: usize| condition_key(samples[i].class, config.break_granularity);

    let mut spans = Vec::new();
    let mut start = 0;
    let mut length_km = gap(0);
    let mut surface = RunningMode::new(samples[0].surface);
    let mut class_key = RunningMode::new(key(0));

    for next in 1..n {
        let identity = Identity {
            surface: surface.value(),
            key: class_key.value(),
        };
        let reason = break_before(samples, next, identity, length_km, gap(next), &key, config);

        if let Some(closed_by) = reason {
            debug!(
                "[Sectioner] Section {} frames {}..{} ({:.3} km) closed by {:?}",
                spans.len(),
                start,
                next,
                length_km,
                closed_by
            );
            spans.push(FrameSpan {
                start,
                end: next,
                length_km,
                closed_by,
            });
            start = next;
            length_km = 0.0;
            surface = RunningMode::new(samples[next].surface);
            class_key = RunningMode::new(key(next));
        } else {
            surface.push(samples[next].surface);
            class_key.push(key(next));
        }

        length_km += gap(next);
    }

    spans.push(FrameSpan {
        start,
        end: n,
        length_km,
        closed_by: BreakReason::EndOfRoute,
    });

    info!(
        "[Sectioner] {} frames -> {} sections",
        n,
        spans.len()
    );
    spans
}

/// Surface and condition key the open section currently stands for.
#[derive(Debug, Clone, Copy)]
struct Identity {
    surface: SurfaceType,
    key: u8,
}

/// Decide whether frame `next` opens a new section.
fn break_before(
    samples: &[FrameSample],
    next: usize,
    identity: Identity,
    length_km: f64,
    next_gap_km: f64,
    key: &dyn Fn(usize) -> u8,
    config: &SectionConfig,
) -> Option<BreakReason> {
    if length_km >= config.min_section_km {
        if samples[next].surface != identity.surface {
            return Some(BreakReason::SurfaceChange);
        }

        let candidate = key(next);
        if candidate != identity.key {
            let confirm_end = next + config.smoothing_window;
            let confirmed =
                confirm_end < samples.len() && (next + 1..=confirm_end).all(|i| key(i) == candidate);
            if confirmed {
                return Some(BreakReason::ConditionChange);
            }
        }
    }

    if length_km + next_gap_km > config.max_section_km {
        return Some(BreakReason::LengthLimit);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(classes: &[ConditionClass], surface: SurfaceType, gap_km: f64) -> Vec<FrameSample> {
        classes
            .iter()
            .map(|&class| FrameSample {
                surface,
                class,
                gap_to_next_km: gap_km,
            })
            .collect()
    }

    fn assert_partition(spans: &[FrameSpan], n: usize) {
        assert_eq!(spans.first().map(|s| s.start), Some(0));
        assert_eq!(spans.last().map(|s| s.end), Some(n));
        for pair in spans.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert!(spans.iter().all(|s| !s.is_empty()));
    }

    #[test]
    fn test_empty_input() {
        assert!(partition_frames(&[], &SectionConfig::default()).is_empty());
    }

    #[test]
    fn test_single_frame() {
        let s = samples(&[ConditionClass::Good], SurfaceType::Gravel, 0.1);
        let spans = partition_frames(&s, &SectionConfig::default());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].length_km, 0.0);
        assert_eq!(spans[0].closed_by, BreakReason::EndOfRoute);
    }

    #[test]
    fn test_single_noisy_frame_does_not_break() {
        use ConditionClass::*;
        let s = samples(&[Poor, Poor, Fair, Poor, Poor], SurfaceType::Gravel, 0.2);
        let spans = partition_frames(&s, &SectionConfig::default());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].len(), 5);
    }

    #[test]
    fn test_sustained_class_change_breaks() {
        use ConditionClass::*;
        let s = samples(&[Poor, Poor, Poor, Fair, Fair, Fair, Fair], SurfaceType::Gravel, 0.2);
        let spans = partition_frames(&s, &SectionConfig::default());
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].start, 3);
        assert_eq!(spans[0].closed_by, BreakReason::ConditionChange);
        assert!((spans[0].length_km - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_class_change_at_route_end_is_unconfirmed() {
        use ConditionClass::*;
        let s = samples(&[Poor, Poor, Poor, Fair, Fair], SurfaceType::Gravel, 0.2);
        let spans = partition_frames(&s, &SectionConfig::default());
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn test_noisy_opening_frame_is_outvoted() {
        use ConditionClass::*;
        let mut classes = vec![Fair];
        classes.extend(vec![Poor; 15]);
        let s = samples(&classes, SurfaceType::Gravel, 0.1);

        let spans = partition_frames(&s, &SectionConfig::default());
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].closed_by, BreakReason::EndOfRoute);
    }

    #[test]
    fn test_single_surface_blip_adds_at_most_one_break() {
        let mut s = samples(&[ConditionClass::Fair; 16], SurfaceType::Gravel, 0.1);
        s[5].surface = SurfaceType::Earth;

        let spans = partition_frames(&s, &SectionConfig::default());
        assert_partition(&spans, 16);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].start, 5);
        assert_eq!(spans[1].closed_by, BreakReason::EndOfRoute);
    }

    #[test]
    fn test_running_mode_keeps_value_on_tie() {
        let mut mode = RunningMode::new(SurfaceType::Earth);
        mode.push(SurfaceType::Gravel);
        assert_eq!(mode.value(), SurfaceType::Earth);
        mode.push(SurfaceType::Gravel);
        assert_eq!(mode.value(), SurfaceType::Gravel);
    }

    #[test]
    fn test_no_break_below_floor() {
        let mut s = samples(&[ConditionClass::Fair; 6], SurfaceType::Gravel, 0.05);
        for sample in s.iter_mut().skip(3) {
            sample.surface = SurfaceType::PavedAsphalt;
        }
        // Only 0.15 km accumulated when the surface changes
        let spans = partition_frames(&s, &SectionConfig::default());
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn test_surface_change_breaks_once_floor_met() {
        let mut s = samples(&[ConditionClass::Fair; 12], SurfaceType::Gravel, 0.1);
        for sample in s.iter_mut().skip(7) {
            sample.surface = SurfaceType::Earth;
        }
        let spans = partition_frames(&s, &SectionConfig::default());
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].start, 7);
        assert_eq!(spans[0].closed_by, BreakReason::SurfaceChange);
    }

    #[test]
    fn test_forced_break_on_long_uniform_road() {
        // 60 frames, 125m apart: 7.4 km of identical road
        let s = samples(&[ConditionClass::Good; 60], SurfaceType::PavedAsphalt, 0.125);
        let spans = partition_frames(&s, &SectionConfig::default());
        assert_partition(&spans, 60);
        assert_eq!(spans.len(), 4);
        for span in &spans[..3] {
            assert_eq!(span.closed_by, BreakReason::LengthLimit);
            assert_eq!(span.length_km, 2.0);
            assert_eq!(span.len(), 16);
        }
        assert_eq!(spans[3].length_km, 1.375);
    }

    #[test]
    fn test_band_granularity_ignores_within_band_changes() {
        use ConditionClass::*;
        let s = samples(&[VeryGood, VeryGood, VeryGood, Good, Good, Good, Good], SurfaceType::PavedAsphalt, 0.2);

        let by_class = partition_frames(&s, &SectionConfig::default());
        assert_eq!(by_class.len(), 2);

        let config = SectionConfig {
            break_granularity: BreakGranularity::Band,
            ..SectionConfig::default()
        };
        assert_eq!(partition_frames(&s, &config).len(), 1);
    }

    #[test]
    fn test_lengths_sum_to_route_length() {
        use ConditionClass::*;
        let mut classes = vec![Good; 10];
        classes.extend(vec![Poor; 10]);
        classes.extend(vec![Fair; 10]);
        let s = samples(&classes, SurfaceType::Gravel, 0.07);
        let spans = partition_frames(&s, &SectionConfig::default());
        assert_partition(&spans, 30);
        let total: f64 = spans.iter().map(|s| s.length_km).sum();
        assert!((total - 29.0 * 0.07).abs() < 1e-9);
    }

    #[test]
    fn test_config_validation() {
        assert!(SectionConfig::default().validate().is_ok());

        let inverted = SectionConfig {
            min_section_km: 2.0,
            max_section_km: 1.0,
            ..SectionConfig::default()
        };
        assert!(matches!(inverted.validate(), Err(SurveyError::Config { .. })));

        let bad_step = SectionConfig {
            max_path_step_km: 0.0,
            ..SectionConfig::default()
        };
        assert!(bad_step.validate().is_err());

        let nan = SectionConfig {
            min_section_km: f64::NAN,
            ..SectionConfig::default()
        };
        assert!(nan.validate().is_err());
    }
}
