//! Frame capture time to geographic position.
//!
//! Positions are linearly interpolated between the two trackpoints
//! bracketing a capture time. Times outside the recorded track clamp to the
//! nearest endpoint, and the result records which case applied so callers
//! can report it.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Result, SurveyError};
use crate::geo_utils::{haversine_distance, lerp_point, polyline_length};
use crate::track::{epoch_seconds, TrackStore, Trackpoint};
use crate::GpsPoint;

/// Default offset of dashcam clocks from UTC, in hours (East Africa Time).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 3;

/// How a resolved position relates to the recorded track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Within the track's time span
    Interpolated,
    /// Before the first trackpoint, clamped to it
    ClampedStart,
    /// After the last trackpoint, clamped to it
    ClampedEnd,
    /// The track is empty; the position is (0, 0)
    NoTrack,
}

impl Placement {
    /// Whether the capture time fell outside the recorded track.
    pub fn is_outside(&self) -> bool {
        !matches!(self, Placement::Interpolated)
    }
}

/// A position estimate for one capture time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPosition {
    pub point: GpsPoint,
    pub elevation: Option<f64>,
    pub placement: Placement,
}

/// Answers position queries against a [`TrackStore`].
#[derive(Debug, Clone, Copy)]
pub struct PositionResolver<'a> {
    track: &'a TrackStore,
}

impl<'a> PositionResolver<'a> {
    pub fn new(track: &'a TrackStore) -> Self {
        Self { track }
    }

    /// Interpolated position at `time`.
    ///
    /// Elevation is interpolated only when both bracketing trackpoints carry
    /// one. A NaN time clamps to the start of the track.
    pub fn resolve(&self, time: f64) -> ResolvedPosition {
        let points = self.track.points();
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return ResolvedPosition {
                point: GpsPoint::new(0.0, 0.0),
                elevation: None,
                placement: Placement::NoTrack,
            };
        };

        // NaN orders before every trackpoint
        if time.is_nan() || time < first.time {
            return clamped(first, Placement::ClampedStart);
        }

        // First trackpoint strictly after `time`
        let idx = points.partition_point(|p| p.time <= time);
        if idx == points.len() {
            if time > last.time {
                return clamped(last, Placement::ClampedEnd);
            }
            return clamped(last, Placement::Interpolated);
        }

        let before = &points[idx - 1];
        let after = &points[idx];
        let span = after.time - before.time;
        let fraction = if span > 0.0 {
            (time - before.time) / span
        } else {
            0.0
        };

        let elevation = match (before.elevation, after.elevation) {
            (Some(e1), Some(e2)) => Some(e1 + fraction * (e2 - e1)),
            _ => None,
        };

        ResolvedPosition {
            point: lerp_point(&before.position(), &after.position(), fraction),
            elevation,
            placement: Placement::Interpolated,
        }
    }

    /// The resolved position at `time` expressed as a trackpoint.
    pub fn trackpoint_at(&self, time: f64) -> Trackpoint {
        let resolved = self.resolve(time);
        Trackpoint {
            time,
            latitude: resolved.point.latitude,
            longitude: resolved.point.longitude,
            elevation: resolved.elevation,
        }
    }

    /// The travelled path between two capture times.
    ///
    /// Starts with the interpolated position at `t_start`, continues through
    /// every trackpoint strictly between the two times, and ends with the
    /// interpolated position at `t_end`. Always at least two points; with no
    /// trackpoints in between this is a straight two-point segment.
    pub fn positions_between(&self, t_start: f64, t_end: f64) -> Vec<Trackpoint> {
        let (t0, t1) = if t_end < t_start {
            (t_end, t_start)
        } else {
            (t_start, t_end)
        };

        let inner = self.track.strictly_between(t0, t1);
        let mut path = Vec::with_capacity(inner.len() + 2);
        path.push(self.trackpoint_at(t0));
        path.extend_from_slice(inner);
        path.push(self.trackpoint_at(t1));
        path
    }

    /// Like [`positions_between`](Self::positions_between), without times
    /// and elevations.
    pub fn path_between(&self, t_start: f64, t_end: f64) -> Vec<GpsPoint> {
        self.positions_between(t_start, t_end)
            .iter()
            .map(|p| p.position())
            .collect()
    }

    /// Distance travelled between two capture times, in meters.
    pub fn distance_between_m(&self, t_start: f64, t_end: f64) -> f64 {
        polyline_length(&self.path_between(t_start, t_end))
    }

    /// Resolve many capture times at once, preserving order.
    #[cfg(feature = "parallel")]
    pub fn resolve_all(&self, times: &[f64]) -> Vec<ResolvedPosition> {
        times.par_iter().map(|&t| self.resolve(t)).collect()
    }

    /// Resolve many capture times at once, preserving order.
    #[cfg(not(feature = "parallel"))]
    pub fn resolve_all(&self, times: &[f64]) -> Vec<ResolvedPosition> {
        times.iter().map(|&t| self.resolve(t)).collect()
    }
}

fn clamped(point: &Trackpoint, placement: Placement) -> ResolvedPosition {
    ResolvedPosition {
        point: point.position(),
        elevation: point.elevation,
        placement,
    }
}

// ============================================================================
// Frame clock
// ============================================================================

/// Converts offsets within a dashcam clip into UTC capture times.
///
/// Dashcams record local wall-clock time without a zone, so the clip start is
/// interpreted with a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    start: DateTime<Utc>,
}

impl FrameClock {
    /// A clock starting at the given UTC instant.
    pub fn from_utc(start: DateTime<Utc>) -> Self {
        Self { start }
    }

    /// A clock starting at local time `"YYYY-MM-DD HH:MM:SS"`.
    pub fn from_local(local: &str, utc_offset_hours: i32) -> Result<Self> {
        let naive = NaiveDateTime::parse_from_str(local.trim(), "%Y-%m-%d %H:%M:%S")
            .map_err(|e| SurveyError::Config {
                message: format!("invalid start time '{}': {}", local, e),
            })?;
        Self::from_naive(naive, utc_offset_hours)
    }

    /// A clock starting at the time encoded in a dashcam clip name such as
    /// `2026_02_12_144138_00.MP4`.
    pub fn from_clip_name(name: &str, utc_offset_hours: i32) -> Result<Self> {
        let naive = start_time_from_clip_name(name).ok_or_else(|| SurveyError::Config {
            message: format!(
                "clip name '{}' does not match YYYY_MM_DD_HHMMSS_NN.ext",
                name
            ),
        })?;
        Self::from_naive(naive, utc_offset_hours)
    }

    fn from_naive(naive: NaiveDateTime, utc_offset_hours: i32) -> Result<Self> {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600).ok_or_else(|| {
            SurveyError::Config {
                message: format!("UTC offset {}h out of range", utc_offset_hours),
            }
        })?;
        let local = offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| SurveyError::Config {
                message: format!("ambiguous local time {}", naive),
            })?;
        Ok(Self {
            start: local.with_timezone(&Utc),
        })
    }

    /// Clip start as UTC epoch seconds.
    pub fn start_epoch(&self) -> f64 {
        epoch_seconds(&self.start)
    }

    /// Capture time of a frame `offset_secs` into the clip.
    pub fn capture_time(&self, offset_secs: f64) -> f64 {
        self.start_epoch() + offset_secs
    }
}

/// Parse the local start time from a clip name like `2026_02_12_144138_00.MP4`.
///
/// Any leading directory is ignored. Returns `None` when the name does not
/// follow the pattern.
pub fn start_time_from_clip_name(name: &str) -> Option<NaiveDateTime> {
    let file_name = name.rsplit(['/', '\\']).next()?;
    let (stem, extension) = file_name.rsplit_once('.')?;
    if extension.is_empty() {
        return None;
    }

    let parts: Vec<&str> = stem.split('_').collect();
    let expected = [4, 2, 2, 6];
    if parts.len() != 5 || parts[4].is_empty() {
        return None;
    }
    let well_formed = parts
        .iter()
        .all(|part| part.chars().all(|c| c.is_ascii_digit()))
        && parts.iter().zip(expected).all(|(part, len)| part.len() == len);
    if !well_formed {
        return None;
    }

    let stamp = format!("{}-{}-{} {}", parts[0], parts[1], parts[2], parts[3]);
    NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%d %H%M%S").ok()
}

/// Pick indices of points spaced at least `interval_m` apart along the path.
///
/// The first and last points are always kept. Used to thin a dense frame
/// stream before assessment.
pub fn select_by_spacing(points: &[GpsPoint], interval_m: f64) -> Vec<usize> {
    if points.is_empty() {
        return Vec::new();
    }

    let mut selected = vec![0];
    let mut accumulated = 0.0;
    for i in 1..points.len() {
        accumulated += haversine_distance(&points[i - 1], &points[i]);
        if accumulated >= interval_m {
            selected.push(i);
            accumulated = 0.0;
        }
    }

    let last = points.len() - 1;
    if selected.last() != Some(&last) {
        selected.push(last);
    }

    debug!(
        "[Resolver] Selected {} of {} points at {:.0}m spacing",
        selected.len(),
        points.len(),
        interval_m
    );
    selected
}
