//! GPS track storage: GPX parsing, time ordering and range queries.
//!
//! A [`TrackStore`] holds the raw trackpoints of one trip sorted by time.
//! Out-of-order samples are tolerated (the store re-sorts them) and samples
//! sharing a timestamp are kept as independent points.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurveyError};
use crate::geo_utils::polyline_length;
use crate::{Bounds, GpsPoint};

/// One timestamped GPS sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trackpoint {
    /// Seconds since the Unix epoch (UTC)
    pub time: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Elevation in meters, when the receiver recorded one
    pub elevation: Option<f64>,
}

impl Trackpoint {
    /// Create a trackpoint without elevation.
    pub fn new(time: f64, latitude: f64, longitude: f64) -> Self {
        Self {
            time,
            latitude,
            longitude,
            elevation: None,
        }
    }

    /// Attach an elevation in meters.
    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    /// The horizontal position of this sample.
    pub fn position(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

/// Time-ordered trackpoints of one trip.
#[derive(Debug, Clone, Default)]
pub struct TrackStore {
    points: Vec<Trackpoint>,
    resorted: bool,
    skipped: usize,
}

impl TrackStore {
    /// Build a store from trackpoints in any order.
    ///
    /// Points with a non-finite time or invalid coordinates are dropped and
    /// counted in [`TrackStore::skipped_points`].
    pub fn new(points: Vec<Trackpoint>) -> Self {
        Self::with_skipped(points, 0)
    }

    /// A store with no points. Every position query falls back to (0, 0).
    pub fn empty() -> Self {
        Self::default()
    }

    fn with_skipped(points: Vec<Trackpoint>, already_skipped: usize) -> Self {
        let total = points.len();
        let mut points: Vec<Trackpoint> = points
            .into_iter()
            .filter(|p| p.time.is_finite() && p.position().is_valid())
            .collect();
        let skipped = already_skipped + (total - points.len());

        let resorted = points.windows(2).any(|w| w[1].time < w[0].time);
        if resorted {
            // Stable: duplicates keep their recorded order
            points.sort_by(|a, b| a.time.total_cmp(&b.time));
        }

        Self {
            points,
            resorted,
            skipped,
        }
    }

    /// Parse a GPX document held in memory.
    pub fn from_gpx_str(document: &str) -> Result<Self> {
        Self::from_gpx_reader(document.as_bytes(), "<memory>")
    }

    /// Parse a GPX document from any reader. `source` names the input in errors.
    pub fn from_gpx_reader<R: Read>(reader: R, source: &str) -> Result<Self> {
        let (points, untimed) = parse_gpx(reader, source)?;
        info!(
            "[Track] Parsed {} trackpoints from {} ({} without time skipped)",
            points.len(),
            source,
            untimed
        );
        Ok(Self::with_skipped(points, untimed))
    }

    /// Load a single `.gpx` file, or every `.gpx` file in a directory.
    ///
    /// Directory contents are read in file-name order and combined
    /// chronologically.
    pub fn from_gpx_path(path: &Path) -> Result<Self> {
        if path.is_file() {
            let file = File::open(path).map_err(|e| SurveyError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            return Self::from_gpx_reader(BufReader::new(file), &path.display().to_string());
        }

        if !path.is_dir() {
            return Err(SurveyError::TrackNotFound {
                path: path.display().to_string(),
            });
        }

        let entries = fs::read_dir(path).map_err(|e| SurveyError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let mut gpx_files: Vec<_> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .map_or(false, |ext| ext.eq_ignore_ascii_case("gpx"))
            })
            .collect();
        gpx_files.sort();

        if gpx_files.is_empty() {
            return Err(SurveyError::TrackNotFound {
                path: path.display().to_string(),
            });
        }

        info!(
            "[Track] Found {} GPX files in {}",
            gpx_files.len(),
            path.display()
        );

        let mut all_points = Vec::new();
        let mut untimed_total = 0;
        for file_path in &gpx_files {
            let source = file_path.display().to_string();
            let file = File::open(file_path).map_err(|e| SurveyError::Io {
                path: source.clone(),
                message: e.to_string(),
            })?;
            let (points, untimed) = parse_gpx(BufReader::new(file), &source)?;
            debug!("[Track]   {}: {} trackpoints", source, points.len());
            all_points.extend(points);
            untimed_total += untimed;
        }

        // Files are independent recordings; sort without flagging as out-of-order
        all_points.sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(Self::with_skipped(all_points, untimed_total))
    }

    /// All trackpoints in time order.
    pub fn points(&self) -> &[Trackpoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether the input had to be re-sorted by time.
    pub fn was_resorted(&self) -> bool {
        self.resorted
    }

    /// Number of input samples dropped (no time, or unusable coordinates).
    pub fn skipped_points(&self) -> usize {
        self.skipped
    }

    /// All trackpoints with `t_start <= time <= t_end`, in time order.
    pub fn range(&self, t_start: f64, t_end: f64) -> &[Trackpoint] {
        let (lo, hi) = ordered(t_start, t_end);
        let first = self.points.partition_point(|p| p.time < lo);
        let last = self.points.partition_point(|p| p.time <= hi);
        &self.points[first..last.max(first)]
    }

    /// All trackpoints with `t_start < time < t_end`, in time order.
    pub fn strictly_between(&self, t_start: f64, t_end: f64) -> &[Trackpoint] {
        let (lo, hi) = ordered(t_start, t_end);
        let first = self.points.partition_point(|p| p.time <= lo);
        let last = self.points.partition_point(|p| p.time < hi);
        &self.points[first..last.max(first)]
    }

    /// First and last timestamps, if the track has any points.
    pub fn time_span(&self) -> Option<(f64, f64)> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some((first.time, last.time)),
            _ => None,
        }
    }

    /// Recorded duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.time_span().map_or(0.0, |(start, end)| end - start)
    }

    /// Distance along the raw track in meters.
    pub fn total_distance_m(&self) -> f64 {
        let positions: Vec<GpsPoint> = self.points.iter().map(|p| p.position()).collect();
        polyline_length(&positions)
    }

    /// Bounding box of the track.
    pub fn bounds(&self) -> Option<Bounds> {
        let positions: Vec<GpsPoint> = self.points.iter().map(|p| p.position()).collect();
        Bounds::from_points(&positions)
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if b < a {
        (b, a)
    } else {
        (a, b)
    }
}

/// Read every `trkpt` of a GPX document. Returns the timed points and the
/// number of points skipped for having no timestamp.
fn parse_gpx<R: Read>(reader: R, source: &str) -> Result<(Vec<Trackpoint>, usize)> {
    let gpx = gpx::read(reader).map_err(|e| SurveyError::TrackParse {
        source: source.to_string(),
        message: e.to_string(),
    })?;

    let mut points = Vec::new();
    let mut untimed = 0;

    for track in &gpx.tracks {
        for segment in &track.segments {
            for waypoint in &segment.points {
                let Some(time) = waypoint.time.as_ref() else {
                    untimed += 1;
                    continue;
                };
                let iso = time.format().map_err(|e| SurveyError::TrackParse {
                    source: source.to_string(),
                    message: e.to_string(),
                })?;
                let utc = DateTime::parse_from_rfc3339(&iso)
                    .map_err(|e| SurveyError::TrackParse {
                        source: source.to_string(),
                        message: format!("bad timestamp '{}': {}", iso, e),
                    })?
                    .with_timezone(&Utc);

                let geo_point = waypoint.point();
                points.push(Trackpoint {
                    time: epoch_seconds(&utc),
                    latitude: geo_point.y(),
                    longitude: geo_point.x(),
                    elevation: waypoint.elevation,
                });
            }
        }
    }

    if untimed > 0 {
        warn!(
            "[Track] {} trackpoints in {} have no timestamp and cannot be matched to frames",
            untimed, source
        );
    }

    Ok((points, untimed))
}

/// Seconds since the Unix epoch with microsecond precision.
pub(crate) fn epoch_seconds(time: &DateTime<Utc>) -> f64 {
    time.timestamp() as f64 + f64::from(time.timestamp_subsec_micros()) / 1_000_000.0
}
