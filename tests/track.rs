//! GPX loading and position resolution tests.

use std::fs;

use corridor_survey::{
    FrameClock, Placement, PositionResolver, SurveyError, TrackStore,
};

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// 2026-02-12T11:18:00Z
const T0: f64 = 1_770_895_080.0;

fn gpx_document(points: &[(f64, f64, Option<f64>, Option<&str>)]) -> String {
    let mut body = String::new();
    for &(lat, lon, ele, time) in points {
        body.push_str(&format!("      <trkpt lat=\"{}\" lon=\"{}\">\n", lat, lon));
        if let Some(ele) = ele {
            body.push_str(&format!("        <ele>{}</ele>\n", ele));
        }
        if let Some(time) = time {
            body.push_str(&format!("        <time>{}</time>\n", time));
        }
        body.push_str("      </trkpt>\n");
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <gpx version=\"1.1\" creator=\"corridor-survey-tests\" xmlns=\"http://www.topografix.com/GPX/1/1\">\n\
         <trk>\n    <name>survey</name>\n    <trkseg>\n{}    </trkseg>\n  </trk>\n</gpx>\n",
        body
    )
}

#[test]
fn test_parse_gpx_document() {
    let document = gpx_document(&[
        (0.3800, 32.6100, Some(1190.0), Some("2026-02-12T11:18:00Z")),
        (0.3809, 32.6100, Some(1194.0), Some("2026-02-12T11:18:10Z")),
        (0.3818, 32.6100, None, Some("2026-02-12T11:18:20Z")),
        (0.3827, 32.6100, None, None),
    ]);

    let track = TrackStore::from_gpx_str(&document).unwrap();
    assert_eq!(track.len(), 3);
    assert_eq!(track.skipped_points(), 1);
    assert!(!track.was_resorted());

    let first = track.points()[0];
    assert_eq!(first.time, T0);
    assert_eq!(first.elevation, Some(1190.0));
    assert!(approx_eq(track.duration_secs(), 20.0, 1e-9));
    assert!(approx_eq(track.total_distance_m(), 200.0, 1.0));
}

#[test]
fn test_unreadable_document_is_parse_error() {
    let result = TrackStore::from_gpx_str("this is not xml");
    assert!(matches!(result, Err(SurveyError::TrackParse { .. })));
}

#[test]
fn test_elevation_interpolated_only_when_both_known() {
    let document = gpx_document(&[
        (0.3800, 32.6100, Some(1190.0), Some("2026-02-12T11:18:00Z")),
        (0.3809, 32.6100, Some(1200.0), Some("2026-02-12T11:18:10Z")),
        (0.3818, 32.6100, None, Some("2026-02-12T11:18:20Z")),
    ]);
    let track = TrackStore::from_gpx_str(&document).unwrap();
    let resolver = PositionResolver::new(&track);

    let inside = resolver.resolve(T0 + 5.0);
    assert_eq!(inside.placement, Placement::Interpolated);
    assert!(approx_eq(inside.elevation.unwrap(), 1195.0, 1e-9));
    assert!(approx_eq(inside.point.latitude, 0.38045, 1e-9));

    assert_eq!(resolver.resolve(T0 + 15.0).elevation, None);
}

#[test]
fn test_frame_clock_matches_gpx_clock() {
    let document = gpx_document(&[
        (0.3800, 32.6100, None, Some("2026-02-12T11:41:38Z")),
        (0.3900, 32.6100, None, Some("2026-02-12T11:43:18Z")),
    ]);
    let track = TrackStore::from_gpx_str(&document).unwrap();
    let resolver = PositionResolver::new(&track);

    // Local EAT clip start 14:41:38 is 11:41:38 UTC
    let clock = FrameClock::from_clip_name("2026_02_12_144138_00.MP4", 3).unwrap();
    let halfway = resolver.resolve(clock.capture_time(50.0));
    assert_eq!(halfway.placement, Placement::Interpolated);
    assert!(approx_eq(halfway.point.latitude, 0.385, 1e-9));

    let before = resolver.resolve(clock.capture_time(-30.0));
    assert_eq!(before.placement, Placement::ClampedStart);
    assert_eq!(before.point.latitude, 0.38);
}

#[test]
fn test_load_directory_combines_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("b_afternoon.gpx"),
        gpx_document(&[
            (0.3900, 32.6100, None, Some("2026-02-12T13:00:00Z")),
            (0.3909, 32.6100, None, Some("2026-02-12T13:00:10Z")),
        ]),
    )
    .unwrap();
    fs::write(
        dir.path().join("a_morning.gpx"),
        gpx_document(&[
            (0.3800, 32.6100, None, Some("2026-02-12T11:18:00Z")),
            (0.3809, 32.6100, None, Some("2026-02-12T11:18:10Z")),
        ]),
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "not a track").unwrap();

    let track = TrackStore::from_gpx_path(dir.path()).unwrap();
    assert_eq!(track.len(), 4);
    assert_eq!(track.points()[0].time, T0);
    assert!(track
        .points()
        .windows(2)
        .all(|w| w[0].time <= w[1].time));
}

#[test]
fn test_missing_track_paths() {
    let empty = tempfile::tempdir().unwrap();
    let missing = empty.path().join("does-not-exist.gpx");
    assert!(matches!(
        TrackStore::from_gpx_path(&missing),
        Err(SurveyError::TrackNotFound { .. })
    ));

    assert!(matches!(
        TrackStore::from_gpx_path(empty.path()),
        Err(SurveyError::TrackNotFound { .. })
    ));
}
