//! Per-section equity and roadside activity summary.
//!
//! Each field has its own combination rule. Most take the highest level seen
//! along the section, but footpath provision takes the worst, so one stretch
//! without a footpath marks the whole section.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::aggregate::mode;
use crate::frame::{ActivityLevel, ActivityObservation, FootpathQuality, LandUse, PresenceLevel};

/// How strongly the section's users are exposed to the road.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquityConcern {
    #[default]
    Low,
    Moderate,
    High,
}

impl EquityConcern {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquityConcern::Low => "low",
            EquityConcern::Moderate => "moderate",
            EquityConcern::High => "high",
        }
    }
}

/// Roadside activity combined over a section's frames.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EquitySummary {
    pub dominant_land_use: LandUse,
    pub activity_level: ActivityLevel,
    pub pedestrian_presence: PresenceLevel,
    pub school_children_observed: bool,
    pub vendors_observed: bool,
    pub nmt_footpath: FootpathQuality,
    pub pedestrians_on_carriageway: bool,
    pub facilities_seen: BTreeSet<String>,
    pub vehicle_mix_summary: BTreeMap<String, PresenceLevel>,
    pub equity_concern: EquityConcern,
}

/// Classify equity concern from the combined fields. First match wins.
pub fn classify_equity_concern(
    pedestrians: PresenceLevel,
    footpath: FootpathQuality,
    school_children: bool,
) -> EquityConcern {
    let busy = matches!(pedestrians, PresenceLevel::Many | PresenceLevel::Some);
    if busy && footpath == FootpathQuality::None {
        return EquityConcern::High;
    }
    if school_children || (pedestrians == PresenceLevel::Some && footpath == FootpathQuality::Poor) {
        return EquityConcern::Moderate;
    }
    if pedestrians == PresenceLevel::Many {
        return EquityConcern::Moderate;
    }
    EquityConcern::Low
}

/// Combine the activity observations of one section.
///
/// The result does not depend on the order of the observations. With no
/// observations every field is at its lowest level.
pub fn aggregate_equity<'a, I>(observations: I) -> EquitySummary
where
    I: IntoIterator<Item = &'a ActivityObservation>,
{
    let mut land_uses = Vec::new();
    let mut activity_level = ActivityLevel::Unknown;
    let mut pedestrian_presence = PresenceLevel::None;
    let mut school_children_observed = false;
    let mut vendors_observed = false;
    let mut nmt_footpath: Option<FootpathQuality> = None;
    let mut pedestrians_on_carriageway = false;
    let mut facilities_seen = BTreeSet::new();
    let mut vehicle_mix_summary: BTreeMap<String, PresenceLevel> = BTreeMap::new();

    for obs in observations {
        land_uses.push(obs.land_use);
        activity_level = activity_level.max(obs.activity_level);
        pedestrian_presence = pedestrian_presence.max(obs.pedestrian_presence);
        school_children_observed |= obs.school_children;
        vendors_observed |= obs.vendors;
        nmt_footpath = Some(nmt_footpath.map_or(obs.footpath, |worst| worst.min(obs.footpath)));
        pedestrians_on_carriageway |= obs.pedestrians_on_carriageway;

        facilities_seen.extend(
            obs.facilities
                .iter()
                .map(|f| f.trim())
                .filter(|f| !f.is_empty() && !f.eq_ignore_ascii_case("none"))
                .map(str::to_string),
        );

        for (vehicle, &level) in &obs.vehicles {
            if level == PresenceLevel::None {
                continue;
            }
            let entry = vehicle_mix_summary
                .entry(vehicle.clone())
                .or_insert(level);
            *entry = (*entry).max(level);
        }
    }

    let nmt_footpath = nmt_footpath.unwrap_or_default();
    let equity_concern =
        classify_equity_concern(pedestrian_presence, nmt_footpath, school_children_observed);

    EquitySummary {
        dominant_land_use: mode(land_uses).unwrap_or_default(),
        activity_level,
        pedestrian_presence,
        school_children_observed,
        vendors_observed,
        nmt_footpath,
        pedestrians_on_carriageway,
        facilities_seen,
        vehicle_mix_summary,
        equity_concern,
    }
}
