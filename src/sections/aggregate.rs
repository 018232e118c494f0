//! Per-section condition statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::condition::{
    normalize_score, roughness, weights_for, ConditionClass, DistressComponent, FrameScore,
    RoughnessEstimate, SurfaceType, NEUTRAL_CONDITION_INDEX,
};
use crate::frame::Frame;
use crate::round1;

/// Condition of one section, combined from its frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSummary {
    /// Most common surface among the frames
    pub surface_type: SurfaceType,
    /// Median frame condition index
    pub condition_index: f64,
    /// Roughness recomputed from the median index and dominant surface
    pub roughness: RoughnessEstimate,
    pub condition_class: ConditionClass,
    /// Mean score per component, `None` where no frame scored it
    pub distress_summary: BTreeMap<DistressComponent, Option<f64>>,
}

/// Upper median: the element at `len / 2` of the sorted values.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(sorted[sorted.len() / 2])
}

/// Most frequent value. Ties go to the smallest value.
pub fn mode<T, I>(values: I) -> Option<T>
where
    T: Ord + Copy,
    I: IntoIterator<Item = T>,
{
    let mut counts: BTreeMap<T, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut best: Option<(T, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

/// Combine the frames of one section.
///
/// `frames` and `scores` are parallel slices. With no frames the summary is
/// neutral: unknown surface at the neutral index.
pub fn aggregate_condition(frames: &[&Frame], scores: &[FrameScore]) -> ConditionSummary {
    let surface_type = mode(frames.iter().map(|f| f.surface_type)).unwrap_or_default();

    let indices: Vec<f64> = scores.iter().map(|s| s.condition_index).collect();
    let condition_index = median(&indices).unwrap_or(NEUTRAL_CONDITION_INDEX);

    let roughness = roughness(condition_index, surface_type);

    let distress_summary = weights_for(surface_type)
        .iter()
        .map(|&(component, _)| {
            let observed: Vec<f64> = frames
                .iter()
                .filter_map(|f| f.component_scores.get(&component).copied())
                .filter_map(normalize_score)
                .map(f64::from)
                .collect();
            let mean = if observed.is_empty() {
                None
            } else {
                Some(round1(observed.iter().sum::<f64>() / observed.len() as f64))
            };
            (component, mean)
        })
        .collect();

    ConditionSummary {
        surface_type,
        condition_index,
        roughness,
        condition_class: ConditionClass::from_roughness(roughness.mid),
        distress_summary,
    }
}
