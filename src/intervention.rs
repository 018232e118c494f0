//! # Intervention Advisor
//!
//! Maps a section's surface and condition to a physical treatment from a
//! fixed catalogue, with unit costs calibrated for Ugandan works contracts,
//! and summarizes the treatments recommended along a whole route.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::condition::{ConditionBand, ConditionClass, SurfaceType};
use crate::corridor::Section;
use crate::error::{OptionExt, Result};
use crate::{round1, round_to};

/// Treatment codes in the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterventionCode {
    Reg,
    Dbst,
    Ac,
    Rehab,
    Pm,
    Rm,
    Dual,
    DualNmt,
}

impl InterventionCode {
    pub const ALL: [InterventionCode; 8] = [
        InterventionCode::Reg,
        InterventionCode::Dbst,
        InterventionCode::Ac,
        InterventionCode::Rehab,
        InterventionCode::Pm,
        InterventionCode::Rm,
        InterventionCode::Dual,
        InterventionCode::DualNmt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InterventionCode::Reg => "REG",
            InterventionCode::Dbst => "DBST",
            InterventionCode::Ac => "AC",
            InterventionCode::Rehab => "REHAB",
            InterventionCode::Pm => "PM",
            InterventionCode::Rm => "RM",
            InterventionCode::Dual => "DUAL",
            InterventionCode::DualNmt => "DUAL_NMT",
        }
    }

    /// Catalogue entry for this code.
    pub fn spec(&self) -> &'static InterventionSpec {
        match self {
            InterventionCode::Reg => &CATALOGUE[0],
            InterventionCode::Dbst => &CATALOGUE[1],
            InterventionCode::Ac => &CATALOGUE[2],
            InterventionCode::Rehab => &CATALOGUE[3],
            InterventionCode::Pm => &CATALOGUE[4],
            InterventionCode::Rm => &CATALOGUE[5],
            InterventionCode::Dual => &CATALOGUE[6],
            InterventionCode::DualNmt => &CATALOGUE[7],
        }
    }
}

impl fmt::Display for InterventionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit costs and service life of one treatment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InterventionSpec {
    pub code: InterventionCode,
    pub name: &'static str,
    /// Construction cost, USD per km
    pub cost_per_km: f64,
    pub design_life_years: u32,
    /// Routine maintenance after construction, USD per km per year
    pub maintenance_per_km_yr: f64,
}

static CATALOGUE: [InterventionSpec; 8] = [
    InterventionSpec {
        code: InterventionCode::Reg,
        name: "Regravelling",
        cost_per_km: 60_000.0,
        design_life_years: 5,
        maintenance_per_km_yr: 5_000.0,
    },
    InterventionSpec {
        code: InterventionCode::Dbst,
        name: "Upgrade to DBST",
        cost_per_km: 800_000.0,
        design_life_years: 10,
        maintenance_per_km_yr: 8_000.0,
    },
    InterventionSpec {
        code: InterventionCode::Ac,
        name: "Upgrade to Asphalt Concrete",
        cost_per_km: 1_000_000.0,
        design_life_years: 15,
        maintenance_per_km_yr: 10_000.0,
    },
    InterventionSpec {
        code: InterventionCode::Rehab,
        name: "Rehabilitation",
        cost_per_km: 600_000.0,
        design_life_years: 12,
        maintenance_per_km_yr: 10_000.0,
    },
    InterventionSpec {
        code: InterventionCode::Pm,
        name: "Periodic Maintenance (Overlay)",
        cost_per_km: 150_000.0,
        design_life_years: 8,
        maintenance_per_km_yr: 8_000.0,
    },
    InterventionSpec {
        code: InterventionCode::Rm,
        name: "Routine Maintenance Only",
        cost_per_km: 5_000.0,
        design_life_years: 1,
        maintenance_per_km_yr: 5_000.0,
    },
    InterventionSpec {
        code: InterventionCode::Dual,
        name: "Dualling",
        cost_per_km: 2_000_000.0,
        design_life_years: 20,
        maintenance_per_km_yr: 15_000.0,
    },
    InterventionSpec {
        code: InterventionCode::DualNmt,
        name: "Dualling + NMT Facilities",
        cost_per_km: 2_500_000.0,
        design_life_years: 20,
        maintenance_per_km_yr: 18_000.0,
    },
];

/// Case-insensitive code lookup.
static CODE_INDEX: Lazy<HashMap<String, InterventionCode>> = Lazy::new(|| {
    InterventionCode::ALL
        .iter()
        .map(|code| (code.as_str().to_ascii_lowercase(), *code))
        .collect()
});

/// The full catalogue in code order.
pub fn catalogue() -> &'static [InterventionSpec] {
    &CATALOGUE
}

/// Look up a treatment by code, e.g. `"dbst"` or `" REHAB "`.
pub fn get_intervention(code: &str) -> Result<&'static InterventionSpec> {
    CODE_INDEX
        .get(&code.trim().to_ascii_lowercase())
        .map(|c| c.spec())
        .ok_or_unknown_intervention(code)
}

// ============================================================================
// Recommendation
// ============================================================================

/// A treatment recommended for one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    pub code: InterventionCode,
    pub name: String,
    pub cost_per_km: f64,
    /// `cost_per_km × length_km`, two decimals
    pub section_cost: f64,
    pub design_life_years: u32,
    pub maintenance_per_km_yr: f64,
    pub reasoning: String,
    pub alternatives: Vec<InterventionCode>,
}

/// Recommend a treatment for a section of the given surface, class and length.
///
/// ```rust
/// use corridor_survey::{ConditionClass, InterventionCode, SurfaceType};
/// use corridor_survey::intervention::recommend;
///
/// let rec = recommend(SurfaceType::Gravel, ConditionClass::Fair, 1.5);
/// assert_eq!(rec.code, InterventionCode::Dbst);
/// assert_eq!(rec.section_cost, 1_200_000.0);
/// ```
pub fn recommend(surface: SurfaceType, class: ConditionClass, length_km: f64) -> Intervention {
    let (code, reasoning, alternatives) = if surface.is_unpaved() {
        (
            InterventionCode::Dbst,
            format!(
                "Unpaved {} surface warrants upgrade to DBST to reduce vehicle operating \
                 costs and provide all-weather access. Regravelling alone is a false economy \
                 at typical traffic levels.",
                surface.label()
            ),
            vec![InterventionCode::Ac, InterventionCode::Reg],
        )
    } else if surface.is_paved() {
        paved_recommendation(surface, class)
    } else if surface == SurfaceType::SurfaceTreatment {
        (
            InterventionCode::Dbst,
            "Existing surface treatment is not a structural pavement; a DBST upgrade \
             restores a sealed all-weather surface."
                .to_string(),
            vec![InterventionCode::Ac, InterventionCode::Reg],
        )
    } else {
        (
            InterventionCode::Dbst,
            "Surface type is unknown; DBST upgrade is recommended as a safe default to \
             ensure all-weather passability."
                .to_string(),
            vec![InterventionCode::Ac, InterventionCode::Reg],
        )
    };

    let spec = code.spec();
    Intervention {
        code,
        name: spec.name.to_string(),
        cost_per_km: spec.cost_per_km,
        section_cost: round_to(spec.cost_per_km * length_km, 2),
        design_life_years: spec.design_life_years,
        maintenance_per_km_yr: spec.maintenance_per_km_yr,
        reasoning,
        alternatives,
    }
}

fn paved_recommendation(
    surface: SurfaceType,
    class: ConditionClass,
) -> (InterventionCode, String, Vec<InterventionCode>) {
    let label = surface.label();
    match class.band() {
        ConditionBand::Good => (
            InterventionCode::Rm,
            format!(
                "Paved {} surface in {} condition requires only routine maintenance to \
                 preserve the existing asset.",
                label,
                class.label()
            ),
            vec![InterventionCode::Pm],
        ),
        ConditionBand::Fair => (
            InterventionCode::Pm,
            format!(
                "Paved {} surface in fair condition benefits from a periodic maintenance \
                 overlay to arrest deterioration before costly rehabilitation is needed.",
                label
            ),
            vec![InterventionCode::Rm, InterventionCode::Rehab],
        ),
        ConditionBand::Poor => (
            InterventionCode::Rehab,
            format!(
                "Paved {} surface in poor condition requires rehabilitation to restore \
                 structural integrity and ride quality.",
                label
            ),
            vec![InterventionCode::Ac, InterventionCode::Pm],
        ),
        ConditionBand::Bad => (
            InterventionCode::Rehab,
            format!(
                "Paved {} surface in {} condition requires rehabilitation to restore \
                 structural integrity and prevent further asset loss.",
                label,
                class.label()
            ),
            vec![InterventionCode::Ac, InterventionCode::Pm],
        ),
    }
}

// ============================================================================
// Route summary
// ============================================================================

/// Treatments recommended along a whole route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub section_count: usize,
    /// One decimal
    pub total_length_km: f64,
    /// Two decimals
    pub total_cost: f64,
    /// Most frequent treatment; routine maintenance for an empty route
    pub dominant_intervention: InterventionCode,
    pub counts: BTreeMap<InterventionCode, usize>,
    pub narrative: String,
}

/// Summarize the treatments of a route's sections.
pub fn summarize_route(sections: &[Section]) -> RouteSummary {
    let mut counts: BTreeMap<InterventionCode, usize> = BTreeMap::new();
    // Codes in order of first appearance, used to break count ties
    let mut first_seen: Vec<InterventionCode> = Vec::new();
    let mut total_length = 0.0;
    let mut total_cost = 0.0;

    for section in sections {
        let code = section.intervention.code;
        total_length += section.length_km;
        total_cost += section.intervention.section_cost;
        *counts.entry(code).or_insert(0) += 1;
        if !first_seen.contains(&code) {
            first_seen.push(code);
        }
    }

    // Most common first; equal counts keep first-appearance order
    let mut ranked = first_seen;
    ranked.sort_by(|a, b| counts[b].cmp(&counts[a]));

    let dominant_intervention = ranked.first().copied().unwrap_or(InterventionCode::Rm);
    let total_length_km = round1(total_length);
    let total_cost = round_to(total_cost, 2);

    let n = sections.len();
    let opening = format!(
        "The route comprises {} distinct section{} spanning {:.1} km.",
        n,
        plural(n),
        total_length_km
    );
    let narrative = if ranked.is_empty() {
        "No road sections were surveyed, so no interventions are recommended.".to_string()
    } else if ranked.len() == 1 {
        format!(
            "{} A uniform {} strategy is recommended across all sections, with an estimated \
             total cost of USD {}.",
            opening,
            dominant_intervention.spec().name,
            format_usd(total_cost)
        )
    } else {
        let parts: Vec<String> = ranked
            .iter()
            .map(|code| {
                let count = counts[code];
                format!("{} ({} section{})", code.spec().name, count, plural(count))
            })
            .collect();
        format!(
            "{} The recommended interventions include {}, with an estimated total cost of \
             USD {}.",
            opening,
            parts.join(", "),
            format_usd(total_cost)
        )
    };

    debug!(
        "[Intervention] {} sections, {:.1} km, USD {:.2}, dominant {}",
        n, total_length_km, total_cost, dominant_intervention
    );

    RouteSummary {
        section_count: n,
        total_length_km,
        total_cost,
        dominant_intervention,
        counts,
        narrative,
    }
}

pub(crate) fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Format an amount with thousands separators and two decimals.
pub fn format_usd(amount: f64) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (whole, cents) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SurveyError;

    #[test]
    fn test_catalogue_matches_codes() {
        assert_eq!(catalogue().len(), InterventionCode::ALL.len());
        for code in InterventionCode::ALL {
            assert_eq!(code.spec().code, code);
        }
        assert_eq!(InterventionCode::Reg.spec().cost_per_km, 60_000.0);
        assert_eq!(InterventionCode::DualNmt.spec().design_life_years, 20);
        assert_eq!(InterventionCode::Rm.spec().cost_per_km, 5_000.0);
    }

    #[test]
    fn test_get_intervention() {
        assert_eq!(get_intervention(" dbst ").unwrap().name, "Upgrade to DBST");
        assert_eq!(
            get_intervention("DUAL_NMT").unwrap().code,
            InterventionCode::DualNmt
        );
        assert!(matches!(
            get_intervention("XYZ"),
            Err(SurveyError::UnknownIntervention { .. })
        ));
    }

    #[test]
    fn test_unpaved_always_dbst() {
        for class in ConditionClass::ALL {
            for surface in [SurfaceType::Gravel, SurfaceType::Earth] {
                let rec = recommend(surface, class, 1.0);
                assert_eq!(rec.code, InterventionCode::Dbst);
                assert_eq!(rec.alternatives, vec![InterventionCode::Ac, InterventionCode::Reg]);
                assert!(rec.reasoning.contains("false economy"));
            }
        }
    }

    #[test]
    fn test_paved_by_condition() {
        let cases = [
            (ConditionClass::VeryGood, InterventionCode::Rm),
            (ConditionClass::Good, InterventionCode::Rm),
            (ConditionClass::Fair, InterventionCode::Pm),
            (ConditionClass::Poor, InterventionCode::Rehab),
            (ConditionClass::VeryPoor, InterventionCode::Rehab),
            (ConditionClass::Impassable, InterventionCode::Rehab),
        ];
        for (class, expected) in cases {
            assert_eq!(recommend(SurfaceType::PavedAsphalt, class, 1.0).code, expected);
        }
        let rehab = recommend(SurfaceType::PavedConcrete, ConditionClass::Poor, 1.0);
        assert_eq!(rehab.alternatives, vec![InterventionCode::Ac, InterventionCode::Pm]);
    }

    #[test]
    fn test_surface_treatment_is_upgraded_to_dbst() {
        for class in ConditionClass::ALL {
            let rec = recommend(SurfaceType::SurfaceTreatment, class, 1.0);
            assert_eq!(rec.code, InterventionCode::Dbst);
            assert_eq!(rec.section_cost, 800_000.0);
            assert_eq!(rec.alternatives, vec![InterventionCode::Ac, InterventionCode::Reg]);
        }
    }

    #[test]
    fn test_unknown_surface_defaults_to_dbst() {
        let rec = recommend(SurfaceType::Unknown, ConditionClass::Good, 0.8);
        assert_eq!(rec.code, InterventionCode::Dbst);
        assert_eq!(rec.section_cost, 640_000.0);
    }

    #[test]
    fn test_section_cost_rounding() {
        let rec = recommend(SurfaceType::PavedAsphalt, ConditionClass::Good, 0.123456);
        assert_eq!(rec.section_cost, 617.28);
    }

    #[test]
    fn test_empty_route_summary() {
        let summary = summarize_route(&[]);
        assert_eq!(summary.section_count, 0);
        assert_eq!(summary.total_cost, 0.0);
        assert_eq!(summary.dominant_intervention, InterventionCode::Rm);
        assert!(summary.counts.is_empty());
        assert_eq!(
            summary.narrative,
            "No road sections were surveyed, so no interventions are recommended."
        );
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0.0), "0.00");
        assert_eq!(format_usd(999.5), "999.50");
        assert_eq!(format_usd(1_234_567.891), "1,234,567.89");
        assert_eq!(format_usd(100_000.0), "100,000.00");
        assert_eq!(format_usd(-2500.0), "-2,500.00");
    }
}
