//! SOFA scoring core
//!
//! Implements the Sepsis-related Organ Failure Assessment score after
//! Singer et al. (doi:10.1001/jama.2016.0287):
//! - Immutable condition snapshot types
//! - Six per-organ-system sub-scores
//! - Composite score aggregation

pub mod systems;

use serde::{Serialize, Deserialize};

/// Vasoactive agents recognized by the cardiovascular sub-score.
///
/// Drug names outside the SOFA vocabulary map to `Other`, which the
/// cardiovascular classifier ignores in favor of the pressure branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatecholamineAgent {
    Dopamine,
    Dobutamine,
    Epinephrine,
    Norepinephrine,
    Other,
}

impl Serialize for CatecholamineAgent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CatecholamineAgent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(CatecholamineAgent::from_code(&name))
    }
}

impl CatecholamineAgent {
    /// Maps a free-text drug name onto the SOFA vocabulary.
    pub fn from_code(code: &str) -> Self {
        match code.to_ascii_lowercase().as_str() {
            "dopamine" => CatecholamineAgent::Dopamine,
            "dobutamine" => CatecholamineAgent::Dobutamine,
            "epinephrine" => CatecholamineAgent::Epinephrine,
            "norepinephrine" => CatecholamineAgent::Norepinephrine,
            _ => CatecholamineAgent::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CatecholamineAgent::Dopamine => "dopamine",
            CatecholamineAgent::Dobutamine => "dobutamine",
            CatecholamineAgent::Epinephrine => "epinephrine",
            CatecholamineAgent::Norepinephrine => "norepinephrine",
            CatecholamineAgent::Other => "other",
        }
    }
}

/// An active catecholamine administration, dosage in µg/kg/min.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Catecholamine {
    pub agent: CatecholamineAgent,
    pub dosage: f64,
}

/// One patient's state at one point in time, everything the six
/// sub-scores need.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub mean_arterial_pressure: f64,      // mmHg
    pub catecholamine: Option<Catecholamine>,
    pub platelets_count: u32,             // count per µL
    pub creatinine_level: f64,            // mg/dL
    pub bilirubin_level: f64,             // mg/dL
    pub glasgow_coma_scale: u8,           // 3 (worst) to 15 (best)
    pub partial_pressure_of_oxygen: f64,  // PaO2, mmHg
    pub is_mechanically_ventilated: bool,
}

/// The six sub-scores of a single assessment, each in 0..=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganScores {
    pub cardiovascular: u8,
    pub coagulation: u8,
    pub kidneys: u8,
    pub liver: u8,
    pub nervous_system: u8,
    pub respiratory: u8,
}

impl OrganScores {
    /// Scores each organ system from the corresponding snapshot fields.
    pub fn of(condition: Condition) -> Self {
        OrganScores {
            cardiovascular: systems::cardiovascular(
                condition.mean_arterial_pressure,
                condition.catecholamine,
            ),
            coagulation: systems::coagulation(condition.platelets_count),
            kidneys: systems::kidneys(condition.creatinine_level),
            liver: systems::liver(condition.bilirubin_level),
            nervous_system: systems::nervous_system(condition.glasgow_coma_scale),
            respiratory: systems::respiratory(
                condition.partial_pressure_of_oxygen,
                condition.is_mechanically_ventilated,
            ),
        }
    }

    /// Composite SOFA score, 0..=24.
    pub fn total(&self) -> u8 {
        self.cardiovascular
            + self.coagulation
            + self.kidneys
            + self.liver
            + self.nervous_system
            + self.respiratory
    }
}

/// Computes the composite SOFA score for a condition snapshot.
pub fn compute(condition: Condition) -> u8 {
    OrganScores::of(condition).total()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn healthy() -> Condition {
        Condition {
            mean_arterial_pressure: 70.0,
            catecholamine: None,
            platelets_count: 150_000,
            creatinine_level: 1.1,
            bilirubin_level: 1.1,
            glasgow_coma_scale: 15,
            partial_pressure_of_oxygen: 450.0,
            is_mechanically_ventilated: false,
        }
    }

    #[test]
    fn healthy_condition_scores_zero() {
        assert_eq!(compute(healthy()), 0);
    }

    #[test]
    fn septic_condition_scores_sixteen() {
        let condition = Condition {
            mean_arterial_pressure: 50.0,
            catecholamine: Some(Catecholamine {
                agent: CatecholamineAgent::Epinephrine,
                dosage: 0.5,
            }),
            platelets_count: 100_000,
            creatinine_level: 3.3,
            bilirubin_level: 6.1,
            glasgow_coma_scale: 7,
            partial_pressure_of_oxygen: 150.0,
            is_mechanically_ventilated: true,
        };

        let scores = OrganScores::of(condition);
        assert_eq!(scores.cardiovascular, 4);
        assert_eq!(scores.coagulation, 1);
        assert_eq!(scores.kidneys, 2);
        assert_eq!(scores.liver, 3);
        assert_eq!(scores.nervous_system, 3);
        assert_eq!(scores.respiratory, 3);
        assert_eq!(compute(condition), 16);
    }

    #[test]
    fn moderate_condition_scores_twelve() {
        let condition = Condition {
            mean_arterial_pressure: 50.0,
            catecholamine: Some(Catecholamine {
                agent: CatecholamineAgent::Dobutamine,
                dosage: 1.0,
            }),
            platelets_count: 90_000,
            creatinine_level: 2.3,
            bilirubin_level: 4.1,
            glasgow_coma_scale: 10,
            partial_pressure_of_oxygen: 250.0,
            is_mechanically_ventilated: false,
        };

        assert_eq!(compute(condition), 12);
    }

    #[test]
    fn total_matches_sum_of_sub_scores() {
        let mut condition = healthy();
        condition.platelets_count = 19_000;
        condition.glasgow_coma_scale = 5;

        let scores = OrganScores::of(condition);
        let sum = scores.cardiovascular
            + scores.coagulation
            + scores.kidneys
            + scores.liver
            + scores.nervous_system
            + scores.respiratory;
        assert_eq!(compute(condition), sum);
        assert!(compute(condition) <= 24);
    }

    #[test]
    fn agent_codes_round_trip() {
        assert_eq!(
            CatecholamineAgent::from_code("Norepinephrine"),
            CatecholamineAgent::Norepinephrine
        );
        assert_eq!(
            CatecholamineAgent::from_code("vasopressin"),
            CatecholamineAgent::Other
        );
        assert_eq!(CatecholamineAgent::Dopamine.as_str(), "dopamine");
    }

    #[test]
    fn unknown_agent_deserializes_to_other() {
        let agent: CatecholamineAgent = serde_json::from_str("\"milrinone\"").unwrap();
        assert_eq!(agent, CatecholamineAgent::Other);
    }
}
