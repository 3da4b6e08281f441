//! Per-organ-system threshold classifiers
//!
//! Each function maps one or two measurements to a sub-score in 0..=4.
//! All of them are total over their inputs; values past the outermost
//! threshold land in the "normal" bucket.

use super::{Catecholamine, CatecholamineAgent};

/// Scores the cardiovascular system from mean arterial pressure (mmHg)
/// and any active catecholamine therapy.
///
/// Drug therapy takes precedence over the pressure reading. An agent
/// outside the SOFA vocabulary does not contribute and scoring falls
/// back to the pressure branch.
pub fn cardiovascular(mean_arterial_pressure: f64, catecholamine: Option<Catecholamine>) -> u8 {
    if let Some(catecholamine) = catecholamine {
        match catecholamine.agent {
            CatecholamineAgent::Dopamine => {
                return if catecholamine.dosage <= 5.0 {
                    2
                } else if catecholamine.dosage < 15.0 {
                    3
                } else {
                    4
                };
            }
            CatecholamineAgent::Dobutamine => return 2,
            CatecholamineAgent::Epinephrine | CatecholamineAgent::Norepinephrine => {
                return if catecholamine.dosage <= 0.1 { 3 } else { 4 };
            }
            // Unrecognized agent, fall through to the pressure branch
            CatecholamineAgent::Other => {}
        }
    }
    if mean_arterial_pressure < 70.0 {
        1
    } else {
        0
    }
}

/// Scores coagulation from the platelet count (number per µL).
pub fn coagulation(platelets_count: u32) -> u8 {
    if platelets_count < 20_000 {
        4
    } else if platelets_count < 50_000 {
        3
    } else if platelets_count < 100_000 {
        2
    } else if platelets_count < 150_000 {
        1
    } else {
        0
    }
}

/// Scores the kidneys from the creatinine level (mg/dL).
pub fn kidneys(creatinine_level: f64) -> u8 {
    if creatinine_level >= 5.0 {
        4
    } else if creatinine_level >= 3.5 {
        3
    } else if creatinine_level >= 2.0 {
        2
    } else if creatinine_level >= 1.2 {
        1
    } else {
        0
    }
}

/// Scores the liver from the bilirubin level (mg/dL).
pub fn liver(bilirubin_level: f64) -> u8 {
    if bilirubin_level >= 12.0 {
        4
    } else if bilirubin_level >= 6.0 {
        3
    } else if bilirubin_level >= 2.0 {
        2
    } else if bilirubin_level >= 1.2 {
        1
    } else {
        0
    }
}

/// Scores the nervous system from the Glasgow Coma Scale
/// (Teasdale et al., doi:10.1016/S0140-6736(74)91639-0).
pub fn nervous_system(glasgow_coma_scale: u8) -> u8 {
    if glasgow_coma_scale < 6 {
        4
    } else if glasgow_coma_scale < 10 {
        3
    } else if glasgow_coma_scale < 13 {
        2
    } else if glasgow_coma_scale < 15 {
        1
    } else {
        0
    }
}

/// Scores the respiratory system from PaO2 (mmHg) and the ventilation
/// flag.
///
/// Ventilation gates only the two most severe tiers; without it a low
/// PaO2 cannot score past 2.
pub fn respiratory(partial_pressure_of_oxygen: f64, is_mechanically_ventilated: bool) -> u8 {
    if partial_pressure_of_oxygen < 100.0 && is_mechanically_ventilated {
        4
    } else if partial_pressure_of_oxygen < 200.0 && is_mechanically_ventilated {
        3
    } else if partial_pressure_of_oxygen < 300.0 {
        2
    } else if partial_pressure_of_oxygen < 400.0 {
        1
    } else {
        0
    }
}
