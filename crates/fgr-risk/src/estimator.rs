//! 胎儿体重估算 (Hadlock)
//!
//! 与百分位体系无关，仅作为补充信息随评估结果一并展示。

use fgr_core::utils::format_value;
use fgr_core::{FgrError, Result};
use serde::{Deserialize, Serialize};

const INTERCEPT: f64 = 1.3596;
const HC_COEFFICIENT: f64 = 0.0064;
const AC_COEFFICIENT: f64 = 0.0424;
const FL_COEFFICIENT: f64 = 0.174;
const BPD_AC_COEFFICIENT: f64 = 0.00061;
const AC_FL_COEFFICIENT: f64 = 0.00386;

/// 估算体重 (g)
///
/// `exp(1.3596 + 0.0064·HC + 0.0424·AC + 0.174·FL + 0.00061·BPD·AC − 0.00386·AC·FL)`
pub fn estimate_weight(
    head_circumference: f64,
    abdominal_circumference: f64,
    femur_length: f64,
    biparietal_diameter: f64,
) -> f64 {
    let exponent = INTERCEPT
        + HC_COEFFICIENT * head_circumference
        + AC_COEFFICIENT * abdominal_circumference
        + FL_COEFFICIENT * femur_length
        + BPD_AC_COEFFICIENT * biparietal_diameter * abdominal_circumference
        - AC_FL_COEFFICIENT * abdominal_circumference * femur_length;
    exponent.exp()
}

/// 生物测量值 (cm)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Biometry {
    pub head_circumference_cm: f64,
    pub abdominal_circumference_cm: f64,
    pub femur_length_cm: f64,
    pub biparietal_diameter_cm: f64,
}

impl Biometry {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("head_circumference_cm", self.head_circumference_cm),
            ("abdominal_circumference_cm", self.abdominal_circumference_cm),
            ("femur_length_cm", self.femur_length_cm),
            ("biparietal_diameter_cm", self.biparietal_diameter_cm),
        ];

        let errors: Vec<String> = fields
            .iter()
            .filter(|(_, value)| !value.is_finite() || *value < 0.0)
            .map(|(name, value)| format!("{} 无效: {}", name, value))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FgrError::Validation(errors.join("; ")))
        }
    }

    pub fn estimate(&self) -> Result<EstimatedWeight> {
        self.validate()?;
        Ok(EstimatedWeight {
            grams: estimate_weight(
                self.head_circumference_cm,
                self.abdominal_circumference_cm,
                self.femur_length_cm,
                self.biparietal_diameter_cm,
            ),
        })
    }
}

/// 估算体重结果
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EstimatedWeight {
    pub grams: f64,
}

impl EstimatedWeight {
    pub const LABEL: &'static str = "Peso fetal estimado (Hadlock)";

    /// 一位小数，单位 g
    pub fn formatted(&self) -> String {
        format!("{} g", format_value(self.grams, 1))
    }
}
