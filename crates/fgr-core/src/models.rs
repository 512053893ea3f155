//! 核心数据模型定义

use crate::error::{FgrError, Result};
use crate::utils::normalize_gestational_age;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// 临床参数
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    FetalWeight,            // 胎儿体重 (g)
    AbdominalCircumference, // 腹围 (cm)
    UterinePi,              // 子宫动脉搏动指数
    UmbilicalPi,            // 脐动脉搏动指数
    UmbilicalArteryIndex,   // 脐动脉阻力指数
    CerebroplacentalRatio,  // 脑胎盘比
}

impl Parameter {
    /// 所有参数，按报告顺序排列
    pub const ALL: [Parameter; 6] = [
        Parameter::FetalWeight,
        Parameter::AbdominalCircumference,
        Parameter::UterinePi,
        Parameter::UmbilicalPi,
        Parameter::UmbilicalArteryIndex,
        Parameter::CerebroplacentalRatio,
    ];

    /// 报告中显示的参数名称
    pub fn label(&self) -> &'static str {
        match self {
            Parameter::FetalWeight => "Peso fetal (g)",
            Parameter::AbdominalCircumference => "Circunferência abdominal (cm)",
            Parameter::UterinePi => "IP Uterina",
            Parameter::UmbilicalPi => "IP Umbilical",
            Parameter::UmbilicalArteryIndex => "ART Umbilical",
            Parameter::CerebroplacentalRatio => "RCP",
        }
    }

    /// 显示精度：体重和腹围保留一位小数，多普勒指数保留两位
    pub fn decimals(&self) -> usize {
        match self {
            Parameter::FetalWeight | Parameter::AbdominalCircumference => 1,
            _ => 2,
        }
    }

    /// 是否为生物测量参数（其余为多普勒参数）
    pub fn is_biometric(&self) -> bool {
        matches!(self, Parameter::FetalWeight | Parameter::AbdominalCircumference)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 百分位
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Percentile {
    P3,
    P5,
    P10,
    P95,
}

impl Percentile {
    pub fn label(&self) -> &'static str {
        match self {
            Percentile::P3 => "P3",
            Percentile::P5 => "P5",
            Percentile::P10 => "P10",
            Percentile::P95 => "P95",
        }
    }
}

impl fmt::Display for Percentile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 孕周（完整周数 + 余下天数）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GestationalAge {
    pub weeks: u32,
    pub days: u32,
}

impl GestationalAge {
    /// 允许的最大孕周
    pub const MAX_WEEKS: u32 = 42;

    /// 创建孕周，`max_days` 为允许的最大天数
    pub fn new(weeks: u32, days: u32, max_days: u32) -> Result<Self> {
        if weeks > Self::MAX_WEEKS {
            return Err(FgrError::Validation(format!(
                "孕周 {} 超出范围 [0, {}]",
                weeks,
                Self::MAX_WEEKS
            )));
        }
        if days > max_days {
            return Err(FgrError::Validation(format!(
                "孕天 {} 超出范围 [0, {}]",
                days, max_days
            )));
        }
        Ok(Self { weeks, days })
    }

    /// 小数周
    pub fn fractional_weeks(&self) -> f64 {
        normalize_gestational_age(self.weeks, self.days)
    }

    pub fn band(&self) -> AgeBand {
        AgeBand::for_age(self.fractional_weeks())
    }
}

impl fmt::Display for GestationalAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.weeks, self.days)
    }
}

/// 孕周分段
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgeBand {
    Early, // < 32 周
    Late,  // >= 32 周
}

impl AgeBand {
    /// 晚期分段起点（包含）
    pub const LATE_ONSET_WEEKS: f64 = 32.0;

    pub fn for_age(fractional_weeks: f64) -> Self {
        if fractional_weeks < Self::LATE_ONSET_WEEKS {
            AgeBand::Early
        } else {
            AgeBand::Late
        }
    }
}

/// 分类规则开关
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RiskRules {
    /// 孕天上限，6 或 7
    pub max_gestational_days: u32,
    /// 晚期分段是否将舒张期血流消失计入重度风险
    pub late_band_diastole_zero: bool,
}

impl Default for RiskRules {
    fn default() -> Self {
        Self {
            max_gestational_days: 6,
            late_band_diastole_zero: false,
        }
    }
}

impl RiskRules {
    pub fn validate(&self) -> Result<()> {
        if !(6..=7).contains(&self.max_gestational_days) {
            return Err(FgrError::Config(format!(
                "max_gestational_days 必须为 6 或 7，实际为 {}",
                self.max_gestational_days
            )));
        }
        Ok(())
    }
}

/// 表单层提交的原始输入，字段可能缺失
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservationInput {
    pub gestational_age_weeks: Option<u32>,
    pub gestational_age_days: Option<u32>,
    pub fetal_weight_g: Option<f64>,
    pub abdominal_circumference_cm: Option<f64>,
    pub uterine_pi: Option<f64>,
    pub umbilical_pi: Option<f64>,
    pub umbilical_artery_index: Option<f64>,
    pub cerebroplacental_ratio: Option<f64>,
    #[serde(default)]
    pub diastole_zero: bool,
}

/// 单次评估的患者测量值
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientObservation {
    pub gestational_age: GestationalAge,
    pub fetal_weight_g: f64,
    pub abdominal_circumference_cm: f64,
    pub uterine_pi: f64,
    pub umbilical_pi: f64,
    pub umbilical_artery_index: f64,
    pub cerebroplacental_ratio: f64,
    /// 脐动脉舒张期血流消失
    pub diastole_zero: bool,
}

impl PatientObservation {
    /// 从表单输入构造，缺失字段直接拒绝，不做默认填充
    pub fn from_input(input: &ObservationInput, rules: &RiskRules) -> Result<Self> {
        fn required<T: Copy>(value: Option<T>, name: &'static str) -> Result<T> {
            value.ok_or(FgrError::MissingField(name))
        }

        let weeks = required(input.gestational_age_weeks, "gestational_age_weeks")?;
        let days = required(input.gestational_age_days, "gestational_age_days")?;

        let observation = Self {
            gestational_age: GestationalAge::new(weeks, days, rules.max_gestational_days)?,
            fetal_weight_g: required(input.fetal_weight_g, "fetal_weight_g")?,
            abdominal_circumference_cm: required(
                input.abdominal_circumference_cm,
                "abdominal_circumference_cm",
            )?,
            uterine_pi: required(input.uterine_pi, "uterine_pi")?,
            umbilical_pi: required(input.umbilical_pi, "umbilical_pi")?,
            umbilical_artery_index: required(
                input.umbilical_artery_index,
                "umbilical_artery_index",
            )?,
            cerebroplacental_ratio: required(
                input.cerebroplacental_ratio,
                "cerebroplacental_ratio",
            )?,
            diastole_zero: input.diastole_zero,
        };

        observation.validate(rules)?;
        Ok(observation)
    }

    /// 校验测量值的基本数值范围
    pub fn validate(&self, rules: &RiskRules) -> Result<()> {
        let mut errors = Vec::new();

        let age = &self.gestational_age;
        if age.weeks > GestationalAge::MAX_WEEKS {
            errors.push(format!(
                "孕周 {} 超出范围 [0, {}]",
                age.weeks,
                GestationalAge::MAX_WEEKS
            ));
        }
        if age.days > rules.max_gestational_days {
            errors.push(format!(
                "孕天 {} 超出范围 [0, {}]",
                age.days, rules.max_gestational_days
            ));
        }

        for parameter in Parameter::ALL {
            let value = self.value(parameter);
            if !value.is_finite() {
                errors.push(format!("{} 不是有效数值: {}", parameter, value));
            } else if value < 0.0 {
                errors.push(format!("{} 不能为负数: {}", parameter, value));
            }
        }

        if errors.is_empty() {
            debug!("Observation at {} passed validation", age);
            Ok(())
        } else {
            Err(FgrError::Validation(errors.join("; ")))
        }
    }

    /// 取某一参数的测量值
    pub fn value(&self, parameter: Parameter) -> f64 {
        match parameter {
            Parameter::FetalWeight => self.fetal_weight_g,
            Parameter::AbdominalCircumference => self.abdominal_circumference_cm,
            Parameter::UterinePi => self.uterine_pi,
            Parameter::UmbilicalPi => self.umbilical_pi,
            Parameter::UmbilicalArteryIndex => self.umbilical_artery_index,
            Parameter::CerebroplacentalRatio => self.cerebroplacental_ratio,
        }
    }

    pub fn fractional_weeks(&self) -> f64 {
        self.gestational_age.fractional_weeks()
    }
}

/// 风险等级
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,      // 在预期范围内
    Moderate, // 中度
    High,     // 重度
}

impl RiskLevel {
    /// 面向用户的结论
    pub fn message(&self) -> &'static str {
        match self {
            RiskLevel::High => "Risco Alto: Recomendado acompanhamento médico especializado.",
            RiskLevel::Moderate => {
                "Risco Moderado: Atenção aos parâmetros, converse com seu médico."
            }
            RiskLevel::Low => {
                "Risco Baixo: Parâmetros dentro da faixa esperada para a idade gestacional."
            }
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Moderate => write!(f, "MODERATE"),
            RiskLevel::High => write!(f, "HIGH"),
        }
    }
}

/// 触发风险判定的单项条件
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskCriterion {
    WeightBelowP3,
    CircumferenceBelowP3,
    DiastoleZero,
    WeightBelowP10,
    CircumferenceBelowP10,
    UterinePiAboveP95,
    UmbilicalPiAboveP95,
    ArteryIndexAboveP95,
    CerebroplacentalRatioBelowP5,
}

impl RiskCriterion {
    pub fn description(&self) -> &'static str {
        match self {
            RiskCriterion::WeightBelowP3 => "Peso fetal abaixo do percentil 3",
            RiskCriterion::CircumferenceBelowP3 => "Circunferência abdominal abaixo do percentil 3",
            RiskCriterion::DiastoleZero => "Diástole zero na artéria umbilical",
            RiskCriterion::WeightBelowP10 => "Peso fetal abaixo do percentil 10",
            RiskCriterion::CircumferenceBelowP10 => {
                "Circunferência abdominal abaixo do percentil 10"
            }
            RiskCriterion::UterinePiAboveP95 => "IP uterina acima do percentil 95",
            RiskCriterion::UmbilicalPiAboveP95 => "IP umbilical acima do percentil 95",
            RiskCriterion::ArteryIndexAboveP95 => "ART umbilical acima do percentil 95",
            RiskCriterion::CerebroplacentalRatioBelowP5 => "RCP abaixo do percentil 5",
        }
    }
}

/// 患者孕周处的参考阈值
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Thresholds {
    pub weight_p3: f64,
    pub weight_p10: f64,
    pub circumference_p3: f64,
    pub circumference_p10: f64,
    pub uterine_pi_p95: f64,
    pub umbilical_pi_p95: f64,
    pub artery_index_p95: f64,
    pub cerebroplacental_ratio_p5: f64,
}

impl Thresholds {
    /// 某一参数对应的阈值，按百分位升序
    pub fn for_parameter(&self, parameter: Parameter) -> Vec<(Percentile, f64)> {
        match parameter {
            Parameter::FetalWeight => vec![
                (Percentile::P3, self.weight_p3),
                (Percentile::P10, self.weight_p10),
            ],
            Parameter::AbdominalCircumference => vec![
                (Percentile::P3, self.circumference_p3),
                (Percentile::P10, self.circumference_p10),
            ],
            Parameter::UterinePi => vec![(Percentile::P95, self.uterine_pi_p95)],
            Parameter::UmbilicalPi => vec![(Percentile::P95, self.umbilical_pi_p95)],
            Parameter::UmbilicalArteryIndex => vec![(Percentile::P95, self.artery_index_p95)],
            Parameter::CerebroplacentalRatio => {
                vec![(Percentile::P5, self.cerebroplacental_ratio_p5)]
            }
        }
    }
}

/// 风险评估结论
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskVerdict {
    pub level: RiskLevel,
    pub gestational_age: GestationalAge,
    pub fractional_weeks: f64,
    pub band: AgeBand,
    /// 触发的条件，未触发任何条件时为空
    pub criteria: Vec<RiskCriterion>,
    pub thresholds: Thresholds,
}

impl RiskVerdict {
    pub fn is_at_risk(&self) -> bool {
        self.level != RiskLevel::Low
    }

    pub fn message(&self) -> &'static str {
        self.level.message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_input() -> ObservationInput {
        ObservationInput {
            gestational_age_weeks: Some(28),
            gestational_age_days: Some(3),
            fetal_weight_g: Some(1200.0),
            abdominal_circumference_cm: Some(24.0),
            uterine_pi: Some(0.9),
            umbilical_pi: Some(1.0),
            umbilical_artery_index: Some(0.6),
            cerebroplacental_ratio: Some(1.8),
            diastole_zero: false,
        }
    }

    #[test]
    fn test_age_band_boundary() {
        assert_eq!(AgeBand::for_age(31.999), AgeBand::Early);
        assert_eq!(AgeBand::for_age(32.0), AgeBand::Late);
        assert_eq!(AgeBand::for_age(0.0), AgeBand::Early);
    }

    #[test]
    fn test_gestational_age_range() {
        assert!(GestationalAge::new(42, 6, 6).is_ok());
        assert!(GestationalAge::new(43, 0, 6).is_err());
        assert!(GestationalAge::new(30, 7, 6).is_err());
        assert!(GestationalAge::new(30, 7, 7).is_ok());
        assert_eq!(GestationalAge::new(28, 3, 6).unwrap().to_string(), "28+3");
    }

    #[test]
    fn test_observation_from_complete_input() {
        let observation =
            PatientObservation::from_input(&complete_input(), &RiskRules::default()).unwrap();
        assert_eq!(observation.gestational_age, GestationalAge { weeks: 28, days: 3 });
        assert_eq!(observation.value(Parameter::FetalWeight), 1200.0);
        assert_eq!(observation.value(Parameter::CerebroplacentalRatio), 1.8);
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let mut input = complete_input();
        input.umbilical_pi = None;

        let err = PatientObservation::from_input(&input, &RiskRules::default()).unwrap_err();
        assert!(matches!(err, FgrError::MissingField("umbilical_pi")));
    }

    #[test]
    fn test_negative_measurement_is_rejected() {
        let mut input = complete_input();
        input.fetal_weight_g = Some(-10.0);

        let err = PatientObservation::from_input(&input, &RiskRules::default()).unwrap_err();
        assert!(matches!(err, FgrError::Validation(_)));
    }

    #[test]
    fn test_non_finite_measurement_is_rejected() {
        let mut input = complete_input();
        input.cerebroplacental_ratio = Some(f64::NAN);

        assert!(PatientObservation::from_input(&input, &RiskRules::default()).is_err());
    }

    #[test]
    fn test_day_bound_follows_rules() {
        let mut input = complete_input();
        input.gestational_age_days = Some(7);

        assert!(PatientObservation::from_input(&input, &RiskRules::default()).is_err());

        let lenient = RiskRules {
            max_gestational_days: 7,
            ..RiskRules::default()
        };
        assert!(PatientObservation::from_input(&input, &lenient).is_ok());
    }

    #[test]
    fn test_risk_rules_validation() {
        assert!(RiskRules::default().validate().is_ok());
        let invalid = RiskRules {
            max_gestational_days: 9,
            ..RiskRules::default()
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::High > RiskLevel::Moderate);
        assert!(RiskLevel::Moderate > RiskLevel::Low);
        assert!(RiskLevel::Low.message().starts_with("Risco Baixo"));
    }
}
