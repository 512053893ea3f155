//! 风险分级
//!
//! 在患者孕周处取参考阈值，按早期(<32周)/晚期(>=32周)两套规则判定风险：
//! 先判重度条件，命中即返回；否则要求生长落后与多普勒异常同时成立才判为中度。

use fgr_core::{
    AgeBand, ObservationInput, Parameter, PatientObservation, Percentile, Result, RiskCriterion,
    RiskLevel, RiskRules, RiskVerdict, Thresholds,
};
use fgr_reference::ReferenceCurveSet;
use tracing::{debug, info, warn};

/// 风险分级器
#[derive(Debug, Clone)]
pub struct RiskClassifier<'a> {
    curves: &'a ReferenceCurveSet,
    rules: RiskRules,
}

impl RiskClassifier<'static> {
    /// 使用内置参考曲线创建分级器
    pub fn standard(rules: RiskRules) -> Result<Self> {
        Self::new(ReferenceCurveSet::standard()?, rules)
    }
}

impl<'a> RiskClassifier<'a> {
    pub fn new(curves: &'a ReferenceCurveSet, rules: RiskRules) -> Result<Self> {
        rules.validate()?;
        Ok(Self { curves, rules })
    }

    pub fn rules(&self) -> &RiskRules {
        &self.rules
    }

    pub fn curves(&self) -> &'a ReferenceCurveSet {
        self.curves
    }

    /// 从表单输入直接分级，缺失字段时拒绝
    pub fn classify_input(&self, input: &ObservationInput) -> Result<RiskVerdict> {
        let observation = PatientObservation::from_input(input, &self.rules)?;
        self.classify(&observation)
    }

    /// 对单次观测分级
    pub fn classify(&self, observation: &PatientObservation) -> Result<RiskVerdict> {
        observation.validate(&self.rules)?;

        let age = observation.fractional_weeks();
        let band = AgeBand::for_age(age);
        let thresholds = self.thresholds_at(age)?;
        self.warn_if_extrapolated(age, band)?;

        debug!(
            "Classifying observation at {} ({:.4} weeks, {:?} band)",
            observation.gestational_age, age, band
        );

        let severe = self.severe_criteria(observation, band, &thresholds);
        let (level, criteria) = if !severe.is_empty() {
            (RiskLevel::High, severe)
        } else {
            let moderate = self.moderate_criteria(observation, band, &thresholds);
            if moderate.is_empty() {
                (RiskLevel::Low, moderate)
            } else {
                (RiskLevel::Moderate, moderate)
            }
        };

        match level {
            RiskLevel::High => warn!(
                "High FGR risk at {}: {:?}",
                observation.gestational_age, criteria
            ),
            _ => info!(
                "FGR risk {} at {}: {:?}",
                level, observation.gestational_age, criteria
            ),
        }

        Ok(RiskVerdict {
            level,
            gestational_age: observation.gestational_age,
            fractional_weeks: age,
            band,
            criteria,
            thresholds,
        })
    }

    /// 在指定孕周处取全部参考阈值
    pub fn thresholds_at(&self, age: f64) -> Result<Thresholds> {
        let at = |parameter, percentile| self.curves.threshold(parameter, percentile, age);

        Ok(Thresholds {
            weight_p3: at(Parameter::FetalWeight, Percentile::P3)?,
            weight_p10: at(Parameter::FetalWeight, Percentile::P10)?,
            circumference_p3: at(Parameter::AbdominalCircumference, Percentile::P3)?,
            circumference_p10: at(Parameter::AbdominalCircumference, Percentile::P10)?,
            uterine_pi_p95: at(Parameter::UterinePi, Percentile::P95)?,
            umbilical_pi_p95: at(Parameter::UmbilicalPi, Percentile::P95)?,
            artery_index_p95: at(Parameter::UmbilicalArteryIndex, Percentile::P95)?,
            cerebroplacental_ratio_p5: at(Parameter::CerebroplacentalRatio, Percentile::P5)?,
        })
    }

    /// 重度条件：低于 P3，或早期分段出现舒张期血流消失
    fn severe_criteria(
        &self,
        observation: &PatientObservation,
        band: AgeBand,
        thresholds: &Thresholds,
    ) -> Vec<RiskCriterion> {
        let mut criteria = Vec::new();

        if observation.fetal_weight_g < thresholds.weight_p3 {
            criteria.push(RiskCriterion::WeightBelowP3);
        }
        if observation.abdominal_circumference_cm < thresholds.circumference_p3 {
            criteria.push(RiskCriterion::CircumferenceBelowP3);
        }

        let diastole_counts = match band {
            AgeBand::Early => true,
            AgeBand::Late => self.rules.late_band_diastole_zero,
        };
        if diastole_counts && observation.diastole_zero {
            criteria.push(RiskCriterion::DiastoleZero);
        }

        criteria
    }

    /// 中度条件：生长落后(低于 P10) 且 分段对应的多普勒异常
    fn moderate_criteria(
        &self,
        observation: &PatientObservation,
        band: AgeBand,
        thresholds: &Thresholds,
    ) -> Vec<RiskCriterion> {
        let mut growth = Vec::new();
        if observation.fetal_weight_g < thresholds.weight_p10 {
            growth.push(RiskCriterion::WeightBelowP10);
        }
        if observation.abdominal_circumference_cm < thresholds.circumference_p10 {
            growth.push(RiskCriterion::CircumferenceBelowP10);
        }

        let mut doppler = Vec::new();
        match band {
            AgeBand::Early => {
                if observation.uterine_pi > thresholds.uterine_pi_p95 {
                    doppler.push(RiskCriterion::UterinePiAboveP95);
                }
                if observation.umbilical_pi > thresholds.umbilical_pi_p95 {
                    doppler.push(RiskCriterion::UmbilicalPiAboveP95);
                }
            }
            AgeBand::Late => {
                if observation.umbilical_artery_index > thresholds.artery_index_p95 {
                    doppler.push(RiskCriterion::ArteryIndexAboveP95);
                }
                if observation.cerebroplacental_ratio < thresholds.cerebroplacental_ratio_p5 {
                    doppler.push(RiskCriterion::CerebroplacentalRatioBelowP5);
                }
            }
        }

        if growth.is_empty() || doppler.is_empty() {
            return Vec::new();
        }
        growth.extend(doppler);
        growth
    }

    /// 孕周超出参考表范围时记录外推
    fn warn_if_extrapolated(&self, age: f64, band: AgeBand) -> Result<()> {
        let doppler = match band {
            AgeBand::Early => [
                (Parameter::UterinePi, Percentile::P95),
                (Parameter::UmbilicalPi, Percentile::P95),
            ],
            AgeBand::Late => [
                (Parameter::UmbilicalArteryIndex, Percentile::P95),
                (Parameter::CerebroplacentalRatio, Percentile::P5),
            ],
        };
        let biometric = [
            (Parameter::FetalWeight, Percentile::P3),
            (Parameter::FetalWeight, Percentile::P10),
            (Parameter::AbdominalCircumference, Percentile::P3),
            (Parameter::AbdominalCircumference, Percentile::P10),
        ];

        for (parameter, percentile) in biometric.into_iter().chain(doppler) {
            let curve = self.curves.curve(parameter, percentile)?;
            if !curve.is_within_domain(age) {
                let (start, end) = curve.domain();
                warn!(
                    "Age {:.2} weeks outside {:?}/{} table ({}-{}), using linear extrapolation",
                    age, parameter, percentile, start, end
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgr_core::GestationalAge;

    fn normal_late(weeks: u32) -> PatientObservation {
        PatientObservation {
            gestational_age: GestationalAge { weeks, days: 0 },
            fetal_weight_g: 2600.0,
            abdominal_circumference_cm: 32.0,
            uterine_pi: 0.8,
            umbilical_pi: 0.9,
            umbilical_artery_index: 0.60,
            cerebroplacental_ratio: 2.0,
            diastole_zero: false,
        }
    }

    #[test]
    fn test_thresholds_at_knot() {
        let classifier = RiskClassifier::standard(RiskRules::default()).unwrap();
        let thresholds = classifier.thresholds_at(28.0).unwrap();

        assert_eq!(thresholds.weight_p3, 1007.8);
        assert_eq!(thresholds.weight_p10, 1064.4);
        assert_eq!(thresholds.circumference_p3, 21.8);
        assert_eq!(thresholds.circumference_p10, 22.3);
        assert_eq!(thresholds.uterine_pi_p95, 1.17);
        assert_eq!(thresholds.umbilical_pi_p95, 1.42);
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let rules = RiskRules {
            max_gestational_days: 3,
            ..RiskRules::default()
        };
        assert!(RiskClassifier::standard(rules).is_err());
    }

    #[test]
    fn test_late_band_diastole_zero_switch() {
        let mut observation = normal_late(35);
        observation.diastole_zero = true;

        let default = RiskClassifier::standard(RiskRules::default()).unwrap();
        assert_eq!(default.classify(&observation).unwrap().level, RiskLevel::Low);

        let strict = RiskClassifier::standard(RiskRules {
            late_band_diastole_zero: true,
            ..RiskRules::default()
        })
        .unwrap();
        let verdict = strict.classify(&observation).unwrap();
        assert_eq!(verdict.level, RiskLevel::High);
        assert_eq!(verdict.criteria, vec![RiskCriterion::DiastoleZero]);
    }

    #[test]
    fn test_late_band_moderate_via_cerebroplacental_ratio() {
        let classifier = RiskClassifier::standard(RiskRules::default()).unwrap();
        let mut observation = normal_late(35);
        // P3 = 2092.5, P10 = 2217.8
        observation.fetal_weight_g = 2150.0;
        observation.cerebroplacental_ratio = 1.0;

        let verdict = classifier.classify(&observation).unwrap();
        assert_eq!(verdict.level, RiskLevel::Moderate);
        assert_eq!(
            verdict.criteria,
            vec![
                RiskCriterion::WeightBelowP10,
                RiskCriterion::CerebroplacentalRatioBelowP5
            ]
        );
    }

    #[test]
    fn test_late_band_ignores_early_doppler() {
        let classifier = RiskClassifier::standard(RiskRules::default()).unwrap();
        let mut observation = normal_late(35);
        observation.fetal_weight_g = 2150.0;
        observation.uterine_pi = 3.0;
        observation.umbilical_pi = 3.0;

        assert_eq!(classifier.classify(&observation).unwrap().level, RiskLevel::Low);
    }

    #[test]
    fn test_invalid_observation_fails_fast() {
        let classifier = RiskClassifier::standard(RiskRules::default()).unwrap();
        let mut observation = normal_late(35);
        observation.fetal_weight_g = -1.0;

        assert!(classifier.classify(&observation).is_err());
    }
}
