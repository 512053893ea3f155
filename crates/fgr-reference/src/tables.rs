//! 百分位参考表
//!
//! 按孕周给出的各参数百分位值。各表的孕周范围不同，保持原始文献范围，不做补齐。

use fgr_core::{FgrError, Parameter, Percentile, Result};
use serde::{Deserialize, Serialize};

/// 估计胎儿体重 P3，14-41 周 (g)
const FETAL_WEIGHT_P3: [f64; 28] = [
    78.8, 99.2, 123.9, 153.7, 189.3, 231.3, 280.6, 337.8, 403.8, 479.0, 564.1, 659.5, 765.2,
    881.4, 1007.8, 1143.7, 1288.5, 1440.9, 1599.4, 1762.3, 1927.4, 2092.5, 2255.0, 2412.1,
    2561.2, 2699.3, 2823.8, 2932.2,
];

/// 估计胎儿体重 P10，14-41 周 (g)
const FETAL_WEIGHT_P10: [f64; 28] = [
    83.5, 105.0, 131.2, 162.6, 200.1, 244.4, 296.4, 356.8, 426.3, 505.7, 595.5, 696.2, 807.9,
    930.7, 1064.4, 1208.3, 1361.7, 1523.4, 1691.9, 1865.2, 2041.3, 2217.8, 2391.8, 2560.7,
    2721.4, 2871.1, 3006.8, 3125.9,
];

/// 腹围 P3，14-41 周 (cm)
const ABDOMINAL_CIRCUMFERENCE_P3: [f64; 28] = [
    5.1, 6.4, 7.7, 9.0, 10.3, 11.5, 12.8, 14.0, 15.2, 16.3, 17.5, 18.6, 19.7, 20.8, 21.8, 22.9,
    23.9, 24.9, 25.9, 26.9, 27.8, 28.7, 29.6, 30.5, 31.4, 32.2, 33.1, 33.8,
];

/// 腹围 P10，14-41 周 (cm)
const ABDOMINAL_CIRCUMFERENCE_P10: [f64; 28] = [
    5.6, 6.9, 8.2, 9.5, 10.8, 12.0, 13.3, 14.5, 15.7, 16.8, 18.0, 19.1, 20.2, 21.3, 22.3, 23.4,
    24.4, 25.4, 26.4, 27.4, 28.3, 29.2, 30.1, 31.0, 31.9, 32.7, 33.6, 34.1,
];

/// 子宫动脉平均搏动指数 P95，14-41 周
///
/// 按曲线形状转录的近似值，使用前需对照 Gómez et al. 2008, Ultrasound Obstet Gynecol 核对。
const UTERINE_PI_P95: [f64; 28] = [
    2.24, 2.11, 1.99, 1.88, 1.79, 1.70, 1.61, 1.54, 1.47, 1.41, 1.35, 1.30, 1.25, 1.21, 1.17,
    1.13, 1.10, 1.06, 1.04, 1.01, 0.99, 0.97, 0.95, 0.94, 0.92, 0.91, 0.90, 0.89,
];

/// 脐动脉搏动指数 P95，16-41 周
///
/// 按曲线形状转录的近似值，使用前需对照 Acharya et al. 2005, Am J Obstet Gynecol 核对。
const UMBILICAL_PI_P95: [f64; 26] = [
    1.90, 1.86, 1.82, 1.78, 1.74, 1.70, 1.66, 1.62, 1.58, 1.54, 1.50, 1.46, 1.42, 1.38, 1.34,
    1.31, 1.28, 1.25, 1.22, 1.19, 1.16, 1.13, 1.10, 1.08, 1.06, 1.04,
];

/// 脐动脉阻力指数 P95，20-41 周
///
/// 按曲线形状转录的近似值，使用前需对照 Acharya et al. 2005, Am J Obstet Gynecol 核对。
const UMBILICAL_ARTERY_INDEX_P95: [f64; 22] = [
    0.82, 0.81, 0.80, 0.80, 0.79, 0.78, 0.77, 0.77, 0.76, 0.75, 0.75, 0.74, 0.73, 0.73, 0.72,
    0.71, 0.71, 0.70, 0.69, 0.69, 0.68, 0.67,
];

/// 脑胎盘比 P5，20-41 周
///
/// 按曲线形状转录的近似值，使用前需对照 Ciobanu et al. 2019, Ultrasound Obstet Gynecol 核对。
const CEREBROPLACENTAL_RATIO_P5: [f64; 22] = [
    1.08, 1.15, 1.22, 1.29, 1.35, 1.41, 1.46, 1.50, 1.54, 1.57, 1.59, 1.60, 1.60, 1.59, 1.56,
    1.52, 1.47, 1.41, 1.35, 1.28, 1.21, 1.14,
];

/// 参考数据目录：(参数, 百分位, 起始孕周, 逐周数值)
const REFERENCE_DATA: [(Parameter, Percentile, u32, &[f64]); 8] = [
    (Parameter::FetalWeight, Percentile::P3, 14, &FETAL_WEIGHT_P3),
    (Parameter::FetalWeight, Percentile::P10, 14, &FETAL_WEIGHT_P10),
    (Parameter::AbdominalCircumference, Percentile::P3, 14, &ABDOMINAL_CIRCUMFERENCE_P3),
    (Parameter::AbdominalCircumference, Percentile::P10, 14, &ABDOMINAL_CIRCUMFERENCE_P10),
    (Parameter::UterinePi, Percentile::P95, 14, &UTERINE_PI_P95),
    (Parameter::UmbilicalPi, Percentile::P95, 16, &UMBILICAL_PI_P95),
    (Parameter::UmbilicalArteryIndex, Percentile::P95, 20, &UMBILICAL_ARTERY_INDEX_P95),
    (Parameter::CerebroplacentalRatio, Percentile::P5, 20, &CEREBROPLACENTAL_RATIO_P5),
];

/// 单个(参数, 百分位)的参考表
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PercentileTable {
    pub parameter: Parameter,
    pub percentile: Percentile,
    /// (孕周, 数值)，按孕周严格递增
    points: Vec<(f64, f64)>,
}

impl PercentileTable {
    /// 创建参考表并校验结构
    pub fn new(parameter: Parameter, percentile: Percentile, points: Vec<(f64, f64)>) -> Result<Self> {
        let table = Self {
            parameter,
            percentile,
            points,
        };
        table.validate()?;
        Ok(table)
    }

    /// 由逐周数值创建，`first_week` 为第一个数值对应的孕周
    pub fn from_weekly(
        parameter: Parameter,
        percentile: Percentile,
        first_week: u32,
        values: &[f64],
    ) -> Result<Self> {
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &value)| (f64::from(first_week) + i as f64, value))
            .collect();
        Self::new(parameter, percentile, points)
    }

    /// 校验：至少两个点，孕周非负、严格递增，数值有限
    pub fn validate(&self) -> Result<()> {
        let name = self.name();

        if self.points.len() < 2 {
            return Err(FgrError::Config(format!(
                "参考表 {} 至少需要两个点，实际为 {}",
                name,
                self.points.len()
            )));
        }

        for &(age, value) in &self.points {
            if !age.is_finite() || age < 0.0 {
                return Err(FgrError::Config(format!("参考表 {} 孕周无效: {}", name, age)));
            }
            if !value.is_finite() {
                return Err(FgrError::Config(format!(
                    "参考表 {} 在 {} 周的数值无效: {}",
                    name, age, value
                )));
            }
        }

        if let Some(pair) = self.points.windows(2).find(|pair| pair[0].0 >= pair[1].0) {
            return Err(FgrError::Config(format!(
                "参考表 {} 孕周未严格递增: {} 之后为 {}",
                name, pair[0].0, pair[1].0
            )));
        }

        Ok(())
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// 表的孕周范围 (首, 末)
    pub fn domain(&self) -> (f64, f64) {
        // validate() 保证至少两个点
        (self.points[0].0, self.points[self.points.len() - 1].0)
    }

    pub fn name(&self) -> String {
        format!("{:?}/{}", self.parameter, self.percentile)
    }
}

/// 构建全部内置参考表
pub fn reference_tables() -> Result<Vec<PercentileTable>> {
    REFERENCE_DATA
        .iter()
        .map(|&(parameter, percentile, first_week, values)| {
            PercentileTable::from_weekly(parameter, percentile, first_week, values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(parameter: Parameter, percentile: Percentile) -> PercentileTable {
        reference_tables()
            .unwrap()
            .into_iter()
            .find(|t| t.parameter == parameter && t.percentile == percentile)
            .unwrap()
    }

    #[test]
    fn test_builtin_tables_are_valid() {
        let tables = reference_tables().unwrap();
        assert_eq!(tables.len(), 8);
        for table in &tables {
            assert!(table.validate().is_ok(), "{}", table.name());
        }
    }

    #[test]
    fn test_native_domains_preserved() {
        assert_eq!(table(Parameter::FetalWeight, Percentile::P3).domain(), (14.0, 41.0));
        assert_eq!(table(Parameter::AbdominalCircumference, Percentile::P10).domain(), (14.0, 41.0));
        assert_eq!(table(Parameter::UmbilicalPi, Percentile::P95).domain(), (16.0, 41.0));
        assert_eq!(table(Parameter::UmbilicalArteryIndex, Percentile::P95).domain(), (20.0, 41.0));
        assert_eq!(table(Parameter::CerebroplacentalRatio, Percentile::P5).domain(), (20.0, 41.0));
    }

    #[test]
    fn test_weekly_points() {
        let weight = table(Parameter::FetalWeight, Percentile::P3);
        assert_eq!(weight.points()[0], (14.0, 78.8));
        assert_eq!(weight.points()[1], (15.0, 99.2));
        assert_eq!(weight.points()[27], (41.0, 2932.2));
    }

    #[test]
    fn test_too_few_points_rejected() {
        let err = PercentileTable::new(Parameter::FetalWeight, Percentile::P3, vec![(20.0, 1.0)])
            .unwrap_err();
        assert!(matches!(err, FgrError::Config(_)));
    }

    #[test]
    fn test_unsorted_ages_rejected() {
        let points = vec![(20.0, 1.0), (22.0, 2.0), (21.0, 3.0)];
        assert!(PercentileTable::new(Parameter::UterinePi, Percentile::P95, points).is_err());

        let duplicated = vec![(20.0, 1.0), (20.0, 2.0)];
        assert!(PercentileTable::new(Parameter::UterinePi, Percentile::P95, duplicated).is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let negative_age = vec![(-1.0, 1.0), (2.0, 2.0)];
        assert!(PercentileTable::new(Parameter::UmbilicalPi, Percentile::P95, negative_age).is_err());

        let nan_value = vec![(1.0, f64::NAN), (2.0, 2.0)];
        assert!(PercentileTable::new(Parameter::UmbilicalPi, Percentile::P95, nan_value).is_err());
    }
}
