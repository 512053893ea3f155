//! 参考曲线插值
//!
//! 由离散百分位表构建分段线性函数。表范围之外按最近一段的斜率线性外推，不截断。

use crate::tables::PercentileTable;
use fgr_core::{Parameter, Percentile, Result};

/// 连续参考曲线
#[derive(Debug, Clone)]
pub struct ReferenceCurve {
    parameter: Parameter,
    percentile: Percentile,
    ages: Vec<f64>,
    values: Vec<f64>,
}

impl ReferenceCurve {
    /// 由参考表构建曲线
    pub fn build(table: &PercentileTable) -> Result<Self> {
        table.validate()?;

        let (ages, values): (Vec<f64>, Vec<f64>) = table.points().iter().copied().unzip();

        Ok(Self {
            parameter: table.parameter,
            percentile: table.percentile,
            ages,
            values,
        })
    }

    pub fn parameter(&self) -> Parameter {
        self.parameter
    }

    pub fn percentile(&self) -> Percentile {
        self.percentile
    }

    /// 在指定孕周（小数周）取值
    ///
    /// 节点之间线性插值，首末节点之外沿首段/末段斜率外推。`NaN` 输入返回 `NaN`。
    pub fn evaluate(&self, age: f64) -> f64 {
        let last = self.ages.len() - 1;
        // 第一个大于 age 的节点位置，映射到所在线段 [i, i + 1]
        let upper = self.ages.partition_point(|&knot| knot <= age);
        let i = upper.clamp(1, last) - 1;

        let (x0, x1) = (self.ages[i], self.ages[i + 1]);
        let (y0, y1) = (self.values[i], self.values[i + 1]);
        y0 + (y1 - y0) * (age - x0) / (x1 - x0)
    }

    /// 逐元素取值，用于图表采样
    pub fn evaluate_many(&self, ages: &[f64]) -> Vec<f64> {
        ages.iter().map(|&age| self.evaluate(age)).collect()
    }

    /// 曲线节点 (孕周, 数值)
    pub fn knots(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.ages.iter().copied().zip(self.values.iter().copied())
    }

    /// 原始表的孕周范围
    pub fn domain(&self) -> (f64, f64) {
        (self.ages[0], self.ages[self.ages.len() - 1])
    }

    /// 是否落在原始表范围内（超出则为外推值）
    pub fn is_within_domain(&self, age: f64) -> bool {
        let (start, end) = self.domain();
        (start..=end).contains(&age)
    }
}
