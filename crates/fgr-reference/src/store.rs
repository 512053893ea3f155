//! 参考曲线集合
//!
//! 内置曲线在首次使用时构建一次，之后在整个进程内只读共享。

use crate::curve::ReferenceCurve;
use crate::tables::{reference_tables, PercentileTable};
use fgr_core::{FgrError, Parameter, Percentile, Result};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, info};

static STANDARD_CURVES: OnceLock<ReferenceCurveSet> = OnceLock::new();

/// 全部参数的参考曲线
#[derive(Debug, Clone)]
pub struct ReferenceCurveSet {
    curves: HashMap<(Parameter, Percentile), ReferenceCurve>,
}

impl ReferenceCurveSet {
    /// 由参考表构建曲线集合，同一(参数, 百分位)重复出现视为配置错误
    pub fn from_tables(tables: &[PercentileTable]) -> Result<Self> {
        let mut curves = HashMap::with_capacity(tables.len());

        for table in tables {
            let curve = ReferenceCurve::build(table)?;
            let (start, end) = curve.domain();
            debug!("Built reference curve {} over weeks {}-{}", table.name(), start, end);

            if curves.insert((table.parameter, table.percentile), curve).is_some() {
                return Err(FgrError::Config(format!("参考表重复: {}", table.name())));
            }
        }

        Ok(Self { curves })
    }

    /// 内置参考曲线，进程内只构建一次
    pub fn standard() -> Result<&'static Self> {
        if let Some(curves) = STANDARD_CURVES.get() {
            return Ok(curves);
        }

        let built = Self::from_tables(&reference_tables()?)?;
        info!("Reference curves initialized: {} curves", built.len());
        Ok(STANDARD_CURVES.get_or_init(|| built))
    }

    /// 获取曲线
    pub fn curve(&self, parameter: Parameter, percentile: Percentile) -> Result<&ReferenceCurve> {
        self.curves.get(&(parameter, percentile)).ok_or_else(|| {
            FgrError::Config(format!("缺少参考曲线: {:?}/{}", parameter, percentile))
        })
    }

    /// 指定孕周处的阈值
    pub fn threshold(&self, parameter: Parameter, percentile: Percentile, age: f64) -> Result<f64> {
        Ok(self.curve(parameter, percentile)?.evaluate(age))
    }

    /// 某一参数的全部曲线，按百分位升序
    pub fn curves_for(&self, parameter: Parameter) -> Vec<&ReferenceCurve> {
        let mut curves: Vec<&ReferenceCurve> = self
            .curves
            .values()
            .filter(|curve| curve.parameter() == parameter)
            .collect();
        curves.sort_by_key(|curve| curve.percentile());
        curves
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }
}
