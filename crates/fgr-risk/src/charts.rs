//! 图表数据
//!
//! 为每个参数生成参考曲线采样序列和患者标记点，只输出数据，不涉及绘制。

use fgr_core::utils::linspace;
use fgr_core::{FgrError, Parameter, PatientObservation, Percentile, Result};
use fgr_reference::ReferenceCurveSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 曲线采样区间
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartSampling {
    pub start_week: f64,
    pub end_week: f64,
    pub samples: usize,
}

impl Default for ChartSampling {
    fn default() -> Self {
        Self {
            start_week: 14.0,
            end_week: 41.0,
            samples: 500,
        }
    }
}

impl ChartSampling {
    pub fn validate(&self) -> Result<()> {
        if !self.start_week.is_finite() || !self.end_week.is_finite() || self.start_week < 0.0 {
            return Err(FgrError::Config(format!(
                "图表孕周区间无效: {}-{}",
                self.start_week, self.end_week
            )));
        }
        if self.start_week >= self.end_week {
            return Err(FgrError::Config(format!(
                "图表起始孕周 {} 必须小于结束孕周 {}",
                self.start_week, self.end_week
            )));
        }
        if self.samples < 2 {
            return Err(FgrError::Config(format!("图表采样点数至少为 2，实际为 {}", self.samples)));
        }
        Ok(())
    }

    pub fn grid(&self) -> Vec<f64> {
        linspace(self.start_week, self.end_week, self.samples)
    }
}

/// 患者标记点状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MarkerStatus {
    Normal,     // 正常
    Borderline, // 介于 P3 与 P10 之间
    Critical,   // 超出参考界限
}

impl MarkerStatus {
    pub fn color(&self) -> &'static str {
        match self {
            MarkerStatus::Normal => "green",
            MarkerStatus::Borderline => "orange",
            MarkerStatus::Critical => "red",
        }
    }
}

/// 参考曲线采样序列
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSeries {
    pub percentile: Percentile,
    pub label: String,
    pub ages: Vec<f64>,
    pub values: Vec<f64>,
}

/// 患者标记点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientMarker {
    pub label: String,
    pub age: f64,
    pub value: f64,
    /// 患者孕周处的参考阈值
    pub thresholds: Vec<(Percentile, f64)>,
    pub status: MarkerStatus,
}

/// 单个参数的图表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterChart {
    pub parameter: Parameter,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<ReferenceSeries>,
    pub marker: PatientMarker,
}

const X_LABEL: &str = "Idade Gestacional (semanas)";

fn chart_labels(parameter: Parameter) -> (&'static str, &'static str, &'static str) {
    match parameter {
        Parameter::FetalWeight => (
            "Evolução do Peso Fetal (g)",
            "Peso (gramas)",
            "Peso fetal informado",
        ),
        Parameter::AbdominalCircumference => (
            "Circunferência Abdominal (cm)",
            "Circunferência (cm)",
            "Circunferência informada",
        ),
        Parameter::UterinePi => (
            "Índice de Pulsatilidade Uterina",
            "IP Uterina",
            "IP Uterina informada",
        ),
        Parameter::UmbilicalPi => (
            "Índice de Pulsatilidade Umbilical",
            "IP Umbilical",
            "IP Umbilical informada",
        ),
        Parameter::UmbilicalArteryIndex => (
            "Índice de Resistência da Artéria Umbilical",
            "ART Umbilical",
            "ART Umbilical informada",
        ),
        Parameter::CerebroplacentalRatio => (
            "Índice Cérebro-Placentário (RCP)",
            "RCP",
            "RCP informado",
        ),
    }
}

fn series_label(parameter: Parameter, percentile: Percentile) -> String {
    let number = &percentile.label()[1..];
    if parameter.is_biometric() {
        format!("Percentil {}", number)
    } else {
        format!("Percentil {} (referência)", number)
    }
}

/// 标记点状态
///
/// 生物测量：低于 P3 为 Critical，低于 P10 为 Borderline；
/// 多普勒：高于 P95 或低于 P5 为 Critical。
pub fn marker_status(value: f64, thresholds: &[(Percentile, f64)]) -> MarkerStatus {
    let mut status = MarkerStatus::Normal;

    for &(percentile, threshold) in thresholds {
        let current = match percentile {
            Percentile::P3 | Percentile::P5 if value < threshold => MarkerStatus::Critical,
            Percentile::P10 if value < threshold => MarkerStatus::Borderline,
            Percentile::P95 if value > threshold => MarkerStatus::Critical,
            _ => MarkerStatus::Normal,
        };
        status = match (status, current) {
            (MarkerStatus::Critical, _) | (_, MarkerStatus::Critical) => MarkerStatus::Critical,
            (MarkerStatus::Borderline, _) | (_, MarkerStatus::Borderline) => {
                MarkerStatus::Borderline
            }
            _ => MarkerStatus::Normal,
        };
    }

    status
}

/// 生成单个参数的图表数据
pub fn build_chart(
    curves: &ReferenceCurveSet,
    observation: &PatientObservation,
    parameter: Parameter,
    sampling: &ChartSampling,
) -> Result<ParameterChart> {
    sampling.validate()?;

    let grid = sampling.grid();
    let age = observation.fractional_weeks();
    let (title, y_label, marker_label) = chart_labels(parameter);

    let mut series = Vec::new();
    let mut thresholds = Vec::new();
    for curve in curves.curves_for(parameter) {
        let percentile = curve.percentile();
        series.push(ReferenceSeries {
            percentile,
            label: series_label(parameter, percentile),
            ages: grid.clone(),
            values: curve.evaluate_many(&grid),
        });
        thresholds.push((percentile, curve.evaluate(age)));
    }

    if series.is_empty() {
        return Err(FgrError::Config(format!("参数 {:?} 没有参考曲线", parameter)));
    }

    let value = observation.value(parameter);
    let status = marker_status(value, &thresholds);
    debug!("Chart {:?}: marker {:.2} at {:.4} weeks is {:?}", parameter, value, age, status);

    Ok(ParameterChart {
        parameter,
        title: title.to_string(),
        x_label: X_LABEL.to_string(),
        y_label: y_label.to_string(),
        series,
        marker: PatientMarker {
            label: marker_label.to_string(),
            age,
            value,
            thresholds,
            status,
        },
    })
}

/// 生成全部参数的图表数据
pub fn build_charts(
    curves: &ReferenceCurveSet,
    observation: &PatientObservation,
    sampling: &ChartSampling,
) -> Result<Vec<ParameterChart>> {
    Parameter::ALL
        .iter()
        .map(|&parameter| build_chart(curves, observation, parameter, sampling))
        .collect()
}
