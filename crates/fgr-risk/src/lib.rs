//! # FGR风险评估模块
//!
//! 提供胎儿生长受限风险评估功能，包括：
//! - 风险分级：按孕周分段规则对照百分位阈值判定风险
//! - 体重估算：Hadlock 回归公式
//! - 图表数据：参考曲线采样和患者标记点
//! - 评估报告：表格行及 CSV / JSON / 文本导出

pub mod charts;
pub mod classifier;
pub mod estimator;
pub mod report;

// 重新导出主要类型
pub use charts::{
    build_chart, build_charts, ChartSampling, MarkerStatus, ParameterChart, PatientMarker,
    ReferenceSeries,
};
pub use classifier::RiskClassifier;
pub use estimator::{estimate_weight, Biometry, EstimatedWeight};
pub use report::{ExportFormat, Report, ReportRow};
