//! # FGR参考曲线模块
//!
//! 提供按孕周索引的百分位参考数据：
//! - 参考表：胎儿体重、腹围及多普勒指数的逐周百分位值
//! - 曲线插值：任意小数孕周的线性插值与外推
//! - 曲线集合：进程内只读共享的内置曲线

pub mod curve;
pub mod store;
pub mod tables;

pub use curve::ReferenceCurve;
pub use store::ReferenceCurveSet;
pub use tables::{reference_tables, PercentileTable};
