//! FGR风险评估命令行程序

use anyhow::{Context, Result};
use clap::Parser;
use fgr_admin::{init_logging, ConfigManager};
use fgr_core::{FgrError, ObservationInput, PatientObservation};
use fgr_risk::{
    build_charts, Biometry, ChartSampling, EstimatedWeight, ExportFormat, Report, RiskClassifier,
};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// FGR命令行参数
#[derive(Parser, Debug)]
#[command(name = "fgr")]
#[command(about = "Avaliação de risco de restrição de crescimento fetal")]
struct Args {
    /// 孕周（完整周数）
    #[arg(long)]
    weeks: Option<u32>,

    /// 孕天
    #[arg(long)]
    days: Option<u32>,

    /// 胎儿体重 (g)
    #[arg(long)]
    weight: Option<f64>,

    /// 腹围 (cm)
    #[arg(long = "abdominal-circumference")]
    abdominal_circumference: Option<f64>,

    /// 子宫动脉搏动指数
    #[arg(long = "uterine-pi")]
    uterine_pi: Option<f64>,

    /// 脐动脉搏动指数
    #[arg(long = "umbilical-pi")]
    umbilical_pi: Option<f64>,

    /// 脐动脉阻力指数
    #[arg(long = "artery-index")]
    artery_index: Option<f64>,

    /// 脑胎盘比
    #[arg(long)]
    cpr: Option<f64>,

    /// 脐动脉舒张期血流消失
    #[arg(long = "diastole-zero")]
    diastole_zero: bool,

    /// 头围 (cm)，用于体重估算
    #[arg(long = "head-circumference")]
    head_circumference: Option<f64>,

    /// 股骨长 (cm)，用于体重估算
    #[arg(long = "femur-length")]
    femur_length: Option<f64>,

    /// 双顶径 (cm)，用于体重估算
    #[arg(long = "biparietal-diameter")]
    biparietal_diameter: Option<f64>,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别
    #[arg(short, long)]
    log_level: Option<String>,

    /// 报告格式: text / csv / json
    #[arg(short, long)]
    format: Option<ExportFormat>,

    /// 报告输出文件，缺省写到标准输出
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 图表数据输出文件 (JSON)
    #[arg(long)]
    charts: Option<PathBuf>,
}

impl Args {
    fn observation_input(&self) -> ObservationInput {
        ObservationInput {
            gestational_age_weeks: self.weeks,
            gestational_age_days: self.days,
            fetal_weight_g: self.weight,
            abdominal_circumference_cm: self.abdominal_circumference,
            uterine_pi: self.uterine_pi,
            umbilical_pi: self.umbilical_pi,
            umbilical_artery_index: self.artery_index,
            cerebroplacental_ratio: self.cpr,
            diastole_zero: self.diastole_zero,
        }
    }

    /// 头围、股骨长、双顶径齐全时才估算体重
    fn biometry(&self, abdominal_circumference_cm: f64) -> Option<Biometry> {
        match (self.head_circumference, self.femur_length, self.biparietal_diameter) {
            (Some(head_circumference_cm), Some(femur_length_cm), Some(biparietal_diameter_cm)) => {
                Some(Biometry {
                    head_circumference_cm,
                    abdominal_circumference_cm,
                    femur_length_cm,
                    biparietal_diameter_cm,
                })
            }
            (None, None, None) => None,
            _ => {
                warn!("Incomplete biometry (HC, FL and BPD are all required), skipping weight estimate");
                None
            }
        }
    }
}

/// 待写出的报告与图表内容
#[derive(Debug)]
struct Outputs {
    report: String,
    charts: Option<String>,
}

/// 渲染报告，并在请求时生成图表 JSON
fn render_outputs(
    args: &Args,
    classifier: &RiskClassifier<'_>,
    observation: &PatientObservation,
    report: &Report,
    format: ExportFormat,
    sampling: &ChartSampling,
) -> Result<Outputs> {
    let charts = match &args.charts {
        Some(_) => {
            let charts = build_charts(classifier.curves(), observation, sampling)?;
            debug!("Built {} charts", charts.len());
            Some(serde_json::to_string_pretty(&charts)?)
        }
        None => None,
    };

    Ok(Outputs {
        report: report.export(format)?,
        charts,
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_manager = ConfigManager::new(args.config.as_deref())?;
    let config = config_manager.config();

    // 初始化日志
    init_logging(&config.logging, args.log_level.as_deref())?;

    info!("FGR risk assessment starting");

    let classifier = RiskClassifier::standard(config.rules.clone())?;

    let input = args.observation_input();
    let observation = match PatientObservation::from_input(&input, classifier.rules()) {
        Ok(observation) => observation,
        Err(FgrError::MissingField(field)) => {
            error!("Missing required measurement: {}", field);
            anyhow::bail!(
                "Não é possível classificar: medida obrigatória ausente ({})",
                field
            );
        }
        Err(e) => return Err(e).context("Dados do paciente inválidos"),
    };

    let verdict = classifier.classify(&observation)?;

    let estimated_weight: Option<EstimatedWeight> = args
        .biometry(observation.abdominal_circumference_cm)
        .map(|biometry| biometry.estimate())
        .transpose()?;

    let report = Report::build(&observation, &verdict, estimated_weight);
    let format = args.format.unwrap_or(config.report.format);
    let outputs = render_outputs(&args, &classifier, &observation, &report, format, &config.charts)?;

    // 两份输出都已生成后才落盘
    if let (Some(path), Some(json)) = (&args.charts, &outputs.charts) {
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write charts to {}", path.display()))?;
        info!("Charts written to {}", path.display());
    }

    match &args.output {
        Some(path) => {
            std::fs::write(path, &outputs.report)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report ({}) written to {}", format, path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(outputs.report.as_bytes())?;
            stdout.flush()?;
        }
    }

    info!("Assessment finished: {}", verdict.level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgr_core::{GestationalAge, RiskRules};

    fn observation() -> PatientObservation {
        PatientObservation {
            gestational_age: GestationalAge { weeks: 30, days: 2 },
            fetal_weight_g: 1500.0,
            abdominal_circumference_cm: 26.0,
            uterine_pi: 0.9,
            umbilical_pi: 1.0,
            umbilical_artery_index: 0.6,
            cerebroplacental_ratio: 1.8,
            diastole_zero: false,
        }
    }

    fn render(args: &[&str], sampling: &ChartSampling) -> Result<Outputs> {
        let args = Args::parse_from(args);
        let classifier = RiskClassifier::standard(RiskRules::default())?;
        let observation = observation();
        let verdict = classifier.classify(&observation)?;
        let report = Report::build(&observation, &verdict, None);
        render_outputs(&args, &classifier, &observation, &report, ExportFormat::Csv, sampling)
    }

    #[test]
    fn test_render_report_and_charts() {
        let outputs = render(&["fgr", "--charts", "charts.json"], &ChartSampling::default()).unwrap();
        assert!(outputs.report.starts_with("Parâmetro"));

        let charts: serde_json::Value = serde_json::from_str(&outputs.charts.unwrap()).unwrap();
        assert_eq!(charts.as_array().unwrap().len(), 6);
    }

    #[test]
    fn test_render_without_charts() {
        let outputs = render(&["fgr"], &ChartSampling::default()).unwrap();
        assert!(outputs.charts.is_none());
        assert!(!outputs.report.is_empty());
    }

    #[test]
    fn test_chart_failure_produces_no_output() {
        let sampling = ChartSampling {
            start_week: 41.0,
            end_week: 14.0,
            samples: 10,
        };
        assert!(render(&["fgr", "--charts", "charts.json"], &sampling).is_err());
    }
}
