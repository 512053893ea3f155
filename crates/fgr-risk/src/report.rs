//! 评估报告
//!
//! 将观测值、参考阈值和结论整理为表格行，并导出为 CSV / JSON / 文本。

use crate::estimator::EstimatedWeight;
use chrono::{DateTime, Utc};
use fgr_core::utils::format_value;
use fgr_core::{
    FgrError, GestationalAge, Parameter, PatientObservation, Result, RiskLevel, RiskVerdict,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CSV 表头
pub const CSV_HEADER: [&str; 3] = ["Parâmetro", "Valor", "Referência"];

/// 报告行
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportRow {
    pub parameter: String,
    pub value: String,
    pub reference: String,
}

/// 评估报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub gestational_age: GestationalAge,
    pub fractional_weeks: f64,
    pub level: RiskLevel,
    pub message: String,
    pub findings: Vec<String>,
    pub rows: Vec<ReportRow>,
    pub estimated_weight: Option<EstimatedWeight>,
}

/// 导出格式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
    #[default]
    Text,
}

impl FromStr for ExportFormat {
    type Err = FgrError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "text" | "txt" => Ok(ExportFormat::Text),
            other => Err(FgrError::Export(format!("不支持的导出格式: {}", other))),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Text => write!(f, "text"),
        }
    }
}

/// 参考阈值字符串，例如 `P3: 1007.8 | P10: 1064.4`
fn reference_text(parameter: Parameter, verdict: &RiskVerdict) -> String {
    verdict
        .thresholds
        .for_parameter(parameter)
        .iter()
        .map(|(percentile, value)| {
            format!("{}: {}", percentile, format_value(*value, parameter.decimals()))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

impl Report {
    /// 生成报告
    pub fn build(
        observation: &PatientObservation,
        verdict: &RiskVerdict,
        estimated_weight: Option<EstimatedWeight>,
    ) -> Self {
        let rows = Parameter::ALL
            .iter()
            .map(|&parameter| ReportRow {
                parameter: parameter.label().to_string(),
                value: format_value(observation.value(parameter), parameter.decimals()),
                reference: reference_text(parameter, verdict),
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            gestational_age: verdict.gestational_age,
            fractional_weeks: verdict.fractional_weeks,
            level: verdict.level,
            message: verdict.message().to_string(),
            findings: verdict
                .criteria
                .iter()
                .map(|criterion| criterion.description().to_string())
                .collect(),
            rows,
            estimated_weight,
        }
    }

    /// 表格行，含估算体重行（若有）
    pub fn table_rows(&self) -> Vec<ReportRow> {
        let mut rows = self.rows.clone();
        if let Some(weight) = &self.estimated_weight {
            rows.push(ReportRow {
                parameter: EstimatedWeight::LABEL.to_string(),
                value: format_value(weight.grams, 1),
                reference: "-".to_string(),
            });
        }
        rows
    }

    /// 导出报告
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            ExportFormat::Csv => {
                let mut csv_output = String::new();
                csv_output.push_str(&CSV_HEADER.join(","));
                csv_output.push('\n');

                for row in self.table_rows() {
                    csv_output.push_str(&format!(
                        "{},{},{}\n",
                        csv_field(&row.parameter),
                        csv_field(&row.value),
                        csv_field(&row.reference)
                    ));
                }

                Ok(csv_output)
            }
            ExportFormat::Text => {
                let mut text_output = String::new();

                text_output.push_str(&format!(
                    "[{}] Idade gestacional {} ({:.2} semanas)\n",
                    self.generated_at.format("%Y-%m-%d %H:%M:%S"),
                    self.gestational_age,
                    self.fractional_weeks
                ));
                text_output.push_str(&format!("{}\n", self.message));
                for finding in &self.findings {
                    text_output.push_str(&format!("  - {}\n", finding));
                }
                text_output.push('\n');

                for row in self.table_rows() {
                    text_output.push_str(&format!(
                        "{:<32} {:>10}   {}\n",
                        row.parameter, row.value, row.reference
                    ));
                }

                Ok(text_output)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::RiskClassifier;
    use fgr_core::RiskRules;

    fn observation() -> PatientObservation {
        PatientObservation {
            gestational_age: GestationalAge { weeks: 28, days: 0 },
            fetal_weight_g: 1100.0,
            abdominal_circumference_cm: 23.0,
            uterine_pi: 0.95,
            umbilical_pi: 1.1,
            umbilical_artery_index: 0.65,
            cerebroplacental_ratio: 1.85,
            diastole_zero: false,
        }
    }

    fn report(estimated_weight: Option<EstimatedWeight>) -> Report {
        let classifier = RiskClassifier::standard(RiskRules::default()).unwrap();
        let observation = observation();
        let verdict = classifier.classify(&observation).unwrap();
        Report::build(&observation, &verdict, estimated_weight)
    }

    #[test]
    fn test_rows_and_formatting() {
        let report = report(None);
        assert_eq!(report.rows.len(), 6);

        assert_eq!(
            report.rows[0],
            ReportRow {
                parameter: "Peso fetal (g)".to_string(),
                value: "1100.0".to_string(),
                reference: "P3: 1007.8 | P10: 1064.4".to_string(),
            }
        );
        assert_eq!(report.rows[2].value, "0.95");
        assert_eq!(report.rows[2].reference, "P95: 1.17");
        assert_eq!(report.level, RiskLevel::Low);
    }

    #[test]
    fn test_csv_export() {
        let csv = report(Some(EstimatedWeight { grams: 1150.24 })).export(ExportFormat::Csv).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Parâmetro,Valor,Referência");
        assert_eq!(lines.len(), 1 + 6 + 1);
        assert_eq!(lines[1], "Peso fetal (g),1100.0,P3: 1007.8 | P10: 1064.4");
        assert_eq!(lines[7], "Peso fetal estimado (Hadlock),1150.2,-");
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_json_export() {
        let json = report(None).export(ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["level"], "low");
        assert_eq!(value["rows"].as_array().unwrap().len(), 6);
        assert!(value["estimated_weight"].is_null());
    }

    #[test]
    fn test_text_export() {
        let text = report(None).export(ExportFormat::Text).unwrap();
        assert!(text.contains("Risco Baixo"));
        assert!(text.contains("28+0"));
        assert!(text.contains("P95: 1.42"));
    }

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Text);
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
