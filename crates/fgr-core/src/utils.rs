//! 通用工具函数

/// 每周天数
pub const DAYS_PER_WEEK: f64 = 7.0;

/// 将孕周(周, 天)换算为小数周
///
/// 所有曲线取值、图表标记和报告都使用这一换算结果作为横坐标。
pub fn normalize_gestational_age(weeks: u32, days: u32) -> f64 {
    f64::from(weeks) + f64::from(days) / DAYS_PER_WEEK
}

/// 按固定小数位格式化数值
pub fn format_value(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

/// 生成闭区间 [start, end] 上的等距采样点
pub fn linspace(start: f64, end: f64, samples: usize) -> Vec<f64> {
    match samples {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_normalize_gestational_age() {
        assert_abs_diff_eq!(normalize_gestational_age(28, 3), 28.4286, epsilon = 1e-4);
        assert_abs_diff_eq!(normalize_gestational_age(28, 3), 28.0 + 3.0 / 7.0, epsilon = 1e-12);
        assert_eq!(normalize_gestational_age(32, 0), 32.0);
        assert_eq!(normalize_gestational_age(0, 0), 0.0);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(1007.8, 1), "1007.8");
        assert_eq!(format_value(1.2345, 2), "1.23");
        assert_eq!(format_value(2.0, 2), "2.00");
    }

    #[test]
    fn test_linspace() {
        let grid = linspace(14.0, 41.0, 500);
        assert_eq!(grid.len(), 500);
        assert_eq!(grid[0], 14.0);
        assert_eq!(grid[499], 41.0);
        assert!(grid.windows(2).all(|w| w[0] < w[1]));

        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
        assert_eq!(linspace(0.0, 1.0, 3), vec![0.0, 0.5, 1.0]);
    }
}
