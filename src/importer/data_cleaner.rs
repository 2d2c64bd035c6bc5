// ==========================================
// 考试名册系统 - 数据清洗器实现
// ==========================================
// 职责: 文本规范化 / 标记取值归一 / 整数解析
// ==========================================

use crate::config::field_spec::Normalization;

pub struct DataCleaner;

impl DataCleaner {
    /// 按规范化规则清洗文本
    pub fn clean_text(&self, value: &str, normalization: Normalization) -> String {
        normalization.apply(value)
    }

    /// 标记字段归一（大小写不敏感）
    ///
    /// # 返回
    /// - Some(true) / Some(false): 命中 true/false 取值集合
    /// - None: 不在任何取值集合中
    pub fn clean_flag(&self, value: &str, true_tokens: &[String], false_tokens: &[String]) -> Option<bool> {
        let lowered = value.trim().to_lowercase();
        if true_tokens.iter().any(|t| t.to_lowercase() == lowered) {
            Some(true)
        } else if false_tokens.iter().any(|t| t.to_lowercase() == lowered) {
            Some(false)
        } else {
            None
        }
    }

    /// 整数解析（允许 Excel 数值单元格的 "12.0" 形式）
    pub fn parse_integer(&self, value: &str) -> Option<i64> {
        let trimmed = value.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            return Some(n);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(f as i64),
            _ => None,
        }
    }
}
