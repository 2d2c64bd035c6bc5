// ==========================================
// 考试名册系统 - 领域类型定义
// ==========================================
// 职责: 名册变体枚举、字段值类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 名册变体 (Roster Variant)
// ==========================================
// 每个变体对应一张字段规则表与一张落库表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RosterVariant {
    Student,      // 普通学生名册（1-12 年级）
    Kindergarten, // 幼儿园名册（KG）
}

impl RosterVariant {
    /// 落库表名
    pub fn table_name(&self) -> &'static str {
        match self {
            RosterVariant::Student => "student_roster",
            RosterVariant::Kindergarten => "kindergarten_student",
        }
    }

    /// 配置键后缀（config_kv: roster_profile/{key}）
    pub fn config_key(&self) -> &'static str {
        match self {
            RosterVariant::Student => "student",
            RosterVariant::Kindergarten => "kindergarten",
        }
    }
}

impl fmt::Display for RosterVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterVariant::Student => write!(f, "STUDENT"),
            RosterVariant::Kindergarten => write!(f, "KINDERGARTEN"),
        }
    }
}

impl FromStr for RosterVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" | "students" => Ok(RosterVariant::Student),
            "kg" | "kindergarten" => Ok(RosterVariant::Kindergarten),
            other => Err(format!("未知名册类型: {}", other)),
        }
    }
}

// ==========================================
// 字段值 (Field Value)
// ==========================================
// 校验通过后的规范化取值
// 说明: "0"/"1" 形式的参赛标记保存为 Text，布尔形式保存为 Flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Integer(i64),
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Flag(b) => write!(f, "{}", b),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_from_str() {
        assert_eq!("kg".parse::<RosterVariant>(), Ok(RosterVariant::Kindergarten));
        assert_eq!(" Student ".parse::<RosterVariant>(), Ok(RosterVariant::Student));
        assert!("college".parse::<RosterVariant>().is_err());
    }

    #[test]
    fn test_field_value_serialize_untagged() {
        let json = serde_json::to_string(&FieldValue::Flag(true)).unwrap();
        assert_eq!(json, "true");
        let json = serde_json::to_string(&FieldValue::Text("1".to_string())).unwrap();
        assert_eq!(json, "\"1\"");
    }
}
