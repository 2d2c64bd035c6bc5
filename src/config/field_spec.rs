// ==========================================
// 考试名册系统 - 字段规则表
// ==========================================
// 职责: 每种名册变体一张数据驱动的字段规则表
//       (源列名重命名 + 必填/可选 + 取值域 + 规范化规则)
// 红线: 新增名册类型只改配置，不改管道逻辑
// ==========================================

use crate::domain::types::RosterVariant;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// 核心字段（ValidatedRecord 的固定属性）
pub const FIELD_ROLL_NO: &str = "rollNo";
pub const FIELD_SCHOOL_CODE: &str = "schoolCode";
pub const FIELD_CLASS: &str = "class";
pub const FIELD_SECTION: &str = "section";
pub const FIELD_STUDENT_NAME: &str = "studentName";
pub const FIELD_MOBILE: &str = "mobNo";

pub const CORE_FIELDS: [&str; 5] = [
    FIELD_ROLL_NO,
    FIELD_SCHOOL_CODE,
    FIELD_CLASS,
    FIELD_SECTION,
    FIELD_STUDENT_NAME,
];

// ==========================================
// Normalization - 规范化规则
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Normalization {
    Trim,  // 仅去首尾空白
    Upper, // 去空白 + 转大写
    Lower, // 去空白 + 转小写
}

impl Normalization {
    pub fn apply(&self, value: &str) -> String {
        let trimmed = value.trim();
        match self {
            Normalization::Trim => trimmed.to_string(),
            Normalization::Upper => trimmed.to_uppercase(),
            Normalization::Lower => trimmed.to_lowercase(),
        }
    }
}

// ==========================================
// FlagOutput - 标记字段输出形式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagOutput {
    Digit, // "0" / "1"
    Bool,  // false / true
}

// ==========================================
// FieldDomain - 取值域
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldDomain {
    Text,
    Integer,
    OneOf { values: Vec<String> },
    Fixed { value: String },
    Flag {
        true_tokens: Vec<String>,
        false_tokens: Vec<String>,
        output: FlagOutput,
    },
}

// ==========================================
// FieldSpec - 单字段规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,                 // 规范字段名
    pub required: bool,               // 是否必填
    pub domain: FieldDomain,          // 取值域
    pub normalization: Normalization, // 规范化规则
    #[serde(default)]
    pub default: Option<String>,      // 可选字段缺省值（文本域）
}

impl FieldSpec {
    fn new(name: &str, required: bool, domain: FieldDomain, normalization: Normalization) -> Self {
        Self {
            name: name.to_string(),
            required,
            domain,
            normalization,
            default: None,
        }
    }

    pub fn required_text(name: &str) -> Self {
        Self::new(name, true, FieldDomain::Text, Normalization::Trim)
    }

    pub fn optional_text(name: &str) -> Self {
        Self::new(name, false, FieldDomain::Text, Normalization::Trim)
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn integer(name: &str, required: bool) -> Self {
        Self::new(name, required, FieldDomain::Integer, Normalization::Trim)
    }

    pub fn one_of(name: &str, required: bool, values: &[&str]) -> Self {
        Self::new(
            name,
            required,
            FieldDomain::OneOf {
                values: values.iter().map(|v| v.to_string()).collect(),
            },
            Normalization::Trim,
        )
    }

    pub fn fixed(name: &str, required: bool, value: &str) -> Self {
        Self::new(
            name,
            required,
            FieldDomain::Fixed {
                value: value.to_string(),
            },
            Normalization::Trim,
        )
    }

    pub fn flag(name: &str, true_tokens: &[&str], false_tokens: &[&str], output: FlagOutput) -> Self {
        Self::new(
            name,
            false,
            FieldDomain::Flag {
                true_tokens: true_tokens.iter().map(|t| t.to_string()).collect(),
                false_tokens: false_tokens.iter().map(|t| t.to_string()).collect(),
                output,
            },
            Normalization::Lower,
        )
    }
}

// ==========================================
// RosterProfile - 名册变体规则表
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterProfile {
    pub variant: RosterVariant,
    pub renames: BTreeMap<String, String>, // 源列名 → 规范字段名
    pub fields: Vec<FieldSpec>,
}

impl RosterProfile {
    /// 内置规则表
    pub fn builtin(variant: RosterVariant) -> Self {
        match variant {
            RosterVariant::Student => Self::student(),
            RosterVariant::Kindergarten => Self::kindergarten(),
        }
    }

    /// 源列名 → 规范列名（未登记的列名原样透传）
    pub fn canonical_header(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        self.renames
            .get(trimmed)
            .cloned()
            .unwrap_or_else(|| trimmed.to_string())
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_columns(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect()
    }

    pub fn known_columns(&self) -> BTreeSet<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// 校验规则表自身的完整性（用于配置覆写）
    pub fn check(&self) -> Result<(), String> {
        for core in CORE_FIELDS {
            if self.field(core).is_none() {
                return Err(format!("规则表缺少核心字段: {}", core));
            }
        }
        for name in [FIELD_ROLL_NO, FIELD_STUDENT_NAME, FIELD_SCHOOL_CODE] {
            if self.field(name).map(|f| !f.required).unwrap_or(true) {
                return Err(format!("核心字段必须为必填: {}", name));
            }
        }
        let mut seen = BTreeSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(format!("字段重复定义: {}", field.name));
            }
        }
        Ok(())
    }

    // ==========================================
    // 幼儿园名册
    // ==========================================
    pub fn kindergarten() -> Self {
        let renames = [
            ("Student Name", "studentName"),
            ("Roll No", "rollNo"),
            ("School Code", "schoolCode"),
            ("Section", "section"),
            ("Mother Name", "motherName"),
            ("Father Name", "fatherName"),
            ("DOB", "dob"),
            ("Mobile", "mobNo"),
            ("City", "city"),
            ("IQKG", "IQKG"),
            ("Duplicates", "Duplicates"),
            ("Class", "class"),
            ("Total Basic Level Participated Exams", "totalBasicLevelParticipatedExams"),
            ("Basic Level Full Amount", "basicLevelFullAmount"),
            ("Basic Level Paid Amount", "basicLevelAmountPaid"),
            ("Basic Level Amount Paid Online", "basicLevelAmountPaidOnline"),
            ("Is Basic Level Concession Given", "isBasicLevelConcessionGiven"),
            ("Concession Reason", "concessionReason"),
            ("Parents Working School", "ParentsWorkingschool"),
            ("Designation", "designation"),
            ("Advance Level Paid Amount", "advanceLevelAmountPaid"),
            ("Advance Level Amount Paid Online", "advanceLevelAmountPaidOnline"),
            ("Total Amount Paid", "totalAmountPaid"),
            ("Total Amount Paid Online", "totalAmountPaidOnline"),
        ];

        let fields = vec![
            // 必填
            FieldSpec::required_text(FIELD_STUDENT_NAME),
            FieldSpec::required_text(FIELD_ROLL_NO),
            FieldSpec::integer(FIELD_SCHOOL_CODE, true),
            FieldSpec::one_of(FIELD_SECTION, true, &["LKG", "UKG", "PG"])
                .with_normalization(Normalization::Upper),
            // 可选
            FieldSpec::fixed(FIELD_CLASS, false, "KG").with_normalization(Normalization::Upper),
            FieldSpec::optional_text("motherName"),
            FieldSpec::optional_text("fatherName"),
            FieldSpec::optional_text("dob"),
            FieldSpec::optional_text(FIELD_MOBILE),
            FieldSpec::optional_text("city"),
            FieldSpec::flag("IQKG", &["1", "yes"], &["0", "no"], FlagOutput::Digit),
            FieldSpec::flag("Duplicates", &["true", "1"], &["false", "0"], FlagOutput::Bool),
            // 缴费信息
            FieldSpec::optional_text("totalBasicLevelParticipatedExams").with_default("0"),
            FieldSpec::optional_text("basicLevelFullAmount").with_default("0"),
            FieldSpec::optional_text("basicLevelAmountPaid").with_default("0"),
            FieldSpec::optional_text("basicLevelAmountPaidOnline"),
            FieldSpec::optional_text("isBasicLevelConcessionGiven"),
            FieldSpec::optional_text("concessionReason"),
            FieldSpec::optional_text("ParentsWorkingschool"),
            FieldSpec::optional_text("designation"),
            FieldSpec::optional_text("advanceLevelAmountPaid"),
            FieldSpec::optional_text("advanceLevelAmountPaidOnline"),
            FieldSpec::optional_text("totalAmountPaid"),
            FieldSpec::optional_text("totalAmountPaidOnline"),
        ];

        Self {
            variant: RosterVariant::Kindergarten,
            renames: to_rename_map(&renames),
            fields,
        }
    }

    // ==========================================
    // 普通学生名册
    // ==========================================
    pub fn student() -> Self {
        let mut renames = vec![
            ("Student Name", "studentName"),
            ("Student's Name", "studentName"),
            ("Roll No", "rollNo"),
            ("School Code", "schoolCode"),
            ("Class", "class"),
            ("Section", "section"),
            ("Mother Name", "motherName"),
            ("Mother's Name", "motherName"),
            ("Father Name", "fatherName"),
            ("Father's Name", "fatherName"),
            ("DOB", "dob"),
            ("Mobile", "mobNo"),
            ("Mob No", "mobNo"),
            ("City", "city"),
        ];

        // 赛事新旧名称: IQMO→IMO, IQSO→ITST, IQEO→IENGO, IQRO→IAO, IQGKO→IGKO
        let exams = [
            ("IQMOL1", "IMOL1"),
            ("IQMOL2", "IMOL2"),
            ("IQSOL1", "ITSTL1"),
            ("IQSOL2", "ITSTL2"),
            ("IQEOL1", "IENGOL1"),
            ("IQEOL2", "IENGOL2"),
            ("IQROL1", "IAOL1"),
            ("IQROL2", "IAOL2"),
            ("IQGKOL1", "IGKOL1"),
            ("IQGKOL2", "IGKOL2"),
        ];
        renames.extend(exams.iter().copied());

        let classes: Vec<String> = (1..=12).map(|c| c.to_string()).collect();
        let class_refs: Vec<&str> = classes.iter().map(String::as_str).collect();

        let mut fields = vec![
            FieldSpec::required_text(FIELD_STUDENT_NAME),
            FieldSpec::required_text(FIELD_ROLL_NO),
            FieldSpec::integer(FIELD_SCHOOL_CODE, true),
            FieldSpec::one_of(FIELD_CLASS, true, &class_refs),
            FieldSpec::required_text(FIELD_SECTION).with_normalization(Normalization::Upper),
            FieldSpec::optional_text("motherName"),
            FieldSpec::optional_text("fatherName"),
            FieldSpec::optional_text("dob"),
            FieldSpec::optional_text(FIELD_MOBILE),
            FieldSpec::optional_text("city"),
        ];
        for (_, exam_field) in exams {
            fields.push(FieldSpec::flag(
                exam_field,
                &["1", "yes", "true"],
                &["0", "no", "false"],
                FlagOutput::Digit,
            ));
        }

        Self {
            variant: RosterVariant::Student,
            renames: to_rename_map(&renames),
            fields,
        }
    }
}

fn to_rename_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_are_consistent() {
        assert!(RosterProfile::kindergarten().check().is_ok());
        assert!(RosterProfile::student().check().is_ok());
    }

    #[test]
    fn test_kindergarten_required_columns() {
        let profile = RosterProfile::kindergarten();
        let mut required = profile.required_columns();
        required.sort();
        assert_eq!(required, vec!["rollNo", "schoolCode", "section", "studentName"]);
    }

    #[test]
    fn test_canonical_header_passthrough() {
        let profile = RosterProfile::kindergarten();
        assert_eq!(profile.canonical_header(" Roll No "), "rollNo");
        assert_eq!(profile.canonical_header("Remarks"), "Remarks");
    }

    #[test]
    fn test_profile_check_rejects_optional_roll_no() {
        let mut profile = RosterProfile::kindergarten();
        for field in profile.fields.iter_mut() {
            if field.name == FIELD_ROLL_NO {
                field.required = false;
            }
        }
        assert!(profile.check().is_err());
    }

    #[test]
    fn test_profile_json_roundtrip_keeps_domains() {
        let profile = RosterProfile::student();
        let json = serde_json::to_string(&profile).unwrap();
        let parsed: RosterProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, profile);
    }
}
