// ==========================================
// 考试名册系统 - 行校验器实现
// ==========================================
// 职责: 按字段规则表逐行校验（必填/整数/取值集合/固定值/标记）
// 红线: 同一行的全部违规一次性收集，聚合为一个 RowError
// 红线: 行级违规从不导致整批失败
// ==========================================

use crate::config::field_spec::{
    FieldDomain, FieldSpec, FlagOutput, RosterProfile, FIELD_CLASS, FIELD_ROLL_NO,
    FIELD_SCHOOL_CODE, FIELD_SECTION, FIELD_STUDENT_NAME,
};
use crate::domain::roster::{RawRow, RowError, ValidatedRecord};
use crate::domain::types::FieldValue;
use crate::i18n::t_with_args;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::roster_importer_trait::RowValidator;
use std::collections::BTreeMap;

const UNKNOWN_ROLL_NO: &str = "unknown";

// ==========================================
// ProfileRowValidator - 基于规则表的实现
// ==========================================
pub struct ProfileRowValidator {
    cleaner: DataCleaner,
}

impl ProfileRowValidator {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }

    /// 校验单个字段
    ///
    /// # 返回
    /// - Ok(Some(v)): 取值（含缺省值）
    /// - Ok(None): 可选字段缺失且无缺省值
    /// - Err(msg): 违规描述
    fn check_field(&self, row: &RawRow, spec: &FieldSpec) -> Result<Option<FieldValue>, String> {
        let row_no = row.row_number.to_string();

        let raw = match row.get(&spec.name) {
            Some(v) => v,
            None if spec.required => {
                return Err(t_with_args(
                    "row.required",
                    &[("row", &row_no), ("field", &spec.name)],
                ));
            }
            None => return Ok(self.default_value(spec)),
        };

        let value = self.cleaner.clean_text(raw, spec.normalization);

        match &spec.domain {
            FieldDomain::Text => Ok(Some(FieldValue::Text(value))),
            FieldDomain::Integer => match self.cleaner.parse_integer(&value) {
                Some(n) => Ok(Some(FieldValue::Integer(n))),
                None => Err(t_with_args(
                    "row.not_integer",
                    &[("row", &row_no), ("field", &spec.name), ("value", raw)],
                )),
            },
            FieldDomain::OneOf { values } => {
                let allowed = values.iter().any(|v| spec.normalization.apply(v) == value);
                if allowed {
                    Ok(Some(FieldValue::Text(value)))
                } else {
                    Err(t_with_args(
                        "row.not_in_set",
                        &[
                            ("row", &row_no),
                            ("field", &spec.name),
                            ("allowed", &values.join(", ")),
                            ("value", raw),
                        ],
                    ))
                }
            }
            FieldDomain::Fixed { value: expected } => {
                if spec.normalization.apply(expected) == value {
                    Ok(Some(FieldValue::Text(value)))
                } else {
                    Err(t_with_args(
                        "row.fixed_value",
                        &[
                            ("row", &row_no),
                            ("field", &spec.name),
                            ("expected", expected),
                            ("value", raw),
                        ],
                    ))
                }
            }
            FieldDomain::Flag {
                true_tokens,
                false_tokens,
                output,
            } => match self.cleaner.clean_flag(&value, true_tokens, false_tokens) {
                Some(flag) => Ok(Some(flag_value(flag, *output))),
                None => {
                    let allowed: Vec<&str> = true_tokens
                        .iter()
                        .chain(false_tokens.iter())
                        .map(String::as_str)
                        .collect();
                    Err(t_with_args(
                        "row.bad_flag",
                        &[
                            ("row", &row_no),
                            ("field", &spec.name),
                            ("allowed", &allowed.join("/")),
                            ("value", raw),
                        ],
                    ))
                }
            },
        }
    }

    /// 可选字段缺省值: 文本 ""（或规则表指定值）/ 数字标记 "0" / 布尔标记 false
    fn default_value(&self, spec: &FieldSpec) -> Option<FieldValue> {
        match &spec.domain {
            FieldDomain::Flag { output, .. } => Some(flag_value(false, *output)),
            FieldDomain::Fixed { value } => Some(FieldValue::Text(
                spec.default.clone().unwrap_or_else(|| spec.normalization.apply(value)),
            )),
            FieldDomain::Integer => spec
                .default
                .as_deref()
                .and_then(|d| self.cleaner.parse_integer(d))
                .map(FieldValue::Integer),
            FieldDomain::Text | FieldDomain::OneOf { .. } => Some(FieldValue::Text(
                spec.default.clone().unwrap_or_default(),
            )),
        }
    }
}

impl Default for ProfileRowValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RowValidator for ProfileRowValidator {
    fn validate(&self, row: &RawRow, profile: &RosterProfile) -> Result<ValidatedRecord, RowError> {
        let mut messages = Vec::new();
        let mut values: BTreeMap<String, FieldValue> = BTreeMap::new();

        // 穷举校验，不短路
        for spec in &profile.fields {
            match self.check_field(row, spec) {
                Ok(Some(value)) => {
                    values.insert(spec.name.clone(), value);
                }
                Ok(None) => {}
                Err(message) => messages.push(message),
            }
        }

        // schoolCode 必须为整数（规则表覆写为文本域时同样适用）
        let school_code = match values.remove(FIELD_SCHOOL_CODE) {
            Some(FieldValue::Integer(n)) => Some(n),
            Some(other) => {
                let text = other.to_string();
                let parsed = self.cleaner.parse_integer(&text);
                if parsed.is_none() {
                    messages.push(t_with_args(
                        "row.not_integer",
                        &[
                            ("row", &row.row_number.to_string()),
                            ("field", FIELD_SCHOOL_CODE),
                            ("value", &text),
                        ],
                    ));
                }
                parsed
            }
            None => None,
        };

        if !messages.is_empty() {
            return Err(RowError {
                row_number: row.row_number,
                roll_no: row.get(FIELD_ROLL_NO).unwrap_or(UNKNOWN_ROLL_NO).to_string(),
                messages,
            });
        }

        let mut take_text = |name: &str| -> String {
            values
                .remove(name)
                .map(|v| v.to_string())
                .unwrap_or_default()
        };

        let roll_no = take_text(FIELD_ROLL_NO);
        let class = take_text(FIELD_CLASS);
        let section = take_text(FIELD_SECTION);
        let student_name = take_text(FIELD_STUDENT_NAME);

        Ok(ValidatedRecord {
            roll_no,
            school_code: school_code.unwrap_or_default(),
            class,
            section,
            student_name,
            attributes: values,
            row_number: row.row_number,
        })
    }
}

fn flag_value(flag: bool, output: FlagOutput) -> FieldValue {
    match output {
        FlagOutput::Digit => FieldValue::Text(if flag { "1" } else { "0" }.to_string()),
        FlagOutput::Bool => FieldValue::Flag(flag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn row(row_number: usize, pairs: &[(&str, &str)]) -> RawRow {
        let cells: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RawRow::new(row_number, cells)
    }

    fn kg_row(pairs: &[(&str, &str)]) -> RawRow {
        let mut base: Vec<(&str, &str)> = vec![
            ("rollNo", "A1"),
            ("schoolCode", "12"),
            ("section", "LKG"),
            ("studentName", "Asha"),
        ];
        for (k, v) in pairs {
            base.retain(|(bk, _)| bk != k);
            base.push((k, v));
        }
        row(2, &base)
    }

    #[test]
    fn test_valid_kindergarten_row_applies_defaults() {
        let validator = ProfileRowValidator::new();
        let profile = RosterProfile::kindergarten();

        let record = validator
            .validate(&kg_row(&[("section", " lkg ")]), &profile)
            .unwrap();

        assert_eq!(record.roll_no, "A1");
        assert_eq!(record.school_code, 12);
        assert_eq!(record.class, "KG");
        assert_eq!(record.section, "LKG");
        assert_eq!(record.student_name, "Asha");
        assert_eq!(record.row_number, 2);
        assert_eq!(record.attribute_text("IQKG"), Some("0"));
        assert_eq!(record.attributes.get("Duplicates"), Some(&FieldValue::Flag(false)));
        assert_eq!(record.attribute_text("city"), Some(""));
        assert_eq!(record.attribute_text("basicLevelFullAmount"), Some("0"));
    }

    #[test]
    fn test_flags_normalize() {
        let validator = ProfileRowValidator::new();
        let profile = RosterProfile::kindergarten();

        let record = validator
            .validate(&kg_row(&[("IQKG", "Yes"), ("Duplicates", "1")]), &profile)
            .unwrap();

        assert_eq!(record.attribute_text("IQKG"), Some("1"));
        assert_eq!(record.attributes.get("Duplicates"), Some(&FieldValue::Flag(true)));
    }

    #[test]
    fn test_missing_required_field_single_row_error() {
        let validator = ProfileRowValidator::new();
        let profile = RosterProfile::kindergarten();

        let err = validator
            .validate(&kg_row(&[("studentName", "  ")]), &profile)
            .unwrap_err();

        assert_eq!(err.row_number, 2);
        assert_eq!(err.roll_no, "A1");
        assert_eq!(err.messages, vec!["Row 2: studentName is required".to_string()]);
    }

    #[test]
    fn test_all_violations_collected_in_one_error() {
        let validator = ProfileRowValidator::new();
        let profile = RosterProfile::kindergarten();

        let err = validator
            .validate(
                &row(
                    5,
                    &[
                        ("schoolCode", "abc"),
                        ("section", "NURSERY"),
                        ("class", "1"),
                        ("IQKG", "maybe"),
                        ("Duplicates", "perhaps"),
                    ],
                ),
                &profile,
            )
            .unwrap_err();

        assert_eq!(err.roll_no, "unknown");
        // studentName, rollNo, schoolCode, section, class, IQKG, Duplicates
        assert_eq!(err.messages.len(), 7);
        assert!(err.messages[0].contains("studentName is required"));
        assert!(err.messages[2].contains("schoolCode must be a number"));
        assert!(err.messages.iter().all(|m| m.starts_with("Row 5:")));
    }

    #[test]
    fn test_school_code_never_defaults_silently() {
        let validator = ProfileRowValidator::new();
        let profile = RosterProfile::kindergarten();

        let err = validator
            .validate(&kg_row(&[("schoolCode", "12a")]), &profile)
            .unwrap_err();
        assert_eq!(err.messages.len(), 1);
    }

    #[test]
    fn test_student_row_class_range_and_exam_flags() {
        let validator = ProfileRowValidator::new();
        let profile = RosterProfile::student();

        let ok = validator
            .validate(
                &row(
                    3,
                    &[
                        ("rollNo", "S1"),
                        ("schoolCode", "101"),
                        ("class", "7"),
                        ("section", "b"),
                        ("studentName", "Ravi"),
                        ("IMOL1", "TRUE"),
                        ("mobNo", "9876543210"),
                    ],
                ),
                &profile,
            )
            .unwrap();
        assert_eq!(ok.section, "B");
        assert_eq!(ok.attribute_text("IMOL1"), Some("1"));
        assert_eq!(ok.attribute_text("IGKOL2"), Some("0"));
        assert_eq!(ok.attribute_text("mobNo"), Some("9876543210"));

        let err = validator
            .validate(
                &row(
                    4,
                    &[
                        ("rollNo", "S2"),
                        ("schoolCode", "101"),
                        ("class", "13"),
                        ("section", "A"),
                        ("studentName", "Meena"),
                    ],
                ),
                &profile,
            )
            .unwrap_err();
        assert_eq!(err.roll_no, "S2");
        assert_eq!(err.messages.len(), 1);
        assert!(err.messages[0].contains("class"));
    }
}
