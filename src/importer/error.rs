// ==========================================
// 考试名册系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 仅承载致命错误；行级违规是数据（RowError），不是错误
// ==========================================

use crate::domain::roster::FailureKind;
use crate::i18n::t_with_args;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件解析失败: {0}")]
    Parse(String),

    // ===== 表头错误 =====
    #[error("缺少必填列: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    // ===== 重复学号 =====
    #[error("文件内学号重复: {}", keys.join(", "))]
    BatchDuplicates { keys: Vec<String> },

    #[error("学号已存在于数据库: {}", keys.join(", "))]
    PersistedDuplicates { keys: Vec<String> },

    // ===== 存储与配置 =====
    #[error("存储不可用: {0}")]
    Storage(String),

    #[error("配置读取失败: {0}")]
    Config(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 致命错误分类
    pub fn kind(&self) -> FailureKind {
        match self {
            ImportError::FileNotFound(_)
            | ImportError::UnsupportedFormat(_)
            | ImportError::Parse(_) => FailureKind::Parse,
            ImportError::MissingColumns { .. } => FailureKind::MissingColumns,
            ImportError::BatchDuplicates { .. } => FailureKind::BatchDuplicates,
            ImportError::PersistedDuplicates { .. } => FailureKind::PersistedDuplicates,
            ImportError::Storage(_) | ImportError::Config(_) | ImportError::Other(_) => {
                FailureKind::Storage
            }
        }
    }

    /// 错误涉及的键（缺失列名 / 冲突学号）
    pub fn keys(&self) -> &[String] {
        match self {
            ImportError::MissingColumns { columns } => columns,
            ImportError::BatchDuplicates { keys } | ImportError::PersistedDuplicates { keys } => {
                keys
            }
            _ => &[],
        }
    }

    /// 面向用户的本地化描述
    pub fn localized_message(&self) -> String {
        match self {
            ImportError::FileNotFound(path) => {
                t_with_args("import.file_not_found", &[("path", path)])
            }
            ImportError::UnsupportedFormat(ext) => {
                t_with_args("import.unsupported_format", &[("ext", ext)])
            }
            ImportError::Parse(reason) => t_with_args("import.parse_failed", &[("reason", reason)]),
            ImportError::MissingColumns { columns } => {
                t_with_args("import.missing_columns", &[("columns", &columns.join(", "))])
            }
            ImportError::BatchDuplicates { keys } => {
                t_with_args("import.batch_duplicates", &[("keys", &keys.join(", "))])
            }
            ImportError::PersistedDuplicates { keys } => {
                t_with_args("import.persisted_duplicates", &[("keys", &keys.join(", "))])
            }
            ImportError::Storage(reason) | ImportError::Config(reason) => {
                t_with_args("import.storage_failed", &[("reason", reason)])
            }
            ImportError::Other(err) => {
                t_with_args("import.storage_failed", &[("reason", &err.to_string())])
            }
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::Parse(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::Parse(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::Parse(err.to_string())
    }
}

// 实现 From<RepositoryError>
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::Storage(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            ImportError::FileNotFound("x.csv".to_string()).kind(),
            FailureKind::Parse
        );
        assert_eq!(
            ImportError::MissingColumns {
                columns: vec!["rollNo".to_string()]
            }
            .kind(),
            FailureKind::MissingColumns
        );
        assert_eq!(
            ImportError::from(RepositoryError::LockError("poisoned".to_string())).kind(),
            FailureKind::Storage
        );
    }

    #[test]
    fn test_keys_and_display() {
        let err = ImportError::BatchDuplicates {
            keys: vec!["A1".to_string(), "B2".to_string()],
        };
        assert_eq!(err.keys(), &["A1".to_string(), "B2".to_string()]);
        assert!(err.to_string().contains("A1, B2"));
        assert!(ImportError::Parse("bad".to_string()).keys().is_empty());
    }
}
