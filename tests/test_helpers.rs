// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、名册文件生成等功能
// ==========================================

#![allow(dead_code)]

use exam_roster::db::{init_schema, open_sqlite_connection};
use std::error::Error;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

/// 幼儿园名册最小表头
pub const KG_HEADER: &str = "studentName,rollNo,schoolCode,class,section,mobNo";

/// 普通名册最小表头
pub const STUDENT_HEADER: &str = "Student Name,Roll No,School Code,Class,Section,Mobile,IQMOL1";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时路径不是合法 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 创建上传目录
pub fn create_upload_dir() -> Result<TempDir, Box<dyn Error>> {
    Ok(TempDir::new()?)
}

/// 写入名册文件（表头 + 数据行）
pub fn write_roster(dir: &Path, name: &str, header: &str, rows: &[&str]) -> PathBuf {
    let mut content = String::from(header);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }

    let path = dir.join(name);
    std::fs::write(&path, content).expect("写入测试文件失败");
    path
}

/// 路径转字符串
pub fn path_str(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// 测试数据文件路径（tests/fixtures 下）
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
