// ==========================================
// 考试名册系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 说明: CSV 从文件句柄流式读取；非 UTF-8 编码经 encoding_rs 转码
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::roster_importer_trait::FileParser;
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use encoding_rs::{Encoding, UTF_8};
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

// ==========================================
// SourceRecord - 源文件数据行（未规范化）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub row_number: usize,   // 源文件行号（表头为第 1 行）
    pub values: Vec<String>, // 按列位置排列，已去首尾空白
}

impl SourceRecord {
    fn is_blank(&self) -> bool {
        self.values.iter().all(|v| v.is_empty())
    }
}

pub type RecordIter = Box<dyn Iterator<Item = ImportResult<SourceRecord>> + Send>;

// ==========================================
// SheetReader - 已打开的表
// ==========================================
// 表头在读取任何数据行之前即可用；数据行单次惰性消费
pub struct SheetReader {
    pub headers: Vec<String>,
    pub records: RecordIter,
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn open(&self, file_path: &Path, encoding: &str) -> ImportResult<SheetReader> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let mut file = File::open(path)?;

        // 探测 BOM
        let mut head = Vec::with_capacity(3);
        (&mut file).take(3).read_to_end(&mut head)?;
        file.seek(SeekFrom::Start(0))?;

        let (detected, bom_len) = resolve_encoding(&head, encoding)?;
        debug!(encoding = detected.name(), bom_len = bom_len, "CSV 文本编码");

        let source: Box<dyn Read + Send> = if detected == UTF_8 {
            // UTF-8 直接流式读取（跳过 BOM）
            file.seek(SeekFrom::Start(bom_len as u64))?;
            Box::new(file)
        } else {
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            let (text, _, had_errors) = detected.decode(&bytes);
            if had_errors {
                return Err(ImportError::Parse(format!(
                    "文本无法按 {} 编码解码",
                    detected.name()
                )));
            }
            Box::new(Cursor::new(text.into_owned().into_bytes()))
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(source);

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let records = reader
            .into_records()
            .enumerate()
            .map(|(idx, result)| -> ImportResult<SourceRecord> {
                let record = result?;
                let row_number = record
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(idx + 2);
                Ok(SourceRecord {
                    row_number,
                    values: record.iter().map(|v| v.trim().to_string()).collect(),
                })
            })
            // 跳过完全空白的行
            .filter(|r: &ImportResult<SourceRecord>| !matches!(r, Ok(rec) if rec.is_blank()));

        Ok(SheetReader {
            headers,
            records: Box::new(records),
        })
    }
}

/// 确定文本编码: BOM 优先，其次为配置的编码标签
fn resolve_encoding(head: &[u8], label: &str) -> ImportResult<(&'static Encoding, usize)> {
    if let Some(found) = Encoding::for_bom(head) {
        return Ok(found);
    }
    Encoding::for_label(label.trim().as_bytes())
        .map(|encoding| (encoding, 0))
        .ok_or_else(|| ImportError::Parse(format!("未知文本编码: {}", label)))
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn open(&self, file_path: &Path, _encoding: &str) -> ImportResult<SheetReader> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        // 打开 Excel 文件（按扩展名自动识别 xlsx/xls）
        let mut workbook = open_workbook_auto(path)?;

        // 读取第一个 sheet
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ImportError::Parse("Excel 文件无工作表".to_string()))??;

        // 表头所在的绝对行号（1 起）
        let header_row_number = range.start().map(|(r, _)| r as usize + 1).unwrap_or(1);

        // 提取表头（第一行）
        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row
                .iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect(),
            None => Vec::new(),
        };

        // 读取数据行
        let mut records = Vec::new();
        for (idx, data_row) in rows.enumerate() {
            let record = SourceRecord {
                row_number: header_row_number + idx + 1,
                values: data_row
                    .iter()
                    .map(|cell| cell.to_string().trim().to_string())
                    .collect(),
            };

            // 跳过完全空白的行
            if record.is_blank() {
                continue;
            }
            records.push(Ok(record));
        }

        Ok(SheetReader {
            headers,
            records: Box::new(records.into_iter()),
        })
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn open(&self, file_path: &Path, encoding: &str) -> ImportResult<SheetReader> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.open(file_path, encoding),
            "xlsx" | "xls" => ExcelParser.open(file_path, encoding),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn csv_file(bytes: &[u8]) -> NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        temp_file.write_all(bytes).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    fn collect(reader: SheetReader) -> Vec<SourceRecord> {
        reader.records.map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let temp_file = csv_file(b"Roll No, Student Name ,Section\nA1, Asha ,LKG\nA2,Ravi,UKG\n");

        let reader = CsvParser.open(temp_file.path(), "utf-8").unwrap();
        assert_eq!(reader.headers, vec!["Roll No", "Student Name", "Section"]);

        let records = collect(reader);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].row_number, 2);
        assert_eq!(records[0].values, vec!["A1", "Asha", "LKG"]);
        assert_eq!(records[1].row_number, 3);
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.open(Path::new("non_existent.csv"), "utf-8");
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_skip_empty_rows_keeps_line_numbers() {
        let temp_file = csv_file(b"Roll No,Section\nA1,LKG\n,\nA2,UKG\n");

        let records = collect(CsvParser.open(temp_file.path(), "utf-8").unwrap());

        // 应跳过空行，行号保持源文件位置
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].row_number, 4);
    }

    #[test]
    fn test_csv_parser_strips_utf8_bom() {
        let temp_file = csv_file(b"\xEF\xBB\xBFRoll No,Section\nA1,LKG\n");

        let reader = CsvParser.open(temp_file.path(), "utf-8").unwrap();
        assert_eq!(reader.headers[0], "Roll No");
    }

    #[test]
    fn test_csv_parser_transcodes_configured_encoding() {
        // "Zoë" in windows-1252
        let temp_file = csv_file(b"Student Name,Roll No\nZo\xEB,A1\n");

        let records = collect(CsvParser.open(temp_file.path(), "windows-1252").unwrap());
        assert_eq!(records[0].values[0], "Zoë");
    }

    #[test]
    fn test_csv_parser_invalid_utf8_is_parse_error() {
        let temp_file = csv_file(b"Student Name,Roll No\nZo\xEB,A1\n");

        let reader = CsvParser.open(temp_file.path(), "utf-8").unwrap();
        let results: Vec<_> = reader.records.collect();
        assert!(matches!(results[0], Err(ImportError::Parse(_))));
    }

    #[test]
    fn test_unknown_encoding_label() {
        let temp_file = csv_file(b"Roll No\nA1\n");
        let result = CsvParser.open(temp_file.path(), "klingon-8");
        assert!(matches!(result, Err(ImportError::Parse(_))));
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let mut temp_file = Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(temp_file, "Roll No").unwrap();

        let result = UniversalFileParser.open(temp_file.path(), "utf-8");
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "txt"));
    }

    #[test]
    fn test_universal_parser_corrupt_xlsx_is_parse_error() {
        let mut temp_file = Builder::new().suffix(".xlsx").tempfile().unwrap();
        temp_file.write_all(b"not a zip archive").unwrap();

        let result = UniversalFileParser.open(temp_file.path(), "utf-8");
        assert!(matches!(result, Err(ImportError::Parse(_))));
    }

    #[test]
    fn test_excel_parser_reads_fixture_workbook() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/roster_kg.xlsx");

        let reader = ExcelParser.open(&path, "utf-8").unwrap();
        assert_eq!(
            reader.headers,
            vec!["studentName", "rollNo", "schoolCode", "class", "section", "mobNo"]
        );

        // 第 3 行为空行，跳过但不改变后续行号
        let records = collect(reader);
        let row_numbers: Vec<usize> = records.iter().map(|r| r.row_number).collect();
        assert_eq!(row_numbers, vec![2, 4, 5]);

        // 数值单元格按整数文本输出
        assert_eq!(records[0].values[2], "12");
        assert_eq!(records[0].values[5], "9000000001");
        assert_eq!(records[1].values[1], "102");
        assert_eq!(records[2].values[2], "");
    }
}
