// ==========================================
// 考试名册系统 - 命令行入口
// ==========================================
// 用法:
//   exam-roster import <file> [student|kg]
//   exam-roster lookup <mobNo>
//   exam-roster batches [limit]
//
// 数据库路径: EXAM_ROSTER_DB_PATH 或系统数据目录
// ==========================================

use exam_roster::api::{ApiError, ImportApi, StudentLookupApi};
use exam_roster::db::get_default_db_path;
use exam_roster::{i18n, logging, RosterVariant};
use std::error::Error;
use std::process::ExitCode;

const USAGE: &str = "usage: exam-roster import <file> [student|kg] | lookup <mobNo> | batches [limit]";

// 退出码
const EXIT_OK: u8 = 0;
const EXIT_FAILED: u8 = 1;
const EXIT_USAGE: u8 = 2;
const EXIT_NOT_FOUND: u8 = 4;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    i18n::init_from_env();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args, get_default_db_path()).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(error = %e, "命令执行失败");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &[String], db_path: String) -> Result<u8, Box<dyn Error>> {
    tracing::info!("{} v{} 使用数据库: {}", exam_roster::APP_NAME, exam_roster::VERSION, db_path);

    match args.first().map(String::as_str) {
        Some("import") => {
            let file = args.get(1).ok_or(USAGE)?;
            let variant: RosterVariant = args
                .get(2)
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or(RosterVariant::Student);

            let api = ImportApi::new(db_path);
            let outcome = api.import_roster_outcome(file, variant).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);

            Ok(if outcome.success { EXIT_OK } else { EXIT_FAILED })
        }
        Some("lookup") => {
            let mob_no = args.get(1).map(String::as_str).unwrap_or_default();
            ImportApi::new(db_path.clone()).init_database()?;
            let api = StudentLookupApi::from_db_path(&db_path).await?;
            match api.get_student_by_mobile(mob_no).await {
                Ok(student) => {
                    println!("{}", serde_json::to_string_pretty(&student)?);
                    Ok(EXIT_OK)
                }
                Err(ApiError::NotFound(msg)) => {
                    eprintln!("{}", msg);
                    Ok(EXIT_NOT_FOUND)
                }
                Err(e) => Err(e.into()),
            }
        }
        Some("batches") => {
            let limit = args
                .get(1)
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(20);
            let api = ImportApi::new(db_path);
            api.init_database()?;
            let batches = api.get_recent_batches(limit).await?;
            println!("{}", serde_json::to_string_pretty(&batches)?);
            Ok(EXIT_OK)
        }
        _ => {
            eprintln!("{}", USAGE);
            Ok(EXIT_USAGE)
        }
    }
}
