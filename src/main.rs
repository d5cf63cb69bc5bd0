// ==========================================
// CheckPeso - 命令行入口
// ==========================================
// 用法:
//   checkpeso calc <Q> <W> <T> <G> <U> [S]   核算一次抽检（不落库）
//   checkpeso describe <Q>                   样本量说明
//   checkpeso import <文件> <操作人>          批量导入 CSV / XLSX
//   checkpeso report html|csv|summary        输出报表到标准输出
//   checkpeso whatsapp <记录ID>               单条记录分享文本
// 数据库路径: CHECKPESO_DB 或用户数据目录
// ==========================================

use checkpeso::app::{get_default_db_path, AppState};
use checkpeso::domain::{LocaleNumber, RawWeighingInput, RecordFilter};
use std::error::Error;

const USAGE: &str = "uso: checkpeso <calc|describe|import|report|whatsapp> [args...]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    checkpeso::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{} {}", checkpeso::APP_NAME, checkpeso::VERSION);
        eprintln!("{}", USAGE);
        return Ok(());
    };

    let db_path = get_default_db_path();
    tracing::debug!("使用数据库: {}", db_path);
    let state = AppState::new(db_path)?;

    match command.as_str() {
        "calc" => {
            if args.len() < 6 {
                return Err("uso: checkpeso calc <Q> <W> <T> <G> <U> [S]".into());
            }
            let raw = RawWeighingInput {
                lot_size: LocaleNumber::from(args[1].as_str()),
                nominal_weight_per_box: LocaleNumber::from(args[2].as_str()),
                tare_per_box: LocaleNumber::from(args[3].as_str()),
                gross_sample_weight: LocaleNumber::from(args[4].as_str()),
                underweight_count: LocaleNumber::from(args[5].as_str()),
                sample_size_override: args.get(6).map(|s| LocaleNumber::from(s.as_str())),
            };
            let preview = state.audit_api.preview(&raw)?;
            println!("{}", preview.sample_size_description);
            println!("{}", serde_json::to_string_pretty(&preview.result)?);
        }
        "describe" => {
            let lot = args.get(1).ok_or("uso: checkpeso describe <Q>")?;
            let lot_size = checkpeso::domain::parse_locale_decimal(lot);
            let info = state.config_api.describe_sample_size(lot_size)?;
            println!("{}", info.description);
        }
        "import" => {
            let (Some(file), Some(actor)) = (args.get(1), args.get(2)) else {
                return Err("uso: checkpeso import <arquivo> <responsavel>".into());
            };
            let summary = state.import_api.import_file(file, actor).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        "report" => {
            let filter = RecordFilter {
                limit: 1000,
                ..Default::default()
            };
            match args.get(1).map(String::as_str) {
                Some("html") => println!("{}", state.report_api.html(&filter).await?),
                Some("csv") => print!("{}", state.report_api.csv(&filter)?),
                Some("summary") => println!(
                    "{}",
                    serde_json::to_string_pretty(&state.report_api.summary(&filter)?)?
                ),
                _ => return Err("uso: checkpeso report <html|csv|summary>".into()),
            }
        }
        "whatsapp" => {
            let id = args.get(1).ok_or("uso: checkpeso whatsapp <id>")?;
            println!("{}", state.report_api.whatsapp(id).await?);
        }
        other => {
            return Err(format!("comando desconhecido: {}\n{}", other, USAGE).into());
        }
    }

    Ok(())
}
