// main.rs

use std::path::PathBuf;
use std::process::ExitCode;

use book_moderation::{ModerationConfig, ModerationService, TextNormalizer};
use clap::Parser;
use tracing::error;

/// 扫描 TXT 书籍，输出章节敏感度分析结果（JSON）
#[derive(Parser, Debug)]
#[command(name = "book-moderation", version, about)]
struct Cli {
    /// 待分析的文本文件
    file: PathBuf,

    /// JSON 配置文件
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 把整个文件当作单个章节快速检查
    #[arg(short, long)]
    quick: bool,

    /// 格式化输出
    #[arg(long)]
    pretty: bool,
}

fn run(cli: &Cli) -> Result<String, Box<dyn std::error::Error>> {
    let config = cli.config.as_ref().map(ModerationConfig::load).transpose()?;
    let service = ModerationService::create(config)?;

    let value = if cli.quick {
        let lines = TextNormalizer::new().lines_from_file(&cli.file)?;
        serde_json::to_value(service.quick_check(&lines))?
    } else {
        serde_json::to_value(service.analyze_file(&cli.file)?)?
    };

    let output = if cli.pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(output)
}

fn main() -> ExitCode {
    book_moderation::init_logging();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "moderation failed");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
