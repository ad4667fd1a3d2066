use crate::core::config::LoggingConfig;
use crate::core::error::SimulatorError;
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::fs::File;
use std::io::Write;

pub fn setup_logger(config: &LoggingConfig) -> Result<(), SimulatorError> {
    let level: LevelFilter = config
        .level
        .parse()
        .map_err(|_| SimulatorError::Config(format!("無効なログレベル: {}", config.level)))?;

    let mut builder = Builder::new();
    builder
        .filter_level(level)
        // タイムスタンプ付きのフォーマット
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        });

    // ログファイルが指定されていればファイルへ、なければ標準エラーへ出力
    match &config.file {
        Some(path) => {
            let file = File::create(path)?;
            builder.target(Target::Pipe(Box::new(file)));
        }
        None => {
            builder.target(Target::Stderr);
        }
    }

    builder
        .try_init()
        .map_err(|e| SimulatorError::Logger(e.to_string()))
}
