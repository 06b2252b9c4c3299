use std::env;

use anyhow::{Context, Result};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

/// ログレベルを上書きする環境変数。
const LOG_LEVEL_ENV: &str = "TEAMLOG_LOG";

/// ログ出力を初期化する。
///
/// ログは標準エラー出力に書き出す。環境変数`TEAMLOG_LOG`が設定されていればそのレベルを、
/// なければ`-v`の回数に応じたレベルを利用する。
pub fn setup_logger(verbosity: u64) -> Result<()> {
    let level = env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or_else(|| level_from_verbosity(verbosity));
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                Local::now().format("%H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level)
        // HTTPクライアント内部のログは多すぎるので抑える
        .level_for("hyper", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Warn)
        .chain(std::io::stderr())
        .apply()
        .context("Failed to initialize logger")?;

    Ok(())
}

/// `-v`の回数からログレベルを決める。
fn level_from_verbosity(verbosity: u64) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
