//! `log`のバックエンドとして`env_logger`を設定する。

use std::sync::Once;

/// loggerの設定
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger`の書式のフィルタ（例: `"info"`, `"bootstrap=debug,vulkan=warn"`）。
    /// `None`なら環境変数`RUST_LOG`を使う。
    pub env_filter: Option<String>,
    /// ログに色をつけるかどうか
    pub write_style: env_logger::WriteStyle,
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// 実際に使うフィルタ。
/// 設定の値、`RUST_LOG`の順に見て、どちらもなければ`None`を返す。
fn resolve_filter(config: &LoggingConfig, rust_log: Option<String>) -> Option<String> {
    config.env_filter.clone().or(rust_log)
}

/// 設定から`env_logger::Builder`を組み立てる関数。
/// フィルタの指定がない場合はinfo以上を出力し、validation layerのメッセージはすべて出力する。
fn build_logger(config: &LoggingConfig) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    match resolve_filter(config, std::env::var("RUST_LOG").ok()) {
        Some(filter) => {
            builder.parse_filters(&filter);
        }
        None => {
            builder
                .filter_level(log::LevelFilter::Info)
                .filter_module(ashtray::VULKAN_LOG_TARGET, log::LevelFilter::Trace);
        }
    }
    builder.write_style(config.write_style);
    builder
}

/// loggerを初期化する関数。
/// 2回目以降の呼び出しは何もしない。
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        // テストなどで既にloggerが設定されている場合は失敗する
        if build_logger(&config).try_init().is_err() {
            log::warn!("Logger is already initialized");
        }
        log::debug!("Logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_filter_wins_over_rust_log() {
        let config = LoggingConfig {
            env_filter: Some("bootstrap=debug".to_owned()),
            ..Default::default()
        };
        assert_eq!(
            resolve_filter(&config, Some("warn".to_owned())).as_deref(),
            Some("bootstrap=debug")
        );
    }

    #[test]
    fn rust_log_is_used_without_configured_filter() {
        let config = LoggingConfig::default();
        assert_eq!(
            resolve_filter(&config, Some("warn".to_owned())).as_deref(),
            Some("warn")
        );
        assert_eq!(resolve_filter(&config, None), None);
    }

    #[test]
    fn init_logging_twice_is_ignored() {
        init_logging(LoggingConfig::default());
        init_logging(LoggingConfig {
            env_filter: Some("trace".to_owned()),
            ..Default::default()
        });
        log::info!("still logging");
    }
}
