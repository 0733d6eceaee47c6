//! ログ初期化
//!
//! 進捗表示は標準出力、ログは標準エラーに分ける。

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// RUST_LOG があればそれを優先し、なければ verbose で debug に切り替える
pub fn init(verbose: bool) {
    let default_level = if verbose {
        "pitch_canvas=debug"
    } else {
        "pitch_canvas=info"
    };

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
