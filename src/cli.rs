use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pitch-canvas")]
#[command(about = "資金調達向けビジネスモデルキャンバス編集・ピッチデッキ提出ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// キャンバスの完了状況を表示
    Show,

    /// セクションを編集して保存
    Edit {
        /// セクション名（例: valuePropositions, key-partners）
        #[arg(required = true)]
        section: String,

        /// 内容（省略時は対話入力）
        #[arg(short, long)]
        text: Option<String>,
    },

    /// 対話式でキャンバスを編集
    Session,

    /// キャンバスの全データを削除
    Clear {
        /// 確認を省略
        #[arg(short, long)]
        yes: bool,
    },

    /// ピッチデッキ（PDF/動画）を提出
    Deck {
        /// 提出するファイル
        files: Vec<PathBuf>,

        /// フォルダ内のファイルをまとめて選択
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// 提出前に除外する番号（1始まり）
        #[arg(short, long, num_args = 1..)]
        remove: Vec<usize>,

        /// 提出せずに内容だけ確認
        #[arg(long)]
        dry_run: bool,
    },

    /// プロフィール画像をアップロード
    Avatar {
        /// 画像ファイル（jpg/png/webp）
        #[arg(required = true)]
        image: PathBuf,
    },

    /// 設定を表示・変更
    Config {
        /// 現在の設定を表示
        #[arg(long)]
        show: bool,

        /// スタートアップIDを設定
        #[arg(long)]
        startup_id: Option<String>,
    },
}
