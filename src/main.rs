use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pitch_canvas::{cli, config, editor, error, logging, profile, session, store, upload};
use cli::{Cli, Commands};
use config::Config;
use editor::{CanvasOverview, FieldEditor};
use error::{CanvasError, Result};
use pitch_canvas_common::{Section, Thumbnail};
use std::path::PathBuf;
use std::sync::Arc;
use store::{CanvasStore, JsonFileBackend, SaveOutcome};
use upload::{
    DirectorySubmitter, ExternalThumbnailer, FilePicker, FolderPicker, PathListPicker,
    PitchDeckScreen,
};

fn open_store(config: &Config) -> Result<Arc<CanvasStore>> {
    let data_dir = config.resolved_data_dir()?;
    let backend = JsonFileBackend::new(&data_dir, &config.startup_id);
    Ok(CanvasStore::new(Arc::new(backend)))
}

fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar
}

async fn run_deck(
    config: &Config,
    files: Vec<PathBuf>,
    folder: Option<PathBuf>,
    remove: Vec<usize>,
    dry_run: bool,
) -> Result<()> {
    println!("📤 pitch-canvas - ピッチデッキ提出\n");

    let picker: Arc<dyn FilePicker> = match folder {
        Some(folder) => Arc::new(FolderPicker::new(folder)),
        None => Arc::new(PathListPicker::new(files)),
    };
    let thumbnailer = ExternalThumbnailer::new(config.thumbnail_cache_dir()?)
        .with_binaries(&config.pdftoppm_bin, &config.ffmpeg_bin)
        .with_size(config.thumbnail_width, config.thumbnail_height);
    let submitter =
        DirectorySubmitter::new(config.resolved_submission_dir()?, &config.startup_id);
    let screen = PitchDeckScreen::new(picker, Arc::new(thumbnailer), Arc::new(submitter));

    // 1. ファイル選択
    println!("[1/3] ファイルを選択中...");
    let picked = screen.pick_files().await?;
    if picked.cancelled {
        println!("ファイルが選択されませんでした");
        return Ok(());
    }
    if let Some(banner) = screen.take_banner() {
        println!("{}", banner);
    }
    println!("✔ {}件を受付\n", picked.accepted.len());

    // 2. サムネイル生成
    println!("[2/3] サムネイルを生成中...");
    let bar = progress_bar(picked.accepted.len());
    let progress = bar.clone();
    screen
        .process_accepted_with(picked.accepted, move |entry| {
            progress.set_message(entry.file.name.clone());
            progress.inc(1);
        })
        .await?;
    bar.finish_and_clear();

    // 後ろから削除して番号のずれを防ぐ
    let mut remove = remove;
    remove.sort_unstable_by(|a, b| b.cmp(a));
    remove.dedup();
    for number in remove {
        let index = number.checked_sub(1).ok_or(CanvasError::InvalidIndex(number))?;
        let entry = screen.remove_file(index)?;
        println!("- 除外: {}", entry.file.name);
    }

    for (i, entry) in screen.batch().entries().iter().enumerate() {
        let preview = match &entry.thumbnail {
            Thumbnail::Rendered(path) => path.display().to_string(),
            Thumbnail::Placeholder(kind) => format!("({})", kind.placeholder_icon()),
        };
        println!("  {:>2}. {} [{}] {}", i + 1, entry.file.name, entry.kind.as_str(), preview);
    }
    println!("✔ {}件を準備\n", screen.len());

    if dry_run {
        println!("(dry-run) 提出はスキップしました");
        return Ok(());
    }

    // 3. 提出
    println!("[3/3] 提出中...");
    let result = screen.submit().await;
    if let Some(banner) = screen.take_banner() {
        println!("{}", banner);
    }
    let receipt = result?;
    println!("✔ 提出先: {}", receipt.location);

    println!("\n✅ 提出完了");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Show => {
            let overview = CanvasOverview::new(open_store(&config)?);
            overview.load().await?;
            println!("📋 pitch-canvas - {}\n", config.startup_id);
            session::print_overview(&overview);
        }

        Commands::Edit { section, text } => {
            let section: Section = section
                .parse()
                .map_err(|_| CanvasError::UnknownSection(section.clone()))?;
            let store = open_store(&config)?;
            store.load().await?;

            let editor = FieldEditor::activate(store, section);
            let text = match text {
                Some(text) => text,
                None => session::prompt_section_text(section, &editor.text())?,
            };
            editor.on_edit(text);

            let outcome = editor.save().await;
            if let Some(banner) = editor.take_banner() {
                println!("{}", banner);
            }
            if let Ok(SaveOutcome::Skipped(_)) = outcome {
                println!("変更はありません");
            }
            outcome?;
        }

        Commands::Session => {
            let overview = CanvasOverview::new(open_store(&config)?);
            overview.load().await?;
            session::run_session(&overview).await?;
        }

        Commands::Clear { yes } => {
            let overview = CanvasOverview::new(open_store(&config)?);
            overview.load().await?;
            overview.open_clear_dialog();

            let confirmed = yes
                || tokio::task::block_in_place(|| {
                    dialoguer::Confirm::new()
                        .with_prompt("キャンバスの全データを削除します。よろしいですか？")
                        .default(false)
                        .interact()
                        .map_err(|e| CanvasError::Prompt(e.to_string()))
                })?;
            if !confirmed {
                overview.cancel_clear_dialog();
                println!("キャンセルしました");
                return Ok(());
            }

            let outcome = overview.confirm_clear().await;
            if let Some(banner) = overview.take_banner() {
                println!("{}", banner);
            }
            outcome?;
        }

        Commands::Deck {
            files,
            folder,
            remove,
            dry_run,
        } => {
            run_deck(&config, files, folder, remove, dry_run).await?;
        }

        Commands::Avatar { image } => {
            println!("🖼  pitch-canvas - プロフィール画像\n");
            let storage = profile::FileAvatarStorage::new(config.resolved_data_dir()?);
            let uploader = profile::AvatarUploader::new(Arc::new(storage), config.avatar_size);
            let location = uploader.upload(&image).await?;
            println!("✔ 保存しました: {}", location);
        }

        Commands::Config { show, startup_id } => {
            let mut config = config;

            if let Some(id) = startup_id {
                config.set_startup_id(id)?;
                println!("✔ スタートアップIDを設定しました");
            }

            if show {
                println!("設定:");
                println!("  スタートアップID: {}", config.startup_id);
                println!("  データ保存先: {}", config.resolved_data_dir()?.display());
                println!("  提出先: {}", config.resolved_submission_dir()?.display());
                println!(
                    "  サムネイル: {}x{}px",
                    config.thumbnail_width, config.thumbnail_height
                );
                println!("  アバター: {}px", config.avatar_size);
            }
        }
    }

    Ok(())
}
