//! 対話式キャンバス編集
//!
//! セクションを選んで編集・保存し、一括保存や全削除も行える。
//! 未保存の変更がある状態で終了しようとすると確認する。

use crate::editor::{CanvasOverview, ClearOutcome, FieldEditor, SectionRow};
use crate::error::{CanvasError, Result};
use crate::store::SaveOutcome;
use dialoguer::{Confirm, Input, Select};
use pitch_canvas_common::Section;
use std::sync::Arc;

/// メニューで選べる操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Edit(Section),
    SaveAll,
    Clear,
    Quit,
}

const EXTRA_ACTIONS: [(&str, SessionAction); 3] = [
    ("💾 すべて保存", SessionAction::SaveAll),
    ("🗑  全データを削除", SessionAction::Clear),
    ("🚪 終了", SessionAction::Quit),
];

/// 一覧の1行を表示用に整形
pub fn row_label(row: &SectionRow) -> String {
    let status = if row.complete { "✔" } else { "・" };
    let dirty = if row.dirty { " *未保存" } else { "" };
    format!("{} {}{}", status, row.title, dirty)
}

/// メニュー項目（セクション → 追加操作の順）
pub fn menu_items(rows: &[SectionRow]) -> Vec<String> {
    rows.iter()
        .map(row_label)
        .chain(EXTRA_ACTIONS.iter().map(|(label, _)| label.to_string()))
        .collect()
}

/// メニューの選択位置を操作に変換
pub fn action_for_index(index: usize) -> Option<SessionAction> {
    match Section::ALL.get(index) {
        Some(&section) => Some(SessionAction::Edit(section)),
        None => EXTRA_ACTIONS
            .get(index - Section::ALL.len())
            .map(|(_, action)| *action),
    }
}

/// 一覧を表示する
pub fn print_overview(overview: &CanvasOverview) {
    println!(
        "📋 完了: {}/{} ({:.0}%)",
        overview.completed_count(),
        Section::ALL.len(),
        overview.completion_percentage() * 100.0
    );
    for row in overview.rows() {
        println!("  {}", row_label(&row));
    }
    if overview.has_unsaved_changes() {
        println!("\n⚠ 未保存の変更があります");
    }
}

fn prompt_error(e: dialoguer::Error) -> CanvasError {
    CanvasError::Prompt(e.to_string())
}

/// 端末入力はブロッキングなのでランタイムに知らせて実行する
fn blocking_prompt<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    tokio::task::block_in_place(f)
}

fn select_action(overview: &CanvasOverview) -> Result<SessionAction> {
    let items = menu_items(&overview.rows());
    let index = blocking_prompt(|| {
        Select::new()
            .with_prompt("操作を選択")
            .items(&items)
            .default(0)
            .interact()
            .map_err(prompt_error)
    })?;
    action_for_index(index).ok_or(CanvasError::InvalidIndex(index))
}

fn confirm(prompt: &str, default: bool) -> Result<bool> {
    blocking_prompt(|| {
        Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(prompt_error)
    })
}

/// 1セクションを入力させる。現在値を初期値にする
pub fn prompt_section_text(section: Section, current: &str) -> Result<String> {
    println!("\n{}", section.title());
    println!("  {}", section.hint());
    let prompt = section.title().to_string();
    let current = current.to_string();
    blocking_prompt(move || {
        Input::<String>::new()
            .with_prompt(prompt)
            .with_initial_text(current)
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)
    })
}

async fn edit_section(overview: &CanvasOverview, section: Section) -> Result<()> {
    let editor = FieldEditor::activate(Arc::clone(overview.store()), section);
    let text = prompt_section_text(section, &editor.text())?;
    editor.on_edit(text);

    if !editor.is_dirty() {
        println!("  → 変更なし\n");
        editor.deactivate();
        return Ok(());
    }

    let outcome = editor.save().await;
    if let Some(banner) = editor.take_banner() {
        println!("  → {}\n", banner);
    }
    editor.deactivate();

    match outcome {
        Ok(SaveOutcome::Saved) | Ok(SaveOutcome::Skipped(_)) => Ok(()),
        // 保存失敗は表示済み。変更は未保存のまま残る
        Err(CanvasError::Persistence(_)) => Ok(()),
        Err(err) => Err(err),
    }
}

async fn save_all(overview: &CanvasOverview) -> Result<()> {
    let report = overview.save_all().await?;
    match overview.take_banner() {
        Some(banner) => println!("  → {}\n", banner),
        None if report.is_empty() => println!("  → 保存する変更はありません\n"),
        None => {}
    }
    Ok(())
}

async fn clear(overview: &CanvasOverview) -> Result<()> {
    overview.open_clear_dialog();
    if !confirm("キャンバスの全データを削除します。よろしいですか？", false)? {
        overview.cancel_clear_dialog();
        println!("  → キャンセルしました\n");
        return Ok(());
    }

    let outcome = overview.confirm_clear().await;
    if let Some(banner) = overview.take_banner() {
        println!("  → {}\n", banner);
    }
    match outcome {
        Ok(ClearOutcome::Cleared) | Ok(ClearOutcome::NotRequested) => Ok(()),
        Err(CanvasError::Persistence(_)) => Ok(()),
        Err(err) => Err(err),
    }
}

/// 対話セッションを実行する
pub async fn run_session(overview: &CanvasOverview) -> Result<()> {
    println!("🧭 pitch-canvas - 対話編集\n");
    println!("---");

    loop {
        print_overview(overview);
        println!("---");

        match select_action(overview)? {
            SessionAction::Edit(section) => edit_section(overview, section).await?,
            SessionAction::SaveAll => save_all(overview).await?,
            SessionAction::Clear => clear(overview).await?,
            SessionAction::Quit => {
                if overview.has_unsaved_changes()
                    && confirm("未保存の変更があります。保存してから終了しますか？", true)?
                {
                    save_all(overview).await?;
                }
                println!("終了します");
                break;
            }
        }
    }

    overview.deactivate();
    Ok(())
}
