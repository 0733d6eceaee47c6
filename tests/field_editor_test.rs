//! セクション編集画面のテスト
//!
//! 未保存判定・保存・保存失敗・画面破棄中の保存を検証

mod support;

use pitch_canvas::banner::BannerKind;
use pitch_canvas::editor::FieldEditor;
use pitch_canvas::error::CanvasError;
use pitch_canvas::store::{CanvasEvent, SaveOutcome, SkipReason};
use pitch_canvas_common::{CanvasDocument, Section};
use std::sync::Arc;
use support::{loaded_store, FakePersistence};

fn document_with(section: Section, value: &str) -> CanvasDocument {
    let mut doc = CanvasDocument::default();
    doc.set(section, value);
    doc
}

/// 開いた時点で保存済みの値が表示される
#[tokio::test]
async fn test_activate_loads_current_value() {
    let fake = FakePersistence::with_document(document_with(Section::Channels, "Web"));
    let store = loaded_store(fake).await;

    let editor = FieldEditor::activate(store, Section::Channels);
    assert_eq!(editor.text(), "Web");
    assert_eq!(editor.title(), "Channels");
    assert!(!editor.is_dirty());
}

/// 保存済みの値に戻すと未保存ではなくなる（全セクション）
#[tokio::test]
async fn test_edit_back_to_persisted_value_is_clean() {
    let mut doc = CanvasDocument::default();
    for section in Section::ALL {
        doc.set(section, format!("saved {}", section.key()));
    }
    let store = loaded_store(FakePersistence::with_document(doc)).await;

    for section in Section::ALL {
        let editor = FieldEditor::activate(Arc::clone(&store), section);
        let original = editor.text();

        editor.on_edit("changed");
        assert!(editor.is_dirty(), "{} should be dirty", section);

        editor.on_edit(original);
        assert!(!editor.is_dirty(), "{} should be clean", section);
    }
    assert!(!store.has_unsaved_changes());
}

/// 未変更なら保存しない
#[tokio::test]
async fn test_save_on_clean_field_is_noop() {
    let fake = FakePersistence::new();
    let store = loaded_store(Arc::clone(&fake)).await;
    let editor = FieldEditor::activate(store, Section::KeyPartners);

    assert!(!editor.can_save());
    let outcome = editor.save().await.unwrap();
    assert_eq!(outcome, SaveOutcome::Skipped(SkipReason::Clean));
    assert!(fake.save_calls().is_empty());
    assert!(editor.banner().is_none());
}

/// 保存中の2回目の保存は無視される
#[tokio::test]
async fn test_second_save_while_in_flight_is_noop() {
    let fake = FakePersistence::new();
    let store = loaded_store(Arc::clone(&fake)).await;
    let editor = Arc::new(FieldEditor::activate(store, Section::KeyActivities));
    editor.on_edit("Build product");

    let gate = fake.hold_saves();
    let first = {
        let editor = Arc::clone(&editor);
        tokio::spawn(async move { editor.save().await })
    };
    gate.entered.notified().await;

    assert!(editor.is_saving());
    assert!(!editor.can_save());
    let second = editor.save().await.unwrap();
    assert_eq!(second, SaveOutcome::Skipped(SkipReason::AlreadySaving));

    gate.release.notify_one();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first, SaveOutcome::Saved);
    assert_eq!(fake.save_calls().len(), 1);
    assert!(!editor.is_saving());
}

/// 保存成功後は未保存でなく、保存値は永続化先に渡した値と一致する
#[tokio::test]
async fn test_successful_save_clears_dirty() {
    let fake = FakePersistence::new();
    let store = loaded_store(Arc::clone(&fake)).await;
    let editor = FieldEditor::activate(Arc::clone(&store), Section::ValuePropositions);

    editor.on_edit("Faster onboarding");
    assert!(editor.can_save());
    let outcome = editor.save().await.unwrap();

    assert_eq!(outcome, SaveOutcome::Saved);
    assert!(!editor.is_dirty());
    assert_eq!(
        fake.save_calls(),
        vec![(Section::ValuePropositions, "Faster onboarding".to_string())]
    );
    assert_eq!(store.persisted_value(Section::ValuePropositions), "Faster onboarding");

    let banner = editor.banner().unwrap();
    assert_eq!(banner.kind, BannerKind::Success);
    assert_eq!(banner.message, "Value Propositionsを保存しました");
}

/// 保存失敗時は未保存のまま、値も変わらず、エラー文言がそのまま表示される
#[tokio::test]
async fn test_failed_save_keeps_dirty_and_value() {
    let fake = FakePersistence::new();
    let store = loaded_store(Arc::clone(&fake)).await;
    let editor = FieldEditor::activate(Arc::clone(&store), Section::CostStructure);

    editor.on_edit("Servers");
    fake.fail_all("quota exceeded");
    let err = editor.save().await.unwrap_err();

    assert!(matches!(err, CanvasError::Persistence(ref m) if m == "quota exceeded"));
    assert!(editor.is_dirty());
    assert_eq!(editor.text(), "Servers");
    assert_eq!(store.value(Section::CostStructure), "Servers");
    assert_eq!(store.persisted_value(Section::CostStructure), "");
    assert_eq!(store.last_error().as_deref(), Some("quota exceeded"));

    let banner = editor.take_banner().unwrap();
    assert!(banner.is_error());
    assert_eq!(banner.message, "quota exceeded");

    // 再試行で保存できる
    fake.recover();
    assert_eq!(editor.save().await.unwrap(), SaveOutcome::Saved);
    assert!(!editor.is_dirty());
}

/// 保存中に入力された変更は未保存のまま残る
#[tokio::test]
async fn test_edit_during_save_stays_dirty() {
    let fake = FakePersistence::new();
    let store = loaded_store(Arc::clone(&fake)).await;
    let editor = Arc::new(FieldEditor::activate(Arc::clone(&store), Section::Channels));
    editor.on_edit("Web");

    let gate = fake.hold_saves();
    let pending = {
        let editor = Arc::clone(&editor);
        tokio::spawn(async move { editor.save().await })
    };
    gate.entered.notified().await;
    editor.on_edit("Web and retail");
    gate.release.notify_one();

    assert_eq!(pending.await.unwrap().unwrap(), SaveOutcome::Saved);
    assert_eq!(store.persisted_value(Section::Channels), "Web");
    assert!(editor.is_dirty());
}

/// ヒントは未入力かつ非フォーカスのときだけ表示
#[tokio::test]
async fn test_hint_visibility_follows_focus_and_text() {
    let store = loaded_store(FakePersistence::new()).await;
    let editor = FieldEditor::activate(store, Section::CustomerSegments);

    assert!(editor.hint_visible());
    assert_eq!(editor.hint_text(), Section::CustomerSegments.hint());

    editor.on_focus_changed(true);
    assert!(!editor.hint_visible());
    assert!(!editor.is_dirty());

    editor.on_focus_changed(false);
    editor.on_edit("SMBs");
    assert!(!editor.hint_visible());

    editor.on_edit("");
    assert!(editor.hint_visible());
}

/// 保存中に画面を閉じても保存は完了し、表示は更新されない
#[tokio::test]
async fn test_deactivate_during_save() {
    let fake = FakePersistence::new();
    let store = loaded_store(Arc::clone(&fake)).await;
    let editor = Arc::new(FieldEditor::activate(Arc::clone(&store), Section::RevenueStreams));
    editor.on_edit("Subscriptions");

    let gate = fake.hold_saves();
    let pending = {
        let editor = Arc::clone(&editor);
        tokio::spawn(async move { editor.save().await })
    };
    gate.entered.notified().await;
    editor.deactivate();
    gate.release.notify_one();

    assert_eq!(pending.await.unwrap().unwrap(), SaveOutcome::Saved);
    assert!(!store.is_dirty(Section::RevenueStreams));
    assert!(editor.banner().is_none());
    assert!(!editor.is_active());

    // 閉じた画面への入力は無視される
    editor.on_edit("ignored");
    assert_eq!(store.value(Section::RevenueStreams), "Subscriptions");
}

/// 閉じた画面からの保存は永続化もバナー表示もしない
#[tokio::test]
async fn test_save_after_deactivate_is_skipped() {
    let fake = FakePersistence::new();
    let store = loaded_store(Arc::clone(&fake)).await;
    let editor = FieldEditor::activate(Arc::clone(&store), Section::KeyPartners);
    editor.on_edit("Banks");
    editor.deactivate();

    assert!(!editor.can_save());
    let outcome = editor.save().await.unwrap();
    assert_eq!(outcome, SaveOutcome::Skipped(SkipReason::Closed));
    assert!(fake.save_calls().is_empty());
    assert!(store.is_dirty(Section::KeyPartners));
    assert!(editor.banner().is_none());
}

/// 保存中は再読み込みで作業コピーを上書きしない
#[tokio::test]
async fn test_load_rejected_while_saving() {
    let fake = FakePersistence::new();
    let store = loaded_store(Arc::clone(&fake)).await;
    store.edit(Section::Channels, "Web");

    let gate = fake.hold_saves();
    let pending = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.save_field(Section::Channels).await })
    };
    gate.entered.notified().await;

    assert!(matches!(store.load().await, Err(CanvasError::SaveInFlight)));
    assert!(!store.is_loading());
    assert_eq!(store.value(Section::Channels), "Web");

    gate.release.notify_one();
    assert_eq!(pending.await.unwrap().unwrap(), SaveOutcome::Saved);
    assert_eq!(store.persisted_value(Section::Channels), "Web");
    assert!(!store.is_dirty(Section::Channels));
}

/// 他の画面で全削除されたら表示中の値も空になる
#[tokio::test]
async fn test_sync_after_clear_refreshes_buffer() {
    let fake = FakePersistence::with_document(document_with(Section::KeyResources, "Team"));
    let store = loaded_store(fake).await;
    let editor = FieldEditor::activate(Arc::clone(&store), Section::KeyResources);
    assert_eq!(editor.text(), "Team");

    let request = store.request_clear();
    store.confirm_clear(request).await.unwrap();

    assert!(editor.sync() >= 1);
    assert_eq!(editor.text(), "");
    assert!(editor.hint_visible());
}

/// 状態ホルダは変更を購読者に通知する
#[tokio::test]
async fn test_store_notifies_subscribers() {
    let store = loaded_store(FakePersistence::new()).await;
    let mut events = store.subscribe();

    store.edit(Section::Channels, "Partners");
    store.save_field(Section::Channels).await.unwrap();

    assert_eq!(events.recv().await.unwrap(), CanvasEvent::FieldChanged(Section::Channels));
    assert_eq!(events.recv().await.unwrap(), CanvasEvent::FieldSaved(Section::Channels));
}

/// 読み込み失敗はエラー文言を返し、状態は空のまま
#[tokio::test]
async fn test_load_failure_is_surfaced() {
    let fake = FakePersistence::new();
    fake.fail_all("backend offline");
    let store = pitch_canvas::store::CanvasStore::new(fake);

    let err = store.load().await.unwrap_err();
    assert_eq!(err.to_string(), "backend offline");
    assert!(!store.is_loading());
    assert_eq!(store.completed_count(), 0);
}
