//! 画面の生存管理
//!
//! 非同期処理は最初の await の前にトークンを取得し、
//! 完了後に `is_live()` を確認してから画面状態を更新する。
//! 一度閉じた画面は再び有効にならない。

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// 画面ごとの世代カウンタ
#[derive(Debug, Clone, Default)]
pub struct ScreenLifetime {
    generation: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

/// 取得時点の世代
#[derive(Debug, Clone)]
pub struct ActivationToken {
    generation: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
    captured: u64,
}

impl ScreenLifetime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> ActivationToken {
        ActivationToken {
            generation: Arc::clone(&self.generation),
            closed: Arc::clone(&self.closed),
            captured: self.generation.load(Ordering::Acquire),
        }
    }

    /// 画面破棄。発行済みトークンも以降に取得するトークンも無効になる
    pub fn deactivate(&self) {
        self.closed.store(true, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl ActivationToken {
    pub fn is_live(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
            && self.generation.load(Ordering::Acquire) == self.captured
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_live_until_deactivated() {
        let lifetime = ScreenLifetime::new();
        let token = lifetime.token();
        assert!(token.is_live());

        lifetime.deactivate();
        assert!(!token.is_live());
    }

    /// 閉じた後に取得したトークンも無効
    #[test]
    fn test_token_after_deactivate_is_dead() {
        let lifetime = ScreenLifetime::new();
        let old = lifetime.token();
        lifetime.deactivate();
        let fresh = lifetime.token();

        assert!(lifetime.is_closed());
        assert!(!old.is_live());
        assert!(!fresh.is_live());
    }

    #[test]
    fn test_clones_share_generation() {
        let lifetime = ScreenLifetime::new();
        let view_copy = lifetime.clone();
        let token = lifetime.token();
        view_copy.deactivate();
        assert!(!token.is_live());
    }
}
