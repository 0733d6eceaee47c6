//! 未保存フィールドの集合

use crate::section::Section;
use std::collections::BTreeSet;

/// 最後に永続化された値と異なるセクションの集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyFieldSet {
    fields: BTreeSet<Section>,
}

impl DirtyFieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加。新規追加ならtrue
    pub fn mark(&mut self, section: Section) -> bool {
        self.fields.insert(section)
    }

    /// 削除。含まれていればtrue
    pub fn unmark(&mut self, section: Section) -> bool {
        self.fields.remove(&section)
    }

    pub fn contains(&self, section: Section) -> bool {
        self.fields.contains(&section)
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 表示順で列挙
    pub fn iter(&self) -> impl Iterator<Item = Section> + '_ {
        self.fields.iter().copied()
    }
}
