//! キャンバス文書の型定義

use crate::section::Section;
use serde::{Deserialize, Serialize};

/// スタートアップ1社分のビジネスモデルキャンバス
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasDocument {
    pub key_partners: String,
    pub key_activities: String,
    pub key_resources: String,
    pub value_propositions: String,
    pub customer_relationships: String,
    pub customer_segments: String,
    pub channels: String,
    pub cost_structure: String,
    pub revenue_streams: String,
}

impl CanvasDocument {
    pub fn get(&self, section: Section) -> &str {
        match section {
            Section::KeyPartners => &self.key_partners,
            Section::KeyActivities => &self.key_activities,
            Section::KeyResources => &self.key_resources,
            Section::ValuePropositions => &self.value_propositions,
            Section::CustomerRelationships => &self.customer_relationships,
            Section::CustomerSegments => &self.customer_segments,
            Section::Channels => &self.channels,
            Section::CostStructure => &self.cost_structure,
            Section::RevenueStreams => &self.revenue_streams,
        }
    }

    pub fn set(&mut self, section: Section, value: impl Into<String>) {
        let slot = match section {
            Section::KeyPartners => &mut self.key_partners,
            Section::KeyActivities => &mut self.key_activities,
            Section::KeyResources => &mut self.key_resources,
            Section::ValuePropositions => &mut self.value_propositions,
            Section::CustomerRelationships => &mut self.customer_relationships,
            Section::CustomerSegments => &mut self.customer_segments,
            Section::Channels => &mut self.channels,
            Section::CostStructure => &mut self.cost_structure,
            Section::RevenueStreams => &mut self.revenue_streams,
        };
        *slot = value.into();
    }

    pub fn is_complete(&self, section: Section) -> bool {
        section.is_complete(self.get(section))
    }

    /// 入力済みセクション数
    pub fn completed_count(&self) -> usize {
        Section::ALL.iter().filter(|s| self.is_complete(**s)).count()
    }

    /// 完了率（0.0〜1.0）
    pub fn completion_percentage(&self) -> f64 {
        self.completed_count() as f64 / Section::ALL.len() as f64
    }

    /// 全セクションが空かどうか
    pub fn is_empty(&self) -> bool {
        Section::ALL.iter().all(|s| self.get(*s).is_empty())
    }

    /// (セクション, 値) の組を表示順で返す
    pub fn entries(&self) -> impl Iterator<Item = (Section, &str)> + '_ {
        Section::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}
