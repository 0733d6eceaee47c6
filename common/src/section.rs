//! ビジネスモデルキャンバスのセクション定義
//!
//! 9つのセクションを閉じた列挙型で表現する。
//! 表示メタデータ（タイトル・アイコン・ヒント）と完了判定は各バリアントが持つ。

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// キャンバスのセクション（BMCの標準順）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    KeyPartners,
    KeyActivities,
    KeyResources,
    ValuePropositions,
    CustomerRelationships,
    CustomerSegments,
    Channels,
    CostStructure,
    RevenueStreams,
}

impl Section {
    /// 全セクション（表示順）
    pub const ALL: [Section; 9] = [
        Section::KeyPartners,
        Section::KeyActivities,
        Section::KeyResources,
        Section::ValuePropositions,
        Section::CustomerRelationships,
        Section::CustomerSegments,
        Section::Channels,
        Section::CostStructure,
        Section::RevenueStreams,
    ];

    /// 永続化時の属性名
    pub fn key(&self) -> &'static str {
        match self {
            Section::KeyPartners => "keyPartners",
            Section::KeyActivities => "keyActivities",
            Section::KeyResources => "keyResources",
            Section::ValuePropositions => "valuePropositions",
            Section::CustomerRelationships => "customerRelationships",
            Section::CustomerSegments => "customerSegments",
            Section::Channels => "channels",
            Section::CostStructure => "costStructure",
            Section::RevenueStreams => "revenueStreams",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Section::KeyPartners => "Key Partners",
            Section::KeyActivities => "Key Activities",
            Section::KeyResources => "Key Resources",
            Section::ValuePropositions => "Value Propositions",
            Section::CustomerRelationships => "Customer Relationships",
            Section::CustomerSegments => "Customer Segments",
            Section::Channels => "Channels",
            Section::CostStructure => "Cost Structure",
            Section::RevenueStreams => "Revenue Streams",
        }
    }

    /// アイコン識別子
    pub fn icon(&self) -> &'static str {
        match self {
            Section::KeyPartners => "handshake",
            Section::KeyActivities => "task_alt",
            Section::KeyResources => "inventory",
            Section::ValuePropositions => "star",
            Section::CustomerRelationships => "favorite",
            Section::CustomerSegments => "groups",
            Section::Channels => "campaign",
            Section::CostStructure => "payments",
            Section::RevenueStreams => "trending_up",
        }
    }

    /// 未入力かつ非フォーカス時に表示するヒント
    pub fn hint(&self) -> &'static str {
        match self {
            Section::KeyPartners => "Who are your key partners and suppliers?",
            Section::KeyActivities => "What key activities does your value proposition require?",
            Section::KeyResources => "What key resources does your value proposition require?",
            Section::ValuePropositions => "What value do you deliver to the customer?",
            Section::CustomerRelationships => "What relationship does each customer segment expect?",
            Section::CustomerSegments => "For whom are you creating value?",
            Section::Channels => "Through which channels do your customers want to be reached?",
            Section::CostStructure => "What are the most important costs in your business model?",
            Section::RevenueStreams => "For what value are your customers willing to pay?",
        }
    }

    /// 完了判定: 前後の空白を除いて空でないこと
    pub fn is_complete(&self, value: &str) -> bool {
        !value.trim().is_empty()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

impl FromStr for Section {
    type Err = Error;

    /// キー・タイトル・kebab/snake形式を大文字小文字を無視して受け付ける
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(|c| c.to_lowercase())
            .collect();

        Section::ALL
            .iter()
            .copied()
            .find(|section| section.key().to_lowercase() == normalized)
            .ok_or_else(|| Error::UnknownSection(s.to_string()))
    }
}
