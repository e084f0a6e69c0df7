//! Architect Data Models
//!
//! 프론트엔드(TypeScript) 타입과 매핑되는 Rust 데이터 모델

use serde::{Deserialize, Serialize};

/// 문서 분류 (Bedrock 설정 파일 종류)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Entity,
    LootTable,
    Recipe,
    Block,
    Item,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Classification {
    pub const ALL: [Classification; 6] = [
        Classification::Entity,
        Classification::LootTable,
        Classification::Recipe,
        Classification::Block,
        Classification::Item,
        Classification::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Entity => "entity",
            Classification::LootTable => "loot_table",
            Classification::Recipe => "recipe",
            Classification::Block => "block",
            Classification::Item => "item",
            Classification::Unknown => "unknown",
        }
    }
}

/// 히스토리 엔트리 (커밋된 문서 상태 1개)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: i64,
    pub label: String,
    pub content: String,
}

/// 분석 섹션
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSection {
    pub header: String,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// 상세 분석 결과
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedAnalysis {
    pub overview: String,
    #[serde(default)]
    pub sections: Vec<AnalysisSection>,
}

/// Analyze 호출 결과 (분류 + 분석)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisReport {
    pub classification: Classification,
    pub analysis: DerivedAnalysis,
}

/// 수치 지표 (각 0~100, 분류에 따라 일부만 존재)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub richness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
}

impl Stats {
    /// 모든 지표를 [0, 100] 범위로 보정 (NaN은 제거)
    pub fn clamped(self) -> Self {
        fn clamp(v: Option<f64>) -> Option<f64> {
            v.filter(|x| x.is_finite()).map(|x| x.clamp(0.0, 100.0))
        }

        Stats {
            health: clamp(self.health),
            speed: clamp(self.speed),
            attack: clamp(self.attack),
            richness: clamp(self.richness),
            complexity: clamp(self.complexity),
            efficiency: clamp(self.efficiency),
            power: clamp(self.power),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Stats::default()
    }
}

/// 추천 요소 카테고리
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionCategory {
    Component,
    Behavior,
    Event,
    Property,
    LootEntry,
    RecipePattern,
}

impl SuggestionCategory {
    pub const ALL: [SuggestionCategory; 6] = [
        SuggestionCategory::Component,
        SuggestionCategory::Behavior,
        SuggestionCategory::Event,
        SuggestionCategory::Property,
        SuggestionCategory::LootEntry,
        SuggestionCategory::RecipePattern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionCategory::Component => "Component",
            SuggestionCategory::Behavior => "Behavior",
            SuggestionCategory::Event => "Event",
            SuggestionCategory::Property => "Property",
            SuggestionCategory::LootEntry => "LootEntry",
            SuggestionCategory::RecipePattern => "RecipePattern",
        }
    }
}

/// AI가 제안한 추가 요소
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: String,
    pub description: String,
    pub category: SuggestionCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// 요소 설정 프리셋
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub label: String,
    pub value: String,
}

/// GetPresets 호출 결과
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetInfo {
    #[serde(default)]
    pub presets: Vec<Preset>,
    #[serde(default)]
    pub suggested_prompt: String,
}

/// Modify 호출 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModificationResult {
    pub updated_json: String,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_type: Option<Classification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
}

/// 한 문서 세대에서 파생된 데이터 묶음 (통째로 교체됨)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedSnapshot {
    pub generation: u64,
    pub source: String,
    pub classification: Classification,
    pub analysis: DerivedAnalysis,
    pub stats: Stats,
    pub suggestions: Vec<Suggestion>,
    pub refreshed_at: i64,
}

/// 내보내기 파일
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub file_name: String,
    pub content: String,
}
