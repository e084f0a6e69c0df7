//! 어드바이저 응답 파싱
//!
//! 모델이 돌려준 텍스트를 타입 있는 구조로 변환합니다.
//! Modify 외에는 실패 시 기본값을 돌려주며 에러를 올리지 않습니다.

use serde::Deserialize;
use serde_json::Value;

use super::AdvisorError;
use crate::models::{
    AnalysisReport, AnalysisSection, Classification, DerivedAnalysis, ModificationResult,
    PresetInfo, Stats, Suggestion,
};

pub const DEFAULT_EXPLANATION: &str = "Modified the Minecraft JSON.";
pub const PLACEHOLDER_OVERVIEW: &str = "No summary available.";

/// ```json ... ``` 코드펜스 제거
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // 첫 줄의 언어 태그(json 등) 건너뛰기
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn parse_value(text: &str) -> Option<Value> {
    serde_json::from_str(strip_code_fence(text)).ok()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModifyWire {
    updated_json: Option<Value>,
    explanation: Option<String>,
    detected_type: Option<Classification>,
    stats: Option<Value>,
}

/// Modify 응답 파싱 (실패 시 에러)
pub fn parse_modification(text: &str) -> Result<ModificationResult, AdvisorError> {
    let wire: ModifyWire = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| AdvisorError::MalformedResponse(format!("modify: {}", e)))?;

    let updated_json = match wire.updated_json {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        // 모델이 문자열 대신 객체를 그대로 넣어 보내는 경우
        Some(v @ (Value::Object(_) | Value::Array(_))) => serde_json::to_string(&v)
            .map_err(|e| AdvisorError::MalformedResponse(e.to_string()))?,
        _ => {
            return Err(AdvisorError::MalformedResponse(
                "modify: updatedJson is missing".to_string(),
            ))
        }
    };

    let explanation = wire
        .explanation
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EXPLANATION.to_string());

    Ok(ModificationResult {
        updated_json,
        explanation,
        detected_type: wire.detected_type,
        stats: wire.stats.map(stats_from_value).filter(|s| !s.is_empty()),
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeWire {
    overview: Option<String>,
    detected_type: Option<Classification>,
    #[serde(default)]
    sections: Vec<Value>,
}

/// Analyze 응답 파싱
pub fn parse_analysis(text: &str) -> AnalysisReport {
    let Some(wire) = parse_value(text).and_then(|v| serde_json::from_value::<AnalyzeWire>(v).ok())
    else {
        tracing::warn!("[Advisor] Failed to parse analysis response, using placeholder");
        return placeholder_analysis();
    };

    let sections = wire
        .sections
        .into_iter()
        .filter_map(|v| serde_json::from_value::<AnalysisSection>(v).ok())
        .filter(|s| !s.header.trim().is_empty())
        .collect();

    AnalysisReport {
        classification: wire.detected_type.unwrap_or_default(),
        analysis: DerivedAnalysis {
            overview: wire
                .overview
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| PLACEHOLDER_OVERVIEW.to_string()),
            sections,
        },
    }
}

pub fn placeholder_analysis() -> AnalysisReport {
    AnalysisReport {
        classification: Classification::Unknown,
        analysis: DerivedAnalysis {
            overview: PLACEHOLDER_OVERVIEW.to_string(),
            sections: Vec::new(),
        },
    }
}

/// ExtractStats 응답 파싱
pub fn parse_stats(text: &str) -> Stats {
    match parse_value(text) {
        Some(value @ Value::Object(_)) => stats_from_value(value),
        _ => {
            tracing::warn!("[Advisor] Failed to parse stats response, using empty stats");
            Stats::default()
        }
    }
}

/// 항목별로 관대하게 변환: 숫자가 아니면 해당 지표만 버림
fn stats_from_value(value: Value) -> Stats {
    let Value::Object(map) = value else {
        return Stats::default();
    };
    let num = |key: &str| map.get(key).and_then(Value::as_f64);
    Stats {
        health: num("health"),
        speed: num("speed"),
        attack: num("attack"),
        richness: num("richness"),
        complexity: num("complexity"),
        efficiency: num("efficiency"),
        power: num("power"),
    }
    .clamped()
}

/// SuggestElements 응답 파싱
pub fn parse_suggestions(text: &str) -> Vec<Suggestion> {
    let items = match parse_value(text) {
        Some(Value::Object(mut map)) => match map.remove("items") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        Some(Value::Array(items)) => items,
        _ => {
            tracing::warn!("[Advisor] Failed to parse suggestions response, using empty list");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|v| serde_json::from_value::<Suggestion>(v).ok())
        .filter(|s| !s.name.trim().is_empty())
        .collect()
}

/// GetPresets 응답 파싱
pub fn parse_presets(text: &str) -> PresetInfo {
    match parse_value(text).and_then(|v| serde_json::from_value::<PresetInfo>(v).ok()) {
        Some(mut info) => {
            info.presets.retain(|p| !p.value.trim().is_empty());
            info
        }
        None => {
            tracing::warn!("[Advisor] Failed to parse presets response, using empty presets");
            PresetInfo::default()
        }
    }
}
