//! Config-Action Workflow
//!
//! 추천 요소를 문서에 추가하는 모달의 상태 머신.
//!
//! `Closed → PresetsLoading → PresetsReady → Closed`
//!
//! 프리셋 조회는 ticket으로 태깅되어, 닫거나 다른 요소로 다시 열린 뒤 도착한
//! 응답은 버려집니다.

use serde::Serialize;

use crate::error::{ArchitectError, Result};
use crate::models::{Preset, PresetInfo, Suggestion};

pub const DEFAULT_PROMPT_HEADING: &str = "Custom Configuration";

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigAction {
    Closed,
    PresetsLoading { item: Suggestion, ticket: u64 },
    PresetsReady { item: Suggestion, info: PresetInfo },
}

/// 프론트엔드에 보여줄 모달 상태
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigActionView {
    pub status: ConfigActionStatus,
    pub item: Option<Suggestion>,
    pub presets: Vec<Preset>,
    pub prompt_heading: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfigActionStatus {
    Closed,
    PresetsLoading,
    PresetsReady,
}

#[derive(Debug)]
pub struct ConfigActionMachine {
    state: ConfigAction,
    next_ticket: u64,
}

impl Default for ConfigActionMachine {
    fn default() -> Self {
        Self {
            state: ConfigAction::Closed,
            next_ticket: 1,
        }
    }
}

impl ConfigActionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ConfigAction {
        &self.state
    }

    /// 요소를 선택해 모달 열기. 이전 상태(진행 중인 조회 포함)는 버림
    pub fn open(&mut self, item: Suggestion) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.state = ConfigAction::PresetsLoading { item, ticket };
        ticket
    }

    /// 프리셋 조회 완료. ticket이 현재 것이 아니면 무시하고 false
    pub fn presets_loaded(&mut self, ticket: u64, info: PresetInfo) -> bool {
        let item = match &self.state {
            ConfigAction::PresetsLoading { item, ticket: current } if *current == ticket => {
                item.clone()
            }
            _ => return false,
        };
        self.state = ConfigAction::PresetsReady { item, info };
        true
    }

    /// 프리셋 클릭 → 지시문 생성 후 닫힘
    pub fn resolve_preset(&mut self, index: usize) -> Result<String> {
        let ConfigAction::PresetsReady { item, info } = &self.state else {
            return Err(ArchitectError::InvalidOperation(
                "Presets are not ready".to_string(),
            ));
        };
        let preset = info.presets.get(index).ok_or_else(|| {
            ArchitectError::InvalidOperation(format!("Preset index out of range: {}", index))
        })?;

        let instruction = preset_instruction(item, &preset.value);
        self.close();
        Ok(instruction)
    }

    /// 직접 입력 제출 → 지시문 생성 후 닫힘. 공백 입력이면 None (상태 유지)
    pub fn resolve_custom(&mut self, text: &str) -> Result<Option<String>> {
        let ConfigAction::PresetsReady { item, .. } = &self.state else {
            return Err(ArchitectError::InvalidOperation(
                "Presets are not ready".to_string(),
            ));
        };
        if text.trim().is_empty() {
            return Ok(None);
        }

        let instruction = custom_instruction(item, text.trim());
        self.close();
        Ok(Some(instruction))
    }

    pub fn close(&mut self) {
        self.state = ConfigAction::Closed;
    }

    pub fn view(&self) -> ConfigActionView {
        match &self.state {
            ConfigAction::Closed => ConfigActionView {
                status: ConfigActionStatus::Closed,
                item: None,
                presets: Vec::new(),
                prompt_heading: DEFAULT_PROMPT_HEADING.to_string(),
            },
            ConfigAction::PresetsLoading { item, .. } => ConfigActionView {
                status: ConfigActionStatus::PresetsLoading,
                item: Some(item.clone()),
                presets: Vec::new(),
                prompt_heading: DEFAULT_PROMPT_HEADING.to_string(),
            },
            ConfigAction::PresetsReady { item, info } => ConfigActionView {
                status: ConfigActionStatus::PresetsReady,
                item: Some(item.clone()),
                presets: info.presets.clone(),
                prompt_heading: if info.suggested_prompt.trim().is_empty() {
                    DEFAULT_PROMPT_HEADING.to_string()
                } else {
                    info.suggested_prompt.clone()
                },
            },
        }
    }
}

pub fn preset_instruction(item: &Suggestion, value: &str) -> String {
    format!(
        "Add the {} \"{}\" configured as: {}",
        item.category.as_str().to_lowercase(),
        item.name,
        value
    )
}

pub fn custom_instruction(item: &Suggestion, details: &str) -> String {
    format!(
        "Add the {} \"{}\" with these details: {}",
        item.category.as_str().to_lowercase(),
        item.name,
        details
    )
}
