//! Config-Action Commands
//!
//! 추천 요소 설정 모달 관련 Tauri 명령어

use serde::Deserialize;
use tauri::State;

use crate::commands::AppSession;
use crate::error::{CommandError, CommandResult};
use crate::models::Suggestion;
use crate::session::config_action::ConfigActionView;
use crate::session::EditOutcome;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenConfigActionArgs {
    pub item: Suggestion,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyPresetArgs {
    pub index: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCustomArgs {
    pub text: String,
}

/// 모달 열기 + 프리셋 조회 (조회 실패 시 빈 프리셋)
#[tauri::command]
pub async fn open_config_action(
    args: OpenConfigActionArgs,
    session: State<'_, AppSession>,
) -> CommandResult<ConfigActionView> {
    Ok(session.0.open_config_action(args.item).await)
}

/// 현재 모달 상태
#[tauri::command]
pub async fn get_config_action(session: State<'_, AppSession>) -> CommandResult<ConfigActionView> {
    Ok(session.0.config_action().await)
}

/// 프리셋 적용
#[tauri::command]
pub async fn apply_config_preset(
    args: ApplyPresetArgs,
    session: State<'_, AppSession>,
) -> CommandResult<Option<EditOutcome>> {
    session
        .0
        .apply_config_preset(args.index)
        .await
        .map_err(CommandError::from)
}

/// 직접 입력 적용
#[tauri::command]
pub async fn apply_config_custom(
    args: ApplyCustomArgs,
    session: State<'_, AppSession>,
) -> CommandResult<Option<EditOutcome>> {
    session
        .0
        .apply_config_custom(&args.text)
        .await
        .map_err(CommandError::from)
}

/// 모달 닫기 (진행 중인 조회 결과는 버려짐)
#[tauri::command]
pub async fn close_config_action(session: State<'_, AppSession>) -> CommandResult<()> {
    session.0.close_config_action().await;
    Ok(())
}
