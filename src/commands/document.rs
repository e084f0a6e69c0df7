//! Document Commands
//!
//! 문서 로드/수정/되돌리기/내보내기 관련 Tauri 명령어

use serde::Deserialize;
use tauri::State;

use crate::commands::AppSession;
use crate::error::{CommandError, CommandResult};
use crate::models::ExportFile;
use crate::session::{EditOutcome, SessionSnapshot};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadDocumentArgs {
    pub text: String,
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyInstructionArgs {
    pub instruction: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreEntryArgs {
    pub index: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDraftArgs {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPathArgs {
    pub path: String,
}

/// 붙여넣기/업로드한 JSON 로드
#[tauri::command]
pub async fn load_document(
    args: LoadDocumentArgs,
    session: State<'_, AppSession>,
) -> CommandResult<EditOutcome> {
    let label = args
        .label
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| "Import".to_string());
    session
        .0
        .load_document(&args.text, &label)
        .await
        .map_err(CommandError::from)
}

/// 자연어 지시문 적용 (문서가 없거나 지시문이 비었으면 null)
#[tauri::command]
pub async fn apply_instruction(
    args: ApplyInstructionArgs,
    session: State<'_, AppSession>,
) -> CommandResult<Option<EditOutcome>> {
    session
        .0
        .apply_instruction(&args.instruction)
        .await
        .map_err(CommandError::from)
}

/// 되돌리기
#[tauri::command]
pub async fn undo(session: State<'_, AppSession>) -> CommandResult<EditOutcome> {
    session.0.undo().await.map_err(CommandError::from)
}

/// 히스토리 엔트리 복원
#[tauri::command]
pub async fn restore_entry(
    args: RestoreEntryArgs,
    session: State<'_, AppSession>,
) -> CommandResult<EditOutcome> {
    session
        .0
        .restore_entry(args.index)
        .await
        .map_err(CommandError::from)
}

/// 에디터 입력 보관 (검증 없음)
#[tauri::command]
pub async fn update_draft(
    args: UpdateDraftArgs,
    session: State<'_, AppSession>,
) -> CommandResult<()> {
    session.0.update_draft(args.text).await;
    Ok(())
}

/// 에디터 입력을 문서로 반영
#[tauri::command]
pub async fn sync_draft(session: State<'_, AppSession>) -> CommandResult<EditOutcome> {
    session.0.sync_draft().await.map_err(CommandError::from)
}

/// 파생 데이터 재계산 (이전 실패 후 재시도용)
#[tauri::command]
pub async fn refresh_derived(session: State<'_, AppSession>) -> CommandResult<bool> {
    session.0.refresh_derived().await.map_err(CommandError::from)
}

/// 세션 전체 조회
#[tauri::command]
pub async fn get_session_snapshot(
    session: State<'_, AppSession>,
) -> CommandResult<SessionSnapshot> {
    Ok(session.0.snapshot().await)
}

/// 다운로드용 파일 내용/이름
#[tauri::command]
pub async fn export_document(session: State<'_, AppSession>) -> CommandResult<ExportFile> {
    session.0.export().await.map_err(CommandError::from)
}

/// 파일로 내보내기 (저장된 경로 반환)
#[tauri::command]
pub async fn export_document_file(
    args: DocumentPathArgs,
    session: State<'_, AppSession>,
) -> CommandResult<String> {
    let written = session
        .0
        .export_to_path(&args.path)
        .await
        .map_err(CommandError::from)?;
    Ok(written.to_string_lossy().to_string())
}

/// .json 파일 가져오기
#[tauri::command]
pub async fn import_document_file(
    args: DocumentPathArgs,
    session: State<'_, AppSession>,
) -> CommandResult<EditOutcome> {
    session
        .0
        .import_from_path(&args.path)
        .await
        .map_err(CommandError::from)
}
