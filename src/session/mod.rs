//! Document Session
//!
//! 편집 중인 JSON 문서, 히스토리, 파생 데이터(분류/분석/지표/추천)를 소유하는
//! 세션 객체. 아래 연산만 문서를 변경합니다.
//!
//! - `load_document` / `sync_draft` / `import_from_path`
//! - `apply_instruction` (및 config-action 해소)
//! - `undo` / `restore_entry`
//!
//! 문서 변경 연산은 single-flight: 진행 중인 연산이 있으면 `Busy`로 거절합니다.
//! 파생 데이터는 요청 시점의 문서 세대(generation)로 태깅되며, 응답이 도착했을 때
//! 세대가 바뀌었으면 버려집니다.

pub mod config_action;
pub mod history;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::advisor::{Advisor, AdvisorError};
use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::error::{ArchitectError, CommandError, Result};
use crate::models::{Classification, DerivedSnapshot, ExportFile, HistoryEntry, Suggestion};
use crate::utils::{canonicalize_json, canonicalize_lenient, truncate_label, validate_path};

use config_action::{ConfigActionMachine, ConfigActionView};
use history::History;

pub const RESTORED_LABEL: &str = "Restored";
pub const MANUAL_SYNC_LABEL: &str = "Manual Sync";
pub const UNDO_LABEL: &str = "Undo";

/// 문서 변경 연산 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOutcome {
    pub generation: u64,
    pub label: String,
    pub history_len: usize,
    /// Modify 응답의 설명 (apply_instruction만)
    pub explanation: Option<String>,
    /// 어드바이저 결과가 유효한 JSON이 아니어서 원문 그대로 커밋된 경우 false
    pub canonical: bool,
    /// 파생 데이터 갱신 성공 여부 (실패 시 이전 데이터는 stale로 남음)
    pub derived_refreshed: bool,
    /// 갱신 실패 원인. 문서 변경은 이미 커밋된 상태
    pub derived_error: Option<CommandError>,
}

/// 세션 전체 읽기 전용 뷰
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub document: String,
    pub draft: Option<String>,
    pub history: Vec<HistoryEntry>,
    pub generation: u64,
    pub derived: Option<DerivedSnapshot>,
    pub derived_stale: bool,
    pub is_loading: bool,
    pub can_undo: bool,
}

#[derive(Debug, Default)]
struct EditorState {
    document: String,
    draft: Option<String>,
    history: History,
    generation: u64,
    derived: Option<DerivedSnapshot>,
}

impl EditorState {
    fn fresh_derived(&self) -> Option<&DerivedSnapshot> {
        self.derived
            .as_ref()
            .filter(|d| d.generation == self.generation)
    }
}

/// 진행 중인 어드바이저 요청 카운터 (drop 시 감소)
struct PendingGuard<'a>(&'a AtomicUsize);

impl<'a> PendingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// 문서 변경 연산 동안 유지되는 잠금. 연산 전체에 걸쳐 loading 상태를 유지
struct EditGuard<'a> {
    _gate: MutexGuard<'a, ()>,
    _pending: PendingGuard<'a>,
}

/// 편집 세션
pub struct DocumentSession {
    advisor: Arc<dyn Advisor>,
    timeout: Duration,
    state: RwLock<EditorState>,
    edit_gate: Mutex<()>,
    pending: AtomicUsize,
    config_action: Mutex<ConfigActionMachine>,
}

impl DocumentSession {
    pub fn new(advisor: Arc<dyn Advisor>) -> Self {
        Self {
            advisor,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            state: RwLock::new(EditorState::default()),
            edit_gate: Mutex::new(()),
            pending: AtomicUsize::new(0),
            config_action: Mutex::new(ConfigActionMachine::new()),
        }
    }

    /// 어드바이저 호출 1회당 제한 시간
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    // ============================================================================
    // Queries
    // ============================================================================

    pub async fn document(&self) -> String {
        self.state.read().await.document.clone()
    }

    pub async fn draft(&self) -> Option<String> {
        self.state.read().await.draft.clone()
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.state.read().await.history.entries().to_vec()
    }

    pub async fn can_undo(&self) -> bool {
        self.state.read().await.history.can_undo()
    }

    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// 현재 문서 세대에서 계산된 파생 데이터 (stale이면 None)
    pub async fn derived(&self) -> Option<DerivedSnapshot> {
        self.state.read().await.fresh_derived().cloned()
    }

    /// 현재 문서의 분류 (아직 계산되지 않았으면 Unknown)
    pub async fn classification(&self) -> Classification {
        self.state
            .read()
            .await
            .fresh_derived()
            .map(|d| d.classification)
            .unwrap_or_default()
    }

    /// 진행 중인 문서 변경 연산 + 어드바이저 요청 수
    pub fn pending_requests(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_loading(&self) -> bool {
        self.pending_requests() > 0
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            document: state.document.clone(),
            draft: state.draft.clone(),
            history: state.history.entries().to_vec(),
            generation: state.generation,
            derived: state.derived.clone(),
            derived_stale: state.derived.is_some() && state.fresh_derived().is_none(),
            is_loading: self.is_loading(),
            can_undo: state.history.can_undo(),
        }
    }

    // ============================================================================
    // Mutations
    // ============================================================================

    /// JSON 텍스트를 검증/정규화하여 현재 문서로 설정
    pub async fn load_document(&self, raw: &str, label: &str) -> Result<EditOutcome> {
        let _gate = self.begin_edit()?;
        self.load_locked(raw, label).await
    }

    async fn load_locked(&self, raw: &str, label: &str) -> Result<EditOutcome> {
        let canonical = canonicalize_json(raw)?;
        let (generation, history_len) = self.commit(label, canonical.clone(), true).await;
        tracing::info!("[Session] Document loaded: {} (gen {})", label, generation);

        Ok(self
            .finish_edit(generation, label, history_len, canonical, None, true)
            .await)
    }

    /// 자연어 지시문으로 문서 수정
    ///
    /// 문서가 비었거나 지시문이 공백이면 아무 것도 하지 않고 `None`.
    /// 어드바이저 실패 시 문서/히스토리는 변경되지 않습니다.
    pub async fn apply_instruction(&self, instruction: &str) -> Result<Option<EditOutcome>> {
        if instruction.trim().is_empty() {
            return Ok(None);
        }
        let _gate = self.begin_edit()?;
        self.apply_locked(instruction).await
    }

    async fn apply_locked(&self, instruction: &str) -> Result<Option<EditOutcome>> {
        let document = self.document().await;
        if document.is_empty() {
            return Ok(None);
        }

        let result = self
            .call(self.advisor.modify(&document, instruction))
            .await
            .map_err(|e| {
                tracing::warn!("[Session] Modification failed: {}", e);
                ArchitectError::from(e)
            })?;

        let (content, canonical) = canonicalize_lenient(&result.updated_json);
        if !canonical {
            tracing::warn!("[Session] Advisor returned invalid JSON, keeping it verbatim");
        }

        let label = truncate_label(instruction);
        let (generation, history_len) = self.commit(&label, content.clone(), true).await;
        tracing::info!("[Session] Instruction applied: {} (gen {})", label, generation);

        Ok(Some(
            self.finish_edit(
                generation,
                &label,
                history_len,
                content,
                Some(result.explanation),
                canonical,
            )
            .await,
        ))
    }

    /// 마지막 히스토리 엔트리 제거 후 직전 상태로 되돌림 (redo 없음)
    pub async fn undo(&self) -> Result<EditOutcome> {
        let _gate = self.begin_edit()?;

        let (generation, history_len, content) = {
            let mut state = self.state.write().await;
            let content = state
                .history
                .undo()
                .map(|e| e.content.clone())
                .ok_or_else(|| ArchitectError::InvalidOperation("Nothing to undo".to_string()))?;
            state.document = content.clone();
            state.draft = None;
            state.generation += 1;
            (state.generation, state.history.len(), content)
        };
        tracing::info!("[Session] Undo (gen {}, {} entries)", generation, history_len);

        let canonical = canonicalize_json(&content).is_ok();
        Ok(self
            .finish_edit(generation, UNDO_LABEL, history_len, content, None, canonical)
            .await)
    }

    /// 히스토리 엔트리를 복원 (새 엔트리로 추가, 기존 히스토리는 유지)
    pub async fn restore_entry(&self, index: usize) -> Result<EditOutcome> {
        let _gate = self.begin_edit()?;

        let content = {
            let state = self.state.read().await;
            state
                .history
                .get(index)
                .map(|e| e.content.clone())
                .ok_or_else(|| {
                    ArchitectError::InvalidOperation(format!(
                        "History index out of range: {} (len {})",
                        index,
                        state.history.len()
                    ))
                })?
        };

        let (generation, history_len) = self.commit(RESTORED_LABEL, content.clone(), false).await;
        tracing::info!("[Session] Restored entry {} (gen {})", index, generation);

        let canonical = canonicalize_json(&content).is_ok();
        Ok(self
            .finish_edit(generation, RESTORED_LABEL, history_len, content, None, canonical)
            .await)
    }

    /// 에디터에 직접 입력 중인 텍스트 보관 (검증/히스토리 없음)
    pub async fn update_draft(&self, text: String) {
        let mut state = self.state.write().await;
        state.draft = if text == state.document { None } else { Some(text) };
    }

    /// 입력 중인 텍스트를 문서로 반영 ("Manual Sync")
    ///
    /// 유효하지 않은 JSON이면 `InvalidDocument`, draft는 그대로 남습니다.
    pub async fn sync_draft(&self) -> Result<EditOutcome> {
        let _gate = self.begin_edit()?;
        let text = {
            let state = self.state.read().await;
            state.draft.clone().unwrap_or_else(|| state.document.clone())
        };
        self.load_locked(&text, MANUAL_SYNC_LABEL).await
    }

    /// `.json` 파일을 읽어 문서로 설정 (파일명이 히스토리 라벨)
    pub async fn import_from_path(&self, path: &str) -> Result<EditOutcome> {
        let _gate = self.begin_edit()?;
        let path = validate_path(path)?;
        let raw = tokio::fs::read_to_string(&path).await?;
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "Import".to_string());
        self.load_locked(&raw, &label).await
    }

    // ============================================================================
    // Derived data
    // ============================================================================

    /// 현재 문서에 대해 파생 데이터를 다시 계산
    ///
    /// 적용되면 true, 그 사이 문서가 바뀌어 결과를 버렸으면 false.
    pub async fn refresh_derived(&self) -> Result<bool> {
        let (generation, document) = {
            let state = self.state.read().await;
            (state.generation, state.document.clone())
        };
        if document.is_empty() {
            return Err(ArchitectError::InvalidOperation(
                "No document loaded".to_string(),
            ));
        }
        self.refresh_for(generation, &document).await
    }

    async fn refresh_for(&self, generation: u64, document: &str) -> Result<bool> {
        let _pending = PendingGuard::new(&self.pending);

        // 세 요청은 동시에, 하나라도 실패하면 전체 실패
        let (report, stats, suggestions) = futures::future::try_join3(
            self.call(self.advisor.analyze(document)),
            self.call(self.advisor.extract_stats(document)),
            self.call(self.advisor.suggest_elements(document)),
        )
        .await?;

        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::debug!(
                "[Session] Discarding derived data for gen {} (current gen {})",
                generation,
                state.generation
            );
            return Ok(false);
        }

        state.derived = Some(DerivedSnapshot {
            generation,
            source: document.to_string(),
            classification: report.classification,
            analysis: report.analysis,
            stats,
            suggestions,
            refreshed_at: chrono::Utc::now().timestamp_millis(),
        });
        tracing::debug!("[Session] Derived data refreshed (gen {})", generation);
        Ok(true)
    }

    // ============================================================================
    // Export
    // ============================================================================

    /// 현재 문서를 그대로 내보내기 (파일명은 분류 기준)
    pub async fn export(&self) -> Result<ExportFile> {
        let state = self.state.read().await;
        if state.document.is_empty() {
            return Err(ArchitectError::InvalidOperation(
                "No document loaded".to_string(),
            ));
        }

        let file_name = match state.fresh_derived().map(|d| d.classification) {
            Some(c) if c != Classification::Unknown => format!("minecraft_{}.json", c.as_str()),
            _ => "minecraft_config.json".to_string(),
        };

        Ok(ExportFile {
            file_name,
            content: state.document.clone(),
        })
    }

    /// 지정 경로에 내보내기. 디렉토리를 주면 분류 기준 파일명을 붙임
    pub async fn export_to_path(&self, path: &str) -> Result<PathBuf> {
        let file = self.export().await?;
        let target = if Path::new(path).is_dir() {
            Path::new(path).join(&file.file_name)
        } else {
            PathBuf::from(path)
        };
        let target = validate_path(&target.to_string_lossy())?;
        tokio::fs::write(&target, file.content.as_bytes()).await?;
        tracing::info!("[Session] Exported to {}", target.display());
        Ok(target)
    }

    // ============================================================================
    // Config-action workflow
    // ============================================================================

    pub async fn config_action(&self) -> ConfigActionView {
        self.config_action.lock().await.view()
    }

    /// 추천 요소로 모달을 열고 프리셋 조회 (실패 시 빈 프리셋)
    pub async fn open_config_action(&self, item: Suggestion) -> ConfigActionView {
        let name = item.name.clone();
        let ticket = self.config_action.lock().await.open(item);

        let info = {
            let _pending = PendingGuard::new(&self.pending);
            match self.call(self.advisor.get_presets(&name)).await {
                Ok(info) => info,
                Err(e) => {
                    tracing::warn!("[Session] Preset lookup failed for {}: {}", name, e);
                    Default::default()
                }
            }
        };

        let mut machine = self.config_action.lock().await;
        if !machine.presets_loaded(ticket, info) {
            tracing::debug!("[Session] Discarding presets for closed action {}", ticket);
        }
        machine.view()
    }

    /// 프리셋 선택 → 지시문 적용
    ///
    /// 편집 잠금을 먼저 잡으므로 `Busy`면 모달 상태는 그대로 남습니다.
    pub async fn apply_config_preset(&self, index: usize) -> Result<Option<EditOutcome>> {
        let _gate = self.begin_edit()?;
        let instruction = self.config_action.lock().await.resolve_preset(index)?;
        self.apply_locked(&instruction).await
    }

    /// 직접 입력 → 지시문 적용 (공백이면 None, 모달 유지)
    pub async fn apply_config_custom(&self, text: &str) -> Result<Option<EditOutcome>> {
        let _gate = self.begin_edit()?;
        let resolved = self.config_action.lock().await.resolve_custom(text)?;
        match resolved {
            Some(instruction) => self.apply_locked(&instruction).await,
            None => Ok(None),
        }
    }

    pub async fn close_config_action(&self) {
        self.config_action.lock().await.close();
    }

    // ============================================================================
    // Internals
    // ============================================================================

    fn begin_edit(&self) -> Result<EditGuard<'_>> {
        let gate = self.edit_gate.try_lock().map_err(|_| {
            tracing::debug!("[Session] Rejecting edit: another edit is in flight");
            ArchitectError::Busy
        })?;
        Ok(EditGuard {
            _gate: gate,
            _pending: PendingGuard::new(&self.pending),
        })
    }

    /// 어드바이저 호출에 제한 시간 적용
    async fn call<T>(
        &self,
        fut: impl Future<Output = std::result::Result<T, AdvisorError>>,
    ) -> std::result::Result<T, AdvisorError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| AdvisorError::Timeout(self.timeout.as_secs()))?
    }

    /// 문서 교체 + 히스토리 기록 + 세대 증가. (새 세대, 히스토리 길이) 반환
    async fn commit(&self, label: &str, content: String, dedup: bool) -> (u64, usize) {
        let mut state = self.state.write().await;
        if dedup {
            state.history.commit(label, &content);
        } else {
            state.history.push(label, &content);
        }
        state.document = content;
        state.draft = None;
        state.generation += 1;
        (state.generation, state.history.len())
    }

    async fn finish_edit(
        &self,
        generation: u64,
        label: &str,
        history_len: usize,
        document: String,
        explanation: Option<String>,
        canonical: bool,
    ) -> EditOutcome {
        let (derived_refreshed, derived_error) =
            match self.refresh_for(generation, &document).await {
                Ok(applied) => (applied, None),
                Err(e) => {
                    tracing::warn!("[Session] Derived refresh failed (gen {}): {}", generation, e);
                    (false, Some(CommandError::from(e)))
                }
            };

        EditOutcome {
            generation,
            label: label.to_string(),
            history_len,
            explanation,
            canonical,
            derived_refreshed,
            derived_error,
        }
    }
}

#[cfg(test)]
mod tests;
