//! Edit History
//!
//! 커밋된 문서 상태의 append-only 로그. 과거 엔트리는 수정하지 않습니다.
//! - `commit`: 직전 엔트리와 내용이 같으면 추가하지 않음
//! - `push`: 항상 추가 (복원용)
//! - `undo`: 마지막 엔트리 제거 (최소 1개 유지)

use crate::models::HistoryEntry;

#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn can_undo(&self) -> bool {
        self.entries.len() > 1
    }

    /// 새 상태 커밋. 직전 엔트리와 동일하면 false
    pub fn commit(&mut self, label: &str, content: &str) -> bool {
        if self.latest().is_some_and(|e| e.content == content) {
            return false;
        }
        self.push(label, content);
        true
    }

    /// 무조건 엔트리 추가
    pub fn push(&mut self, label: &str, content: &str) -> &HistoryEntry {
        self.entries.push(HistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            label: label.to_string(),
            content: content.to_string(),
        });
        &self.entries[self.entries.len() - 1]
    }

    /// 마지막 엔트리를 버리고 새 마지막 엔트리를 반환
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if !self.can_undo() {
            return None;
        }
        self.entries.pop();
        self.entries.last()
    }
}
