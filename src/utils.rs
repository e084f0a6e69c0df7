//! Utilities
//!
//! JSON 정규화, 히스토리 라벨 생성, 파일 경로 검증

use std::path::{Path, PathBuf};

use crate::error::{ArchitectError, Result};

/// 히스토리 라벨에 들어가는 지시문 최대 글자 수
pub const LABEL_MAX_CHARS: usize = 20;

/// JSON 텍스트를 파싱 후 2칸 들여쓰기로 재직렬화 (키 순서 유지)
pub fn canonicalize_json(raw: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| ArchitectError::InvalidDocument(e.to_string()))?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// 정규화를 시도하고, 실패하면 원문을 그대로 돌려줌
///
/// 어드바이저가 돌려준 결과물에만 사용합니다 (깨진 JSON도 수용).
pub fn canonicalize_lenient(raw: &str) -> (String, bool) {
    match canonicalize_json(raw) {
        Ok(canonical) => (canonical, true),
        Err(_) => (raw.to_string(), false),
    }
}

/// 지시문을 히스토리 라벨로 축약 (문자 단위, 초과 시 `...`)
pub fn truncate_label(instruction: &str) -> String {
    let trimmed = instruction.trim();
    if trimmed.chars().count() <= LABEL_MAX_CHARS {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(LABEL_MAX_CHARS).collect();
    format!("{}...", head)
}

/// 시스템 중요 디렉토리 접근을 차단하는 Blocklist 검증 함수
/// - canonicalize()로 경로 정규화 후, 차단 목록과 비교합니다.
pub fn validate_path(path_str: &str) -> Result<PathBuf> {
    let path = Path::new(path_str);

    // 파일이 존재하면 canonicalize, 없으면(export) 부모 디렉토리 검사
    let canonical_path = if path.exists() {
        path.canonicalize()?
    } else if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            return Err(ArchitectError::InvalidOperation(
                "Parent directory does not exist".to_string(),
            ));
        }
        let file_name = path.file_name().ok_or_else(|| {
            ArchitectError::InvalidOperation(format!("Missing file name: {}", path_str))
        })?;
        parent.canonicalize()?.join(file_name)
    } else {
        std::env::current_dir()?.join(path)
    };

    if is_blocked_path(&canonical_path) {
        return Err(ArchitectError::InvalidOperation(
            "Access to system directory is blocked.".to_string(),
        ));
    }

    Ok(canonical_path)
}

fn is_blocked_path(path: &Path) -> bool {
    #[cfg(target_os = "windows")]
    {
        let lower = path.to_string_lossy().to_lowercase();
        if lower.contains(r"c:\windows") || lower.contains(r"c:\program files") {
            return true;
        }
    }

    #[cfg(not(target_os = "windows"))]
    {
        // 경로 컴포넌트 단위로 비교 (/etcetera 는 허용). /home, /Users, /tmp 은 허용
        const BLOCKED: [&str; 9] = [
            "/etc", "/var", "/root", "/proc", "/sys", "/bin", "/sbin", "/usr/bin", "/usr/sbin",
        ];
        if BLOCKED.iter().any(|prefix| path.starts_with(prefix)) {
            return true;
        }
    }

    false
}
