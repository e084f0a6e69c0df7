//! Configuration
//!
//! 환경 변수(.env.local / .env) 기반 설정 로드.
//! API 키는 프론트엔드(WebView)에 노출하지 않고 백엔드에서만 사용합니다.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ArchitectError, Result};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// 어드바이저(Gemini) 설정
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisorConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl AdvisorConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// 프로세스 환경 변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로부터 설정 구성
    ///
    /// 우선순위: GEMINI_API_KEY > API_KEY
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = non_empty("GEMINI_API_KEY")
            .or_else(|| non_empty("API_KEY"))
            .ok_or_else(|| {
                ArchitectError::Config(
                    "Gemini API key is missing. Please set GEMINI_API_KEY in .env.local".to_string(),
                )
            })?;

        let mut config = Self::new(api_key);
        if let Some(model) = non_empty("GEMINI_MODEL") {
            config.model = model;
        }
        if let Some(base_url) = non_empty("GEMINI_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = non_empty("ADVISOR_TIMEOUT_SECS") {
            let secs = raw.parse::<u64>().map_err(|_| {
                ArchitectError::Config(format!("ADVISOR_TIMEOUT_SECS must be an integer: {}", raw))
            })?;
            config.timeout = Duration::from_secs(secs.max(1));
        }

        Ok(config)
    }
}

fn is_valid_env_key(key: &str) -> bool {
    if key.is_empty() {
        return false;
    }
    key.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// KEY=VALUE 라인만 해석하는 관대한 파서
///
/// dotenvy(strict)가 markdown/코드펜스가 섞인 파일에서 실패할 때 사용합니다.
pub fn parse_env_lenient(text: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("```") {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line).trim();
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };
        let key = k.trim();
        if !is_valid_env_key(key) {
            continue;
        }

        let mut value = v.trim().to_string();
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = value[1..value.len() - 1].to_string();
        }

        out.push((key.to_string(), value));
    }

    out
}

fn try_load_env_lenient(path: &Path) -> std::io::Result<usize> {
    let text = std::fs::read_to_string(path)?;
    let mut loaded = 0usize;

    for (key, value) in parse_env_lenient(&text) {
        // 이미 비어있지 않은 값이 있으면 덮어쓰지 않음
        if let Ok(existing) = std::env::var(&key) {
            if !existing.trim().is_empty() {
                continue;
            }
        }
        std::env::set_var(&key, value);
        loaded += 1;
    }

    Ok(loaded)
}

fn find_upwards(start: PathBuf, filename: &str, max_hops: usize) -> Option<PathBuf> {
    let mut cur = start;
    for _ in 0..=max_hops {
        let candidate = cur.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }
        if !cur.pop() {
            break;
        }
    }
    None
}

/// .env.local 탐색 및 로드 (CWD → 상위 디렉토리 → 실행 파일 위치), 이후 .env
pub fn load_env() {
    if dotenvy::from_filename(".env.local").is_err() {
        let mut candidates: Vec<PathBuf> = vec![];
        if let Ok(cwd) = std::env::current_dir() {
            if let Some(p) = find_upwards(cwd, ".env.local", 6) {
                candidates.push(p);
            }
        }
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                if let Some(p) = find_upwards(dir.to_path_buf(), ".env.local", 8) {
                    candidates.push(p);
                }
            }
        }

        for p in candidates {
            if dotenvy::from_path(&p).is_ok() {
                tracing::debug!("[Config] Loaded {}", p.display());
                break;
            }
            if let Ok(loaded) = try_load_env_lenient(&p) {
                if loaded > 0 {
                    tracing::debug!("[Config] Loaded {} keys leniently from {}", loaded, p.display());
                    break;
                }
            }
        }
    }

    // production에서는 파일이 없을 수 있으므로 실패해도 무시
    let _ = dotenvy::dotenv();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = AdvisorConfig::from_lookup(lookup(&[("GEMINI_API_KEY", " key-1 ")])).unwrap();
        assert_eq!(config.api_key, "key-1");
        assert_eq!(config.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_from_lookup_fallback_and_overrides() {
        let config = AdvisorConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "  "),
            ("API_KEY", "legacy"),
            ("GEMINI_MODEL", "gemini-2.5-pro"),
            ("GEMINI_BASE_URL", "http://localhost:8080/models/"),
            ("ADVISOR_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "legacy");
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.base_url, "http://localhost:8080/models");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_lookup_errors() {
        let err = AdvisorConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ArchitectError::Config(_)));

        let err = AdvisorConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("ADVISOR_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ArchitectError::Config(_)));
    }

    #[test]
    fn test_parse_env_lenient_skips_markdown() {
        let text = "# Keys\n```bash\nexport GEMINI_API_KEY=\"abc\"\n```\nsome prose here\nlower_key=1\nGEMINI_MODEL='gemini-x'\n";
        let parsed = parse_env_lenient(text);
        assert_eq!(
            parsed,
            vec![
                ("GEMINI_API_KEY".to_string(), "abc".to_string()),
                ("GEMINI_MODEL".to_string(), "gemini-x".to_string()),
            ]
        );
    }
}
