//! Advisory Service 모듈
//!
//! 생성형 AI 백엔드와의 경계. 분류/분석, 수정, 지표 추출, 요소 추천, 프리셋 조회를
//! 고정된 응답 스키마로 요청하고 결과를 타입 있는 구조로 변환합니다.
//!
//! - 응답 본문은 신뢰하지 않는 텍스트로 취급
//! - Modify 외의 호출은 파싱 실패 시 기본값으로 대체 (전송 실패는 에러)
//! - Modify는 파싱 실패도 에러 (빈 문서로 덮어쓰지 않기 위함)

pub mod gemini;
pub mod parse;
pub mod prompts;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AnalysisReport, ModificationResult, PresetInfo, Stats, Suggestion};

pub use gemini::GeminiAdvisor;

/// Advisory Service 오류
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Advisory service returned no text")]
    EmptyResponse,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl AdvisorError {
    /// 사용자 메시지와 분리해서 보여줄 부가 정보
    pub fn details(&self) -> Option<String> {
        match self {
            AdvisorError::Http { status, .. } => Some(format!("HTTP {}", status)),
            AdvisorError::Timeout(secs) => Some(format!("timeout={}s", secs)),
            _ => None,
        }
    }
}

/// 생성형 AI 기반 문서 어드바이저
#[async_trait]
pub trait Advisor: Send + Sync {
    /// 지시문에 따라 문서 수정 (파싱 실패도 에러)
    async fn modify(
        &self,
        document: &str,
        instruction: &str,
    ) -> Result<ModificationResult, AdvisorError>;

    /// 문서 종류 판별 + 상세 분석
    async fn analyze(&self, document: &str) -> Result<AnalysisReport, AdvisorError>;

    /// 수치 지표 추출
    async fn extract_stats(&self, document: &str) -> Result<Stats, AdvisorError>;

    /// 추가할 만한 요소 추천
    async fn suggest_elements(&self, document: &str) -> Result<Vec<Suggestion>, AdvisorError>;

    /// 요소 이름에 대한 설정 프리셋 조회
    async fn get_presets(&self, element_name: &str) -> Result<PresetInfo, AdvisorError>;
}
