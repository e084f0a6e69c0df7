//! Tauri Commands Module
//!
//! 프론트엔드(WebView)에서 호출 가능한 Tauri 명령어 정의

pub mod config_action;
pub mod document;

use crate::session::DocumentSession;

/// 세션 상태 (Tauri 앱 상태로 관리)
pub struct AppSession(pub DocumentSession);
