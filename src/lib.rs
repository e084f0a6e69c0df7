//! Bedrock Architect - Backend Library
//!
//! 마인크래프트 Bedrock JSON 문서 편집 세션과 AI 어드바이저(Gemini) 연동을 담당합니다.
//! WebView 셸(Tauri)은 `desktop` feature에서만 포함됩니다.

pub mod advisor;
#[cfg(feature = "desktop")]
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod utils;

/// 로그 초기화 (RUST_LOG 우선, 기본값 info)
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bedrock_architect_lib=info"));
    // 테스트/재호출 시 이미 설치된 subscriber가 있으면 무시
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Tauri 앱 실행
#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use std::sync::Arc;
    use tauri::Manager;

    init_tracing();

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            // API 키는 프론트에 노출하지 않고 백엔드에서만 사용
            config::load_env();

            let advisor_config = config::AdvisorConfig::from_env()?;
            tracing::info!(
                "[Setup] Gemini advisor: model={}, timeout={}s",
                advisor_config.model,
                advisor_config.timeout.as_secs()
            );
            let timeout = advisor_config.timeout;
            let advisor = advisor::GeminiAdvisor::new(advisor_config)?;
            let session = session::DocumentSession::new(Arc::new(advisor)).with_timeout(timeout);

            app.manage(commands::AppSession(session));
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::document::load_document,
            commands::document::apply_instruction,
            commands::document::undo,
            commands::document::restore_entry,
            commands::document::update_draft,
            commands::document::sync_draft,
            commands::document::refresh_derived,
            commands::document::get_session_snapshot,
            commands::document::export_document,
            commands::document::export_document_file,
            commands::document::import_document_file,
            commands::config_action::open_config_action,
            commands::config_action::get_config_action,
            commands::config_action::apply_config_preset,
            commands::config_action::apply_config_custom,
            commands::config_action::close_config_action,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
