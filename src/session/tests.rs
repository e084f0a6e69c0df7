use super::*;

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::models::{
    AnalysisReport, DerivedAnalysis, ModificationResult, Preset, PresetInfo, Stats,
    SuggestionCategory,
};
use super::config_action::ConfigActionStatus;

/// 특정 호출을 테스트가 풀어줄 때까지 붙잡아 두는 장치
struct Hold {
    entered: Option<oneshot::Sender<()>>,
    release: oneshot::Receiver<()>,
}

impl Hold {
    async fn wait(mut self) {
        if let Some(tx) = self.entered.take() {
            let _ = tx.send(());
        }
        let _ = self.release.await;
    }
}

/// (entered 수신기, release 송신기)
fn hold_pair() -> (Hold, oneshot::Receiver<()>, oneshot::Sender<()>) {
    let (entered_tx, entered_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel();
    (
        Hold {
            entered: Some(entered_tx),
            release: release_rx,
        },
        entered_rx,
        release_tx,
    )
}

/// 스크립트된 응답을 돌려주는 Advisor
#[derive(Default)]
struct MockAdvisor {
    modify_responses: StdMutex<VecDeque<std::result::Result<ModificationResult, AdvisorError>>>,
    instructions: StdMutex<Vec<String>>,
    presets: StdMutex<Option<PresetInfo>>,
    fail_stats: AtomicBool,
    hang_modify: AtomicBool,
    hold_modify: StdMutex<Option<Hold>>,
    hold_analyze: StdMutex<Option<Hold>>,
}

impl MockAdvisor {
    fn script_modify(&self, updated_json: &str) {
        self.modify_responses.lock().unwrap().push_back(Ok(ModificationResult {
            updated_json: updated_json.to_string(),
            explanation: "done".to_string(),
            detected_type: None,
            stats: None,
        }));
    }

    fn script_modify_error(&self, error: AdvisorError) {
        self.modify_responses.lock().unwrap().push_back(Err(error));
    }

    fn instructions(&self) -> Vec<String> {
        self.instructions.lock().unwrap().clone()
    }
}

fn classify(document: &str) -> Classification {
    if document.contains("minecraft:entity") {
        Classification::Entity
    } else if document.contains("minecraft:item") {
        Classification::Item
    } else {
        Classification::Unknown
    }
}

#[async_trait]
impl Advisor for MockAdvisor {
    async fn modify(
        &self,
        _document: &str,
        instruction: &str,
    ) -> std::result::Result<ModificationResult, AdvisorError> {
        self.instructions.lock().unwrap().push(instruction.to_string());
        if self.hang_modify.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let hold = self.hold_modify.lock().unwrap().take();
        if let Some(hold) = hold {
            hold.wait().await;
        }
        self.modify_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AdvisorError::Request("no scripted response".into())))
    }

    async fn analyze(&self, document: &str) -> std::result::Result<AnalysisReport, AdvisorError> {
        let hold = self.hold_analyze.lock().unwrap().take();
        if let Some(hold) = hold {
            hold.wait().await;
        }
        Ok(AnalysisReport {
            classification: classify(document),
            analysis: DerivedAnalysis {
                overview: format!("{} chars", document.len()),
                sections: Vec::new(),
            },
        })
    }

    async fn extract_stats(&self, document: &str) -> std::result::Result<Stats, AdvisorError> {
        if self.fail_stats.load(Ordering::SeqCst) {
            return Err(AdvisorError::Http {
                status: 500,
                message: "boom".into(),
            });
        }
        Ok(Stats {
            complexity: Some((document.len() % 100) as f64),
            ..Default::default()
        })
    }

    async fn suggest_elements(
        &self,
        document: &str,
    ) -> std::result::Result<Vec<Suggestion>, AdvisorError> {
        Ok(vec![Suggestion {
            name: format!("suggestion-for-{}", document.len()),
            description: "generated".into(),
            category: SuggestionCategory::Property,
            example: None,
        }])
    }

    async fn get_presets(&self, element_name: &str) -> std::result::Result<PresetInfo, AdvisorError> {
        match self.presets.lock().unwrap().clone() {
            Some(info) => Ok(info),
            None => Err(AdvisorError::Request(format!("no presets for {}", element_name))),
        }
    }
}

fn session() -> (Arc<DocumentSession>, Arc<MockAdvisor>) {
    let advisor = Arc::new(MockAdvisor::default());
    let session = Arc::new(DocumentSession::new(advisor.clone()));
    (session, advisor)
}

const ENTITY: &str = r#"{"format_version":"1.20.0","minecraft:entity":{"description":{"identifier":"demo:golem"}}}"#;

#[tokio::test]
async fn test_import_apply_undo_scenario() {
    let (session, advisor) = session();

    session.load_document(r#"{"a":1}"#, "Import").await.unwrap();
    let history = session.history().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "{\n  \"a\": 1\n}");
    assert!(!session.can_undo().await);

    advisor.script_modify(r#"{"a":1,"b":2}"#);
    let outcome = session.apply_instruction("add b:2").await.unwrap().unwrap();
    assert_eq!(outcome.history_len, 2);
    assert_eq!(outcome.explanation.as_deref(), Some("done"));
    assert!(outcome.canonical);
    assert!(outcome.derived_refreshed);
    assert_eq!(session.document().await, "{\n  \"a\": 1,\n  \"b\": 2\n}");
    assert_eq!(session.history().await[1].label, "add b:2");

    let outcome = session.undo().await.unwrap();
    assert_eq!(outcome.history_len, 1);
    assert_eq!(session.document().await, "{\n  \"a\": 1\n}");
    assert!(!session.can_undo().await);
    assert!(matches!(
        session.undo().await,
        Err(ArchitectError::InvalidOperation(_))
    ));
}

#[tokio::test]
async fn test_load_malformed_is_rejected() {
    let (session, _) = session();
    let err = session.load_document("{a:1}", "Import").await.unwrap_err();
    assert!(matches!(err, ArchitectError::InvalidDocument(_)));
    assert!(session.history().await.is_empty());
    assert_eq!(session.document().await, "");
    assert_eq!(session.generation().await, 0);
}

#[tokio::test]
async fn test_load_skips_duplicate_entry() {
    let (session, _) = session();
    session.load_document(r#"{"a":1}"#, "Import").await.unwrap();
    let outcome = session
        .load_document("{ \"a\" :   1 }", "Import again")
        .await
        .unwrap();
    assert_eq!(outcome.history_len, 1);
    session.load_document(r#"{"a":2}"#, "Other").await.unwrap();
    assert_eq!(session.history().await.len(), 2);
}

#[tokio::test]
async fn test_history_grows_by_one_per_edit() {
    let (session, advisor) = session();
    session.load_document(r#"{"v":0}"#, "Import").await.unwrap();
    for k in 1..=4 {
        advisor.script_modify(&format!(r#"{{"v":{}}}"#, k));
        session.apply_instruction(&format!("set v to {}", k)).await.unwrap();
        assert_eq!(session.history().await.len(), 1 + k);
    }
    session.load_document(r#"{"v":"loaded"}"#, "Import").await.unwrap();
    assert_eq!(session.history().await.len(), 6);
}

#[tokio::test]
async fn test_apply_failure_leaves_state_untouched() {
    let (session, advisor) = session();
    session.load_document(ENTITY, "Import").await.unwrap();
    let document_before = session.document().await;
    let history_before = session.history().await;
    let generation_before = session.generation().await;

    advisor.script_modify_error(AdvisorError::Http {
        status: 503,
        message: "UNAVAILABLE".into(),
    });
    let err = session.apply_instruction("make it fly").await.unwrap_err();
    assert!(matches!(err, ArchitectError::AdvisoryService(_)));

    advisor.script_modify_error(AdvisorError::MalformedResponse("modify: eof".into()));
    assert!(session.apply_instruction("make it fly").await.is_err());

    assert_eq!(session.document().await, document_before);
    assert_eq!(session.history().await, history_before);
    assert_eq!(session.generation().await, generation_before);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn test_apply_is_noop_without_document_or_instruction() {
    let (session, advisor) = session();
    assert_eq!(session.apply_instruction("add b").await.unwrap(), None);

    session.load_document(r#"{"a":1}"#, "Import").await.unwrap();
    assert_eq!(session.apply_instruction("   \n").await.unwrap(), None);
    assert!(advisor.instructions().is_empty());
    assert_eq!(session.history().await.len(), 1);
}

#[tokio::test]
async fn test_apply_accepts_invalid_json_verbatim() {
    let (session, advisor) = session();
    session.load_document(r#"{"a":1}"#, "Import").await.unwrap();

    advisor.script_modify("{\"a\": 1, \"b\": }");
    let outcome = session
        .apply_instruction("Recalibrate this sword for 15 attack damage")
        .await
        .unwrap()
        .unwrap();
    assert!(!outcome.canonical);
    assert_eq!(session.document().await, "{\"a\": 1, \"b\": }");

    let history = session.history().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].label, "Recalibrate this swo...");
    assert_eq!(history[1].content, "{\"a\": 1, \"b\": }");
}

#[tokio::test]
async fn test_restore_appends_entry() {
    let (session, advisor) = session();
    session.load_document(r#"{"v":0}"#, "Import").await.unwrap();
    advisor.script_modify(r#"{"v":1}"#);
    session.apply_instruction("bump").await.unwrap();

    let before = session.history().await;
    let outcome = session.restore_entry(0).await.unwrap();
    let after = session.history().await;

    assert_eq!(outcome.history_len, before.len() + 1);
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(&after[..before.len()], &before[..]);
    assert_eq!(session.document().await, before[0].content);
    assert_eq!(after.last().unwrap().label, RESTORED_LABEL);

    // 같은 내용이라도 복원은 항상 새 엔트리
    session.restore_entry(2).await.unwrap();
    assert_eq!(session.history().await.len(), before.len() + 2);

    assert!(matches!(
        session.restore_entry(42).await,
        Err(ArchitectError::InvalidOperation(_))
    ));
}

#[tokio::test]
async fn test_derived_data_matches_document() {
    let (session, advisor) = session();
    assert!(session.derived().await.is_none());
    assert_eq!(session.classification().await, Classification::Unknown);

    session.load_document(ENTITY, "Import").await.unwrap();
    let derived = session.derived().await.unwrap();
    let document = session.document().await;
    assert_eq!(derived.source, document);
    assert_eq!(derived.generation, session.generation().await);
    assert_eq!(derived.classification, Classification::Entity);
    assert_eq!(derived.analysis.overview, format!("{} chars", document.len()));
    assert_eq!(derived.suggestions[0].name, format!("suggestion-for-{}", document.len()));

    advisor.script_modify(r#"{"format_version":"1.20.0","minecraft:item":{}}"#);
    session.apply_instruction("turn into an item").await.unwrap();
    let derived = session.derived().await.unwrap();
    let document = session.document().await;
    assert_eq!(derived.source, document);
    assert_eq!(derived.classification, Classification::Item);
    assert_eq!(
        derived.stats.complexity,
        Some((document.len() % 100) as f64)
    );
}

#[tokio::test]
async fn test_refresh_failure_keeps_edit_and_marks_stale() {
    let (session, advisor) = session();
    session.load_document(ENTITY, "Import").await.unwrap();
    let old = session.derived().await.unwrap();

    advisor.fail_stats.store(true, Ordering::SeqCst);
    advisor.script_modify(r#"{"minecraft:item":{}}"#);
    let outcome = session.apply_instruction("swap").await.unwrap().unwrap();
    assert!(!outcome.derived_refreshed);
    assert_eq!(session.history().await.len(), 2);

    // 이전 세대 데이터는 fresh로 보이지 않음
    assert!(session.derived().await.is_none());
    let snapshot = session.snapshot().await;
    assert!(snapshot.derived_stale);
    assert_eq!(snapshot.derived.unwrap(), old);

    let err = session.refresh_derived().await.unwrap_err();
    assert!(matches!(err, ArchitectError::AdvisoryService(_)));

    advisor.fail_stats.store(false, Ordering::SeqCst);
    assert!(session.refresh_derived().await.unwrap());
    assert_eq!(session.classification().await, Classification::Item);
    assert!(!session.snapshot().await.derived_stale);
}

#[tokio::test]
async fn test_stale_refresh_is_discarded() {
    let (session, advisor) = session();
    session.load_document(ENTITY, "Import").await.unwrap();

    let (hold, entered, release) = hold_pair();
    *advisor.hold_analyze.lock().unwrap() = Some(hold);

    let background = {
        let session = session.clone();
        tokio::spawn(async move { session.refresh_derived().await })
    };
    entered.await.unwrap();

    advisor.script_modify(r#"{"minecraft:item":{"components":{}}}"#);
    let outcome = session.apply_instruction("convert").await.unwrap().unwrap();
    assert!(outcome.derived_refreshed);

    release.send(()).unwrap();
    let applied = background.await.unwrap().unwrap();
    assert!(!applied);

    let derived = session.derived().await.unwrap();
    assert_eq!(derived.source, session.document().await);
    assert_eq!(derived.classification, Classification::Item);
}

#[tokio::test]
async fn test_concurrent_edit_is_rejected() {
    let (session, advisor) = session();
    session.load_document(r#"{"a":1}"#, "Import").await.unwrap();

    let (hold, entered, release) = hold_pair();
    *advisor.hold_modify.lock().unwrap() = Some(hold);
    advisor.script_modify(r#"{"a":2}"#);

    let background = {
        let session = session.clone();
        tokio::spawn(async move { session.apply_instruction("set a to 2").await })
    };
    entered.await.unwrap();
    assert!(session.is_loading());

    assert!(matches!(
        session.load_document(r#"{"z":0}"#, "Import").await,
        Err(ArchitectError::Busy)
    ));
    assert!(matches!(session.undo().await, Err(ArchitectError::Busy)));
    assert!(matches!(session.restore_entry(0).await, Err(ArchitectError::Busy)));
    assert!(matches!(
        session.apply_instruction("other").await,
        Err(ArchitectError::Busy)
    ));

    release.send(()).unwrap();
    let outcome = background.await.unwrap().unwrap().unwrap();
    assert_eq!(outcome.history_len, 2);
    assert_eq!(session.document().await, "{\n  \"a\": 2\n}");
    assert!(!session.is_loading());
}

#[tokio::test]
async fn test_advisor_timeout() {
    let advisor = Arc::new(MockAdvisor::default());
    let session = DocumentSession::new(advisor.clone()).with_timeout(Duration::from_millis(50));
    session.load_document(r#"{"a":1}"#, "Import").await.unwrap();

    advisor.hang_modify.store(true, Ordering::SeqCst);
    let err = session.apply_instruction("never returns").await.unwrap_err();
    assert!(matches!(
        err,
        ArchitectError::AdvisoryService(AdvisorError::Timeout(_))
    ));
    assert_eq!(session.history().await.len(), 1);
    assert_eq!(session.pending_requests(), 0);
}

#[tokio::test]
async fn test_draft_sync() {
    let (session, _) = session();
    session.load_document(r#"{"a":1}"#, "Import").await.unwrap();

    session.update_draft("{\"a\": 1, ".to_string()).await;
    let err = session.sync_draft().await.unwrap_err();
    assert!(matches!(err, ArchitectError::InvalidDocument(_)));
    assert_eq!(session.draft().await.as_deref(), Some("{\"a\": 1, "));
    assert_eq!(session.history().await.len(), 1);

    session.update_draft("{\"a\": 1, \"b\": true}".to_string()).await;
    let outcome = session.sync_draft().await.unwrap();
    assert_eq!(outcome.label, MANUAL_SYNC_LABEL);
    assert_eq!(outcome.history_len, 2);
    assert_eq!(session.draft().await, None);
    assert_eq!(session.history().await[1].label, MANUAL_SYNC_LABEL);

    // 문서와 같은 텍스트는 draft로 남기지 않음
    let document = session.document().await;
    session.update_draft(document).await;
    assert_eq!(session.draft().await, None);
}

#[tokio::test]
async fn test_export_and_import_files() {
    let (session, _) = session();
    assert!(session.export().await.is_err());

    session.load_document(r#"{"a":1}"#, "Import").await.unwrap();
    assert_eq!(session.export().await.unwrap().file_name, "minecraft_config.json");

    session.load_document(ENTITY, "Import").await.unwrap();
    let file = session.export().await.unwrap();
    assert_eq!(file.file_name, "minecraft_entity.json");
    assert_eq!(file.content, session.document().await);

    let dir = tempfile::tempdir().unwrap();
    let written = session
        .export_to_path(dir.path().to_str().unwrap())
        .await
        .unwrap();
    assert_eq!(written.file_name().unwrap(), "minecraft_entity.json");
    assert_eq!(std::fs::read_to_string(&written).unwrap(), file.content);

    let (other, _) = self::session();
    let outcome = other
        .import_from_path(written.to_str().unwrap())
        .await
        .unwrap();
    assert_eq!(outcome.label, "minecraft_entity.json");
    assert_eq!(other.document().await, file.content);

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();
    assert!(matches!(
        other.import_from_path(broken.to_str().unwrap()).await,
        Err(ArchitectError::InvalidDocument(_))
    ));
    assert_eq!(other.history().await.len(), 1);
}

#[tokio::test]
async fn test_config_action_applies_preset() {
    let (session, advisor) = session();
    session.load_document(ENTITY, "Import").await.unwrap();
    *advisor.presets.lock().unwrap() = Some(PresetInfo {
        presets: vec![Preset {
            label: "Strong".into(),
            value: "value 10".into(),
        }],
        suggested_prompt: "How strong?".into(),
    });

    let item = session.derived().await.unwrap().suggestions[0].clone();
    let view = session.open_config_action(item.clone()).await;
    assert_eq!(view.status, ConfigActionStatus::PresetsReady);
    assert_eq!(view.prompt_heading, "How strong?");

    advisor.script_modify(r#"{"minecraft:entity":{"strength":10}}"#);
    let outcome = session.apply_config_preset(0).await.unwrap().unwrap();
    assert_eq!(outcome.history_len, 2);
    assert_eq!(
        advisor.instructions(),
        vec![format!("Add the property \"{}\" configured as: value 10", item.name)]
    );
    assert_eq!(session.config_action().await.status, ConfigActionStatus::Closed);
}

#[tokio::test]
async fn test_config_action_survives_preset_failure() {
    let (session, advisor) = session();
    session.load_document(ENTITY, "Import").await.unwrap();

    let item = Suggestion {
        name: "minecraft:on_death".into(),
        description: "Runs on death".into(),
        category: SuggestionCategory::Event,
        example: None,
    };
    let view = session.open_config_action(item).await;
    assert_eq!(view.status, ConfigActionStatus::PresetsReady);
    assert!(view.presets.is_empty());

    assert_eq!(session.apply_config_custom("  ").await.unwrap(), None);
    assert_eq!(session.config_action().await.status, ConfigActionStatus::PresetsReady);

    advisor.script_modify(r#"{"minecraft:entity":{"events":{}}}"#);
    session
        .apply_config_custom("drop 3 bones")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        advisor.instructions(),
        vec!["Add the event \"minecraft:on_death\" with these details: drop 3 bones".to_string()]
    );

    session.close_config_action().await;
    assert!(session.apply_config_preset(0).await.is_err());
}

#[tokio::test]
async fn test_undo_and_restore_recompute_derived() {
    let (session, advisor) = session();
    session.load_document(ENTITY, "Import").await.unwrap();
    advisor.script_modify(r#"{"format_version":"1.20.0","minecraft:item":{}}"#);
    session.apply_instruction("turn into an item").await.unwrap();
    assert_eq!(session.classification().await, Classification::Item);

    let outcome = session.undo().await.unwrap();
    assert!(outcome.derived_refreshed);
    let derived = session.derived().await.unwrap();
    assert_eq!(derived.source, session.document().await);
    assert_eq!(derived.generation, outcome.generation);
    assert_eq!(derived.classification, Classification::Entity);

    advisor.script_modify(r#"{"minecraft:item":{"components":{}}}"#);
    session.apply_instruction("item again").await.unwrap();
    let outcome = session.restore_entry(0).await.unwrap();
    assert!(outcome.derived_refreshed);
    let derived = session.derived().await.unwrap();
    assert_eq!(derived.source, session.document().await);
    assert_eq!(derived.classification, Classification::Entity);
}

#[tokio::test]
async fn test_refresh_failure_is_reported_for_every_mutation() {
    let (session, advisor) = session();
    advisor.fail_stats.store(true, Ordering::SeqCst);

    let outcome = session.load_document(ENTITY, "Import").await.unwrap();
    assert!(!outcome.derived_refreshed);
    let error = outcome.derived_error.unwrap();
    assert_eq!(error.code, "ADVISORY_SERVICE_ERROR");
    assert_eq!(error.details.as_deref(), Some("HTTP 500"));
    assert_eq!(session.history().await.len(), 1);
    assert!(session.derived().await.is_none());

    advisor.script_modify(r#"{"minecraft:item":{}}"#);
    let outcome = session.apply_instruction("swap").await.unwrap().unwrap();
    assert!(outcome.derived_error.is_some());

    let outcome = session.undo().await.unwrap();
    assert_eq!(outcome.derived_error.unwrap().code, "ADVISORY_SERVICE_ERROR");
    assert_eq!(session.history().await.len(), 1);
    assert_eq!(session.document().await, session.history().await[0].content);

    let outcome = session.restore_entry(0).await.unwrap();
    assert_eq!(outcome.derived_error.unwrap().code, "ADVISORY_SERVICE_ERROR");
    assert_eq!(session.history().await.len(), 2);

    advisor.fail_stats.store(false, Ordering::SeqCst);
    let outcome = session.undo().await.unwrap();
    assert!(outcome.derived_refreshed);
    assert_eq!(outcome.derived_error, None);
}

#[tokio::test]
async fn test_config_action_kept_open_when_busy() {
    let (session, advisor) = session();
    session.load_document(ENTITY, "Import").await.unwrap();
    *advisor.presets.lock().unwrap() = Some(PresetInfo {
        presets: vec![Preset {
            label: "Strong".into(),
            value: "value 10".into(),
        }],
        suggested_prompt: String::new(),
    });
    let item = session.derived().await.unwrap().suggestions[0].clone();
    session.open_config_action(item).await;

    let (hold, entered, release) = hold_pair();
    *advisor.hold_modify.lock().unwrap() = Some(hold);
    advisor.script_modify(r#"{"a":2}"#);
    let background = {
        let session = session.clone();
        tokio::spawn(async move { session.apply_instruction("unrelated edit").await })
    };
    entered.await.unwrap();

    assert!(matches!(
        session.apply_config_preset(0).await,
        Err(ArchitectError::Busy)
    ));
    assert!(matches!(
        session.apply_config_custom("value 3").await,
        Err(ArchitectError::Busy)
    ));
    let view = session.config_action().await;
    assert_eq!(view.status, ConfigActionStatus::PresetsReady);
    assert_eq!(view.presets.len(), 1);

    release.send(()).unwrap();
    background.await.unwrap().unwrap();

    advisor.script_modify(r#"{"a":3}"#);
    session.apply_config_preset(0).await.unwrap().unwrap();
    assert_eq!(session.config_action().await.status, ConfigActionStatus::Closed);
    assert_eq!(advisor.instructions().len(), 2);
}

#[tokio::test]
async fn test_loading_flag_covers_whole_edit() {
    let (session, _) = session();
    assert!(!session.is_loading());

    let guard = session.begin_edit().unwrap();
    assert!(session.is_loading());
    assert!(matches!(
        session.load_document(r#"{"a":1}"#, "Import").await,
        Err(ArchitectError::Busy)
    ));
    drop(guard);

    assert!(!session.is_loading());
    session.load_document(r#"{"a":1}"#, "Import").await.unwrap();
    assert_eq!(session.pending_requests(), 0);
}
