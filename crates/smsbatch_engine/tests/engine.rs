use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use smsbatch_engine::{
    EngineEvent, EngineHandle, FailureKind, SendError, SendReceipt, SmsApi, SmsSendRequest,
    TemplateSummary,
};

/// Answers sends for `13800138000` immediately and never answers any other.
struct ScriptedApi {
    sent: Mutex<Vec<Vec<String>>>,
}

impl ScriptedApi {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl SmsApi for ScriptedApi {
    async fn send(&self, request: &SmsSendRequest) -> Result<SendReceipt, SendError> {
        self.sent.lock().unwrap().push(request.mobile.clone());
        if request.mobile[0] != "13800138000" {
            std::future::pending::<()>().await;
        }
        Ok(SendReceipt {
            message: "success".to_string(),
        })
    }

    async fn list_templates(&self, user_id: u64) -> Result<Vec<TemplateSummary>, SendError> {
        if user_id == 0 {
            return Err(SendError {
                kind: FailureKind::HttpStatus(403),
                message: "forbidden".to_string(),
            });
        }
        Ok(vec![TemplateSummary {
            id: "1".to_string(),
            name: "notice".to_string(),
            tpl_id: "notice".to_string(),
        }])
    }
}

fn request(mobile: &str) -> SmsSendRequest {
    SmsSendRequest {
        tpl_id: "1".to_string(),
        data: BTreeMap::new(),
        mobile: vec![mobile.to_string()],
        max_try: None,
        send_time: None,
    }
}

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn completed_send_is_reported_with_its_ticket() {
    batch_logging::initialize_for_tests();
    let engine = EngineHandle::with_api(Arc::new(ScriptedApi::new())).unwrap();

    engine.send(41, request("13800138000"));

    match engine.recv_timeout(WAIT) {
        Some(EngineEvent::SendCompleted { ticket, result }) => {
            assert_eq!(ticket, 41);
            assert_eq!(result.unwrap().message, "success");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn aborted_send_emits_nothing() {
    batch_logging::initialize_for_tests();
    let api = Arc::new(ScriptedApi::new());
    let engine = EngineHandle::with_api(api.clone()).unwrap();

    engine.send(1, request("13800138001"));
    // Wait until the call is actually outstanding.
    for _ in 0..100 {
        if !api.sent.lock().unwrap().is_empty() {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    engine.abort(1);

    assert_eq!(engine.recv_timeout(Duration::from_millis(300)), None);

    engine.send(2, request("13800138000"));
    match engine.recv_timeout(WAIT) {
        Some(EngineEvent::SendCompleted { ticket, .. }) => assert_eq!(ticket, 2),
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn abort_after_settlement_is_harmless() {
    batch_logging::initialize_for_tests();
    let engine = EngineHandle::with_api(Arc::new(ScriptedApi::new())).unwrap();

    engine.send(5, request("13800138000"));
    assert!(matches!(
        engine.recv_timeout(WAIT),
        Some(EngineEvent::SendCompleted { ticket: 5, .. })
    ));
    engine.abort(5);
    assert_eq!(engine.try_recv(), None);
}

#[test]
fn template_listing_reports_success_and_failure() {
    batch_logging::initialize_for_tests();
    let engine = EngineHandle::with_api(Arc::new(ScriptedApi::new())).unwrap();

    engine.list_templates(7);
    match engine.recv_timeout(WAIT) {
        Some(EngineEvent::TemplatesLoaded { user_id, result }) => {
            assert_eq!(user_id, 7);
            assert_eq!(result.unwrap()[0].name, "notice");
        }
        other => panic!("unexpected event {other:?}"),
    }

    engine.list_templates(0);
    match engine.recv_timeout(WAIT) {
        Some(EngineEvent::TemplatesLoaded { result, .. }) => {
            assert_eq!(result.unwrap_err().kind, FailureKind::HttpStatus(403));
        }
        other => panic!("unexpected event {other:?}"),
    }
}
