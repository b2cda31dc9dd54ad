mod common;

use anyhow::Result;
use base64::Engine;
use common::*;
use medeasy_voice::artifacts::ArtifactConfig;
use medeasy_voice::credentials::StaticCredentials;
use medeasy_voice::facade::VoiceChat;
use medeasy_voice::protocol::SessionResult;
use medeasy_voice::session::SessionConfig;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn chat(dir: &std::path::Path) -> Result<(Arc<VoiceChat>, Links)> {
    let (connector, links) = MockConnector::new();
    let chat = VoiceChat::build(
        SessionConfig::default(),
        ArtifactConfig::new(dir.to_path_buf()),
        connector,
        Arc::new(StaticCredentials::new(TOKEN)),
    )?;
    Ok((Arc::new(chat), links))
}

/// Run `call` on an unconnected chat, answering its frame with `reply`
async fn exchange<F, Fut>(
    chat: &Arc<VoiceChat>,
    links: &mut Links,
    call: F,
    reply: Value,
) -> Result<(Value, SessionResult)>
where
    F: FnOnce(Arc<VoiceChat>) -> Fut,
    Fut: std::future::Future<Output = medeasy_voice::Result<SessionResult>> + Send + 'static,
{
    let requesting = tokio::spawn(call(Arc::clone(chat)));

    let (_, mut driver) = next_link(links).await?;
    open(&driver);

    let frame = next_frame(&mut driver).await?;
    deliver(&driver, reply);
    let result = requesting.await??;

    Ok((frame, result))
}

fn ok_reply() -> Value {
    json!({ "result_code": 200, "text_message": "네" })
}

#[tokio::test]
async fn test_routine_today_sends_fixed_intent() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (chat, mut links) = chat(temp_dir.path())?;

    let (frame, result) = exchange(
        &chat,
        &mut links,
        |chat| async move { chat.routine_today().await },
        json!({
            "result_code": 200,
            "text_message": "오늘 복약 루틴입니다",
            "client_action": "SHOW_ROUTINE_LIST"
        }),
    )
    .await?;

    assert_eq!(frame["message"], "오늘 복약 루틴 조회");
    assert_eq!(frame["server_action"], "GET_ROUTINE_LIST_TODAY");
    assert_eq!(frame["data"], Value::Null);
    assert_eq!(result.action.as_deref(), Some("SHOW_ROUTINE_LIST"));

    Ok(())
}

#[tokio::test]
async fn test_routine_before_connect_saves_spoken_reply() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (chat, mut links) = chat(temp_dir.path())?;
    let audio = b"ID3\x04\x00fake mp3".to_vec();

    let (_, result) = exchange(
        &chat,
        &mut links,
        |chat| async move { chat.routine_today().await },
        json!({
            "result_code": 200,
            "text_message": "오늘 드실 약은 두 가지입니다.",
            "audio_base64": base64::engine::general_purpose::STANDARD.encode(&audio),
            "client_action": "SHOW_ROUTINE"
        }),
    )
    .await?;

    assert_eq!(result.text.as_deref(), Some("오늘 드실 약은 두 가지입니다."));
    assert_eq!(result.action.as_deref(), Some("SHOW_ROUTINE"));
    assert!(result.data.is_none());

    let path = result.file_path.expect("spoken reply should be saved");
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    assert!(name.starts_with("voice_response_") && name.ends_with(".mp3"));
    assert_eq!(std::fs::read(&path)?, audio);
    assert!(!chat.connection_info().initial_message_received);

    Ok(())
}

#[tokio::test]
async fn test_photo_upload_carries_image_payload() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (chat, mut links) = chat(temp_dir.path())?;

    let (frame, _) = exchange(
        &chat,
        &mut links,
        |chat| async move { chat.upload_pills_photo("aGVsbG8=").await },
        ok_reply(),
    )
    .await?;

    assert_eq!(frame["message"], "알약 사진 업로드");
    assert_eq!(frame["server_action"], "UPLOAD_PILLS_PHOTO");
    assert_eq!(frame["data"], "aGVsbG8=");

    Ok(())
}

#[tokio::test]
async fn test_register_routine_list_sends_array() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (chat, mut links) = chat(temp_dir.path())?;
    let routines = vec![json!({ "medicine_id": 3, "dose": 1 })];

    let (frame, _) = exchange(
        &chat,
        &mut links,
        move |chat| async move { chat.register_routine_list(routines).await },
        ok_reply(),
    )
    .await?;

    assert_eq!(frame["server_action"], "REGISTER_ROUTINE_LIST");
    assert_eq!(frame["data"], json!([{ "medicine_id": 3, "dose": 1 }]));

    Ok(())
}

#[tokio::test]
async fn test_search_medicines_includes_query() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (chat, mut links) = chat(temp_dir.path())?;

    let (frame, _) = exchange(
        &chat,
        &mut links,
        |chat| async move { chat.search_medicines("타이레놀").await },
        ok_reply(),
    )
    .await?;

    assert_eq!(frame["message"], "약 검색: 타이레놀");
    assert_eq!(frame["server_action"], "SEARCH_MEDICINES");
    assert_eq!(frame["data"], json!({ "query": "타이레놀" }));

    Ok(())
}

#[tokio::test]
async fn test_send_message_normalizes_empty_payload() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (chat, mut links) = chat(temp_dir.path())?;

    let (frame, _) = exchange(
        &chat,
        &mut links,
        |chat| async move { chat.send_message("안녕", None, Some(json!(""))).await },
        ok_reply(),
    )
    .await?;

    assert_eq!(frame["message"], "안녕");
    assert_eq!(frame["server_action"], Value::Null);
    assert_eq!(frame["data"], Value::Null);

    Ok(())
}

#[tokio::test]
async fn test_action_handlers_route_results() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (chat, _links) = chat(temp_dir.path())?;

    let seen = Arc::new(Mutex::new(Vec::<Option<Value>>::new()));
    {
        let seen = Arc::clone(&seen);
        chat.register_action_handler("SHOW_ROUTINE_LIST", move |data: Option<&Value>, _result: &SessionResult| {
            seen.lock().unwrap().push(data.cloned());
        });
    }

    let routed = SessionResult {
        action: Some("SHOW_ROUTINE_LIST".to_string()),
        data: Some(json!({ "count": 2 })),
        ..SessionResult::default()
    };
    assert!(chat.route_action(&routed));

    let unrouted = SessionResult {
        action: Some("OPEN_CAMERA".to_string()),
        ..SessionResult::default()
    };
    assert!(!chat.route_action(&unrouted));
    assert!(!chat.route_action(&SessionResult::default()));

    assert_eq!(*seen.lock().unwrap(), vec![Some(json!({ "count": 2 }))]);
    assert!(chat.action_handler("SHOW_ROUTINE_LIST").is_some());
    assert_eq!(chat.status().registered_actions, vec!["SHOW_ROUTINE_LIST"]);

    Ok(())
}

#[tokio::test]
async fn test_status_reflects_connection() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (chat, mut links) = chat(temp_dir.path())?;

    let status = serde_json::to_value(chat.status())?;
    assert_eq!(status["state"], "idle");
    assert_eq!(status["registered_actions"], json!([]));

    let _driver = connect_open(chat.session(), &mut links).await?;
    assert_eq!(serde_json::to_value(chat.status())?["state"], "open");

    chat.disconnect();
    let status = serde_json::to_value(chat.status())?;
    assert_eq!(status["state"], "closed");
    assert_eq!(status["manual_close_requested"], true);

    Ok(())
}
