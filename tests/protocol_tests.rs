use base64::Engine;
use medeasy_voice::protocol::{InboundEnvelope, OutboundEnvelope, SessionResult};
use medeasy_voice::SessionError;
use serde_json::json;
use std::path::PathBuf;

#[test]
fn test_outbound_envelope_serialization() {
    let envelope = OutboundEnvelope::new(
        "처방전 사진 업로드",
        Some("UPLOAD_PRESCRIPTION_PHOTO".to_string()),
        Some(json!("aW1hZ2U=")),
    );

    let json = envelope.to_frame().unwrap();
    assert!(json.contains("\"server_action\":\"UPLOAD_PRESCRIPTION_PHOTO\""));
    assert!(json.contains("\"data\":\"aW1hZ2U=\""));

    let deserialized: OutboundEnvelope = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.message, "처방전 사진 업로드");
    assert_eq!(deserialized, envelope);
}

#[test]
fn test_outbound_envelope_always_carries_all_keys() {
    let envelope = OutboundEnvelope::new("안녕", None, None);
    let value: serde_json::Value = serde_json::from_str(&envelope.to_frame().unwrap()).unwrap();

    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 3);
    assert!(object["server_action"].is_null());
    assert!(object["data"].is_null());
}

#[test]
fn test_inbound_routine_reply_deserialization() {
    let json = r#"{
        "result_code": 200,
        "result_message": "OK",
        "text_message": "오늘 아침 약을 드실 시간입니다.",
        "audio_base64": "SUQz",
        "audio_format": "mp3",
        "client_action": "SHOW_ROUTINE_LIST",
        "data": [{"routine_id": 1, "taken": false}]
    }"#;

    let envelope = InboundEnvelope::decode(json).unwrap();
    assert!(envelope.is_success());
    assert_eq!(envelope.audio_format(), "mp3");
    assert_eq!(
        envelope.decode_audio().unwrap(),
        Some(base64::engine::general_purpose::STANDARD.decode("SUQz").unwrap())
    );

    let result = SessionResult::from_envelope(envelope, Some(PathBuf::from("/tmp/a.mp3")));
    assert_eq!(result.text.as_deref(), Some("오늘 아침 약을 드실 시간입니다."));
    assert_eq!(result.action.as_deref(), Some("SHOW_ROUTINE_LIST"));
    assert_eq!(result.data, Some(json!([{"routine_id": 1, "taken": false}])));
    assert_eq!(result.file_path, Some(PathBuf::from("/tmp/a.mp3")));
}

#[test]
fn test_inbound_minimal_greeting() {
    let envelope = InboundEnvelope::decode(r#"{"result_code": 200, "text_message": "안녕하세요"}"#)
        .unwrap();

    assert!(envelope.is_success());
    assert_eq!(envelope.decode_audio().unwrap(), None);
    assert!(envelope.client_action.is_none());
}

#[test]
fn test_inbound_error_reply() {
    let envelope =
        InboundEnvelope::decode(r#"{"result_code": 401, "result_message": "Unauthorized"}"#)
            .unwrap();

    assert!(!envelope.is_success());
    match envelope.server_error() {
        SessionError::Server { code, message } => {
            assert_eq!(code, 401);
            assert_eq!(message, "Unauthorized");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_inbound_rejects_garbage() {
    assert!(matches!(
        InboundEnvelope::decode("{\"text_message\": \"no code\"}"),
        Err(SessionError::Decode(_))
    ));
    assert!(matches!(
        InboundEnvelope::decode("not json"),
        Err(SessionError::Decode(_))
    ));
}

#[test]
fn test_invalid_audio_payload() {
    let envelope = InboundEnvelope::decode(
        r#"{"result_code": 200, "audio_base64": "@@not base64@@"}"#,
    )
    .unwrap();

    assert!(matches!(
        envelope.decode_audio(),
        Err(SessionError::Decode(_))
    ));
}
