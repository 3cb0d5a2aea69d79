//! Wire-format tests for the command/response/result contract
//!
//! The type tags and field names are a compatibility contract with the
//! control panel; these tests pin them down exactly.

use keywatch::protocol::{
    Command, GroupInfo, MonitorConfig, MonitorEvent, Response, ResponseKind, WorkerMessage,
    decode_line, encode_line,
};
use serde_json::{Value, json};

fn to_value<T: serde::Serialize>(message: &T) -> Value {
    serde_json::to_value(message).unwrap()
}

#[test]
fn test_command_wire_tags() {
    assert_eq!(to_value(&Command::Connect), json!({"type": "connect"}));
    assert_eq!(
        to_value(&Command::SendCode {
            phone: "+8613800000000".to_string()
        }),
        json!({"type": "send_code", "phone": "+8613800000000"})
    );
    assert_eq!(
        to_value(&Command::GetDialogs),
        json!({"type": "get_dialogs"})
    );
    assert_eq!(
        to_value(&Command::StopMonitor),
        json!({"type": "stop_monitor"})
    );
    assert_eq!(
        to_value(&Command::Disconnect),
        json!({"type": "disconnect"})
    );
}

#[test]
fn test_verify_code_omits_absent_password() {
    let without = to_value(&Command::VerifyCode {
        code: "12345".to_string(),
        password: None,
    });
    assert_eq!(without, json!({"type": "verify_code", "code": "12345"}));

    let with = to_value(&Command::VerifyCode {
        code: "12345".to_string(),
        password: Some("hunter2".to_string()),
    });
    assert_eq!(with["password"], "hunter2");
}

#[test]
fn test_start_monitor_roundtrip_and_default_interval() {
    let command = Command::StartMonitor {
        target_group_id: 42,
        keywords: vec!["buy".to_string()],
        messages: vec!["hello".to_string()],
        interval: 3,
    };
    let value = to_value(&command);
    assert_eq!(value["type"], "start_monitor");
    assert_eq!(value["target_group_id"], 42);
    assert_eq!(value["interval"], 3);

    // interval defaults to 1 when the sender omits it
    let decoded: Command = serde_json::from_value(json!({
        "type": "start_monitor",
        "target_group_id": 42,
        "keywords": ["buy"],
        "messages": ["hello"],
    }))
    .unwrap();
    assert_eq!(
        decoded,
        Command::StartMonitor {
            target_group_id: 42,
            keywords: vec!["buy".to_string()],
            messages: vec!["hello".to_string()],
            interval: 1,
        }
    );
}

#[test]
fn test_response_wire_tags() {
    let response = Response::ConnectResponse {
        success: true,
        is_authorized: Some(false),
        message: None,
        error: None,
    };
    assert_eq!(
        to_value(&response),
        json!({"type": "connect_response", "success": true, "is_authorized": false})
    );

    let response = Response::VerifyResponse {
        success: false,
        message: None,
        error: Some("need_password".to_string()),
    };
    assert_eq!(
        to_value(&response),
        json!({"type": "verify_response", "success": false, "error": "need_password"})
    );

    let response = Response::Disconnected { success: true };
    assert_eq!(
        to_value(&response),
        json!({"type": "disconnected", "success": true})
    );
}

#[test]
fn test_dialogs_response_group_fields() {
    let response = Response::DialogsResponse {
        success: true,
        groups: Some(vec![GroupInfo {
            id: 7,
            title: "群聊 7".to_string(),
            username: String::new(),
            participants_count: 0,
        }]),
        error: None,
    };
    assert_eq!(
        to_value(&response),
        json!({
            "type": "dialogs_response",
            "success": true,
            "groups": [
                {"id": 7, "title": "群聊 7", "username": "", "participants_count": 0}
            ],
        })
    );
}

#[test]
fn test_response_kind_matches_wire_tag() {
    let responses = [
        Response::ConnectResponse {
            success: true,
            is_authorized: None,
            message: None,
            error: None,
        },
        Response::CodeSent {
            success: true,
            message: None,
            error: None,
        },
        Response::VerifyResponse {
            success: true,
            message: None,
            error: None,
        },
        Response::DialogsResponse {
            success: true,
            groups: None,
            error: None,
        },
        Response::MonitorStarted {
            success: true,
            message: None,
            error: None,
        },
        Response::MonitorStopped {
            success: true,
            message: None,
            error: None,
        },
        Response::Disconnected { success: true },
    ];
    for response in responses {
        let value = to_value(&response);
        assert_eq!(value["type"], response.kind().as_str());
    }
}

#[test]
fn test_result_wire_tags() {
    assert_eq!(
        to_value(&MonitorEvent::MessageSent {
            content: "a".to_string()
        }),
        json!({"type": "message_sent", "content": "a"})
    );
    assert_eq!(
        to_value(&MonitorEvent::Error {
            error: "发送消息失败: boom".to_string()
        }),
        json!({"type": "error", "error": "发送消息失败: boom"})
    );
}

#[test]
fn test_worker_message_envelope() {
    let message = WorkerMessage::Response(Response::Disconnected { success: true });
    assert_eq!(
        to_value(&message),
        json!({
            "channel": "response",
            "payload": {"type": "disconnected", "success": true},
        })
    );

    let message = WorkerMessage::Result(MonitorEvent::MessageSent {
        content: "a".to_string(),
    });
    assert_eq!(
        to_value(&message),
        json!({
            "channel": "result",
            "payload": {"type": "message_sent", "content": "a"},
        })
    );
}

#[test]
fn test_line_codec_roundtrip() {
    let command = Command::SendCode {
        phone: "+10000000000".to_string(),
    };
    let line = encode_line(&command).unwrap();
    assert!(line.ends_with('\n'));
    let decoded: Command = decode_line(&line).unwrap();
    assert_eq!(decoded, command);
}

#[test]
fn test_decode_rejects_malformed_input() {
    assert!(decode_line::<Command>("not valid json").is_err());
    assert!(decode_line::<Command>(r#"{"type": "reboot"}"#).is_err());
    assert!(decode_line::<Command>(r#"{"type": "send_code"}"#).is_err());
}

#[test]
fn test_keyword_match_is_case_sensitive_substring() {
    let config = MonitorConfig {
        target_group_id: 1,
        keywords: vec!["buy".to_string(), "sell".to_string()],
        messages: Vec::new(),
        interval: 0,
    };
    assert!(config.matches("buy now cheap"));
    assert!(config.matches("time to sell everything"));
    assert!(!config.matches("nothing here"));
    assert!(!config.matches("Buy now"));
}

#[test]
fn test_command_kind_is_wire_tag() {
    assert_eq!(Command::Connect.kind(), "connect");
    assert_eq!(Command::StopMonitor.kind(), "stop_monitor");
    assert_eq!(ResponseKind::CodeSent.as_str(), "code_sent");
    assert_eq!(ResponseKind::DialogsResponse.as_str(), "dialogs_response");
}
