#[cfg(test)]
mod tests {
    use crate::message::*;
    use crate::protocol::*;
    use crate::event::*;
    use crate::connection::*;
    use crate::config::*;
    use crate::error::*;

    // ─── Message Tests ───────────────────────────────────────

    #[test]
    fn test_user_message_starts_pending() {
        let msg = Message::user("Show my emails");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.state, LifecycleState::Pending);
        assert_eq!(msg.content, "Show my emails");
        assert!(msg.correlated_request_id.is_none());
        assert!(msg.error_detail.is_none());
        assert!(msg.id.starts_with("msg_"));
    }

    #[test]
    fn test_assistant_message_starts_received() {
        let msg = Message::assistant("You have 3 unread emails");
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.state, LifecycleState::Received);
    }

    #[test]
    fn test_message_ids_are_unique() {
        let ids: std::collections::HashSet<String> =
            (0..500).map(|_| Message::user("x").id).collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_error_notice_is_marked() {
        let msg = Message::error_notice("HTTP error! status: 500");
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.state, LifecycleState::Received);
        assert!(msg.content.starts_with(ERROR_MARKER));
        assert!(msg.content.contains("status: 500"));
        assert!(msg.is_error_notice());
        assert!(!msg.is_history_eligible());
    }

    #[test]
    fn test_history_eligibility() {
        let mut user = Message::user("hi");
        assert!(!user.is_history_eligible());
        user.state = LifecycleState::Sending;
        assert!(!user.is_history_eligible());
        user.state = LifecycleState::Error;
        assert!(!user.is_history_eligible());
        user.state = LifecycleState::Sent;
        assert!(user.is_history_eligible());

        assert!(Message::assistant("hello").is_history_eligible());
    }

    #[test]
    fn test_history_entry_trims_and_stamps() {
        let msg = Message::user("  padded  ");
        let entry = msg.to_history_entry();
        assert_eq!(entry.content, "padded");
        assert_eq!(entry.id.as_deref(), Some(msg.id.as_str()));
        let ts = entry.timestamp.unwrap();
        assert!(ts.ends_with('Z'), "expected UTC timestamp, got {}", ts);
    }

    #[test]
    fn test_lifecycle_transitions() {
        use LifecycleState::*;
        assert!(Pending.can_transition_to(Sending));
        assert!(Pending.can_transition_to(Error));
        assert!(Sending.can_transition_to(Sent));
        assert!(Sending.can_transition_to(Error));

        assert!(!Sent.can_transition_to(Error));
        assert!(!Error.can_transition_to(Sending));
        assert!(!Sending.can_transition_to(Pending));
        assert!(!Received.can_transition_to(Sent));
        assert!(!Pending.can_transition_to(Sent));
    }

    #[test]
    fn test_lifecycle_classification() {
        use LifecycleState::*;
        assert!(Pending.is_outstanding());
        assert!(Sending.is_outstanding());
        assert!(!Sent.is_outstanding());
        for s in [Sent, Error, Received] {
            assert!(s.is_terminal());
        }
        assert_eq!(LifecycleState::initial_for(Role::User), Pending);
        assert_eq!(LifecycleState::initial_for(Role::Assistant), Received);
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""user""#);
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), r#""assistant""#);
        let role: Role = serde_json::from_str(r#""assistant""#).unwrap();
        assert_eq!(role, Role::Assistant);
    }

    #[test]
    fn test_iso_timestamp_has_millis() {
        let at = chrono::DateTime::parse_from_rfc3339("2026-03-01T09:30:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        assert_eq!(iso_timestamp(at), "2026-03-01T09:30:00.000Z");
    }

    // ─── Protocol Tests ──────────────────────────────────────

    #[test]
    fn test_chat_request_wire_shape() {
        let req = ChatRequest {
            message: "Schedule a meeting".to_string(),
            session_id: "s-1".to_string(),
            history: vec![HistoryEntry {
                role: Role::User,
                content: "hi".to_string(),
                timestamp: None,
                id: None,
            }],
            request_id: "req_1_1".to_string(),
            timestamp: "2026-03-01T09:30:00.000Z".to_string(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["message"], "Schedule a meeting");
        assert_eq!(value["session_id"], "s-1");
        assert_eq!(value["request_id"], "req_1_1");
        assert_eq!(value["history"][0]["role"], "user");
        // Optional history fields are omitted, not null
        assert!(value["history"][0].get("timestamp").is_none());
        assert!(value["history"][0].get("id").is_none());
    }

    #[test]
    fn test_chat_response_parses_without_agent() {
        let json = r#"{
            "response": "You have no meetings today.",
            "session_id": "s-1",
            "timestamp": "2026-03-01T09:30:01.000Z",
            "request_id": "req_1_1"
        }"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.response, "You have no meetings today.");
        assert!(resp.agent_used.is_none());
    }

    #[test]
    fn test_chat_response_with_agent() {
        let json = r#"{"response":"ok","session_id":"s","timestamp":"t","request_id":"r","agent_used":"calendar"}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.agent_used.as_deref(), Some("calendar"));
    }

    #[test]
    fn test_chat_response_missing_field_is_error() {
        let json = r#"{"response":"ok","session_id":"s"}"#;
        assert!(serde_json::from_str::<ChatResponse>(json).is_err());
    }

    #[test]
    fn test_socket_frame_is_tagged_chat() {
        let frame = SocketFrame::Chat(ChatRequest {
            message: "hello".to_string(),
            session_id: "s".to_string(),
            history: Vec::new(),
            request_id: "req_9_9".to_string(),
            timestamp: "t".to_string(),
        });
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "chat");
        assert_eq!(value["message"], "hello");
        assert_eq!(value["request_id"], "req_9_9");
    }

    #[test]
    fn test_session_info_parses() {
        let json = r#"[{"session_id":"a","created_at":"2026-01-01","message_count":4}]"#;
        let sessions: Vec<SessionInfo> = serde_json::from_str(json).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].message_count, 4);
    }

    // ─── Connection Tests ────────────────────────────────────

    #[test]
    fn test_connection_default_is_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
        assert!(!ConnectionState::default().is_connected());
    }

    #[test]
    fn test_connection_transitions() {
        use ConnectionSignal::*;
        use ConnectionState::*;
        assert_eq!(Disconnected.transition(ProbeStarted), Connecting);
        assert_eq!(Connecting.transition(ProbeSucceeded), Connected);
        assert_eq!(Connecting.transition(ProbeFailed), Disconnected);
        assert_eq!(Connected.transition(TransportFailed), Disconnected);
        assert_eq!(Connected.transition(Closed), Disconnected);
        assert_eq!(Connected.transition(ProbeStarted), Connecting);
    }

    #[test]
    fn test_connection_labels() {
        assert_eq!(ConnectionState::Connecting.label(), "connecting");
        assert_eq!(ConnectionState::Connected.label(), "connected");
        assert_eq!(ConnectionState::Disconnected.label(), "disconnected");
    }

    // ─── Event Tests ─────────────────────────────────────────

    #[test]
    fn test_client_event_serialization() {
        let event = ClientEvent::CorrelationMismatch {
            expected: "req_1_1".to_string(),
            received: "req_1_2".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("CorrelationMismatch"));
        assert!(json.contains("req_1_2"));
    }

    // ─── Config Tests ────────────────────────────────────────

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.transport, TransportKind::Http);
        assert_eq!(config.inter_request_delay_ms, 100);
        assert_eq!(config.reconnect_delay_ms, 2000);
        assert_eq!(config.session_storage_key, "sessionId");
        assert_eq!(config.mismatch_policy, MismatchPolicy::Advisory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_partial_override() {
        let config = ClientConfig::from_json(
            r#"{"backend_url":"https://assistant.example.com/","transport":"websocket"}"#,
        )
        .unwrap();
        assert_eq!(config.transport, TransportKind::WebSocket);
        assert_eq!(config.base_url(), "https://assistant.example.com");
        assert_eq!(config.reconnect_delay_ms, 2000);
    }

    #[test]
    fn test_config_rejects_bad_url() {
        let err = ClientConfig::from_json(r#"{"backend_url":"ftp://x"}"#).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
        let err = ClientConfig::from_json(r#"{"backend_url":"  "}"#).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_config_rejects_malformed_json() {
        let err = ClientConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ClientError::Serialization(_)));
    }

    #[test]
    fn test_socket_url() {
        let mut config = ClientConfig::default();
        assert_eq!(config.socket_url("abc"), "ws://localhost:8000/ws/abc");
        config.backend_url = "https://host.example/".to_string();
        assert_eq!(config.socket_url("abc"), "wss://host.example/ws/abc");
    }

    #[test]
    fn test_mismatch_policy_serialization() {
        assert_eq!(serde_json::to_string(&MismatchPolicy::Strict).unwrap(), r#""strict""#);
    }

    // ─── Error Tests ─────────────────────────────────────────

    #[test]
    fn test_error_display() {
        assert_eq!(ClientError::Http { status: 503 }.to_string(), "HTTP error! status: 503");
        assert_eq!(ClientError::Cancelled.to_string(), "Cancelled");
        let refused: ClientError = AdmissionError::NotConnected {
            state: ConnectionState::Disconnected,
        }
        .into();
        assert_eq!(refused.to_string(), "Submission refused: backend is disconnected");
        assert_eq!(
            AdmissionError::Busy { pending: 1 }.to_string(),
            "1 message(s) still pending"
        );
    }

    #[test]
    fn test_transport_classification() {
        assert!(ClientError::Network("down".to_string()).is_transport());
        assert!(ClientError::Http { status: 500 }.is_transport());
        assert!(ClientError::MalformedResponse("eof".to_string()).is_transport());
        assert!(!ClientError::Cancelled.is_transport());
        assert!(!ClientError::CorrelationMismatch {
            expected: "a".to_string(),
            received: "b".to_string(),
        }
        .is_transport());
        assert!(!ClientError::Admission(AdmissionError::EmptyMessage).is_transport());
    }

    #[test]
    fn test_error_from_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{{bad").unwrap_err();
        let err: ClientError = serde_err.into();
        assert!(matches!(err, ClientError::Serialization(_)));
    }
}
