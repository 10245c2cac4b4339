//! Rendering-ready records.
//!
//! A [`ChatEntry`] is what the view appends to the visible history; a
//! [`StatusUpdate`] drives the connection indicator.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

use super::InboundFrame;

// ============================================================================
// Constants
// ============================================================================

/// Label used for server notices and local diagnostics.
const SYSTEM_LABEL: &str = "system";

/// Label used for echoed debug frames.
const DEBUG_LABEL: &str = "debug";

/// Label used for server error frames.
const ERROR_LABEL: &str = "error";

/// Sender label used when a message carries no `from`.
const ANONYMOUS_LABEL: &str = "?";

// ============================================================================
// EntryKind
// ============================================================================

/// Visual category of a chat entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Server notice or local diagnostic.
    System,
    /// Message from another room member.
    Peer,
    /// Message authored by this client.
    #[serde(rename = "self")]
    Own,
    /// Error reported by the server.
    Error,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::System => "system",
            Self::Peer => "peer",
            Self::Own => "self",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

// ============================================================================
// ChatEntry
// ============================================================================

/// One line of chat history.
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatEntry {
    kind: EntryKind,
    label: String,
    text: String,
}

impl ChatEntry {
    /// Creates an entry.
    #[inline]
    #[must_use]
    pub fn new(kind: EntryKind, label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            text: text.into(),
        }
    }

    /// Creates a `system` entry labelled "system".
    #[inline]
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(EntryKind::System, SYSTEM_LABEL, text)
    }

    /// Entry announcing a completed join.
    #[must_use]
    pub fn joined(name: &str, room: &str) -> Self {
        Self::system(format!("You joined the {room} as {name}."))
    }

    /// Diagnostic shown when a send is refused.
    #[must_use]
    pub fn not_connected() -> Self {
        Self::system("not connected")
    }

    /// Projects an inbound frame onto exactly one entry.
    #[must_use]
    pub fn from_frame(frame: &InboundFrame) -> Self {
        match frame {
            InboundFrame::System { text } => Self::system(text.as_deref().unwrap_or_default()),

            InboundFrame::Msg { from, text } => Self::new(
                EntryKind::Peer,
                from.as_deref().unwrap_or(ANONYMOUS_LABEL),
                text.as_deref().unwrap_or_default(),
            ),

            InboundFrame::DebugJoin { raw } => {
                Self::new(EntryKind::System, DEBUG_LABEL, format!("debug_join: {raw}"))
            }

            InboundFrame::DebugMsg { raw } => {
                Self::new(EntryKind::System, DEBUG_LABEL, format!("debug_msg: {raw}"))
            }

            InboundFrame::Error { text } => Self::new(
                EntryKind::Error,
                ERROR_LABEL,
                text.as_deref().unwrap_or("unknown error"),
            ),

            InboundFrame::Unknown { raw } => Self::system(format!("unknown payload: {raw}")),

            InboundFrame::Malformed { raw } => Self::system(format!("non-json from server: {raw}")),
        }
    }

    /// Returns the visual category.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Returns the label (sender name or channel).
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the entry body.
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl From<&InboundFrame> for ChatEntry {
    fn from(frame: &InboundFrame) -> Self {
        Self::from_frame(frame)
    }
}

// ============================================================================
// StatusUpdate
// ============================================================================

/// Connection indicator color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    /// Connected.
    Ok,
    /// Disconnected or failed.
    Bad,
    /// Transitioning.
    Idle,
}

/// Status line shown next to the connection indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    /// Indicator state.
    #[serde(rename = "connectionHealth")]
    pub health: Health,
    /// Status text.
    pub text: String,
}

impl StatusUpdate {
    /// Creates a status update.
    #[inline]
    #[must_use]
    pub fn new(health: Health, text: impl Into<String>) -> Self {
        Self {
            health,
            text: text.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::{Value, json};

    fn project(payload: &str) -> ChatEntry {
        ChatEntry::from_frame(&InboundFrame::decode(payload))
    }

    #[test]
    fn test_peer_message() {
        let entry = project(r#"{"type":"msg","from":"bob","text":"hi"}"#);
        assert_eq!(entry, ChatEntry::new(EntryKind::Peer, "bob", "hi"));
    }

    #[test]
    fn test_peer_message_without_sender() {
        let entry = project(r#"{"type":"msg","text":"hi"}"#);
        assert_eq!(entry.label(), "?");
        assert_eq!(entry.kind(), EntryKind::Peer);
    }

    #[test]
    fn test_system_notice() {
        let entry = project(r#"{"type":"system","text":"welcome to SimpleChat","room":"lobby"}"#);
        assert_eq!(entry, ChatEntry::system("welcome to SimpleChat"));

        let empty = project(r#"{"type":"system"}"#);
        assert_eq!(empty.text(), "");
    }

    #[test]
    fn test_debug_frames_echo_payload() {
        let entry = project(r#"{"type":"debug_msg","client_id":1,"user":"alice","text":"x"}"#);
        assert_eq!(entry.kind(), EntryKind::System);
        assert_eq!(entry.label(), "debug");
        assert_eq!(
            entry.text(),
            r#"debug_msg: {"type":"debug_msg","client_id":1,"user":"alice","text":"x"}"#
        );
    }

    #[test]
    fn test_error_frame() {
        let entry = project(r#"{"type":"error","text":"missing text"}"#);
        assert_eq!(entry, ChatEntry::new(EntryKind::Error, "error", "missing text"));

        let fallback = project(r#"{"type":"error"}"#);
        assert_eq!(fallback.text(), "unknown error");
    }

    #[test]
    fn test_unknown_payload() {
        let entry = project(r#"{"type":"typing","user":"bob"}"#);
        assert_eq!(
            entry,
            ChatEntry::system(r#"unknown payload: {"type":"typing","user":"bob"}"#)
        );
    }

    #[test]
    fn test_non_json_payload() {
        let entry = project("not json");
        assert_eq!(
            entry,
            ChatEntry::new(EntryKind::System, "system", "non-json from server: not json")
        );
    }

    #[test]
    fn test_joined_text() {
        assert_eq!(
            ChatEntry::joined("alice", "lobby").text(),
            "You joined the lobby as alice."
        );
    }

    #[test]
    fn test_entry_serialization() {
        let json = serde_json::to_string(&ChatEntry::new(EntryKind::Own, "me", "yo"))
            .expect("serialize");
        assert_eq!(json, r#"{"kind":"self","label":"me","text":"yo"}"#);

        let status = serde_json::to_string(&StatusUpdate::new(Health::Idle, "connecting…"))
            .expect("serialize");
        assert_eq!(status, r#"{"connectionHealth":"idle","text":"connecting…"}"#);
    }

    /// Wire payloads of every shape the server may send, plus garbage.
    fn payload() -> impl Strategy<Value = String> {
        let text = "[a-zA-Z0-9 ]{0,12}";
        prop_oneof![
            text.prop_map(|t| json!({ "type": "system", "text": t }).to_string()),
            (text, text).prop_map(|(from, t)| json!({ "type": "msg", "from": from, "text": t })
                .to_string()),
            ("debug_join|debug_msg", text)
                .prop_map(|(tag, user)| json!({ "type": tag, "user": user }).to_string()),
            text.prop_map(|t| json!({ "type": "error", "text": t }).to_string()),
            "[a-z_]{1,10}".prop_map(|tag| json!({ "type": tag, "x": 1 }).to_string()),
            ".*",
        ]
    }

    proptest! {
        #[test]
        fn prop_every_payload_yields_one_entry(payloads in prop::collection::vec(payload(), 0..32)) {
            let entries: Vec<ChatEntry> = payloads.iter().map(|p| project(p)).collect();
            prop_assert_eq!(entries.len(), payloads.len());

            for (payload, entry) in payloads.iter().zip(&entries) {
                let Ok(value) = serde_json::from_str::<Value>(payload) else {
                    prop_assert_eq!(entry.text(), format!("non-json from server: {payload}"));
                    continue;
                };

                let tag = value.get("type").and_then(Value::as_str);
                let text = value.get("text").and_then(Value::as_str).unwrap_or_default();
                match tag {
                    Some("system") => prop_assert_eq!(entry, &ChatEntry::system(text)),
                    Some("msg") => {
                        prop_assert_eq!(entry.kind(), EntryKind::Peer);
                        prop_assert_eq!(entry.text(), text);
                    }
                    Some("error") => prop_assert_eq!(entry.kind(), EntryKind::Error),
                    Some(tag @ ("debug_join" | "debug_msg")) => {
                        prop_assert_eq!(entry.label(), "debug");
                        prop_assert_eq!(entry.text(), format!("{tag}: {value}"));
                    }
                    _ => prop_assert_eq!(entry.text(), format!("unknown payload: {value}")),
                }
            }
        }
    }
}
