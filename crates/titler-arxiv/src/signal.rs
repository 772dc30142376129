use serde_json::Value;
use tracing::debug;

/// Requests relayed into a page from the surrounding shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundSignal {
    /// Re-assert the last resolved title once.
    UpdateTitle,
    /// Build the citation snippet and put it on the clipboard.
    CopyPaperToClipboard,
}

impl InboundSignal {
    pub const COPY_FUNCTION: &'static str = "copyPaperToClipboard";

    /// Decode a relayed message.
    ///
    /// Payloads without a `functiontoInvoke` field (plain strings, `null`, bare
    /// objects) are the generic "update title" nudge. Objects naming a function
    /// other than the copy export are ignored.
    pub fn from_message(message: &Value) -> Option<Self> {
        match message.get("functiontoInvoke") {
            None => Some(Self::UpdateTitle),
            Some(Value::String(function)) if function == Self::COPY_FUNCTION => {
                Some(Self::CopyPaperToClipboard)
            }
            Some(other) => {
                debug!(function = %other, "ignoring message for unknown function");
                None
            }
        }
    }

    /// Decode one line of relayed JSON. Lines that are not JSON are treated as
    /// plain-text nudges.
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(message) => Self::from_message(&message),
            Err(_) => Some(Self::UpdateTitle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_string_is_update() {
        assert_eq!(
            InboundSignal::from_message(&json!("update-page-title.")),
            Some(InboundSignal::UpdateTitle)
        );
        assert_eq!(InboundSignal::from_message(&Value::Null), Some(InboundSignal::UpdateTitle));
    }

    #[test]
    fn copy_payload() {
        assert_eq!(
            InboundSignal::from_message(&json!({"functiontoInvoke": "copyPaperToClipboard"})),
            Some(InboundSignal::CopyPaperToClipboard)
        );
    }

    #[test]
    fn unknown_function_ignored() {
        assert_eq!(
            InboundSignal::from_message(&json!({"functiontoInvoke": "launchRockets"})),
            None
        );
    }

    #[test]
    fn lines() {
        assert_eq!(InboundSignal::from_line("   "), None);
        assert_eq!(InboundSignal::from_line("update"), Some(InboundSignal::UpdateTitle));
        assert_eq!(
            InboundSignal::from_line(r#"{"functiontoInvoke":"copyPaperToClipboard"}"#),
            Some(InboundSignal::CopyPaperToClipboard)
        );
    }
}
