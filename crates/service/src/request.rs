use serde::{Deserialize, Serialize};

/// A question asked within an existing conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The conversation the question belongs to.
    pub conversation_id: String,
    /// The question text, already trimmed by the caller.
    pub question: String,
    /// Asks the service to consult live data sources, if it supports it.
    ///
    /// `None` leaves the decision to the service.
    #[serde(
        rename = "use_realtime",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub realtime: Option<bool>,
}

impl ChatRequest {
    /// Creates a request without a realtime preference.
    #[inline]
    pub fn new<I: Into<String>, Q: Into<String>>(
        conversation_id: I,
        question: Q,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            question: question.into(),
            realtime: None,
        }
    }

    /// Sets the realtime preference.
    #[inline]
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = Some(realtime);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_wire_shape() {
        let req = ChatRequest::new("abc123", "How do I open a PR?");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "conversation_id": "abc123",
                "question": "How do I open a PR?"
            })
        );

        let req = req.with_realtime(true);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "conversation_id": "abc123",
                "question": "How do I open a PR?",
                "use_realtime": true
            })
        );
    }
}
