//! Database schema and types

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS interactions (
    conversation_id TEXT PRIMARY KEY,
    timestamp INTEGER NOT NULL,
    session_id TEXT NOT NULL,
    user_message TEXT NOT NULL,
    bot_response TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_interactions_session ON interactions(session_id, timestamp);
";

/// One logged question/answer exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub session_id: String,
    pub question_text: String,
    pub answer_text: String,
    /// Epoch seconds at write time
    pub created_at: i64,
}

impl Interaction {
    pub fn new(
        session_id: impl Into<String>,
        question_text: impl Into<String>,
        answer_text: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            question_text: question_text.into(),
            answer_text: answer_text.into(),
            created_at,
        }
    }

    /// Row key: session plus write second.
    ///
    /// Two interactions for one session in the same second share a key and
    /// the later write replaces the earlier one.
    pub fn conversation_id(&self) -> String {
        format!("{}#{}", self.session_id, self.created_at)
    }
}
