//! Conversation history, keyed by session id

use std::sync::Arc;

use crate::error::Result;
use crate::store::RecordStore;
use crate::types::{ChatMessage, HISTORY_WINDOW};

const COLLECTION: &str = "conversations";

/// JSON-backed chat transcripts. The full history is persisted; only the
/// trailing window is handed to the model.
#[derive(Clone)]
pub struct ConversationsRepo {
    store: Arc<RecordStore>,
}

impl ConversationsRepo {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Full transcript for a session, oldest first. Unknown sessions are
    /// empty, not an error.
    pub fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let map = self.store.load_map::<Vec<ChatMessage>>(COLLECTION)?;
        Ok(map.get(session_id).cloned().unwrap_or_default())
    }

    /// The last `HISTORY_WINDOW` messages of a session.
    pub fn window(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        let mut history = self.history(session_id)?;
        let len = history.len();
        if len > HISTORY_WINDOW {
            history.drain(..len - HISTORY_WINDOW);
        }
        Ok(history)
    }

    pub fn append(&self, session_id: &str, messages: &[ChatMessage]) -> Result<()> {
        let lock = self.store.collection_lock(COLLECTION);
        let _guard = lock.lock();

        let mut map = self.store.load_map::<Vec<ChatMessage>>(COLLECTION)?;
        map.entry(session_id.to_string())
            .or_default()
            .extend_from_slice(messages);
        self.store.save_map(COLLECTION, &map)
    }

    pub fn sessions(&self) -> Result<Vec<String>> {
        let map = self.store.load_map::<Vec<ChatMessage>>(COLLECTION)?;
        Ok(map.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn repo(dir: &std::path::Path) -> ConversationsRepo {
        ConversationsRepo::new(Arc::new(RecordStore::open(dir).unwrap()))
    }

    #[test]
    fn unknown_session_is_empty() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());
        assert!(repo.history("nope").unwrap().is_empty());
        assert!(repo.window("nope").unwrap().is_empty());
    }

    #[test]
    fn append_keeps_sessions_separate() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());
        repo.append("a", &[ChatMessage::user("hi")]).unwrap();
        repo.append("b", &[ChatMessage::user("yo")]).unwrap();
        repo.append("a", &[ChatMessage::assistant("hello")]).unwrap();

        assert_eq!(repo.history("a").unwrap().len(), 2);
        assert_eq!(repo.history("b").unwrap().len(), 1);
        assert_eq!(repo.sessions().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn window_trims_to_last_ten_but_history_keeps_all() {
        let dir = tempdir().unwrap();
        let repo = repo(dir.path());
        for i in 0..13 {
            repo.append("s", &[ChatMessage::user(&format!("msg {i}"))])
                .unwrap();
        }

        assert_eq!(repo.history("s").unwrap().len(), 13);
        let window = repo.window("s").unwrap();
        assert_eq!(window.len(), HISTORY_WINDOW);
        assert_eq!(window[0].content, "msg 3");
        assert_eq!(window.last().unwrap().content, "msg 12");
    }
}
