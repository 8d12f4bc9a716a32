//! Per-session conversational state
//!
//! Each session holds at most one document, its index, and an append-only
//! transcript. Sessions are isolated from each other; the manager only hands
//! out short-lived locked access so no lock is held across an await.

use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::retrieval::ChunkIndex;
use crate::types::{Document, Role, Turn};

/// State of one conversational session
pub struct Session {
    /// Session ID
    pub id: Uuid,
    /// Active document, if one has been uploaded
    document: Option<Document>,
    /// Index over the document's chunks
    index: Option<Arc<ChunkIndex>>,
    /// Ordered transcript of question/answer turns
    transcript: Vec<Turn>,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            document: None,
            index: None,
            transcript: Vec::new(),
            created_at: chrono::Utc::now(),
        }
    }

    /// Active document, if any
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Built index, if any
    pub fn index(&self) -> Option<Arc<ChunkIndex>> {
        self.index.clone()
    }

    /// Whether an index has been built
    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    /// Ordered transcript turns
    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    /// Attach a document and its index
    ///
    /// A document and its index always arrive together: an index exists only
    /// while a document does.
    pub fn attach_document(&mut self, document: Document, index: Arc<ChunkIndex>) -> Result<()> {
        if self.document.is_some() {
            return Err(Error::DocumentExists(self.id));
        }
        self.document = Some(document);
        self.index = Some(index);
        Ok(())
    }

    /// Append a turn to the transcript
    ///
    /// Turns may only be recorded while an index exists.
    pub fn record(&mut self, role: Role, content: impl Into<String>) -> Result<()> {
        if self.index.is_none() {
            return Err(Error::NoIndex(self.id));
        }
        self.transcript.push(Turn::new(role, content));
        Ok(())
    }

    /// Clear document, index, and transcript wholesale
    ///
    /// Returns the document that was active, so the caller can release its
    /// on-disk copy and cache entry. Idempotent.
    pub fn reset(&mut self) -> Option<Document> {
        self.index = None;
        self.transcript.clear();
        self.document.take()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of active sessions
pub struct SessionManager {
    sessions: DashMap<Uuid, Session>,
}

impl SessionManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Create a new session and return its ID
    pub fn create(&self) -> Uuid {
        let session = Session::new();
        let id = session.id;
        self.sessions.insert(id, session);
        id
    }

    /// Run a closure with shared access to a session
    pub fn with_session<T>(&self, id: Uuid, f: impl FnOnce(&Session) -> T) -> Result<T> {
        let session = self
            .sessions
            .get(&id)
            .ok_or(Error::SessionNotFound(id))?;
        Ok(f(&session))
    }

    /// Run a closure with exclusive access to a session
    ///
    /// The closure must not await; the session stays locked for its duration.
    pub fn with_session_mut<T>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> T) -> Result<T> {
        let mut session = self
            .sessions
            .get_mut(&id)
            .ok_or(Error::SessionNotFound(id))?;
        Ok(f(&mut session))
    }

    /// Number of active sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether any sessions exist
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
