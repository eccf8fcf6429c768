use crate::error::Result;
use crate::model::Document;

pub const DEFAULT_LIMIT: usize = 50;

// Entries are JSON strings, so later edits to the live document never reach
// a stored snapshot.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<String>,
    cursor: usize,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(DEFAULT_LIMIT)
    }
}

impl History {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            limit: limit.max(1),
        }
    }

    pub fn commit(&mut self, doc: &Document) -> Result<()> {
        let snapshot = serde_json::to_string(doc)?;
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(snapshot);
        if self.entries.len() > self.limit {
            let overflow = self.entries.len() - self.limit;
            self.entries.drain(0..overflow);
        }
        self.cursor = self.entries.len() - 1;
        tracing::debug!(entries = self.entries.len(), "history commit");
        Ok(())
    }

    pub fn undo(&mut self) -> Option<Document> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    pub fn redo(&mut self) -> Option<Document> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn current(&self) -> Option<Document> {
        let entry = self.entries.get(self.cursor)?;
        match serde_json::from_str(entry) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!("history entry {} unreadable: {e}", self.cursor);
                None
            }
        }
    }
}
