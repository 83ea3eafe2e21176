//! Shared document store.
//!
//! Readers get whole-document snapshots from an `ArcSwap`; writers are
//! serialized by one mutex and publish a complete replacement document.
//! A reader therefore never sees a partially applied load or upsert.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use super::{BlockId, Document, DocumentError, TextBlock};
use crate::utils::hash;

type Result<T> = std::result::Result<T, DocumentError>;

/// State owned by the single writer at a time.
#[derive(Default)]
struct WriterState {
    /// Fingerprint of what `save_to_file` wrote, until the file is next looked at
    own_write: Option<u64>,
}

/// Owner of the process-wide document.
pub struct DocumentStore {
    current: ArcSwap<Document>,
    writer: Mutex<WriterState>,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_document(Document::new())
    }

    pub fn with_document(document: Document) -> Self {
        Self {
            current: ArcSwap::from_pointee(document),
            writer: Mutex::new(WriterState::default()),
        }
    }

    /// Snapshot of the whole document.
    ///
    /// The snapshot stays valid (and unchanged) after later writes.
    pub fn get_all(&self) -> Arc<Document> {
        self.current.load_full()
    }

    pub fn get_one(&self, id: BlockId) -> Result<TextBlock> {
        self.current
            .load()
            .get(&id)
            .cloned()
            .ok_or(DocumentError::NotFound(id))
    }

    /// Insert or replace the block at `id`.
    pub fn upsert(&self, id: BlockId, block: TextBlock) -> Result<()> {
        block.validate()?;

        let _writer = self.writer.lock();
        let mut next = Document::clone(&self.current.load());
        next.insert(id, block);
        self.current.store(Arc::new(next));
        Ok(())
    }

    /// Replace the whole document with the file's contents as block 0.
    ///
    /// On read failure the previous document is kept as is.
    pub fn load_from_file(&self, path: &Path) -> Result<()> {
        let contents = read_contents(path)?;

        let mut writer = self.writer.lock();
        writer.own_write = None;
        let document = Document::from([(0, TextBlock::from_file_contents(contents))]);
        self.current.store(Arc::new(document));
        Ok(())
    }

    /// Whether `path` holds exactly what the last [`save_to_file`](Self::save_to_file)
    /// wrote, i.e. a change event for it is the echo of our own write.
    ///
    /// The saved fingerprint is consumed, so only the first look after a save
    /// can match; any later change of the file is a real one.
    pub fn take_own_write(&self, path: &Path) -> Result<bool> {
        // a save in progress finishes before the file is read
        let mut writer = self.writer.lock();
        let contents = read_contents(path)?;
        Ok(writer.own_write.take() == Some(hash::compute(&contents)))
    }

    /// Write block 0's text to `path`, truncating existing content.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let mut writer = self.writer.lock();
        let document = self.current.load();
        let block = document.get(&0).ok_or(DocumentError::NotFound(0))?;

        fs::write(path, &block.text).map_err(|e| DocumentError::io(path, e))?;
        writer.own_write = Some(hash::compute(&block.text));
        Ok(())
    }
}

fn read_contents(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| DocumentError::io(path, e))
}
