//! Draft autosave controller.
//!
//! Edits land in local state immediately. A background task debounces them
//! and persists each settled value through a [`DraftStore`]: the first save of
//! a new draft creates the record, later saves update it in place.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::debounce::Debouncer;
use crate::domain::Post;
use crate::ports::DraftStore;

/// Autosave configuration.
#[derive(Debug, Clone)]
pub struct AutosaveConfig {
    /// Quiescence delay after the last edit before a value is persisted.
    pub delay: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(500),
        }
    }
}

/// Save state shown next to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// Nothing persisted during this session yet.
    Idle,
    Saving,
    Saved,
    /// Last save failed. Local edits are kept; the next settled edit retries.
    Failed,
}

/// Title and content as currently typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftEdit {
    pub title: String,
    pub content: String,
}

impl DraftEdit {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    fn is_blank(&self) -> bool {
        self.title.is_empty() && self.content.is_empty()
    }
}

/// Handle to one editing session.
///
/// Dropping the handle stops scheduling saves. A save already in flight is
/// left to finish in the background.
pub struct AutosaveController {
    edits: watch::Sender<DraftEdit>,
    status: watch::Receiver<SaveStatus>,
    post_id: watch::Receiver<Option<Uuid>>,
    worker: JoinHandle<()>,
}

impl AutosaveController {
    /// Start autosaving. `existing` is the post being edited, if any; its
    /// current title and content count as already saved.
    pub fn spawn(
        store: Arc<dyn DraftStore>,
        existing: Option<&Post>,
        config: AutosaveConfig,
    ) -> Self {
        let initial = existing
            .map(|post| DraftEdit::new(post.title.clone(), post.content.clone()))
            .unwrap_or_default();
        let id = existing.map(|post| post.id);

        let (edits_tx, edits_rx) = watch::channel(initial.clone());
        let (status_tx, status_rx) = watch::channel(SaveStatus::Idle);
        let (id_tx, id_rx) = watch::channel(id);

        let worker = Worker {
            store,
            edits: edits_rx,
            debouncer: Debouncer::new(config.delay),
            last_saved: initial,
            post_id: id,
            status: status_tx,
            id_tx,
        };

        Self {
            edits: edits_tx,
            status: status_rx,
            post_id: id_rx,
            worker: tokio::spawn(worker.run()),
        }
    }

    /// Replace both fields.
    pub fn edit(&self, title: impl Into<String>, content: impl Into<String>) {
        self.edits.send_replace(DraftEdit::new(title, content));
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.edits.send_modify(|edit| edit.title = title);
    }

    pub fn set_content(&self, content: impl Into<String>) {
        let content = content.into();
        self.edits.send_modify(|edit| edit.content = content);
    }

    /// Latest local edit, saved or not.
    pub fn current(&self) -> DraftEdit {
        self.edits.borrow().clone()
    }

    pub fn status(&self) -> SaveStatus {
        *self.status.borrow()
    }

    /// Subscribe to status changes.
    pub fn status_changes(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    /// Id of the persisted record, once the first save created it.
    pub fn post_id(&self) -> Option<Uuid> {
        *self.post_id.borrow()
    }

    /// Stop scheduling saves and wait for an in-flight save to finish.
    /// Edits that have not settled yet are dropped.
    pub async fn close(self) {
        let Self { edits, worker, .. } = self;
        drop(edits);
        if let Err(e) = worker.await {
            tracing::error!(error = %e, "Autosave worker failed");
        }
    }
}

struct Worker {
    store: Arc<dyn DraftStore>,
    edits: watch::Receiver<DraftEdit>,
    debouncer: Debouncer<DraftEdit>,
    /// Last value known to be persisted. A failed save leaves it unchanged.
    last_saved: DraftEdit,
    post_id: Option<Uuid>,
    status: watch::Sender<SaveStatus>,
    id_tx: watch::Sender<Option<Uuid>>,
}

impl Worker {
    async fn run(mut self) {
        let mut open = true;

        while open {
            tokio::select! {
                changed = self.edits.changed() => match changed {
                    Ok(()) => {
                        let edit = self.edits.borrow_and_update().clone();
                        self.debouncer.push(edit);
                    }
                    Err(_) => open = false,
                },
                edit = self.debouncer.settled() => open = self.settle(edit).await,
            }
        }

        if self.debouncer.cancel().is_some() {
            tracing::debug!(post_id = ?self.post_id, "Autosave closed with unsettled edits");
        }
    }

    /// Persist a settled value. Returns whether the edit channel is still open.
    async fn settle(&mut self, edit: DraftEdit) -> bool {
        if edit == self.last_saved {
            return true;
        }

        if self.post_id.is_none() && edit.is_blank() {
            return true;
        }

        let attempted = edit.clone();

        let _ = self.status.send_replace(SaveStatus::Saving);

        let store = self.store.clone();
        let id = self.post_id;
        let save = async move {
            match id {
                Some(id) => store.save_draft(id, &edit.title, &edit.content).await,
                None => store.create_draft(&edit.title, &edit.content).await,
            }
        };
        tokio::pin!(save);

        // Keep debouncing new edits while the save is in flight.
        let mut open = true;
        let result = loop {
            tokio::select! {
                result = &mut save => break result,
                changed = self.edits.changed(), if open => match changed {
                    Ok(()) => {
                        let edit = self.edits.borrow_and_update().clone();
                        self.debouncer.push(edit);
                    }
                    Err(_) => open = false,
                },
            }
        };

        match result {
            Ok(post) => {
                self.last_saved = attempted;
                if self.post_id.is_none() {
                    tracing::debug!(post_id = %post.id, "Draft created by autosave");
                    self.post_id = Some(post.id);
                    let _ = self.id_tx.send_replace(Some(post.id));
                }
                let _ = self.status.send_replace(SaveStatus::Saved);
            }
            Err(e) => {
                tracing::warn!(post_id = ?self.post_id, error = %e, "Autosave failed");
                let _ = self.status.send_replace(SaveStatus::Failed);
            }
        }

        open
    }
}
