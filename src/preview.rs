use bytes::Bytes;
use parking_lot::Mutex;
use std::{collections::HashMap, fmt, sync::Arc};
use uuid::Uuid;

#[derive(Clone)]
struct StoredPreview {
    bytes: Bytes,
    content_type: String,
}

/// Display handles for uploaded images, served at `/previews/{id}`.
///
/// An entry lives exactly as long as its [`PreviewHandle`].
#[derive(Clone, Default)]
pub struct PreviewRegistry {
    entries: Arc<Mutex<HashMap<Uuid, StoredPreview>>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, bytes: Bytes, content_type: &str) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.entries.lock().insert(
            id,
            StoredPreview {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        tracing::debug!("Acquired preview handle {}", id);

        PreviewHandle {
            id,
            registry: self.clone(),
        }
    }

    /// Returns the bytes and content type behind a live handle.
    pub fn get(&self, id: &Uuid) -> Option<(Bytes, String)> {
        self.entries
            .lock()
            .get(id)
            .map(|preview| (preview.bytes.clone(), preview.content_type.clone()))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn release(&self, id: &Uuid) {
        if self.entries.lock().remove(id).is_some() {
            tracing::debug!("Released preview handle {}", id);
        }
    }
}

pub struct PreviewHandle {
    id: Uuid,
    registry: PreviewRegistry,
}

impl PreviewHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> String {
        format!("/previews/{}", self.id)
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.release(&self.id);
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle").field("id", &self.id).finish()
    }
}

/// What the page renders for the selected image.
#[derive(Debug)]
pub enum Preview {
    /// Handle derived from uploaded bytes, released on drop.
    Derived(PreviewHandle),
    /// An example asset's own path; nothing to release.
    Asset(String),
}

impl Preview {
    pub fn url(&self) -> String {
        match self {
            Preview::Derived(handle) => handle.url(),
            Preview::Asset(path) => path.clone(),
        }
    }
}
