//! Pending-redirect slot: the destination a guest was bounced away from,
//! replayed once after a successful login.

use std::path::PathBuf;

use parking_lot::Mutex;

/// Single persisted destination path.
///
/// Storage failures are logged and swallowed; the guard must always reach
/// a decision.
pub trait RedirectSlot: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, path: &str);
    fn clear(&self);

    /// Read and clear in one step.
    fn take(&self) -> Option<String> {
        let path = self.get();
        if path.is_some() {
            self.clear();
        }
        path
    }
}

/// Slot that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryRedirectSlot {
    path: Mutex<Option<String>>,
}

impl MemoryRedirectSlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RedirectSlot for MemoryRedirectSlot {
    fn get(&self) -> Option<String> {
        self.path.lock().clone()
    }

    fn set(&self, path: &str) {
        *self.path.lock() = Some(path.to_string());
    }

    fn clear(&self) {
        *self.path.lock() = None;
    }

    fn take(&self) -> Option<String> {
        self.path.lock().take()
    }
}

/// Slot stored in a small file, so it survives restarts.
#[derive(Debug, Clone)]
pub struct FileRedirectSlot {
    path: PathBuf,
}

impl FileRedirectSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RedirectSlot for FileRedirectSlot {
    fn get(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let content = content.trim();
                (!content.is_empty()).then(|| content.to_string())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "Failed to read redirect slot");
                None
            }
        }
    }

    fn set(&self, path: &str) {
        let result = self
            .path
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|()| std::fs::write(&self.path, path));
        if let Err(e) = result {
            tracing::warn!(error = %e, path = %self.path.display(), "Failed to store redirect slot");
        }
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "Failed to clear redirect slot");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_slot() {
        let slot = MemoryRedirectSlot::new();
        assert_eq!(slot.get(), None);
        slot.set("/home/lotes");
        assert_eq!(slot.get().as_deref(), Some("/home/lotes"));
        slot.clear();
        assert_eq!(slot.get(), None);

        slot.set("/home/graficos");
        assert_eq!(slot.take().as_deref(), Some("/home/graficos"));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_file_slot_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("state").join("redirect");

        FileRedirectSlot::new(&file).set("/home/produtos");
        let reopened = FileRedirectSlot::new(&file);
        assert_eq!(reopened.get().as_deref(), Some("/home/produtos"));

        assert_eq!(reopened.take().as_deref(), Some("/home/produtos"));
        assert_eq!(reopened.get(), None);
        assert!(!file.exists());
        // clearing twice is fine
        reopened.clear();
    }
}
