//! Interfaces to the services a paint session depends on but does not own:
//! image upload, the signed-in user, and page navigation.

use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
use futures::channel::oneshot;
use futures::future::{self, LocalBoxFuture};
use futures::FutureExt as _;
use parking_lot::Mutex;
use thiserror::Error;

use crate::renderer::ExportedImage;

/// Errors reported by an upload collaborator
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload rejected: {0}")]
    Rejected(String),

    #[error("Failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

/// What gets handed to the upload collaborator on save
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub blob: ExportedImage,
    pub owner_id: String,
}

/// Accepts an exported image. Only success or failure is looked at.
pub trait Uploader {
    fn upload(&self, request: UploadRequest) -> LocalBoxFuture<'static, Result<(), UploadError>>;
}

/// Exposes the current user id used to tag uploads
pub trait Auth {
    /// `None` while sign-in has not completed
    fn current_user_id(&self) -> Option<String>;
}

/// Moves the application to another page
pub trait Navigator {
    fn navigate(&mut self, path: &str);
}

/// Anonymous identity minted once per process
#[derive(Debug, Clone)]
pub struct AnonymousAuth {
    uid: String,
}

impl Default for AnonymousAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl AnonymousAuth {
    pub fn new() -> Self {
        Self {
            uid: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl Auth for AnonymousAuth {
    fn current_user_id(&self) -> Option<String> {
        Some(self.uid.clone())
    }
}

/// Keeps uploads in memory. Cloning shares the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    uploads: Arc<Mutex<Vec<UploadRequest>>>,
    reject_with: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following upload fail with `reason` until cleared
    pub fn reject_uploads(&self, reason: Option<&str>) {
        *self.reject_with.lock() = reason.map(str::to_owned);
    }

    pub fn uploads(&self) -> Vec<UploadRequest> {
        self.uploads.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.uploads.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.uploads.lock().is_empty()
    }
}

impl Uploader for MemoryStore {
    fn upload(&self, request: UploadRequest) -> LocalBoxFuture<'static, Result<(), UploadError>> {
        let result = match self.reject_with.lock().clone() {
            Some(reason) => Err(UploadError::Rejected(reason)),
            None => {
                self.uploads.lock().push(request);
                Ok(())
            }
        };
        future::ready(result).boxed_local()
    }
}

/// Writes each upload to `<dir>/<owner>-<uuid>.png`.
///
/// The file system work runs on its own thread; the returned future only
/// waits for the result, so polling it never blocks the UI thread.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl DirectoryStore {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write(dir: &std::path::Path, request: &UploadRequest) -> Result<(), UploadError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}-{}.png", request.owner_id, uuid::Uuid::new_v4()));
        std::fs::write(&path, request.blob.bytes())?;
        log::info!("Stored upload at {}", path.display());
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Uploader for DirectoryStore {
    fn upload(&self, request: UploadRequest) -> LocalBoxFuture<'static, Result<(), UploadError>> {
        let dir = self.dir.clone();
        let (sender, receiver) = oneshot::channel();
        let spawned = std::thread::Builder::new()
            .name("fingerpaint-store".to_owned())
            .spawn(move || {
                // Nobody is left to tell if the receiver is gone.
                let _ = sender.send(Self::write(&dir, &request));
            });
        if let Err(err) = spawned {
            return future::ready(Err(UploadError::Io(err))).boxed_local();
        }

        receiver
            .map(|result| {
                result.unwrap_or_else(|_| {
                    Err(UploadError::Rejected("store thread stopped".to_owned()))
                })
            })
            .boxed_local()
    }
}

/// Records navigation requests for the shell to act on. Cloning shares the queue.
#[derive(Debug, Clone, Default)]
pub struct RouteQueue {
    pending: Arc<Mutex<Vec<String>>>,
}

impl RouteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every path requested since the last call
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.pending.lock())
    }
}

impl Navigator for RouteQueue {
    fn navigate(&mut self, path: &str) {
        log::info!("Navigate to {}", path);
        self.pending.lock().push(path.to_owned());
    }
}
