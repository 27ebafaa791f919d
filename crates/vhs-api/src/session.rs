//! Upload session state machine.
//!
//! One session per connection. Envelopes are handled strictly in order and
//! every handled envelope produces exactly one acknowledgment. Once the
//! declared size has arrived the scratch file is closed and processing is
//! handed to the [`PipelineScheduler`]; from then on the pipeline owns the
//! scratch directories.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use validator::Validate;

use vhs_models::{StartUpload, TransferEnvelope, UploadAck, UserId, VideoEntity, VideoId};
use vhs_store::{FileSource, FileStore, RecordStore, StoreError};
use vhs_worker::{PipelineJob, PipelineScheduler, ScratchCleanup, ScratchLayout};

/// Logical name of the preview attached to every placeholder.
pub const DEFAULT_PREVIEW_NAME: &str = "default_preview.jpg";

pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that end an upload session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Auth error: {0}")]
    Auth(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Validation(_) => "validation",
            SessionError::Auth(_) => "auth",
            SessionError::Transport(_) => "transport",
            SessionError::Store(_) => "store",
            SessionError::Io(_) => "io",
        }
    }
}

/// Lifecycle of an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingStart,
    Transferring,
    Finalizing,
    Completed,
    Cancelled,
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingStart => "awaiting_start",
            SessionState::Transferring => "transferring",
            SessionState::Finalizing => "finalizing",
            SessionState::Completed => "completed",
            SessionState::Cancelled => "cancelled",
            SessionState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Cancelled | SessionState::Failed
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collaborators shared by every session.
#[derive(Clone)]
pub struct UploadContext {
    pub records: Arc<dyn RecordStore>,
    pub files: Arc<dyn FileStore>,
    pub scheduler: Arc<dyn PipelineScheduler>,
    pub scratch_root: PathBuf,
    /// Encoded image attached as the preview of new placeholders
    pub default_preview: Arc<Vec<u8>>,
}

/// Transfer in progress.
struct Transfer {
    video_id: VideoId,
    owner: UserId,
    scratch: ScratchLayout,
    file: Option<File>,
    size: u64,
    bytes_written: u64,
}

/// Server side of one upload connection.
pub struct UploadSession {
    ctx: UploadContext,
    state: SessionState,
    transfer: Option<Transfer>,
}

impl UploadSession {
    pub fn new(ctx: UploadContext) -> Self {
        Self {
            ctx,
            state: SessionState::Idle,
            transfer: None,
        }
    }

    /// The connection is open; wait for the start envelope.
    pub fn accept(&mut self) {
        if self.state == SessionState::Idle {
            self.state = SessionState::AwaitingStart;
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn video_id(&self) -> Option<&VideoId> {
        self.transfer.as_ref().map(|t| &t.video_id)
    }

    pub fn bytes_written(&self) -> u64 {
        self.transfer.as_ref().map_or(0, |t| t.bytes_written)
    }

    /// Handle one envelope.
    ///
    /// On error the session is failed and its scratch state removed; the
    /// caller sends the error acknowledgment and closes the connection.
    pub async fn handle(&mut self, envelope: TransferEnvelope) -> SessionResult<UploadAck> {
        let kind = envelope.kind();
        let result = match envelope {
            TransferEnvelope::Start(request) => self.start(request).await,
            TransferEnvelope::Chunk(data) => self.chunk(&data).await,
            TransferEnvelope::Cancel => self.cancel().await,
        };

        if let Err(e) = &result {
            warn!(
                envelope = kind,
                state = %self.state,
                video_id = ?self.video_id(),
                error = %e,
                "Upload envelope rejected"
            );
            self.abort().await;
        }
        result
    }

    /// Fail the session and remove its scratch state.
    ///
    /// Does nothing once the session has ended; a completed upload's
    /// scratch directories belong to the pipeline.
    pub async fn abort(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.state = SessionState::Failed;
        self.cleanup().await;
    }

    async fn start(&mut self, request: StartUpload) -> SessionResult<UploadAck> {
        if self.state != SessionState::AwaitingStart {
            return Err(SessionError::validation(format!(
                "unexpected start envelope in state {}",
                self.state
            )));
        }
        request
            .validate()
            .map_err(|e| SessionError::validation(e.to_string()))?;

        let owner = self
            .ctx
            .records
            .resolve_auth_token(&request.token)
            .await
            .map_err(|e| {
                if e.is_auth() {
                    SessionError::Auth(e.to_string())
                } else {
                    SessionError::Store(e)
                }
            })?;

        let mut video = VideoEntity::placeholder(owner.clone(), request.name.as_str());
        let preview = self
            .ctx
            .files
            .persist(
                &video.id,
                FileSource::Bytes(self.ctx.default_preview.as_ref().clone()),
                DEFAULT_PREVIEW_NAME,
            )
            .await?;
        video.preview = Some(preview.clone());
        let video_id = video.id.clone();
        let video = match self.ctx.records.create(video).await {
            Ok(video) => video,
            Err(e) => {
                // No record references the preview; drop it.
                if let Err(cleanup) = self.ctx.files.remove(&video_id, &preview).await {
                    warn!(video_id = %video_id, error = %cleanup, "Failed to remove orphaned preview");
                }
                return Err(e.into());
            }
        };

        let scratch = ScratchLayout::new(&self.ctx.scratch_root, video.id.clone());
        let path = scratch.upload_file();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Registered before the file is opened so a failed open is cleaned up.
        self.transfer = Some(Transfer {
            video_id: video.id.clone(),
            owner,
            scratch,
            file: None,
            size: request.size,
            bytes_written: 0,
        });
        let file = File::create(&path).await?;
        if let Some(transfer) = self.transfer.as_mut() {
            transfer.file = Some(file);
        }

        self.state = SessionState::Transferring;
        info!(
            video_id = %video.id,
            owner = %video.owner,
            size = request.size,
            "Upload started"
        );
        Ok(UploadAck::part(Some(video.id)))
    }

    async fn chunk(&mut self, data: &[u8]) -> SessionResult<UploadAck> {
        if self.state != SessionState::Transferring {
            return Err(SessionError::validation(format!(
                "unexpected chunk in state {}",
                self.state
            )));
        }
        let transfer = self
            .transfer
            .as_mut()
            .ok_or_else(|| SessionError::validation("no transfer in progress"))?;
        let file = transfer
            .file
            .as_mut()
            .ok_or_else(|| SessionError::validation("upload file is closed"))?;

        file.write_all(data).await?;
        transfer.bytes_written += data.len() as u64;
        debug!(
            video_id = %transfer.video_id,
            bytes_written = transfer.bytes_written,
            size = transfer.size,
            "Chunk written"
        );

        if transfer.bytes_written < transfer.size {
            return Ok(UploadAck::part(None));
        }
        self.finalize().await
    }

    async fn finalize(&mut self) -> SessionResult<UploadAck> {
        self.state = SessionState::Finalizing;
        let transfer = self
            .transfer
            .as_mut()
            .ok_or_else(|| SessionError::validation("no transfer in progress"))?;

        if let Some(mut file) = transfer.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }

        self.ctx.scheduler.schedule(PipelineJob::new(
            transfer.video_id.clone(),
            transfer.scratch.clone(),
        ));
        self.state = SessionState::Completed;

        info!(
            video_id = %transfer.video_id,
            owner = %transfer.owner,
            bytes = transfer.bytes_written,
            "Upload complete, processing scheduled"
        );
        Ok(UploadAck::end(transfer.video_id.clone()))
    }

    async fn cancel(&mut self) -> SessionResult<UploadAck> {
        if self.state.is_terminal() || self.state == SessionState::Finalizing {
            return Err(SessionError::validation(format!(
                "unexpected cancel in state {}",
                self.state
            )));
        }
        self.state = SessionState::Cancelled;
        self.cleanup().await;

        info!(video_id = ?self.video_id(), "Upload cancelled");
        Ok(UploadAck::cancel())
    }

    async fn cleanup(&mut self) {
        let Some(transfer) = self.transfer.as_mut() else {
            return;
        };
        let file = transfer.file.take();
        if let Err(e) = ScratchCleanup::new(transfer.scratch.clone()).run(file).await {
            vhs_worker::metrics::record_cleanup_failures(e.failures.len());
            warn!(
                video_id = %transfer.video_id,
                owner = %transfer.owner,
                error = %e,
                "Upload cleanup incomplete"
            );
        }
    }
}
