//! Submission orchestration.
//!
//! An [`Orchestrator`] drives one submission at a time through
//! `Idle -> Validating -> Uploading -> Succeeded | Failed`. Validation failures
//! never touch the network; transport failures are classified before they
//! reach the caller. After a terminal state the orchestrator must be
//! [`reset`](Orchestrator::reset) before it accepts another file.

use mediascope_core::{
    classify, AnalysisMode, AnalysisResult, ClassificationContext, ErrorMetadata, ImageResult,
    LogLevel, MediaConstraints, MediaFile, MediaKind, MediaValidator, ProgressCallback,
    ProgressEvent, ProgressReporter, SubmissionError, SubmissionState, TimeoutPolicy,
    TransportError, UploadRequest, VideoResult,
};
use serde_json::Value as JsonValue;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::preview::LocalResource;
use crate::transport::Transport;

type ResourceList = Arc<Mutex<Vec<Box<dyn LocalResource>>>>;

/// How to submit a file through [`Orchestrator::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOptions {
    pub kind: MediaKind,
    /// Ignored for images.
    pub analysis_mode: AnalysisMode,
}

impl SubmitOptions {
    pub fn image() -> Self {
        Self {
            kind: MediaKind::Image,
            analysis_mode: AnalysisMode::default(),
        }
    }

    pub fn video(analysis_mode: AnalysisMode) -> Self {
        Self {
            kind: MediaKind::Video,
            analysis_mode,
        }
    }
}

/// Cancels the submission it was taken from. Cheap to clone and safe to use
/// from any task.
#[derive(Clone)]
pub struct CancelHandle {
    token: CancellationToken,
    resources: ResourceList,
}

impl CancelHandle {
    /// Abort the in-flight request and release held resources.
    ///
    /// Resources are released before this returns. Calling it more than once,
    /// or after the submission finished, has no further effect.
    pub fn cancel(&self) {
        self.token.cancel();
        release_all(&self.resources);
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

fn release_all(resources: &ResourceList) {
    let drained = match resources.lock() {
        Ok(mut held) => std::mem::take(&mut *held),
        Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
    };

    if !drained.is_empty() {
        tracing::debug!(count = drained.len(), "Releasing local resources");
    }
    for mut resource in drained {
        resource.release();
    }
}

pub struct Orchestrator {
    id: Uuid,
    transport: Arc<dyn Transport>,
    constraints: MediaConstraints,
    timeouts: TimeoutPolicy,
    state: watch::Sender<SubmissionState>,
    cancel: CancellationToken,
    resources: ResourceList,
}

impl Orchestrator {
    pub fn new(
        transport: Arc<dyn Transport>,
        constraints: MediaConstraints,
        timeouts: TimeoutPolicy,
    ) -> Self {
        let (state, _) = watch::channel(SubmissionState::Idle);
        Self {
            id: Uuid::new_v4(),
            transport,
            constraints,
            timeouts,
            state,
            cancel: CancellationToken::new(),
            resources: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Identifier of the current submission, used in logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SubmissionState {
        *self.state.borrow()
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            token: self.cancel.clone(),
            resources: self.resources.clone(),
        }
    }

    pub fn cancel(&self) {
        self.cancel_handle().cancel();
    }

    /// Keep `resource` alive until the submission is cancelled, reset or dropped.
    pub fn hold_resource(&self, resource: impl LocalResource + 'static) {
        let mut resource: Box<dyn LocalResource> = Box::new(resource);
        let mut held = match self.resources.lock() {
            Ok(held) => held,
            Err(poisoned) => poisoned.into_inner(),
        };

        // Checked under the lock so a concurrent `cancel()` cannot miss it.
        if self.cancel.is_cancelled() {
            drop(held);
            resource.release();
            return;
        }
        held.push(resource);
    }

    /// Return to `Idle`, releasing resources. Cancel handles taken before the
    /// reset no longer affect this orchestrator.
    pub fn reset(&mut self) {
        release_all(&self.resources);
        self.resources = Arc::new(Mutex::new(Vec::new()));
        self.cancel = CancellationToken::new();
        self.id = Uuid::new_v4();
        self.state.send_replace(SubmissionState::Idle);
    }

    pub async fn submit_image<F>(
        &self,
        file: MediaFile,
        on_progress: F,
    ) -> Result<ImageResult, SubmissionError>
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        self.begin(MediaKind::Image, &file)?;
        self.check(MediaKind::Image, &file)?;

        let timeout = self.timeouts.image_timeout();
        self.upload(
            UploadRequest::image(file),
            timeout,
            Arc::new(on_progress),
            ImageResult::from_payload,
        )
        .await
    }

    pub async fn submit_video<F>(
        &self,
        file: MediaFile,
        on_progress: F,
        analysis_mode: AnalysisMode,
    ) -> Result<VideoResult, SubmissionError>
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        self.begin(MediaKind::Video, &file)?;
        self.check(MediaKind::Video, &file)?;

        let timeout = self.timeouts.video_timeout(file.size());
        self.upload(
            UploadRequest::video(file, analysis_mode),
            timeout,
            Arc::new(on_progress),
            VideoResult::from_payload,
        )
        .await
    }

    /// Dispatch on `options.kind`.
    pub async fn submit<F>(
        &self,
        file: MediaFile,
        on_progress: F,
        options: SubmitOptions,
    ) -> Result<AnalysisResult, SubmissionError>
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        match options.kind {
            MediaKind::Image => self
                .submit_image(file, on_progress)
                .await
                .map(AnalysisResult::Image),
            MediaKind::Video => self
                .submit_video(file, on_progress, options.analysis_mode)
                .await
                .map(AnalysisResult::Video),
        }
    }

    fn begin(&self, kind: MediaKind, file: &MediaFile) -> Result<(), SubmissionError> {
        let mut current = SubmissionState::Idle;
        let started = self.state.send_if_modified(|state| {
            current = *state;
            if *state == SubmissionState::Idle {
                *state = SubmissionState::Validating;
                true
            } else {
                false
            }
        });

        if !started {
            tracing::warn!(
                submission_id = %self.id,
                state = %current,
                "Submission rejected: orchestrator busy"
            );
            return Err(SubmissionError::NotIdle(current));
        }

        tracing::debug!(
            submission_id = %self.id,
            kind = %kind,
            file = %file.name(),
            size = file.size(),
            mime_type = %file.mime_type(),
            "Validating file"
        );
        Ok(())
    }

    fn check(&self, kind: MediaKind, file: &MediaFile) -> Result<(), SubmissionError> {
        let validator = MediaValidator::new(self.constraints.for_kind(kind));
        if let Err(err) = validator.validate(file) {
            tracing::debug!(
                submission_id = %self.id,
                error_code = err.error_code(),
                error = %err,
                "File rejected"
            );
            self.transition(SubmissionState::Failed);
            return Err(err.into());
        }
        Ok(())
    }

    async fn upload<R>(
        &self,
        request: UploadRequest,
        timeout: Duration,
        on_progress: ProgressCallback,
        normalize: fn(JsonValue) -> Result<R, serde_json::Error>,
    ) -> Result<R, SubmissionError> {
        let kind = request.kind;
        let size = request.file.size();
        let context = ClassificationContext::new(kind, size, timeout)
            .with_max_size(self.constraints.for_kind(kind).max_size_bytes);
        let reporter = Arc::new(ProgressReporter::new(size, on_progress));

        self.transition(SubmissionState::Uploading);
        tracing::info!(
            submission_id = %self.id,
            kind = %kind,
            size = size,
            timeout_ms = timeout.as_millis() as u64,
            "Uploading file for analysis"
        );

        let started = Instant::now();
        let outcome = if self.cancel.is_cancelled() {
            Err(TransportError::Aborted)
        } else {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(TransportError::Aborted),
                result = self.transport.upload(
                    request,
                    timeout,
                    reporter.clone(),
                    self.cancel.clone(),
                ) => result,
            }
        };
        let outcome = outcome.and_then(|payload| {
            normalize(payload).map_err(|e| TransportError::InvalidResponse(e.to_string()))
        });

        // No progress may reach the caller once the submission is terminal.
        reporter.close();

        match outcome {
            Ok(result) => {
                self.transition(SubmissionState::Succeeded);
                tracing::info!(
                    submission_id = %self.id,
                    kind = %kind,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Analysis completed"
                );
                Ok(result)
            }
            Err(err) => {
                let classified = classify(&err, &context);
                self.log_failure(&err, &classified);
                self.transition(SubmissionState::Failed);
                Err(classified.into())
            }
        }
    }

    fn log_failure(&self, cause: &TransportError, error: &impl ErrorMetadata) {
        let code = error.error_code();
        let retriable = error.is_retriable();
        match error.log_level() {
            LogLevel::Debug => {
                tracing::debug!(
                    submission_id = %self.id,
                    error_code = code,
                    retriable,
                    cause = %cause,
                    "Analysis failed"
                )
            }
            LogLevel::Warn => {
                tracing::warn!(
                    submission_id = %self.id,
                    error_code = code,
                    retriable,
                    cause = %cause,
                    "Analysis failed"
                )
            }
            LogLevel::Error => {
                tracing::error!(
                    submission_id = %self.id,
                    error_code = code,
                    retriable,
                    cause = %cause,
                    "Analysis failed"
                )
            }
        }
    }

    fn transition(&self, next: SubmissionState) {
        self.state.send_modify(|state| {
            if !state.can_transition_to(next) {
                tracing::warn!(from = %state, to = %next, "Unexpected state transition");
            }
            *state = next;
        });
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        release_all(&self.resources);
    }
}
