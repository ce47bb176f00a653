//! Upload lifecycle controller.
//!
//! The controller owns one [`UploadSession`] and drives it through
//! `idle -> uploading -> success | error`. Submission is split in three
//! steps so the caller can keep handling user actions while a request is in
//! flight:
//!
//! 1. [`UploadController::begin_submit`] moves the session to `uploading`
//!    and hands out an [`ExtractionTicket`] tagged with the session
//!    generation.
//! 2. [`ExtractionTicket::run`] performs the request without borrowing the
//!    controller.
//! 3. [`UploadController::complete`] applies the outcome, unless a select
//!    or reset happened in the meantime, in which case it is dropped.
//!
//! [`UploadController::submit`] runs all three in sequence.

use tracing::{debug, info, warn};

use super::{UploadSession, UploadStatus};
use crate::client::{ExtractOptions, ExtractionClient};
use crate::document::InvoiceFile;
use crate::error::CaptureError;
use crate::models::config::UploadPolicy;
use crate::models::invoice::ExtractionResult;
use crate::preview::{MemoryPreviewStore, PreviewStore};
use crate::Result;

/// A submission in flight: the file snapshot and the generation it belongs to.
#[derive(Debug, Clone)]
pub struct ExtractionTicket {
    generation: u64,
    file: InvoiceFile,
    options: ExtractOptions,
}

impl ExtractionTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn file(&self) -> &InvoiceFile {
        &self.file
    }

    /// Perform the extraction request. The client is called exactly once.
    pub async fn run<C>(self, client: &C) -> CompletedExtraction
    where
        C: ExtractionClient + ?Sized,
    {
        let outcome = client.extract(&self.file, self.options).await;
        CompletedExtraction {
            generation: self.generation,
            outcome,
        }
    }
}

/// Outcome of a ticket, ready to be applied to the session.
#[derive(Debug)]
pub struct CompletedExtraction {
    generation: u64,
    outcome: Result<ExtractionResult>,
}

impl CompletedExtraction {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn outcome(&self) -> &Result<ExtractionResult> {
        &self.outcome
    }
}

/// What [`UploadController::complete`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The outcome was stored; the session now has this status.
    Current(UploadStatus),
    /// The session moved on since the ticket was issued; nothing changed.
    Stale,
}

/// Owns an upload session and mediates every change to it.
pub struct UploadController<C, P = MemoryPreviewStore> {
    client: C,
    previews: P,
    options: ExtractOptions,
    policy: UploadPolicy,
    session: UploadSession,
}

impl<C, P> UploadController<C, P>
where
    C: ExtractionClient,
    P: PreviewStore,
{
    /// Create a controller with an empty session.
    pub fn new(client: C, previews: P) -> Self {
        Self {
            client,
            previews,
            options: ExtractOptions::default(),
            policy: UploadPolicy::default(),
            session: UploadSession::default(),
        }
    }

    /// Set the options sent with every submission.
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the advisory upload policy.
    pub fn with_policy(mut self, policy: UploadPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn session(&self) -> &UploadSession {
        &self.session
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn previews(&self) -> &P {
        &self.previews
    }

    /// Select a file, replacing any previous file, preview, result or error.
    ///
    /// Returns the upload policy warnings for the file. They are advisory
    /// only; the file is selected regardless.
    pub fn select_file(&mut self, file: InvoiceFile) -> Vec<String> {
        let warnings = self.policy.check(&file);
        for warning in &warnings {
            warn!("{}", warning);
        }

        self.release_preview();
        let preview = self.previews.open(&file);

        let session = &mut self.session;
        session.generation += 1;
        session.file = Some(file);
        session.preview = Some(preview);
        session.status = UploadStatus::Idle;
        session.error = None;
        session.result = None;

        debug!("Selected file, generation {}", session.generation);
        warnings
    }

    /// Clear the session back to an empty `idle` state.
    pub fn reset(&mut self) {
        self.release_preview();

        let session = &mut self.session;
        session.generation += 1;
        session.file = None;
        session.status = UploadStatus::Idle;
        session.error = None;
        session.result = None;

        debug!("Reset session, generation {}", session.generation);
    }

    /// Start a submission for the selected file.
    ///
    /// Fails with [`CaptureError::Validation`] when no file is selected (the
    /// message is also stored in the session) and with
    /// [`CaptureError::Busy`] while another request is in flight (the
    /// session is left untouched).
    pub fn begin_submit(&mut self) -> Result<ExtractionTicket> {
        if self.session.is_uploading() {
            warn!("Ignoring submit: a request is already in flight");
            return Err(CaptureError::Busy);
        }

        let Some(file) = self.session.file.clone() else {
            let err = CaptureError::no_file_selected();
            self.session.error = Some(err.to_string());
            return Err(err);
        };

        let session = &mut self.session;
        session.status = UploadStatus::Uploading;
        session.error = None;
        session.result = None;

        info!("Submitting {} (generation {})", file.name(), session.generation);

        Ok(ExtractionTicket {
            generation: session.generation,
            file,
            options: self.options,
        })
    }

    /// Apply a finished extraction to the session.
    pub fn complete(&mut self, completed: CompletedExtraction) -> Applied {
        let session = &mut self.session;

        if completed.generation != session.generation || !session.is_uploading() {
            warn!(
                "Discarding response for generation {} (current generation {})",
                completed.generation, session.generation
            );
            return Applied::Stale;
        }

        match completed.outcome {
            Ok(result) => {
                session.result = Some(result);
                session.status = UploadStatus::Success;
            }
            Err(err) => {
                debug!("Extraction failed: {}", err);
                session.error = Some(err.to_string());
                session.status = UploadStatus::Error;
            }
        }

        Applied::Current(session.status)
    }

    /// Submit the selected file and wait for the outcome.
    ///
    /// Extraction failures do not surface as `Err`: they end in
    /// [`UploadStatus::Error`] with the message stored in the session. Only
    /// the preconditions of [`begin_submit`](Self::begin_submit) are
    /// returned as errors.
    pub async fn submit(&mut self) -> Result<UploadStatus> {
        let ticket = self.begin_submit()?;
        let completed = ticket.run(&self.client).await;

        Ok(match self.complete(completed) {
            Applied::Current(status) => status,
            Applied::Stale => self.session.status,
        })
    }

    fn release_preview(&mut self) {
        if let Some(preview) = self.session.preview.take() {
            if !self.previews.release(preview.id) {
                warn!("Preview {:?} was already released", preview.id);
            }
        }
    }
}
