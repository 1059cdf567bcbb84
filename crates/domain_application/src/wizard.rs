//! Application wizard state machine
//!
//! ```text
//! Personal ─► Financial ─► LoanDetails ─► Documents ─► Review ─► Submitted
//!    ◄───────────◄─────────────◄─────────────◄──────────┘ (retreat)
//! ```
//!
//! Every committed transition follows the same order: validate, build the
//! next draft, persist it, and only then replace the in-memory state. A
//! failed validation or a failed save therefore leaves both the wizard and
//! the stored draft exactly as they were. The stored draft is cleared only
//! after the submission collaborator has accepted the application; if the
//! clear fails, a submitted marker takes the draft's place so a restarted
//! session cannot submit the same application again.
//!
//! Uploads are split in two so different document types can run side by
//! side: [`ApplicationWizard::start_upload`] claims the type's slot and hands
//! back a [`PendingUpload`] that borrows nothing from the wizard, and each
//! event it yields is folded back in with
//! [`ApplicationWizard::apply_upload_event`].

use chrono::{NaiveDate, Utc};
use futures_util::StreamExt;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use core_kernel::{ApplicationId, PortError, SessionKey, UserId};
use domain_lending::{
    adjust_rate, compare_offers, round_for_display, LendingError, LoanParameters, OfferCatalog, OfferQuote,
};

use crate::application::{Application, SubmittedApplication};
use crate::documents::{DocumentChecklist, DocumentFile, DocumentPolicy, DocumentRecord, DocumentState, DocumentType, UploadEvent};
use crate::draft::{WizardDraft, WizardStep};
use crate::error::{ApplicationError, Operation};
use crate::ports::{ApplicationPort, DocumentStorage, DraftStore, UploadMetadata, UploadStream};
use crate::sections::{FinancialInfo, LoanDetails, PersonalInfo};
use crate::validation::SectionData;

/// The collaborators a wizard session talks to
#[derive(Clone)]
pub struct WizardPorts {
    pub drafts: Arc<dyn DraftStore>,
    pub documents: Arc<dyn DocumentStorage>,
    pub applications: Arc<dyn ApplicationPort>,
}

/// Input for the step being completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepInput {
    Personal(PersonalInfo),
    Financial(FinancialInfo),
    LoanDetails(LoanDetails),
    /// Documents are uploaded one by one; advancing only checks the checklist
    Documents,
}

impl StepInput {
    /// The step this input completes
    pub fn step(&self) -> WizardStep {
        match self {
            StepInput::Personal(_) => WizardStep::Personal,
            StepInput::Financial(_) => WizardStep::Financial,
            StepInput::LoanDetails(_) => WizardStep::LoanDetails,
            StepInput::Documents => WizardStep::Documents,
        }
    }
}

/// Where the session stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    InProgress(WizardStep),
    Submitted(ApplicationId),
}

/// Outcome of a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub application_id: ApplicationId,
    pub application: Application,
    /// False when the draft store failed to clear after submission
    pub draft_cleared: bool,
}

/// Payment estimate shown at review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanEstimate {
    pub principal: Decimal,
    pub term_months: u32,
    /// Annual percent entered by the applicant
    pub requested_rate: Decimal,
    /// Requested rate after the credit tier adjustment
    pub adjusted_rate: Decimal,
    pub monthly_payment: Decimal,
    pub total_payment: Decimal,
    pub total_interest: Decimal,
}

/// An upload handed to document storage and not yet finished
pub struct PendingUpload {
    doc_type: DocumentType,
    events: UploadStream,
    finished: bool,
}

impl PendingUpload {
    pub fn doc_type(&self) -> DocumentType {
        self.doc_type
    }

    /// Waits for the next storage event
    ///
    /// Always yields a `Completed` or `Failed` event before returning `None`;
    /// a stream that ends early is reported as a transport failure.
    pub async fn next_event(&mut self) -> Option<UploadEvent> {
        if self.finished {
            return None;
        }
        let event = self
            .events
            .next()
            .await
            .unwrap_or_else(|| UploadEvent::Failed(PortError::transport("upload ended without a result")));
        self.finished = !matches!(event, UploadEvent::Progress(_));
        Some(event)
    }
}

impl fmt::Debug for PendingUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingUpload")
            .field("doc_type", &self.doc_type)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// A single applicant's wizard session
pub struct ApplicationWizard {
    ports: WizardPorts,
    session: SessionKey,
    user_id: UserId,
    policy: DocumentPolicy,
    draft: WizardDraft,
    checklist: DocumentChecklist,
    submitted: Option<ApplicationId>,
}

impl fmt::Debug for ApplicationWizard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationWizard")
            .field("session", &self.session)
            .field("user_id", &self.user_id)
            .field("step", &self.draft.current_step)
            .field("submitted", &self.submitted)
            .finish_non_exhaustive()
    }
}

impl ApplicationWizard {
    /// Starts a session, resuming the stored draft when there is one
    ///
    /// A stored submitted marker yields a wizard already in the submitted
    /// state; clearing the marker is retried and a failure only logged.
    ///
    /// # Errors
    ///
    /// `Collaborator(LoadDraft)` when the draft store fails.
    pub async fn resume(
        ports: WizardPorts,
        session: SessionKey,
        user_id: UserId,
        policy: DocumentPolicy,
    ) -> Result<Self, ApplicationError> {
        let stored = ports.drafts.load_draft(&session).await.map_err(|e| {
            tracing::warn!(session = %session, error = %e, "Failed to load draft");
            ApplicationError::collaborator(Operation::LoadDraft, e)
        })?;

        let draft = match stored {
            Some(draft) if draft.is_submitted() => {
                let submitted = draft.submitted_as;
                tracing::info!(session = %session, application_id = ?submitted, "Session already submitted");
                if let Err(e) = ports.drafts.clear_draft(&session).await {
                    tracing::warn!(
                        session = %session,
                        operation = %Operation::ClearDraft,
                        error = %e,
                        "Failed to clear submitted marker"
                    );
                }
                return Ok(Self {
                    checklist: DocumentChecklist::from_records(&draft.documents),
                    ports,
                    session,
                    user_id,
                    policy,
                    draft,
                    submitted,
                });
            }
            Some(draft) => {
                tracing::info!(session = %session, step = %draft.current_step, "Resumed draft");
                draft
            }
            None => {
                tracing::info!(session = %session, "Started new draft");
                WizardDraft::new()
            }
        };
        let checklist = DocumentChecklist::from_records(&draft.documents);

        Ok(Self {
            ports,
            session,
            user_id,
            policy,
            draft,
            checklist,
            submitted: None,
        })
    }

    pub fn session(&self) -> &SessionKey {
        &self.session
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn current_step(&self) -> WizardStep {
        self.draft.current_step
    }

    pub fn state(&self) -> WizardState {
        match self.submitted {
            Some(id) => WizardState::Submitted(id),
            None => WizardState::InProgress(self.draft.current_step),
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted.is_some()
    }

    /// The committed draft
    pub fn draft(&self) -> &WizardDraft {
        &self.draft
    }

    pub fn checklist(&self) -> &DocumentChecklist {
        &self.checklist
    }

    pub fn document_state(&self, doc_type: DocumentType) -> DocumentState {
        self.checklist.state(doc_type)
    }

    /// Validates and commits the current step, then moves forward
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` with the field messages; nothing changes
    /// - `DocumentsIncomplete` when leaving the documents step early
    /// - `Collaborator(SaveDraft)` if the draft could not be stored
    /// - `StateViolation` for input meant for another step, or at Review
    pub async fn advance(&mut self, input: StepInput) -> Result<WizardStep, ApplicationError> {
        self.advance_as_of(input, Utc::now().date_naive()).await
    }

    /// [`advance`](Self::advance) with an explicit date for age checks
    pub async fn advance_as_of(
        &mut self,
        input: StepInput,
        today: NaiveDate,
    ) -> Result<WizardStep, ApplicationError> {
        self.ensure_open()?;
        let step = self.draft.current_step;
        let Some(next) = step.next() else {
            return Err(self.violation("advance called at the final step; use submit"));
        };
        if input.step() != step {
            return Err(self.violation(format!(
                "input for step {} given at step {}",
                input.step(),
                step
            )));
        }

        let mut candidate = self.draft.clone();
        let checked = match input {
            StepInput::Personal(info) => info
                .validate_as_of(today)
                .map(|()| candidate.personal_info = info),
            StepInput::Financial(info) => info
                .validate_as_of(today)
                .map(|()| candidate.financial_info = info),
            StepInput::LoanDetails(details) => details
                .validate_as_of(today)
                .map(|()| candidate.loan_details = details),
            StepInput::Documents => Ok(()),
        };
        if let Err(errors) = checked {
            tracing::warn!(session = %self.session, step = %step, fields = errors.len(), "Step validation failed");
            return Err(ApplicationError::ValidationFailed(errors));
        }
        if step == WizardStep::Documents {
            self.checklist.readiness().map_err(|e| {
                tracing::warn!(session = %self.session, error = %e, "Documents incomplete");
                e
            })?;
        }

        candidate.current_step = next;
        self.persist(&candidate).await?;
        self.draft = candidate;
        tracing::info!(session = %self.session, from = %step, to = %next, "Advanced");
        Ok(next)
    }

    /// Moves back one step without validation
    ///
    /// At the first step this does nothing. Only the step pointer changes.
    pub async fn retreat(&mut self) -> Result<WizardStep, ApplicationError> {
        self.ensure_open()?;
        let step = self.draft.current_step;
        let Some(prev) = step.prev() else {
            return Ok(step);
        };

        let candidate = self.draft.clone().with_step(prev);
        self.persist(&candidate).await?;
        self.draft = candidate;
        tracing::info!(session = %self.session, from = %step, to = %prev, "Retreated");
        Ok(prev)
    }

    /// Checks and uploads one document, then records it in the draft
    ///
    /// Drives [`start_upload`](Self::start_upload) and
    /// [`apply_upload_event`](Self::apply_upload_event) to completion.
    ///
    /// # Errors
    ///
    /// As for those two methods.
    pub async fn upload_document(
        &mut self,
        doc_type: DocumentType,
        file: Option<DocumentFile>,
    ) -> Result<DocumentRecord, ApplicationError> {
        let mut upload = self.start_upload(doc_type, file)?;
        while let Some(event) = upload.next_event().await {
            if let Some(record) = self.apply_upload_event(doc_type, event).await? {
                return Ok(record);
            }
        }
        Err(self.violation(format!("upload of {} finished without a result", doc_type)))
    }

    /// Checks a file and hands it to document storage
    ///
    /// Type and size are checked before anything is sent. On success the
    /// type's slot is uploading until its terminal event is applied; further
    /// attempts for that type are refused meanwhile, while other types may
    /// start their own uploads.
    ///
    /// # Errors
    ///
    /// - `UploadRejected` when the file fails the policy checks
    /// - `UploadInProgress` when the same type is already uploading
    /// - `StateViolation` outside the documents step
    pub fn start_upload(
        &mut self,
        doc_type: DocumentType,
        file: Option<DocumentFile>,
    ) -> Result<PendingUpload, ApplicationError> {
        self.ensure_open()?;
        if self.draft.current_step != WizardStep::Documents {
            return Err(self.violation(format!(
                "documents can only be uploaded at step {}",
                WizardStep::Documents
            )));
        }

        self.checklist.begin_validation(doc_type)?;
        let checked = self
            .policy
            .check(doc_type, file.as_ref())
            .and_then(|()| file.ok_or_else(|| "File is required".to_string()));
        let file = match checked {
            Ok(file) => file,
            Err(reason) => {
                tracing::warn!(session = %self.session, doc_type = %doc_type, reason = %reason, "Upload rejected");
                self.checklist.reject(doc_type, reason.clone());
                return Err(ApplicationError::UploadRejected { doc_type, reason });
            }
        };

        self.checklist.begin_upload(doc_type)?;
        let metadata = UploadMetadata {
            file_name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size_bytes: file.size_bytes(),
        };
        let events = self
            .ports
            .documents
            .upload_document(&self.user_id, doc_type, file.bytes, metadata);
        tracing::debug!(session = %self.session, doc_type = %doc_type, "Upload started");
        Ok(PendingUpload {
            doc_type,
            events,
            finished: false,
        })
    }

    /// Folds one upload event into the checklist and draft
    ///
    /// Returns the record once the upload completed and the draft holding it
    /// was saved; `None` for progress. A failed attempt keeps the type's
    /// previous record.
    ///
    /// # Errors
    ///
    /// - `Collaborator(UploadDocument)` when storage reports a failure
    /// - `Collaborator(SaveDraft)` when the record could not be persisted
    /// - `StateViolation` when no upload is running for the type
    pub async fn apply_upload_event(
        &mut self,
        doc_type: DocumentType,
        event: UploadEvent,
    ) -> Result<Option<DocumentRecord>, ApplicationError> {
        if !matches!(self.checklist.state(doc_type), DocumentState::Uploading(_)) {
            return Err(self.violation(format!("no upload running for {}", doc_type)));
        }

        let record = match event {
            UploadEvent::Progress(progress) => {
                tracing::debug!(doc_type = %doc_type, progress, "Upload progress");
                self.checklist.record_progress(doc_type, progress);
                return Ok(None);
            }
            UploadEvent::Completed(record) => record,
            UploadEvent::Failed(e) => {
                tracing::warn!(session = %self.session, doc_type = %doc_type, error = %e, "Upload failed");
                self.checklist.fail(doc_type, e.to_string());
                return Err(ApplicationError::collaborator(Operation::UploadDocument, e));
            }
        };

        let mut candidate = self.draft.clone();
        candidate.documents.insert(doc_type, record.clone());
        if let Err(e) = self.persist(&candidate).await {
            self.checklist.fail(doc_type, e.to_string());
            return Err(e);
        }
        self.draft = candidate;
        self.checklist.complete(doc_type, record.clone());
        tracing::info!(
            session = %self.session,
            doc_type = %doc_type,
            locator = %record.storage_locator,
            "Document uploaded"
        );
        Ok(Some(record))
    }

    /// Dismisses a document error so its previous record shows again
    pub fn clear_document_error(&mut self, doc_type: DocumentType) {
        self.checklist.clear_error(doc_type);
    }

    /// Submits the application from the review step
    ///
    /// The draft is cleared only after the submission collaborator accepted
    /// the application. If the clear fails the draft is overwritten with a
    /// submitted marker instead and [`SubmissionReceipt::draft_cleared`] is
    /// false; the submission itself stands.
    ///
    /// # Errors
    ///
    /// - `StateViolation` outside Review or after a submission
    /// - `DocumentsIncomplete` listing missing, uploading and failed types
    /// - `ValidationFailed` if a committed section no longer validates
    /// - `Collaborator(SubmitApplication)`; the wizard stays at Review and the
    ///   draft is kept
    /// - `DraftRetained` when the application went in but neither the clear
    ///   nor the marker could be stored; the wizard is submitted regardless
    pub async fn submit(&mut self) -> Result<SubmissionReceipt, ApplicationError> {
        self.ensure_open()?;
        if self.draft.current_step != WizardStep::Review {
            return Err(self.violation(format!(
                "submit called at step {}",
                self.draft.current_step
            )));
        }

        self.checklist.readiness().map_err(|e| {
            tracing::warn!(session = %self.session, error = %e, "Submission blocked");
            e
        })?;
        self.revalidate(Utc::now().date_naive())?;

        let application = Application::from_draft(&self.draft, self.user_id.clone(), Utc::now());
        let application_id = self
            .ports
            .applications
            .submit_application(&application)
            .await
            .map_err(|e| {
                tracing::warn!(session = %self.session, error = %e, "Submission failed");
                ApplicationError::collaborator(Operation::SubmitApplication, e)
            })?;

        self.submitted = Some(application_id);
        let draft_cleared = match self.ports.drafts.clear_draft(&self.session).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    session = %self.session,
                    application_id = %application_id,
                    error = %e,
                    "Submitted but failed to clear draft"
                );
                let marker = WizardDraft::submitted(application_id);
                if let Err(save_error) = self.ports.drafts.save_draft(&self.session, &marker).await {
                    tracing::error!(
                        session = %self.session,
                        application_id = %application_id,
                        error = %save_error,
                        "Submitted but draft is still stored"
                    );
                    return Err(ApplicationError::DraftRetained {
                        application_id,
                        source: e,
                    });
                }
                false
            }
        };

        tracing::info!(
            session = %self.session,
            user_id = %self.user_id,
            application_id = %application_id,
            "Application submitted"
        );
        Ok(SubmissionReceipt {
            application_id,
            application,
            draft_cleared,
        })
    }

    /// Payment estimate for the entered loan details at the applicant's
    /// credit tier
    ///
    /// # Errors
    ///
    /// `StateViolation` before Review; `InvalidInput` or `Lending` when the
    /// figures cannot be priced.
    pub fn loan_estimate(&self) -> Result<LoanEstimate, ApplicationError> {
        if self.draft.current_step != WizardStep::Review {
            return Err(ApplicationError::state_violation(format!(
                "loan estimate is available at step {}",
                WizardStep::Review
            )));
        }
        let (principal, term_months) = self.requested_loan()?;
        let requested_rate = self
            .draft
            .loan_details
            .interest_rate()
            .ok_or_else(|| ApplicationError::invalid("interest rate is not a number"))?;
        let credit_score = self.credit_score()?;

        let adjusted_rate = adjust_rate(requested_rate, credit_score)?;
        let monthly_payment = LoanParameters::new(principal, adjusted_rate, term_months)?.monthly_payment()?;
        let total_payment = monthly_payment
            .checked_mul(Decimal::from(term_months))
            .ok_or_else(|| LendingError::invalid("principal", "total repayment exceeds the representable range"))?;

        Ok(LoanEstimate {
            principal,
            term_months,
            requested_rate,
            adjusted_rate,
            monthly_payment: round_for_display(monthly_payment),
            total_payment: round_for_display(total_payment),
            total_interest: round_for_display(total_payment - principal),
        })
    }

    /// Quotes every catalog offer for the entered amount, term and score
    pub fn offer_quotes(&self, catalog: &OfferCatalog) -> Result<Vec<OfferQuote>, ApplicationError> {
        let (principal, term_months) = self.requested_loan()?;
        let credit_score = self.credit_score()?;
        Ok(compare_offers(principal, term_months, credit_score, catalog.offers())?)
    }

    /// The signed-in user's submitted applications
    pub async fn applications(&self) -> Result<Vec<SubmittedApplication>, ApplicationError> {
        self.ports
            .applications
            .applications_for_user(&self.user_id)
            .await
            .map_err(|e| ApplicationError::collaborator(Operation::ListApplications, e))
    }

    fn requested_loan(&self) -> Result<(Decimal, u32), ApplicationError> {
        let details = &self.draft.loan_details;
        let principal = details
            .amount()
            .ok_or_else(|| ApplicationError::invalid("loan amount is not a number"))?;
        let term = details
            .term_months()
            .ok_or_else(|| ApplicationError::invalid("loan term is not a whole number of months"))?;
        Ok((principal, term))
    }

    fn credit_score(&self) -> Result<i32, ApplicationError> {
        self.draft
            .financial_info
            .credit_score()
            .ok_or_else(|| ApplicationError::invalid("credit score is not a whole number"))
    }

    fn revalidate(&self, today: NaiveDate) -> Result<(), ApplicationError> {
        self.draft.personal_info.validate_as_of(today)?;
        self.draft.financial_info.validate_as_of(today)?;
        self.draft.loan_details.validate_as_of(today)?;
        Ok(())
    }

    async fn persist(&self, draft: &WizardDraft) -> Result<(), ApplicationError> {
        self.ports
            .drafts
            .save_draft(&self.session, draft)
            .await
            .map_err(|e| {
                tracing::warn!(session = %self.session, error = %e, "Failed to save draft");
                ApplicationError::collaborator(Operation::SaveDraft, e)
            })
    }

    fn ensure_open(&self) -> Result<(), ApplicationError> {
        match self.submitted {
            Some(id) => Err(self.violation(format!("application {} already submitted", id))),
            None => Ok(()),
        }
    }

    fn violation(&self, message: impl Into<String>) -> ApplicationError {
        let message = message.into();
        tracing::error!(session = %self.session, step = %self.draft.current_step, "{}", message);
        ApplicationError::StateViolation(message)
    }
}
