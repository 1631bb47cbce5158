//! Write-triggered transition handler.
//!
//! One invocation per requisition write, receiving the record's value
//! before and after. The ordering of the checks and the early returns
//! decide which notification sets fire on a compound write, so they are
//! fixed: creation is exclusive; `approved`, `rejected`, and `complete`
//! run as independent checks (`complete` returns); the authorization check
//! runs last and fans out to the requester and Finance concurrently.

use std::sync::Arc;

use tracing::{debug, error, warn};

use mifugo_core::config::{Lifecycle, WorkflowConfig};
use mifugo_core::contact::is_valid_email;
use mifugo_core::domain::requisition::{Requisition, RequisitionStatus};
use mifugo_core::roles::Role;

use crate::compose;
use crate::email::EmailSender;
use crate::recipients::RecipientResolver;
use crate::sms::SmsSender;

pub struct TransitionReactor {
    resolver: RecipientResolver,
    email: Arc<dyn EmailSender>,
    sms: Arc<dyn SmsSender>,
    workflow: WorkflowConfig,
}

impl TransitionReactor {
    pub fn new(
        resolver: RecipientResolver,
        email: Arc<dyn EmailSender>,
        sms: Arc<dyn SmsSender>,
        workflow: WorkflowConfig,
    ) -> Self {
        Self { resolver, email, sms, workflow }
    }

    /// React to a single write. Delivery failures are logged and swallowed;
    /// this function never fails the caller.
    pub async fn handle_write(
        &self,
        before: Option<&Requisition>,
        after: Option<&Requisition>,
    ) {
        let Some(after) = after else {
            // Deletions carry no notification semantics.
            return;
        };

        let Some(before) = before else {
            self.notify_new_requisition(after).await;
            return;
        };

        let before_status = before.status_tag();
        let after_status = after.status_tag();

        if after_status == RequisitionStatus::Approved
            && before_status != RequisitionStatus::Approved
        {
            self.notify_hr_approval(after).await;
            if self.workflow.lifecycle == Lifecycle::Direct {
                self.notify_requester_approved(after).await;
            }
        }

        if after_status == RequisitionStatus::Rejected
            && before_status != RequisitionStatus::Rejected
        {
            self.notify_requester_rejected(after).await;
        }

        if after_status == RequisitionStatus::Complete
            && before_status != RequisitionStatus::Complete
        {
            self.notify_requester_completed(after).await;
            return;
        }

        if after.is_authorized() && !before.is_authorized() {
            tokio::join!(
                self.notify_requester_authorized(after),
                self.notify_finance_authorized(after),
            );
        }
    }

    async fn notify_new_requisition(&self, requisition: &Requisition) {
        let programme = requisition.programme.as_deref().unwrap_or("");
        let pool = self.resolver.recipients_by_role(&[Role::ProjectManager], programme).await;
        if pool.phones.is_empty() {
            warn!(
                requisition_id = %requisition.id.0,
                programme,
                "no project manager recipients resolved; skipping new-requisition sms"
            );
            return;
        }

        let message = compose::new_requisition_sms(requisition);
        if let Err(e) = self.sms.send(&pool.phones, &message.text).await {
            error!(requisition_id = %requisition.id.0, error = %e, "new-requisition sms failed");
        }
    }

    async fn notify_hr_approval(&self, requisition: &Requisition) {
        let programme = requisition.programme.as_deref().unwrap_or("");
        let pool = self.resolver.recipients_by_role(&[Role::Hr], programme).await;

        let mut recipients = pool.emails;
        if recipients.is_empty() {
            recipients = self
                .workflow
                .hr_fallback_emails
                .iter()
                .filter(|email| is_valid_email(email))
                .cloned()
                .collect();
            if !recipients.is_empty() {
                debug!(
                    requisition_id = %requisition.id.0,
                    "no hr role-holders resolved; using configured fallback list"
                );
            }
        }
        if recipients.is_empty() {
            warn!(
                requisition_id = %requisition.id.0,
                programme,
                "no hr recipients resolved; skipping approval email"
            );
            return;
        }

        let message = compose::hr_approval_email(requisition);
        if let Err(e) =
            self.email.send(&recipients, &message.subject, &message.text, &message.html).await
        {
            error!(requisition_id = %requisition.id.0, error = %e, "hr approval email failed");
        }
    }

    async fn notify_requester_approved(&self, requisition: &Requisition) {
        let Some(recipient) = self.resolver.requester_email(requisition).await else {
            warn!(
                requisition_id = %requisition.id.0,
                "requester email unresolved; skipping approval notice"
            );
            return;
        };

        let message = compose::requester_approved_email(requisition);
        if let Err(e) =
            self.email.send(&[recipient], &message.subject, &message.text, &message.html).await
        {
            error!(requisition_id = %requisition.id.0, error = %e, "requester approval email failed");
        }
    }

    async fn notify_requester_rejected(&self, requisition: &Requisition) {
        let timeout_hours = self.workflow.approval_timeout_hours;
        match self.workflow.lifecycle {
            Lifecycle::HrGated => {
                let Some(recipient) = self.resolver.requester_phone(requisition).await else {
                    warn!(
                        requisition_id = %requisition.id.0,
                        "requester phone unresolved; skipping rejection sms"
                    );
                    return;
                };

                let message = compose::requester_rejected_sms(requisition, timeout_hours);
                if let Err(e) = self.sms.send(&[recipient], &message.text).await {
                    error!(requisition_id = %requisition.id.0, error = %e, "rejection sms failed");
                }
            }
            Lifecycle::Direct => {
                let Some(recipient) = self.resolver.requester_email(requisition).await else {
                    warn!(
                        requisition_id = %requisition.id.0,
                        "requester email unresolved; skipping rejection notice"
                    );
                    return;
                };

                let message = compose::requester_rejected_email(requisition, timeout_hours);
                if let Err(e) = self
                    .email
                    .send(&[recipient], &message.subject, &message.text, &message.html)
                    .await
                {
                    error!(requisition_id = %requisition.id.0, error = %e, "rejection email failed");
                }
            }
        }
    }

    async fn notify_requester_completed(&self, requisition: &Requisition) {
        let Some(recipient) = self.resolver.requester_phone(requisition).await else {
            warn!(
                requisition_id = %requisition.id.0,
                "requester phone unresolved; skipping completion sms"
            );
            return;
        };

        let message = compose::requester_completed_sms(requisition);
        if let Err(e) = self.sms.send(&[recipient], &message.text).await {
            error!(requisition_id = %requisition.id.0, error = %e, "completion sms failed");
        }
    }

    async fn notify_requester_authorized(&self, requisition: &Requisition) {
        let Some(recipient) = self.resolver.requester_phone(requisition).await else {
            warn!(
                requisition_id = %requisition.id.0,
                "requester phone unresolved; skipping authorization sms"
            );
            return;
        };

        let message = compose::requester_authorized_sms(requisition);
        if let Err(e) = self.sms.send(&[recipient], &message.text).await {
            error!(requisition_id = %requisition.id.0, error = %e, "authorization sms failed");
        }
    }

    async fn notify_finance_authorized(&self, requisition: &Requisition) {
        let programme = requisition.programme.as_deref().unwrap_or("");
        let pool = self.resolver.recipients_by_role(&[Role::Finance], programme).await;
        if pool.emails.is_empty() {
            warn!(
                requisition_id = %requisition.id.0,
                programme,
                "no finance recipients resolved; skipping authorization email"
            );
            return;
        }

        let message = compose::finance_authorized_email(requisition);
        if let Err(e) =
            self.email.send(&pool.emails, &message.subject, &message.text, &message.html).await
        {
            error!(requisition_id = %requisition.id.0, error = %e, "finance authorization email failed");
        }
    }
}
