//! Pure subject/body builders for each notification kind.

use mifugo_core::domain::requisition::Requisition;
use mifugo_core::money::format_kes;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmsMessage {
    pub text: String,
}

fn programme(requisition: &Requisition) -> &str {
    requisition.programme.as_deref().map(str::trim).filter(|p| !p.is_empty()).unwrap_or("N/A")
}

fn kind_label(requisition: &Requisition) -> String {
    match requisition.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        Some(kind) => format!("{kind} requisition"),
        None => "requisition".to_string(),
    }
}

fn amount(requisition: &Requisition) -> String {
    format_kes(requisition.amount())
}

fn purpose(requisition: &Requisition) -> &str {
    requisition.purpose().unwrap_or("N/A")
}

fn summary_lines(requisition: &Requisition) -> String {
    format!(
        "Requisition: {id}\nRequested by: {name}\nProgramme: {programme}\nAmount: {amount}\nPurpose: {purpose}",
        id = requisition.id.0,
        name = requisition.requester_name(),
        programme = programme(requisition),
        amount = amount(requisition),
        purpose = purpose(requisition),
    )
}

fn summary_html(requisition: &Requisition) -> String {
    format!(
        "<p><strong>Requisition:</strong> {id}<br/>\
         <strong>Requested by:</strong> {name}<br/>\
         <strong>Programme:</strong> {programme}<br/>\
         <strong>Amount:</strong> {amount}<br/>\
         <strong>Purpose:</strong> {purpose}</p>",
        id = requisition.id.0,
        name = requisition.requester_name(),
        programme = programme(requisition),
        amount = amount(requisition),
        purpose = purpose(requisition),
    )
}

/// Default reason recorded (and messaged) when the sweeper rejects a
/// requisition that HR never authorized.
pub fn default_timeout_reason(timeout_hours: u64) -> String {
    format!("Not authorized by HR within {timeout_hours} hours of approval")
}

pub fn new_requisition_sms(requisition: &Requisition) -> SmsMessage {
    SmsMessage {
        text: format!(
            "New {label} {id} from {name} ({programme}). Amount: {amount}. Purpose: {purpose}.",
            label = kind_label(requisition),
            id = requisition.id.0,
            name = requisition.requester_name(),
            programme = programme(requisition),
            amount = amount(requisition),
            purpose = purpose(requisition),
        ),
    }
}

pub fn hr_approval_email(requisition: &Requisition) -> EmailMessage {
    EmailMessage {
        subject: format!("Requisition {} awaiting HR authorization", requisition.id.0),
        text: format!(
            "A requisition has been approved and is awaiting HR authorization.\n\n{}\n\nPlease review it on the dashboard.",
            summary_lines(requisition)
        ),
        html: format!(
            "<p>A requisition has been approved and is awaiting HR authorization.</p>{}<p>Please review it on the dashboard.</p>",
            summary_html(requisition)
        ),
    }
}

pub fn requester_approved_email(requisition: &Requisition) -> EmailMessage {
    EmailMessage {
        subject: format!("Requisition {} approved", requisition.id.0),
        text: format!(
            "Dear {name},\n\nYour requisition has been approved.\n\n{summary}",
            name = requisition.requester_name(),
            summary = summary_lines(requisition),
        ),
        html: format!(
            "<p>Dear {name},</p><p>Your requisition has been approved.</p>{summary}",
            name = requisition.requester_name(),
            summary = summary_html(requisition),
        ),
    }
}

/// Reason precedence: the custom SMS text if present, else the recorded
/// rejection reason, else the HR-timeout default.
pub fn rejection_reason(requisition: &Requisition, timeout_hours: u64) -> String {
    requisition
        .rejection_sms_text
        .as_deref()
        .or(requisition.rejection_reason.as_deref())
        .map(str::trim)
        .filter(|reason| !reason.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_timeout_reason(timeout_hours))
}

pub fn requester_rejected_sms(requisition: &Requisition, timeout_hours: u64) -> SmsMessage {
    SmsMessage {
        text: format!(
            "Your requisition {id} was rejected. Reason: {reason}.",
            id = requisition.id.0,
            reason = rejection_reason(requisition, timeout_hours),
        ),
    }
}

pub fn requester_rejected_email(requisition: &Requisition, timeout_hours: u64) -> EmailMessage {
    let reason = rejection_reason(requisition, timeout_hours);
    EmailMessage {
        subject: format!("Requisition {} rejected", requisition.id.0),
        text: format!(
            "Dear {name},\n\nYour requisition was rejected.\nReason: {reason}\n\n{summary}",
            name = requisition.requester_name(),
            summary = summary_lines(requisition),
        ),
        html: format!(
            "<p>Dear {name},</p><p>Your requisition was rejected.<br/>Reason: {reason}</p>{summary}",
            name = requisition.requester_name(),
            summary = summary_html(requisition),
        ),
    }
}

pub fn requester_authorized_sms(requisition: &Requisition) -> SmsMessage {
    SmsMessage {
        text: format!(
            "Your requisition {id} has been authorized by {by} and forwarded to Finance for payment.",
            id = requisition.id.0,
            by = requisition.authorized_by.as_deref().map(str::trim).filter(|by| !by.is_empty()).unwrap_or("HR"),
        ),
    }
}

pub fn finance_authorized_email(requisition: &Requisition) -> EmailMessage {
    EmailMessage {
        subject: format!("Requisition {} authorized for payment", requisition.id.0),
        text: format!(
            "A requisition has been authorized and is ready for payment processing.\n\n{}",
            summary_lines(requisition)
        ),
        html: format!(
            "<p>A requisition has been authorized and is ready for payment processing.</p>{}",
            summary_html(requisition)
        ),
    }
}

pub fn requester_completed_sms(requisition: &Requisition) -> SmsMessage {
    SmsMessage {
        text: format!(
            "Your requisition {id} has been completed and paid out. Amount: {amount}.",
            id = requisition.id.0,
            amount = amount(requisition),
        ),
    }
}

#[cfg(test)]
mod tests {
    use mifugo_core::domain::requisition::Requisition;

    use super::{
        default_timeout_reason, finance_authorized_email, hr_approval_email, new_requisition_sms,
        rejection_reason, requester_completed_sms, requester_rejected_sms,
    };

    fn requisition() -> Requisition {
        let mut record = Requisition::new("REQ-42");
        record.kind = Some("livestock".to_string());
        record.name = Some("Jane Wanjiru".to_string());
        record.programme = Some("KPMD".to_string());
        record.total = Some(1500.0);
        record.trip_purpose = Some("Market day offtake".to_string());
        record
    }

    #[test]
    fn new_requisition_sms_carries_programme_and_amount() {
        let sms = new_requisition_sms(&requisition());
        assert_eq!(
            sms.text,
            "New livestock requisition REQ-42 from Jane Wanjiru (KPMD). \
             Amount: KES 1,500.00. Purpose: Market day offtake."
        );
    }

    #[test]
    fn missing_amount_and_purpose_render_na() {
        let mut record = requisition();
        record.total = None;
        record.trip_purpose = None;
        let sms = new_requisition_sms(&record);
        assert!(sms.text.contains("Amount: N/A"));
        assert!(sms.text.contains("Purpose: N/A"));
    }

    #[test]
    fn fuel_kind_reads_fuel_fields() {
        let mut record = requisition();
        record.kind = Some("fuel".to_string());
        record.total = None;
        record.fuel_amount = Some(900.0);
        record.fuel_purpose = Some("Generator top-up".to_string());
        let sms = new_requisition_sms(&record);
        assert!(sms.text.contains("Amount: KES 900.00"));
        assert!(sms.text.contains("Purpose: Generator top-up"));
    }

    #[test]
    fn hr_email_has_subject_and_both_bodies() {
        let email = hr_approval_email(&requisition());
        assert_eq!(email.subject, "Requisition REQ-42 awaiting HR authorization");
        assert!(email.text.contains("Programme: KPMD"));
        assert!(email.html.contains("<strong>Programme:</strong> KPMD"));
    }

    #[test]
    fn rejection_reason_prefers_custom_sms_text() {
        let mut record = requisition();
        record.rejection_reason = Some("Budget line exhausted".to_string());
        record.rejection_sms_text = Some("Resubmit next quarter".to_string());
        assert_eq!(rejection_reason(&record, 24), "Resubmit next quarter");

        record.rejection_sms_text = None;
        assert_eq!(rejection_reason(&record, 24), "Budget line exhausted");

        record.rejection_reason = None;
        assert_eq!(rejection_reason(&record, 24), default_timeout_reason(24));
    }

    #[test]
    fn rejected_sms_embeds_the_resolved_reason() {
        let mut record = requisition();
        record.rejection_reason = Some("Budget line exhausted".to_string());
        let sms = requester_rejected_sms(&record, 24);
        assert_eq!(sms.text, "Your requisition REQ-42 was rejected. Reason: Budget line exhausted.");
    }

    #[test]
    fn finance_and_completion_messages_reference_the_record() {
        let email = finance_authorized_email(&requisition());
        assert_eq!(email.subject, "Requisition REQ-42 authorized for payment");

        let sms = requester_completed_sms(&requisition());
        assert!(sms.text.contains("REQ-42"));
        assert!(sms.text.contains("KES 1,500.00"));
    }
}
