//! Recording channel fakes shared by the reactor and sweeper tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::email::{EmailError, EmailSender};
use crate::sms::{SmsError, SmsSender};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentEmail {
    pub recipients: Vec<String>,
    pub subject: String,
    pub text: String,
}

#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<SentEmail> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        text: &str,
        _html: &str,
    ) -> Result<(), EmailError> {
        let entry = SentEmail {
            recipients: recipients.to_vec(),
            subject: subject.to_string(),
            text: text.to_string(),
        };
        match self.sent.lock() {
            Ok(mut sent) => sent.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentSms {
    pub recipients: Vec<String>,
    pub message: String,
}

#[derive(Default)]
pub struct RecordingSmsSender {
    sent: Mutex<Vec<SentSms>>,
}

impl RecordingSmsSender {
    pub fn sent(&self) -> Vec<SentSms> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl SmsSender for RecordingSmsSender {
    async fn send(&self, recipients: &[String], message: &str) -> Result<(), SmsError> {
        let entry = SentSms { recipients: recipients.to_vec(), message: message.to_string() };
        match self.sent.lock() {
            Ok(mut sent) => sent.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
        Ok(())
    }
}
