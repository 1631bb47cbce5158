//! Notification engine for the requisition approval workflow.
//!
//! This crate reacts to requisition writes and to the hourly sweep:
//! - **Transition Reactor** (`reactor`) - diffs a record's before/after
//!   state and fires the matching notification sets exactly once per
//!   detected transition
//! - **Timeout Sweeper** (`sweeper`) - auto-rejects requisitions stuck in
//!   `approved` without HR authorization past the configured deadline
//! - **Channels** (`email`, `sms`) - best-effort SMTP relay and SMS
//!   gateway delivery, each silently skipped when unconfigured
//! - **Recipient Resolver** (`recipients`) - requester contact fallback
//!   chain and role-scoped recipient pools
//! - **Composer** (`compose`) - pure subject/body builders per kind
//!
//! # Architecture
//!
//! ```text
//! requisition write -> TransitionReactor -> RecipientResolver
//!                            |                    |
//!                        compose::*          UserDirectory
//!                            |
//!                   EmailChannel / SmsChannel
//!
//! hourly tick -> TimeoutSweeper -> RequisitionRepository
//!                      \-> TransitionReactor (rejected transition)
//! ```
//!
//! Delivery is at-least-once: a failed send is logged, never retried, and
//! never aborts the invocation that requested it.

pub mod compose;
pub mod email;
pub mod reactor;
pub mod recipients;
pub mod sms;
pub mod sweeper;

#[cfg(test)]
pub(crate) mod testing;

pub use email::{EmailChannel, EmailError, EmailSender};
pub use reactor::TransitionReactor;
pub use recipients::{RecipientResolver, RolePool};
pub use sms::{SmsChannel, SmsError, SmsSender};
pub use sweeper::{SweepSummary, TimeoutSweeper};
