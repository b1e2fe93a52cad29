//! Outbound mail delivery.
//!
//! `Notifier` is the seam the scheduler sends through; `SmtpNotifier` is the
//! lettre-backed implementation used in production.

mod notifier;
mod smtp_notifier;

#[cfg(test)]
pub(crate) mod mock;

pub use notifier::{DeliveryError, Notifier};
pub use smtp_notifier::SmtpNotifier;
