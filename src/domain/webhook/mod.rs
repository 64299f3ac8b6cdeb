//! Webhook module - Provider event normalization and idempotent processing.
//!
//! Square and Stripe both deliver at-least-once: retries, slow 200s, and
//! concurrent redeliveries all produce duplicates. The gateway adapters
//! verify signatures and normalize payloads into [`ProviderEvent`]s; the
//! [`IdempotentWebhookProcessor`] guarantees each event id changes state
//! at most once.

mod errors;
mod event;
mod processor;

pub use errors::WebhookError;
pub use event::{EventKind, ProviderEvent};
pub use processor::{IdempotentWebhookProcessor, WebhookDispatcher, WebhookEventHandler};

#[cfg(test)]
pub(crate) use event::test_support;
