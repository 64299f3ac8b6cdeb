//! BillingWebhookHandler - Applies normalized provider events to local state.
//!
//! Runs inside the idempotent processor: by the time `handle` is called the
//! event is verified, normalized, and not a known duplicate. Every status
//! change appends to the subscription event log; log failures are logged
//! and swallowed because the dedupe record carries correctness.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::{OrganizationId, Timestamp};
use crate::domain::subscription::{Subscription, SubscriptionEvent, SubscriptionStatus};
use crate::domain::webhook::{EventKind, ProviderEvent, WebhookError, WebhookDispatcher, WebhookEventHandler};
use crate::ports::{PromoCodeRepository, SubscriptionEventLog, SubscriptionRepository};

/// Handler for all billing-relevant webhook event kinds.
pub struct BillingWebhookHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    promo_codes: Arc<dyn PromoCodeRepository>,
    event_log: Arc<dyn SubscriptionEventLog>,
}

impl BillingWebhookHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        promo_codes: Arc<dyn PromoCodeRepository>,
        event_log: Arc<dyn SubscriptionEventLog>,
    ) -> Self {
        Self {
            subscriptions,
            promo_codes,
            event_log,
        }
    }

    async fn log_change(
        &self,
        subscription: &Subscription,
        kind: &str,
        event: &ProviderEvent,
        old_status: Option<SubscriptionStatus>,
    ) {
        let entry = SubscriptionEvent::status_change(
            subscription.id,
            kind,
            Some(event.dedupe_key()),
            old_status,
            subscription.status,
            Timestamp::now(),
        );
        if let Err(err) = self.event_log.append(&entry).await {
            tracing::warn!(
                subscription_id = %subscription.id,
                error = %err,
                "Event log append failed, continuing"
            );
        }
    }

    async fn find_by_event_subscription(
        &self,
        event: &ProviderEvent,
    ) -> Result<Subscription, WebhookError> {
        let provider_subscription_id = event
            .provider_subscription_id
            .as_deref()
            .ok_or_else(|| WebhookError::Ignored("event carries no subscription id".to_string()))?;

        self.subscriptions
            .find_by_provider_subscription(event.provider, provider_subscription_id)
            .await?
            .ok_or_else(|| {
                WebhookError::UnknownSubject(format!(
                    "{}:{}",
                    event.provider, provider_subscription_id
                ))
            })
    }

    async fn checkout_completed(&self, event: &ProviderEvent) -> Result<(), WebhookError> {
        let organization_id: OrganizationId = event
            .organization_ref
            .as_deref()
            .ok_or_else(|| {
                WebhookError::Ignored("checkout event carries no client reference".to_string())
            })?
            .parse()
            .map_err(|_| {
                WebhookError::ParseError("client reference is not an organization id".to_string())
            })?;

        let mut subscription = self
            .subscriptions
            .find_by_organization(&organization_id)
            .await?
            .ok_or_else(|| WebhookError::UnknownSubject(organization_id.to_string()))?;

        if subscription.status != SubscriptionStatus::Pending {
            return Err(WebhookError::Ignored(format!(
                "checkout completed for {:?} subscription",
                subscription.status
            )));
        }

        let provider_subscription_id = event.provider_subscription_id.clone().ok_or_else(|| {
            WebhookError::Ignored("checkout session has no subscription".to_string())
        })?;
        let provider_customer_id = event
            .provider_customer_id
            .clone()
            .ok_or_else(|| WebhookError::Ignored("checkout session has no customer".to_string()))?;

        let now = Timestamp::now();
        let period_end = now.add_days(subscription.plan.period_days());
        subscription
            .activate(provider_subscription_id, provider_customer_id, period_end, now)
            .map_err(|e| WebhookError::Processing(e.to_string()))?;

        // Redemption is consumed at activation, not checkout creation
        if let Some(code) = subscription.promo_code.clone() {
            if let Err(err) = self.promo_codes.redeem(&code).await {
                tracing::warn!(code = %code, error = %err, "Promo redemption failed at activation");
            }
        }

        self.subscriptions.update(&subscription).await?;
        self.log_change(
            &subscription,
            "checkout_completed",
            event,
            Some(SubscriptionStatus::Pending),
        )
        .await;

        tracing::info!(
            organization_id = %organization_id,
            subscription_id = %subscription.id,
            "Subscription activated from checkout"
        );
        Ok(())
    }

    async fn subscription_snapshot(&self, event: &ProviderEvent) -> Result<(), WebhookError> {
        let snapshot = event
            .snapshot
            .as_ref()
            .ok_or_else(|| WebhookError::Ignored("event carries no snapshot".to_string()))?;

        let mut subscription = self.find_by_event_subscription(event).await?;

        match subscription.apply_snapshot(snapshot, Timestamp::now()) {
            Ok(Some(previous)) => {
                self.subscriptions.update(&subscription).await?;
                self.log_change(&subscription, "status_reconciled", event, Some(previous))
                    .await;
                tracing::info!(
                    subscription_id = %subscription.id,
                    old_status = ?previous,
                    new_status = ?subscription.status,
                    "Subscription status reconciled"
                );
                Ok(())
            }
            Ok(None) => {
                // Status confirmed; period/cancel fields may have moved
                self.subscriptions.update(&subscription).await?;
                Ok(())
            }
            Err(err) => {
                // A snapshot the state machine refuses (e.g. resurrecting a
                // canceled record) is an anomaly to audit, not to retry.
                tracing::warn!(
                    subscription_id = %subscription.id,
                    error = %err,
                    "Snapshot conflicts with local state"
                );
                Err(WebhookError::Ignored(format!(
                    "snapshot conflicts with local state: {}",
                    err
                )))
            }
        }
    }

    async fn invoice_paid(&self, event: &ProviderEvent) -> Result<(), WebhookError> {
        let mut subscription = self.find_by_event_subscription(event).await?;

        let now = Timestamp::now();
        let period_end = now.add_days(subscription.plan.period_days());
        let previous = subscription.status;

        match subscription.renew(period_end, now) {
            Ok(()) => {
                self.subscriptions.update(&subscription).await?;
                self.log_change(&subscription, "invoice_paid", event, Some(previous))
                    .await;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    subscription_id = %subscription.id,
                    error = %err,
                    "Invoice paid for subscription that cannot renew"
                );
                Err(WebhookError::Ignored(err.to_string()))
            }
        }
    }

    async fn invoice_failed(&self, event: &ProviderEvent) -> Result<(), WebhookError> {
        let mut subscription = self.find_by_event_subscription(event).await?;
        let previous = subscription.status;

        match subscription.mark_past_due(Timestamp::now()) {
            Ok(()) => {
                self.subscriptions.update(&subscription).await?;
                self.log_change(&subscription, "invoice_payment_failed", event, Some(previous))
                    .await;
                tracing::warn!(
                    subscription_id = %subscription.id,
                    "Subscription past due after failed invoice"
                );
                Ok(())
            }
            Err(err) => Err(WebhookError::Ignored(err.to_string())),
        }
    }
}

#[async_trait]
impl WebhookEventHandler for BillingWebhookHandler {
    fn handles(&self) -> Vec<EventKind> {
        vec![
            EventKind::CheckoutCompleted,
            EventKind::SubscriptionCreated,
            EventKind::SubscriptionUpdated,
            EventKind::SubscriptionCanceled,
            EventKind::InvoicePaid,
            EventKind::InvoicePaymentFailed,
        ]
    }

    async fn handle(&self, event: &ProviderEvent) -> Result<(), WebhookError> {
        match event.kind {
            EventKind::CheckoutCompleted => self.checkout_completed(event).await,
            EventKind::SubscriptionCreated
            | EventKind::SubscriptionUpdated
            | EventKind::SubscriptionCanceled => self.subscription_snapshot(event).await,
            EventKind::InvoicePaid => self.invoice_paid(event).await,
            EventKind::InvoicePaymentFailed => self.invoice_failed(event).await,
            EventKind::Unknown => Err(WebhookError::Ignored("unknown event kind".to_string())),
        }
    }
}

/// Dispatcher routing every billing-relevant kind to the single handler.
pub struct BillingWebhookDispatcher {
    handler: BillingWebhookHandler,
}

impl BillingWebhookDispatcher {
    pub fn new(handler: BillingWebhookHandler) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl WebhookDispatcher for BillingWebhookDispatcher {
    fn get_handler(&self, kind: &EventKind) -> Option<&dyn WebhookEventHandler> {
        if self.handler.handles().contains(kind) {
            Some(&self.handler)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{
        active_subscription, pending_subscription, promo, InMemoryPromoCodeRepository,
        InMemorySubscriptionEventLog, InMemorySubscriptionRepository,
    };
    use crate::domain::subscription::{BillingProvider, RemoteSnapshot, RemoteStatus};
    use crate::domain::webhook::test_support::ProviderEventBuilder;

    fn handler(
        subscriptions: Arc<InMemorySubscriptionRepository>,
        promo_codes: Arc<InMemoryPromoCodeRepository>,
        event_log: Arc<InMemorySubscriptionEventLog>,
    ) -> BillingWebhookHandler {
        BillingWebhookHandler::new(subscriptions, promo_codes, event_log)
    }

    // ══════════════════════════════════════════════════════════════
    // Checkout Completed
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn checkout_completed_activates_pending_subscription() {
        let org = crate::domain::foundation::OrganizationId::new();
        let subscriptions = InMemorySubscriptionRepository::with(pending_subscription(org));
        let event_log = InMemorySubscriptionEventLog::new();
        let handler = handler(
            subscriptions.clone(),
            InMemoryPromoCodeRepository::new(),
            event_log.clone(),
        );

        let event = ProviderEventBuilder::new(EventKind::CheckoutCompleted)
            .organization_ref(org.to_string())
            .customer("cus_9")
            .subscription("sub_9")
            .build();

        handler.handle(&event).await.unwrap();

        let stored = subscriptions.get(&org).unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Active);
        assert_eq!(stored.provider_subscription_id.as_deref(), Some("sub_9"));
        assert_eq!(stored.provider_customer_id.as_deref(), Some("cus_9"));

        let entries = event_log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, "checkout_completed");
        assert_eq!(entries[0].new_status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn checkout_completed_redeems_promo_code() {
        let org = crate::domain::foundation::OrganizationId::new();
        let mut subscription = pending_subscription(org);
        subscription.promo_code = Some("LAUNCH2026-K7M3QA".to_string());
        let subscriptions = InMemorySubscriptionRepository::with(subscription);
        let promo_codes = InMemoryPromoCodeRepository::with(promo("LAUNCH2026-K7M3QA"));
        let handler = handler(
            subscriptions,
            promo_codes.clone(),
            InMemorySubscriptionEventLog::new(),
        );

        let event = ProviderEventBuilder::new(EventKind::CheckoutCompleted)
            .organization_ref(org.to_string())
            .customer("cus_9")
            .subscription("sub_9")
            .build();

        handler.handle(&event).await.unwrap();

        let codes = promo_codes.codes.lock().unwrap();
        assert_eq!(codes.get("LAUNCH2026-K7M3QA").unwrap().redemption_count, 1);
    }

    #[tokio::test]
    async fn checkout_for_active_subscription_is_ignored() {
        let org = crate::domain::foundation::OrganizationId::new();
        let subscriptions = InMemorySubscriptionRepository::with(active_subscription(org));
        let handler = handler(
            subscriptions,
            InMemoryPromoCodeRepository::new(),
            InMemorySubscriptionEventLog::new(),
        );

        let event = ProviderEventBuilder::new(EventKind::CheckoutCompleted)
            .organization_ref(org.to_string())
            .customer("cus_9")
            .subscription("sub_9")
            .build();

        let result = handler.handle(&event).await;
        assert!(matches!(result, Err(WebhookError::Ignored(_))));
    }

    #[tokio::test]
    async fn checkout_for_unknown_organization_is_permanent_failure() {
        let handler = handler(
            InMemorySubscriptionRepository::new(),
            InMemoryPromoCodeRepository::new(),
            InMemorySubscriptionEventLog::new(),
        );

        let event = ProviderEventBuilder::new(EventKind::CheckoutCompleted)
            .organization_ref(crate::domain::foundation::OrganizationId::new().to_string())
            .customer("cus_9")
            .subscription("sub_9")
            .build();

        let result = handler.handle(&event).await;
        assert!(matches!(result, Err(WebhookError::UnknownSubject(_))));
    }

    #[tokio::test]
    async fn checkout_with_garbage_reference_is_parse_error() {
        let handler = handler(
            InMemorySubscriptionRepository::new(),
            InMemoryPromoCodeRepository::new(),
            InMemorySubscriptionEventLog::new(),
        );

        let event = ProviderEventBuilder::new(EventKind::CheckoutCompleted)
            .organization_ref("not-a-uuid")
            .build();

        let result = handler.handle(&event).await;
        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Subscription Snapshots
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn snapshot_with_cancel_timestamp_enters_pending_cancellation() {
        let org = crate::domain::foundation::OrganizationId::new();
        let subscriptions = InMemorySubscriptionRepository::with(active_subscription(org));
        let event_log = InMemorySubscriptionEventLog::new();
        let handler = handler(
            subscriptions.clone(),
            InMemoryPromoCodeRepository::new(),
            event_log.clone(),
        );

        let event = ProviderEventBuilder::new(EventKind::SubscriptionUpdated)
            .subscription("sub_123")
            .snapshot(RemoteSnapshot {
                cancel_at: Some(Timestamp::now().add_days(12)),
                ..RemoteSnapshot::of(RemoteStatus::Active)
            })
            .build();

        handler.handle(&event).await.unwrap();

        let stored = subscriptions.get(&org).unwrap();
        assert_eq!(stored.status, SubscriptionStatus::PendingCancellation);
        assert!(stored.canceled_at.is_some());

        let entries = event_log.entries();
        assert_eq!(entries[0].kind, "status_reconciled");
        assert_eq!(entries[0].old_status, Some(SubscriptionStatus::Active));
    }

    #[tokio::test]
    async fn snapshot_confirming_status_logs_nothing() {
        let org = crate::domain::foundation::OrganizationId::new();
        let subscriptions = InMemorySubscriptionRepository::with(active_subscription(org));
        let event_log = InMemorySubscriptionEventLog::new();
        let handler = handler(
            subscriptions,
            InMemoryPromoCodeRepository::new(),
            event_log.clone(),
        );

        let event = ProviderEventBuilder::new(EventKind::SubscriptionUpdated)
            .subscription("sub_123")
            .snapshot(RemoteSnapshot::of(RemoteStatus::Active))
            .build();

        handler.handle(&event).await.unwrap();
        assert!(event_log.entries().is_empty());
    }

    #[tokio::test]
    async fn snapshot_for_unknown_subscription_is_permanent_failure() {
        let handler = handler(
            InMemorySubscriptionRepository::new(),
            InMemoryPromoCodeRepository::new(),
            InMemorySubscriptionEventLog::new(),
        );

        let event = ProviderEventBuilder::new(EventKind::SubscriptionUpdated)
            .subscription("sub_ghost")
            .snapshot(RemoteSnapshot::of(RemoteStatus::Active))
            .build();

        let result = handler.handle(&event).await;
        assert!(matches!(result, Err(WebhookError::UnknownSubject(_))));
    }

    #[tokio::test]
    async fn snapshot_matches_provider_scoped_lookup() {
        // A Square event must not touch a Stripe-billed subscription that
        // happens to share a provider subscription id.
        let org = crate::domain::foundation::OrganizationId::new();
        let subscriptions = InMemorySubscriptionRepository::with(active_subscription(org));
        let handler = handler(
            subscriptions,
            InMemoryPromoCodeRepository::new(),
            InMemorySubscriptionEventLog::new(),
        );

        let event = ProviderEventBuilder::new(EventKind::SubscriptionUpdated)
            .provider(BillingProvider::Square)
            .subscription("sub_123")
            .snapshot(RemoteSnapshot::of(RemoteStatus::Canceled))
            .build();

        let result = handler.handle(&event).await;
        assert!(matches!(result, Err(WebhookError::UnknownSubject(_))));
    }

    #[tokio::test]
    async fn conflicting_snapshot_is_audited_not_retried() {
        let org = crate::domain::foundation::OrganizationId::new();
        let mut subscription = active_subscription(org);
        subscription.request_cancellation(Timestamp::now()).unwrap();
        subscription
            .apply_snapshot(&RemoteSnapshot::of(RemoteStatus::Canceled), Timestamp::now())
            .unwrap();
        let subscriptions = InMemorySubscriptionRepository::with(subscription);
        let handler = handler(
            subscriptions,
            InMemoryPromoCodeRepository::new(),
            InMemorySubscriptionEventLog::new(),
        );

        // Canceled locally; a stale past_due snapshot cannot apply
        let event = ProviderEventBuilder::new(EventKind::SubscriptionUpdated)
            .subscription("sub_123")
            .snapshot(RemoteSnapshot::of(RemoteStatus::PastDue))
            .build();

        let result = handler.handle(&event).await;
        assert!(matches!(result, Err(WebhookError::Ignored(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Invoices
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn invoice_paid_extends_period() {
        let org = crate::domain::foundation::OrganizationId::new();
        let mut subscription = active_subscription(org);
        subscription.mark_past_due(Timestamp::now()).unwrap();
        let subscriptions = InMemorySubscriptionRepository::with(subscription);
        let event_log = InMemorySubscriptionEventLog::new();
        let handler = handler(
            subscriptions.clone(),
            InMemoryPromoCodeRepository::new(),
            event_log.clone(),
        );

        let event = ProviderEventBuilder::new(EventKind::InvoicePaid)
            .subscription("sub_123")
            .build();

        handler.handle(&event).await.unwrap();

        let stored = subscriptions.get(&org).unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Active);
        assert_eq!(event_log.entries()[0].kind, "invoice_paid");
    }

    #[tokio::test]
    async fn invoice_failed_marks_past_due() {
        let org = crate::domain::foundation::OrganizationId::new();
        let subscriptions = InMemorySubscriptionRepository::with(active_subscription(org));
        let handler = handler(
            subscriptions.clone(),
            InMemoryPromoCodeRepository::new(),
            InMemorySubscriptionEventLog::new(),
        );

        let event = ProviderEventBuilder::new(EventKind::InvoicePaymentFailed)
            .subscription("sub_123")
            .build();

        handler.handle(&event).await.unwrap();
        assert_eq!(
            subscriptions.get(&org).unwrap().status,
            SubscriptionStatus::PastDue
        );
    }

    #[tokio::test]
    async fn event_log_failure_does_not_fail_processing() {
        let org = crate::domain::foundation::OrganizationId::new();
        let subscriptions = InMemorySubscriptionRepository::with(active_subscription(org));
        let event_log = InMemorySubscriptionEventLog::new();
        event_log
            .fail_appends
            .store(true, std::sync::atomic::Ordering::SeqCst);
        let handler = handler(
            subscriptions.clone(),
            InMemoryPromoCodeRepository::new(),
            event_log,
        );

        let event = ProviderEventBuilder::new(EventKind::InvoicePaymentFailed)
            .subscription("sub_123")
            .build();

        handler.handle(&event).await.unwrap();
        assert_eq!(
            subscriptions.get(&org).unwrap().status,
            SubscriptionStatus::PastDue
        );
    }

    // ══════════════════════════════════════════════════════════════
    // Dispatcher
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn dispatcher_skips_unknown_kind() {
        let dispatcher = BillingWebhookDispatcher::new(handler(
            InMemorySubscriptionRepository::new(),
            InMemoryPromoCodeRepository::new(),
            InMemorySubscriptionEventLog::new(),
        ));

        assert!(dispatcher.get_handler(&EventKind::Unknown).is_none());
        assert!(dispatcher.get_handler(&EventKind::InvoicePaid).is_some());
    }
}
