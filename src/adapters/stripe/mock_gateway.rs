//! Mock billing gateway for tests and local development.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::{RemoteSnapshot, RemoteStatus};
use crate::ports::{
    BillingGateway, CheckoutSession, CreateCheckoutRequest, GatewayError, PortalSession,
};

/// Configurable mock for the [`BillingGateway`] port.
pub struct MockBillingGateway {
    pub cancel_calls: AtomicU32,
    pub fail_checkout: AtomicBool,
    pub snapshot: Mutex<Option<RemoteSnapshot>>,
}

impl MockBillingGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            cancel_calls: AtomicU32::new(0),
            fail_checkout: AtomicBool::new(false),
            snapshot: Mutex::new(None),
        })
    }

    /// Sets the snapshot returned by cancel/fetch calls.
    pub fn next_snapshot(&self, snapshot: RemoteSnapshot) {
        *self.snapshot.lock().unwrap() = Some(snapshot);
    }
}

#[async_trait]
impl BillingGateway for MockBillingGateway {
    async fn create_checkout_session(
        &self,
        _request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        if self.fail_checkout.load(Ordering::SeqCst) {
            return Err(GatewayError::provider("checkout unavailable"));
        }
        Ok(CheckoutSession {
            id: "cs_test_1".to_string(),
            url: "https://checkout.stripe.com/c/cs_test_1".to_string(),
            expires_at: Timestamp::now().add_hours(1),
        })
    }

    async fn create_portal_session(
        &self,
        _customer_id: &str,
        _return_url: &str,
    ) -> Result<PortalSession, GatewayError> {
        Ok(PortalSession {
            id: "bps_test_1".to_string(),
            url: "https://billing.stripe.com/p/session/bps_test_1".to_string(),
        })
    }

    async fn cancel_at_period_end(
        &self,
        _subscription_id: &str,
    ) -> Result<RemoteSnapshot, GatewayError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .snapshot
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(RemoteSnapshot {
                status: RemoteStatus::Active,
                cancel_at: Some(Timestamp::now()),
                cancel_at_period_end: true,
                current_period_end: Some(Timestamp::now().add_days(20)),
            }))
    }

    async fn fetch_subscription(
        &self,
        _subscription_id: &str,
    ) -> Result<Option<RemoteSnapshot>, GatewayError> {
        Ok(self.snapshot.lock().unwrap().clone())
    }
}
