//! In-memory adapters - Repository implementations backed by mutexed Vecs.
//!
//! Used by the test suites and by local development without a database.
//! Semantics mirror the PostgreSQL adapters, including uniqueness rules
//! and insert-once webhook dedupe.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::connection::{MerchantConnection, OAuthState};
use crate::domain::device::Device;
use crate::domain::foundation::{
    DeviceId, DomainError, ErrorCode, OrganizationId, SubscriptionId, Timestamp,
};
use crate::domain::subscription::{BillingProvider, PromoCode, Subscription, SubscriptionEvent};
use crate::ports::{
    ConnectionRepository, DeviceRepository, OAuthStateRepository, PromoCodeRepository,
    SaveResult, SubscriptionEventLog, SubscriptionRepository, WebhookEventRecord,
    WebhookEventRepository,
};

/// In-memory ConnectionRepository.
#[derive(Default)]
pub struct InMemoryConnectionRepository {
    pub connections: Mutex<Vec<MerchantConnection>>,
}

impl InMemoryConnectionRepository {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }

    pub fn with(connection: MerchantConnection) -> std::sync::Arc<Self> {
        let repo = Self::default();
        repo.connections.lock().unwrap().push(connection);
        std::sync::Arc::new(repo)
    }

    pub fn get(&self, organization_id: &OrganizationId) -> Option<MerchantConnection> {
        self.connections
            .lock()
            .unwrap()
            .iter()
            .find(|c| &c.organization_id == organization_id)
            .cloned()
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn upsert(&self, connection: &MerchantConnection) -> Result<(), DomainError> {
        let mut connections = self.connections.lock().unwrap();
        connections.retain(|c| c.organization_id != connection.organization_id);
        connections.push(connection.clone());
        Ok(())
    }

    async fn update(&self, connection: &MerchantConnection) -> Result<(), DomainError> {
        let mut connections = self.connections.lock().unwrap();
        match connections.iter_mut().find(|c| c.id == connection.id) {
            Some(existing) => {
                *existing = connection.clone();
                Ok(())
            }
            None => Err(DomainError::not_found(
                ErrorCode::ConnectionNotFound,
                "Connection",
            )),
        }
    }

    async fn find_by_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Option<MerchantConnection>, DomainError> {
        Ok(self.get(organization_id))
    }

    async fn find_expiring_within_hours(
        &self,
        hours: i64,
    ) -> Result<Vec<MerchantConnection>, DomainError> {
        let threshold = Timestamp::now().add_hours(hours);
        Ok(self
            .connections
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.is_usable() && !c.token_expires_at.is_after(&threshold))
            .cloned()
            .collect())
    }
}

/// In-memory OAuthStateRepository.
#[derive(Default)]
pub struct InMemoryOAuthStateRepository {
    pub states: Mutex<Vec<OAuthState>>,
}

impl InMemoryOAuthStateRepository {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }

    pub fn with(state: OAuthState) -> std::sync::Arc<Self> {
        let repo = Self::default();
        repo.states.lock().unwrap().push(state);
        std::sync::Arc::new(repo)
    }
}

#[async_trait]
impl OAuthStateRepository for InMemoryOAuthStateRepository {
    async fn save(&self, state: &OAuthState) -> Result<(), DomainError> {
        self.states.lock().unwrap().push(state.clone());
        Ok(())
    }

    async fn find_by_token(&self, state_token: &str) -> Result<Option<OAuthState>, DomainError> {
        Ok(self
            .states
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.state_token == state_token)
            .cloned())
    }

    async fn mark_consumed(&self, state: &OAuthState) -> Result<(), DomainError> {
        let mut states = self.states.lock().unwrap();
        match states
            .iter_mut()
            .find(|s| s.state_token == state.state_token && s.consumed_at.is_none())
        {
            Some(existing) => {
                existing.consumed_at = state.consumed_at;
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::OAuthStateConsumed,
                "OAuth state was already used",
            )),
        }
    }

    async fn delete_stale(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let mut states = self.states.lock().unwrap();
        let before = states.len();
        states.retain(|s| s.consumed_at.is_none() && s.expires_at.is_after(&cutoff));
        Ok((before - states.len()) as u64)
    }
}

/// In-memory SubscriptionRepository.
#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    pub subscriptions: Mutex<Vec<Subscription>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }

    pub fn with(subscription: Subscription) -> std::sync::Arc<Self> {
        let repo = Self::default();
        repo.subscriptions.lock().unwrap().push(subscription);
        std::sync::Arc::new(repo)
    }

    pub fn get(&self, organization_id: &OrganizationId) -> Option<Subscription> {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .find(|s| &s.organization_id == organization_id)
            .cloned()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn save(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        if subscriptions
            .iter()
            .any(|s| s.organization_id == subscription.organization_id)
        {
            return Err(DomainError::new(
                ErrorCode::SubscriptionExists,
                "Organization already has a subscription",
            ));
        }
        subscriptions.push(subscription.clone());
        Ok(())
    }

    async fn update(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        match subscriptions.iter_mut().find(|s| s.id == subscription.id) {
            Some(existing) => {
                *existing = subscription.clone();
                Ok(())
            }
            None => Err(DomainError::not_found(
                ErrorCode::SubscriptionNotFound,
                "Subscription",
            )),
        }
    }

    async fn find_by_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self.get(organization_id))
    }

    async fn find_by_provider_subscription(
        &self,
        provider: BillingProvider,
        provider_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .find(|s| {
                s.provider == provider
                    && s.provider_subscription_id.as_deref() == Some(provider_subscription_id)
            })
            .cloned())
    }

    async fn find_by_provider_customer(
        &self,
        provider: BillingProvider,
        provider_customer_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .find(|s| {
                s.provider == provider
                    && s.provider_customer_id.as_deref() == Some(provider_customer_id)
            })
            .cloned())
    }
}

/// In-memory SubscriptionEventLog.
///
/// `fail_appends` simulates log unavailability; processing must continue.
#[derive(Default)]
pub struct InMemorySubscriptionEventLog {
    pub events: Mutex<Vec<SubscriptionEvent>>,
    pub fail_appends: AtomicBool,
}

impl InMemorySubscriptionEventLog {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }

    pub fn entries(&self) -> Vec<SubscriptionEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriptionEventLog for InMemorySubscriptionEventLog {
    async fn append(&self, event: &SubscriptionEvent) -> Result<(), DomainError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(DomainError::database("event log unavailable"));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn list_for_subscription(
        &self,
        subscription_id: &SubscriptionId,
        limit: i64,
    ) -> Result<Vec<SubscriptionEvent>, DomainError> {
        let mut events: Vec<SubscriptionEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| &e.subscription_id == subscription_id)
            .cloned()
            .collect();
        events.reverse();
        events.truncate(limit as usize);
        Ok(events)
    }
}

/// In-memory PromoCodeRepository.
#[derive(Default)]
pub struct InMemoryPromoCodeRepository {
    pub codes: Mutex<HashMap<String, PromoCode>>,
}

impl InMemoryPromoCodeRepository {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }

    pub fn with(promo: PromoCode) -> std::sync::Arc<Self> {
        let repo = Self::default();
        repo.codes.lock().unwrap().insert(promo.code.clone(), promo);
        std::sync::Arc::new(repo)
    }
}

#[async_trait]
impl PromoCodeRepository for InMemoryPromoCodeRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>, DomainError> {
        Ok(self.codes.lock().unwrap().get(code).cloned())
    }

    async fn redeem(&self, code: &str) -> Result<PromoCode, DomainError> {
        let mut codes = self.codes.lock().unwrap();
        let promo = codes.get_mut(code).ok_or_else(|| {
            DomainError::not_found(ErrorCode::PromoCodeNotFound, "Promo code")
        })?;
        promo.redeem(Timestamp::now())?;
        Ok(promo.clone())
    }
}

/// In-memory DeviceRepository.
#[derive(Default)]
pub struct InMemoryDeviceRepository {
    pub devices: Mutex<Vec<Device>>,
}

impl InMemoryDeviceRepository {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }

    pub fn with(device: Device) -> std::sync::Arc<Self> {
        let repo = Self::default();
        repo.devices.lock().unwrap().push(device);
        std::sync::Arc::new(repo)
    }
}

#[async_trait]
impl DeviceRepository for InMemoryDeviceRepository {
    async fn save(&self, device: &Device) -> Result<(), DomainError> {
        self.devices.lock().unwrap().push(device.clone());
        Ok(())
    }

    async fn update(&self, device: &Device) -> Result<(), DomainError> {
        let mut devices = self.devices.lock().unwrap();
        match devices.iter_mut().find(|d| d.id == device.id) {
            Some(existing) => {
                *existing = device.clone();
                Ok(())
            }
            None => Err(DomainError::not_found(ErrorCode::DeviceNotFound, "Device")),
        }
    }

    async fn find_by_id(&self, id: &DeviceId) -> Result<Option<Device>, DomainError> {
        Ok(self
            .devices
            .lock()
            .unwrap()
            .iter()
            .find(|d| &d.id == id)
            .cloned())
    }

    async fn list_by_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Device>, DomainError> {
        Ok(self
            .devices
            .lock()
            .unwrap()
            .iter()
            .filter(|d| &d.organization_id == organization_id)
            .cloned()
            .collect())
    }
}

/// In-memory WebhookEventRepository with insert-once semantics.
#[derive(Default)]
pub struct InMemoryWebhookEventRepository {
    pub records: Mutex<HashMap<String, WebhookEventRecord>>,
}

impl InMemoryWebhookEventRepository {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }

    pub fn record(&self, key: &str) -> Option<WebhookEventRecord> {
        self.records.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryWebhookEventRepository {
    async fn find_by_key(&self, key: &str) -> Result<Option<WebhookEventRecord>, DomainError> {
        Ok(self.records.lock().unwrap().get(key).cloned())
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.dedupe_key) {
            Ok(SaveResult::AlreadyExists)
        } else {
            records.insert(record.dedupe_key.clone(), record);
            Ok(SaveResult::Inserted)
        }
    }

    async fn delete_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|_, r| !r.processed_at.is_before(&cutoff));
        Ok((before - records.len()) as u64)
    }
}
