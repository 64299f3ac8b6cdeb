//! Scheduled merchant token refresh.
//!
//! Square access tokens live for 30 days; the job renews every connected
//! organization's token pair before it lapses so kiosks never see an
//! expired-token error at the counter.

use std::sync::Arc;

use crate::application::handlers::oauth::RefreshConnectionHandler;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{ConnectionRepository, MerchantGateway};

/// How far ahead of expiry tokens are renewed.
pub const REFRESH_WINDOW_HOURS: i64 = 24;

/// Outcome counters for one refresh run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub total_due: usize,
    pub refreshed: usize,
    pub expired_grants: usize,
    pub errors: usize,
}

/// Refreshes every connection whose token expires inside the window.
///
/// Individual failures never abort the run; a connection whose refresh
/// grant is rejected is marked expired by the handler and counted here.
pub async fn refresh_expiring_connections(
    connections: Arc<dyn ConnectionRepository>,
    gateway: Arc<dyn MerchantGateway>,
) -> Result<RefreshStats, DomainError> {
    let due = connections
        .find_expiring_within_hours(REFRESH_WINDOW_HOURS)
        .await?;

    let mut stats = RefreshStats {
        total_due: due.len(),
        ..Default::default()
    };

    tracing::info!(total_due = stats.total_due, "Starting token refresh run");

    let handler = RefreshConnectionHandler::new(connections, gateway);
    for connection in due {
        let organization_id = connection.organization_id;
        match handler.refresh(connection).await {
            Ok(_) => stats.refreshed += 1,
            Err(err) if err.code == ErrorCode::ConnectionExpired => {
                stats.expired_grants += 1;
            }
            Err(err) => {
                tracing::error!(
                    organization_id = %organization_id,
                    error = %err,
                    "Token refresh failed"
                );
                stats.errors += 1;
            }
        }
    }

    tracing::info!(?stats, "Token refresh run completed");
    Ok(stats)
}
