//! PostgreSQL implementation of DeviceRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::device::{Device, DeviceStatus};
use crate::domain::foundation::{DeviceId, DomainError, ErrorCode, OrganizationId, Timestamp};
use crate::ports::DeviceRepository;

/// PostgreSQL implementation of the DeviceRepository port.
pub struct PostgresDeviceRepository {
    pool: PgPool,
}

impl PostgresDeviceRepository {
    /// Creates a repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DeviceRow {
    id: Uuid,
    organization_id: Uuid,
    name: String,
    platform: String,
    app_version: String,
    status: String,
    registered_at: DateTime<Utc>,
    last_seen_at: DateTime<Utc>,
}

impl TryFrom<DeviceRow> for Device {
    type Error = DomainError;

    fn try_from(row: DeviceRow) -> Result<Self, Self::Error> {
        Ok(Device {
            id: DeviceId::from_uuid(row.id),
            organization_id: OrganizationId::from_uuid(row.organization_id),
            name: row.name,
            platform: row.platform,
            app_version: row.app_version,
            status: parse_status(&row.status)?,
            registered_at: Timestamp::from_datetime(row.registered_at),
            last_seen_at: Timestamp::from_datetime(row.last_seen_at),
        })
    }
}

fn parse_status(s: &str) -> Result<DeviceStatus, DomainError> {
    match s {
        "active" => Ok(DeviceStatus::Active),
        "revoked" => Ok(DeviceStatus::Revoked),
        _ => Err(DomainError::database(format!(
            "Invalid device status value: {}",
            s
        ))),
    }
}

fn status_to_string(status: &DeviceStatus) -> &'static str {
    match status {
        DeviceStatus::Active => "active",
        DeviceStatus::Revoked => "revoked",
    }
}

#[async_trait]
impl DeviceRepository for PostgresDeviceRepository {
    async fn save(&self, device: &Device) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO devices (
                id, organization_id, name, platform, app_version, status,
                registered_at, last_seen_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(device.id.as_uuid())
        .bind(device.organization_id.as_uuid())
        .bind(&device.name)
        .bind(&device.platform)
        .bind(&device.app_version)
        .bind(status_to_string(&device.status))
        .bind(device.registered_at.as_datetime())
        .bind(device.last_seen_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to save device: {}", e)))?;

        Ok(())
    }

    async fn update(&self, device: &Device) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE devices SET
                name = $2,
                app_version = $3,
                status = $4,
                last_seen_at = $5
            WHERE id = $1
            "#,
        )
        .bind(device.id.as_uuid())
        .bind(&device.name)
        .bind(&device.app_version)
        .bind(status_to_string(&device.status))
        .bind(device.last_seen_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update device: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(ErrorCode::DeviceNotFound, "Device"));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &DeviceId) -> Result<Option<Device>, DomainError> {
        let row: Option<DeviceRow> = sqlx::query_as(
            r#"
            SELECT id, organization_id, name, platform, app_version, status,
                   registered_at, last_seen_at
            FROM devices
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find device: {}", e)))?;

        row.map(Device::try_from).transpose()
    }

    async fn list_by_organization(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Device>, DomainError> {
        let rows: Vec<DeviceRow> = sqlx::query_as(
            r#"
            SELECT id, organization_id, name, platform, app_version, status,
                   registered_at, last_seen_at
            FROM devices
            WHERE organization_id = $1
            ORDER BY last_seen_at DESC
            "#,
        )
        .bind(organization_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list devices: {}", e)))?;

        rows.into_iter().map(Device::try_from).collect()
    }
}
