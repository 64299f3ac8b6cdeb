//! HTTP handlers for the device endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::dto::{DeviceListResponse, DeviceResponse, HeartbeatBody, RegisterDeviceBody};
use crate::adapters::http::{ApiError, AppState, OrganizationContext};
use crate::application::handlers::devices::{
    HeartbeatDeviceCommand, ListDevicesQuery, RegisterDeviceCommand, RevokeDeviceCommand,
};
use crate::domain::foundation::DeviceId;

/// `POST /api/devices/register`
pub async fn register(
    State(state): State<AppState>,
    context: OrganizationContext,
    Json(body): Json<RegisterDeviceBody>,
) -> Result<(StatusCode, Json<DeviceResponse>), ApiError> {
    let device = state
        .register_device_handler()
        .handle(RegisterDeviceCommand {
            organization_id: context.organization_id,
            name: body.name,
            platform: body.platform,
            app_version: body.app_version,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(DeviceResponse::from(&device))))
}

/// `GET /api/devices`
pub async fn list(
    State(state): State<AppState>,
    context: OrganizationContext,
) -> Result<Json<DeviceListResponse>, ApiError> {
    let devices = state
        .list_devices_handler()
        .handle(ListDevicesQuery {
            organization_id: context.organization_id,
        })
        .await?;

    Ok(Json(DeviceListResponse {
        devices: devices.iter().map(DeviceResponse::from).collect(),
    }))
}

/// `POST /api/devices/:id/heartbeat`
pub async fn heartbeat(
    State(state): State<AppState>,
    context: OrganizationContext,
    Path(device_id): Path<DeviceId>,
    body: Option<Json<HeartbeatBody>>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let device = state
        .heartbeat_device_handler()
        .handle(HeartbeatDeviceCommand {
            organization_id: context.organization_id,
            device_id,
            app_version: body.app_version,
        })
        .await?;

    Ok(Json(DeviceResponse::from(&device)))
}

/// `POST /api/devices/:id/revoke`
pub async fn revoke(
    State(state): State<AppState>,
    context: OrganizationContext,
    Path(device_id): Path<DeviceId>,
) -> Result<StatusCode, ApiError> {
    state
        .revoke_device_handler()
        .handle(RevokeDeviceCommand {
            organization_id: context.organization_id,
            device_id,
        })
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
