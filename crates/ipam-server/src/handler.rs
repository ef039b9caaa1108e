use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use ipam_core::{HostView, PrefixView, SpaceStats, SubnetView};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ServerResult;
use crate::service::IpamService;

pub type SharedService = Arc<IpamService>;

/// Body of a prefix or subnet create.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewBlock {
    pub key: String,
    pub cidr: String,
    #[serde(default)]
    pub description: String,
}

/// Body of a prefix or subnet modify. Replaces block and description.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockUpdate {
    pub cidr: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewHost {
    pub key: String,
    pub address: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HostUpdate {
    pub address: String,
    #[serde(default)]
    pub description: String,
}

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler.
pub async fn info_handler(State(service): State<SharedService>) -> Json<serde_json::Value> {
    Json(json!({
        "name": "ipam-server",
        "version": env!("CARGO_PKG_VERSION"),
        "policy": service.registry().policy(),
    }))
}

pub async fn status_handler(State(service): State<SharedService>) -> Json<serde_json::Value> {
    Json(json!({
        "stats": service.stats(),
        "reload": service.reload_status(),
    }))
}

pub async fn reload_handler(State(service): State<SharedService>) -> ServerResult<Json<SpaceStats>> {
    Ok(Json(service.reload().await?))
}

// -------------------------------------------------------------------
// Prefixes
// -------------------------------------------------------------------

pub async fn list_prefixes(State(service): State<SharedService>) -> Json<Vec<PrefixView>> {
    Json(service.list_prefixes())
}

pub async fn create_prefix(
    State(service): State<SharedService>,
    Json(body): Json<NewBlock>,
) -> ServerResult<(StatusCode, Json<PrefixView>)> {
    let view = service
        .create_prefix(&body.key, &body.cidr, &body.description)
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_prefix(
    State(service): State<SharedService>,
    Path(prefix): Path<String>,
) -> ServerResult<Json<PrefixView>> {
    Ok(Json(service.get_prefix(&prefix)?))
}

pub async fn update_prefix(
    State(service): State<SharedService>,
    Path(prefix): Path<String>,
    Json(body): Json<BlockUpdate>,
) -> ServerResult<Json<PrefixView>> {
    let view = service
        .modify_prefix(&prefix, &body.cidr, &body.description)
        .await?;
    Ok(Json(view))
}

pub async fn delete_prefix(
    State(service): State<SharedService>,
    Path(prefix): Path<String>,
) -> ServerResult<StatusCode> {
    service.delete_prefix(&prefix).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -------------------------------------------------------------------
// Subnets
// -------------------------------------------------------------------

pub async fn list_subnets(
    State(service): State<SharedService>,
    Path(prefix): Path<String>,
) -> ServerResult<Json<Vec<SubnetView>>> {
    Ok(Json(service.list_subnets(&prefix)?))
}

pub async fn create_subnet(
    State(service): State<SharedService>,
    Path(prefix): Path<String>,
    Json(body): Json<NewBlock>,
) -> ServerResult<(StatusCode, Json<SubnetView>)> {
    let view = service
        .create_subnet(&prefix, &body.key, &body.cidr, &body.description)
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_subnet(
    State(service): State<SharedService>,
    Path((prefix, subnet)): Path<(String, String)>,
) -> ServerResult<Json<SubnetView>> {
    Ok(Json(service.get_subnet(&prefix, &subnet)?))
}

pub async fn update_subnet(
    State(service): State<SharedService>,
    Path((prefix, subnet)): Path<(String, String)>,
    Json(body): Json<BlockUpdate>,
) -> ServerResult<Json<SubnetView>> {
    let view = service
        .modify_subnet(&prefix, &subnet, &body.cidr, &body.description)
        .await?;
    Ok(Json(view))
}

pub async fn delete_subnet(
    State(service): State<SharedService>,
    Path((prefix, subnet)): Path<(String, String)>,
) -> ServerResult<StatusCode> {
    service.delete_subnet(&prefix, &subnet).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -------------------------------------------------------------------
// Hosts
// -------------------------------------------------------------------

pub async fn list_hosts(
    State(service): State<SharedService>,
    Path((prefix, subnet)): Path<(String, String)>,
) -> ServerResult<Json<Vec<HostView>>> {
    Ok(Json(service.list_hosts(&prefix, &subnet)?))
}

pub async fn create_host(
    State(service): State<SharedService>,
    Path((prefix, subnet)): Path<(String, String)>,
    Json(body): Json<NewHost>,
) -> ServerResult<(StatusCode, Json<HostView>)> {
    let view = service
        .create_host(&prefix, &subnet, &body.key, &body.address, &body.description)
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_host(
    State(service): State<SharedService>,
    Path((prefix, subnet, host)): Path<(String, String, String)>,
) -> ServerResult<Json<HostView>> {
    Ok(Json(service.get_host(&prefix, &subnet, &host)?))
}

pub async fn update_host(
    State(service): State<SharedService>,
    Path((prefix, subnet, host)): Path<(String, String, String)>,
    Json(body): Json<HostUpdate>,
) -> ServerResult<Json<HostView>> {
    let view = service
        .modify_host(&prefix, &subnet, &host, &body.address, &body.description)
        .await?;
    Ok(Json(view))
}

pub async fn delete_host(
    State(service): State<SharedService>,
    Path((prefix, subnet, host)): Path<(String, String, String)>,
) -> ServerResult<StatusCode> {
    service.delete_host(&prefix, &subnet, &host).await?;
    Ok(StatusCode::NO_CONTENT)
}
