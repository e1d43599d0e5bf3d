//! HTTP JSON API exposed to LAN clients.
//!
//! Failures are reported as `{"error": "..."}` bodies: 400 for missing
//! or out-of-range parameters, 404 for unknown groups, 502 when the
//! addressed device cannot be reached.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::device::{DeviceClient, DeviceInfo, LightState, validate_light_params};
use crate::directory::DeviceDirectory;
use crate::groups::GroupCache;

#[derive(Clone)]
pub struct AppState {
    pub directory: DeviceDirectory,
    pub groups: Arc<Mutex<GroupCache>>,
    pub client: DeviceClient,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/lights/all", get(get_all_lights))
        .route("/lights/group", get(get_groups).put(put_group))
        .route("/lights", put(put_group_light))
        .route("/elgato/lights", get(get_light).put(set_light))
        .route("/elgato/accessory-info", get(get_info).put(set_name))
        .with_state(state)
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

/// GET /lights/all - every device in the directory.
async fn get_all_lights(State(state): State<AppState>) -> Json<Vec<DeviceInfo>> {
    Json(state.directory.all())
}

/// GET /lights/group - all groups and their serial numbers.
async fn get_groups(State(state): State<AppState>) -> Json<BTreeMap<String, Vec<String>>> {
    let groups = state.groups.lock().expect("groups lock poisoned");
    Json(groups.all_groups().clone())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupBody {
    group_name: String,
    serial_numbers: Vec<String>,
}

/// PUT /lights/group - create or replace a group.
async fn put_group(
    State(state): State<AppState>,
    body: Result<Json<GroupBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    if body.group_name.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "groupName must not be empty",
        ));
    }

    let mut groups = state.groups.lock().expect("groups lock poisoned");
    if body.serial_numbers.is_empty() {
        // An empty serial list would be dropped on reload anyway; treat
        // it as removal.
        groups
            .remove_group(&body.group_name)
            .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;
    } else {
        groups
            .add_group(&body.group_name, body.serial_numbers)
            .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;
    }
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
struct LightSetting {
    brightness: i32,
    temperature: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct GroupLightBody {
    group: String,
    light: LightSetting,
}

/// PUT /lights - apply a light setting to every device of a group.
async fn put_group_light(
    State(state): State<AppState>,
    body: Result<Json<GroupLightBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    validate_light_params(body.light.brightness, body.light.temperature)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    // Copy the serial list out so the lock is not held across awaits.
    let serials = {
        let groups = state.groups.lock().expect("groups lock poisoned");
        if !groups.has_group(&body.group) {
            return Err(api_error(
                StatusCode::NOT_FOUND,
                format!("group '{}' not found", body.group),
            ));
        }
        groups.group(&body.group).cloned().unwrap_or_default()
    };

    let mut results = Vec::new();
    for serial in serials {
        let Some(info) = state.directory.by_serial(&serial) else {
            results.push(json!({ "serialNumber": serial, "error": "unknown serial" }));
            continue;
        };
        match state
            .client
            .set_light(&info.ip, body.light.brightness, body.light.temperature)
            .await
        {
            Ok(light) => results.push(json!({ "serialNumber": serial, "light": light })),
            Err(e) => results.push(json!({ "serialNumber": serial, "error": format!("{e:#}") })),
        }
    }

    Ok(Json(json!({ "group": body.group, "results": results })))
}

fn require_param<'a>(params: &'a HashMap<String, String>, key: &str) -> Result<&'a str, ApiError> {
    params
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, format!("Missing '{key}' parameter")))
}

fn parse_param(params: &HashMap<String, String>, key: &str) -> Result<i32, ApiError> {
    require_param(params, key)?.parse().map_err(|_| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("'{key}' must be an integer"),
        )
    })
}

/// GET /elgato/lights?ip= - light state of one device.
async fn get_light(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<LightState>, ApiError> {
    let ip = require_param(&params, "ip")?;
    state
        .client
        .light_state(ip)
        .await
        .map(Json)
        .map_err(|e| api_error(StatusCode::BAD_GATEWAY, format!("{e:#}")))
}

/// PUT /elgato/lights?ip=&brightness=&temperature= - set one device.
async fn set_light(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<LightState>, ApiError> {
    let ip = require_param(&params, "ip")?;
    let brightness = parse_param(&params, "brightness")?;
    let temperature = parse_param(&params, "temperature")?;

    validate_light_params(brightness, Some(temperature))
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    state
        .client
        .set_light(ip, brightness, Some(temperature))
        .await
        .map(Json)
        .map_err(|e| api_error(StatusCode::BAD_GATEWAY, format!("{e:#}")))
}

/// GET /elgato/accessory-info?ip= - metadata of one device.
async fn get_info(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<DeviceInfo>, ApiError> {
    let ip = require_param(&params, "ip")?;
    state
        .client
        .accessory_info(ip)
        .await
        .map(Json)
        .map_err(|e| api_error(StatusCode::BAD_GATEWAY, format!("{e:#}")))
}

/// PUT /elgato/accessory-info?ip=&name= - rename one device.
async fn set_name(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let ip = require_param(&params, "ip")?;
    let name = require_param(&params, "name")?;
    state
        .client
        .set_display_name(ip, name)
        .await
        .map_err(|e| api_error(StatusCode::BAD_GATEWAY, format!("{e:#}")))?;
    Ok(Json(json!({ "success": true })))
}
