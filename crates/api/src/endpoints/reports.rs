//! Report lifecycle endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use civic_common::{AppError, AppResult, BoundingBox, LocationInput};
use civic_core::{CreateReportInput, MapData, MapQuery};
use civic_db::{
    entities::{
        photo,
        report::{self, ReportCategory, ReportStatus},
    },
    repositories::{MapReportRecord, ReportCluster},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
};

/// Create the reports router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_report))
        .route("/", get(list_reports))
        .route("/assigned/my", get(my_assigned_reports))
        .route("/map", get(map_reports))
        .route("/search", get(search_reports))
        .route("/{id}", get(get_report))
        .route("/{id}/approve", post(approve_report))
        .route("/{id}/reject", post(reject_report))
        .route("/{id}/status", post(update_status))
        .route("/{id}/external-maintainer", post(assign_external_maintainer))
}

// ========== DTOs ==========

/// A coordinate pair in API responses.
#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub latitude: f64,
    pub longitude: f64,
}

/// Photo response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoResponse {
    pub id: i64,
    pub report_id: i64,
    pub storage_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<photo::Model> for PhotoResponse {
    fn from(photo: photo::Model) -> Self {
        Self {
            id: photo.id,
            report_id: photo.report_id,
            storage_url: photo.storage_url,
            created_at: photo.created_at.into(),
        }
    }
}

/// Report response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: i64,
    pub reporter_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub category: ReportCategory,
    pub location: LocationResponse,
    pub photos: Vec<PhotoResponse>,
    pub is_anonymous: bool,
    pub status: ReportStatus,
    pub rejection_reason: Option<String>,
    pub assignee_id: Option<i64>,
    pub external_assignee_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportResponse {
    fn from_parts(report: report::Model, photos: Vec<photo::Model>) -> Self {
        Self {
            id: report.id,
            reporter_id: report.reporter_id,
            title: report.title,
            description: report.description,
            category: report.category,
            location: LocationResponse {
                latitude: report.latitude,
                longitude: report.longitude,
            },
            photos: photos.into_iter().map(PhotoResponse::from).collect(),
            is_anonymous: report.is_anonymous,
            status: report.status,
            rejection_reason: report.rejection_reason,
            assignee_id: report.assignee_id,
            external_assignee_id: report.external_assignee_id,
            created_at: report.created_at.into(),
            updated_at: report.updated_at.into(),
        }
    }
}

impl From<report::Model> for ReportResponse {
    fn from(report: report::Model) -> Self {
        Self::from_parts(report, Vec::new())
    }
}

/// An approved report on the public map.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapReportResponse {
    pub id: i64,
    pub title: String,
    pub category: ReportCategory,
    pub location: LocationResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub status: ReportStatus,
    pub reporter_name: String,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

impl From<MapReportRecord> for MapReportResponse {
    fn from(record: MapReportRecord) -> Self {
        let report = record.report;
        Self {
            id: report.id,
            title: report.title,
            category: report.category,
            location: LocationResponse {
                latitude: report.latitude,
                longitude: report.longitude,
            },
            address: report.address,
            status: report.status,
            reporter_name: record.reporter_name,
            is_anonymous: report.is_anonymous,
            created_at: report.created_at.into(),
        }
    }
}

/// A grid cluster of nearby reports at low zoom.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusteredReportResponse {
    pub cluster_id: String,
    pub location: LocationResponse,
    pub report_count: u64,
    pub report_ids: Vec<i64>,
}

impl From<ReportCluster> for ClusteredReportResponse {
    fn from(cluster: ReportCluster) -> Self {
        Self {
            cluster_id: cluster.cluster_id,
            location: LocationResponse {
                latitude: cluster.latitude,
                longitude: cluster.longitude,
            },
            report_count: cluster.report_count,
            report_ids: cluster.report_ids,
        }
    }
}

/// Map data, individual markers or clusters depending on zoom.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MapReportsResponse {
    Individual(Vec<MapReportResponse>),
    Clustered(Vec<ClusteredReportResponse>),
}

// ========== Requests ==========

/// Create report request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 4000))]
    pub description: String,
    pub category: ReportCategory,
    pub location: Option<LocationInput>,
    pub address: Option<String>,
    /// Base64 data URIs, 1-3 items.
    pub photos: Vec<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// List reports query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReportsQuery {
    pub status: Option<String>,
    pub category: Option<String>,
}

/// Map viewport query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapReportsQuery {
    pub zoom: Option<u8>,
    /// `minLon,minLat,maxLon,maxLat`.
    pub bbox: Option<String>,
    pub category: Option<String>,
}

/// Address search query.
#[derive(Debug, Deserialize)]
pub struct SearchReportsQuery {
    pub address: String,
}

/// Approve report request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveReportRequest {
    /// Optional category override applied before assignment.
    pub category: Option<String>,
}

/// Reject report request.
#[derive(Debug, Deserialize)]
pub struct RejectReportRequest {
    pub reason: String,
}

/// Status transition request.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// External delegation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignExternalRequest {
    pub external_assignee_id: i64,
}

fn parse_status(name: &str) -> AppResult<ReportStatus> {
    ReportStatus::from_name(name)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid status: {name}")))
}

fn parse_category(name: &str) -> AppResult<ReportCategory> {
    ReportCategory::from_name(name)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid category: {name}")))
}

// ========== Handlers ==========

/// Submit a new report.
async fn create_report(
    MaybeAuthUser(user): MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateReportRequest>,
) -> AppResult<(StatusCode, Json<ReportResponse>)> {
    req.validate()?;

    let reporter_id = user.map(|u| u.id);
    info!(?reporter_id, category = %req.category, "Creating report");

    let input = CreateReportInput {
        title: req.title,
        description: req.description,
        category: req.category,
        location: req.location,
        address: req.address,
        photos: req.photos,
        is_anonymous: req.is_anonymous,
    };

    let detail = state.report_service.create_report(reporter_id, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ReportResponse::from_parts(detail.report, detail.photos)),
    ))
}

/// List reports with optional status and category filters.
async fn list_reports(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListReportsQuery>,
) -> AppResult<Json<Vec<ReportResponse>>> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let category = query.category.as_deref().map(parse_category).transpose()?;

    let reports = state
        .report_service
        .get_all_reports(user.id, status, category)
        .await?;

    Ok(Json(reports.into_iter().map(ReportResponse::from).collect()))
}

/// List the reports assigned to the authenticated staff member.
async fn my_assigned_reports(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListReportsQuery>,
) -> AppResult<Json<Vec<ReportResponse>>> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let category = query.category.as_deref().map(parse_category).transpose()?;

    let reports = state
        .report_service
        .get_my_assigned_reports(user.id, status, category)
        .await?;

    Ok(Json(reports.into_iter().map(ReportResponse::from).collect()))
}

/// Approved reports for map rendering, clustered at low zoom.
async fn map_reports(
    State(state): State<AppState>,
    Query(query): Query<MapReportsQuery>,
) -> AppResult<Json<MapReportsResponse>> {
    let bbox = query
        .bbox
        .as_deref()
        .map(BoundingBox::parse)
        .transpose()?;
    let category = query.category.as_deref().map(parse_category).transpose()?;

    let data = state
        .report_service
        .get_map_reports(MapQuery {
            zoom: query.zoom,
            bbox,
            category,
        })
        .await?;

    let response = match data {
        MapData::Individual(records) => MapReportsResponse::Individual(
            records.into_iter().map(MapReportResponse::from).collect(),
        ),
        MapData::Clustered(clusters) => MapReportsResponse::Clustered(
            clusters
                .into_iter()
                .map(ClusteredReportResponse::from)
                .collect(),
        ),
    };

    Ok(Json(response))
}

/// Find reports by address substring.
async fn search_reports(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<SearchReportsQuery>,
) -> AppResult<Json<Vec<ReportResponse>>> {
    let reports = state.report_service.search_by_address(&query.address).await?;
    Ok(Json(reports.into_iter().map(ReportResponse::from).collect()))
}

/// Get a single report with its photos.
async fn get_report(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ReportResponse>> {
    let detail = state.report_service.get_report(id).await?;
    Ok(Json(ReportResponse::from_parts(detail.report, detail.photos)))
}

/// Approve a pending report and assign it to staff.
async fn approve_report(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ApproveReportRequest>,
) -> AppResult<Json<ReportResponse>> {
    info!(report_id = id, caller = user.id, "Approving report");

    let report = state
        .report_service
        .approve_report(id, req.category, user.id)
        .await?;

    Ok(Json(ReportResponse::from(report)))
}

/// Reject a pending report with a reason.
async fn reject_report(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<RejectReportRequest>,
) -> AppResult<Json<ReportResponse>> {
    info!(report_id = id, caller = user.id, "Rejecting report");

    let report = state
        .report_service
        .reject_report(id, &req.reason, user.id)
        .await?;

    Ok(Json(ReportResponse::from(report)))
}

/// Move a report between In Progress, Suspended and Resolved.
async fn update_status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStatusRequest>,
) -> AppResult<Json<ReportResponse>> {
    let target = parse_status(&req.status)?;
    info!(report_id = id, caller = user.id, target = %target, "Updating report status");

    let report = state
        .report_service
        .update_status(id, target, user.id)
        .await?;

    Ok(Json(ReportResponse::from(report)))
}

/// Delegate an assigned report to an external maintainer.
async fn assign_external_maintainer(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<AssignExternalRequest>,
) -> AppResult<Json<ReportResponse>> {
    info!(
        report_id = id,
        caller = user.id,
        external_assignee_id = req.external_assignee_id,
        "Delegating report to external maintainer"
    );

    let report = state
        .report_service
        .assign_to_external_maintainer(id, req.external_assignee_id, user.id)
        .await?;

    Ok(Json(ReportResponse::from(report)))
}
