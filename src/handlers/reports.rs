// src/handlers/reports.rs
//
// Todos os relatórios usam o ano corrente como janela padrão.

use axum::{
    extract::State,
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};

use crate::{
    common::{error::ApiError, extract::Query, response::ApiResponse},
    config::AppState,
    middleware::i18n::Locale,
    models::report::{
        CalendarEntry, CalendarQuery, CommunityReport, CommunityReportQuery, EconomicReport,
        PackageReport, ReportQuery, RouteReport, SponsoredQuery, SponsoredReport, SummaryReport,
        WorkerReport,
    },
};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// GET /reportes
#[utoipa::path(
    get,
    path = "/reportes",
    tag = "Reportes",
    responses((status = 200, description = "Resumo do ano corrente", body = SummaryReport)),
    security(("api_jwt" = []))
)]
pub async fn summary(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .resumen(today())
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(report))
}

// GET /reportes/despensas
#[utoipa::path(
    get,
    path = "/reportes/despensas",
    tag = "Reportes",
    params(ReportQuery),
    responses(
        (status = 200, description = "Evolução, tipos, devoluções e médias de despensas", body = PackageReport),
        (status = 400, description = "Mes inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn packages(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .despensas(&query, today())
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(report))
}

// GET /reportes/rutas
#[utoipa::path(
    get,
    path = "/reportes/rutas",
    tag = "Reportes",
    params(ReportQuery),
    responses((status = 200, description = "Métricas e rankings por ruta", body = RouteReport)),
    security(("api_jwt" = []))
)]
pub async fn routes(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .rutas(&query, today())
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(report))
}

// GET /reportes/comunidades
#[utoipa::path(
    get,
    path = "/reportes/comunidades",
    tag = "Reportes",
    params(CommunityReportQuery),
    responses((status = 200, description = "Métricas por comunidade e municipio", body = CommunityReport)),
    security(("api_jwt" = []))
)]
pub async fn communities(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<CommunityReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .comunidades(&query, today())
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(report))
}

// GET /reportes/apadrinadas
#[utoipa::path(
    get,
    path = "/reportes/apadrinadas",
    tag = "Reportes",
    params(SponsoredQuery),
    responses((status = 200, description = "Despensas apadrinadas", body = SponsoredReport)),
    security(("api_jwt" = []))
)]
pub async fn sponsored(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<SponsoredQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .apadrinadas(&query, today())
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(report))
}

// GET /reportes/ts
#[utoipa::path(
    get,
    path = "/reportes/ts",
    tag = "Reportes",
    params(ReportQuery),
    responses((status = 200, description = "Desempenho dos trabalhadores sociais", body = WorkerReport)),
    security(("api_jwt" = []))
)]
pub async fn workers(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .ts(&query, today())
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(report))
}

// GET /reportes/economicos
#[utoipa::path(
    get,
    path = "/reportes/economicos",
    tag = "Reportes",
    params(ReportQuery),
    responses((status = 200, description = "Recuperado x subsidiado", body = EconomicReport)),
    security(("api_jwt" = []))
)]
pub async fn economics(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .economicos(&query, today())
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(report))
}

// GET /reportes/calendario
#[utoipa::path(
    get,
    path = "/reportes/calendario",
    tag = "Reportes",
    params(CalendarQuery),
    responses((status = 200, description = "Pedidos por data de entrega", body = Vec<CalendarEntry>)),
    security(("api_jwt" = []))
)]
pub async fn calendar(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<CalendarQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = app_state
        .report_service
        .calendario(&query)
        .await
        .map_err(|e| e.to_api_error(&locale))?;
    Ok(ApiResponse::success(entries))
}
