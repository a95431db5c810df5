// src/models/report.rs

use std::ops::AddAssign;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use crate::models::order::OrderStatus;

// ---
// Entrada: linhas planas do JOIN pedidos x comunidades
// ---

#[derive(Debug, Clone, FromRow)]
pub struct ReportRow {
    pub order_id: i32,
    pub delivery_date: NaiveDate,
    pub status: OrderStatus,
    pub returns: i32,
    pub user_id: Option<i32>,
    pub username: Option<String>,
    pub route_id: Option<i32>,
    pub route_name: Option<String>,
    pub community_id: Option<i32>,
    pub community_name: Option<String>,
    pub municipality_id: Option<i32>,
    pub municipality_name: Option<String>,
    pub package_cost: Option<Decimal>,
    pub full_cost: Option<i32>,
    pub half_cost: Option<i32>,
    pub no_cost: Option<i32>,
    pub sponsored: Option<i32>,
}

// Filtro aplicado no SQL
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub route_id: Option<i32>,
    pub user_id: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ReportQuery {
    #[serde(rename = "año", alias = "anio", alias = "year")]
    pub year: Option<i32>,
    pub mes: Option<u32>,
    #[serde(rename = "comunidadId")]
    pub community_id: Option<i32>,
    #[serde(rename = "municipioId")]
    pub municipality_id: Option<i32>,
    #[serde(rename = "rutaId")]
    pub route_id: Option<i32>,
    #[serde(rename = "tsId")]
    pub user_id: Option<i32>,
    pub limit: Option<i64>,
}

// ---
// Pedido reagrupado em memória
// ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TierCounts {
    pub costo: i64,
    pub medio_costo: i64,
    pub sin_costo: i64,
    pub apadrinadas: i64,
}

impl TierCounts {
    pub fn total(&self) -> i64 {
        self.costo + self.medio_costo + self.sin_costo + self.apadrinadas
    }

    // Unidades sem contar as apadrinadas
    pub fn unsponsored(&self) -> i64 {
        self.costo + self.medio_costo + self.sin_costo
    }
}

impl AddAssign for TierCounts {
    fn add_assign(&mut self, other: Self) {
        self.costo += other.costo;
        self.medio_costo += other.medio_costo;
        self.sin_costo += other.sin_costo;
        self.apadrinadas += other.apadrinadas;
    }
}

#[derive(Debug, Clone)]
pub struct LineSnapshot {
    pub community_id: i32,
    pub community_name: String,
    pub municipality_id: Option<i32>,
    pub municipality_name: Option<String>,
    pub package_cost: Decimal,
    pub tiers: TierCounts,
}

#[derive(Debug, Clone)]
pub struct OrderSnapshot {
    pub id: i32,
    pub delivery_date: NaiveDate,
    pub status: OrderStatus,
    pub returns: i64,
    pub user_id: Option<i32>,
    pub username: Option<String>,
    pub route_id: Option<i32>,
    pub route_name: Option<String>,
    pub lines: Vec<LineSnapshot>,
}

impl OrderSnapshot {
    pub fn tiers(&self) -> TierCounts {
        let mut tiers = TierCounts::default();
        for line in &self.lines {
            tiers += line.tiers;
        }
        tiers
    }

    pub fn packages(&self) -> i64 {
        self.tiers().total()
    }

    pub fn month_key(&self) -> String {
        format!("{:04}-{:02}", self.delivery_date.year(), self.delivery_date.month())
    }

    pub fn route_label(&self) -> String {
        self.route_name.clone().unwrap_or_else(|| "Sin ruta".to_string())
    }

    pub fn worker_label(&self) -> String {
        self.username.clone().unwrap_or_else(|| "Sin asignar".to_string())
    }
}

// ---
// Saídas
// ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NamedTotal {
    pub id: Option<i32>,
    pub nombre: String,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthTotal {
    pub mes: String,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub id_pedido: i32,
    pub fecha: NaiveDate,
    pub estado: OrderStatus,
    pub ruta: String,
    pub total_despensas: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub despensas_por_mes: Vec<MonthTiers>,
    pub tipos_despensas: TierCounts,
    pub top_trabajadores: Vec<NamedTotal>,
    // Pares [nome, unidades]
    #[schema(value_type = Vec<Vec<Object>>)]
    pub top_comunidades: Vec<(String, i64)>,
    #[schema(value_type = Vec<Vec<Object>>)]
    pub top_rutas: Vec<(String, i64)>,
    #[schema(value_type = Vec<Vec<Object>>)]
    pub rutas_devoluciones: Vec<(String, i64)>,
    pub calendario: Vec<CalendarEntry>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteMetrics {
    pub id_ruta: i32,
    pub nombre: String,
    pub pedidos: i64,
    pub despensas: i64,
    pub devoluciones: i64,
    pub detalle: TierCounts,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ComparisonChart {
    pub labels: Vec<String>,
    pub pedidos: Vec<i64>,
    pub despensas: Vec<i64>,
    pub devoluciones: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteReport {
    pub tabla_metricas: Vec<RouteMetrics>,
    pub ranking_pedidos: Vec<NamedTotal>,
    pub ranking_despensas: Vec<NamedTotal>,
    pub grafica_comparativa: ComparisonChart,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerMetrics {
    pub id_usuario: i32,
    pub username: String,
    pub pedidos: i64,
    pub despensas: i64,
    pub devoluciones: i64,
    pub pedidos_pendientes: i64,
    pub promedio_despensas: f64,
    pub porcentaje_devoluciones: f64,
    pub porcentaje_contribucion: f64,
    pub ultima_actividad: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct BarChart {
    pub labels: Vec<String>,
    pub pedidos: Vec<i64>,
    pub despensas: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct PieChart {
    pub labels: Vec<String>,
    pub valores: Vec<f64>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct WorkerCharts {
    pub barras: BarChart,
    pub pastel: PieChart,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrder {
    pub id_pedido: i32,
    pub fecha_entrega: NaiveDate,
    pub estado: OrderStatus,
    pub ruta: String,
    pub despensas: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerActivity {
    pub id_usuario: i32,
    pub username: String,
    pub pedidos: Vec<RecentOrder>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkerReport {
    pub trabajadores: Vec<WorkerMetrics>,
    pub graficas: WorkerCharts,
    pub actividad_reciente: Vec<WorkerActivity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthTiers {
    pub mes: String,
    #[serde(flatten)]
    pub tiers: TierCounts,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TierSummary {
    #[serde(flatten)]
    pub tiers: TierCounts,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnsTrend {
    pub mensual: Vec<MonthTotal>,
    pub por_ruta: Vec<NamedTotal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NamedAverage {
    pub id: Option<i32>,
    pub nombre: String,
    pub promedio: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Averages {
    pub global: f64,
    pub por_ruta: Vec<NamedAverage>,
    pub por_comunidad: Vec<NamedAverage>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageDetailRow {
    pub id_pedido: i32,
    pub fecha_entrega: NaiveDate,
    pub estado: OrderStatus,
    pub ruta: String,
    pub trabajador: String,
    pub comunidades: String,
    #[serde(flatten)]
    pub tiers: TierCounts,
    pub total: i64,
    pub devoluciones: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageReport {
    pub evolucion_mensual: Vec<MonthTiers>,
    pub resumen_tipos: TierSummary,
    pub tendencia_devoluciones: ReturnsTrend,
    pub promedios: Averages,
    pub tabla_detallada: Vec<PackageDetailRow>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommunityMetrics {
    pub id_comunidad: i32,
    pub nombre: String,
    pub municipio: Option<String>,
    pub pedidos: i64,
    pub despensas: i64,
    pub detalle: TierCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MunicipalityVolume {
    pub id_municipio: Option<i32>,
    pub municipio: String,
    pub comunidades: i64,
    pub despensas: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommunityReport {
    pub top_pedidos: Vec<NamedTotal>,
    pub top_despensas: Vec<NamedTotal>,
    pub mapa_volumen: Vec<MunicipalityVolume>,
    pub evolucion: Vec<MonthTiers>,
    pub tabla_detallada: Vec<CommunityMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SponsoredMonth {
    pub mes: String,
    pub apadrinadas: i64,
    pub total: i64,
    pub porcentaje: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SponsoredGlobals {
    pub total_apadrinadas: i64,
    pub total_despensas: i64,
    pub porcentaje: f64,
    pub pedidos_con_apadrinadas: i64,
    pub promedio_por_pedido: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SponsoredOrder {
    pub id_pedido: i32,
    pub fecha_entrega: NaiveDate,
    pub ruta: String,
    pub trabajador: String,
    pub apadrinadas: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SponsoredReport {
    pub mensual: Vec<SponsoredMonth>,
    pub metricas_globales: SponsoredGlobals,
    pub top_ts: Vec<NamedTotal>,
    pub top_comunidades: Vec<NamedTotal>,
    pub ultimos_pedidos: Vec<SponsoredOrder>,
}

// Valores em dinheiro por linha: cuota completa, meia cuota, sem custo e apadrinadas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EconomicTotals {
    #[schema(value_type = f64)]
    pub ingresos_costo: Decimal,
    #[schema(value_type = f64)]
    pub ingresos_medio_costo: Decimal,
    #[schema(value_type = f64)]
    pub subsidio_sin_costo: Decimal,
    #[schema(value_type = f64)]
    pub subsidio_apadrinadas: Decimal,
    #[schema(value_type = f64)]
    pub recuperado: Decimal,
    #[schema(value_type = f64)]
    pub subsidiado: Decimal,
    #[schema(value_type = f64)]
    pub costo_total: Decimal,
    #[schema(value_type = f64)]
    pub balance: Decimal,
}

impl AddAssign for EconomicTotals {
    fn add_assign(&mut self, other: Self) {
        self.ingresos_costo += other.ingresos_costo;
        self.ingresos_medio_costo += other.ingresos_medio_costo;
        self.subsidio_sin_costo += other.subsidio_sin_costo;
        self.subsidio_apadrinadas += other.subsidio_apadrinadas;
        self.recuperado += other.recuperado;
        self.subsidiado += other.subsidiado;
        self.costo_total += other.costo_total;
        self.balance += other.balance;
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EconomicGroup {
    pub id: Option<i32>,
    pub nombre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipio: Option<String>,
    #[serde(flatten)]
    pub totales: EconomicTotals,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EconomicSummary {
    #[serde(flatten)]
    pub totales: EconomicTotals,
    pub pedidos: i64,
    pub despensas: TierCounts,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EconomicReport {
    pub resumen_global: EconomicSummary,
    pub por_mes: Vec<EconomicGroup>,
    pub por_comunidad: Vec<EconomicGroup>,
    pub por_municipio: Vec<EconomicGroup>,
    pub por_ruta: Vec<EconomicGroup>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct CalendarQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct CommunityReportQuery {
    #[serde(rename = "comunidadId")]
    pub community_id: Option<i32>,
    #[serde(rename = "año", alias = "anio", alias = "year")]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct SponsoredQuery {
    pub limit: Option<i64>,
}
