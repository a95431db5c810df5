// src/services/report_service.rs

use chrono::{Datelike, Months, NaiveDate};

use crate::{
    common::error::AppError,
    db::ReportRepository,
    models::report::{
        CalendarEntry, CalendarQuery, CommunityReport, CommunityReportQuery, EconomicReport,
        OrderSnapshot, PackageReport, ReportQuery, ReportWindow, RouteReport, SponsoredQuery,
        SponsoredReport, SummaryReport, WorkerReport,
    },
    services::{order_service::year_bounds, report_metrics},
};

const DEFAULT_LIMIT: usize = 10;

fn limit_or_default(limit: Option<i64>) -> usize {
    limit
        .filter(|l| *l > 0)
        .map(|l| l as usize)
        .unwrap_or(DEFAULT_LIMIT)
}

fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), AppError> {
    year_bounds(year)?;
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| AppError::BadRequest(format!("Mes inválido: {}", month)))?;
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| AppError::BadRequest(format!("Mes inválido: {}", month)))?;
    Ok((start, end))
}

/// Janela de datas dos relatórios: ano (padrão o corrente) e, opcionalmente, um mês.
pub fn report_window(query: &ReportQuery, today: NaiveDate) -> Result<ReportWindow, AppError> {
    let year = query.year.unwrap_or_else(|| today.year());
    let (from, to) = match query.mes {
        Some(month) => month_bounds(year, month)?,
        None => year_bounds(year)?,
    };
    Ok(ReportWindow {
        from: Some(from),
        to: Some(to),
        route_id: query.route_id,
        user_id: query.user_id,
    })
}

fn year_window(year: i32) -> Result<ReportWindow, AppError> {
    let (from, to) = year_bounds(year)?;
    Ok(ReportWindow { from: Some(from), to: Some(to), ..ReportWindow::default() })
}

#[derive(Clone)]
pub struct ReportService {
    repo: ReportRepository,
}

impl ReportService {
    pub fn new(repo: ReportRepository) -> Self {
        Self { repo }
    }

    async fn orders(&self, window: &ReportWindow) -> Result<Vec<OrderSnapshot>, AppError> {
        let rows = self.repo.load_rows(window).await?;
        Ok(report_metrics::group_rows(rows))
    }

    // Pedidos da janela com as linhas já restritas por comunidade/municipio
    async fn filtered_orders(&self, query: &ReportQuery, today: NaiveDate) -> Result<Vec<OrderSnapshot>, AppError> {
        let window = report_window(query, today)?;
        let orders = self.orders(&window).await?;
        Ok(report_metrics::filter_lines(orders, query.community_id, query.municipality_id))
    }

    pub async fn resumen(&self, today: NaiveDate) -> Result<SummaryReport, AppError> {
        let orders = self.orders(&year_window(today.year())?).await?;
        Ok(report_metrics::summary(&orders, today))
    }

    pub async fn despensas(&self, query: &ReportQuery, today: NaiveDate) -> Result<PackageReport, AppError> {
        let orders = self.filtered_orders(query, today).await?;
        Ok(report_metrics::packages(&orders, limit_or_default(query.limit)))
    }

    pub async fn rutas(&self, query: &ReportQuery, today: NaiveDate) -> Result<RouteReport, AppError> {
        let window = report_window(query, today)?;
        let orders = self.orders(&window).await?;
        let routes = self.repo.load_routes().await?;
        Ok(report_metrics::routes(&orders, &routes))
    }

    pub async fn comunidades(
        &self,
        query: &CommunityReportQuery,
        today: NaiveDate,
    ) -> Result<CommunityReport, AppError> {
        let orders = self
            .orders(&year_window(query.year.unwrap_or_else(|| today.year()))?)
            .await?;

        let history = match query.community_id {
            Some(id) if id <= 0 => return Err(AppError::InvalidId),
            Some(id) => {
                let all = self.orders(&ReportWindow::default()).await?;
                Some(report_metrics::filter_lines(all, Some(id), None))
            }
            None => None,
        };

        Ok(report_metrics::communities(&orders, history.as_deref()))
    }

    pub async fn apadrinadas(&self, query: &SponsoredQuery, today: NaiveDate) -> Result<SponsoredReport, AppError> {
        let all = self.orders(&ReportWindow::default()).await?;
        let (from, to) = year_bounds(today.year())?;
        let this_year: Vec<OrderSnapshot> = all
            .iter()
            .filter(|o| o.delivery_date >= from && o.delivery_date <= to)
            .cloned()
            .collect();

        Ok(report_metrics::sponsored(&this_year, &all, limit_or_default(query.limit)))
    }

    pub async fn ts(&self, query: &ReportQuery, today: NaiveDate) -> Result<WorkerReport, AppError> {
        let window = report_window(query, today)?;
        let orders = self.orders(&window).await?;
        Ok(report_metrics::workers(&orders))
    }

    pub async fn economicos(&self, query: &ReportQuery, today: NaiveDate) -> Result<EconomicReport, AppError> {
        let orders = self.filtered_orders(query, today).await?;
        Ok(report_metrics::economics(&orders))
    }

    pub async fn calendario(&self, query: &CalendarQuery) -> Result<Vec<CalendarEntry>, AppError> {
        let window = query.year.map(year_window).transpose()?.unwrap_or_default();
        let orders = self.orders(&window).await?;
        Ok(report_metrics::calendar(&orders))
    }
}
