// src/services/document_service.rs

use chrono::NaiveDate;
use genpdf::{elements, style, Alignment, Element};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    common::error::AppError,
    models::{collection::GenerateCollectionPayload, order::OrderDetail},
};

const ORGANIZATION: &str = "BANCO DIOCESANO DE ALIMENTOS DE LOS ALTOS A.C.";
const RECEIPT_TITLE: &str = "RECIBO CUOTA DE RECUPERACIÓN";

pub fn money(value: Decimal) -> String {
    format!("${:.2}", value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

// Uma linha da tabela de comunidades do recibo
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptLine {
    pub community: String,
    pub cost: Decimal,
    pub full: i64,
    pub half: i64,
    pub no_cost: i64,
    pub sponsored: i64,
    pub packages: i64,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReceiptTotals {
    pub full: i64,
    pub half: i64,
    pub no_cost: i64,
    pub sponsored: i64,
    pub packages: i64,
    pub subtotal: Decimal,
}

/// Tudo o que o recibo imprime, já calculado. O layout só formata.
#[derive(Debug, Clone)]
pub struct ReceiptData {
    pub order_id: i32,
    pub worker: String,
    pub route: String,
    pub delivery_date: NaiveDate,
    pub accounting_date: NaiveDate,
    pub lines: Vec<ReceiptLine>,
    pub totals: ReceiptTotals,
    pub extras: GenerateCollectionPayload,
    pub total_recovered: Decimal,
}

impl ReceiptData {
    pub fn build(order: &OrderDetail, extras: &GenerateCollectionPayload, accounting_date: NaiveDate) -> Self {
        let mut totals = ReceiptTotals::default();

        let lines: Vec<ReceiptLine> = order
            .lines
            .iter()
            .map(|line| {
                let receipt_line = ReceiptLine {
                    community: line.community_name.clone(),
                    cost: line.package_cost,
                    full: i64::from(line.full_cost),
                    half: i64::from(line.half_cost),
                    no_cost: i64::from(line.no_cost),
                    sponsored: i64::from(line.sponsored),
                    packages: line.packages(),
                    subtotal: line.amount(),
                };
                totals.full += receipt_line.full;
                totals.half += receipt_line.half;
                totals.no_cost += receipt_line.no_cost;
                totals.sponsored += receipt_line.sponsored;
                totals.packages += receipt_line.packages;
                totals.subtotal += receipt_line.subtotal;
                receipt_line
            })
            .collect();

        let total_recovered = (totals.subtotal + extras.arpillas_importe + extras.excedentes_importe)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        Self {
            order_id: order.order.id,
            worker: order.order.username.clone().unwrap_or_else(|| "N/A".into()),
            route: order.order.route_name.clone().unwrap_or_else(|| "N/A".into()),
            delivery_date: order.order.delivery_date,
            accounting_date,
            lines,
            totals,
            extras: extras.clone(),
            total_recovered,
        }
    }
}

fn push_row<const N: usize>(table: &mut elements::TableLayout, cells: [String; N], bold: bool) -> Result<(), AppError> {
    let cell_style = if bold { style::Style::new().bold().with_font_size(8) } else { style::Style::new().with_font_size(7) };
    let mut row = table.row();
    for cell in cells {
        row = row.element(elements::Paragraph::new(cell).aligned(Alignment::Center).styled(cell_style));
    }
    row.push().map_err(|e| AppError::PdfError(e.to_string()))
}

fn header(data: &ReceiptData) -> Result<elements::LinearLayout, AppError> {
    let mut layout = elements::LinearLayout::vertical();
    layout.push(
        elements::Paragraph::new(ORGANIZATION)
            .aligned(Alignment::Center)
            .styled(style::Style::new().bold().with_font_size(10)),
    );
    layout.push(
        elements::Paragraph::new(RECEIPT_TITLE)
            .aligned(Alignment::Center)
            .styled(style::Style::new().bold().with_font_size(12)),
    );
    layout.push(elements::Break::new(0.5));

    let mut info = elements::TableLayout::new(vec![1, 1, 1]);
    push_row(
        &mut info,
        [
            format!("TS: {}", data.worker),
            format!("RUTA: {}", data.route),
            format!("FECHA DE ENTREGA: {}", data.delivery_date.format("%Y-%m-%d")),
        ],
        false,
    )?;
    layout.push(info);
    layout.push(elements::Break::new(0.5));
    Ok(layout)
}

fn community_table(data: &ReceiptData) -> Result<elements::TableLayout, AppError> {
    let mut table = elements::TableLayout::new(vec![4, 2, 2, 2, 2, 2, 1, 2]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    push_row(
        &mut table,
        [
            "COMUNIDAD".into(),
            "CUOTA".into(),
            "CON CUOTA".into(),
            "MEDIO COSTO".into(),
            "SIN COSTO".into(),
            "APADRINADAS".into(),
            "TOTAL".into(),
            "TOTAL $".into(),
        ],
        true,
    )?;

    for line in &data.lines {
        push_row(
            &mut table,
            [
                line.community.clone(),
                money(line.cost),
                line.full.to_string(),
                line.half.to_string(),
                line.no_cost.to_string(),
                line.sponsored.to_string(),
                line.packages.to_string(),
                money(line.subtotal),
            ],
            false,
        )?;
    }

    let totals = &data.totals;
    push_row(
        &mut table,
        [
            "TOTAL:".into(),
            String::new(),
            totals.full.to_string(),
            totals.half.to_string(),
            totals.no_cost.to_string(),
            totals.sponsored.to_string(),
            totals.packages.to_string(),
            money(totals.subtotal),
        ],
        true,
    )?;
    Ok(table)
}

fn extras_table(data: &ReceiptData) -> Result<elements::TableLayout, AppError> {
    let mut table = elements::TableLayout::new(vec![3, 1, 1]);
    table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

    push_row(&mut table, ["EXTRAS".into(), String::new(), String::new()], true)?;
    push_row(&mut table, ["CONCEPTO".into(), "DETALLE".into(), "IMPORTE".into()], true)?;
    push_row(
        &mut table,
        [
            "ARPILLAS".into(),
            data.extras.arpillas_cantidad.to_string(),
            money(data.extras.arpillas_importe),
        ],
        false,
    )?;
    push_row(
        &mut table,
        [
            "EXCEDENTES".into(),
            data.extras.excedentes.to_string(),
            money(data.extras.excedentes_importe),
        ],
        false,
    )?;
    Ok(table)
}

fn summary(data: &ReceiptData) -> Result<elements::LinearLayout, AppError> {
    let mut layout = elements::LinearLayout::vertical();

    let mut per_community = elements::TableLayout::new(vec![3, 1]);
    per_community.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
    push_row(&mut per_community, ["COMUNIDAD".into(), "TOTAL DESPENSAS".into()], true)?;
    for line in &data.lines {
        push_row(&mut per_community, [line.community.clone(), line.packages.to_string()], false)?;
    }
    push_row(
        &mut per_community,
        ["TOTAL DE DESPENSAS".into(), data.totals.packages.to_string()],
        true,
    )?;
    layout.push(per_community);
    layout.push(elements::Break::new(1));

    let mut info = elements::TableLayout::new(vec![1, 1]);
    push_row(
        &mut info,
        ["Fecha Entrega Ruta:".into(), data.delivery_date.format("%d/%m/%Y").to_string()],
        false,
    )?;
    push_row(
        &mut info,
        ["Fecha Contabilidad:".into(), data.accounting_date.format("%d/%m/%Y").to_string()],
        false,
    )?;
    push_row(&mut info, ["Ruta:".into(), data.route.clone()], false)?;
    push_row(&mut info, ["Trabajador Social:".into(), data.worker.clone()], false)?;
    layout.push(info);

    Ok(layout)
}

#[derive(Clone)]
pub struct DocumentService {
    font_dir: String,
    font_name: String,
}

impl DocumentService {
    pub fn new(font_dir: String, font_name: String) -> Self {
        Self { font_dir, font_name }
    }

    /// Recibo em duas vias (uma para a comunidade, outra para o banco) e o resumo da ruta.
    pub fn render_receipt(&self, data: &ReceiptData) -> Result<Vec<u8>, AppError> {
        // Carrega a fonte da pasta configurada
        let font_family = genpdf::fonts::from_files(&self.font_dir, &self.font_name, None).map_err(|e| {
            AppError::PdfError(format!("Fonte '{}' não encontrada em {}: {}", self.font_name, self.font_dir, e))
        })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Cobranza pedido #{}", data.order_id));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        for _ in 0..2 {
            doc.push(header(data)?);
            doc.push(community_table(data)?);
            doc.push(elements::Break::new(1));
            doc.push(extras_table(data)?);
            doc.push(elements::Break::new(0.5));
            doc.push(
                elements::Paragraph::new(format!("TOTAL RECUPERACIÓN POR RUTA: {}", money(data.total_recovered)))
                    .aligned(Alignment::Center)
                    .styled(style::Style::new().bold().with_font_size(10)),
            );
            doc.push(elements::Break::new(1));
        }

        doc.push(elements::PageBreak::new());
        doc.push(summary(data)?);

        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| AppError::PdfError(e.to_string()))?;

        if buffer.is_empty() {
            return Err(AppError::PdfError("O PDF gerado está vazio".into()));
        }
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::{OrderLine, OrderStatus, OrderSummary};
    use chrono::Utc;

    fn order() -> OrderDetail {
        let line = |community_id: i32, name: &str, full: i32, half: i32, no_cost: i32, sponsored: i32, cost: Decimal| OrderLine {
            order_id: 9,
            community_id,
            full_cost: full,
            half_cost: half,
            no_cost,
            sponsored,
            comite: 0,
            arpillas: false,
            notes: String::new(),
            community_name: name.into(),
            leader_name: None,
            contact: None,
            package_cost: cost,
            municipality_name: None,
        };
        let summary = OrderSummary {
            id: 9,
            user_id: Some(3),
            route_id: Some(2),
            delivery_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            status: OrderStatus::Creado,
            returns: 0,
            arrival_time: None,
            collection_generated: false,
            collection_url: None,
            username: Some("ana".into()),
            route_name: None,
            created_at: Utc::now(),
        };
        OrderDetail::new(
            summary,
            vec![
                line(1, "El Salto", 10, 2, 1, 1, Decimal::new(170, 0)),
                line(2, "La Loma", 0, 3, 4, 0, Decimal::new(15050, 2)),
            ],
        )
    }

    #[test]
    fn money_always_has_two_decimals() {
        assert_eq!(money(Decimal::new(1705, 1)), "$170.50");
        assert_eq!(money(Decimal::new(5, 3)), "$0.01");
        assert_eq!(money(Decimal::ZERO), "$0.00");
    }

    #[test]
    fn receipt_sums_tiers_and_subtotals() {
        let extras = GenerateCollectionPayload::default();
        let data = ReceiptData::build(&order(), &extras, NaiveDate::from_ymd_opt(2025, 3, 20).unwrap());

        assert_eq!(data.lines[0].packages, 14);
        assert_eq!(data.lines[0].subtotal, Decimal::new(1870, 0));
        // 3 * 75.25
        assert_eq!(data.lines[1].subtotal, Decimal::new(22575, 2));
        assert_eq!(data.totals.full, 10);
        assert_eq!(data.totals.half, 5);
        assert_eq!(data.totals.no_cost, 5);
        assert_eq!(data.totals.packages, 21);
        assert_eq!(data.total_recovered, Decimal::new(209575, 2));
    }

    #[test]
    fn extras_are_added_to_total_recovered() {
        let extras = GenerateCollectionPayload {
            arpillas_cantidad: 4,
            arpillas_importe: Decimal::new(100, 0),
            excedentes: 2,
            excedentes_importe: Decimal::new(5050, 2),
        };
        let data = ReceiptData::build(&order(), &extras, NaiveDate::from_ymd_opt(2025, 3, 20).unwrap());

        assert_eq!(data.total_recovered, Decimal::new(224625, 2));
        assert_eq!(data.route, "N/A");
        assert_eq!(data.worker, "ana");
    }

    #[test]
    fn missing_font_is_reported_as_pdf_error() {
        let service = DocumentService::new("/nao/existe".into(), "Roboto".into());
        let data = ReceiptData::build(
            &order(),
            &GenerateCollectionPayload::default(),
            NaiveDate::from_ymd_opt(2025, 3, 20).unwrap(),
        );

        assert!(matches!(service.render_receipt(&data), Err(AppError::PdfError(_))));
    }
}
