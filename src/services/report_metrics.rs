// src/services/report_metrics.rs
//
// Agregações dos relatórios. Tudo aqui é puro: recebe os pedidos já
// carregados e reagrupados e devolve as estruturas de saída.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{
    community::DEFAULT_PACKAGE_COST,
    delivery_route::DeliveryRoute,
    order::OrderStatus,
    report::{
        Averages, BarChart, CalendarEntry, CommunityMetrics, CommunityReport, ComparisonChart,
        EconomicGroup, EconomicReport, EconomicSummary, EconomicTotals, LineSnapshot, MonthTiers,
        MonthTotal, MunicipalityVolume, NamedAverage, NamedTotal, OrderSnapshot, PackageDetailRow,
        PackageReport, PieChart, RecentOrder, ReportRow, ReturnsTrend, RouteMetrics, RouteReport,
        SponsoredGlobals, SponsoredMonth, SponsoredOrder, SponsoredReport, SummaryReport,
        TierCounts, TierSummary, WorkerActivity, WorkerCharts, WorkerMetrics, WorkerReport,
    },
};

const TOP_N: usize = 5;
const RECENT_PER_WORKER: usize = 3;

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// Divisão por zero vale 0
pub fn ratio(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub fn percentage(part: i64, whole: i64) -> f64 {
    round1(ratio(part, whole) * 100.0)
}

fn cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ---
// Reagrupamento das linhas planas
// ---

/// Junta as linhas do JOIN em pedidos, preservando a ordem de chegada.
pub fn group_rows(rows: Vec<ReportRow>) -> Vec<OrderSnapshot> {
    let mut orders: Vec<OrderSnapshot> = Vec::new();
    let mut index: HashMap<i32, usize> = HashMap::new();

    for row in rows {
        let line = row.community_id.map(|community_id| LineSnapshot {
            community_id,
            community_name: row.community_name.unwrap_or_default(),
            municipality_id: row.municipality_id,
            municipality_name: row.municipality_name,
            package_cost: row.package_cost.unwrap_or(DEFAULT_PACKAGE_COST),
            tiers: TierCounts {
                costo: i64::from(row.full_cost.unwrap_or(0)),
                medio_costo: i64::from(row.half_cost.unwrap_or(0)),
                sin_costo: i64::from(row.no_cost.unwrap_or(0)),
                apadrinadas: i64::from(row.sponsored.unwrap_or(0)),
            },
        });

        let position = match index.get(&row.order_id) {
            Some(&position) => position,
            None => {
                orders.push(OrderSnapshot {
                    id: row.order_id,
                    delivery_date: row.delivery_date,
                    status: row.status,
                    returns: i64::from(row.returns),
                    user_id: row.user_id,
                    username: row.username,
                    route_id: row.route_id,
                    route_name: row.route_name,
                    lines: Vec::new(),
                });
                index.insert(row.order_id, orders.len() - 1);
                orders.len() - 1
            }
        };

        if let Some(line) = line {
            orders[position].lines.push(line);
        }
    }
    orders
}

/// Restringe as linhas por comunidade/municipio; pedidos sem linha restante saem.
pub fn filter_lines(
    orders: Vec<OrderSnapshot>,
    community_id: Option<i32>,
    municipality_id: Option<i32>,
) -> Vec<OrderSnapshot> {
    if community_id.is_none() && municipality_id.is_none() {
        return orders;
    }
    orders
        .into_iter()
        .filter_map(|mut order| {
            order.lines.retain(|line| {
                community_id.is_none_or(|id| line.community_id == id)
                    && municipality_id.is_none_or(|id| line.municipality_id == Some(id))
            });
            (!order.lines.is_empty()).then_some(order)
        })
        .collect()
}

// ---
// Rankings
// ---

fn tally(map: &mut HashMap<Option<i32>, NamedTotal>, id: Option<i32>, name: impl FnOnce() -> String, amount: i64) {
    map.entry(id)
        .or_insert_with(|| NamedTotal { id, nombre: name(), total: 0 })
        .total += amount;
}

fn sort_desc(items: &mut [NamedTotal]) {
    items.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.nombre.cmp(&b.nombre)));
}

fn ranked(map: HashMap<Option<i32>, NamedTotal>) -> Vec<NamedTotal> {
    let mut items: Vec<NamedTotal> = map.into_values().collect();
    sort_desc(&mut items);
    items
}

fn top(map: HashMap<Option<i32>, NamedTotal>, n: usize) -> Vec<NamedTotal> {
    let mut items = ranked(map);
    items.truncate(n);
    items
}

fn top_pairs(map: HashMap<Option<i32>, NamedTotal>, n: usize) -> Vec<(String, i64)> {
    top(map, n).into_iter().map(|item| (item.nombre, item.total)).collect()
}

fn newest_first(orders: &mut [&OrderSnapshot]) {
    orders.sort_by(|a, b| b.delivery_date.cmp(&a.delivery_date).then_with(|| b.id.cmp(&a.id)));
}

fn monthly_tiers(orders: &[OrderSnapshot]) -> Vec<MonthTiers> {
    let mut months: BTreeMap<String, TierCounts> = BTreeMap::new();
    for order in orders {
        *months.entry(order.month_key()).or_default() += order.tiers();
    }
    months
        .into_iter()
        .map(|(mes, tiers)| MonthTiers { mes, tiers, total: tiers.total() })
        .collect()
}

// ---
// Relatórios
// ---

pub fn calendar<'a>(orders: impl IntoIterator<Item = &'a OrderSnapshot>) -> Vec<CalendarEntry> {
    let mut entries: Vec<CalendarEntry> = orders
        .into_iter()
        .map(|order| CalendarEntry {
            id_pedido: order.id,
            fecha: order.delivery_date,
            estado: order.status,
            ruta: order.route_label(),
            total_despensas: order.packages(),
        })
        .collect();
    entries.sort_by(|a, b| a.fecha.cmp(&b.fecha).then_with(|| a.id_pedido.cmp(&b.id_pedido)));
    entries
}

/// Painel inicial. `orders` é o ano corrente; o calendário fica com o mês de `today`.
pub fn summary(orders: &[OrderSnapshot], today: NaiveDate) -> SummaryReport {
    let mut tipos = TierCounts::default();
    let mut workers = HashMap::new();
    let mut communities = HashMap::new();
    let mut routes = HashMap::new();
    let mut returns = HashMap::new();

    for order in orders {
        let tiers = order.tiers();
        tipos += tiers;

        if order.user_id.is_some() {
            tally(&mut workers, order.user_id, || order.worker_label(), tiers.total());
        }
        if order.route_id.is_some() {
            tally(&mut routes, order.route_id, || order.route_label(), tiers.total());
            tally(&mut returns, order.route_id, || order.route_label(), order.returns);
        }
        // Apadrinadas não entram no ranking de comunidades
        for line in &order.lines {
            tally(
                &mut communities,
                Some(line.community_id),
                || line.community_name.clone(),
                line.tiers.unsponsored(),
            );
        }
    }

    let this_month = (today.year(), today.month());
    SummaryReport {
        despensas_por_mes: monthly_tiers(orders),
        tipos_despensas: tipos,
        top_trabajadores: top(workers, TOP_N),
        top_comunidades: top_pairs(communities, TOP_N),
        top_rutas: top_pairs(routes, TOP_N),
        rutas_devoluciones: top_pairs(returns, TOP_N),
        calendario: calendar(
            orders
                .iter()
                .filter(|o| (o.delivery_date.year(), o.delivery_date.month()) == this_month),
        ),
    }
}

/// Métricas por ruta; rotas sem pedidos aparecem zeradas.
pub fn routes(orders: &[OrderSnapshot], all_routes: &[DeliveryRoute]) -> RouteReport {
    let mut metrics: Vec<RouteMetrics> = all_routes
        .iter()
        .map(|route| RouteMetrics {
            id_ruta: route.id,
            nombre: route.name.clone(),
            pedidos: 0,
            despensas: 0,
            devoluciones: 0,
            detalle: TierCounts::default(),
        })
        .collect();
    let index: HashMap<i32, usize> = metrics.iter().enumerate().map(|(i, m)| (m.id_ruta, i)).collect();

    for order in orders {
        let Some(&i) = order.route_id.and_then(|id| index.get(&id)) else {
            continue;
        };
        let tiers = order.tiers();
        let route = &mut metrics[i];
        route.pedidos += 1;
        route.despensas += tiers.total();
        route.devoluciones += order.returns;
        route.detalle += tiers;
    }

    let ranking = |value: fn(&RouteMetrics) -> i64| {
        let mut items: Vec<NamedTotal> = metrics
            .iter()
            .map(|m| NamedTotal { id: Some(m.id_ruta), nombre: m.nombre.clone(), total: value(m) })
            .collect();
        sort_desc(&mut items);
        items
    };
    let ranking_pedidos = ranking(|m| m.pedidos);
    let ranking_despensas = ranking(|m| m.despensas);

    let grafica_comparativa = ComparisonChart {
        labels: metrics.iter().map(|m| m.nombre.clone()).collect(),
        pedidos: metrics.iter().map(|m| m.pedidos).collect(),
        despensas: metrics.iter().map(|m| m.despensas).collect(),
        devoluciones: metrics.iter().map(|m| m.devoluciones).collect(),
    };

    RouteReport { tabla_metricas: metrics, ranking_pedidos, ranking_despensas, grafica_comparativa }
}

struct WorkerTally<'a> {
    username: String,
    pedidos: i64,
    despensas: i64,
    devoluciones: i64,
    pendientes: i64,
    last_activity: Option<NaiveDate>,
    orders: Vec<&'a OrderSnapshot>,
}

/// Desempenho por trabalhador social com pedidos na janela.
pub fn workers(orders: &[OrderSnapshot]) -> WorkerReport {
    let mut tallies: BTreeMap<i32, WorkerTally> = BTreeMap::new();

    for order in orders {
        let Some(user_id) = order.user_id else {
            continue;
        };
        let entry = tallies.entry(user_id).or_insert_with(|| WorkerTally {
            username: order.worker_label(),
            pedidos: 0,
            despensas: 0,
            devoluciones: 0,
            pendientes: 0,
            last_activity: None,
            orders: Vec::new(),
        });
        entry.pedidos += 1;
        entry.despensas += order.packages();
        entry.devoluciones += order.returns;
        if order.status == OrderStatus::Pendiente {
            entry.pendientes += 1;
        }
        entry.last_activity = entry.last_activity.max(Some(order.delivery_date));
        entry.orders.push(order);
    }

    let total_pedidos: i64 = tallies.values().map(|t| t.pedidos).sum();
    let total_despensas: i64 = tallies.values().map(|t| t.despensas).sum();

    let mut trabajadores = Vec::with_capacity(tallies.len());
    let mut actividad_reciente = Vec::with_capacity(tallies.len());

    for (user_id, mut tally) in tallies {
        newest_first(&mut tally.orders);
        actividad_reciente.push(WorkerActivity {
            id_usuario: user_id,
            username: tally.username.clone(),
            pedidos: tally
                .orders
                .iter()
                .take(RECENT_PER_WORKER)
                .map(|o| RecentOrder {
                    id_pedido: o.id,
                    fecha_entrega: o.delivery_date,
                    estado: o.status,
                    ruta: o.route_label(),
                    despensas: o.packages(),
                })
                .collect(),
        });

        trabajadores.push(WorkerMetrics {
            id_usuario: user_id,
            username: tally.username,
            pedidos: tally.pedidos,
            despensas: tally.despensas,
            devoluciones: tally.devoluciones,
            pedidos_pendientes: tally.pendientes,
            promedio_despensas: round1(ratio(tally.despensas, tally.pedidos)),
            porcentaje_devoluciones: percentage(tally.devoluciones, tally.despensas),
            porcentaje_contribucion: percentage(tally.pedidos, total_pedidos),
            ultima_actividad: tally.last_activity,
        });
    }

    trabajadores.sort_by(|a, b| b.despensas.cmp(&a.despensas).then_with(|| a.username.cmp(&b.username)));

    let graficas = WorkerCharts {
        barras: BarChart {
            labels: trabajadores.iter().map(|t| t.username.clone()).collect(),
            pedidos: trabajadores.iter().map(|t| t.pedidos).collect(),
            despensas: trabajadores.iter().map(|t| t.despensas).collect(),
        },
        pastel: PieChart {
            labels: trabajadores.iter().map(|t| t.username.clone()).collect(),
            valores: trabajadores.iter().map(|t| percentage(t.despensas, total_despensas)).collect(),
        },
    };

    WorkerReport { trabajadores, graficas, actividad_reciente }
}

/// Relatório de despensas. `orders` já vem filtrado por comunidade/municipio.
pub fn packages(orders: &[OrderSnapshot], limit: usize) -> PackageReport {
    let mut tipos = TierCounts::default();
    let mut returns_by_month: BTreeMap<String, i64> = BTreeMap::new();
    let mut returns_by_route = HashMap::new();
    let mut route_totals: HashMap<i32, (String, i64, i64)> = HashMap::new();
    let mut community_totals: HashMap<i32, (String, i64, HashSet<i32>)> = HashMap::new();

    for order in orders {
        let tiers = order.tiers();
        tipos += tiers;

        *returns_by_month.entry(order.month_key()).or_default() += order.returns;
        tally(&mut returns_by_route, order.route_id, || order.route_label(), order.returns);

        if let Some(route_id) = order.route_id {
            let entry = route_totals.entry(route_id).or_insert_with(|| (order.route_label(), 0, 0));
            entry.1 += tiers.total();
            entry.2 += 1;
        }
        for line in &order.lines {
            let entry = community_totals
                .entry(line.community_id)
                .or_insert_with(|| (line.community_name.clone(), 0, HashSet::new()));
            entry.1 += line.tiers.total();
            entry.2.insert(order.id);
        }
    }

    let mut por_ruta: Vec<NamedAverage> = route_totals
        .into_iter()
        .map(|(id, (nombre, despensas, pedidos))| NamedAverage {
            id: Some(id),
            nombre,
            promedio: round1(ratio(despensas, pedidos)),
        })
        .collect();
    por_ruta.sort_by(|a, b| a.nombre.cmp(&b.nombre));

    let mut por_comunidad: Vec<NamedAverage> = community_totals
        .into_iter()
        .map(|(id, (nombre, despensas, pedidos))| NamedAverage {
            id: Some(id),
            nombre,
            promedio: round1(ratio(despensas, pedidos.len() as i64)),
        })
        .collect();
    por_comunidad.sort_by(|a, b| a.nombre.cmp(&b.nombre));

    let mut newest: Vec<&OrderSnapshot> = orders.iter().collect();
    newest_first(&mut newest);
    let tabla_detallada = newest
        .into_iter()
        .take(limit)
        .map(|order| {
            let tiers = order.tiers();
            PackageDetailRow {
                id_pedido: order.id,
                fecha_entrega: order.delivery_date,
                estado: order.status,
                ruta: order.route_label(),
                trabajador: order.worker_label(),
                comunidades: order
                    .lines
                    .iter()
                    .map(|l| l.community_name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                tiers,
                total: tiers.total(),
                devoluciones: order.returns,
            }
        })
        .collect();

    PackageReport {
        evolucion_mensual: monthly_tiers(orders),
        resumen_tipos: TierSummary { tiers: tipos, total: tipos.total() },
        tendencia_devoluciones: ReturnsTrend {
            mensual: returns_by_month.into_iter().map(|(mes, total)| MonthTotal { mes, total }).collect(),
            por_ruta: ranked(returns_by_route),
        },
        promedios: Averages {
            global: round1(ratio(tipos.total(), orders.len() as i64)),
            por_ruta,
            por_comunidad,
        },
        tabla_detallada,
    }
}

/// Relatório por comunidade. `history` (todas as datas) alimenta a evolução mensual.
pub fn communities(orders: &[OrderSnapshot], history: Option<&[OrderSnapshot]>) -> CommunityReport {
    struct CommunityTally {
        nombre: String,
        municipality_id: Option<i32>,
        municipio: Option<String>,
        orders: HashSet<i32>,
        tiers: TierCounts,
    }

    let mut tallies: HashMap<i32, CommunityTally> = HashMap::new();
    for order in orders {
        for line in &order.lines {
            let entry = tallies.entry(line.community_id).or_insert_with(|| CommunityTally {
                nombre: line.community_name.clone(),
                municipality_id: line.municipality_id,
                municipio: line.municipality_name.clone(),
                orders: HashSet::new(),
                tiers: TierCounts::default(),
            });
            entry.orders.insert(order.id);
            entry.tiers += line.tiers;
        }
    }

    let mut volumes: HashMap<Option<i32>, MunicipalityVolume> = HashMap::new();
    let mut tabla_detallada: Vec<CommunityMetrics> = Vec::with_capacity(tallies.len());
    for (id, tally) in tallies {
        let volume = volumes.entry(tally.municipality_id).or_insert_with(|| MunicipalityVolume {
            id_municipio: tally.municipality_id,
            municipio: tally.municipio.clone().unwrap_or_else(|| "Sin municipio".to_string()),
            comunidades: 0,
            despensas: 0,
        });
        volume.comunidades += 1;
        volume.despensas += tally.tiers.total();

        tabla_detallada.push(CommunityMetrics {
            id_comunidad: id,
            nombre: tally.nombre,
            municipio: tally.municipio,
            pedidos: tally.orders.len() as i64,
            despensas: tally.tiers.total(),
            detalle: tally.tiers,
        });
    }
    tabla_detallada.sort_by(|a, b| b.despensas.cmp(&a.despensas).then_with(|| a.nombre.cmp(&b.nombre)));

    let ranking = |value: fn(&CommunityMetrics) -> i64| {
        let mut items: Vec<NamedTotal> = tabla_detallada
            .iter()
            .map(|c| NamedTotal { id: Some(c.id_comunidad), nombre: c.nombre.clone(), total: value(c) })
            .collect();
        sort_desc(&mut items);
        items.truncate(TOP_N);
        items
    };
    let top_pedidos = ranking(|c| c.pedidos);
    let top_despensas = ranking(|c| c.despensas);

    let mut mapa_volumen: Vec<MunicipalityVolume> = volumes.into_values().collect();
    mapa_volumen.sort_by(|a, b| b.despensas.cmp(&a.despensas).then_with(|| a.municipio.cmp(&b.municipio)));

    CommunityReport {
        top_pedidos,
        top_despensas,
        mapa_volumen,
        evolucion: history.map(monthly_tiers).unwrap_or_default(),
        tabla_detallada,
    }
}

/// Apadrinadas: mensal e métricas do ano em `year_orders`, rankings sobre `all_orders`.
pub fn sponsored(year_orders: &[OrderSnapshot], all_orders: &[OrderSnapshot], limit: usize) -> SponsoredReport {
    let mensual = monthly_tiers(year_orders)
        .into_iter()
        .map(|month| SponsoredMonth {
            porcentaje: percentage(month.tiers.apadrinadas, month.total),
            apadrinadas: month.tiers.apadrinadas,
            total: month.total,
            mes: month.mes,
        })
        .collect();

    let mut year_tiers = TierCounts::default();
    let mut orders_with_sponsored = 0;
    for order in year_orders {
        let tiers = order.tiers();
        year_tiers += tiers;
        if tiers.apadrinadas > 0 {
            orders_with_sponsored += 1;
        }
    }

    let mut by_worker = HashMap::new();
    let mut by_community = HashMap::new();
    let mut latest: Vec<&OrderSnapshot> = Vec::new();
    for order in all_orders {
        let sponsored = order.tiers().apadrinadas;
        if sponsored == 0 {
            continue;
        }
        if order.user_id.is_some() {
            tally(&mut by_worker, order.user_id, || order.worker_label(), sponsored);
        }
        for line in order.lines.iter().filter(|l| l.tiers.apadrinadas > 0) {
            tally(
                &mut by_community,
                Some(line.community_id),
                || line.community_name.clone(),
                line.tiers.apadrinadas,
            );
        }
        latest.push(order);
    }
    newest_first(&mut latest);

    SponsoredReport {
        mensual,
        metricas_globales: SponsoredGlobals {
            total_apadrinadas: year_tiers.apadrinadas,
            total_despensas: year_tiers.total(),
            porcentaje: percentage(year_tiers.apadrinadas, year_tiers.total()),
            pedidos_con_apadrinadas: orders_with_sponsored,
            promedio_por_pedido: round1(ratio(year_tiers.apadrinadas, orders_with_sponsored)),
        },
        top_ts: top(by_worker, TOP_N),
        top_comunidades: top(by_community, TOP_N),
        ultimos_pedidos: latest
            .into_iter()
            .take(limit)
            .map(|order| SponsoredOrder {
                id_pedido: order.id,
                fecha_entrega: order.delivery_date,
                ruta: order.route_label(),
                trabajador: order.worker_label(),
                apadrinadas: order.tiers().apadrinadas,
            })
            .collect(),
    }
}

/// Valores de uma linha: o que foi recuperado (cuota completa e meia) e o que foi subsidiado.
pub fn line_economics(cost: Decimal, tiers: &TierCounts) -> EconomicTotals {
    let ingresos_costo = cost * Decimal::from(tiers.costo);
    let ingresos_medio_costo = cost / Decimal::TWO * Decimal::from(tiers.medio_costo);
    let subsidio_sin_costo = cost * Decimal::from(tiers.sin_costo);
    let subsidio_apadrinadas = cost * Decimal::from(tiers.apadrinadas);

    let recuperado = ingresos_costo + ingresos_medio_costo;
    let subsidiado = subsidio_sin_costo + subsidio_apadrinadas;

    EconomicTotals {
        ingresos_costo,
        ingresos_medio_costo,
        subsidio_sin_costo,
        subsidio_apadrinadas,
        recuperado,
        subsidiado,
        costo_total: recuperado + subsidiado,
        balance: recuperado - subsidiado,
    }
}

fn rounded(totals: EconomicTotals) -> EconomicTotals {
    EconomicTotals {
        ingresos_costo: cents(totals.ingresos_costo),
        ingresos_medio_costo: cents(totals.ingresos_medio_costo),
        subsidio_sin_costo: cents(totals.subsidio_sin_costo),
        subsidio_apadrinadas: cents(totals.subsidio_apadrinadas),
        recuperado: cents(totals.recuperado),
        subsidiado: cents(totals.subsidiado),
        costo_total: cents(totals.costo_total),
        balance: cents(totals.balance),
    }
}

fn by_balance(groups: HashMap<Option<i32>, EconomicGroup>) -> Vec<EconomicGroup> {
    let mut items: Vec<EconomicGroup> = groups
        .into_values()
        .map(|mut g| {
            g.totales = rounded(g.totales);
            g
        })
        .collect();
    items.sort_by(|a, b| {
        b.totales
            .balance
            .cmp(&a.totales.balance)
            .then_with(|| a.nombre.cmp(&b.nombre))
    });
    items
}

fn add_group(
    map: &mut HashMap<Option<i32>, EconomicGroup>,
    id: Option<i32>,
    init: impl FnOnce() -> (String, Option<String>),
    totals: EconomicTotals,
) {
    map.entry(id)
        .or_insert_with(|| {
            let (nombre, municipio) = init();
            EconomicGroup { id, nombre, municipio, totales: EconomicTotals::default() }
        })
        .totales += totals;
}

/// Relatório econômico. `orders` já vem filtrado por comunidade/municipio.
pub fn economics(orders: &[OrderSnapshot]) -> EconomicReport {
    let mut global = EconomicTotals::default();
    let mut despensas = TierCounts::default();
    let mut pedidos = 0;
    let mut per_month: BTreeMap<String, EconomicTotals> = BTreeMap::new();
    let mut per_community = HashMap::new();
    let mut per_municipality = HashMap::new();
    let mut per_route = HashMap::new();

    for order in orders.iter().filter(|o| !o.lines.is_empty()) {
        pedidos += 1;
        for line in &order.lines {
            let totals = line_economics(line.package_cost, &line.tiers);
            global += totals;
            despensas += line.tiers;
            *per_month.entry(order.month_key()).or_default() += totals;

            let municipality = || line.municipality_name.clone().unwrap_or_else(|| "Sin municipio".to_string());
            add_group(
                &mut per_community,
                Some(line.community_id),
                || (line.community_name.clone(), Some(municipality())),
                totals,
            );
            add_group(&mut per_municipality, line.municipality_id, || (municipality(), None), totals);
            add_group(&mut per_route, order.route_id, || (order.route_label(), None), totals);
        }
    }

    EconomicReport {
        resumen_global: EconomicSummary { totales: rounded(global), pedidos, despensas },
        por_mes: per_month
            .into_iter()
            .map(|(mes, totals)| EconomicGroup { id: None, nombre: mes, municipio: None, totales: rounded(totals) })
            .collect(),
        por_comunidad: by_balance(per_community),
        por_municipio: by_balance(per_municipality),
        por_ruta: by_balance(per_route),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[allow(clippy::too_many_arguments)]
    fn row(
        order_id: i32,
        day: NaiveDate,
        user: Option<(i32, &str)>,
        route: Option<(i32, &str)>,
        community: Option<(i32, &str, i32)>,
        tiers: [i32; 4],
        returns: i32,
        status: OrderStatus,
    ) -> ReportRow {
        ReportRow {
            order_id,
            delivery_date: day,
            status,
            returns,
            user_id: user.map(|u| u.0),
            username: user.map(|u| u.1.to_string()),
            route_id: route.map(|r| r.0),
            route_name: route.map(|r| r.1.to_string()),
            community_id: community.map(|c| c.0),
            community_name: community.map(|c| c.1.to_string()),
            municipality_id: community.map(|c| c.2),
            municipality_name: community.map(|c| format!("Municipio {}", c.2)),
            package_cost: community.map(|_| Decimal::new(170, 0)),
            full_cost: community.map(|_| tiers[0]),
            half_cost: community.map(|_| tiers[1]),
            no_cost: community.map(|_| tiers[2]),
            sponsored: community.map(|_| tiers[3]),
        }
    }

    // Três pedidos: dois da Ana (Ruta Norte) e um do Luis (Ruta Sur)
    fn sample() -> Vec<OrderSnapshot> {
        let ana = Some((1, "ana"));
        let luis = Some((2, "luis"));
        let norte = Some((10, "Ruta Norte"));
        let sur = Some((20, "Ruta Sur"));
        group_rows(vec![
            row(1, date(2025, 1, 10), ana, norte, Some((100, "El Salto", 7)), [10, 4, 2, 1], 1, OrderStatus::Finalizado),
            row(1, date(2025, 1, 10), ana, norte, Some((101, "La Loma", 7)), [5, 0, 0, 3], 1, OrderStatus::Finalizado),
            row(2, date(2025, 2, 3), luis, sur, Some((100, "El Salto", 7)), [2, 2, 2, 0], 4, OrderStatus::Pendiente),
            row(3, date(2025, 2, 20), ana, norte, Some((102, "Capilla", 8)), [0, 0, 6, 2], 0, OrderStatus::Creado),
        ])
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(2.25, 2.3)]
    #[case(33.333, 33.3)]
    #[case(66.66, 66.7)]
    fn rounds_to_one_decimal(#[case] value: f64, #[case] expected: f64) {
        assert_eq!(round1(value), expected);
    }

    #[test]
    fn ratios_are_zero_safe() {
        assert_eq!(ratio(5, 0), 0.0);
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(0, 0), 0.0);
    }

    #[test]
    fn groups_rows_into_orders_in_arrival_order() {
        let orders = sample();

        assert_eq!(orders.len(), 3);
        assert_eq!(orders[0].id, 1);
        assert_eq!(orders[0].lines.len(), 2);
        assert_eq!(orders[0].packages(), 25);
        assert_eq!(orders[0].returns, 1);
        assert_eq!(orders[2].month_key(), "2025-02");
    }

    #[test]
    fn order_without_lines_is_kept_empty() {
        let orders = group_rows(vec![row(
            7,
            date(2025, 5, 1),
            None,
            None,
            None,
            [0; 4],
            0,
            OrderStatus::Creado,
        )]);

        assert_eq!(orders.len(), 1);
        assert!(orders[0].lines.is_empty());
        assert_eq!(orders[0].route_label(), "Sin ruta");
        assert_eq!(orders[0].worker_label(), "Sin asignar");
    }

    #[test]
    fn filtering_by_municipality_drops_orders_without_matches() {
        let filtered = filter_lines(sample(), None, Some(8));

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, 3);

        let by_community = filter_lines(sample(), Some(100), None);
        assert_eq!(by_community.len(), 2);
        assert!(by_community.iter().all(|o| o.lines.len() == 1));
    }

    #[test]
    fn summary_rankings_and_month_totals() {
        let report = summary(&sample(), date(2025, 2, 15));

        let months: Vec<(&str, i64)> =
            report.despensas_por_mes.iter().map(|m| (m.mes.as_str(), m.total)).collect();
        assert_eq!(months, vec![("2025-01", 25), ("2025-02", 14)]);
        assert_eq!(
            report.despensas_por_mes[1].tiers,
            TierCounts { costo: 2, medio_costo: 2, sin_costo: 8, apadrinadas: 2 }
        );
        assert_eq!(report.tipos_despensas.total(), 39);
        assert_eq!(report.top_trabajadores[0].nombre, "ana");
        assert_eq!(report.top_trabajadores[0].total, 33);
        // El Salto: 16 + 6 sem apadrinadas
        assert_eq!(report.top_comunidades[0], ("El Salto".to_string(), 22));
        assert_eq!(report.top_rutas[0], ("Ruta Norte".to_string(), 33));
        assert_eq!(report.rutas_devoluciones[0], ("Ruta Sur".to_string(), 4));
        assert_eq!(report.calendario.len(), 2);
        assert!(report.calendario.iter().all(|c| c.fecha.month() == 2));
    }

    #[test]
    fn summary_serializes_rankings_as_name_value_pairs() {
        let value = serde_json::to_value(summary(&sample(), date(2025, 2, 15))).unwrap();

        assert_eq!(value["topComunidades"][0], serde_json::json!(["El Salto", 22]));
        assert_eq!(value["rutasDevoluciones"][0], serde_json::json!(["Ruta Sur", 4]));
        assert_eq!(value["despensasPorMes"][0]["mes"], "2025-01");
        assert_eq!(value["despensasPorMes"][0]["costo"], 15);
        assert_eq!(value["despensasPorMes"][0]["apadrinadas"], 4);
    }

    #[test]
    fn route_report_includes_routes_without_orders() {
        let now = Utc::now();
        let route = |id: i32, name: &str| DeliveryRoute { id, name: name.into(), created_at: now, updated_at: now };
        let report = routes(&sample(), &[route(10, "Ruta Norte"), route(20, "Ruta Sur"), route(30, "Ruta Este")]);

        let norte = &report.tabla_metricas[0];
        assert_eq!((norte.pedidos, norte.despensas, norte.devoluciones), (2, 33, 1));
        assert_eq!(report.tabla_metricas[2].pedidos, 0);
        assert_eq!(report.ranking_despensas[0].nombre, "Ruta Norte");
        assert_eq!(report.ranking_pedidos.last().map(|r| r.total), Some(0));
        assert_eq!(report.grafica_comparativa.labels.len(), 3);
    }

    #[test]
    fn worker_metrics_and_percentages() {
        let report = workers(&sample());

        let ana = &report.trabajadores[0];
        assert_eq!(ana.username, "ana");
        assert_eq!((ana.pedidos, ana.despensas, ana.devoluciones), (2, 33, 1));
        assert_eq!(ana.promedio_despensas, 16.5);
        assert_eq!(ana.porcentaje_devoluciones, 3.0);
        assert_eq!(ana.porcentaje_contribucion, 66.7);
        assert_eq!(ana.ultima_actividad, Some(date(2025, 2, 20)));

        let luis = &report.trabajadores[1];
        assert_eq!(luis.pedidos_pendientes, 1);
        assert_eq!(luis.porcentaje_devoluciones, 66.7);

        let ana_recent = report.actividad_reciente.iter().find(|a| a.id_usuario == 1).unwrap();
        assert_eq!(ana_recent.pedidos[0].id_pedido, 3);
        assert_eq!(report.graficas.pastel.valores, vec![84.6, 15.4]);
    }

    #[test]
    fn package_report_averages_and_detail_limit() {
        let report = packages(&sample(), 2);

        assert_eq!(report.resumen_tipos.total, 39);
        assert_eq!(report.evolucion_mensual.len(), 2);
        assert_eq!(report.evolucion_mensual[1].tiers.sin_costo, 8);
        assert_eq!(report.promedios.global, 13.0);

        let salto = report.promedios.por_comunidad.iter().find(|c| c.nombre == "El Salto").unwrap();
        // (17 + 6) despensas em 2 pedidos
        assert_eq!(salto.promedio, 11.5);

        assert_eq!(report.tabla_detallada.len(), 2);
        assert_eq!(report.tabla_detallada[0].id_pedido, 3);
        assert_eq!(report.tendencia_devoluciones.por_ruta[0].nombre, "Ruta Sur");
    }

    #[test]
    fn community_report_counts_distinct_orders() {
        let orders = sample();
        let history = filter_lines(orders.clone(), Some(100), None);
        let report = communities(&orders, Some(history.as_slice()));

        let salto = &report.tabla_detallada[0];
        assert_eq!(salto.nombre, "El Salto");
        assert_eq!(salto.pedidos, 2);
        assert_eq!(salto.despensas, 23);
        assert_eq!(report.top_pedidos[0].nombre, "El Salto");
        assert_eq!(report.mapa_volumen[0].comunidades, 2);
        assert_eq!(report.evolucion.len(), 2);

        assert!(communities(&orders, None).evolucion.is_empty());
    }

    #[test]
    fn sponsored_report_excludes_zero_rankings() {
        let orders = sample();
        let report = sponsored(&orders, &orders, 10);

        assert_eq!(report.metricas_globales.total_apadrinadas, 6);
        assert_eq!(report.metricas_globales.pedidos_con_apadrinadas, 2);
        assert_eq!(report.metricas_globales.promedio_por_pedido, 3.0);
        assert_eq!(report.mensual[0].porcentaje, 16.0);
        assert_eq!(report.top_ts.len(), 1);
        assert_eq!(report.top_comunidades[0].nombre, "La Loma");
        assert_eq!(report.ultimos_pedidos[0].id_pedido, 3);
    }

    #[test]
    fn line_economics_splits_recovered_and_subsidized() {
        let tiers = TierCounts { costo: 10, medio_costo: 4, sin_costo: 2, apadrinadas: 1 };
        let totals = line_economics(Decimal::new(170, 0), &tiers);

        assert_eq!(totals.recuperado, Decimal::new(2040, 0));
        assert_eq!(totals.subsidiado, Decimal::new(510, 0));
        assert_eq!(totals.costo_total, Decimal::new(2550, 0));
        assert_eq!(totals.balance, Decimal::new(1530, 0));
    }

    #[test]
    fn economic_report_groups_by_balance() {
        let report = economics(&sample());

        assert_eq!(report.resumen_global.pedidos, 3);
        assert_eq!(report.por_mes.len(), 2);
        assert_eq!(report.por_mes[0].nombre, "2025-01");
        // Capilla só tem subsidio: fica por último
        assert_eq!(report.por_comunidad.last().map(|c| c.nombre.as_str()), Some("Capilla"));
        assert!(report.por_ruta[0].totales.balance >= report.por_ruta[1].totales.balance);
        // 17 completas + 6 medias + 16 subsidiadas a $170
        assert_eq!(report.resumen_global.totales.costo_total, Decimal::new(6120, 0));
    }
}
