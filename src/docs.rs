// src/docs.rs

use utoipa::openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::common;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::get_me,
        handlers::auth::forgot_password,
        handlers::auth::reset_password,

        // --- Usuarios ---
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::users::verify_user,
        handlers::users::pending_users,
        handlers::users::users_with_orders,

        // --- Catálogo ---
        handlers::delivery_routes::create_route,
        handlers::delivery_routes::list_routes,
        handlers::delivery_routes::get_route,
        handlers::delivery_routes::update_route,
        handlers::delivery_routes::delete_route,
        handlers::municipalities::list_municipalities,
        handlers::municipalities::get_municipality,
        handlers::municipalities::create_municipality,
        handlers::communities::create_community,
        handlers::communities::list_communities,
        handlers::communities::search_communities,
        handlers::communities::communities_by_route,
        handlers::communities::communities_by_municipality,
        handlers::communities::get_community,
        handlers::communities::update_community,
        handlers::communities::delete_community,

        // --- Pedidos ---
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::update_order,
        handlers::orders::delete_order,
        handlers::orders::orders_by_route,
        handlers::orders::orders_by_user,
        handlers::orders::export_orders,
        handlers::orders::rollback_order,

        // --- Cobranzas ---
        handlers::collections::generate_collection,
        handlers::collections::preview_collection,
        handlers::collections::list_collections,
        handlers::collections::get_collection,
        handlers::collections::collections_by_order,
        handlers::collections::delete_collection,

        // --- Tickets ---
        handlers::tickets::create_ticket,
        handlers::tickets::list_tickets,
        handlers::tickets::get_ticket,
        handlers::tickets::update_ticket,

        // --- Reportes ---
        handlers::reports::summary,
        handlers::reports::packages,
        handlers::reports::routes,
        handlers::reports::communities,
        handlers::reports::sponsored,
        handlers::reports::workers,
        handlers::reports::economics,
        handlers::reports::calendar,
    ),
    components(
        schemas(
            common::response::MessageData,
            common::response::Meta,

            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::RegisterResponse,
            models::auth::LoginResponse,
            models::auth::ForgotPasswordPayload,
            models::auth::ResetPasswordPayload,
            models::auth::UpdateUserPayload,
            models::auth::VerifyUserPayload,

            // --- Catálogo ---
            models::delivery_route::DeliveryRoute,
            models::delivery_route::RoutePayload,
            models::municipality::Municipality,
            models::municipality::MunicipalityPayload,
            models::community::Community,
            models::community::CreateCommunityPayload,
            models::community::UpdateCommunityPayload,
            models::community::CommunityPage,

            // --- Pedidos ---
            models::order::OrderStatus,
            models::order::OrderSummary,
            models::order::OrderLine,
            models::order::OrderDetail,
            models::order::OrderLineInput,
            models::order::CreateOrderPayload,
            models::order::UpdateOrderPayload,
            models::order::ExportOrdersPayload,
            models::order::OrderPage,

            // --- Cobranzas ---
            models::collection::Collection,
            models::collection::GenerateCollectionPayload,
            handlers::collections::GeneratedCollectionResponse,

            // --- Tickets ---
            models::ticket::TicketStatus,
            models::ticket::TicketPriority,
            models::ticket::Ticket,
            models::ticket::CreateTicketPayload,
            models::ticket::UpdateTicketPayload,

            // --- Reportes ---
            models::report::TierCounts,
            models::report::NamedTotal,
            models::report::MonthTotal,
            models::report::CalendarEntry,
            models::report::SummaryReport,
            models::report::RouteMetrics,
            models::report::ComparisonChart,
            models::report::RouteReport,
            models::report::WorkerMetrics,
            models::report::BarChart,
            models::report::PieChart,
            models::report::WorkerCharts,
            models::report::RecentOrder,
            models::report::WorkerActivity,
            models::report::WorkerReport,
            models::report::MonthTiers,
            models::report::TierSummary,
            models::report::ReturnsTrend,
            models::report::NamedAverage,
            models::report::Averages,
            models::report::PackageDetailRow,
            models::report::PackageReport,
            models::report::CommunityMetrics,
            models::report::MunicipalityVolume,
            models::report::CommunityReport,
            models::report::SponsoredMonth,
            models::report::SponsoredGlobals,
            models::report::SponsoredOrder,
            models::report::SponsoredReport,
            models::report::EconomicTotals,
            models::report::EconomicGroup,
            models::report::EconomicSummary,
            models::report::EconomicReport,
        )
    ),
    tags(
        (name = "Auth", description = "Registro, login e recuperação de senha"),
        (name = "Usuarios", description = "Gestão de usuários e verificação"),
        (name = "Rutas", description = "Rutas de entrega"),
        (name = "Municipios", description = "Municipios"),
        (name = "Comunidades", description = "Comunidades atendidas"),
        (name = "Pedidos", description = "Pedidos e suas comunidades"),
        (name = "Cobranzas", description = "Recibos de cobranza em PDF"),
        (name = "Tickets", description = "Chamados de suporte"),
        (name = "Reportes", description = "Indicadores agregados")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
        components.add_security_scheme(
            "cookie_jwt",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("jwt"))),
        );
    }
}
