pub mod user_repo;
pub use user_repo::UserRepository;
pub mod delivery_route_repo;
pub use delivery_route_repo::DeliveryRouteRepository;
pub mod municipality_repo;
pub use municipality_repo::MunicipalityRepository;
pub mod community_repo;
pub use community_repo::CommunityRepository;
pub mod order_repo;
pub use order_repo::OrderRepository;
pub mod collection_repo;
pub use collection_repo::CollectionRepository;
pub mod ticket_repo;
pub use ticket_repo::TicketRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
