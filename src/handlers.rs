pub mod auth;
pub mod collections;
pub mod communities;
pub mod delivery_routes;
pub mod municipalities;
pub mod orders;
pub mod reports;
pub mod tickets;
pub mod users;
