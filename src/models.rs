pub mod auth;
pub mod collection;
pub mod community;
pub mod delivery_route;
pub mod municipality;
pub mod order;
pub mod report;
pub mod ticket;
