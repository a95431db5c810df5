pub mod auth;
pub mod catalog_service;
pub mod collection_service;
pub mod document_service;
pub mod mail_service;
pub mod order_service;
pub mod report_metrics;
pub mod report_service;
pub mod storage_service;
pub mod ticket_service;
pub mod user_service;
