pub mod account_service;
pub mod advert_service;
pub mod application_service;
pub mod catalog_service;
pub mod notification_service;
