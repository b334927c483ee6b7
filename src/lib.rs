pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    account_service::AccountService, advert_service::AdvertService,
    application_service::ApplicationService, catalog_service::CatalogService,
    notification_service::NotificationService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub account_service: AccountService,
    pub advert_service: AdvertService,
    pub application_service: ApplicationService,
    pub catalog_service: CatalogService,
    pub notification_service: NotificationService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        let account_service = AccountService::new(pool.clone());
        let advert_service = AdvertService::new(pool.clone());
        let catalog_service = CatalogService::new(pool.clone());
        let notification_service =
            NotificationService::new(pool.clone(), config.mail_gateway_url.clone());
        let application_service =
            ApplicationService::new(pool.clone(), notification_service.clone());

        Self {
            pool,
            account_service,
            advert_service,
            application_service,
            catalog_service,
            notification_service,
        }
    }
}
