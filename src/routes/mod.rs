pub mod advert;
pub mod application;
pub mod auth;
pub mod catalog;
pub mod docs;
pub mod health;
