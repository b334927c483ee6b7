pub mod account;
pub mod advert;
pub mod application;
pub mod category;
pub mod email_outbox;
pub mod skill;
