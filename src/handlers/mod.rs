pub mod admin;
pub mod auth;
pub mod cards;
pub mod common;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod products;
