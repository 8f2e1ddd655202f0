pub mod notification;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod payment_card;
pub mod product;
pub mod user;
