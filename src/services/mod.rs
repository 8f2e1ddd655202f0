pub mod cards;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod products;
pub mod stock;
pub mod users;

pub use cards::CardService;
pub use notifications::NotificationService;
pub use orders::OrderService;
pub use payments::PaymentService;
pub use products::ProductService;
pub use users::UserService;
