pub mod auth;
pub mod brands;
pub mod cart;
pub mod categories;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod templates;
