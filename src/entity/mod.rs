pub mod audit_logs;
pub mod brands;
pub mod cart_items;
pub mod carts;
pub mod categories;
pub mod inventories;
pub mod order_items;
pub mod orders;
pub mod password_reset_tokens;
pub mod product_field_values;
pub mod products;
pub mod template_fields;
pub mod templates;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use brands::Entity as Brands;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use categories::Entity as Categories;
pub use inventories::Entity as Inventories;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use password_reset_tokens::Entity as PasswordResetTokens;
pub use product_field_values::Entity as ProductFieldValues;
pub use products::Entity as Products;
pub use template_fields::Entity as TemplateFields;
pub use templates::Entity as Templates;
pub use users::Entity as Users;
