//! `SeaORM` entity prelude.

pub use super::customers::Entity as Customers;
pub use super::payments::Entity as Payments;
pub use super::purchase_invoices::Entity as PurchaseInvoices;
pub use super::purchase_orders::Entity as PurchaseOrders;
pub use super::purchase_returns::Entity as PurchaseReturns;
pub use super::sales_invoices::Entity as SalesInvoices;
pub use super::sales_orders::Entity as SalesOrders;
pub use super::sales_returns::Entity as SalesReturns;
pub use super::suppliers::Entity as Suppliers;
