//! `SeaORM` entity definitions.

pub mod prelude;

pub mod customers;
pub mod payments;
pub mod purchase_invoices;
pub mod purchase_orders;
pub mod purchase_returns;
pub mod sales_invoices;
pub mod sales_orders;
pub mod sales_returns;
pub mod sea_orm_active_enums;
pub mod suppliers;
