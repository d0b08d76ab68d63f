//! Repository implementations for database access.

pub mod cancellation;
mod convert;
pub mod payment;
pub mod registry;

pub use cancellation::ReturnRepository;
pub use payment::{PaymentFilter, PaymentRepository, payment_snapshot};
pub use registry::{DocumentBalance, DocumentRegistry};
