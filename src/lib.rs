pub mod availability;
pub mod database;
pub mod flow;
pub mod ledger;
pub mod models;
pub mod payments;
pub mod store;

pub use flow::{BookingFlow, FlowOutcome, FlowState, ValidationError};
pub use ledger::FallbackLedger;
pub use payments::{HttpPaymentProvider, PaymentError, PaymentProvider};
pub use store::{BookingStore, PgBookingStore, StoreError};
