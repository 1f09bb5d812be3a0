pub mod bill_service;
pub mod client_service;
pub mod payment_service;
pub mod summary_service;

pub use bill_service::{BillDraft, BillService};
pub use client_service::{ClientDraft, ClientService};
pub use payment_service::{PaymentDetails, PaymentService};
pub use summary_service::{DashboardSummary, PaymentsOverview, ReportSummary, SummaryService};

use crate::errors::BillingError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] BillingError),
    #[error("{0}")]
    Invalid(String),
}
