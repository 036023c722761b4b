pub mod config;
pub mod decimal;
pub mod decision;
pub mod desk;
pub mod emi;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod scoring;
pub mod store;
pub mod types;
pub mod views;

// re-export key types
pub use config::{DecisionPolicy, EngineConfig, LimitPolicy, OriginationPolicy, ScoringPolicy};
pub use decimal::{Money, Rate};
pub use decision::{DecisionTier, LoanDecision, LoanDecisionEngine, RejectionReason};
pub use desk::LoanDesk;
pub use emi::calculate_emi;
pub use errors::{ErrorKind, LedgerError, Result};
pub use events::{EventStore, LedgerEvent, RecordedEvent};
pub use lifecycle::{Applicant, LifecycleManager, PaymentOutcome};
pub use scoring::{CreditScore, CreditScorer, LoanHistory, ScoreBreakdown, TenureBasis};
pub use store::{InMemoryLedger, LedgerStore, LedgerTxn};
pub use types::{Customer, CustomerId, Loan, LoanId, LoanTerms, NewCustomer, NewLoan};
pub use views::{
    CustomerLoans, CustomerProfile, EligibilityRequest, EligibilityResponse, JsonView,
    LoanCreated, LoanRequest, LoanView, PaymentReceipt, PaymentRequest, RegisteredCustomer,
    RegistrationRequest,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
