use thiserror::Error;

use crate::decimal::{Money, Rate};
use crate::types::{CustomerId, LoanId};

/// coarse error classes an api layer maps onto response codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    Conflict,
    Internal,
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("customer not found: {id}")]
    CustomerNotFound {
        id: CustomerId,
    },

    #[error("loan {loan_id} not found for customer {customer_id}")]
    LoanNotFound {
        customer_id: CustomerId,
        loan_id: LoanId,
    },

    #[error("invalid payment amount: {amount:?}")]
    InvalidPaymentAmount {
        amount: Option<Money>,
    },

    #[error("invalid loan amount: {amount}")]
    InvalidLoanAmount {
        amount: Money,
    },

    #[error("invalid tenure: {months} months")]
    InvalidTenure {
        months: u32,
    },

    #[error("invalid interest rate: {rate}")]
    InvalidInterestRate {
        rate: Rate,
    },

    #[error("phone number already registered: {phone_number}")]
    DuplicatePhoneNumber {
        phone_number: u64,
    },

    #[error("invalid input: {message}")]
    InvalidInput {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("concurrent modification of {record}: expected version {expected}, found {found}")]
    ConcurrentModification {
        record: String,
        expected: u64,
        found: u64,
    },

    #[error("ledger store unavailable: {message}")]
    StoreUnavailable {
        message: String,
    },

    #[error("calculation error: {message}")]
    CalculationError {
        message: String,
    },
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::CustomerNotFound { .. } | LedgerError::LoanNotFound { .. } => {
                ErrorKind::NotFound
            }
            LedgerError::InvalidPaymentAmount { .. }
            | LedgerError::InvalidLoanAmount { .. }
            | LedgerError::InvalidTenure { .. }
            | LedgerError::InvalidInterestRate { .. }
            | LedgerError::DuplicatePhoneNumber { .. }
            | LedgerError::InvalidInput { .. }
            | LedgerError::CalculationError { .. } => ErrorKind::InvalidInput,
            LedgerError::ConcurrentModification { .. } => ErrorKind::Conflict,
            LedgerError::InvalidConfiguration { .. } | LedgerError::StoreUnavailable { .. } => {
                ErrorKind::Internal
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
