//! request and response shapes of the loan desk api
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::decision::LoanDecision;
use crate::lifecycle::Applicant;
use crate::types::{Customer, CustomerId, Loan, LoanId, LoanTerms};

/// pretty json rendering for api responses
pub trait JsonView: Serialize {
    fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub phone_number: u64,
    pub monthly_income: Money,
}

impl From<RegistrationRequest> for Applicant {
    fn from(req: RegistrationRequest) -> Self {
        Applicant {
            first_name: req.first_name,
            last_name: req.last_name,
            phone_number: req.phone_number,
            age: req.age,
            monthly_salary: req.monthly_income,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredCustomer {
    pub customer_id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub phone_number: u64,
    pub monthly_income: Money,
    pub approved_limit: Money,
}

impl From<&Customer> for RegisteredCustomer {
    fn from(c: &Customer) -> Self {
        RegisteredCustomer {
            customer_id: c.customer_id,
            first_name: c.first_name.clone(),
            last_name: c.last_name.clone(),
            age: c.age,
            phone_number: c.phone_number,
            monthly_income: c.monthly_salary,
            approved_limit: c.approved_limit,
        }
    }
}

/// rates on the wire are percentages (10.5 for 10.5%)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityRequest {
    pub customer_id: CustomerId,
    pub loan_amount: Money,
    pub interest_rate: Decimal,
    pub tenure: u32,
}

impl EligibilityRequest {
    pub fn terms(&self) -> LoanTerms {
        LoanTerms {
            loan_amount: self.loan_amount,
            interest_rate: Rate::from_percentage_decimal(self.interest_rate),
            tenure: self.tenure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibilityResponse {
    pub customer_id: CustomerId,
    pub approval: bool,
    pub interest_rate: Decimal,
    pub corrected_interest_rate: Decimal,
    pub tenure: u32,
    pub monthly_installment: Money,
    pub credit_score: Decimal,
    pub reason: Option<String>,
}

impl From<&LoanDecision> for EligibilityResponse {
    fn from(d: &LoanDecision) -> Self {
        EligibilityResponse {
            customer_id: d.customer_id,
            approval: d.approval,
            interest_rate: d.interest_rate.as_percentage(),
            corrected_interest_rate: d.corrected_interest_rate.as_percentage(),
            tenure: d.tenure,
            monthly_installment: d.monthly_installment(),
            credit_score: d.credit_score.round_dp(2),
            reason: d.reason.map(|r| r.message()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRequest {
    pub customer_id: CustomerId,
    pub loan_amount: Money,
    pub interest_rate: Decimal,
    pub tenure: u32,
    pub monthly_payment: Money,
}

impl LoanRequest {
    pub fn terms(&self) -> LoanTerms {
        LoanTerms {
            loan_amount: self.loan_amount,
            interest_rate: Rate::from_percentage_decimal(self.interest_rate),
            tenure: self.tenure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanCreated {
    pub loan_id: LoanId,
    pub customer_id: CustomerId,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub customer_id: CustomerId,
    pub loan_id: LoanId,
    /// absent amounts are rejected
    #[serde(default)]
    pub amount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub message: String,
    pub customer_id: CustomerId,
    pub loan_id: LoanId,
    pub remaining_debt: Money,
    pub emis_paid: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: u64,
    pub age: u32,
    pub monthly_salary: Money,
    pub approved_limit: Money,
    pub current_debt: Money,
    pub credit_score: Decimal,
}

impl CustomerProfile {
    pub fn new(c: &Customer, credit_score: Decimal) -> Self {
        CustomerProfile {
            customer_id: c.customer_id,
            first_name: c.first_name.clone(),
            last_name: c.last_name.clone(),
            phone_number: c.phone_number,
            age: c.age,
            monthly_salary: c.monthly_salary,
            approved_limit: c.approved_limit,
            current_debt: c.current_debt,
            credit_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanView {
    pub loan_id: LoanId,
    pub loan_amount: Money,
    pub interest_rate: Decimal,
    pub tenure: u32,
    pub monthly_payment: Money,
    pub emis_paid_on_time: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl From<&Loan> for LoanView {
    fn from(l: &Loan) -> Self {
        LoanView {
            loan_id: l.loan_id,
            loan_amount: l.loan_amount,
            interest_rate: l.interest_rate.as_percentage(),
            tenure: l.tenure,
            monthly_payment: l.monthly_payment,
            emis_paid_on_time: l.emis_paid_on_time,
            start_date: l.start_date,
            end_date: l.end_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerLoans {
    pub customer_id: CustomerId,
    pub loans: Vec<LoanView>,
}

impl JsonView for RegisteredCustomer {}
impl JsonView for EligibilityResponse {}
impl JsonView for LoanCreated {}
impl JsonView for PaymentReceipt {}
impl JsonView for CustomerProfile {}
impl JsonView for CustomerLoans {}
