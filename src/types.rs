use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decimal::{Money, Rate};

/// store-assigned customer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub u64);

/// store-assigned loan identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(pub u64);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// registered borrower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: u64,
    pub age: u32,
    pub monthly_salary: Money,
    /// credit ceiling, fixed at registration
    pub approved_limit: Money,
    /// never negative
    pub current_debt: Money,
    /// bumped by the store on every save
    pub version: u64,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// debt above the approved limit fails the credit check outright
    pub fn is_over_limit(&self) -> bool {
        self.current_debt > self.approved_limit
    }
}

/// customer record before the store assigns an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: u64,
    pub age: u32,
    pub monthly_salary: Money,
    pub approved_limit: Money,
}

/// terms of a loan as requested by the customer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub loan_amount: Money,
    pub interest_rate: Rate,
    /// months
    pub tenure: u32,
}

/// loan on a customer's book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: LoanId,
    pub customer_id: CustomerId,
    pub loan_amount: Money,
    pub tenure: u32,
    pub interest_rate: Rate,
    pub monthly_payment: Money,
    /// 0..=tenure
    pub emis_paid_on_time: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub version: u64,
}

impl Loan {
    pub fn remaining_emis(&self) -> u32 {
        self.tenure.saturating_sub(self.emis_paid_on_time)
    }

    pub fn is_fully_paid(&self) -> bool {
        self.emis_paid_on_time >= self.tenure
    }
}

/// loan record before the store assigns an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLoan {
    pub customer_id: CustomerId,
    pub loan_amount: Money,
    pub tenure: u32,
    pub interest_rate: Rate,
    pub monthly_payment: Money,
    pub emis_paid_on_time: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewLoan {
    /// attach store-assigned identity
    pub fn into_loan(self, loan_id: LoanId) -> Loan {
        Loan {
            loan_id,
            customer_id: self.customer_id,
            loan_amount: self.loan_amount,
            tenure: self.tenure,
            interest_rate: self.interest_rate,
            monthly_payment: self.monthly_payment,
            emis_paid_on_time: self.emis_paid_on_time,
            start_date: self.start_date,
            end_date: self.end_date,
            version: 0,
        }
    }
}

impl NewCustomer {
    /// attach store-assigned identity
    pub fn into_customer(self, customer_id: CustomerId) -> Customer {
        Customer {
            customer_id,
            first_name: self.first_name,
            last_name: self.last_name,
            phone_number: self.phone_number,
            age: self.age,
            monthly_salary: self.monthly_salary,
            approved_limit: self.approved_limit,
            current_debt: Money::ZERO,
            version: 0,
        }
    }
}
