use chrono::{Days, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::{LimitPolicy, OriginationPolicy};
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::types::{Customer, CustomerId, Loan, LoanTerms, NewCustomer, NewLoan};

/// registration details supplied by the customer
#[derive(Debug, Clone, PartialEq)]
pub struct Applicant {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: u64,
    pub age: u32,
    pub monthly_salary: Money,
}

/// result of applying a payment to a loan
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub customer: Customer,
    pub loan: Loan,
    /// false once every emi of the loan has been counted
    pub emi_counted: bool,
    /// amount reduced from debt
    pub applied: Money,
    /// part of the payment above the outstanding debt, not kept as credit
    pub unapplied: Money,
}

/// state transitions of customers and their loans
#[derive(Debug, Clone, Default)]
pub struct LifecycleManager {
    limits: LimitPolicy,
    origination: OriginationPolicy,
}

impl LifecycleManager {
    pub fn new(limits: LimitPolicy, origination: OriginationPolicy) -> Self {
        Self { limits, origination }
    }

    /// credit ceiling for a salary: salary multiple rounded to the nearest lakh
    /// (ties to even)
    pub fn approved_limit(&self, monthly_salary: Money) -> Result<Money> {
        let too_large = || LedgerError::CalculationError {
            message: format!("approved limit overflow for monthly salary {}", monthly_salary),
        };
        let unit = self.limits.rounding_unit.as_decimal();
        let units = (monthly_salary
            .checked_mul(self.limits.salary_multiplier)
            .ok_or_else(too_large)?
            .as_decimal()
            / unit)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven);
        units
            .checked_mul(unit)
            .map(Money::from_decimal)
            .ok_or_else(too_large)
    }

    /// validate an applicant and fix their approved limit
    pub fn register(&self, applicant: Applicant) -> Result<NewCustomer> {
        if applicant.first_name.trim().is_empty() || applicant.last_name.trim().is_empty() {
            return Err(LedgerError::InvalidInput {
                message: "first and last name are required".to_string(),
            });
        }
        if applicant.age == 0 {
            return Err(LedgerError::InvalidInput {
                message: "age must be positive".to_string(),
            });
        }
        if !applicant.monthly_salary.is_positive() {
            return Err(LedgerError::InvalidInput {
                message: format!("monthly income must be positive, got {}", applicant.monthly_salary),
            });
        }

        let approved_limit = self.approved_limit(applicant.monthly_salary)?;
        Ok(NewCustomer {
            first_name: applicant.first_name.trim().to_string(),
            last_name: applicant.last_name.trim().to_string(),
            phone_number: applicant.phone_number,
            age: applicant.age,
            monthly_salary: applicant.monthly_salary,
            approved_limit,
        })
    }

    /// end date after `tenure` fixed-length months. a tenure running past the
    /// last representable date is invalid
    pub fn end_date(&self, start_date: NaiveDate, tenure: u32) -> Result<NaiveDate> {
        let days = u64::from(self.origination.days_per_month) * u64::from(tenure);
        start_date
            .checked_add_days(Days::new(days))
            .ok_or(LedgerError::InvalidTenure { months: tenure })
    }

    /// build the loan to persist for the customer, starting `today`
    pub fn originate(
        &self,
        customer_id: CustomerId,
        terms: &LoanTerms,
        monthly_payment: Money,
        today: NaiveDate,
    ) -> Result<NewLoan> {
        validate_terms(terms)?;
        if monthly_payment.is_negative() {
            return Err(LedgerError::InvalidInput {
                message: format!("monthly payment cannot be negative, got {}", monthly_payment),
            });
        }

        Ok(NewLoan {
            customer_id,
            loan_amount: terms.loan_amount,
            tenure: terms.tenure,
            interest_rate: terms.interest_rate,
            monthly_payment,
            emis_paid_on_time: 0,
            start_date: today,
            end_date: self.end_date(today, terms.tenure)?,
        })
    }

    /// the customer with a newly booked loan amount added to their debt
    pub fn charge(&self, customer: &Customer, amount: Money) -> Result<Customer> {
        let current_debt =
            customer
                .current_debt
                .checked_add(amount)
                .ok_or_else(|| LedgerError::CalculationError {
                    message: format!(
                        "debt overflow adding {} to {} for customer {}",
                        amount, customer.current_debt, customer.customer_id
                    ),
                })?;

        let mut customer = customer.clone();
        customer.current_debt = current_debt;
        Ok(customer)
    }

    /// record a payment: one more emi counted (up to tenure) and the amount
    /// taken off the customer's debt, never below zero
    pub fn apply_payment(
        &self,
        customer: &Customer,
        loan: &Loan,
        amount: Option<Money>,
    ) -> Result<PaymentOutcome> {
        let amount = match amount {
            Some(a) if a.is_positive() => a,
            other => return Err(LedgerError::InvalidPaymentAmount { amount: other }),
        };
        if loan.customer_id != customer.customer_id {
            return Err(LedgerError::LoanNotFound {
                customer_id: customer.customer_id,
                loan_id: loan.loan_id,
            });
        }

        let mut loan = loan.clone();
        let emi_counted = !loan.is_fully_paid();
        if emi_counted {
            loan.emis_paid_on_time += 1;
        }

        let mut customer = customer.clone();
        let applied = amount.min(customer.current_debt);
        customer.current_debt = customer.current_debt.saturating_sub(amount);

        Ok(PaymentOutcome {
            customer,
            loan,
            emi_counted,
            applied,
            unapplied: amount - applied,
        })
    }
}

/// loan terms must have a positive amount and tenure and a non-negative rate
pub fn validate_terms(terms: &LoanTerms) -> Result<()> {
    if !terms.loan_amount.is_positive() {
        return Err(LedgerError::InvalidLoanAmount {
            amount: terms.loan_amount,
        });
    }
    if terms.tenure == 0 {
        return Err(LedgerError::InvalidTenure { months: 0 });
    }
    if terms.interest_rate.as_decimal() < Decimal::ZERO {
        return Err(LedgerError::InvalidInterestRate {
            rate: terms.interest_rate,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::decimal::Rate;
    use crate::types::{CustomerId, LoanId};

    fn manager() -> LifecycleManager {
        LifecycleManager::default()
    }

    fn customer(debt: i64) -> Customer {
        Customer {
            customer_id: CustomerId(3),
            first_name: "Kabir".to_string(),
            last_name: "Mehta".to_string(),
            phone_number: 9_123_456_780,
            age: 38,
            monthly_salary: Money::from_major(80_000),
            approved_limit: Money::from_major(2_900_000),
            current_debt: Money::from_major(debt),
            version: 2,
        }
    }

    fn terms(amount: i64, tenure: u32) -> LoanTerms {
        LoanTerms {
            loan_amount: Money::from_major(amount),
            interest_rate: Rate::from_percentage(11),
            tenure,
        }
    }

    fn loan(tenure: u32, paid: u32) -> Loan {
        let start = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        Loan {
            loan_id: LoanId(5),
            customer_id: CustomerId(3),
            loan_amount: Money::from_major(60_000),
            tenure,
            interest_rate: Rate::from_percentage(11),
            monthly_payment: Money::from_major(5_300),
            emis_paid_on_time: paid,
            start_date: start,
            end_date: start + Duration::days(30 * tenure as i64),
            version: 0,
        }
    }

    fn applicant(salary: i64) -> Applicant {
        Applicant {
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            phone_number: 1_234_567_890,
            age: 30,
            monthly_salary: Money::from_major(salary),
        }
    }

    #[test]
    fn test_approved_limit_rounds_to_nearest_lakh() {
        let m = manager();
        // 36 * 50000 = 1_800_000
        assert_eq!(m.approved_limit(Money::from_major(50_000)).unwrap(), Money::from_major(1_800_000));
        // 36 * 45000 = 1_620_000 -> 16 lakh
        assert_eq!(m.approved_limit(Money::from_major(45_000)).unwrap(), Money::from_major(1_600_000));
        // 36 * 47000 = 1_692_000 -> 17 lakh
        assert_eq!(m.approved_limit(Money::from_major(47_000)).unwrap(), Money::from_major(1_700_000));
        // 36 * 12500 = 450_000, tie goes to even
        assert_eq!(m.approved_limit(Money::from_major(12_500)).unwrap(), Money::from_major(400_000));
        // below half a lakh
        assert_eq!(m.approved_limit(Money::from_major(1_000)).unwrap(), Money::ZERO);
    }

    #[test]
    fn test_oversized_salary_is_rejected() {
        let salary = Money::from_str_exact("3000000000000000000000000000").unwrap();
        assert!(matches!(
            manager().approved_limit(salary),
            Err(LedgerError::CalculationError { .. })
        ));

        let mut rich = applicant(0);
        rich.monthly_salary = salary;
        assert!(matches!(
            manager().register(rich),
            Err(LedgerError::CalculationError { .. })
        ));
    }

    #[test]
    fn test_register_validates_applicant() {
        let m = manager();
        let new = m.register(applicant(50_000)).unwrap();
        assert_eq!(new.approved_limit, Money::from_major(1_800_000));

        let mut nameless = applicant(50_000);
        nameless.first_name = "  ".to_string();
        assert!(matches!(m.register(nameless), Err(LedgerError::InvalidInput { .. })));

        assert!(m.register(applicant(0)).is_err());

        let mut unborn = applicant(50_000);
        unborn.age = 0;
        assert!(m.register(unborn).is_err());
    }

    #[test]
    fn test_originate_increases_debt_by_amount() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let m = manager();
        let holder = customer(10_000);
        let loan = m
            .originate(holder.customer_id, &terms(50_000, 12), Money::from_major(4_420), today)
            .unwrap();
        let updated = m.charge(&holder, loan.loan_amount).unwrap();

        assert_eq!(updated.current_debt, Money::from_major(60_000));
        assert_eq!(updated.version, 2);
        assert_eq!(loan.customer_id, holder.customer_id);
        assert_eq!(loan.emis_paid_on_time, 0);
        assert_eq!(loan.start_date, today);
        assert_eq!(loan.end_date, NaiveDate::from_ymd_opt(2026, 2, 24).unwrap());
    }

    #[test]
    fn test_tenure_past_last_date_is_invalid() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let m = manager();
        assert!(matches!(
            m.end_date(today, 4_000_000),
            Err(LedgerError::InvalidTenure { months: 4_000_000 })
        ));
        assert!(matches!(
            m.originate(CustomerId(3), &terms(1_000, u32::MAX), Money::ZERO, today),
            Err(LedgerError::InvalidTenure { .. })
        ));
    }

    #[test]
    fn test_charge_overflow_is_reported() {
        let mut holder = customer(0);
        holder.current_debt = Money::from_str_exact("50000000000000000000000000000").unwrap();
        let err = manager().charge(&holder, holder.current_debt).unwrap_err();
        assert!(matches!(err, LedgerError::CalculationError { .. }));
    }

    #[test]
    fn test_originate_rejects_bad_terms() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let m = manager();
        assert!(matches!(
            m.originate(CustomerId(3), &terms(0, 12), Money::ZERO, today),
            Err(LedgerError::InvalidLoanAmount { .. })
        ));
        assert!(matches!(
            m.originate(CustomerId(3), &terms(1_000, 0), Money::ZERO, today),
            Err(LedgerError::InvalidTenure { .. })
        ));
        assert!(m
            .originate(CustomerId(3), &terms(1_000, 6), Money::from_major(-1), today)
            .is_err());
    }

    #[test]
    fn test_payment_counts_one_emi_regardless_of_size() {
        let outcome = manager()
            .apply_payment(&customer(60_000), &loan(12, 0), Some(Money::from_major(30_000)))
            .unwrap();
        assert!(outcome.emi_counted);
        assert_eq!(outcome.loan.emis_paid_on_time, 1);
        assert_eq!(outcome.customer.current_debt, Money::from_major(30_000));
        assert_eq!(outcome.applied, Money::from_major(30_000));
        assert_eq!(outcome.unapplied, Money::ZERO);
    }

    #[test]
    fn test_emi_count_capped_at_tenure() {
        let outcome = manager()
            .apply_payment(&customer(5_000), &loan(6, 6), Some(Money::from_major(100)))
            .unwrap();
        assert!(!outcome.emi_counted);
        assert_eq!(outcome.loan.emis_paid_on_time, 6);
        assert_eq!(outcome.customer.current_debt, Money::from_major(4_900));
    }

    #[test]
    fn test_overpayment_floors_debt_at_zero() {
        let outcome = manager()
            .apply_payment(&customer(1_000), &loan(12, 3), Some(Money::from_major(2_500)))
            .unwrap();
        assert_eq!(outcome.customer.current_debt, Money::ZERO);
        assert_eq!(outcome.applied, Money::from_major(1_000));
        assert_eq!(outcome.unapplied, Money::from_major(1_500));
    }

    #[test]
    fn test_payment_amount_must_be_positive() {
        let m = manager();
        for amount in [None, Some(Money::ZERO), Some(Money::from_major(-10))] {
            let err = m.apply_payment(&customer(1_000), &loan(12, 0), amount).unwrap_err();
            assert!(matches!(err, LedgerError::InvalidPaymentAmount { .. }));
        }
    }

    #[test]
    fn test_payment_on_foreign_loan_is_not_found() {
        let mut foreign = loan(12, 0);
        foreign.customer_id = CustomerId(99);
        let err = manager()
            .apply_payment(&customer(1_000), &foreign, Some(Money::from_major(10)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::LoanNotFound { .. }));
    }
}
