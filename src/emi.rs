use rust_decimal::{Decimal, MathematicalOps};

use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};

/// calculate the equated monthly installment for a loan.
///
/// the result keeps full internal precision; use [`Money::for_display`] for the
/// 2dp figure shown to customers.
pub fn calculate_emi(principal: Money, annual_rate: Rate, months: u32) -> Result<Money> {
    if !principal.is_positive() {
        return Err(LedgerError::InvalidLoanAmount { amount: principal });
    }
    if months == 0 {
        return Err(LedgerError::InvalidTenure { months });
    }
    if annual_rate.is_negative() {
        return Err(LedgerError::InvalidInterestRate { rate: annual_rate });
    }

    let r = annual_rate.monthly_rate().as_decimal();

    if r.is_zero() {
        // no interest: the amortization formula divides by zero here
        return Ok(principal / Decimal::from(months));
    }

    // EMI = P * r * (1 + r)^n / ((1 + r)^n - 1)
    let compound = compound_factor(r, months)?;
    let numerator = principal
        .as_decimal()
        .checked_mul(r)
        .and_then(|v| v.checked_mul(compound))
        .ok_or_else(|| overflow(principal, months))?;
    let denominator = compound - Decimal::ONE;

    numerator
        .checked_div(denominator)
        .map(Money::from_decimal)
        .ok_or_else(|| overflow(principal, months))
}

/// (1 + r)^n
fn compound_factor(r: Decimal, n: u32) -> Result<Decimal> {
    (Decimal::ONE + r)
        .checked_powu(u64::from(n))
        .ok_or_else(|| LedgerError::CalculationError {
            message: format!("compound factor overflow after {} periods", n),
        })
}

fn overflow(principal: Money, months: u32) -> LedgerError {
    LedgerError::CalculationError {
        message: format!("emi overflow for principal {} over {} months", principal, months),
    }
}
