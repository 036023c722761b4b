use chrono::{Datelike, NaiveDate};
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::ScoringPolicy;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::types::{Customer, Loan};

/// tenure used to normalize the on-time repayment ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TenureBasis {
    /// tenure of the loan being evaluated. historical emi counts are divided by
    /// a tenure that belongs to none of the historical loans; kept as-is for
    /// parity with existing scores
    Requested(u32),
    /// longest tenure on the customer's book (profile view)
    LongestLoan,
}

/// one applied score factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub label: String,
    pub description: String,
    pub before: Decimal,
    pub after: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base_score: Decimal,
    pub factors: Vec<FactorContribution>,
}

/// credit score with the factors that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditScore {
    pub score: Decimal,
    /// debt above the approved limit zeroed the score
    pub over_limit: bool,
    pub breakdown: ScoreBreakdown,
}

impl CreditScore {
    /// score rounded for display
    pub fn rounded(&self) -> Decimal {
        self.score.round_dp(2)
    }
}

/// aggregates over a customer's loan history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanHistory {
    pub loan_count: u32,
    pub emis_paid_on_time: u64,
    pub current_year_loans: u32,
    pub total_volume: Money,
    pub longest_tenure: u32,
}

impl LoanHistory {
    pub fn summarize(loans: &[Loan], today: NaiveDate) -> Result<Self> {
        let year = today.year();
        let mut history = LoanHistory {
            loan_count: 0,
            emis_paid_on_time: 0,
            current_year_loans: 0,
            total_volume: Money::ZERO,
            longest_tenure: 0,
        };

        for loan in loans {
            history.loan_count += 1;
            history.emis_paid_on_time += u64::from(loan.emis_paid_on_time);
            if loan.start_date.year() == year {
                history.current_year_loans += 1;
            }
            history.total_volume = history
                .total_volume
                .checked_add(loan.loan_amount)
                .ok_or_else(|| LedgerError::CalculationError {
                    message: format!("loan volume overflow at loan {}", loan.loan_id),
                })?;
            history.longest_tenure = history.longest_tenure.max(loan.tenure);
        }

        Ok(history)
    }

    /// emis paid on time over (loan count * basis tenure); zero without loans
    pub fn on_time_ratio(&self, basis: TenureBasis) -> Result<Decimal> {
        if self.loan_count == 0 {
            return Ok(Decimal::ZERO);
        }

        let tenure = match basis {
            TenureBasis::Requested(months) => months,
            TenureBasis::LongestLoan => self.longest_tenure,
        };
        if tenure == 0 {
            return Err(LedgerError::InvalidTenure { months: tenure });
        }

        let expected = Decimal::from(self.loan_count) * Decimal::from(tenure);
        Ok(Decimal::from(self.emis_paid_on_time) / expected)
    }
}

/// credit scoring engine
pub struct CreditScorer {
    policy: ScoringPolicy,
}

impl CreditScorer {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// score a customer against their loan history as of `today`
    pub fn score(
        &self,
        customer: &Customer,
        loans: &[Loan],
        basis: TenureBasis,
        today: NaiveDate,
    ) -> Result<CreditScore> {
        if let TenureBasis::Requested(0) = basis {
            return Err(LedgerError::InvalidTenure { months: 0 });
        }

        let base_score = self.policy.base_score;
        let mut breakdown = ScoreBreakdown {
            base_score,
            factors: Vec::new(),
        };

        if customer.is_over_limit() {
            breakdown.factors.push(FactorContribution {
                label: "Debt".to_string(),
                description: format!(
                    "current debt {} above approved limit {}",
                    customer.current_debt, customer.approved_limit
                ),
                before: base_score,
                after: Decimal::ZERO,
            });
            debug!(
                "customer {} over approved limit, credit score 0",
                customer.customer_id
            );
            return Ok(CreditScore {
                score: Decimal::ZERO,
                over_limit: true,
                breakdown,
            });
        }

        let history = LoanHistory::summarize(loans, today)?;
        let ratio = history.on_time_ratio(basis)?;
        let mut score = base_score;

        // more loans, more risk
        let before = score;
        score -= self.policy.loan_count_penalty * Decimal::from(history.loan_count);
        breakdown.factors.push(FactorContribution {
            label: "Loan count".to_string(),
            description: format!(
                "-{} per loan ({} loans)",
                self.policy.loan_count_penalty, history.loan_count
            ),
            before,
            after: score,
        });

        let before = score;
        score += self.policy.on_time_reward_cap.min(ratio * dec!(100));
        breakdown.factors.push(FactorContribution {
            label: "On-time repayment".to_string(),
            description: format!(
                "{} of {} expected emis paid on time, capped at +{}",
                history.emis_paid_on_time,
                expected_emis(&history, basis),
                self.policy.on_time_reward_cap
            ),
            before,
            after: score,
        });

        let before = score;
        score -= self.policy.current_year_loan_penalty * Decimal::from(history.current_year_loans);
        breakdown.factors.push(FactorContribution {
            label: "Recent activity".to_string(),
            description: format!(
                "-{} per loan started in {} ({} loans)",
                self.policy.current_year_loan_penalty,
                today.year(),
                history.current_year_loans
            ),
            before,
            after: score,
        });

        let before = score;
        let volume_points = history.total_volume.as_decimal() / self.policy.volume_unit.as_decimal();
        score += self.policy.volume_reward_cap.min(volume_points);
        breakdown.factors.push(FactorContribution {
            label: "Loan volume".to_string(),
            description: format!(
                "+1 per {} borrowed ({} total), capped at +{}",
                self.policy.volume_unit, history.total_volume, self.policy.volume_reward_cap
            ),
            before,
            after: score,
        });

        debug!(
            "customer {} credit score {} from {} loans",
            customer.customer_id,
            score.round_dp(2),
            history.loan_count
        );

        Ok(CreditScore {
            score,
            over_limit: false,
            breakdown,
        })
    }
}

impl Default for CreditScorer {
    fn default() -> Self {
        Self::new(ScoringPolicy::default())
    }
}

fn expected_emis(history: &LoanHistory, basis: TenureBasis) -> u64 {
    let tenure = match basis {
        TenureBasis::Requested(months) => months,
        TenureBasis::LongestLoan => history.longest_tenure,
    };
    u64::from(history.loan_count) * u64::from(tenure)
}
