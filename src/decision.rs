use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::DecisionPolicy;
use crate::decimal::{Money, Rate};
use crate::scoring::CreditScore;
use crate::types::{Customer, CustomerId, LoanTerms};

/// pricing tier a credit score falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionTier {
    /// approved as requested
    Prime,
    /// approved at or above the standard minimum rate
    Standard,
    /// approved at or above the subprime minimum rate
    Subprime,
    /// never approved
    Declined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    EmiExceedsAffordability,
    RateBelowTierMinimum { minimum: Rate },
    CreditScoreTooLow,
}

impl RejectionReason {
    pub fn message(&self) -> String {
        match self {
            RejectionReason::EmiExceedsAffordability => {
                "EMI exceeds affordability threshold".to_string()
            }
            RejectionReason::RateBelowTierMinimum { minimum } => {
                format!("interest rate below tier minimum of {}", minimum)
            }
            RejectionReason::CreditScoreTooLow => "credit score too low".to_string(),
        }
    }
}

/// verdict on a loan request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanDecision {
    pub customer_id: CustomerId,
    pub approval: bool,
    pub interest_rate: Rate,
    pub corrected_interest_rate: Rate,
    pub tenure: u32,
    /// full precision installment
    pub emi: Money,
    pub credit_score: Decimal,
    /// none when the affordability gate rejected before tiering
    pub tier: Option<DecisionTier>,
    pub reason: Option<RejectionReason>,
}

impl LoanDecision {
    /// installment rounded for display
    pub fn monthly_installment(&self) -> Money {
        self.emi.for_display()
    }
}

/// loan decision engine
pub struct LoanDecisionEngine {
    policy: DecisionPolicy,
}

impl LoanDecisionEngine {
    pub fn new(policy: DecisionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    /// map a score onto its tier; boundaries belong to the lower tier
    pub fn tier_for(&self, score: Decimal) -> DecisionTier {
        if score > self.policy.prime_threshold {
            DecisionTier::Prime
        } else if score > self.policy.standard_threshold {
            DecisionTier::Standard
        } else if score > self.policy.subprime_threshold {
            DecisionTier::Subprime
        } else {
            DecisionTier::Declined
        }
    }

    /// largest installment the customer's salary supports
    pub fn affordable_emi(&self, customer: &Customer) -> Money {
        customer.monthly_salary.percentage(self.policy.max_emi_salary_pct)
    }

    /// decide on a request given its computed emi and the customer's score
    pub fn decide(
        &self,
        customer: &Customer,
        terms: &LoanTerms,
        emi: Money,
        score: &CreditScore,
    ) -> LoanDecision {
        let mut decision = LoanDecision {
            customer_id: customer.customer_id,
            approval: false,
            interest_rate: terms.interest_rate,
            corrected_interest_rate: terms.interest_rate,
            tenure: terms.tenure,
            emi,
            credit_score: score.score,
            tier: None,
            reason: None,
        };

        let ceiling = self.affordable_emi(customer);
        if emi > ceiling {
            debug!(
                "customer {} emi {} exceeds affordable {}",
                customer.customer_id,
                emi.for_display(),
                ceiling
            );
            decision.reason = Some(RejectionReason::EmiExceedsAffordability);
            return decision;
        }

        let tier = self.tier_for(score.score);
        decision.tier = Some(tier);

        match tier {
            DecisionTier::Prime => {
                decision.approval = true;
            }
            DecisionTier::Standard => {
                self.apply_minimum_rate(&mut decision, self.policy.standard_min_rate);
            }
            DecisionTier::Subprime => {
                self.apply_minimum_rate(&mut decision, self.policy.subprime_min_rate);
            }
            DecisionTier::Declined => {
                decision.reason = Some(RejectionReason::CreditScoreTooLow);
            }
        }

        debug!(
            "customer {} tier {:?} approval {} at {}",
            customer.customer_id, tier, decision.approval, decision.corrected_interest_rate
        );

        decision
    }

    fn apply_minimum_rate(&self, decision: &mut LoanDecision, minimum: Rate) {
        decision.approval = decision.interest_rate >= minimum;
        decision.corrected_interest_rate = decision.interest_rate.max(minimum);
        if !decision.approval {
            decision.reason = Some(RejectionReason::RateBelowTierMinimum { minimum });
        }
    }
}

impl Default for LoanDecisionEngine {
    fn default() -> Self {
        Self::new(DecisionPolicy::default())
    }
}
