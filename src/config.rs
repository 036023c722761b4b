use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};

/// engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringPolicy,
    pub decision: DecisionPolicy,
    pub limits: LimitPolicy,
    pub origination: OriginationPolicy,
}

/// weights of the credit score factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub base_score: Decimal,
    /// subtracted once per loan on the book
    pub loan_count_penalty: Decimal,
    /// upper bound on the on-time repayment reward
    pub on_time_reward_cap: Decimal,
    /// subtracted once per loan started this calendar year
    pub current_year_loan_penalty: Decimal,
    /// historical volume earning one point
    pub volume_unit: Money,
    pub volume_reward_cap: Decimal,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            base_score: dec!(100),
            loan_count_penalty: dec!(2),
            on_time_reward_cap: dec!(20),
            current_year_loan_penalty: dec!(5),
            volume_unit: Money::from_major(100_000),
            volume_reward_cap: dec!(20),
        }
    }
}

/// approval tiers and the affordability gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionPolicy {
    /// share of monthly salary (percent) the emi may not exceed
    pub max_emi_salary_pct: Decimal,
    /// scores above this are approved as requested
    pub prime_threshold: Decimal,
    /// scores in (standard_threshold, prime_threshold] need standard_min_rate
    pub standard_threshold: Decimal,
    /// scores in (subprime_threshold, standard_threshold] need subprime_min_rate
    pub subprime_threshold: Decimal,
    pub standard_min_rate: Rate,
    pub subprime_min_rate: Rate,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            max_emi_salary_pct: dec!(50),
            prime_threshold: dec!(50),
            standard_threshold: dec!(30),
            subprime_threshold: dec!(10),
            standard_min_rate: Rate::from_percentage(12),
            subprime_min_rate: Rate::from_percentage(16),
        }
    }
}

/// approved limit derivation at registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitPolicy {
    pub salary_multiplier: Decimal,
    /// limits are rounded to the nearest multiple of this (one lakh)
    pub rounding_unit: Money,
}

impl Default for LimitPolicy {
    fn default() -> Self {
        Self {
            salary_multiplier: dec!(36),
            rounding_unit: Money::from_major(100_000),
        }
    }
}

/// loan origination parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginationPolicy {
    /// end date is start + days_per_month * tenure, not calendar months
    pub days_per_month: u32,
}

impl Default for OriginationPolicy {
    fn default() -> Self {
        Self { days_per_month: 30 }
    }
}

impl EngineConfig {
    /// load from json; missing sections fall back to defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| LedgerError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<()> {
        let d = &self.decision;
        if !(d.prime_threshold > d.standard_threshold && d.standard_threshold > d.subprime_threshold) {
            return Err(invalid(format!(
                "score tiers must be strictly descending, got {} / {} / {}",
                d.prime_threshold, d.standard_threshold, d.subprime_threshold
            )));
        }
        if d.max_emi_salary_pct <= Decimal::ZERO {
            return Err(invalid("emi salary share must be positive".to_string()));
        }
        if d.standard_min_rate.is_negative() || d.subprime_min_rate.is_negative() {
            return Err(invalid("tier minimum rates cannot be negative".to_string()));
        }

        if !self.scoring.volume_unit.is_positive() {
            return Err(invalid("scoring volume unit must be positive".to_string()));
        }
        if !self.limits.rounding_unit.is_positive() {
            return Err(invalid("limit rounding unit must be positive".to_string()));
        }
        if self.limits.salary_multiplier <= Decimal::ZERO {
            return Err(invalid("salary multiplier must be positive".to_string()));
        }
        if self.origination.days_per_month == 0 {
            return Err(invalid("days per month must be positive".to_string()));
        }

        Ok(())
    }
}

fn invalid(message: String) -> LedgerError {
    LedgerError::InvalidConfiguration { message }
}
