use chrono::NaiveDate;
use hourglass_rs::{SafeTimeProvider, TimeSource};
use log::{debug, info, warn};

use crate::config::EngineConfig;
use crate::decision::{LoanDecision, LoanDecisionEngine};
use crate::emi::calculate_emi;
use crate::errors::Result;
use crate::events::{EventStore, LedgerEvent, RecordedEvent};
use crate::lifecycle::{validate_terms, LifecycleManager};
use crate::scoring::{CreditScore, CreditScorer, TenureBasis};
use crate::store::LedgerStore;
use crate::types::{Customer, CustomerId, Loan, LoanTerms};
use crate::views::{
    CustomerLoans, CustomerProfile, EligibilityRequest, EligibilityResponse, LoanCreated,
    LoanRequest, LoanView, PaymentReceipt, PaymentRequest, RegisteredCustomer,
    RegistrationRequest,
};

/// entry point for the admin api: scoring, decisions and loan bookkeeping
/// over a ledger store
pub struct LoanDesk<S: LedgerStore> {
    store: S,
    config: EngineConfig,
    scorer: CreditScorer,
    decisions: LoanDecisionEngine,
    lifecycle: LifecycleManager,
    time: SafeTimeProvider,
    events: EventStore,
}

impl<S: LedgerStore> LoanDesk<S> {
    pub fn new(store: S, config: EngineConfig, time: SafeTimeProvider) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            scorer: CreditScorer::new(config.scoring.clone()),
            decisions: LoanDecisionEngine::new(config.decision.clone()),
            lifecycle: LifecycleManager::new(config.limits.clone(), config.origination.clone()),
            config,
            time,
            events: EventStore::new(),
        })
    }

    /// desk reading the wall clock
    pub fn with_system_time(store: S, config: EngineConfig) -> Result<Self> {
        Self::new(store, config, SafeTimeProvider::new(TimeSource::System))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn time(&self) -> &SafeTimeProvider {
        &self.time
    }

    pub fn events(&self) -> &[RecordedEvent] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<RecordedEvent> {
        self.events.take_events()
    }

    fn today(&self) -> NaiveDate {
        self.time.now().date_naive()
    }

    /// register a customer and fix their approved limit
    pub fn register_customer(&mut self, request: RegistrationRequest) -> Result<RegisteredCustomer> {
        let new_customer = self.lifecycle.register(request.into())?;

        let mut txn = self.store.begin()?;
        let customer = txn.insert_customer(new_customer)?;
        txn.commit()?;

        info!(
            "registered customer {} ({}) with approved limit {}",
            customer.customer_id,
            customer.full_name(),
            customer.approved_limit
        );
        self.events.emit(
            LedgerEvent::CustomerRegistered {
                customer_id: customer.customer_id,
                approved_limit: customer.approved_limit,
            },
            self.time.now(),
        );

        Ok(RegisteredCustomer::from(&customer))
    }

    /// score a customer and decide on the requested terms. nothing is persisted
    pub fn check_eligibility(&mut self, request: EligibilityRequest) -> Result<EligibilityResponse> {
        let terms = request.terms();
        validate_terms(&terms)?;

        let (customer, loans) = self.load(request.customer_id)?;
        let decision = self.evaluate(&customer, &loans, &terms)?;

        info!(
            "eligibility for customer {}: approval {} at {} (score {})",
            customer.customer_id,
            decision.approval,
            decision.corrected_interest_rate,
            decision.credit_score.round_dp(2)
        );
        self.events.emit(
            LedgerEvent::EligibilityChecked {
                customer_id: customer.customer_id,
                requested_amount: terms.loan_amount,
                credit_score: decision.credit_score,
                approval: decision.approval,
                corrected_interest_rate: decision.corrected_interest_rate,
            },
            self.time.now(),
        );

        Ok(EligibilityResponse::from(&decision))
    }

    /// score and decide against an already loaded customer and history
    pub fn evaluate(
        &self,
        customer: &Customer,
        loans: &[Loan],
        terms: &LoanTerms,
    ) -> Result<LoanDecision> {
        let score = self
            .scorer
            .score(customer, loans, TenureBasis::Requested(terms.tenure), self.today())?;
        let emi = calculate_emi(terms.loan_amount, terms.interest_rate, terms.tenure)?;
        Ok(self.decisions.decide(customer, terms, emi, &score))
    }

    /// book a loan and add its amount to the customer's debt
    pub fn create_loan(&mut self, request: LoanRequest) -> Result<LoanCreated> {
        let terms = request.terms();
        let today = self.today();

        let new_loan =
            self.lifecycle
                .originate(request.customer_id, &terms, request.monthly_payment, today)?;

        let mut txn = self.store.begin()?;
        let customer = txn.get_customer(request.customer_id)?;
        let customer = self.lifecycle.charge(&customer, new_loan.loan_amount)?;
        let loan = txn.create_loan(new_loan)?;
        let customer = txn.save_customer(&customer)?;
        txn.commit()?;

        info!(
            "loan {} of {} over {} months booked for customer {}",
            loan.loan_id, loan.loan_amount, loan.tenure, customer.customer_id
        );
        if customer.is_over_limit() {
            warn!(
                "customer {} debt {} now exceeds approved limit {}",
                customer.customer_id, customer.current_debt, customer.approved_limit
            );
        }
        self.events.emit(
            LedgerEvent::LoanOriginated {
                customer_id: customer.customer_id,
                loan_id: loan.loan_id,
                amount: loan.loan_amount,
                tenure: loan.tenure,
                new_debt: customer.current_debt,
            },
            self.time.now(),
        );

        Ok(LoanCreated {
            loan_id: loan.loan_id,
            customer_id: customer.customer_id,
            message: "Loan created successfully".to_string(),
        })
    }

    /// apply a payment to one of the customer's loans
    pub fn apply_payment(&mut self, request: PaymentRequest) -> Result<PaymentReceipt> {
        let mut txn = self.store.begin()?;
        let loan = txn.get_loan(request.customer_id, request.loan_id)?;
        let customer = txn.get_customer(request.customer_id)?;
        let outcome = self.lifecycle.apply_payment(&customer, &loan, request.amount)?;
        let loan = txn.save_loan(&outcome.loan)?;
        let customer = txn.save_customer(&outcome.customer)?;
        txn.commit()?;

        if !outcome.emi_counted {
            debug!(
                "loan {} already has all {} emis counted",
                loan.loan_id, loan.tenure
            );
        }
        if outcome.unapplied.is_positive() {
            debug!(
                "payment on loan {} exceeded debt by {}",
                loan.loan_id, outcome.unapplied
            );
        }
        info!(
            "payment of {} on loan {}: remaining debt {}, emis paid {}",
            outcome.applied + outcome.unapplied,
            loan.loan_id,
            customer.current_debt,
            loan.emis_paid_on_time
        );
        self.events.emit(
            LedgerEvent::PaymentApplied {
                customer_id: customer.customer_id,
                loan_id: loan.loan_id,
                amount: outcome.applied + outcome.unapplied,
                unapplied: outcome.unapplied,
                remaining_debt: customer.current_debt,
                emis_paid: loan.emis_paid_on_time,
            },
            self.time.now(),
        );

        Ok(PaymentReceipt {
            message: "Payment recorded successfully".to_string(),
            customer_id: customer.customer_id,
            loan_id: loan.loan_id,
            remaining_debt: customer.current_debt,
            emis_paid: loan.emis_paid_on_time,
        })
    }

    /// customer details with a credit score normalized by their longest loan
    pub fn customer_profile(&self, customer_id: CustomerId) -> Result<CustomerProfile> {
        let (customer, loans) = self.load(customer_id)?;
        let score = self.profile_score(&customer, &loans)?;
        Ok(CustomerProfile::new(&customer, score.rounded()))
    }

    pub fn profile_score(&self, customer: &Customer, loans: &[Loan]) -> Result<CreditScore> {
        self.scorer
            .score(customer, loans, TenureBasis::LongestLoan, self.today())
    }

    pub fn view_loans(&self, customer_id: CustomerId) -> Result<CustomerLoans> {
        let (customer, loans) = self.load(customer_id)?;
        Ok(CustomerLoans {
            customer_id: customer.customer_id,
            loans: loans.iter().map(LoanView::from).collect(),
        })
    }

    /// read a customer and their loans in one transaction
    fn load(&self, customer_id: CustomerId) -> Result<(Customer, Vec<Loan>)> {
        let txn = self.store.begin()?;
        let customer = txn.get_customer(customer_id)?;
        let loans = txn.list_loans(customer_id)?;
        Ok((customer, loans))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::errors::{ErrorKind, LedgerError};
    use crate::store::InMemoryLedger;
    use crate::types::LoanId;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn desk() -> LoanDesk<InMemoryLedger> {
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap(),
        ));
        LoanDesk::new(InMemoryLedger::new(), EngineConfig::default(), time).unwrap()
    }

    fn register(desk: &mut LoanDesk<InMemoryLedger>, phone: u64, income: i64) -> CustomerId {
        desk.register_customer(RegistrationRequest {
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            age: 30,
            phone_number: phone,
            monthly_income: Money::from_major(income),
        })
        .unwrap()
        .customer_id
    }

    fn loan_request(customer_id: CustomerId, amount: i64, tenure: u32) -> LoanRequest {
        LoanRequest {
            customer_id,
            loan_amount: Money::from_major(amount),
            interest_rate: dec!(10),
            tenure,
            monthly_payment: Money::from_str_exact("4395.79").unwrap(),
        }
    }

    #[test]
    fn test_register_customer() {
        let mut desk = desk();
        let registered = desk
            .register_customer(RegistrationRequest {
                first_name: "John".to_string(),
                last_name: "Doe".to_string(),
                age: 30,
                phone_number: 1_234_567_890,
                monthly_income: Money::from_major(50_000),
            })
            .unwrap();
        assert_eq!(registered.customer_id, CustomerId(1));
        assert_eq!(registered.approved_limit, Money::from_major(1_800_000));
        assert_eq!(desk.events().len(), 1);
    }

    #[test]
    fn test_duplicate_phone_is_invalid_input() {
        let mut desk = desk();
        register(&mut desk, 99, 50_000);
        let err = desk
            .register_customer(RegistrationRequest {
                first_name: "Other".to_string(),
                last_name: "Person".to_string(),
                age: 40,
                phone_number: 99,
                monthly_income: Money::from_major(70_000),
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_check_eligibility_new_customer() {
        let mut desk = desk();
        let id = register(&mut desk, 1, 50_000);
        let response = desk
            .check_eligibility(EligibilityRequest {
                customer_id: id,
                loan_amount: Money::from_major(100_000),
                interest_rate: dec!(10),
                tenure: 12,
            })
            .unwrap();
        assert!(response.approval);
        assert_eq!(response.credit_score, dec!(100));
        assert_eq!(response.interest_rate, dec!(10));
        assert_eq!(response.corrected_interest_rate, dec!(10));
        assert_eq!(response.monthly_installment, Money::from_str_exact("8791.59").unwrap());
    }

    #[test]
    fn test_check_eligibility_unknown_customer() {
        let mut desk = desk();
        let err = desk
            .check_eligibility(EligibilityRequest {
                customer_id: CustomerId(404),
                loan_amount: Money::from_major(1_000),
                interest_rate: dec!(10),
                tenure: 12,
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_check_eligibility_rejects_unaffordable_emi() {
        let mut desk = desk();
        let id = register(&mut desk, 1, 10_000);
        let response = desk
            .check_eligibility(EligibilityRequest {
                customer_id: id,
                loan_amount: Money::from_major(100_000),
                interest_rate: dec!(10),
                tenure: 12,
            })
            .unwrap();
        assert!(!response.approval);
        assert_eq!(response.reason.as_deref(), Some("EMI exceeds affordability threshold"));
    }

    #[test]
    fn test_create_loan_books_debt() {
        let mut desk = desk();
        let id = register(&mut desk, 1, 50_000);
        let created = desk.create_loan(loan_request(id, 50_000, 12)).unwrap();
        assert_eq!(created.loan_id, LoanId(1));
        assert_eq!(created.customer_id, id);

        let profile = desk.customer_profile(id).unwrap();
        assert_eq!(profile.current_debt, Money::from_major(50_000));

        let loans = desk.view_loans(id).unwrap();
        assert_eq!(loans.loans.len(), 1);
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        assert_eq!(loans.loans[0].start_date, start);
        assert_eq!(loans.loans[0].end_date, start + Duration::days(360));
        assert_eq!(loans.loans[0].emis_paid_on_time, 0);
    }

    #[test]
    fn test_create_loan_for_unknown_customer() {
        let mut desk = desk();
        let err = desk.create_loan(loan_request(CustomerId(8), 1_000, 6)).unwrap_err();
        assert!(matches!(err, LedgerError::CustomerNotFound { .. }));
        assert_eq!(desk.store().loan_count().unwrap(), 0);
    }

    #[test]
    fn test_tenure_past_last_date_leaves_ledger_usable() {
        let mut desk = desk();
        let id = register(&mut desk, 1, 50_000);

        let err = desk.create_loan(loan_request(id, 50_000, 4_000_000)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTenure { .. }));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        assert_eq!(desk.customer_profile(id).unwrap().current_debt, Money::ZERO);
        assert_eq!(desk.store().loan_count().unwrap(), 0);
        desk.create_loan(loan_request(id, 50_000, 12)).unwrap();
    }

    #[test]
    fn test_oversized_loan_leaves_ledger_usable() {
        let mut desk = desk();
        let id = register(&mut desk, 1, 50_000);
        let huge = Money::from_str_exact("50000000000000000000000000000").unwrap();
        let oversized = LoanRequest {
            loan_amount: huge,
            ..loan_request(id, 0, 12)
        };

        let first = desk.create_loan(oversized.clone()).unwrap();
        let err = desk.create_loan(oversized).unwrap_err();
        assert!(matches!(err, LedgerError::CalculationError { .. }));
        assert_eq!(desk.store().loan_count().unwrap(), 1);

        let receipt = desk
            .apply_payment(PaymentRequest {
                customer_id: id,
                loan_id: first.loan_id,
                amount: Some(Money::from_major(1_000)),
            })
            .unwrap();
        assert_eq!(receipt.emis_paid, 1);
        assert_eq!(receipt.remaining_debt, huge - Money::from_major(1_000));
    }

    #[test]
    fn test_oversized_income_is_rejected() {
        let mut desk = desk();
        let err = desk
            .register_customer(RegistrationRequest {
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                age: 30,
                phone_number: 1,
                monthly_income: Money::from_str_exact("3000000000000000000000000000").unwrap(),
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::CalculationError { .. }));
        assert_eq!(desk.store().customer_count().unwrap(), 0);

        register(&mut desk, 1, 50_000);
        assert_eq!(desk.store().customer_count().unwrap(), 1);
    }

    #[test]
    fn test_make_payment() {
        let mut desk = desk();
        let id = register(&mut desk, 1, 50_000);
        let loan = desk.create_loan(loan_request(id, 50_000, 12)).unwrap();

        let receipt = desk
            .apply_payment(PaymentRequest {
                customer_id: id,
                loan_id: loan.loan_id,
                amount: Some(Money::from_major(5_000)),
            })
            .unwrap();
        assert_eq!(receipt.emis_paid, 1);
        assert_eq!(receipt.remaining_debt, Money::from_major(45_000));
    }

    #[test]
    fn test_payment_rejections_leave_ledger_untouched() {
        let mut desk = desk();
        let id = register(&mut desk, 1, 50_000);
        let other = register(&mut desk, 2, 50_000);
        let loan = desk.create_loan(loan_request(id, 50_000, 12)).unwrap();

        let err = desk
            .apply_payment(PaymentRequest {
                customer_id: other,
                loan_id: loan.loan_id,
                amount: Some(Money::from_major(100)),
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = desk
            .apply_payment(PaymentRequest {
                customer_id: id,
                loan_id: loan.loan_id,
                amount: None,
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let loans = desk.view_loans(id).unwrap();
        assert_eq!(loans.loans[0].emis_paid_on_time, 0);
        assert_eq!(
            desk.customer_profile(id).unwrap().current_debt,
            Money::from_major(50_000)
        );
    }

    #[test]
    fn test_profile_score_uses_longest_tenure() {
        let mut desk = desk();
        let id = register(&mut desk, 1, 50_000);
        desk.create_loan(loan_request(id, 100_000, 12)).unwrap();
        desk.create_loan(loan_request(id, 100_000, 24)).unwrap();
        let first = LoanId(1);
        for _ in 0..6 {
            desk.apply_payment(PaymentRequest {
                customer_id: id,
                loan_id: first,
                amount: Some(Money::from_major(1_000)),
            })
            .unwrap();
        }

        // ratio 6 / (2 * 24) = 0.125 -> +12.5
        // 100 - 4 + 12.5 - 10 + 2 = 100.5
        let profile = desk.customer_profile(id).unwrap();
        assert_eq!(profile.credit_score, dec!(100.5));
    }

    #[test]
    fn test_events_follow_operations() {
        let mut desk = desk();
        let id = register(&mut desk, 1, 50_000);
        let loan = desk.create_loan(loan_request(id, 50_000, 12)).unwrap();
        desk.apply_payment(PaymentRequest {
            customer_id: id,
            loan_id: loan.loan_id,
            amount: Some(Money::from_major(60_000)),
        })
        .unwrap();

        let events = desk.take_events();
        assert_eq!(events.len(), 3);
        match &events[2].event {
            LedgerEvent::PaymentApplied {
                amount,
                unapplied,
                remaining_debt,
                ..
            } => {
                assert_eq!(*amount, Money::from_major(60_000));
                assert_eq!(*unapplied, Money::from_major(10_000));
                assert_eq!(*remaining_debt, Money::ZERO);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(desk.events().is_empty());
    }
}
