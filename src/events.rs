use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::types::{CustomerId, LoanId};

/// all events that can be emitted by the loan desk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    CustomerRegistered {
        customer_id: CustomerId,
        approved_limit: Money,
    },
    EligibilityChecked {
        customer_id: CustomerId,
        requested_amount: Money,
        credit_score: Decimal,
        approval: bool,
        corrected_interest_rate: Rate,
    },
    LoanOriginated {
        customer_id: CustomerId,
        loan_id: LoanId,
        amount: Money,
        tenure: u32,
        new_debt: Money,
    },
    PaymentApplied {
        customer_id: CustomerId,
        loan_id: LoanId,
        amount: Money,
        /// above outstanding debt, dropped
        unapplied: Money,
        remaining_debt: Money,
        emis_paid: u32,
    },
}

/// event with its identity and time of recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub event_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub event: LedgerEvent,
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<RecordedEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: LedgerEvent, at: DateTime<Utc>) {
        self.events.push(RecordedEvent {
            event_id: Uuid::new_v4(),
            recorded_at: at,
            event,
        });
    }

    pub fn take_events(&mut self) -> Vec<RecordedEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }
}
