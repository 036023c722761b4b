use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use log::trace;

use crate::errors::{LedgerError, Result};
use crate::store::{LedgerStore, LedgerTxn};
use crate::types::{Customer, CustomerId, Loan, LoanId, NewCustomer, NewLoan};

#[derive(Debug, Default)]
struct Tables {
    customers: BTreeMap<CustomerId, Customer>,
    loans: BTreeMap<LoanId, Loan>,
    last_customer_id: u64,
    last_loan_id: u64,
}

/// in-process ledger store.
///
/// a transaction holds the table lock until it is committed or dropped, so
/// transactions against the same ledger are serialized.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    tables: Mutex<Tables>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer_count(&self) -> Result<usize> {
        Ok(self.lock()?.customers.len())
    }

    pub fn loan_count(&self) -> Result<usize> {
        Ok(self.lock()?.loans.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| LedgerError::StoreUnavailable {
            message: "ledger lock poisoned".to_string(),
        })
    }
}

impl LedgerStore for InMemoryLedger {
    fn begin(&self) -> Result<Box<dyn LedgerTxn + '_>> {
        let tables = self.lock()?;
        let last_customer_id = tables.last_customer_id;
        let last_loan_id = tables.last_loan_id;
        Ok(Box::new(MemoryTxn {
            tables,
            customers: BTreeMap::new(),
            loans: BTreeMap::new(),
            last_customer_id,
            last_loan_id,
        }))
    }
}

/// staged writes over the locked tables
struct MemoryTxn<'a> {
    tables: MutexGuard<'a, Tables>,
    customers: BTreeMap<CustomerId, Customer>,
    loans: BTreeMap<LoanId, Loan>,
    last_customer_id: u64,
    last_loan_id: u64,
}

impl MemoryTxn<'_> {
    fn customer(&self, id: CustomerId) -> Option<&Customer> {
        self.customers.get(&id).or_else(|| self.tables.customers.get(&id))
    }

    fn loan(&self, id: LoanId) -> Option<&Loan> {
        self.loans.get(&id).or_else(|| self.tables.loans.get(&id))
    }
}

impl LedgerTxn for MemoryTxn<'_> {
    fn get_customer(&self, id: CustomerId) -> Result<Customer> {
        self.customer(id)
            .cloned()
            .ok_or(LedgerError::CustomerNotFound { id })
    }

    fn find_customer_by_phone(&self, phone_number: u64) -> Result<Option<Customer>> {
        let staged = self
            .customers
            .values()
            .find(|c| c.phone_number == phone_number);
        if let Some(customer) = staged {
            return Ok(Some(customer.clone()));
        }

        Ok(self
            .tables
            .customers
            .values()
            .find(|c| c.phone_number == phone_number)
            .cloned())
    }

    fn insert_customer(&mut self, customer: NewCustomer) -> Result<Customer> {
        if self.find_customer_by_phone(customer.phone_number)?.is_some() {
            return Err(LedgerError::DuplicatePhoneNumber {
                phone_number: customer.phone_number,
            });
        }

        self.last_customer_id += 1;
        let id = CustomerId(self.last_customer_id);
        let customer = customer.into_customer(id);
        self.customers.insert(id, customer.clone());
        trace!("staged customer {}", id);
        Ok(customer)
    }

    fn list_loans(&self, customer_id: CustomerId) -> Result<Vec<Loan>> {
        let mut merged: BTreeMap<LoanId, &Loan> = self
            .tables
            .loans
            .values()
            .filter(|l| l.customer_id == customer_id)
            .map(|l| (l.loan_id, l))
            .collect();
        merged.extend(
            self.loans
                .values()
                .filter(|l| l.customer_id == customer_id)
                .map(|l| (l.loan_id, l)),
        );
        Ok(merged.into_values().cloned().collect())
    }

    fn get_loan(&self, customer_id: CustomerId, loan_id: LoanId) -> Result<Loan> {
        self.loan(loan_id)
            .filter(|l| l.customer_id == customer_id)
            .cloned()
            .ok_or(LedgerError::LoanNotFound {
                customer_id,
                loan_id,
            })
    }

    fn create_loan(&mut self, loan: NewLoan) -> Result<Loan> {
        if self.customer(loan.customer_id).is_none() {
            return Err(LedgerError::CustomerNotFound {
                id: loan.customer_id,
            });
        }

        self.last_loan_id += 1;
        let id = LoanId(self.last_loan_id);
        let loan = loan.into_loan(id);
        self.loans.insert(id, loan.clone());
        trace!("staged loan {} for customer {}", id, loan.customer_id);
        Ok(loan)
    }

    fn save_customer(&mut self, customer: &Customer) -> Result<Customer> {
        let id = customer.customer_id;
        let stored = self.customer(id).ok_or(LedgerError::CustomerNotFound { id })?;
        if stored.version != customer.version {
            return Err(LedgerError::ConcurrentModification {
                record: format!("customer {}", id),
                expected: customer.version,
                found: stored.version,
            });
        }

        let mut saved = customer.clone();
        saved.version += 1;
        self.customers.insert(id, saved.clone());
        Ok(saved)
    }

    fn save_loan(&mut self, loan: &Loan) -> Result<Loan> {
        let stored = self
            .loan(loan.loan_id)
            .filter(|l| l.customer_id == loan.customer_id)
            .ok_or(LedgerError::LoanNotFound {
                customer_id: loan.customer_id,
                loan_id: loan.loan_id,
            })?;
        if stored.version != loan.version {
            return Err(LedgerError::ConcurrentModification {
                record: format!("loan {}", loan.loan_id),
                expected: loan.version,
                found: stored.version,
            });
        }

        let mut saved = loan.clone();
        saved.version += 1;
        self.loans.insert(saved.loan_id, saved.clone());
        Ok(saved)
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTxn {
            mut tables,
            customers,
            loans,
            last_customer_id,
            last_loan_id,
        } = *self;

        trace!(
            "committing {} customers, {} loans",
            customers.len(),
            loans.len()
        );
        tables.customers.extend(customers);
        tables.loans.extend(loans);
        tables.last_customer_id = last_customer_id;
        tables.last_loan_id = last_loan_id;
        Ok(())
    }
}
