pub mod memory;

use std::sync::Arc;

use crate::errors::Result;
use crate::types::{Customer, CustomerId, Loan, LoanId, NewCustomer, NewLoan};

pub use memory::InMemoryLedger;

/// persistence for customer and loan records.
///
/// every read and write goes through a transaction. writes are staged and only
/// become visible on [`LedgerTxn::commit`]; dropping a transaction discards them.
pub trait LedgerStore {
    fn begin(&self) -> Result<Box<dyn LedgerTxn + '_>>;
}

/// unit of work against a ledger store
pub trait LedgerTxn {
    fn get_customer(&self, id: CustomerId) -> Result<Customer>;

    fn find_customer_by_phone(&self, phone_number: u64) -> Result<Option<Customer>>;

    /// persist a new customer, assigning its id
    fn insert_customer(&mut self, customer: NewCustomer) -> Result<Customer>;

    /// all loans owned by the customer, ordered by id
    fn list_loans(&self, customer_id: CustomerId) -> Result<Vec<Loan>>;

    /// loan scoped to its owner; a loan of another customer is not found
    fn get_loan(&self, customer_id: CustomerId, loan_id: LoanId) -> Result<Loan>;

    /// persist a new loan, assigning its id
    fn create_loan(&mut self, loan: NewLoan) -> Result<Loan>;

    /// save a modified customer. fails with a conflict when the stored version
    /// differs from `customer.version`; returns the record with its new version
    fn save_customer(&mut self, customer: &Customer) -> Result<Customer>;

    /// save a modified loan, version-checked like [`LedgerTxn::save_customer`]
    fn save_loan(&mut self, loan: &Loan) -> Result<Loan>;

    fn commit(self: Box<Self>) -> Result<()>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for Arc<S> {
    fn begin(&self) -> Result<Box<dyn LedgerTxn + '_>> {
        (**self).begin()
    }
}

impl<S: LedgerStore + ?Sized> LedgerStore for &S {
    fn begin(&self) -> Result<Box<dyn LedgerTxn + '_>> {
        (**self).begin()
    }
}
