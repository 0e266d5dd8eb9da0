// Rust guideline compliant 2026-10-14

//! Test-only `PaymentSource` adapter backed by a plain vector.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use domain::{
    Account, AccountId, LedgerError, Money, Payment, PaymentCategory, PaymentSource,
    PaymentStatus, Phone,
};

/// Vector-backed source that counts how often a snapshot was taken.
#[derive(Debug, Default)]
pub(crate) struct VecSource {
    pub(crate) accounts: Vec<Account>,
    pub(crate) payments: Vec<Payment>,
    snapshots: AtomicUsize,
}

impl VecSource {
    /// One payment per amount, alternating across `account_count` accounts (ids from 1).
    pub(crate) fn with_amounts(account_count: i64, amounts: &[i64]) -> Self {
        let accounts = (1..=account_count)
            .map(|id| Account {
                id,
                phone: Phone::from(format!("+9920000{id:05}")),
                balance: Money::ZERO,
            })
            .collect();
        let payments = amounts
            .iter()
            .zip((1..=account_count.max(1)).cycle())
            .map(|(&amount, account_id)| make_payment(account_id, amount))
            .collect();
        Self { accounts, payments, snapshots: AtomicUsize::new(0) }
    }

    /// Number of `current_payments` calls so far.
    pub(crate) fn snapshot_count(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }

    /// Plain sequential sum, the reference result.
    pub(crate) fn sequential_sum(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }
}

impl PaymentSource for VecSource {
    fn current_payments(&self) -> Arc<[Payment]> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        Arc::from(self.payments.as_slice())
    }

    fn find_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.accounts
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound { id })
    }
}

pub(crate) fn make_payment(account_id: AccountId, amount: i64) -> Payment {
    Payment {
        id: uuid::Uuid::new_v4(),
        account_id,
        amount: Money::new(amount),
        category: PaymentCategory::from("test"),
        status: PaymentStatus::InProgress,
    }
}
