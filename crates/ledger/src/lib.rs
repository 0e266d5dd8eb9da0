// Rust guideline compliant 2026-10-12

//! Ledger store -- owns accounts, payments and favorites, and implements the
//! `PaymentSource` port for the aggregation engine.
//!
//! Entry points: [`Ledger::register_account`], [`Ledger::deposit`],
//! [`Ledger::pay`], [`Ledger::reject`], [`Ledger::repeat`],
//! [`Ledger::favorite_payment`], [`Ledger::pay_from_favorite`].
//! Flat-file export/import lives in [`dump`].

pub mod dump;

use std::sync::Arc;

use domain::{
    Account, AccountId, Favorite, FavoriteId, LedgerError, Money, Payment, PaymentCategory,
    PaymentId, PaymentSource, PaymentStatus, Phone,
};

pub use dump::DumpError;

/// Characters that delimit fields and records in the dump formats.
const RESERVED: &[char] = &[';', '|', '\n', '\r'];

/// Refuse text that the dump codecs could not read back.
pub(crate) fn check_field(field: &'static str, value: &str) -> Result<(), LedgerError> {
    if value.contains(RESERVED) {
        return Err(LedgerError::ReservedCharacter { field, value: value.to_owned() });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// In-memory wallet ledger.
///
/// Payments are kept in insertion order; the aggregation engine partitions
/// them by position. Every [`PaymentSource::current_payments`] call hands out
/// a fresh copy, so aggregation never observes later mutations.
#[derive(Debug, Default)]
pub struct Ledger {
    next_account_id: AccountId,
    accounts: Vec<Account>,
    payments: Vec<Payment>,
    favorites: Vec<Favorite>,
}

impl Ledger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered accounts, in registration order.
    #[must_use]
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// Payment log, in insertion order.
    #[must_use]
    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    /// Saved favorites, in creation order.
    #[must_use]
    pub fn favorites(&self) -> &[Favorite] {
        &self.favorites
    }

    /// Register a new account with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PhoneRegistered`] when `phone` is already in use,
    /// or [`LedgerError::ReservedCharacter`] when it contains `;`, `|` or a
    /// line break.
    pub fn register_account(&mut self, phone: Phone) -> Result<Account, LedgerError> {
        check_field("phone", phone.as_str())?;
        if self.accounts.iter().any(|a| a.phone == phone) {
            return Err(LedgerError::PhoneRegistered { phone });
        }

        self.next_account_id += 1;
        let account = Account {
            id: self.next_account_id,
            phone,
            balance: Money::ZERO,
        };
        tracing::info!(account_id = account.id, phone = %account.phone, "ledger.account.registered");
        self.accounts.push(account.clone());
        Ok(account)
    }

    /// Look up an account by id.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AccountNotFound`] when no account has this id.
    pub fn find_account_by_id(&self, id: AccountId) -> Result<&Account, LedgerError> {
        self.accounts
            .iter()
            .find(|a| a.id == id)
            .ok_or(LedgerError::AccountNotFound { id })
    }

    fn account_mut(&mut self, id: AccountId) -> Result<&mut Account, LedgerError> {
        self.accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(LedgerError::AccountNotFound { id })
    }

    /// Credit `amount` to an account. Deposits are not recorded as payments.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AmountMustBePositive`] for a non-positive amount,
    /// [`LedgerError::AccountNotFound`] for an unknown account, or
    /// [`LedgerError::BalanceOverflow`] when the balance cannot hold the sum.
    pub fn deposit(&mut self, id: AccountId, amount: Money) -> Result<(), LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::AmountMustBePositive { amount });
        }
        let account = self.account_mut(id)?;
        credit(account, amount)?;
        tracing::debug!(account_id = id, %amount, balance = %account.balance, "ledger.deposit");
        Ok(())
    }

    /// Debit `amount` from an account and append an `InProgress` payment.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AmountMustBePositive`],
    /// [`LedgerError::ReservedCharacter`], [`LedgerError::AccountNotFound`] or
    /// [`LedgerError::NotEnoughBalance`].
    pub fn pay(
        &mut self,
        id: AccountId,
        amount: Money,
        category: PaymentCategory,
    ) -> Result<Payment, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::AmountMustBePositive { amount });
        }
        check_field("category", category.as_str())?;
        let account = self.account_mut(id)?;
        if account.balance < amount {
            return Err(LedgerError::NotEnoughBalance {
                required: amount,
                available: account.balance,
            });
        }
        account.balance -= amount;

        let payment = Payment {
            id: uuid::Uuid::new_v4(),
            account_id: id,
            amount,
            category,
            status: PaymentStatus::InProgress,
        };
        tracing::debug!(payment_id = %payment.id, account_id = id, %amount, "ledger.payment.created");
        self.payments.push(payment.clone());
        Ok(payment)
    }

    /// Look up a payment by id.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PaymentNotFound`] when no payment has this id.
    pub fn find_payment_by_id(&self, id: PaymentId) -> Result<&Payment, LedgerError> {
        self.payments
            .iter()
            .find(|p| p.id == id)
            .ok_or(LedgerError::PaymentNotFound { id })
    }

    /// Mark a payment as failed and refund its amount to the paying account.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PaymentNotFound`],
    /// [`LedgerError::PaymentAlreadyFailed`] when the payment was already
    /// rejected, [`LedgerError::AccountNotFound`] when its account is gone, or
    /// [`LedgerError::BalanceOverflow`] when the refund does not fit.
    pub fn reject(&mut self, id: PaymentId) -> Result<(), LedgerError> {
        let index = self
            .payments
            .iter()
            .position(|p| p.id == id)
            .ok_or(LedgerError::PaymentNotFound { id })?;
        let (account_id, amount) = match &self.payments[index] {
            p if p.status == PaymentStatus::Fail => {
                return Err(LedgerError::PaymentAlreadyFailed { id });
            }
            p => (p.account_id, p.amount),
        };

        // Resolve the account before touching the payment so a failure leaves both untouched.
        let account = self.account_mut(account_id)?;
        credit(account, amount)?;
        self.payments[index].status = PaymentStatus::Fail;
        tracing::info!(payment_id = %id, account_id, %amount, "ledger.payment.rejected");
        Ok(())
    }

    /// Pay again with the account, amount and category of an existing payment.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PaymentNotFound`] or any error from [`pay`](Self::pay).
    pub fn repeat(&mut self, id: PaymentId) -> Result<Payment, LedgerError> {
        let source = self.find_payment_by_id(id)?;
        let (account_id, amount, category) =
            (source.account_id, source.amount, source.category.clone());
        self.pay(account_id, amount, category)
    }

    /// Save an existing payment as a named favorite.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::PaymentNotFound`] when no payment has this id,
    /// or [`LedgerError::ReservedCharacter`] for a name the dump cannot hold.
    pub fn favorite_payment(
        &mut self,
        id: PaymentId,
        name: impl Into<String>,
    ) -> Result<Favorite, LedgerError> {
        let name = name.into();
        check_field("name", &name)?;
        let payment = self.find_payment_by_id(id)?;
        let favorite = Favorite {
            id: uuid::Uuid::new_v4(),
            account_id: payment.account_id,
            name,
            amount: payment.amount,
            category: payment.category.clone(),
        };
        tracing::debug!(favorite_id = %favorite.id, payment_id = %id, "ledger.favorite.created");
        self.favorites.push(favorite.clone());
        Ok(favorite)
    }

    /// Look up a favorite by id.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::FavoriteNotFound`] when no favorite has this id.
    pub fn find_favorite_by_id(&self, id: FavoriteId) -> Result<&Favorite, LedgerError> {
        self.favorites
            .iter()
            .find(|f| f.id == id)
            .ok_or(LedgerError::FavoriteNotFound { id })
    }

    /// Replay a favorite as a new payment.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::FavoriteNotFound`] or any error from [`pay`](Self::pay).
    pub fn pay_from_favorite(&mut self, id: FavoriteId) -> Result<Payment, LedgerError> {
        let favorite = self.find_favorite_by_id(id)?;
        let (account_id, amount, category) =
            (favorite.account_id, favorite.amount, favorite.category.clone());
        self.pay(account_id, amount, category)
    }

    /// Insert or overwrite an account by id; keeps the id sequence ahead of it.
    pub(crate) fn upsert_account(&mut self, account: Account) {
        self.next_account_id = self.next_account_id.max(account.id);
        match self.accounts.iter_mut().find(|a| a.id == account.id) {
            Some(existing) => *existing = account,
            None => self.accounts.push(account),
        }
    }

    pub(crate) fn upsert_payment(&mut self, payment: Payment) {
        match self.payments.iter_mut().find(|p| p.id == payment.id) {
            Some(existing) => *existing = payment,
            None => self.payments.push(payment),
        }
    }

    pub(crate) fn upsert_favorite(&mut self, favorite: Favorite) {
        match self.favorites.iter_mut().find(|f| f.id == favorite.id) {
            Some(existing) => *existing = favorite,
            None => self.favorites.push(favorite),
        }
    }
}

/// Add `amount` to the balance, leaving it untouched on overflow.
fn credit(account: &mut Account, amount: Money) -> Result<(), LedgerError> {
    account.balance = account
        .balance
        .checked_add(amount)
        .ok_or(LedgerError::BalanceOverflow {
            id: account.id,
            balance: account.balance,
            amount,
        })?;
    Ok(())
}

impl PaymentSource for Ledger {
    fn current_payments(&self) -> Arc<[Payment]> {
        Arc::from(self.payments.as_slice())
    }

    fn find_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.find_account_by_id(id).cloned()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
