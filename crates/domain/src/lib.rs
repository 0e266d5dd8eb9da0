// Rust guideline compliant 2026-10-12

//! Shared domain types for the wallet ledger.
//!
//! Defines `Account`, `Payment`, `Favorite`, `Progress`, the `Money` amount
//! type, `LedgerError`, and the hexagonal `PaymentSource` port consumed by the
//! aggregation engine. The ledger and aggregator crates both depend on this
//! crate; nothing else is imported here.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;
use std::sync::Arc;

/// Sequential account identifier, starting at 1.
pub type AccountId = i64;

/// Opaque payment token.
pub type PaymentId = uuid::Uuid;

/// Opaque favorite token.
pub type FavoriteId = uuid::Uuid;

// ---------------------------------------------------------------------------
// Money
// ---------------------------------------------------------------------------

/// Amount in minor currency units (e.g. dirams, cents).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Wrap a raw minor-unit value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Raw minor-unit value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// `true` when strictly greater than zero.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Addition that returns `None` instead of overflowing.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Subtraction that returns `None` instead of overflowing.
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Sum of `amounts`, or `None` as soon as the running total overflows.
    pub fn checked_sum<I>(amounts: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts.into_iter().try_fold(Self::ZERO, Self::checked_add)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// ---------------------------------------------------------------------------
// String newtypes
// ---------------------------------------------------------------------------

/// Account phone number; unique across accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Phone(String);

impl Phone {
    /// Borrow the phone number as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Phone {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Phone {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free-form payment category tag (e.g. `"auto"`, `"food"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaymentCategory(String);

impl PaymentCategory {
    /// Borrow the category as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PaymentCategory {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for PaymentCategory {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PaymentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A registered wallet account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Sequential identifier.
    pub id: AccountId,
    /// Unique phone number.
    pub phone: Phone,
    /// Current balance; never negative.
    pub balance: Money,
}

/// Lifecycle state of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    /// Payment accepted and not rejected.
    InProgress,
    /// Payment rejected and refunded. Terminal.
    Fail,
}

impl PaymentStatus {
    /// Wire name used by the flat-file dump.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "INPROGRESS",
            Self::Fail => "FAIL",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status string is not one of the known wire names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INPROGRESS" => Ok(Self::InProgress),
            "FAIL" => Ok(Self::Fail),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// A payment made from an account.
///
/// `amount` is fixed at creation; only `status` changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    /// Unique payment token.
    pub id: PaymentId,
    /// Paying account.
    pub account_id: AccountId,
    /// Positive amount debited from the account.
    pub amount: Money,
    /// Category tag.
    pub category: PaymentCategory,
    /// Current status.
    pub status: PaymentStatus,
}

/// A named template captured from a past payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Favorite {
    /// Unique favorite token.
    pub id: FavoriteId,
    /// Paying account.
    pub account_id: AccountId,
    /// Display name chosen by the user.
    pub name: String,
    /// Amount replayed on each use.
    pub amount: Money,
    /// Category replayed on each use.
    pub category: PaymentCategory,
}

/// One incremental result of a progress-streaming summation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Number of payments in the window this event covers.
    pub part_size: usize,
    /// Sum of amounts over that window.
    pub partial_result: Money,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by ledger bookkeeping operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Another account already uses this phone number.
    #[error("phone already registered: {phone}")]
    PhoneRegistered { phone: Phone },
    /// Deposit or payment amount was zero or negative.
    #[error("amount must be greater than zero (got {amount})")]
    AmountMustBePositive { amount: Money },
    /// No account with this id.
    #[error("account not found: {id}")]
    AccountNotFound { id: AccountId },
    /// Balance too low for the requested payment.
    #[error("not enough balance: required {required}, available {available}")]
    NotEnoughBalance { required: Money, available: Money },
    /// No payment with this id.
    #[error("payment not found: {id}")]
    PaymentNotFound { id: PaymentId },
    /// Payment was already rejected; refunding twice is refused.
    #[error("payment already failed: {id}")]
    PaymentAlreadyFailed { id: PaymentId },
    /// No favorite with this id.
    #[error("favorite not found: {id}")]
    FavoriteNotFound { id: FavoriteId },
    /// Crediting the account would overflow its balance.
    #[error("balance overflow on account {id}: {balance} + {amount}")]
    BalanceOverflow {
        id: AccountId,
        balance: Money,
        amount: Money,
    },
    /// A text field contains a character reserved by the dump format.
    #[error("{field} contains a reserved character: {value:?}")]
    ReservedCharacter { field: &'static str, value: String },
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Hexagonal port: the read side of the ledger, as seen by the aggregation engine.
///
/// The aggregator depends exclusively on this trait -- never on the concrete
/// `Ledger` store.
pub trait PaymentSource {
    /// Snapshot copy of the payment log, in insertion order.
    ///
    /// Later mutations of the source are not visible through the returned slice.
    fn current_payments(&self) -> Arc<[Payment]>;

    /// Look up an account by id.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountNotFound` when no account has this id.
    fn find_account(&self, id: AccountId) -> Result<Account, LedgerError>;
}
