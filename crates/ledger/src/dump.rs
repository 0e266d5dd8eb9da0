// Rust guideline compliant 2026-10-12

//! Flat-file export/import for the [`Ledger`].
//!
//! Two formats are supported:
//! - a single account file, `id;phone;balance|` per account
//!   ([`Ledger::export_to_file`], [`Ledger::import_from_file`]);
//! - a dump directory holding `accounts.dump`, `payments.dump` and
//!   `favorites.dump`, one `;`-separated record per line
//!   ([`Ledger::export`], [`Ledger::import`]).
//!
//! Imports upsert by id. Every file is parsed and checked against the ledger
//! invariants before any record is applied, so a rejected import leaves the
//! ledger unchanged.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use domain::{Account, AccountId, Favorite, Money, Payment, PaymentStatus, Phone};

use crate::Ledger;

const ACCOUNTS_FILE: &str = "accounts.dump";
const PAYMENTS_FILE: &str = "payments.dump";
const FAVORITES_FILE: &str = "favorites.dump";

// ---------------------------------------------------------------------------
// DumpError
// ---------------------------------------------------------------------------

/// Errors raised while reading or writing dump files.
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    /// The file could not be read or written.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// File the operation targeted.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A record did not match the expected layout.
    #[error("malformed record in {file} at record {record}: {reason}")]
    Malformed {
        /// File name the record came from.
        file: String,
        /// 1-based record number.
        record: usize,
        /// Human-readable description.
        reason: String,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DumpError + '_ {
    move |source| DumpError::Io { path: path.display().to_string(), source }
}

// ---------------------------------------------------------------------------
// Record parsing
// ---------------------------------------------------------------------------

/// Location of the record being parsed, for error reporting.
#[derive(Debug, Clone, Copy)]
struct Cursor<'a> {
    file: &'a str,
    record: usize,
}

impl Cursor<'_> {
    fn malformed(self, reason: impl Into<String>) -> DumpError {
        DumpError::Malformed {
            file: self.file.to_owned(),
            record: self.record,
            reason: reason.into(),
        }
    }

    fn split<'r>(self, record: &'r str, expected: usize) -> Result<Vec<&'r str>, DumpError> {
        let fields: Vec<&str> = record.split(';').collect();
        if fields.len() == expected {
            Ok(fields)
        } else {
            Err(self.malformed(format!("expected {expected} fields, found {}", fields.len())))
        }
    }

    fn parse<T>(self, name: &str, raw: &str) -> Result<T, DumpError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        raw.parse()
            .map_err(|e| self.malformed(format!("invalid {name} {raw:?}: {e}")))
    }
}

fn parse_account(cursor: Cursor<'_>, record: &str) -> Result<Account, DumpError> {
    let f = cursor.split(record, 3)?;
    Ok(Account {
        id: cursor.parse("id", f[0])?,
        phone: Phone::from(f[1]),
        balance: Money::new(cursor.parse("balance", f[2])?),
    })
}

fn parse_payment(cursor: Cursor<'_>, record: &str) -> Result<Payment, DumpError> {
    let f = cursor.split(record, 5)?;
    Ok(Payment {
        id: cursor.parse("payment id", f[0])?,
        account_id: cursor.parse("account id", f[1])?,
        amount: Money::new(cursor.parse("amount", f[2])?),
        category: f[3].into(),
        status: cursor.parse::<PaymentStatus>("status", f[4])?,
    })
}

fn parse_favorite(cursor: Cursor<'_>, record: &str) -> Result<Favorite, DumpError> {
    let f = cursor.split(record, 5)?;
    Ok(Favorite {
        id: cursor.parse("favorite id", f[0])?,
        account_id: cursor.parse("account id", f[1])?,
        amount: Money::new(cursor.parse("amount", f[2])?),
        name: f[3].to_owned(),
        category: f[4].into(),
    })
}

/// Parse every `terminator`-terminated record of `content`.
fn parse_records<T>(
    file: &str,
    content: &str,
    terminator: char,
    parse: fn(Cursor<'_>, &str) -> Result<T, DumpError>,
) -> Result<Vec<T>, DumpError> {
    content
        .split_terminator(terminator)
        .enumerate()
        .map(|(i, record)| parse(Cursor { file, record: i + 1 }, record))
        .collect()
}

/// Read `dir/name` if it exists; `Ok(None)` when absent.
fn read_optional(dir: &Path, name: &str) -> Result<Option<String>, DumpError> {
    let path = dir.join(name);
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(&path).map(Some).map_err(io_error(&path))
}

// ---------------------------------------------------------------------------
// Import validation
// ---------------------------------------------------------------------------

fn check_amount(cursor: Cursor<'_>, amount: Money) -> Result<(), DumpError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(cursor.malformed(format!("amount must be positive, found {amount}")))
    }
}

fn check_text(cursor: Cursor<'_>, field: &'static str, value: &str) -> Result<(), DumpError> {
    crate::check_field(field, value).map_err(|e| cursor.malformed(e.to_string()))
}

fn check_owner(cursor: Cursor<'_>, known: &[(AccountId, &Phone)], id: AccountId) -> Result<(), DumpError> {
    if known.iter().any(|(known_id, _)| *known_id == id) {
        Ok(())
    } else {
        Err(cursor.malformed(format!("account {id} does not exist")))
    }
}

/// Records parsed from a dump, checked against the ledger before being applied.
#[derive(Debug, Default)]
struct Staged {
    accounts: Vec<Account>,
    payments: Vec<Payment>,
    favorites: Vec<Favorite>,
}

impl Staged {
    /// Check every record as if applied in order on top of `ledger`.
    ///
    /// Accounts need an id of at least 1, a non-negative balance and a phone no
    /// other account holds. Payments and favorites need a positive amount and
    /// an account that exists once the staged accounts are in place.
    fn validate(&self, ledger: &Ledger, accounts_file: &str) -> Result<(), DumpError> {
        let mut known: Vec<(AccountId, &Phone)> =
            ledger.accounts().iter().map(|a| (a.id, &a.phone)).collect();

        for (i, account) in self.accounts.iter().enumerate() {
            let cursor = Cursor { file: accounts_file, record: i + 1 };
            if account.id < 1 {
                return Err(cursor.malformed(format!("account id must be >= 1, found {}", account.id)));
            }
            if account.balance < Money::ZERO {
                return Err(cursor.malformed(format!("negative balance {}", account.balance)));
            }
            check_text(cursor, "phone", account.phone.as_str())?;
            if let Some((owner, _)) = known
                .iter()
                .find(|(id, phone)| *id != account.id && **phone == account.phone)
            {
                return Err(cursor.malformed(format!(
                    "phone {} already belongs to account {owner}",
                    account.phone
                )));
            }
            match known.iter_mut().find(|(id, _)| *id == account.id) {
                Some(entry) => entry.1 = &account.phone,
                None => known.push((account.id, &account.phone)),
            }
        }

        for (i, payment) in self.payments.iter().enumerate() {
            let cursor = Cursor { file: PAYMENTS_FILE, record: i + 1 };
            check_amount(cursor, payment.amount)?;
            check_owner(cursor, &known, payment.account_id)?;
            check_text(cursor, "category", payment.category.as_str())?;
        }

        for (i, favorite) in self.favorites.iter().enumerate() {
            let cursor = Cursor { file: FAVORITES_FILE, record: i + 1 };
            check_amount(cursor, favorite.amount)?;
            check_owner(cursor, &known, favorite.account_id)?;
            check_text(cursor, "name", &favorite.name)?;
            check_text(cursor, "category", favorite.category.as_str())?;
        }
        Ok(())
    }

    fn apply(self, ledger: &mut Ledger) {
        for account in self.accounts {
            ledger.upsert_account(account);
        }
        for payment in self.payments {
            ledger.upsert_payment(payment);
        }
        for favorite in self.favorites {
            ledger.upsert_favorite(favorite);
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger export / import
// ---------------------------------------------------------------------------

impl Ledger {
    /// Write every account to `path` as `id;phone;balance|` records.
    ///
    /// # Errors
    ///
    /// Returns [`DumpError::Io`] when the file cannot be written.
    pub fn export_to_file(&self, path: &Path) -> Result<(), DumpError> {
        let out: String = self
            .accounts()
            .iter()
            .map(|a| format!("{};{};{}|", a.id, a.phone, a.balance))
            .collect();
        fs::write(path, out).map_err(io_error(path))?;
        tracing::info!(path = %path.display(), accounts = self.accounts().len(), "dump.accounts.exported");
        Ok(())
    }

    /// Read accounts written by [`export_to_file`](Self::export_to_file).
    ///
    /// Nothing is applied unless every record parses and keeps the account
    /// invariants (see [`import`](Self::import)).
    ///
    /// # Errors
    ///
    /// Returns [`DumpError::Io`] when the file cannot be read, or
    /// [`DumpError::Malformed`] when any record is invalid.
    pub fn import_from_file(&mut self, path: &Path) -> Result<(), DumpError> {
        let content = fs::read_to_string(path).map_err(io_error(path))?;
        let file = path.display().to_string();
        let staged = Staged {
            accounts: parse_records(&file, &content, '|', parse_account)?,
            ..Staged::default()
        };
        staged.validate(self, &file)?;
        let count = staged.accounts.len();
        staged.apply(self);
        tracing::info!(path = %file, accounts = count, "dump.accounts.imported");
        Ok(())
    }

    /// Write `accounts.dump`, `payments.dump` and `favorites.dump` into `dir`.
    ///
    /// Files for empty collections are not written.
    ///
    /// # Errors
    ///
    /// Returns [`DumpError::Io`] when any file cannot be written.
    pub fn export(&self, dir: &Path) -> Result<(), DumpError> {
        let accounts = self
            .accounts()
            .iter()
            .map(|a| format!("{};{};{}\n", a.id, a.phone, a.balance));
        write_records(dir, ACCOUNTS_FILE, accounts)?;

        let payments = self.payments().iter().map(|p| {
            format!("{};{};{};{};{}\n", p.id, p.account_id, p.amount, p.category, p.status)
        });
        write_records(dir, PAYMENTS_FILE, payments)?;

        let favorites = self.favorites().iter().map(|f| {
            format!("{};{};{};{};{}\n", f.id, f.account_id, f.amount, f.name, f.category)
        });
        write_records(dir, FAVORITES_FILE, favorites)?;

        tracing::info!(
            dir = %dir.display(),
            accounts = self.accounts().len(),
            payments = self.payments().len(),
            favorites = self.favorites().len(),
            "dump.exported"
        );
        Ok(())
    }

    /// Load whichever dump files exist in `dir`, upserting records by id.
    ///
    /// All files are parsed and checked before any record is applied, so a
    /// rejected import leaves the ledger unchanged. Imported records must keep
    /// the ledger invariants: unique phones, non-negative balances, positive
    /// amounts, and payments and favorites that point at an existing account.
    ///
    /// # Errors
    ///
    /// Returns [`DumpError::Io`] when an existing file cannot be read, or
    /// [`DumpError::Malformed`] when any record is invalid.
    pub fn import(&mut self, dir: &Path) -> Result<(), DumpError> {
        let mut staged = Staged::default();
        if let Some(content) = read_optional(dir, ACCOUNTS_FILE)? {
            staged.accounts = parse_records(ACCOUNTS_FILE, &content, '\n', parse_account)?;
        }
        if let Some(content) = read_optional(dir, PAYMENTS_FILE)? {
            staged.payments = parse_records(PAYMENTS_FILE, &content, '\n', parse_payment)?;
        }
        if let Some(content) = read_optional(dir, FAVORITES_FILE)? {
            staged.favorites = parse_records(FAVORITES_FILE, &content, '\n', parse_favorite)?;
        }
        staged.validate(self, ACCOUNTS_FILE)?;

        let (accounts, payments, favorites) =
            (staged.accounts.len(), staged.payments.len(), staged.favorites.len());
        staged.apply(self);
        tracing::info!(dir = %dir.display(), accounts, payments, favorites, "dump.imported");
        Ok(())
    }
}

/// Write `records` to `dir/name`; nothing is written when there are none.
fn write_records<I>(dir: &Path, name: &str, records: I) -> Result<(), DumpError>
where
    I: Iterator<Item = String>,
{
    let out: String = records.collect();
    if out.is_empty() {
        return Ok(());
    }
    let path = dir.join(name);
    fs::write(&path, out).map_err(io_error(&path))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::DumpError;
    use crate::Ledger;
    use domain::{Money, PaymentCategory, PaymentStatus, Phone};
    use std::fs;
    use std::path::PathBuf;

    /// Fresh scratch directory under the system temp dir.
    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ledger-dump-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        let a = ledger.register_account(Phone::from("+992930000001")).unwrap();
        ledger.register_account(Phone::from("+992920000002")).unwrap();
        ledger.deposit(a.id, Money::new(10_000)).unwrap();
        let p = ledger.pay(a.id, Money::new(1_500), PaymentCategory::from("auto")).unwrap();
        ledger.pay(a.id, Money::new(500), PaymentCategory::from("food")).unwrap();
        ledger.reject(p.id).unwrap();
        ledger.favorite_payment(p.id, "car wash").unwrap();
        ledger
    }

    // DP-T01: single-file account export matches the `|` layout.
    #[test]
    fn export_to_file_layout() {
        let dir = scratch_dir();
        let path = dir.join("export.txt");
        let mut ledger = Ledger::new();
        ledger.register_account(Phone::from("+992930000001")).unwrap();
        ledger.register_account(Phone::from("+992920000002")).unwrap();
        ledger.deposit(2, Money::new(70)).unwrap();

        ledger.export_to_file(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "1;+992930000001;0|2;+992920000002;70|");
        fs::remove_dir_all(dir).unwrap();
    }

    // DP-T02: single-file import restores accounts and continues the id sequence.
    #[test]
    fn import_from_file_restores_accounts() {
        let dir = scratch_dir();
        let path = dir.join("export.txt");
        fs::write(&path, "1;+992930000001;0|5;+992920000002;70|").unwrap();

        let mut ledger = Ledger::new();
        ledger.import_from_file(&path).unwrap();

        assert_eq!(ledger.accounts().len(), 2);
        assert_eq!(ledger.find_account_by_id(5).unwrap().balance, Money::new(70));
        let next = ledger.register_account(Phone::from("+992980000003")).unwrap();
        assert_eq!(next.id, 6);
        fs::remove_dir_all(dir).unwrap();
    }

    // DP-T03: directory dump reproduces every collection.
    #[test]
    fn export_import_directory() {
        let dir = scratch_dir();
        let original = sample_ledger();
        original.export(&dir).unwrap();

        let mut restored = Ledger::new();
        restored.import(&dir).unwrap();

        assert_eq!(restored.accounts(), original.accounts());
        assert_eq!(restored.payments(), original.payments());
        assert_eq!(restored.favorites(), original.favorites());
        assert_eq!(restored.payments()[0].status, PaymentStatus::Fail);
        fs::remove_dir_all(dir).unwrap();
    }

    // DP-T04: empty collections produce no files; missing files are skipped on import.
    #[test]
    fn empty_collections_skipped() {
        let dir = scratch_dir();
        let mut ledger = Ledger::new();
        ledger.register_account(Phone::from("+992000000005")).unwrap();
        ledger.export(&dir).unwrap();

        assert!(dir.join("accounts.dump").exists());
        assert!(!dir.join("payments.dump").exists());
        assert!(!dir.join("favorites.dump").exists());

        let mut restored = Ledger::new();
        restored.import(&dir).unwrap();
        assert_eq!(restored.accounts().len(), 1);
        assert!(restored.payments().is_empty());
        fs::remove_dir_all(dir).unwrap();
    }

    // DP-T05: import overwrites records that share an id.
    #[test]
    fn import_upserts_by_id() {
        let dir = scratch_dir();
        fs::write(dir.join("accounts.dump"), "1;+992000000009;999\n").unwrap();

        let mut ledger = Ledger::new();
        ledger.register_account(Phone::from("+992000000001")).unwrap();
        ledger.import(&dir).unwrap();

        assert_eq!(ledger.accounts().len(), 1);
        let account = ledger.find_account_by_id(1).unwrap();
        assert_eq!(account.phone, Phone::from("+992000000009"));
        assert_eq!(account.balance, Money::new(999));
        fs::remove_dir_all(dir).unwrap();
    }

    // DP-T06: malformed records are reported and nothing is applied.
    #[test]
    fn malformed_record_rejected() {
        let dir = scratch_dir();
        fs::write(dir.join("accounts.dump"), "1;+992000000001;10\n2;+992000000002\n").unwrap();

        let mut ledger = Ledger::new();
        let result = ledger.import(&dir);

        assert!(
            matches!(result, Err(DumpError::Malformed { record: 2, .. })),
            "expected Malformed at record 2, got {result:?}"
        );
        assert!(ledger.accounts().is_empty());
        fs::remove_dir_all(dir).unwrap();
    }

    // DP-T07: unknown status names are rejected.
    #[test]
    fn unknown_status_rejected() {
        let dir = scratch_dir();
        let line = format!("{};1;100;food;DONE\n", uuid::Uuid::new_v4());
        fs::write(dir.join("payments.dump"), line).unwrap();

        let result = Ledger::new().import(&dir);
        assert!(matches!(result, Err(DumpError::Malformed { .. })), "got {result:?}");
        fs::remove_dir_all(dir).unwrap();
    }

    // DP-T08: missing single file surfaces as an I/O error.
    #[test]
    fn import_from_missing_file() {
        let dir = scratch_dir();
        let result = Ledger::new().import_from_file(&dir.join("absent.txt"));
        assert!(matches!(result, Err(DumpError::Io { .. })), "got {result:?}");
        fs::remove_dir_all(dir).unwrap();
    }

    // DP-T09: free-form category and favorite names survive a round trip.
    #[test]
    fn free_text_round_trip() {
        let dir = scratch_dir();
        let mut original = Ledger::new();
        let a = original.register_account(Phone::from("+992 93 000 0001")).unwrap();
        original.deposit(a.id, Money::new(1_000)).unwrap();
        let p = original
            .pay(a.id, Money::new(250), PaymentCategory::from("food & drinks, café"))
            .unwrap();
        original.favorite_payment(p.id, "lunch, weekdays: 12:00").unwrap();

        original.export(&dir).unwrap();
        let mut restored = Ledger::new();
        restored.import(&dir).unwrap();

        assert_eq!(restored.accounts(), original.accounts());
        assert_eq!(restored.payments(), original.payments());
        assert_eq!(restored.favorites(), original.favorites());
        fs::remove_dir_all(dir).unwrap();
    }

    /// Import `files` into a ledger holding one account and expect a rejection
    /// at `file`/`record` that leaves the ledger as it was.
    fn assert_import_rejected(files: &[(&str, &str)], file: &str, record: usize) {
        let dir = scratch_dir();
        for (name, content) in files {
            fs::write(dir.join(name), content).unwrap();
        }
        let mut ledger = Ledger::new();
        ledger.register_account(Phone::from("+992000000001")).unwrap();

        let result = ledger.import(&dir);

        match &result {
            Err(DumpError::Malformed { file: f, record: r, .. }) => {
                assert_eq!((f.as_str(), *r), (file, record), "got {result:?}");
            }
            other => panic!("expected Malformed in {file}, got {other:?}"),
        }
        assert_eq!(ledger.accounts().len(), 1);
        assert_eq!(ledger.find_account_by_id(1).unwrap().balance, Money::ZERO);
        assert!(ledger.payments().is_empty());
        assert!(ledger.favorites().is_empty());
        fs::remove_dir_all(dir).unwrap();
    }

    // DP-T10: negative balances and non-positive ids are refused.
    #[test]
    fn import_rejects_bad_accounts() {
        assert_import_rejected(&[("accounts.dump", "2;+992000000002;-500\n")], "accounts.dump", 1);
        assert_import_rejected(&[("accounts.dump", "0;+992000000002;5\n")], "accounts.dump", 1);
    }

    // DP-T11: a phone held by another account is refused, in the ledger or in the file.
    #[test]
    fn import_rejects_duplicate_phone() {
        assert_import_rejected(&[("accounts.dump", "2;+992000000001;0\n")], "accounts.dump", 1);
        assert_import_rejected(
            &[("accounts.dump", "2;+1;0\n3;+1;0\n")],
            "accounts.dump",
            2,
        );
    }

    // DP-T12: payments need a positive amount and an existing account.
    #[test]
    fn import_rejects_bad_payments() {
        let id = uuid::Uuid::new_v4();
        let negative = format!("{id};1;-3;food;INPROGRESS\n");
        assert_import_rejected(&[("payments.dump", negative.as_str())], "payments.dump", 1);

        let orphan = format!("{id};1;10;food;INPROGRESS\n{};77;10;food;FAIL\n", uuid::Uuid::new_v4());
        assert_import_rejected(&[("payments.dump", orphan.as_str())], "payments.dump", 2);
    }

    // DP-T13: favorites need a positive amount and an existing account.
    #[test]
    fn import_rejects_bad_favorites() {
        let zero = format!("{};1;0;coffee;food\n", uuid::Uuid::new_v4());
        assert_import_rejected(&[("favorites.dump", zero.as_str())], "favorites.dump", 1);

        let orphan = format!("{};9;5;coffee;food\n", uuid::Uuid::new_v4());
        assert_import_rejected(&[("favorites.dump", orphan.as_str())], "favorites.dump", 1);
    }

    // DP-T14: one bad file rejects the whole import, including valid files.
    #[test]
    fn import_is_all_or_nothing() {
        let payment = format!("{};2;-1;food;INPROGRESS\n", uuid::Uuid::new_v4());
        assert_import_rejected(
            &[("accounts.dump", "2;+992000000002;100\n"), ("payments.dump", payment.as_str())],
            "payments.dump",
            1,
        );
    }

    // DP-T15: accounts imported in the same dump satisfy payment ownership.
    #[test]
    fn import_payments_for_new_accounts() {
        let dir = scratch_dir();
        fs::write(dir.join("accounts.dump"), "4;+992000000004;100\n").unwrap();
        fs::write(
            dir.join("payments.dump"),
            format!("{};4;30;auto;INPROGRESS\n", uuid::Uuid::new_v4()),
        )
        .unwrap();

        let mut ledger = Ledger::new();
        ledger.import(&dir).unwrap();

        assert_eq!(ledger.payments().len(), 1);
        assert_eq!(ledger.payments()[0].account_id, 4);
        fs::remove_dir_all(dir).unwrap();
    }

    // DP-T16: the single-file import applies the same account checks.
    #[test]
    fn import_from_file_rejects_negative_balance() {
        let dir = scratch_dir();
        let path = dir.join("export.txt");
        fs::write(&path, "1;+992930000001;10|2;+992920000002;-1|").unwrap();

        let mut ledger = Ledger::new();
        let result = ledger.import_from_file(&path);

        assert!(matches!(result, Err(DumpError::Malformed { record: 2, .. })), "got {result:?}");
        assert!(ledger.accounts().is_empty());
        fs::remove_dir_all(dir).unwrap();
    }
}
