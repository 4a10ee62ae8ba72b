//! Account model
//!
//! Represents financial accounts (checking, savings, investment, credit).
//! An account owns its pots and its inline scheduled payments.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::balance::Balance;
use super::ids::{AccountId, PotId, ScheduleId};
use super::money::Money;
use super::pot::Pot;
use super::schedule::ScheduledPayment;

/// Maximum length of an account or pot name
pub const MAX_NAME_LEN: usize = 100;

/// Type of financial account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Checking account
    #[default]
    Checking,
    /// Savings account
    Savings,
    /// Investment account
    Investment,
    /// Credit card
    Credit,
}

impl AccountKind {
    /// Returns true if this account type carries debt as a negative balance
    pub fn is_liability(&self) -> bool {
        matches!(self, Self::Credit)
    }

    /// Parse account kind from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "checking" => Some(Self::Checking),
            "savings" => Some(Self::Savings),
            "investment" => Some(Self::Investment),
            "credit" | "credit_card" | "creditcard" => Some(Self::Credit),
            _ => None,
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checking => write!(f, "Checking"),
            Self::Savings => write!(f, "Savings"),
            Self::Investment => write!(f, "Investment"),
            Self::Credit => write!(f, "Credit Card"),
        }
    }
}

/// A financial account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,

    /// Account name (e.g., "Joint Checking")
    pub name: String,

    /// Current balance
    #[serde(default)]
    pub balance: Money,

    /// Type of account
    #[serde(default)]
    pub kind: AccountKind,

    /// Opts the account (and its pots) out of resets and reductions
    #[serde(default)]
    pub exclude_from_reset: bool,

    /// How far below zero a credit account may go
    #[serde(default)]
    pub credit_limit: Option<Money>,

    /// Amount removed from the balance by each monthly reduction
    #[serde(default)]
    pub monthly_baseline: Option<Money>,

    /// Pots owned by this account, in display order
    #[serde(default)]
    pub pots: Vec<Pot>,

    /// Day-of-month payments charged to this account
    #[serde(default)]
    pub scheduled_payments: Vec<ScheduledPayment>,
}

impl Account {
    /// Create a new account with a zero balance
    pub fn new(id: AccountId, name: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            id,
            name: name.into(),
            balance: Money::zero(),
            kind,
            exclude_from_reset: false,
            credit_limit: None,
            monthly_baseline: None,
            pots: Vec::new(),
            scheduled_payments: Vec::new(),
        }
    }

    pub fn pot(&self, pot_id: PotId) -> Option<&Pot> {
        self.pots.iter().find(|p| p.id == pot_id)
    }

    pub fn pot_mut(&mut self, pot_id: PotId) -> Option<&mut Pot> {
        self.pots.iter_mut().find(|p| p.id == pot_id)
    }

    pub fn scheduled_payment(&self, payment_id: ScheduleId) -> Option<&ScheduledPayment> {
        self.scheduled_payments.iter().find(|p| p.id == payment_id)
    }

    pub fn scheduled_payment_mut(&mut self, payment_id: ScheduleId) -> Option<&mut ScheduledPayment> {
        self.scheduled_payments.iter_mut().find(|p| p.id == payment_id)
    }

    /// Balance of the account plus all of its pots
    pub fn total_balance(&self) -> Money {
        self.balance + self.pots.iter().map(|p| p.balance).sum::<Money>()
    }

    /// Whether the account can be debited by `amount` without breaching its credit limit
    ///
    /// Accounts without a limit are never blocked here.
    pub fn within_credit_limit(&self, amount: Money) -> bool {
        match self.credit_limit {
            Some(limit) => self.balance - amount >= -limit,
            None => true,
        }
    }

    /// Validate the account
    pub fn validate(&self) -> Result<(), AccountValidationError> {
        validate_name(&self.name)?;

        if let Some(limit) = self.credit_limit {
            if limit.is_negative() {
                return Err(AccountValidationError::NegativeCreditLimit);
            }
        }

        if let Some(baseline) = self.monthly_baseline {
            if baseline.is_negative() {
                return Err(AccountValidationError::NegativeBaseline);
            }
        }

        Ok(())
    }
}

impl Balance for Account {
    fn balance(&self) -> Money {
        self.balance
    }

    fn balance_slot(&mut self) -> &mut Money {
        &mut self.balance
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), AccountValidationError> {
    if name.trim().is_empty() {
        return Err(AccountValidationError::EmptyName);
    }

    if name.len() > MAX_NAME_LEN {
        return Err(AccountValidationError::NameTooLong(name.len()));
    }

    Ok(())
}

/// Validation errors for accounts and pots
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyName,
    NameTooLong(usize),
    NegativeCreditLimit,
    NegativeBaseline,
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Name too long ({} chars, max {})", len, MAX_NAME_LEN)
            }
            Self::NegativeCreditLimit => write!(f, "Credit limit cannot be negative"),
            Self::NegativeBaseline => write!(f, "Monthly baseline cannot be negative"),
        }
    }
}

impl std::error::Error for AccountValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account() {
        let account = Account::new(AccountId::new(1), "Checking", AccountKind::Checking);
        assert_eq!(account.name, "Checking");
        assert_eq!(account.kind, AccountKind::Checking);
        assert!(!account.exclude_from_reset);
        assert_eq!(account.balance, Money::zero());
        assert!(account.pots.is_empty());
    }

    #[test]
    fn test_validation() {
        let mut account = Account::new(AccountId::new(1), "Valid Name", AccountKind::Checking);
        assert!(account.validate().is_ok());

        account.name = String::new();
        assert_eq!(account.validate(), Err(AccountValidationError::EmptyName));

        account.name = "a".repeat(101);
        assert!(matches!(
            account.validate(),
            Err(AccountValidationError::NameTooLong(_))
        ));

        account.name = "Card".into();
        account.credit_limit = Some(Money::from_cents(-1));
        assert_eq!(account.validate(), Err(AccountValidationError::NegativeCreditLimit));
    }

    #[test]
    fn test_account_kind_parsing() {
        assert_eq!(AccountKind::parse("checking"), Some(AccountKind::Checking));
        assert_eq!(AccountKind::parse("SAVINGS"), Some(AccountKind::Savings));
        assert_eq!(AccountKind::parse("credit_card"), Some(AccountKind::Credit));
        assert_eq!(AccountKind::parse("cash"), None);
    }

    #[test]
    fn test_credit_limit() {
        let mut card = Account::new(AccountId::new(2), "Visa", AccountKind::Credit);
        card.credit_limit = Some(Money::from_cents(50000));
        card.balance = Money::from_cents(-45000);

        assert!(card.within_credit_limit(Money::from_cents(5000)));
        assert!(!card.within_credit_limit(Money::from_cents(5001)));

        card.credit_limit = None;
        assert!(card.within_credit_limit(Money::from_cents(1_000_000)));
    }

    #[test]
    fn test_total_balance_includes_pots() {
        let mut account = Account::new(AccountId::new(1), "Checking", AccountKind::Checking);
        account.balance = Money::from_cents(1000);
        let mut pot = Pot::new(PotId::new(1), "Holiday");
        pot.balance = Money::from_cents(250);
        account.pots.push(pot);

        assert_eq!(account.total_balance(), Money::from_cents(1250));
        assert!(account.pot(PotId::new(1)).is_some());
        assert!(account.pot(PotId::new(2)).is_none());
    }

    #[test]
    fn test_legacy_document_defaults() {
        let account: Account = serde_json::from_str(r#"{"id": 4, "name": "Old"}"#).unwrap();
        assert_eq!(account.kind, AccountKind::Checking);
        assert_eq!(account.balance, Money::zero());
        assert!(account.credit_limit.is_none());
        assert!(account.scheduled_payments.is_empty());
    }

    #[test]
    fn test_display() {
        let account = Account::new(AccountId::new(1), "My Checking", AccountKind::Checking);
        assert_eq!(format!("{}", account), "My Checking (Checking)");
    }
}
