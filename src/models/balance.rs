//! Balance references and the balance mutation primitive

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, PotId};
use super::money::Money;

/// Anything that carries a balance
pub trait Balance {
    fn balance(&self) -> Money;

    #[doc(hidden)]
    fn balance_slot(&mut self) -> &mut Money;

    /// Add a signed amount to the balance and return the new balance
    ///
    /// The result is rounded to two decimals, half-to-even. Every balance
    /// change in the ledger goes through here. Returns `None`, leaving the
    /// balance untouched, when the result would leave the supported range.
    fn apply_delta(&mut self, delta: Money) -> Option<Money> {
        let next = self.balance().checked_add(delta)?;
        *self.balance_slot() = next;
        Some(next)
    }
}

/// Points at an account, or at one pot of that account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRef {
    pub account_id: AccountId,
    #[serde(default)]
    pub pot_id: Option<PotId>,
}

impl BalanceRef {
    pub fn account(account_id: AccountId) -> Self {
        Self {
            account_id,
            pot_id: None,
        }
    }

    pub fn pot(account_id: AccountId, pot_id: PotId) -> Self {
        Self {
            account_id,
            pot_id: Some(pot_id),
        }
    }

    /// Whether this reference touches the account itself or any of its pots
    pub fn involves_account(&self, account_id: AccountId) -> bool {
        self.account_id == account_id
    }

    pub fn involves_pot(&self, pot_id: PotId) -> bool {
        self.pot_id == Some(pot_id)
    }
}

impl fmt::Display for BalanceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pot_id {
            Some(pot_id) => write!(f, "{}/{}", self.account_id, pot_id),
            None => write!(f, "{}", self.account_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Wallet(Money);

    impl Balance for Wallet {
        fn balance(&self) -> Money {
            self.0
        }

        fn balance_slot(&mut self) -> &mut Money {
            &mut self.0
        }
    }

    #[test]
    fn test_apply_delta() {
        let mut wallet = Wallet(Money::from_cents(10000));
        assert_eq!(
            wallet.apply_delta(Money::from_cents(-4000)),
            Some(Money::from_cents(6000))
        );
        assert_eq!(wallet.balance(), Money::from_cents(6000));
    }

    #[test]
    fn test_apply_delta_out_of_range_leaves_balance() {
        let mut wallet = Wallet(Money::from_cents(999_999_999_999_000));
        assert_eq!(wallet.apply_delta(Money::from_cents(1000)), None);
        assert_eq!(wallet.balance(), Money::from_cents(999_999_999_999_000));
    }

    #[test]
    fn test_balance_ref_display() {
        let account = AccountId::new(1);
        assert_eq!(BalanceRef::account(account).to_string(), "acc-1");
        assert_eq!(BalanceRef::pot(account, PotId::new(4)).to_string(), "acc-1/pot-4");
    }

    #[test]
    fn test_pot_id_defaults_to_none() {
        let parsed: BalanceRef = serde_json::from_str(r#"{"accountId": 3}"#).unwrap();
        assert_eq!(parsed, BalanceRef::account(AccountId::new(3)));
    }
}
