//! Pot model
//!
//! A pot is a named sub-balance owned by exactly one account.

use serde::{Deserialize, Serialize};

use super::balance::Balance;
use super::ids::PotId;
use super::money::Money;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pot {
    pub id: PotId,
    pub name: String,
    #[serde(default)]
    pub balance: Money,
    /// Opts the pot out of resets and reductions
    #[serde(default)]
    pub exclude_from_reset: bool,
    /// Amount removed from the balance by each monthly reduction
    #[serde(default)]
    pub monthly_baseline: Option<Money>,
}

impl Pot {
    pub fn new(id: PotId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            balance: Money::zero(),
            exclude_from_reset: false,
            monthly_baseline: None,
        }
    }
}

impl Balance for Pot {
    fn balance(&self) -> Money {
        self.balance
    }

    fn balance_slot(&mut self) -> &mut Money {
        &mut self.balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pot() {
        let pot = Pot::new(PotId::new(9), "Groceries");
        assert_eq!(pot.name, "Groceries");
        assert!(pot.balance.is_zero());
        assert!(!pot.exclude_from_reset);
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let pot = Pot::new(PotId::new(9), "Groceries");
        let json = serde_json::to_value(&pot).unwrap();
        assert_eq!(json["excludeFromReset"], serde_json::json!(false));
        let back: Pot = serde_json::from_value(json).unwrap();
        assert_eq!(back, pot);
    }
}
