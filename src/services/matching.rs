//! Matching executions to the record they belong to
//!
//! Card-linked executions append to an existing record instead of creating a
//! new one. A record is identified by the triple (kind, name, linked credit
//! account); names compare case-insensitively after trimming. The first
//! match in iteration order wins and no match means a new record.

use crate::models::{AccountId, TransactionId, TransactionKind, TransactionRecord};

/// The identity of a logical transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchKey<'a> {
    pub kind: TransactionKind,
    pub name: &'a str,
    pub linked_credit_account_id: Option<AccountId>,
}

impl<'a> MatchKey<'a> {
    pub fn new(
        kind: TransactionKind,
        name: &'a str,
        linked_credit_account_id: Option<AccountId>,
    ) -> Self {
        Self {
            kind,
            name,
            linked_credit_account_id,
        }
    }

    pub fn matches(&self, record: &TransactionRecord) -> bool {
        record.kind == self.kind
            && record.linked_credit_account_id == self.linked_credit_account_id
            && record.name.trim().to_lowercase() == self.name.trim().to_lowercase()
    }
}

/// Find the first record matching `key`
pub fn find_record<'r, I>(records: I, key: &MatchKey<'_>) -> Option<TransactionId>
where
    I: IntoIterator<Item = &'r TransactionRecord>,
{
    records
        .into_iter()
        .find(|record| key.matches(record))
        .map(|record| record.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;

    fn record(id: u64, kind: TransactionKind, name: &str, card: Option<u64>) -> TransactionRecord {
        let mut record =
            TransactionRecord::new(TransactionId::new(id), kind, name, Money::from_cents(1000));
        record.linked_credit_account_id = card.map(AccountId::new);
        record
    }

    #[test]
    fn test_no_match_returns_none() {
        let records = vec![record(1, TransactionKind::Scheduled, "Gym", None)];
        let key = MatchKey::new(TransactionKind::CreditCardCharge, "Gym", Some(AccountId::new(3)));
        assert_eq!(find_record(&records, &key), None);
    }

    #[test]
    fn test_all_three_parts_must_agree() {
        let records = vec![
            record(1, TransactionKind::CreditCardCharge, "Netflix", Some(4)),
            record(2, TransactionKind::CreditCardPayment, "Netflix", Some(3)),
            record(3, TransactionKind::CreditCardCharge, "Spotify", Some(3)),
            record(4, TransactionKind::CreditCardCharge, "Netflix", Some(3)),
        ];
        let key = MatchKey::new(TransactionKind::CreditCardCharge, "Netflix", Some(AccountId::new(3)));
        assert_eq!(find_record(&records, &key), Some(TransactionId::new(4)));
    }

    #[test]
    fn test_first_match_wins() {
        let records = vec![
            record(8, TransactionKind::CreditCardCharge, "Netflix", Some(3)),
            record(2, TransactionKind::CreditCardCharge, "Netflix", Some(3)),
        ];
        let key = MatchKey::new(TransactionKind::CreditCardCharge, "Netflix", Some(AccountId::new(3)));
        assert_eq!(find_record(&records, &key), Some(TransactionId::new(8)));
    }

    #[test]
    fn test_name_comparison_ignores_case_and_padding() {
        let records = vec![record(1, TransactionKind::CreditCardCharge, " NETFLIX ", Some(3))];
        let key = MatchKey::new(TransactionKind::CreditCardCharge, "netflix", Some(AccountId::new(3)));
        assert_eq!(find_record(&records, &key), Some(TransactionId::new(1)));
    }

    #[test]
    fn test_missing_link_only_matches_missing_link() {
        let records = vec![record(1, TransactionKind::Scheduled, "Rent", Some(3))];
        let key = MatchKey::new(TransactionKind::Scheduled, "Rent", None);
        assert_eq!(find_record(&records, &key), None);
    }
}
