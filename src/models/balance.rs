// ============================================================================
// Structures : WalletBalance / WalletBalances / FormattedWalletBalance
// ============================================================================
// Une balance du wallet telle que fournie par la source de balances, le lot
// validé qui alimente le pipeline, et la balance enrichie prête à afficher.
//
// CONCEPTS RUST :
// 1. Newtype validé : WalletBalances ne peut exister qu'avec des ids uniques
// 2. thiserror : erreurs de domaine typées, matchables par l'appelant
// 3. Decimal : montants exacts (pas d'erreurs d'arrondi flottant)
// ============================================================================

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Blockchain;
use crate::pipeline::format_fixed;

/// Balance brute d'une devise sur une chaîne
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalance {
    /// Identifiant unique (clé de rendu des lignes)
    pub id: String,

    /// Ticker de la devise (ex: "ETH", "OSMO")
    pub currency: String,

    /// Montant détenu (attendu >= 0)
    pub amount: Decimal,

    /// Chaîne de la balance
    pub blockchain: Blockchain,
}

impl WalletBalance {
    pub fn new(id: impl Into<String>, currency: impl Into<String>, amount: Decimal, blockchain: Blockchain) -> Self {
        Self {
            id: id.into(),
            currency: currency.into(),
            amount,
            blockchain,
        }
    }
}

/// Erreurs de validation d'un lot de balances
///
/// Le rendu des lignes est indexé par `id` : un id vide ou dupliqué
/// rejette tout le lot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BalanceError {
    #[error("balance #{index} has an empty id")]
    EmptyId { index: usize },

    #[error("duplicate balance id: {0}")]
    DuplicateId(String),
}

/// Lot de balances dont les ids sont non vides et uniques
///
/// CONCEPT RUST : Newtype
/// - Le champ est privé : la seule façon d'en construire un passe par new()
/// - Le pipeline peut donc supposer l'invariant sans le revérifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WalletBalances(Vec<WalletBalance>);

impl WalletBalances {
    /// Valide le lot (ordre d'entrée conservé)
    pub fn new(balances: Vec<WalletBalance>) -> Result<Self, BalanceError> {
        let mut seen = HashSet::with_capacity(balances.len());

        for (index, balance) in balances.iter().enumerate() {
            if balance.id.trim().is_empty() {
                return Err(BalanceError::EmptyId { index });
            }
            if !seen.insert(balance.id.as_str()) {
                return Err(BalanceError::DuplicateId(balance.id.clone()));
            }
        }

        Ok(Self(balances))
    }

    pub fn as_slice(&self) -> &[WalletBalance] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Balance enrichie : champs d'origine + montant formaté + valeur USD
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedWalletBalance {
    pub id: String,
    pub currency: String,
    pub amount: Decimal,
    pub blockchain: Blockchain,

    /// Montant avec exactement 2 décimales (ex: "2.00")
    pub formatted_amount: String,

    /// amount × prix, ou zéro si le prix manque (voir MissingPricePolicy)
    pub fiat_value: Decimal,

    /// false si fiat_value vient de la politique de prix manquant
    pub priced: bool,
}

impl FormattedWalletBalance {
    /// Valeur USD formatée pour l'affichage
    pub fn display_value(&self) -> String {
        if self.priced {
            format!("${}", format_fixed(self.fiat_value, 2))
        } else {
            "N/A".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance(id: &str) -> WalletBalance {
        WalletBalance::new(id, "ETH", Decimal::ONE, Blockchain::Ethereum)
    }

    #[test]
    fn test_valid_batch_keeps_order() {
        let batch = WalletBalances::new(vec![balance("b"), balance("a")]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.as_slice()[0].id, "b");
        assert_eq!(batch.as_slice()[1].id, "a");
    }

    #[test]
    fn test_empty_id_rejects_batch() {
        let result = WalletBalances::new(vec![balance("a"), balance("  ")]);
        assert_eq!(result, Err(BalanceError::EmptyId { index: 1 }));
    }

    #[test]
    fn test_duplicate_id_rejects_batch() {
        let result = WalletBalances::new(vec![balance("a"), balance("b"), balance("a")]);
        assert_eq!(result, Err(BalanceError::DuplicateId("a".to_string())));
    }

    #[test]
    fn test_deserialize_balance() {
        let json = r#"{"id": "x1", "currency": "OSMO", "amount": 12.5, "blockchain": "Osmosis"}"#;
        let parsed: WalletBalance = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.id, "x1");
        assert_eq!(parsed.amount, Decimal::new(125, 1));
        assert_eq!(parsed.blockchain, Blockchain::Osmosis);
    }
}
