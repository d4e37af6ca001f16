// ============================================================================
// Enum : Blockchain
// ============================================================================
// Réseau sur lequel se trouve une balance. Sert uniquement à classer les
// balances pour l'affichage (priorité la plus haute en premier).
//
// CONCEPTS RUST :
// 1. Enum fermé : l'ensemble des chaînes connues est fixé à la compilation
// 2. #[serde(other)] : toute chaîne inconnue devient Unrecognized
// 3. match exhaustif : la table de priorités est une fonction totale
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

/// Priorité attribuée aux chaînes non reconnues
///
/// Strictement inférieure à toute priorité connue. Le filtre exclut les
/// balances dont la priorité vaut cette valeur (comparaison stricte).
pub const SENTINEL_PRIORITY: i32 = -99;

/// Réseau blockchain d'une balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Blockchain {
    Osmosis,
    Ethereum,
    Arbitrum,
    Zilliqa,
    Neo,

    /// Toute autre chaîne (ou valeur absente côté source)
    /// CONCEPT RUST : #[serde(other)]
    /// - "Solana", "Cosmos", ... se désérialisent ici au lieu d'échouer
    #[serde(other)]
    Unrecognized,
}

impl Blockchain {
    /// Retourne la priorité d'affichage de la chaîne
    ///
    /// Zilliqa et Neo partagent volontairement la même priorité.
    pub fn priority(&self) -> i32 {
        match self {
            Blockchain::Osmosis => 100,
            Blockchain::Ethereum => 50,
            Blockchain::Arbitrum => 30,
            Blockchain::Zilliqa | Blockchain::Neo => 20,
            Blockchain::Unrecognized => SENTINEL_PRIORITY,
        }
    }

    /// Nom affiché dans le tableau
    pub fn label(&self) -> &'static str {
        match self {
            Blockchain::Osmosis => "Osmosis",
            Blockchain::Ethereum => "Ethereum",
            Blockchain::Arbitrum => "Arbitrum",
            Blockchain::Zilliqa => "Zilliqa",
            Blockchain::Neo => "Neo",
            Blockchain::Unrecognized => "Unknown",
        }
    }

    /// Toutes les chaînes connues, par priorité décroissante
    pub fn all() -> Vec<Blockchain> {
        vec![
            Blockchain::Osmosis,
            Blockchain::Ethereum,
            Blockchain::Arbitrum,
            Blockchain::Zilliqa,
            Blockchain::Neo,
        ]
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_priorities() {
        assert_eq!(Blockchain::Osmosis.priority(), 100);
        assert_eq!(Blockchain::Ethereum.priority(), 50);
        assert_eq!(Blockchain::Arbitrum.priority(), 30);
        assert_eq!(Blockchain::Zilliqa.priority(), 20);
        assert_eq!(Blockchain::Neo.priority(), 20);
    }

    #[test]
    fn test_unrecognized_is_below_every_known_chain() {
        assert_eq!(Blockchain::Unrecognized.priority(), SENTINEL_PRIORITY);

        for chain in Blockchain::all() {
            assert!(chain.priority() > Blockchain::Unrecognized.priority());
        }
    }

    #[test]
    fn test_deserialize_unknown_chain() {
        let chains: Vec<Blockchain> =
            serde_json::from_str(r#"["Osmosis", "Neo", "Solana", "ethereum"]"#).unwrap();

        assert_eq!(
            chains,
            vec![
                Blockchain::Osmosis,
                Blockchain::Neo,
                Blockchain::Unrecognized,
                Blockchain::Unrecognized, // sensible à la casse
            ]
        );
    }
}
