// ============================================================================
// Pipeline des balances : filtre → tri → enrichissement
// ============================================================================
// Transforme la liste brute des balances et la table de prix en lignes
// prêtes à afficher, triées par priorité de chaîne décroissante.
//
// CONCEPTS RUST :
// 1. Fonctions pures : aucune ne modifie ses entrées ni ne garde d'état
// 2. Emprunts : le filtre et le tri travaillent sur des &WalletBalance,
//    seul l'enrichissement alloue les lignes finales
// 3. Tri stable : Vec::sort_by_key conserve l'ordre relatif des égalités
// ============================================================================

use std::cmp::Reverse;

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, warn};

use crate::models::{FormattedWalletBalance, PriceTable, WalletBalance, WalletBalances, SENTINEL_PRIORITY};

/// Que faire d'une balance dont la devise n'a pas de prix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPricePolicy {
    /// Garde la ligne avec une valeur USD nulle (priced = false)
    #[default]
    ZeroValue,

    /// Retire la ligne du résultat
    Exclude,
}

/// Balance accompagnée de sa priorité, calculée une seule fois
///
/// CONCEPT RUST : Lifetime 'a
/// - RankedBalance emprunte la balance d'origine, il ne peut pas lui survivre
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedBalance<'a> {
    pub priority: i32,
    pub balance: &'a WalletBalance,
}

/// Garde les balances d'une chaîne reconnue avec un montant strictement positif
///
/// L'ordre relatif des survivants est celui de l'entrée.
pub fn filter_balances(balances: &[WalletBalance]) -> Vec<RankedBalance<'_>> {
    balances
        .iter()
        .map(|balance| RankedBalance {
            priority: balance.blockchain.priority(),
            balance,
        })
        .filter(|ranked| ranked.priority > SENTINEL_PRIORITY && ranked.balance.amount > Decimal::ZERO)
        .collect()
}

/// Trie par priorité décroissante (stable sur les égalités)
pub fn sort_balances(mut ranked: Vec<RankedBalance<'_>>) -> Vec<RankedBalance<'_>> {
    ranked.sort_by_key(|r| Reverse(r.priority));
    ranked
}

/// Ajoute le montant formaté et la valeur USD à chaque balance
///
/// CONCEPT : Arithmétique vérifiée
/// - checked_mul retourne None au lieu de paniquer en cas de dépassement
/// - La ligne concernée suit alors la politique des prix manquants
pub fn enrich_balances(
    sorted: &[RankedBalance<'_>],
    prices: &PriceTable,
    policy: MissingPricePolicy,
) -> Vec<FormattedWalletBalance> {
    sorted
        .iter()
        .filter_map(|ranked| {
            let balance = ranked.balance;

            // Un produit hors de la plage de Decimal est traité comme un prix absent
            let value = match prices.get(&balance.currency) {
                Some(price) => {
                    let value = balance.amount.checked_mul(*price);
                    if value.is_none() {
                        warn!(id = %balance.id, currency = %balance.currency, %price, "USD value out of range");
                    }
                    value
                }
                None => None,
            };

            let (fiat_value, priced) = match value {
                Some(value) => (value, true),
                None => match policy {
                    MissingPricePolicy::ZeroValue => {
                        warn!(id = %balance.id, currency = %balance.currency, "No usable price for currency, using zero value");
                        (Decimal::ZERO, false)
                    }
                    MissingPricePolicy::Exclude => {
                        warn!(id = %balance.id, currency = %balance.currency, "No usable price for currency, excluding balance");
                        return None;
                    }
                },
            };

            Some(FormattedWalletBalance {
                id: balance.id.clone(),
                currency: balance.currency.clone(),
                amount: balance.amount,
                blockchain: balance.blockchain,
                formatted_amount: format_fixed(balance.amount, 2),
                fiat_value,
                priced,
            })
        })
        .collect()
}

/// Exécute le pipeline complet sur un lot validé
pub fn format_wallet_balances(
    balances: &WalletBalances,
    prices: &PriceTable,
    policy: MissingPricePolicy,
) -> Vec<FormattedWalletBalance> {
    let filtered = filter_balances(balances.as_slice());
    let sorted = sort_balances(filtered);
    let rows = enrich_balances(&sorted, prices, policy);

    debug!(input = balances.len(), output = rows.len(), ?policy, "Formatted wallet balances");
    rows
}

/// Formate un décimal avec exactement `dp` décimales
///
/// Arrondi "half away from zero" : 1.005 → "1.01", 1.004 → "1.00", 1 → "1.00".
pub fn format_fixed(value: Decimal, dp: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    // rescale complète avec des zéros (1 → 1.00), l'arrondi est déjà fait
    rounded.rescale(dp);
    rounded.to_string()
}

// ============================================================================
// Tests unitaires
// ============================================================================
