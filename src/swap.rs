// ============================================================================
// Swap simulé
// ============================================================================
// Taux de change entre deux tokens, montant cible dérivé, et exécution
// simulée d'un swap (délai + annulation possible).
//
// CONCEPTS RUST :
// 1. tokio::select! : attend le premier de deux futures (délai / annulation)
// 2. oneshot channel : signal d'annulation envoyé une seule fois
// 3. Option : "pas de taux" plutôt qu'une valeur spéciale
// ============================================================================

use rust_decimal::{Decimal, RoundingStrategy};
use tokio::sync::oneshot;
use tracing::{info, instrument, warn};

use crate::config::SwapSettings;
use crate::models::{PriceTable, SwapForm, SwapStatus, SwapTransaction};

/// Nombre de décimales du montant cible
pub const TO_AMOUNT_DP: u32 = 6;

/// Taux de change : prix(from) / prix(to)
///
/// Retourne zéro si un token n'est pas choisi ou n'a pas de prix.
pub fn exchange_rate(from_token: &str, to_token: &str, prices: &PriceTable) -> Decimal {
    if from_token.is_empty() || to_token.is_empty() {
        return Decimal::ZERO;
    }

    match (prices.get(from_token), prices.get(to_token)) {
        (Some(from_price), Some(to_price)) => from_price.checked_div(*to_price).unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

/// Montant reçu pour `from_amount` au taux `rate`, arrondi à 6 décimales
///
/// None si le montant ou le taux est nul (rien à afficher).
pub fn to_amount(from_amount: Decimal, rate: Decimal) -> Option<Decimal> {
    if from_amount.is_zero() || rate.is_zero() {
        return None;
    }

    from_amount
        .checked_mul(rate)
        .map(|value| value.round_dp_with_strategy(TO_AMOUNT_DP, RoundingStrategy::MidpointAwayFromZero))
}

/// Simule l'envoi d'un swap
///
/// CONCEPT : Annulation coopérative
/// - Le swap attend `settings.delay`
/// - Si `cancel` reçoit un signal (ou si son Sender est droppé) avant, le
///   swap se termine en Cancelled
/// - Sinon : Failed au-delà du seuil d'échec, Completed dans les autres cas
#[instrument(skip_all, fields(from = %form.from_token, to = %form.to_token, amount = %form.from_amount))]
pub async fn simulate_swap(
    form: SwapForm,
    rate: Decimal,
    settings: &SwapSettings,
    cancel: oneshot::Receiver<()>,
) -> SwapTransaction {
    let amount = to_amount(form.from_amount, rate).unwrap_or(Decimal::ZERO);

    // biased : une annulation déjà reçue l'emporte sur un délai écoulé
    let status = tokio::select! {
        biased;
        _ = cancel => SwapStatus::Cancelled,
        _ = tokio::time::sleep(settings.delay) => {
            if form.from_amount > settings.failure_threshold {
                warn!(threshold = %settings.failure_threshold, "Swap amount exceeds failure threshold");
                SwapStatus::Failed
            } else {
                SwapStatus::Completed
            }
        }
    };

    info!(status = %status, to_amount = %amount, "Swap finished");
    SwapTransaction::new(&form, amount, rate, status)
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::time::Duration;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn table() -> PriceTable {
        [("ETH", "1645.93"), ("USDC", "1"), ("ATOM", "7.5")]
            .iter()
            .map(|(c, p)| (c.to_string(), dec(p)))
            .collect()
    }

    fn form(amount: &str) -> SwapForm {
        SwapForm {
            from_token: "ETH".to_string(),
            to_token: "USDC".to_string(),
            from_amount: dec(amount),
        }
    }

    fn fast_settings() -> SwapSettings {
        SwapSettings {
            delay: Duration::from_millis(10),
            failure_threshold: Decimal::from(1_000),
            ..SwapSettings::default()
        }
    }

    #[test]
    fn test_exchange_rate() {
        let prices = table();
        assert_eq!(exchange_rate("ETH", "USDC", &prices), dec("1645.93"));
        assert_eq!(exchange_rate("USDC", "ATOM", &prices).round_dp(6), dec("0.133333"));
        assert_eq!(exchange_rate("ETH", "", &prices), Decimal::ZERO);
        assert_eq!(exchange_rate("ETH", "BTC", &prices), Decimal::ZERO);
    }

    #[test]
    fn test_to_amount() {
        assert_eq!(to_amount(dec("2"), dec("1645.93")), Some(dec("3291.86")));
        assert_eq!(to_amount(dec("1"), dec("0.1234565")), Some(dec("0.123457")));
        assert_eq!(to_amount(Decimal::ZERO, dec("3")), None);
        assert_eq!(to_amount(dec("3"), Decimal::ZERO), None);
    }

    #[tokio::test]
    async fn test_swap_completes() {
        let (_cancel_tx, cancel_rx) = oneshot::channel();
        let rate = exchange_rate("ETH", "USDC", &table());

        let tx = simulate_swap(form("2"), rate, &fast_settings(), cancel_rx).await;

        assert_eq!(tx.status, SwapStatus::Completed);
        assert_eq!(tx.to_amount, dec("3291.86"));
        assert_eq!(tx.exchange_rate, rate);
        assert_eq!(tx.from_token, "ETH");
    }

    #[tokio::test]
    async fn test_swap_fails_above_threshold() {
        let (_cancel_tx, cancel_rx) = oneshot::channel();

        let tx = simulate_swap(form("5000"), Decimal::ONE, &fast_settings(), cancel_rx).await;
        assert_eq!(tx.status, SwapStatus::Failed);
    }

    #[tokio::test]
    async fn test_swap_cancelled() {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let settings = SwapSettings {
            delay: Duration::from_secs(30),
            ..fast_settings()
        };

        cancel_tx.send(()).unwrap();
        let tx = simulate_swap(form("2"), Decimal::ONE, &settings, cancel_rx).await;

        assert_eq!(tx.status, SwapStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_swap_cancelled_when_sender_dropped() {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let settings = SwapSettings {
            delay: Duration::from_secs(30),
            ..fast_settings()
        };

        drop(cancel_tx);
        let tx = simulate_swap(form("2"), Decimal::ONE, &settings, cancel_rx).await;

        assert_eq!(tx.status, SwapStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_pending_cancel_wins_over_elapsed_delay() {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let settings = SwapSettings {
            delay: Duration::ZERO,
            ..fast_settings()
        };

        cancel_tx.send(()).unwrap();
        let tx = simulate_swap(form("2"), Decimal::ONE, &settings, cancel_rx).await;

        assert_eq!(tx.status, SwapStatus::Cancelled);
    }
}
