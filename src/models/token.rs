// ============================================================================
// Structures : TokenPrice / TokenInfo / PriceTable
// ============================================================================
// Prix unitaire d'un token en USD tel que servi par prices.json, et sa
// version "catalogue" avec nom d'affichage et URL d'icône.
// ============================================================================

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Table ticker → prix unitaire en USD
pub type PriceTable = HashMap<String, Decimal>;

/// Entrée de prices.json
///
/// Format : {"currency": "ETH", "date": "2023-08-29T07:10:52.000Z", "price": 1645.93}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPrice {
    pub currency: String,
    pub date: DateTime<Utc>,
    pub price: Decimal,
}

/// Token proposé dans le formulaire de swap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenInfo {
    pub currency: String,
    pub date: DateTime<Utc>,
    pub price: Decimal,

    /// Nom lisible (ex: "Ethereum"), ou le ticker si inconnu
    pub name: String,

    /// URL de l'icône SVG du token
    pub icon: String,
}

impl TokenInfo {
    /// Construit l'entrée de catalogue à partir d'un prix
    pub fn from_price(token: TokenPrice, icons_base_url: &str) -> Self {
        let name = token_name(&token.currency).to_string();
        let icon = format!("{}/{}.svg", icons_base_url.trim_end_matches('/'), token.currency);

        Self {
            currency: token.currency,
            date: token.date,
            price: token.price,
            name,
            icon,
        }
    }
}

/// Retourne le nom d'affichage d'un ticker
///
/// CONCEPT RUST : Lifetimes élidées
/// - Le &str retourné vit soit dans la table statique, soit aussi longtemps
///   que `currency` : le compilateur unifie les deux via l'élision
pub fn token_name(currency: &str) -> &str {
    match currency {
        "SWTH" => "Switcheo",
        "ETH" => "Ethereum",
        "BTC" => "Bitcoin",
        "USDC" => "USD Coin",
        "USDT" => "Tether",
        "BNB" => "Binance Coin",
        "ADA" => "Cardano",
        "DOT" => "Polkadot",
        "MATIC" => "Polygon",
        "AVAX" => "Avalanche",
        "SOL" => "Solana",
        "ATOM" => "Cosmos",
        "NEAR" => "Near Protocol",
        "FTM" => "Fantom",
        "LUNA" => "Terra Luna",
        "OSMO" => "Osmosis",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_name_fallback() {
        assert_eq!(token_name("OSMO"), "Osmosis");
        assert_eq!(token_name("bNEO"), "bNEO");
    }

    #[test]
    fn test_token_info_icon_url() {
        let token: TokenPrice = serde_json::from_str(
            r#"{"currency": "ATOM", "date": "2023-08-29T07:10:40.000Z", "price": 7.5}"#,
        )
        .unwrap();

        let info = TokenInfo::from_price(token, "https://icons.example/tokens/");
        assert_eq!(info.name, "Cosmos");
        assert_eq!(info.icon, "https://icons.example/tokens/ATOM.svg");
        assert_eq!(info.price, Decimal::new(75, 1));
    }
}
