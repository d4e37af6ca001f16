// ============================================================================
// API Client : prix des tokens
// ============================================================================
// Récupère prices.json, ne garde que le prix le plus récent par devise et
// construit la table de prix + le catalogue de tokens pour le swap.
//
// CONCEPTS RUST :
// 1. async/await : appel HTTP non-bloquant avec reqwest
// 2. anyhow::Context : messages d'erreur explicites à chaque étape
// 3. #[instrument] : span tracing autour de chaque fetch
// ============================================================================

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::{debug, error, info, instrument};

use crate::config::Config;
use crate::models::{PriceTable, TokenInfo, TokenPrice};

/// Construit l'URL de prices.json
fn build_prices_url(base_url: &str) -> String {
    format!("{}/prices.json", base_url.trim_end_matches('/'))
}

/// Récupère la liste brute des prix
///
/// Une réponse HTTP hors 2xx est une erreur.
#[instrument(skip(config), fields(base_url = %config.prices_base_url))]
pub async fn fetch_token_prices(config: &Config) -> Result<Vec<TokenPrice>> {
    let url = build_prices_url(&config.prices_base_url);
    debug!(url = %url, "Built prices URL");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(config.http_timeout_ms))
        .build()
        .context("Échec de la création du client HTTP")?;

    let response = client
        .get(&url)
        .send()
        .await
        .context("Échec de la requête HTTP vers le service de prix")?;

    let status = response.status();
    debug!(status = %status, "Received HTTP response");

    if !status.is_success() {
        error!(status = %status, "Price service returned error status");
        anyhow::bail!("Le service de prix a retourné une erreur : HTTP {}", status);
    }

    let prices: Vec<TokenPrice> = response
        .json()
        .await
        .context("Échec du parsing JSON de prices.json")?;

    info!(entries = prices.len(), "Fetched token prices");
    Ok(prices)
}

/// Retire les prix <= 0 et garde l'entrée la plus récente par devise
///
/// CONCEPT : Dédoublonnage stable
/// - L'ordre de première apparition des devises est conservé
/// - Une date strictement plus récente remplace l'entrée existante
/// - À date égale ou plus ancienne, la première entrée vue reste
pub fn latest_prices(entries: Vec<TokenPrice>) -> Vec<TokenPrice> {
    let mut latest: Vec<TokenPrice> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for entry in entries.into_iter().filter(|e| e.price > Decimal::ZERO) {
        match positions.get(&entry.currency) {
            Some(&index) => {
                if entry.date > latest[index].date {
                    latest[index] = entry;
                }
            }
            None => {
                positions.insert(entry.currency.clone(), latest.len());
                latest.push(entry);
            }
        }
    }

    latest
}

/// Table devise → prix, construite depuis le catalogue de tokens
pub fn price_table(tokens: &[TokenInfo]) -> PriceTable {
    tokens
        .iter()
        .map(|token| (token.currency.clone(), token.price))
        .collect()
}

/// Catalogue de tokens (nom + icône) pour le formulaire de swap
pub fn token_catalog(entries: Vec<TokenPrice>, icons_base_url: &str) -> Vec<TokenInfo> {
    entries
        .into_iter()
        .map(|entry| TokenInfo::from_price(entry, icons_base_url))
        .collect()
}

/// Fetch + dédoublonnage + catalogue
pub async fn fetch_tokens(config: &Config) -> Result<Vec<TokenInfo>> {
    let raw = fetch_token_prices(config).await?;
    let raw_count = raw.len();
    let latest = latest_prices(raw);

    debug!(raw = raw_count, unique = latest.len(), "Deduplicated token prices");
    Ok(token_catalog(latest, &config.icons_base_url))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"currency": "BLUR", "date": "2023-08-29T07:10:40.000Z", "price": 0.20811525423728813},
        {"currency": "ETH", "date": "2023-08-29T07:10:52.000Z", "price": 1645.93},
        {"currency": "USD", "date": "2023-08-29T07:10:30.000Z", "price": 1},
        {"currency": "ETH", "date": "2023-08-29T07:10:40.000Z", "price": 1600},
        {"currency": "USD", "date": "2023-08-29T07:10:40.000Z", "price": 1.5},
        {"currency": "LUNA", "date": "2023-08-29T07:10:40.000Z", "price": 0},
        {"currency": "ATOM", "date": "2023-08-29T07:10:50.000Z", "price": 7},
        {"currency": "ATOM", "date": "2023-08-29T07:10:50.000Z", "price": 8}
    ]"#;

    fn sample() -> Vec<TokenPrice> {
        serde_json::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_build_prices_url() {
        assert_eq!(build_prices_url("https://example.com/"), "https://example.com/prices.json");
        assert_eq!(build_prices_url("https://example.com"), "https://example.com/prices.json");
    }

    #[test]
    fn test_latest_prices() {
        let latest = latest_prices(sample());
        let currencies: Vec<&str> = latest.iter().map(|t| t.currency.as_str()).collect();

        // LUNA (prix nul) disparaît, l'ordre de première apparition reste
        assert_eq!(currencies, vec!["BLUR", "ETH", "USD", "ATOM"]);

        let table = price_table(&token_catalog(latest, "https://icons.example"));
        assert_eq!(table["ETH"], Decimal::new(164593, 2)); // entrée plus ancienne ignorée
        assert_eq!(table["USD"], Decimal::new(15, 1)); // entrée plus récente gagne
        assert_eq!(table["ATOM"], Decimal::from(7)); // date égale : la première reste
    }

    #[test]
    fn test_token_catalog() {
        let catalog = token_catalog(latest_prices(sample()), "https://icons.example");
        let eth = catalog.iter().find(|t| t.currency == "ETH").unwrap();

        assert_eq!(eth.name, "Ethereum");
        assert_eq!(eth.icon, "https://icons.example/ETH.svg");
    }

    // Test avec un vrai appel API (peut échouer si pas de connexion)
    #[tokio::test]
    async fn test_fetch_tokens() {
        let config = Config::default();

        match fetch_tokens(&config).await {
            Ok(tokens) => {
                assert!(tokens.iter().all(|t| t.price > Decimal::ZERO));
                println!("✓ Récupéré {} tokens", tokens.len());
            }
            Err(e) => {
                println!("⚠ Test skippé (pas de connexion?) : {}", e);
            }
        }
    }
}
