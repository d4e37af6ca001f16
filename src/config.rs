// ============================================================================
// Configuration
// ============================================================================
// Lit la configuration depuis les variables d'environnement, avec une
// valeur par défaut pour chacune.
//
// CONCEPTS RUST :
// 1. Closures comme paramètre : from_lookup() reçoit la source des valeurs,
//    les tests n'ont donc jamais besoin de modifier l'environnement du process
// 2. FromStr générique : un seul helper pour parser u64, Decimal, ...
// ============================================================================

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use rust_decimal::Decimal;

use crate::models::SwapLimits;
use crate::pipeline::MissingPricePolicy;

pub const DEFAULT_PRICES_URL: &str = "https://interview.switcheo.com";
pub const DEFAULT_ICONS_URL: &str = "https://raw.githubusercontent.com/Switcheo/token-icons/main/tokens";

/// Paramètres du swap simulé
#[derive(Debug, Clone, PartialEq)]
pub struct SwapSettings {
    /// Délai avant résolution du swap
    pub delay: Duration,

    /// Au-delà de ce montant le swap simulé échoue
    pub failure_threshold: Decimal,

    pub limits: SwapLimits,
}

impl Default for SwapSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(2000),
            failure_threshold: Decimal::from(100_000),
            limits: SwapLimits::default(),
        }
    }
}

/// Configuration de l'application
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base de l'URL du service de prix (prices.json)
    pub prices_base_url: String,

    /// Base de l'URL des icônes de tokens
    pub icons_base_url: String,

    /// Timeout des requêtes HTTP en millisecondes
    pub http_timeout_ms: u64,

    /// Fichier JSON des balances du wallet
    pub balances_path: PathBuf,

    /// Répertoire des fichiers de logs
    pub log_dir: PathBuf,

    pub swap: SwapSettings,

    pub missing_price: MissingPricePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prices_base_url: DEFAULT_PRICES_URL.to_string(),
            icons_base_url: DEFAULT_ICONS_URL.to_string(),
            http_timeout_ms: 10_000,
            balances_path: default_balances_path(),
            log_dir: default_log_dir(),
            swap: SwapSettings::default(),
            missing_price: MissingPricePolicy::default(),
        }
    }
}

impl Config {
    /// Charge la configuration depuis l'environnement du process
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Charge la configuration depuis une fonction de lookup
    ///
    /// CONCEPT RUST : impl Fn
    /// - Accepte n'importe quelle closure (env réel, HashMap de test, ...)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let missing_price = match lookup("WALLETBOARD_MISSING_PRICE") {
            Some(value) => parse_missing_price(&value)?,
            None => defaults.missing_price,
        };

        Ok(Self {
            prices_base_url: lookup("WALLETBOARD_PRICES_URL").unwrap_or(defaults.prices_base_url),
            icons_base_url: lookup("WALLETBOARD_ICONS_URL").unwrap_or(defaults.icons_base_url),
            http_timeout_ms: parse_or(&lookup, "WALLETBOARD_HTTP_TIMEOUT_MS", defaults.http_timeout_ms)?,
            balances_path: lookup("WALLETBOARD_BALANCES")
                .map(PathBuf::from)
                .unwrap_or(defaults.balances_path),
            log_dir: lookup("WALLETBOARD_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            swap: SwapSettings {
                delay: Duration::from_millis(parse_or(
                    &lookup,
                    "WALLETBOARD_SWAP_DELAY_MS",
                    defaults.swap.delay.as_millis() as u64,
                )?),
                failure_threshold: parse_or(
                    &lookup,
                    "WALLETBOARD_SWAP_FAILURE_THRESHOLD",
                    defaults.swap.failure_threshold,
                )?,
                limits: SwapLimits {
                    min_amount: defaults.swap.limits.min_amount,
                    max_amount: parse_or(
                        &lookup,
                        "WALLETBOARD_SWAP_MAX_AMOUNT",
                        defaults.swap.limits.max_amount,
                    )?,
                },
            },
            missing_price,
        })
    }
}

/// Parse une variable si elle est définie, sinon retourne la valeur par défaut
fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Valeur invalide pour {} : {:?}", key, value)),
        None => Ok(default),
    }
}

fn parse_missing_price(value: &str) -> Result<MissingPricePolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "zero" => Ok(MissingPricePolicy::ZeroValue),
        "exclude" => Ok(MissingPricePolicy::Exclude),
        other => anyhow::bail!(
            "Valeur invalide pour WALLETBOARD_MISSING_PRICE : {:?} (attendu \"zero\" ou \"exclude\")",
            other
        ),
    }
}

/// ~/.config/walletboard/balances.json (Linux), sinon ./balances.json
fn default_balances_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("walletboard"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("balances.json")
}

/// ~/.local/share/walletboard/logs (Linux), sinon ./logs
fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("walletboard").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}
