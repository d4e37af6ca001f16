// ============================================================================
// Source de balances : fichier JSON
// ============================================================================
// Lit la liste des balances du wallet depuis un fichier et valide le lot
// (ids non vides et uniques) avant qu'il n'atteigne le pipeline.
//
// Format attendu :
// [
//   {"id": "eth-1", "currency": "ETH", "amount": 2, "blockchain": "Ethereum"},
//   {"id": "osmo-1", "currency": "OSMO", "amount": 120.5, "blockchain": "Osmosis"}
// ]
// ============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::models::{WalletBalance, WalletBalances};

/// Parse et valide un lot de balances depuis du JSON
pub fn parse_balances(json: &str) -> Result<WalletBalances> {
    let records: Vec<WalletBalance> =
        serde_json::from_str(json).context("Échec du parsing JSON des balances")?;

    // CONCEPT RUST : Conversion d'erreur
    // - BalanceError implémente std::error::Error (thiserror)
    // - .context() l'enveloppe dans un anyhow::Error sans perdre la source
    WalletBalances::new(records).context("Lot de balances rejeté")
}

/// Charge les balances depuis un fichier
#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_balances(path: &Path) -> Result<WalletBalances> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire le fichier de balances {}", path.display()))?;

    let balances = parse_balances(&json)?;
    info!(count = balances.len(), "Loaded wallet balances");
    Ok(balances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BalanceError, Blockchain};

    #[test]
    fn test_parse_balances() {
        let json = r#"[
            {"id": "a", "currency": "ETH", "amount": 2, "blockchain": "Ethereum"},
            {"id": "b", "currency": "ATOM", "amount": 5, "blockchain": "Cosmos"}
        ]"#;

        let balances = parse_balances(json).unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances.as_slice()[1].blockchain, Blockchain::Unrecognized);
    }

    #[test]
    fn test_parse_rejects_duplicate_ids() {
        let json = r#"[
            {"id": "a", "currency": "ETH", "amount": 2, "blockchain": "Ethereum"},
            {"id": "a", "currency": "NEO", "amount": 1, "blockchain": "Neo"}
        ]"#;

        let err = parse_balances(json).unwrap_err();
        assert_eq!(
            err.downcast_ref::<BalanceError>(),
            Some(&BalanceError::DuplicateId("a".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_missing_id() {
        let json = r#"[{"currency": "ETH", "amount": 2, "blockchain": "Ethereum"}]"#;
        assert!(parse_balances(json).is_err());
    }

    #[test]
    fn test_load_balances_from_file() {
        let path = std::env::temp_dir().join(format!("walletboard-balances-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"id": "z", "currency": "ZIL", "amount": 100, "blockchain": "Zilliqa"}]"#,
        )
        .unwrap();

        let balances = load_balances(&path).unwrap();
        assert_eq!(balances.as_slice()[0].id, "z");

        std::fs::remove_file(&path).unwrap();
        assert!(load_balances(&path).is_err());
    }
}
