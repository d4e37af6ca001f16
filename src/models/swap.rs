// ============================================================================
// Structures : SwapForm / SwapTransaction
// ============================================================================
// Formulaire de swap (token source, token cible, montant) et transaction
// simulée qui en résulte.
//
// CONCEPTS RUST :
// 1. Enum d'état : SwapStatus remplace les chaînes "pending" | "completed" ...
// 2. Result<(), E> : la validation retourne la première erreur rencontrée
// ============================================================================

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Bornes de validation du montant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapLimits {
    /// Le montant doit être strictement supérieur à cette valeur
    pub min_amount: Decimal,

    /// Le montant ne doit pas dépasser cette valeur
    pub max_amount: Decimal,
}

impl Default for SwapLimits {
    fn default() -> Self {
        Self {
            min_amount: Decimal::ZERO,
            max_amount: Decimal::from(1_000_000),
        }
    }
}

/// Erreurs de validation du formulaire (messages affichés tels quels)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapValidationError {
    #[error("Please select a token to swap from")]
    MissingFromToken,

    #[error("Please select a token to swap to")]
    MissingToToken,

    #[error("Cannot swap the same token")]
    SameToken,

    #[error("Amount must be a positive number")]
    NonPositiveAmount,

    #[error("Amount cannot exceed {0}")]
    AmountTooLarge(String),
}

/// Formulaire de swap
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SwapForm {
    /// Ticker source (vide = non sélectionné)
    pub from_token: String,

    /// Ticker cible (vide = non sélectionné)
    pub to_token: String,

    pub from_amount: Decimal,
}

impl SwapForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vérifie le formulaire, dans l'ordre d'affichage des erreurs
    pub fn validate(&self, limits: &SwapLimits) -> Result<(), SwapValidationError> {
        if self.from_token.is_empty() {
            return Err(SwapValidationError::MissingFromToken);
        }
        if self.to_token.is_empty() {
            return Err(SwapValidationError::MissingToToken);
        }
        if self.from_token == self.to_token {
            return Err(SwapValidationError::SameToken);
        }
        if self.from_amount <= limits.min_amount {
            return Err(SwapValidationError::NonPositiveAmount);
        }
        if self.from_amount > limits.max_amount {
            return Err(SwapValidationError::AmountTooLarge(group_thousands(limits.max_amount)));
        }
        Ok(())
    }

    /// Met à jour le montant depuis une saisie texte
    ///
    /// Une saisie invalide ou vide donne 0 (le formulaire reste utilisable).
    pub fn set_amount_text(&mut self, text: &str) {
        self.from_amount = Decimal::from_str(text.trim()).unwrap_or(Decimal::ZERO);
    }

    /// Inverse token source et token cible
    pub fn switch_tokens(&mut self) {
        std::mem::swap(&mut self.from_token, &mut self.to_token);
    }

    /// Remet le formulaire à zéro
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// État d'une transaction de swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl SwapStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SwapStatus::Pending => "Pending",
            SwapStatus::Completed => "Completed",
            SwapStatus::Failed => "Failed",
            SwapStatus::Cancelled => "Cancelled",
        }
    }

    /// Vrai pour les états terminaux
    pub fn is_final(&self) -> bool {
        !matches!(self, SwapStatus::Pending)
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Transaction de swap simulée
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapTransaction {
    /// "swap_<millisecondes unix>"
    pub id: String,
    pub from_token: String,
    pub to_token: String,
    pub from_amount: Decimal,
    pub to_amount: Decimal,
    pub exchange_rate: Decimal,
    pub timestamp: DateTime<Utc>,
    pub status: SwapStatus,
}

impl SwapTransaction {
    /// Crée une transaction horodatée maintenant
    pub fn new(form: &SwapForm, to_amount: Decimal, exchange_rate: Decimal, status: SwapStatus) -> Self {
        let timestamp = Utc::now();

        Self {
            id: format!("swap_{}", timestamp.timestamp_millis()),
            from_token: form.from_token.clone(),
            to_token: form.to_token.clone(),
            from_amount: form.from_amount,
            to_amount,
            exchange_rate,
            timestamp,
            status,
        }
    }
}

/// Formate la partie entière avec des séparateurs de milliers
///
/// 1000000 → "1,000,000", 2500.5 → "2,500.5"
pub fn group_thousands(value: Decimal) -> String {
    let text = value.normalize().to_string();
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match fraction {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> SwapForm {
        SwapForm {
            from_token: "ETH".to_string(),
            to_token: "USDC".to_string(),
            from_amount: Decimal::from(2),
        }
    }

    #[test]
    fn test_validation_order() {
        let limits = SwapLimits::default();
        let mut form = SwapForm::new();
        assert_eq!(form.validate(&limits), Err(SwapValidationError::MissingFromToken));

        form.from_token = "ETH".to_string();
        assert_eq!(form.validate(&limits), Err(SwapValidationError::MissingToToken));

        form.to_token = "ETH".to_string();
        assert_eq!(form.validate(&limits), Err(SwapValidationError::SameToken));

        form.to_token = "USDC".to_string();
        assert_eq!(form.validate(&limits), Err(SwapValidationError::NonPositiveAmount));

        form.from_amount = Decimal::from(2_000_000);
        let err = form.validate(&limits).unwrap_err();
        assert_eq!(err.to_string(), "Amount cannot exceed 1,000,000");

        assert_eq!(filled_form().validate(&limits), Ok(()));
    }

    #[test]
    fn test_amount_text_parsing() {
        let mut form = filled_form();

        form.set_amount_text("12.5");
        assert_eq!(form.from_amount, Decimal::new(125, 1));

        form.set_amount_text("abc");
        assert_eq!(form.from_amount, Decimal::ZERO);

        form.set_amount_text("");
        assert_eq!(form.from_amount, Decimal::ZERO);
    }

    #[test]
    fn test_switch_and_reset() {
        let mut form = filled_form();
        form.switch_tokens();
        assert_eq!(form.from_token, "USDC");
        assert_eq!(form.to_token, "ETH");

        form.reset();
        assert_eq!(form, SwapForm::default());
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(Decimal::from(1_000_000)), "1,000,000");
        assert_eq!(group_thousands(Decimal::from(999)), "999");
        assert_eq!(group_thousands(Decimal::new(25005, 1)), "2,500.5");
        assert_eq!(group_thousands(Decimal::from(-12345)), "-12,345");
    }

    #[test]
    fn test_transaction_id_prefix() {
        let tx = SwapTransaction::new(&filled_form(), Decimal::ONE, Decimal::ONE, SwapStatus::Completed);
        assert!(tx.id.starts_with("swap_"));
        assert!(tx.status.is_final());
        assert!(!SwapStatus::Pending.is_final());
    }
}
