// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
// ============================================================================

pub mod balance; // Balances brutes, lot validé, balances enrichies
pub mod chain;   // Enum Blockchain et table de priorités
pub mod swap;    // Formulaire et transactions de swap
pub mod token;   // Prix des tokens et catalogue

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use walletboard::models::chain::Blockchain;
// On peut faire : use walletboard::models::Blockchain;
pub use balance::{BalanceError, FormattedWalletBalance, WalletBalance, WalletBalances};
pub use chain::{Blockchain, SENTINEL_PRIORITY};
pub use swap::{group_thousands, SwapForm, SwapLimits, SwapStatus, SwapTransaction, SwapValidationError};
pub use token::{token_name, PriceTable, TokenInfo, TokenPrice};
