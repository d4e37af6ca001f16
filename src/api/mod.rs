// ============================================================================
// Module : api
// ============================================================================
// Sources de données externes : prix des tokens (HTTP) et balances du
// wallet (fichier JSON)
// ============================================================================

pub mod balances; // Source de balances (fichier)
pub mod prices;   // Client du service de prix

// Re-export des fonctions principales
pub use balances::load_balances;
pub use prices::{fetch_tokens, latest_prices, price_table};
