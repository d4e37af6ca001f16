// ============================================================================
// Walletboard - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;      // Service de prix + fichier de balances
pub mod app;      // État de l'application
pub mod config;   // Configuration (variables d'environnement)
pub mod models;   // Structures de données
pub mod pipeline; // Filtre → tri → enrichissement des balances
pub mod swap;     // Taux de change et swap simulé
pub mod ui;       // Interface utilisateur
