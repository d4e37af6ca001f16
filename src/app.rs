// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// CONCEPTS RUST :
// 1. State Management : centraliser l'état dans une seule structure
// 2. Mutabilité contrôlée : &mut self pour modifier l'état
// 3. Valeurs dérivées : `rows` est recalculé à chaque changement d'entrée
//    (balances ou prix), jamais modifié à la main
//
// PATTERN : Cette structure suit le pattern "Application State"
// - Tous les composants de l'UI lisent depuis App
// - Toutes les modifications passent par les méthodes de App
// ============================================================================

use rust_decimal::Decimal;
use tokio::sync::oneshot;

use crate::api::price_table;
use crate::models::{
    group_thousands, FormattedWalletBalance, PriceTable, SwapForm, SwapLimits, SwapStatus, SwapTransaction, SwapValidationError,
    TokenInfo, WalletBalances,
};
use crate::pipeline::{format_wallet_balances, MissingPricePolicy};
use crate::swap::{exchange_rate, to_amount};

/// Écrans de l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : tableau des balances
    Dashboard,

    /// Formulaire de swap + historique
    Swap,
}

/// Champ du formulaire de swap qui reçoit les touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapField {
    From,
    To,
    Amount,
}

impl SwapField {
    /// Champ suivant (Tab)
    pub fn next(&self) -> SwapField {
        match self {
            SwapField::From => SwapField::To,
            SwapField::To => SwapField::Amount,
            SwapField::Amount => SwapField::From,
        }
    }
}

/// Swap validé, prêt à être envoyé au worker
#[derive(Debug)]
pub struct SwapRequest {
    pub form: SwapForm,
    pub rate: Decimal,

    /// Reçoit le signal d'annulation envoyé par App::cancel_swap()
    pub cancel: oneshot::Receiver<()>,
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Écran actuellement affiché
    pub current_screen: Screen,

    /// Two-step quit : première pression de 'q' arme la confirmation
    pub confirm_quit: bool,

    /// Balances brutes (source)
    pub balances: WalletBalances,

    /// Table de prix courante
    pub prices: PriceTable,

    /// Tokens disponibles pour le swap
    pub tokens: Vec<TokenInfo>,

    /// Politique appliquée aux balances sans prix
    pub missing_price: MissingPricePolicy,

    /// Lignes affichées, sortie du pipeline
    pub rows: Vec<FormattedWalletBalance>,

    /// Ligne sélectionnée, repérée par id
    /// CONCEPT : Sélection par clé
    /// - Un re-tri après rafraîchissement des prix déplace les lignes
    /// - L'id garde la même balance sélectionnée, pas la même position
    pub selected_id: Option<String>,

    /// Indique si des données sont en cours de chargement
    pub is_loading: bool,
    pub loading_message: Option<String>,

    /// Dernier message d'état (succès ou erreur)
    pub status_message: Option<String>,

    // ---- Swap ----
    pub swap_form: SwapForm,

    /// Texte saisi pour le montant (le formulaire garde la valeur parsée)
    pub amount_input: String,

    pub swap_focus: SwapField,

    /// Erreur de validation affichée sous le formulaire
    pub swap_error: Option<String>,

    /// Signal d'annulation du swap en cours (Some = swap en cours)
    pending_cancel: Option<oneshot::Sender<()>>,

    /// Historique des swaps, le plus récent en premier
    pub history: Vec<SwapTransaction>,
}

impl App {
    /// Crée une App avec des balances mais sans prix
    pub fn new(balances: WalletBalances, missing_price: MissingPricePolicy) -> Self {
        let mut app = Self {
            running: true,
            current_screen: Screen::Dashboard,
            confirm_quit: false,
            balances,
            prices: PriceTable::new(),
            tokens: Vec::new(),
            missing_price,
            rows: Vec::new(),
            selected_id: None,
            is_loading: false,
            loading_message: None,
            status_message: None,
            swap_form: SwapForm::new(),
            amount_input: String::new(),
            swap_focus: SwapField::From,
            swap_error: None,
            pending_cancel: None,
            history: Vec::new(),
        };
        app.refresh_rows();
        app
    }

    /// Crée une App avec balances et tokens déjà chargés
    pub fn with_tokens(balances: WalletBalances, tokens: Vec<TokenInfo>, missing_price: MissingPricePolicy) -> Self {
        let mut app = Self::new(balances, missing_price);
        app.set_tokens(tokens);
        app
    }

    // ========================================================================
    // Données
    // ========================================================================

    /// Remplace le catalogue de tokens (et donc la table de prix)
    pub fn set_tokens(&mut self, tokens: Vec<TokenInfo>) {
        self.prices = price_table(&tokens);
        self.tokens = tokens;
        self.refresh_rows();
    }

    /// Remplace les balances
    pub fn set_balances(&mut self, balances: WalletBalances) {
        self.balances = balances;
        self.refresh_rows();
    }

    /// Recalcule les lignes affichées depuis les entrées courantes
    ///
    /// La sélection suit l'id ; si la balance a disparu on revient en haut.
    pub fn refresh_rows(&mut self) {
        self.rows = format_wallet_balances(&self.balances, &self.prices, self.missing_price);

        let still_present = self
            .selected_id
            .as_ref()
            .is_some_and(|id| self.rows.iter().any(|row| &row.id == id));

        if !still_present {
            self.selected_id = self.rows.first().map(|row| row.id.clone());
        }
    }

    /// Index de la ligne sélectionnée dans `rows`
    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected_id.as_ref()?;
        self.rows.iter().position(|row| &row.id == id)
    }

    /// Ligne sélectionnée
    pub fn selected_row(&self) -> Option<&FormattedWalletBalance> {
        self.selected_index().and_then(|index| self.rows.get(index))
    }

    /// Somme des valeurs USD des lignes affichées (saturée à Decimal::MAX)
    pub fn total_value(&self) -> Decimal {
        self.rows
            .iter()
            .fold(Decimal::ZERO, |total, row| total.saturating_add(row.fiat_value))
    }

    /// Navigue vers le haut dans le tableau
    pub fn navigate_up(&mut self) {
        if let Some(index) = self.selected_index() {
            self.select_index(index.saturating_sub(1));
        }
    }

    /// Navigue vers le bas dans le tableau
    pub fn navigate_down(&mut self) {
        if let Some(index) = self.selected_index() {
            let max_index = self.rows.len().saturating_sub(1);
            self.select_index((index + 1).min(max_index));
        }
    }

    fn select_index(&mut self, index: usize) {
        if let Some(row) = self.rows.get(index) {
            self.selected_id = Some(row.id.clone());
        }
    }

    // ========================================================================
    // Cycle de vie
    // ========================================================================

    pub fn quit(&mut self) {
        self.running = false;
        // Un swap en cours se termine en Cancelled
        self.cancel_swap();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    /// Le message de chargement remplace le dernier message d'état
    pub fn start_loading(&mut self, message: Option<String>) {
        self.is_loading = true;
        self.loading_message = message;
        self.status_message = None;
    }

    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.loading_message = None;
    }

    pub fn is_loading_data(&self) -> bool {
        self.is_loading
    }

    pub fn show_swap(&mut self) {
        self.current_screen = Screen::Swap;
        self.swap_error = None;
    }

    pub fn show_dashboard(&mut self) {
        self.current_screen = Screen::Dashboard;
    }

    pub fn is_on_dashboard(&self) -> bool {
        self.current_screen == Screen::Dashboard
    }

    // ========================================================================
    // Formulaire de swap
    // ========================================================================

    /// Passe au champ suivant
    pub fn next_field(&mut self) {
        self.swap_focus = self.swap_focus.next();
    }

    /// Change le token du champ actif (From ou To)
    ///
    /// CONCEPT : Tokens désactivés
    /// - Le token déjà choisi de l'autre côté est sauté
    /// - Sans effet si le champ actif est le montant
    pub fn cycle_token(&mut self, forward: bool) {
        let (current, other) = match self.swap_focus {
            SwapField::From => (&self.swap_form.from_token, &self.swap_form.to_token),
            SwapField::To => (&self.swap_form.to_token, &self.swap_form.from_token),
            SwapField::Amount => return,
        };

        let candidates: Vec<&str> = self
            .tokens
            .iter()
            .map(|token| token.currency.as_str())
            .filter(|currency| *currency != other.as_str())
            .collect();

        if candidates.is_empty() {
            return;
        }

        let len = candidates.len();
        let next = match candidates.iter().position(|c| *c == current.as_str()) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        let chosen = candidates[next].to_string();

        match self.swap_focus {
            SwapField::From => self.swap_form.from_token = chosen,
            SwapField::To => self.swap_form.to_token = chosen,
            SwapField::Amount => {}
        }
        self.swap_error = None;
    }

    /// Ajoute un caractère au montant (chiffres et un seul point)
    pub fn append_amount_char(&mut self, c: char) {
        let accepted = c.is_ascii_digit() || (c == '.' && !self.amount_input.contains('.'));
        if accepted {
            self.amount_input.push(c);
            self.swap_form.set_amount_text(&self.amount_input);
            self.swap_error = None;
        }
    }

    /// Supprime le dernier caractère du montant
    pub fn amount_backspace(&mut self) {
        self.amount_input.pop();
        self.swap_form.set_amount_text(&self.amount_input);
    }

    /// Inverse les tokens source et cible
    pub fn switch_tokens(&mut self) {
        self.swap_form.switch_tokens();
    }

    /// Taux de change courant du formulaire
    pub fn exchange_rate(&self) -> Decimal {
        exchange_rate(&self.swap_form.from_token, &self.swap_form.to_token, &self.prices)
    }

    /// Montant cible courant du formulaire
    pub fn to_amount(&self) -> Option<Decimal> {
        to_amount(self.swap_form.from_amount, self.exchange_rate())
    }

    /// Vrai si un swap attend sa résolution
    pub fn is_swapping(&self) -> bool {
        self.pending_cancel.is_some()
    }

    /// Valide le formulaire et prépare l'envoi du swap
    ///
    /// L'erreur de validation est aussi stockée pour l'affichage.
    pub fn begin_swap(&mut self, limits: &SwapLimits) -> Result<SwapRequest, SwapValidationError> {
        if let Err(e) = self.swap_form.validate(limits) {
            self.swap_error = Some(e.to_string());
            return Err(e);
        }

        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.pending_cancel = Some(cancel_tx);
        self.swap_error = None;
        self.status_message = None;

        Ok(SwapRequest {
            form: self.swap_form.clone(),
            rate: self.exchange_rate(),
            cancel: cancel_rx,
        })
    }

    /// Annule le swap en cours ; retourne false s'il n'y en a pas
    pub fn cancel_swap(&mut self) -> bool {
        match self.pending_cancel.take() {
            Some(cancel_tx) => {
                // Le worker a peut-être déjà terminé : l'échec d'envoi est sans importance
                let _ = cancel_tx.send(());
                true
            }
            None => false,
        }
    }

    /// Enregistre le résultat d'un swap
    ///
    /// `failure_threshold` est repris dans le message d'un swap Failed.
    pub fn finish_swap(&mut self, transaction: SwapTransaction, failure_threshold: Decimal) {
        self.pending_cancel = None;

        self.status_message = Some(match transaction.status {
            SwapStatus::Completed => "Swap completed successfully!".to_string(),
            SwapStatus::Cancelled => "Swap was cancelled".to_string(),
            SwapStatus::Failed => format!(
                "Swap failed: Amount {} exceeds maximum limit of {}",
                group_thousands(transaction.from_amount),
                group_thousands(failure_threshold)
            ),
            SwapStatus::Pending => "Swap pending".to_string(),
        });

        if transaction.status == SwapStatus::Completed {
            self.swap_form.reset();
            self.amount_input.clear();
        }

        self.history.insert(0, transaction);
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Blockchain, WalletBalance};
    use chrono::Utc;

    fn token(currency: &str, price: i64) -> TokenInfo {
        TokenInfo {
            currency: currency.to_string(),
            date: Utc::now(),
            price: Decimal::from(price),
            name: currency.to_string(),
            icon: String::new(),
        }
    }

    fn balances() -> WalletBalances {
        WalletBalances::new(vec![
            WalletBalance::new("eth", "ETH", Decimal::from(2), Blockchain::Ethereum),
            WalletBalance::new("neo", "NEO", Decimal::from(1), Blockchain::Neo),
            WalletBalance::new("osmo", "OSMO", Decimal::from(10), Blockchain::Osmosis),
        ])
        .unwrap()
    }

    fn app() -> App {
        App::with_tokens(
            balances(),
            vec![token("ETH", 3000), token("NEO", 8), token("OSMO", 1), token("USDC", 1)],
            MissingPricePolicy::ZeroValue,
        )
    }

    #[test]
    fn test_app_creation() {
        let app = app();
        assert!(app.is_running());
        assert!(app.is_on_dashboard());

        let ids: Vec<&str> = app.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["osmo", "eth", "neo"]);
        assert_eq!(app.selected_id.as_deref(), Some("osmo"));
        assert_eq!(app.total_value(), Decimal::from(6018));
    }

    #[test]
    fn test_navigation() {
        let mut app = app();

        app.navigate_up();
        assert_eq!(app.selected_index(), Some(0));

        app.navigate_down();
        app.navigate_down();
        app.navigate_down();
        assert_eq!(app.selected_index(), Some(2));
        assert_eq!(app.selected_row().map(|r| r.id.as_str()), Some("neo"));
    }

    #[test]
    fn test_selection_follows_id_after_resort() {
        let mut app = app();
        app.navigate_down(); // "eth"
        assert_eq!(app.selected_index(), Some(1));

        // OSMO disparaît (montant nul) : eth remonte en tête
        app.set_balances(
            WalletBalances::new(vec![
                WalletBalance::new("eth", "ETH", Decimal::from(2), Blockchain::Ethereum),
                WalletBalance::new("osmo", "OSMO", Decimal::ZERO, Blockchain::Osmosis),
            ])
            .unwrap(),
        );

        assert_eq!(app.selected_id.as_deref(), Some("eth"));
        assert_eq!(app.selected_index(), Some(0));
    }

    #[test]
    fn test_missing_price_rows() {
        let app = App::new(balances(), MissingPricePolicy::ZeroValue);
        assert_eq!(app.rows.len(), 3);
        assert!(app.rows.iter().all(|r| !r.priced));

        let app = App::new(balances(), MissingPricePolicy::Exclude);
        assert!(app.rows.is_empty());
        assert_eq!(app.selected_id, None);
    }

    #[test]
    fn test_cycle_token_skips_other_side() {
        let mut app = app();

        app.cycle_token(true);
        assert_eq!(app.swap_form.from_token, "ETH");

        app.next_field();
        app.cycle_token(true);
        assert_eq!(app.swap_form.to_token, "NEO"); // ETH est sauté

        app.cycle_token(false);
        assert_eq!(app.swap_form.to_token, "USDC"); // retour en fin de liste
    }

    #[test]
    fn test_amount_input() {
        let mut app = app();
        for c in "12.5.x3".chars() {
            app.append_amount_char(c);
        }
        assert_eq!(app.amount_input, "12.53");
        assert_eq!(app.swap_form.from_amount, Decimal::new(1253, 2));

        app.amount_backspace();
        assert_eq!(app.swap_form.from_amount, Decimal::new(125, 1));
    }

    #[test]
    fn test_swap_lifecycle() {
        let mut app = app();
        let limits = SwapLimits::default();

        assert!(app.begin_swap(&limits).is_err());
        assert_eq!(app.swap_error.as_deref(), Some("Please select a token to swap from"));

        app.swap_form.from_token = "ETH".to_string();
        app.swap_form.to_token = "USDC".to_string();
        app.append_amount_char('2');
        assert_eq!(app.to_amount(), Some(Decimal::from(6000)));

        let mut request = app.begin_swap(&limits).unwrap();
        assert!(app.is_swapping());
        assert_eq!(request.rate, Decimal::from(3000));

        assert!(app.cancel_swap());
        assert!(!app.is_swapping());
        assert!(request.cancel.try_recv().is_ok());

        let tx = SwapTransaction::new(&request.form, Decimal::from(6000), request.rate, SwapStatus::Completed);
        app.finish_swap(tx, Decimal::from(100_000));
        assert_eq!(app.history.len(), 1);
        assert_eq!(app.swap_form, SwapForm::default());
        assert!(app.amount_input.is_empty());
    }

    #[test]
    fn test_history_newest_first() {
        let mut app = app();
        app.swap_form.from_token = "ETH".to_string();
        let form = SwapForm {
            from_token: "ETH".to_string(),
            to_token: "USDC".to_string(),
            from_amount: Decimal::ONE,
        };

        let threshold = Decimal::from(100_000);
        app.finish_swap(SwapTransaction::new(&form, Decimal::ONE, Decimal::ONE, SwapStatus::Failed), threshold);
        app.finish_swap(SwapTransaction::new(&form, Decimal::ONE, Decimal::ONE, SwapStatus::Cancelled), threshold);

        assert_eq!(app.history[0].status, SwapStatus::Cancelled);
        assert_eq!(app.history[1].status, SwapStatus::Failed);
        // Un échec ne vide pas le formulaire
        assert_eq!(app.swap_form.from_token, "ETH");
    }

    #[test]
    fn test_failed_swap_message_names_threshold() {
        let mut app = app();
        let form = SwapForm {
            from_token: "ETH".to_string(),
            to_token: "USDC".to_string(),
            from_amount: Decimal::from(250_000),
        };

        app.finish_swap(
            SwapTransaction::new(&form, Decimal::ONE, Decimal::ONE, SwapStatus::Failed),
            Decimal::from(100_000),
        );

        assert_eq!(
            app.status_message.as_deref(),
            Some("Swap failed: Amount 250,000 exceeds maximum limit of 100,000")
        );
    }

    #[test]
    fn test_status_message_survives_navigation() {
        let mut app = app();
        app.status_message = Some("Price refresh failed: timeout".to_string());

        app.navigate_down();
        app.navigate_up();
        app.show_swap();
        app.show_dashboard();
        assert_eq!(app.status_message.as_deref(), Some("Price refresh failed: timeout"));

        // Un nouveau chargement remplace le message
        app.start_loading(Some("Refreshing prices...".to_string()));
        assert_eq!(app.status_message, None);
    }

    #[test]
    fn test_total_value_saturates() {
        let huge = Decimal::from_str_exact("50000000000000000000000000000").unwrap();
        let app = App::with_tokens(
            WalletBalances::new(vec![
                WalletBalance::new("eth", "ETH", huge, Blockchain::Ethereum),
                WalletBalance::new("neo", "NEO", huge, Blockchain::Neo),
            ])
            .unwrap(),
            vec![token("ETH", 1), token("NEO", 1)],
            MissingPricePolicy::ZeroValue,
        );

        assert_eq!(app.rows.len(), 2);
        assert_eq!(app.total_value(), Decimal::MAX);
    }

    #[test]
    fn test_app_quit() {
        let mut app = app();
        app.quit();
        assert!(!app.is_running());
    }
}
