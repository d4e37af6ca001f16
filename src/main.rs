// ============================================================================
// Walletboard - Tableau de bord d'un wallet multi-chaînes
// ============================================================================
// Programme TUI : balances du wallet triées par priorité de chaîne et
// valorisées en USD, plus un formulaire de swap simulé
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle infinie qui gère événements et rendering
// 3. Async dans sync : tokio::runtime::Runtime pour appels API
// 4. Worker thread + channels : le réseau et le délai du swap ne bloquent
//    jamais l'interface
// ============================================================================

use std::io;
use std::path::Path;
use std::sync::mpsc;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use walletboard::api::{fetch_tokens, load_balances};
use walletboard::app::{App, SwapRequest};
use walletboard::config::{Config, SwapSettings};
use walletboard::models::{SwapTransaction, TokenInfo, WalletBalances};
use walletboard::swap::simulate_swap;
use walletboard::ui::{events::EventHandler, render};

// ============================================================================
// AppCommand : Commandes pour le worker thread
// ============================================================================
// CONCEPT RUST : Command pattern avec channels
// - L'event loop envoie des commandes au worker thread
// - Le worker exécute les tâches async (fetch des prix, swap simulé)
// - Les résultats reviennent par un second channel
// ============================================================================

/// Commandes envoyées au worker thread
#[derive(Debug)]
enum AppCommand {
    /// Recharger les prix depuis le service
    RefreshPrices,

    /// Exécuter un swap validé (annulable via request.cancel)
    ExecuteSwap(SwapRequest),
}

/// Résultats renvoyés par le worker thread
#[derive(Debug)]
enum AppResult {
    PricesLoaded(Vec<TokenInfo>),

    PricesError(String),

    /// Swap terminé (Completed, Failed ou Cancelled)
    SwapFinished(SwapTransaction),
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging dans une app TUI
// - Les println! ne fonctionnent pas une fois le TUI lancé
// - On log vers un fichier à rotation quotidienne
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// # Utilisation
/// ```bash
/// # Voir les logs en temps réel
/// tail -f ~/.local/share/walletboard/logs/walletboard.log.*
///
/// # Contrôler le niveau de log
/// RUST_LOG=walletboard=trace cargo run
/// ```
fn init_logging(log_dir: &Path) -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Échec de la création du répertoire de logs {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "walletboard.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour walletboard, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "walletboard=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    let config = Config::from_env().context("Configuration invalide")?;

    // Si le logging échoue on continue quand même
    init_logging(&config.log_dir).unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {:#}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(?config, "Walletboard starting up");

    // Balances : un fichier absent ou invalide donne un wallet vide
    let balances = match load_balances(&config.balances_path) {
        Ok(balances) => balances,
        Err(e) => {
            error!(error = ?e, "Failed to load balances");
            eprintln!("⚠️  {:#}", e);
            WalletBalances::default()
        }
    };

    println!("📊 Chargement des prix...");
    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;
    let (tokens, startup_error) = match runtime.block_on(fetch_tokens(&config)) {
        Ok(tokens) => {
            println!("✅ {} tokens chargés", tokens.len());
            (tokens, None)
        }
        Err(e) => {
            error!(error = ?e, "Initial price fetch failed");
            (Vec::new(), Some(format!("Price fetch failed: {:#}", e)))
        }
    };
    // Le worker a son propre runtime
    drop(runtime);

    let mut app = App::with_tokens(balances, tokens, config.missing_price);
    app.status_message = startup_error;

    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(command_rx, result_tx, config.clone());

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;
    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, &config.swap, command_tx, result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Background Worker Thread
// ============================================================================

/// Worker thread qui exécute les tâches async en arrière-plan
///
/// CONCEPT : block_on dans un worker thread
/// - block_on() bloque le worker, jamais l'UI
/// - Les commandes sont traitées une par une : un refresh demandé pendant
///   un swap attend la fin du swap
fn spawn_background_worker(
    command_rx: mpsc::Receiver<AppCommand>,
    result_tx: mpsc::Sender<AppResult>,
    config: Config,
) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = ?e, "Failed to create worker runtime");
                return;
            }
        };

        // recv() échoue quand l'event loop a droppé son Sender
        while let Ok(command) = command_rx.recv() {
            let result = match command {
                AppCommand::RefreshPrices => {
                    info!("Worker refreshing prices");
                    match runtime.block_on(fetch_tokens(&config)) {
                        Ok(tokens) => AppResult::PricesLoaded(tokens),
                        Err(e) => {
                            error!(error = ?e, "Failed to refresh prices");
                            AppResult::PricesError(format!("{:#}", e))
                        }
                    }
                }
                AppCommand::ExecuteSwap(request) => {
                    info!(from = %request.form.from_token, to = %request.form.to_token, "Worker executing swap");
                    let transaction = runtime.block_on(simulate_swap(
                        request.form,
                        request.rate,
                        &config.swap,
                        request.cancel,
                    ));
                    AppResult::SwapFinished(transaction)
                }
            };

            if result_tx.send(result).is_err() {
                break;
            }
        }

        info!("Worker thread exiting (channel closed)");
    });
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// À chaque itération :
//   0. Résultats du worker
//   1. Render
//   2. Input
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    swap_settings: &SwapSettings,
    command_tx: mpsc::Sender<AppCommand>,
    result_rx: mpsc::Receiver<AppResult>,
) -> Result<()> {
    while app.is_running() {
        // 0. RÉSULTATS : try_recv ne bloque pas
        loop {
            match result_rx.try_recv() {
                Ok(result) => apply_result(app, result, swap_settings),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    error!("Worker thread disconnected!");
                    break;
                }
            }
        }

        // 1. RENDER
        terminal.draw(|frame| render(frame, &*app))?;

        // 2. INPUT
        match events.next() {
            Ok(event) => handle_event(app, event, swap_settings, &command_tx),
            Err(e) => warn!(error = ?e, "Failed to read terminal event"),
        }
    }

    Ok(())
}

/// Applique un résultat du worker à l'état de l'application
fn apply_result(app: &mut App, result: AppResult, swap_settings: &SwapSettings) {
    match result {
        AppResult::PricesLoaded(tokens) => {
            info!(tokens = tokens.len(), "Prices refreshed");
            app.stop_loading();
            app.status_message = Some(format!("Prices refreshed ({} tokens)", tokens.len()));
            app.set_tokens(tokens);
        }
        AppResult::PricesError(error) => {
            app.stop_loading();
            app.status_message = Some(format!("Price refresh failed: {}", error));
        }
        AppResult::SwapFinished(transaction) => {
            info!(id = %transaction.id, status = %transaction.status, "Swap result received");
            app.finish_swap(transaction, swap_settings.failure_threshold);
        }
    }
}

// ============================================================================
// Gestion des événements
// ============================================================================

/// Traite un événement et met à jour l'état de l'application
///
/// CONCEPT RUST : Pattern matching avec guards
/// - Les mêmes touches n'ont pas le même effet selon l'écran
/// - L'ordre des bras compte : le premier qui matche gagne
fn handle_event(
    app: &mut App,
    event: walletboard::ui::events::Event,
    swap_settings: &SwapSettings,
    command_tx: &mpsc::Sender<AppCommand>,
) {
    use walletboard::ui::events::{
        get_char_from_event, is_amount_char_event, is_backspace_event, is_down_event, is_enter_event,
        is_escape_event, is_left_event, is_quit_event, is_refresh_event, is_right_event, is_swap_event,
        is_switch_tokens_event, is_tab_event, is_up_event, Event,
    };

    if matches!(event, Event::Tick) {
        return;
    }

    // Two-step quit : toute autre touche annule la confirmation
    if is_quit_event(&event) {
        if app.is_awaiting_quit_confirmation() {
            info!("User confirmed quit");
            app.quit();
        } else {
            info!("User requested quit (awaiting confirmation)");
            app.request_quit();
        }
        return;
    }
    app.cancel_quit();

    if app.is_on_dashboard() {
        match event {
            _ if is_up_event(&event) => app.navigate_up(),
            _ if is_down_event(&event) => app.navigate_down(),
            _ if is_refresh_event(&event) => {
                if !app.is_loading_data() {
                    info!("User requested price refresh");
                    app.start_loading(Some("Refreshing prices...".to_string()));
                    if command_tx.send(AppCommand::RefreshPrices).is_err() {
                        app.stop_loading();
                        app.status_message = Some("Background worker unavailable".to_string());
                    }
                }
            }
            _ if is_swap_event(&event) => {
                debug!("User opened swap screen");
                app.show_swap();
            }
            _ => {}
        }
        return;
    }

    // Écran Swap
    match event {
        _ if is_escape_event(&event) => {
            if app.cancel_swap() {
                info!("User cancelled pending swap");
            } else {
                debug!("User returned to dashboard");
                app.show_dashboard();
            }
        }
        // Formulaire figé pendant un swap en cours
        _ if app.is_swapping() => {}
        _ if is_tab_event(&event) => app.next_field(),
        _ if is_left_event(&event) => app.cycle_token(false),
        _ if is_right_event(&event) => app.cycle_token(true),
        _ if is_switch_tokens_event(&event) => app.switch_tokens(),
        _ if is_backspace_event(&event) => app.amount_backspace(),
        _ if is_amount_char_event(&event) => {
            if let Some(c) = get_char_from_event(&event) {
                app.append_amount_char(c);
            }
        }
        _ if is_enter_event(&event) => match app.begin_swap(&swap_settings.limits) {
            Ok(request) => {
                info!(from = %request.form.from_token, to = %request.form.to_token, amount = %request.form.from_amount, "User submitted swap");
                if command_tx.send(AppCommand::ExecuteSwap(request)).is_err() {
                    app.cancel_swap();
                    app.swap_error = Some("Background worker unavailable".to_string());
                }
            }
            Err(e) => debug!(error = %e, "Swap form rejected"),
        },
        _ => {}
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}
