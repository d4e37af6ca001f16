// ============================================================================
// Dashboard - Rendu de l'interface
// ============================================================================
// Dessine le tableau des balances et le formulaire de swap avec ratatui
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Widgets : Block, Paragraph, Table, List
// 3. Layout : découpage de l'espace en zones
// 4. TableState : ligne sélectionnée d'un tableau
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, Screen, SwapField};
use crate::models::{SwapStatus, SwapTransaction};
use crate::pipeline::format_fixed;
use crate::swap::TO_AMOUNT_DP;

/// Dessine l'interface complète selon l'écran actif
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, app, chunks[0]);

    match app.current_screen {
        Screen::Dashboard => render_balances(frame, app, chunks[1]),
        Screen::Swap => render_swap_screen(frame, app, chunks[1]),
    }

    render_footer(frame, app, chunks[2]);
}

/// Crée le layout principal (header, content, footer)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area)
        .to_vec()
}

fn key_style(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Header : titre + valeur totale du wallet
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Walletboard ")
        .title_alignment(Alignment::Center);

    let mut spans = vec![
        Span::styled("Total ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("${}", format_fixed(app.total_value(), 2)),
            key_style(Color::Green),
        ),
        Span::styled(
            format!("  ·  {} balances  ·  {} tokens", app.rows.len(), app.tokens.len()),
            Style::default().fg(Color::Gray),
        ),
    ];

    if app.is_loading_data() {
        let message = app.loading_message.as_deref().unwrap_or("Loading...");
        spans.push(Span::styled(format!("  ⟳ {}", message), Style::default().fg(Color::Yellow)));
    }

    // Le dernier message d'état reste visible sans masquer les raccourcis
    if let Some(message) = &app.status_message {
        spans.push(Span::styled(format!("  ·  {}", message), key_style(Color::Magenta)));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tableau des balances
// ============================================================================

/// Dessine les balances enrichies, dans l'ordre du pipeline
///
/// CONCEPT : Lignes repérées par id
/// - La sélection est un id dans App, convertie ici en index pour TableState
fn render_balances(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Balances ");

    if app.rows.is_empty() {
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("Aucune balance à afficher", Style::default().fg(Color::Gray))),
        ])
        .block(block)
        .alignment(Alignment::Center);

        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(vec!["Chain", "Currency", "Amount", "USD value"])
        .style(key_style(Color::Yellow))
        .bottom_margin(1);

    let rows: Vec<Row> = app
        .rows
        .iter()
        .map(|row| {
            let value_style = if row.priced {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            };

            Row::new(vec![
                Cell::from(row.blockchain.label()),
                Cell::from(row.currency.clone()),
                Cell::from(row.formatted_amount.clone()),
                Cell::from(row.display_value()).style(value_style),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(18),
        Constraint::Min(14),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));

    let mut state = TableState::default();
    state.select(app.selected_index());

    frame.render_stateful_widget(table, area, &mut state);
}

// ============================================================================
// Formulaire de swap + historique
// ============================================================================

fn render_swap_screen(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_swap_form(frame, app, columns[0]);
    render_history(frame, &app.history, columns[1]);
}

/// Une ligne "label : valeur" du formulaire, surlignée si active
fn field_line<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let value_style = if focused {
        Style::default().fg(Color::Black).bg(Color::Cyan)
    } else {
        Style::default().fg(Color::White)
    };
    let marker = if focused { "▶ " } else { "  " };

    Line::from(vec![
        Span::styled(marker, key_style(Color::Cyan)),
        Span::styled(format!("{:<8}", label), Style::default().fg(Color::Gray)),
        Span::styled(value, value_style),
    ])
}

fn render_swap_form(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" Currency Swap ");

    let form = &app.swap_form;
    let token_label = |currency: &str| -> String {
        if currency.is_empty() {
            "(select)".to_string()
        } else {
            let name = app
                .tokens
                .iter()
                .find(|t| t.currency == currency)
                .map(|t| t.name.as_str())
                .unwrap_or(currency);
            format!("{} - {}", currency, name)
        }
    };

    let amount_text = if app.amount_input.is_empty() {
        "0".to_string()
    } else {
        app.amount_input.clone()
    };

    let rate = app.exchange_rate();
    let to_amount = app
        .to_amount()
        .map(|amount| format_fixed(amount, TO_AMOUNT_DP))
        .unwrap_or_default();

    let mut lines = vec![
        Line::from(""),
        field_line("From", token_label(&form.from_token), app.swap_focus == SwapField::From),
        field_line("Amount", amount_text, app.swap_focus == SwapField::Amount),
        Line::from(""),
        field_line("To", token_label(&form.to_token), app.swap_focus == SwapField::To),
        field_line("Receive", to_amount, false),
        Line::from(""),
    ];

    if !rate.is_zero() {
        lines.push(Line::from(Span::styled(
            format!(
                "  1 {} = {} {}",
                form.from_token,
                format_fixed(rate, TO_AMOUNT_DP),
                form.to_token
            ),
            Style::default().fg(Color::Gray),
        )));
    }

    if app.is_swapping() {
        lines.push(Line::from(Span::styled(
            "  ⟳ Swapping... [ESC] pour annuler",
            key_style(Color::Yellow),
        )));
    }

    if let Some(error) = &app.swap_error {
        lines.push(Line::from(Span::styled(format!("  ✗ {}", error), key_style(Color::Red))));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn status_color(status: SwapStatus) -> Color {
    match status {
        SwapStatus::Completed => Color::Green,
        SwapStatus::Failed => Color::Red,
        SwapStatus::Cancelled => Color::Yellow,
        SwapStatus::Pending => Color::Gray,
    }
}

/// Historique des swaps, le plus récent en haut
fn render_history(frame: &mut Frame, history: &[SwapTransaction], area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" History ({}) ", history.len()));

    let items: Vec<ListItem> = history
        .iter()
        .map(|tx| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(format!("{:<10}", tx.status.label()), key_style(status_color(tx.status))),
                    Span::styled(
                        tx.timestamp.format("%b %d, %H:%M:%S").to_string(),
                        Style::default().fg(Color::Gray),
                    ),
                ]),
                Line::from(format!(
                    "  {} {} → {} {}",
                    tx.from_amount,
                    tx.from_token,
                    format_fixed(tx.to_amount, TO_AMOUNT_DP),
                    tx.to_token
                )),
            ])
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

// ============================================================================
// Footer : raccourcis et confirmation de quit
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let line = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled("⚠  Appuyez sur ", key_style(Color::Yellow)),
            Span::styled("[q]", key_style(Color::Red).add_modifier(Modifier::SLOW_BLINK)),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                key_style(Color::Yellow),
            ),
        ])
    } else {
        match app.current_screen {
            Screen::Dashboard => Line::from(vec![
                Span::styled("[q]", key_style(Color::Yellow)),
                Span::raw(" Quit  "),
                Span::styled("[↑↓ / j k]", key_style(Color::Yellow)),
                Span::raw(" Navigate  "),
                Span::styled("[r]", key_style(Color::Green)),
                Span::raw(" Refresh prices  "),
                Span::styled("[s]", key_style(Color::Green)),
                Span::raw(" Swap"),
            ]),
            Screen::Swap => Line::from(vec![
                Span::styled("[Tab]", key_style(Color::Yellow)),
                Span::raw(" Field  "),
                Span::styled("[←→]", key_style(Color::Yellow)),
                Span::raw(" Token  "),
                Span::styled("[x]", key_style(Color::Yellow)),
                Span::raw(" Switch  "),
                Span::styled("[Enter]", key_style(Color::Green)),
                Span::raw(" Swap  "),
                Span::styled("[ESC]", key_style(Color::Red)),
                Span::raw(" Cancel / Back"),
            ]),
        }
    };

    let paragraph = Paragraph::new(vec![line])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}
