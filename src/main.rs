mod app;
mod cli;
mod commands;
mod config;
mod datasources;
mod error;
mod logic;
mod models;
mod ui;

use app::{App, CorrectionsFocus, Screen, PROGRAM_RATE_STEP, RATE_STEP};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use datasources::{CommentsClient, ExtractionClient};
use models::MoveDirection;
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use ui::screens::{
    CommentsScreen, CorrectionsScreen, NutrientsScreen, ProgramDraft, ProgramsScreen, ScoreScreen,
    TankMixScreen,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Init) => {
            let (_, path) = Config::setup_interactive(cli.config)?;
            println!("Config written to {}", path.display());
            Ok(())
        }
        Some(Commands::Catalog {
            nutrient,
            release,
            search,
        }) => commands::catalog(nutrient.as_deref(), release.as_deref(), search.as_deref()),
        Some(Commands::Check) => {
            let config = Config::load(cli.config)?;
            commands::check(&config).await
        }
        Some(Commands::Analyze { file }) => {
            let config = load_or_default(cli.config);
            commands::analyze(&file, &config)
        }
        Some(Commands::Extract { pdf, output }) => {
            let config = load_or_default(cli.config);
            commands::extract(&pdf, output.as_deref(), &config).await
        }
        Some(Commands::Recommend {
            file,
            nutrient,
            paddock,
        }) => {
            let config = load_or_default(cli.config);
            commands::recommend(&file, &nutrient, paddock.as_deref(), &config)
        }
        Some(Commands::Comments {
            file,
            paddock,
            offline,
        }) => {
            let config = load_or_default(cli.config);
            commands::comments(&file, paddock.as_deref(), offline, &config).await
        }
        Some(Commands::Export {
            file,
            output,
            paddock,
        }) => {
            let config = load_or_default(cli.config);
            commands::export(&file, &output, paddock.as_deref(), &config).await
        }
        Some(Commands::Tui { file }) => run_tui(cli.config, file).await,
        None => run_tui(cli.config, None).await,
    }
}

/// Commands that only read a saved report can run on defaults.
fn load_or_default(config_override: Option<PathBuf>) -> Config {
    match Config::load(config_override) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("{}; using defaults", e);
            Config::default()
        }
    }
}

async fn run_tui(config_override: Option<PathBuf>, file: Option<PathBuf>) -> anyhow::Result<()> {
    // First run: walk through setup before entering the TUI
    let config = if Config::exists(config_override.as_ref()) {
        Config::load(config_override)?
    } else {
        let (config, _) = Config::setup_interactive(config_override)?;
        config
    };

    let mut app = App::new(config);
    if let Some(file) = file {
        let analyses = commands::read_report(&file, &app.config)?;
        app.load_analyses(analyses);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        // Work queued by the previous keypress, now that its status is on screen
        if let Some(pdf) = app.pending_pdf.take() {
            let client = ExtractionClient::new(
                &app.config.services.extraction_url,
                app.config.agronomy.status_thresholds,
            );
            let result = client.extract(&pdf).await;
            app.finish_extraction(result);
        }

        // Comments requested on the comments screen
        if app.needs_comments {
            app.needs_comments = false;
            if let Some((key, inputs)) = app.paddock().map(|p| (p.key.clone(), p.comment_inputs())) {
                let client = CommentsClient::new(
                    &app.config.services.comments_url,
                    app.config.services.ai_comments_key.clone(),
                );
                let result = client.fetch(&key, &inputs).await;
                app.apply_comments(result);
            }
        }

        // Handle input with timeout for async operations
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                let editing = app.is_editing();
                match key.code {
                    KeyCode::Char('q') if !editing => {
                        app.quit();
                    }
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        app.quit();
                    }
                    KeyCode::Esc if !editing => {
                        app.switch_screen(Screen::Nutrients);
                    }
                    KeyCode::Char('[') if !editing => app.prev_paddock(),
                    KeyCode::Char(']') if !editing => app.next_paddock(),
                    KeyCode::Char(c) if !editing => {
                        if let Some(screen) = Screen::from_key(c) {
                            app.switch_screen(screen);
                        } else {
                            handle_screen_input(app, key.code);
                        }
                    }
                    _ => {
                        handle_screen_input(app, key.code);
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn draw(f: &mut Frame, app: &App) {
    let area = f.area();
    let status = app.status_message.as_deref();

    let Some(paddock) = app.paddock() else {
        let screen = NutrientsScreen::new(None, &[])
            .with_status(status)
            .with_pdf_input(app.pdf_input.as_deref());
        f.render_widget(screen, area);
        return;
    };

    match app.screen {
        Screen::Nutrients => {
            let ratios = paddock.ratios();
            let screen = NutrientsScreen::new(Some(paddock), &ratios)
                .with_position(app.current, app.paddocks.len())
                .with_selection(app.nutrients_state.selected_index)
                .with_status(status)
                .with_pdf_input(app.pdf_input.as_deref());
            f.render_widget(screen, area);
        }
        Screen::Corrections => {
            let plan = paddock.corrections();
            let options = app.current_options();
            let progress = app.current_progress();
            let state = &app.corrections_state;
            let screen = CorrectionsScreen::new(&plan, &options, &paddock.selections, &state.filter)
                .with_progress(progress.as_ref())
                .with_selection(state.selected_correction, state.selected_option)
                .with_focus(state.focus, state.searching)
                .with_max_excess(app.config.agronomy.max_excess_percent())
                .with_status(status);
            f.render_widget(screen, area);
        }
        Screen::Score => {
            let health = paddock.health();
            let name = paddock.display_name();
            f.render_widget(ScoreScreen::new(&health, &name), area);
        }
        Screen::Comments => {
            let screen = CommentsScreen::new(app.current_comments())
                .with_scroll(app.comments_state.scroll)
                .with_pending(app.needs_comments)
                .with_status(status);
            f.render_widget(screen, area);
        }
        Screen::TankMix => {
            let mixed: Vec<&str> = paddock
                .tank_mix
                .items()
                .iter()
                .flat_map(|i| i.products.iter().map(String::as_str))
                .collect();
            let mut unassigned: Vec<&str> = Vec::new();
            for entry in paddock.amendments.entries() {
                let product = entry.fertilizer.as_str();
                if !mixed.contains(&product) && !unassigned.contains(&product) {
                    unassigned.push(product);
                }
            }
            let screen = TankMixScreen::new(&paddock.tank_mix)
                .with_unassigned(unassigned)
                .with_selection(app.tank_mix_state.selected_index)
                .with_status(status);
            f.render_widget(screen, area);
        }
        Screen::Programs => {
            let state = &app.programs_state;
            let draft = ProgramDraft {
                product: app.draft_program_product(),
                rate: state.rate,
                unit: state.unit(),
            };
            let screen = ProgramsScreen::new(&paddock.programs, state.kind, draft)
                .with_selection(state.selected_item)
                .with_status(status);
            f.render_widget(screen, area);
        }
    }
}

fn handle_screen_input(app: &mut App, code: KeyCode) {
    if app.pdf_input.is_some() {
        handle_pdf_input(app, code);
        return;
    }
    match app.screen {
        Screen::Nutrients => handle_nutrients_input(app, code),
        Screen::Corrections => handle_corrections_input(app, code),
        Screen::Score => {}
        Screen::Comments => handle_comments_input(app, code),
        Screen::TankMix => handle_tank_mix_input(app, code),
        Screen::Programs => handle_programs_input(app, code),
    }
}

fn handle_pdf_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.cancel_pdf_input(),
        KeyCode::Enter => app.submit_pdf_input(),
        KeyCode::Backspace => {
            if let Some(input) = app.pdf_input.as_mut() {
                input.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(input) = app.pdf_input.as_mut() {
                input.push(c);
            }
        }
        _ => {}
    }
}

fn handle_nutrients_input(app: &mut App, code: KeyCode) {
    let count = app.paddock().map_or(0, |p| p.profile.nutrients.len());
    match code {
        KeyCode::Up => app.nutrients_state.prev(),
        KeyCode::Down => app.nutrients_state.next(count),
        KeyCode::Char('o') => app.start_pdf_input(),
        _ => {}
    }
}

fn handle_corrections_input(app: &mut App, code: KeyCode) {
    if app.corrections_state.searching {
        match code {
            KeyCode::Enter | KeyCode::Esc => app.corrections_state.searching = false,
            KeyCode::Backspace => {
                app.corrections_state.filter.search.pop();
                app.corrections_state.selected_option = 0;
            }
            KeyCode::Char(c) => {
                app.corrections_state.filter.search.push(c);
                app.corrections_state.selected_option = 0;
            }
            _ => {}
        }
        return;
    }

    let count = match app.corrections_state.focus {
        CorrectionsFocus::Deficiencies => app.paddock().map_or(0, |p| p.corrections().len()),
        CorrectionsFocus::Options => app.current_options().len(),
    };
    match code {
        KeyCode::Up => app.corrections_state.prev(),
        KeyCode::Down => app.corrections_state.next(count),
        KeyCode::Tab => app.corrections_state.toggle_focus(),
        KeyCode::Enter => app.add_selected_option(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_last_rate(RATE_STEP),
        KeyCode::Char('-') => app.adjust_last_rate(-RATE_STEP),
        KeyCode::Char('d') => app.remove_last_selection(),
        KeyCode::Char('f') => app.corrections_state.cycle_release(),
        KeyCode::Char('/') => {
            app.corrections_state.focus = CorrectionsFocus::Options;
            app.corrections_state.searching = true;
        }
        _ => {}
    }
}

fn handle_comments_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('g') => app.request_comments(),
        KeyCode::Char('e') => app.export_to_file(),
        KeyCode::Up => {
            app.comments_state.scroll = app.comments_state.scroll.saturating_sub(1);
        }
        KeyCode::Down => {
            app.comments_state.scroll = app.comments_state.scroll.saturating_add(1);
        }
        _ => {}
    }
}

fn handle_tank_mix_input(app: &mut App, code: KeyCode) {
    let count = app.paddock().map_or(0, |p| p.tank_mix.len());
    match code {
        KeyCode::Up => {
            app.tank_mix_state.selected_index = app.tank_mix_state.selected_index.saturating_sub(1);
        }
        KeyCode::Down => {
            if app.tank_mix_state.selected_index + 1 < count {
                app.tank_mix_state.selected_index += 1;
            }
        }
        KeyCode::Char('a') => app.add_mixing_step(),
        KeyCode::Char('d') => app.remove_mixing_step(),
        KeyCode::Char('K') => app.move_mixing_step(MoveDirection::Up),
        KeyCode::Char('J') => app.move_mixing_step(MoveDirection::Down),
        KeyCode::Enter => app.cycle_step_description(),
        KeyCode::Char('p') => app.assign_next_product(),
        _ => {}
    }
}

fn handle_programs_input(app: &mut App, code: KeyCode) {
    let kind = app.programs_state.kind;
    let count = app.paddock().map_or(0, |p| p.programs.get(kind).len());
    let products = app.catalog.len();
    match code {
        KeyCode::Up => {
            app.programs_state.selected_item = app.programs_state.selected_item.saturating_sub(1);
        }
        KeyCode::Down => {
            if app.programs_state.selected_item + 1 < count {
                app.programs_state.selected_item += 1;
            }
        }
        KeyCode::Tab => app.programs_state.cycle_kind(),
        KeyCode::Left => app.programs_state.step_product(false, products),
        KeyCode::Right => app.programs_state.step_product(true, products),
        KeyCode::Char('+') | KeyCode::Char('=') => app.programs_state.adjust_rate(PROGRAM_RATE_STEP),
        KeyCode::Char('-') => app.programs_state.adjust_rate(-PROGRAM_RATE_STEP),
        KeyCode::Char('u') => app.programs_state.cycle_unit(),
        KeyCode::Enter | KeyCode::Char('a') => app.add_draft_program_item(),
        KeyCode::Char('d') => app.remove_selected_program_item(),
        _ => {}
    }
}
