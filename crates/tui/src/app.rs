use std::{cmp, io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::rngs::StdRng;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Map, MapResolution},
        Block, Borders, Clear, List, ListItem, Paragraph, Wrap,
    },
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{info, warn};
use worldnav_core::{
    geo::{self, Coordinate},
    session::CITIES_PER_SESSION,
    ArrivalOutcome, BlobStore, CityCatalog, ProgressionController, SessionSnapshot,
};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_NAME_LEN: usize = 32;
/// Degrees the plane moves per key press. Any point lies within about 80 km of
/// this grid, well inside the arrival radius.
const FINE_STEP_DEGREES: f64 = 1.0;
/// Step used with Shift held.
const COARSE_STEP_DEGREES: f64 = 5.0;
const MENU_ITEMS: [&str; 3] = ["New Game", "Rankings", "Quit"];

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    map: Color,
    plane: Color,
    target: Color,
    success: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            map: Color::Gray,
            plane: Color::LightBlue,
            target: Color::Red,
            success: Color::Green,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Play,
    Results,
    Rankings,
}

enum AppEvent {
    Input(Event),
    Tick,
}

struct NamePromptModal {
    input: String,
    cursor: usize,
}

impl NamePromptModal {
    fn new(default: &str) -> Self {
        Self {
            input: default.to_string(),
            cursor: default.len(),
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.input.len() as isize;
        self.cursor = (self.cursor as isize + delta).clamp(0, len) as usize;
    }

    fn insert(&mut self, ch: char) {
        if self.input.len() >= MAX_NAME_LEN {
            return;
        }
        if ch.is_ascii() && !ch.is_ascii_control() {
            self.input.insert(self.cursor, ch);
            self.cursor += 1;
        }
    }

    fn backspace(&mut self) {
        if self.cursor > 0 && self.cursor <= self.input.len() {
            self.cursor -= 1;
            self.input.remove(self.cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.input.len() {
            self.input.remove(self.cursor);
        }
    }
}

/// Terminal front-end: steers the plane and renders controller snapshots.
pub struct WorldNavApp<S> {
    controller: ProgressionController<S>,
    catalog: CityCatalog,
    rng: StdRng,
    screen: Screen,
    menu_cursor: usize,
    name_prompt: Option<NamePromptModal>,
    last_player: String,
    plane: Coordinate,
    arrival: Option<ArrivalOutcome>,
    results: Option<ArrivalOutcome>,
    status: String,
    should_quit: bool,
    theme: Theme,
}

impl<S: BlobStore> WorldNavApp<S> {
    pub fn new(controller: ProgressionController<S>, catalog: CityCatalog, rng: StdRng) -> Self {
        let status = format!(
            "{} cities loaded, {} ranked players",
            catalog.len(),
            controller.rankings_sorted().len()
        );
        Self {
            controller,
            catalog,
            rng,
            screen: Screen::Menu,
            menu_cursor: 0,
            name_prompt: None,
            last_player: String::new(),
            plane: Coordinate::default(),
            arrival: None,
            results: None,
            status,
            should_quit: false,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) || self.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                self.handle_key(key);
                true
            }
            // Ticks and other input only trigger a redraw of the elapsed time.
            Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => true,
            None => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        if self.name_prompt.is_some() {
            self.handle_name_prompt_key(key);
            return;
        }
        match self.screen {
            Screen::Menu => self.handle_menu_key(key),
            Screen::Play => self.handle_play_key(key),
            Screen::Results | Screen::Rankings => {
                if matches!(
                    key.code,
                    KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')
                ) {
                    self.screen = Screen::Menu;
                }
            }
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.menu_cursor = self.menu_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.menu_cursor = cmp::min(self.menu_cursor + 1, MENU_ITEMS.len() - 1);
            }
            KeyCode::Enter => match self.menu_cursor {
                0 => self.name_prompt = Some(NamePromptModal::new(&self.last_player)),
                1 => self.screen = Screen::Rankings,
                _ => self.should_quit = true,
            },
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_name_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.name_prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.name_prompt = None;
                self.status = "New game cancelled".to_string();
            }
            KeyCode::Enter => {
                let name = prompt.input.trim().to_string();
                self.start_game(&name);
            }
            KeyCode::Left => prompt.move_cursor(-1),
            KeyCode::Right => prompt.move_cursor(1),
            KeyCode::Home => prompt.cursor = 0,
            KeyCode::End => prompt.cursor = prompt.input.len(),
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Delete => prompt.delete(),
            KeyCode::Char(ch) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    prompt.insert(ch);
                }
            }
            _ => {}
        }
    }

    fn start_game(&mut self, name: &str) {
        match self
            .controller
            .start_with_catalog(name, &self.catalog, &mut self.rng)
        {
            Ok(()) => {
                self.name_prompt = None;
                self.last_player = name.to_string();
                self.plane = Coordinate::default();
                self.arrival = None;
                self.results = None;
                self.screen = Screen::Play;
                self.status =
                    "Arrow keys or hjkl to fly, Shift for bigger steps, Esc for menu".to_string();
                self.check_arrival();
            }
            Err(err) => {
                // Keep the prompt open so the name can be fixed.
                self.status = err.to_string();
            }
        }
    }

    fn handle_play_key(&mut self, key: KeyEvent) {
        if self.arrival.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                self.continue_flight();
            }
            return;
        }
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
            self.screen = Screen::Menu;
            self.status = "Flight abandoned".to_string();
            return;
        }
        if let Some((d_lat, d_lon)) = movement(key) {
            self.plane = self.plane.offset(d_lat, d_lon);
            self.check_arrival();
        }
    }

    fn check_arrival(&mut self) {
        let Some(outcome) = self.controller.update_position(self.plane) else {
            return;
        };
        if outcome.is_completed() {
            info!(player = %self.last_player, "Showing results");
            self.results = Some(outcome);
            self.screen = Screen::Results;
        } else {
            self.arrival = Some(outcome);
        }
    }

    fn continue_flight(&mut self) {
        let reached = self
            .arrival
            .as_ref()
            .map(|outcome| outcome.city().coordinate);
        match self
            .controller
            .continue_to_next_city(&self.catalog, &mut self.rng)
        {
            Ok(next) => {
                self.arrival = None;
                if let Some(coordinate) = reached {
                    self.plane = coordinate;
                }
                self.status = format!("Next stop: {}", next.display_name());
                self.check_arrival();
            }
            Err(err) => {
                warn!(?err, "Could not continue to the next city");
                self.status = err.to_string();
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Menu => self.draw_menu(frame),
            Screen::Play => self.draw_play(frame),
            Screen::Results => self.draw_results(frame),
            Screen::Rankings => {
                let area = frame.size();
                self.draw_rankings(frame, area);
            }
        }
        if let Some(prompt) = &self.name_prompt {
            self.render_name_prompt(frame, prompt);
        }
    }

    fn draw_menu(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(area);

        let banner = Paragraph::new(vec![
            Line::from(Span::styled(
                "✈  World Navigation Challenge",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("Navigate to {CITIES_PER_SESSION} cities as fast as you can!"),
                Style::default().fg(self.theme.muted),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(banner, layout[0]);

        let menu_height = (MENU_ITEMS.len() as u16)
            .saturating_mul(2)
            .saturating_add(2)
            .min(layout[1].height);
        let menu_area = centered_rect(28, menu_height, layout[1]);
        let menu_lines: Vec<Line> = MENU_ITEMS
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                if idx == self.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {item}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {item}"),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                }
            })
            .collect();
        let menu = Paragraph::new(menu_lines)
            .block(Block::default().borders(Borders::ALL).title("Menu"))
            .alignment(Alignment::Center);
        frame.render_widget(menu, menu_area);

        self.render_status(frame, layout[2]);
    }

    fn draw_play(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(area);

        let snapshot = self.controller.snapshot();
        self.render_play_header(frame, layout[0], &snapshot);
        self.render_map(frame, layout[1], &snapshot);
        self.render_status(frame, layout[2]);

        if let Some(outcome) = &self.arrival {
            self.render_arrival(frame, outcome);
        }
    }

    fn render_play_header(&self, frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        let (target, continent, distance) = match &snapshot.target {
            Some(city) => (
                city.display_name(),
                city.continent.clone(),
                format!(
                    "{:.0} km away",
                    geo::distance_meters(self.plane, city.coordinate) / 1_000.0
                ),
            ),
            None => ("-".to_string(), String::new(), String::new()),
        };
        let left = Paragraph::new(vec![
            Line::from("Navigate to:"),
            Line::from(Span::styled(
                target,
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                format!("{continent}  {distance}"),
                Style::default().fg(self.theme.muted),
            )),
        ])
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(left, columns[0]);

        let right = Paragraph::new(vec![
            Line::from(format!(
                "Cities: {}/{CITIES_PER_SESSION}",
                snapshot.cities_visited
            )),
            Line::from(format!("Level: {}", snapshot.tier)),
            Line::from(format!("Time: {}", format_duration(snapshot.leg_elapsed))),
        ])
        .alignment(Alignment::Right)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(right, columns[1]);
    }

    fn render_map(&self, frame: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
        let plane = self.plane;
        let target = snapshot.target.clone();
        let glyph = target
            .as_ref()
            .map(|city| plane_glyph(geo::heading_degrees(plane, city.coordinate)))
            .unwrap_or("✈");
        let theme = self.theme.clone();
        let canvas = Canvas::default()
            .block(Block::default().borders(Borders::ALL).title("World"))
            .marker(Marker::Braille)
            .x_bounds([-180.0, 180.0])
            .y_bounds([-90.0, 90.0])
            .paint(move |ctx| {
                ctx.draw(&Map {
                    color: theme.map,
                    resolution: MapResolution::High,
                });
                ctx.layer();
                if let Some(city) = &target {
                    ctx.print(
                        city.coordinate.longitude,
                        city.coordinate.latitude,
                        Span::styled(
                            format!("● {}", city.name),
                            Style::default().fg(theme.target),
                        ),
                    );
                }
                ctx.print(
                    plane.longitude,
                    plane.latitude,
                    Span::styled(
                        glyph,
                        Style::default()
                            .fg(theme.plane)
                            .add_modifier(Modifier::BOLD),
                    ),
                );
            });
        frame.render_widget(canvas, area);
    }

    fn render_arrival(&self, frame: &mut Frame, outcome: &ArrivalOutcome) {
        let area = centered_rect(44, 8, frame.size());
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(
                "✔ City Reached!",
                Style::default()
                    .fg(self.theme.success)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("You reached {}", outcome.city().name)),
            Line::from(format!("Time: {}", format_duration(outcome.leg_time()))),
            Line::from(""),
            Line::from(vec![
                Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" continue"),
            ]),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn draw_results(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Min(3)])
            .split(area);

        let (total, rank) = match &self.results {
            Some(ArrivalOutcome::Completed {
                total_time, rank, ..
            }) => (format_duration(*total_time), format!("Rank: #{rank}")),
            _ => ("--:--".to_string(), String::new()),
        };
        let summary = Paragraph::new(vec![
            Line::from(Span::styled(
                "Game Complete!",
                Style::default()
                    .fg(self.theme.success)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("Total Time: {total}")),
            Line::from(rank),
            Line::from(Span::styled(
                "Enter to return to the menu",
                Style::default().fg(self.theme.muted),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(summary, layout[0]);

        self.draw_rankings(frame, layout[1]);
    }

    fn draw_rankings(&self, frame: &mut Frame, area: Rect) {
        let current = self.controller.player();
        let items: Vec<ListItem> = self
            .controller
            .rankings_sorted()
            .iter()
            .enumerate()
            .map(|(index, player)| {
                let style = if Some(player.name.as_str()) == current {
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(self.theme.primary_fg)
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:>3}. ", index + 1), style),
                    Span::styled(format!("{:<24}", player.name), style),
                    Span::styled(
                        format!("games {:>3}  ", player.games_played),
                        Style::default().fg(self.theme.muted),
                    ),
                    Span::styled(format_duration(player.average_time()), style),
                ]))
            })
            .collect();
        let title = if items.is_empty() {
            "Rankings (no games yet)"
        } else {
            "Rankings (average time)"
        };
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(list, area);
    }

    fn render_name_prompt(&self, frame: &mut Frame, prompt: &NamePromptModal) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(50_u16, frame_area.width.saturating_sub(4)), 24);
        let area = centered_rect(width, 6, frame_area);
        frame.render_widget(Clear, area);

        let input_line = Line::from(vec![
            Span::styled("> ", Style::default().fg(self.theme.accent)),
            Span::raw(prompt.input.clone()),
        ]);
        let helper = Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" start  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]);
        let paragraph = Paragraph::new(vec![input_line, Line::from(""), helper])
            .block(Block::default().borders(Borders::ALL).title("Enter your name"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);

        let cursor_x =
            (area.x + 3 + prompt.cursor as u16).min(area.x + area.width.saturating_sub(2));
        frame.set_cursor(cursor_x, area.y + 1);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let paragraph = Paragraph::new(Line::from(self.status.clone()))
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

/// Latitude/longitude delta for a steering key.
fn movement(key: KeyEvent) -> Option<(f64, f64)> {
    let coarse = key.modifiers.contains(KeyModifiers::SHIFT)
        || matches!(key.code, KeyCode::Char(ch) if ch.is_ascii_uppercase());
    let step = if coarse {
        COARSE_STEP_DEGREES
    } else {
        FINE_STEP_DEGREES
    };
    match key.code {
        KeyCode::Up | KeyCode::Char('k' | 'K') => Some((step, 0.0)),
        KeyCode::Down | KeyCode::Char('j' | 'J') => Some((-step, 0.0)),
        KeyCode::Left | KeyCode::Char('h' | 'H') => Some((0.0, -step)),
        KeyCode::Right | KeyCode::Char('l' | 'L') => Some((0.0, step)),
        _ => None,
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// `mm:ss`, minutes uncapped.
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Arrow pointing along `heading` (degrees clockwise from north).
fn plane_glyph(heading: f64) -> &'static str {
    const ARROWS: [&str; 8] = ["↑", "↗", "→", "↘", "↓", "↙", "←", "↖"];
    let sector = ((heading.rem_euclid(360.0) + 22.5) / 45.0) as usize % ARROWS.len();
    ARROWS[sector]
}
