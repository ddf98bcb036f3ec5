use anyhow::Result;
use clap::{Parser, ValueEnum};
use dragon_maze_core::{
    Coord, Direction,
    being::DragonBehavior,
    game::Game,
    labyrinth::Symbol,
};
use ratatui::{
    crossterm::{
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::io::{self, Stdout};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BehaviorArg {
    /// Dragons never leave their lairs.
    Stationary,
    /// Dragons wander one random step per turn.
    Wandering,
    /// Dragons wander and occasionally fall asleep.
    Sleepy,
}

impl From<BehaviorArg> for DragonBehavior {
    fn from(arg: BehaviorArg) -> Self {
        match arg {
            BehaviorArg::Stationary => DragonBehavior::Stationary,
            BehaviorArg::Wandering => DragonBehavior::Wandering,
            BehaviorArg::Sleepy => DragonBehavior::WanderingSleepy,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Maze width (odd, at least 5); omit for the demo labyrinth
    #[arg(long, requires = "height")]
    width: Option<usize>,
    /// Maze height (odd, at least 5); omit for the demo labyrinth
    #[arg(long, requires = "width")]
    height: Option<usize>,
    /// Number of dragons roaming the maze
    #[arg(short, long, default_value_t = 3)]
    dragons: usize,
    /// How the dragons behave
    #[arg(short, long, value_enum, default_value_t = BehaviorArg::Wandering)]
    behavior: BehaviorArg,
    /// Seed for a reproducible run
    #[arg(short, long)]
    seed: Option<u64>,
}

/// How a finished round ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Escaped,
    Slain,
}

struct App {
    /// The core game being played.
    game: Game,
    /// Set once the round is over; no further ticks are issued.
    outcome: Option<Outcome>,
    /// Flag to control the main loop.
    should_quit: bool,
}

impl App {
    fn new(args: &Args) -> Result<Self> {
        let behavior = DragonBehavior::from(args.behavior);
        let game = match (args.width, args.height, args.seed) {
            (Some(width), Some(height), Some(seed)) => {
                Game::with_size_seeded(width, height, behavior, args.dragons, seed)?
            }
            (Some(width), Some(height), None) => {
                Game::with_size(width, height, behavior, args.dragons)?
            }
            (_, _, Some(seed)) => Game::new_seeded(behavior, args.dragons, seed)?,
            _ => Game::new(behavior, args.dragons)?,
        };

        Ok(App {
            game,
            outcome: None,
            should_quit: false,
        })
    }

    /// Plays one turn in the given direction, unless the round is over.
    fn tick(&mut self, direction: Direction) {
        if self.outcome.is_some() {
            return;
        }
        let done = self.game.update(direction);
        if done {
            self.outcome = Some(if self.game.hero().being().is_alive() {
                Outcome::Escaped
            } else {
                Outcome::Slain
            });
        }
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up the terminal
    let mut terminal = setup_terminal()?;

    // Create the application state
    let mut app = App::new(&args)?;

    // Run the main application loop
    let result = run_app(&mut terminal, &mut app);

    // Restore the terminal state
    restore_terminal(&mut terminal)?;

    result
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
///
/// The game is turn-based: every arrow key press plays exactly one tick.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                KeyCode::Up => app.tick(Direction::Up),
                KeyCode::Down => app.tick(Direction::Down),
                KeyCode::Left => app.tick(Direction::Left),
                KeyCode::Right => app.tick(Direction::Right),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Area for the labyrinth
            Constraint::Length(4), // Area for the round status
            Constraint::Length(2), // Area for help text
        ])
        .split(frame.area());

    render_labyrinth(frame, main_layout[0], app);
    render_status(frame, main_layout[1], app);

    let help_text = Paragraph::new("Arrow keys move the hero. Press 'q' or 'Esc' to quit.")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

/// Renders the round status panel.
fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let game = &app.game;
    let dragons_left = game
        .dragons()
        .iter()
        .filter(|dragon| dragon.being().is_alive())
        .count();

    let mut lines = vec![Line::from(format!(
        "Sword: {}   Eagle: {}   Dragons left: {}   Exit: {}",
        if game.hero().has_sword() {
            "carried"
        } else {
            "in the maze"
        },
        if game.eagle().being().is_alive() {
            "alive"
        } else {
            "lost"
        },
        dragons_left,
        if game.exit_is_open() { "open" } else { "closed" },
    ))];

    match app.outcome {
        Some(Outcome::Escaped) => lines.push(Line::styled(
            "The hero escaped the labyrinth!",
            Style::default().fg(Color::Green).bold(),
        )),
        Some(Outcome::Slain) => lines.push(Line::styled(
            "The hero was slain. Game over.",
            Style::default().fg(Color::Red).bold(),
        )),
        None => {}
    }

    let status_widget =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Round"));
    frame.render_widget(status_widget, area);
}

/// Renders the labyrinth and everything in it onto the frame.
fn render_labyrinth(frame: &mut Frame, area: Rect, app: &App) {
    let game = &app.game;
    let labyrinth = game.labyrinth();

    let mut lines: Vec<Line> = Vec::with_capacity(labyrinth.height());

    for y in 0..labyrinth.height() {
        let mut spans: Vec<Span> = Vec::with_capacity(labyrinth.width());
        for x in 0..labyrinth.width() {
            let coord = Coord::new(x as i32, y as i32);
            spans.push(cell_span(app, coord));
        }
        lines.push(Line::from(spans));
    }

    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Dragon Maze").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(map_paragraph, area);
}

/// The span drawn for one cell: beings take precedence over the sword, which
/// takes precedence over terrain.
fn cell_span(app: &App, coord: Coord) -> Span<'static> {
    let game = &app.game;

    let hero = game.hero().being();
    if hero.is_alive() && hero.position() == coord {
        return Span::styled("@", Style::default().fg(Color::Yellow).bold());
    }

    for dragon in game.dragons() {
        let being = dragon.being();
        if being.is_alive() && being.position() == coord {
            return if being.is_sleeping() {
                Span::styled("d", Style::default().fg(Color::Magenta))
            } else {
                Span::styled("D", Style::default().fg(Color::Red).bold())
            };
        }
    }

    let eagle = game.eagle().being();
    if eagle.is_alive() && eagle.position() == coord {
        return Span::styled("e", Style::default().fg(Color::Cyan));
    }

    if let Some(sword) = game.sword() {
        if !sword.is_claimed() && sword.position() == coord {
            return Span::styled("s", Style::default().fg(Color::Yellow));
        }
    }

    match game.labyrinth().symbol_at(coord) {
        Some(Symbol::Wall) => Span::styled("#", Style::default().fg(Color::DarkGray)),
        Some(Symbol::Exit) => {
            if game.exit_is_open() {
                Span::styled("E", Style::default().fg(Color::Green).bold())
            } else {
                Span::styled("E", Style::default().fg(Color::DarkGray))
            }
        }
        // A claimed sword's spot is plain floor again.
        Some(Symbol::Floor | Symbol::Sword) | None => Span::raw(" "),
    }
}
