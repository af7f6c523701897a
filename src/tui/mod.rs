pub mod app;
pub mod state;
pub mod theme;
pub mod views;

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::error::Result;

use app::App;

/// Upper bound on how long a tick waits for input. Keeps fetch completions
/// and the refresh indicator responsive without busy-looping.
const TICK_INTERVAL: Duration = Duration::from_millis(150);

/// Run the dashboard until the user quits.
///
/// Owns the terminal for the whole session: raw mode plus the alternate
/// screen on entry, restored on exit even when the loop errors.
pub async fn run(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.tick();
        terminal.draw(|frame| views::draw(frame, app))?;

        // Fetches run on spawned tasks; blocking here only delays input
        // and the next repaint, never the network.
        if event::poll(TICK_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
