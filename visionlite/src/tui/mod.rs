pub mod app;
pub mod ui;

use std::io;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, watch};

use crate::config::ViewerConfig;
use crate::orchestrator::{Command, Flow};
use crate::status::ViewerStatus;
use crate::viewer::{self, COMMAND_BUFFER};
use app::App;

const UI_FPS: u64 = 30;
const UI_FRAME_TIME: Duration = Duration::from_millis(1000 / UI_FPS);

/// Runs the viewer on a worker thread and the dashboard on this one.
pub fn run(config: ViewerConfig) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (status_tx, status_rx) = watch::channel(ViewerStatus::default());

    let worker = thread::spawn(move || run_viewer(config, cmd_rx, status_tx));

    let result = run_tui_loop(&mut terminal, &cmd_tx, status_rx);

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // The worker leaves its loop once it sees quit or a closed channel.
    let _ = cmd_tx.try_send(Command::Quit);
    drop(cmd_tx);
    let worker_result = worker
        .join()
        .map_err(|_| anyhow!("Viewer thread panicked"))?;

    result.and(worker_result)
}

fn run_viewer(
    config: ViewerConfig,
    commands: mpsc::Receiver<Command>,
    status: watch::Sender<ViewerStatus>,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;
    runtime.block_on(async move {
        let mut viewer = viewer::build(&config, commands, status)?;
        if viewer.load_model(viewer::model_loader(&config)).await == Flow::Continue {
            viewer.run().await;
        }
        Ok(())
    })
}

fn run_tui_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    commands: &mpsc::Sender<Command>,
    mut status: watch::Receiver<ViewerStatus>,
) -> Result<()> {
    let mut app = App::new();
    let mut last_render: Option<Instant> = None;

    loop {
        match status.has_changed() {
            Ok(true) => app.update(status.borrow_and_update().clone()),
            Ok(false) => {}
            // Viewer thread is gone.
            Err(_) => app.quit(),
        }

        // Throttle rendering to UI_FPS
        if last_render.map_or(true, |t| t.elapsed() >= UI_FRAME_TIME) {
            terminal.draw(|f| ui::draw(f, &app))?;
            last_render = Some(Instant::now());
        }

        // Handle keyboard input (non-blocking)
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(cmd) = app.on_key(key.code) {
                        if let Err(mpsc::error::TrySendError::Closed(_)) = commands.try_send(cmd) {
                            app.quit();
                        }
                    }
                }
            }
        }

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}
