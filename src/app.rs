use crate::charts::TopArtistCount;
use crate::dashboard::DashboardCore;
use anyhow::{Result, anyhow};
use crossterm::cursor::Show;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use std::io::stdout;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub fn run(mut core: DashboardCore) -> Result<()> {
    enable_raw_mode()?;
    let result = execute!(stdout(), EnterAlternateScreen)
        .map_err(anyhow::Error::from)
        .and_then(|()| {
            let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
            terminal.clear()?;
            event_loop(&mut terminal, &mut core, poll_event)
        });

    let restored = restore_terminal();
    let save_result = core.save();
    info!("dashboard closed");
    result?;
    restored?;
    save_result?;
    Ok(())
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen, Show)?;
    Ok(())
}

fn poll_event() -> Result<Option<Event>> {
    if !event::poll(Duration::from_millis(100))? {
        return Ok(None);
    }
    Ok(Some(event::read()?))
}

/// Draws and dispatches keys until quit. Errors return to `run`, which
/// restores the terminal before reporting them.
fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    core: &mut DashboardCore,
    mut next_event: impl FnMut() -> Result<Option<Event>>,
) -> Result<()> {
    let mut command_mode = false;
    let mut command_buffer = String::new();

    loop {
        if core.dirty {
            terminal
                .draw(|frame| crate::ui::draw(frame, &*core, &command_buffer, command_mode))
                .map_err(|err| anyhow!("failed to draw dashboard: {err}"))?;
            core.dirty = false;
        }

        let Some(event) = next_event()? else {
            continue;
        };
        if let Event::Resize(_, _) = event {
            core.dirty = true;
            continue;
        }

        let Event::Key(key) = event else {
            continue;
        };

        if key.kind != KeyEventKind::Press {
            continue;
        }

        if command_mode {
            match key.code {
                KeyCode::Esc => {
                    command_mode = false;
                    command_buffer.clear();
                    core.dirty = true;
                }
                KeyCode::Enter => {
                    run_command(core, &command_buffer);
                    command_mode = false;
                    command_buffer.clear();
                    core.dirty = true;
                }
                KeyCode::Backspace => {
                    command_buffer.pop();
                    core.dirty = true;
                }
                KeyCode::Char(ch) => {
                    command_buffer.push(ch);
                    core.dirty = true;
                }
                _ => {}
            }
            continue;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
            KeyCode::Char('q') => return Ok(()),
            KeyCode::Tab | KeyCode::Right => core.next_page(),
            KeyCode::BackTab | KeyCode::Left => core.prev_page(),
            KeyCode::Down => core.select_next_artist(),
            KeyCode::Up => core.select_prev_artist(),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                core.set_top_artists(core.top_artists.increment())
            }
            KeyCode::Char('-') => core.set_top_artists(core.top_artists.decrement()),
            KeyCode::Char('r') => core.run_analysis(),
            KeyCode::Char('e') => core.load_example(),
            KeyCode::Char('t') => core.toggle_theme(),
            KeyCode::Char('s') => {
                if let Err(err) = core.save() {
                    core.set_status(&format!("save error: {err:#}"));
                }
            }
            KeyCode::Char(':') => {
                command_mode = true;
                core.dirty = true;
            }
            _ => {}
        }
    }
}

fn run_command(core: &mut DashboardCore, raw: &str) {
    let input = raw.trim();
    if input.is_empty() {
        core.set_status("No command");
        return;
    }

    let mut command_split = input.splitn(2, char::is_whitespace);
    let command = command_split.next().unwrap_or_default();
    let rest = command_split.next().unwrap_or("").trim();

    match command {
        "help" => core.set_status(
            "Commands: load <path> [\"path with spaces\"...] | top <1-50> | year <yyyy|auto> | example | theme | save",
        ),
        "load" => {
            if rest.is_empty() {
                core.set_status("Usage: load <path> [path...]");
                return;
            }
            match split_paths(rest) {
                Some(paths) => core.load_inputs(paths),
                None => core.set_status("Unclosed quote in path list"),
            }
        }
        "top" => match rest.parse::<usize>() {
            Ok(count) => match TopArtistCount::new(count) {
                Ok(count) => core.set_top_artists(count),
                Err(err) => core.set_status(&err.to_string()),
            },
            Err(_) => core.set_status("Usage: top <1-50>"),
        },
        "year" => {
            if rest == "auto" {
                core.set_first_year(None);
                return;
            }
            match rest.parse::<i32>() {
                Ok(year) => core.set_first_year(Some(year)),
                Err(_) => core.set_status("Usage: year <yyyy|auto>"),
            }
        }
        "example" => core.load_example(),
        "theme" => core.toggle_theme(),
        "save" => {
            if let Err(err) = core.save() {
                core.set_status(&format!("save error: {err:#}"));
            }
        }
        _ => core.set_status("Unknown command. Use :help"),
    }
}

/// Splits on whitespace; double quotes keep a path with spaces together.
fn split_paths(raw: &str) -> Option<Vec<PathBuf>> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut pending = false;
    for ch in raw.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            ch if ch.is_whitespace() && !quoted => {
                if pending {
                    paths.push(PathBuf::from(std::mem::take(&mut current)));
                    pending = false;
                }
            }
            ch => {
                current.push(ch);
                pending = true;
            }
        }
    }
    if quoted {
        return None;
    }
    if pending {
        paths.push(PathBuf::from(current));
    }
    Some(paths)
}
