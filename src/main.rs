mod app;
mod braille;
mod canvas;
mod color;
mod config;
mod debounce;
mod drift;
mod error;
mod grid;
mod logging;
mod particle;
mod presets;
mod scheduler;
mod selector;
mod settings;
mod simulation;
mod snowfall;
mod surface;
mod target;
mod ui;

use app::{App, Focus};
use clap::Parser;
use color::ParticleColor;
use config::AppConfig;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info, warn};
use presets::{Preset, PresetManager};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use selector::Selector;
use settings::SnowSettings;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use surface::TerminalSurface;

#[derive(Parser, Debug)]
#[command(name = "snowfall-tui")]
#[command(about = "Falling snow that piles up on boxes in the terminal")]
struct Args {
    // === Flakes ===
    /// Number of flakes (0-2000)
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Flake colour (#rrggbb, #rgb or a name like white, silver, lightblue)
    #[arg(short = 'c', long)]
    color: Option<ParticleColor>,

    /// Smallest flake size in dots
    #[arg(long = "min-size")]
    min_size: Option<f32>,

    /// Largest flake size in dots
    #[arg(long = "max-size")]
    max_size: Option<f32>,

    /// Slowest fall speed in dots per tick
    #[arg(long = "min-speed")]
    min_speed: Option<f32>,

    /// Fastest fall speed in dots per tick
    #[arg(long = "max-speed")]
    max_speed: Option<f32>,

    /// Draw flakes as discs
    #[arg(long)]
    rounded: bool,

    /// Give flakes a drop shadow
    #[arg(long)]
    shadow: bool,

    /// Draw flakes from an image file
    #[arg(long)]
    image: Option<PathBuf>,

    // === Accumulation ===
    /// Scene boxes that collect snow, e.g. "#banner, .ledge"
    #[arg(long)]
    collect: Option<Selector>,

    /// Height of the collecting band above each box, in dots (1-200)
    #[arg(long)]
    band: Option<i32>,

    // === Surface ===
    /// Let the arrow keys tilt the snow
    #[arg(long)]
    tilt: bool,

    /// Keep flakes off the side edges as if the canvas were the whole viewport
    #[arg(long)]
    viewport: bool,

    /// Pretend the surface cannot draw canvases (snow never settles)
    #[arg(long = "no-canvas")]
    no_canvas: bool,

    // === Files ===
    /// Config file (default: <config dir>/snowfall-tui/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start from a named preset
    #[arg(short = 'p', long)]
    preset: Option<String>,

    /// Save the resulting settings as a user preset
    #[arg(long = "save-preset")]
    save_preset: Option<String>,

    /// Delete a user preset before starting
    #[arg(long = "delete-preset")]
    delete_preset: Option<String>,

    /// Write logs to this file (filter with RUST_LOG)
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

impl Args {
    /// Overlay command-line values onto loaded settings
    fn apply_to(&self, settings: &mut SnowSettings) {
        if let Some(count) = self.count {
            settings.particle_count = count;
        }
        if let Some(color) = self.color {
            settings.particle_color = color;
        }
        if let Some(v) = self.min_size {
            settings.min_size = v;
        }
        if let Some(v) = self.max_size {
            settings.max_size = v;
        }
        if let Some(v) = self.min_speed {
            settings.min_speed = v;
        }
        if let Some(v) = self.max_speed {
            settings.max_speed = v;
        }
        if self.rounded {
            settings.rounded = true;
        }
        if self.shadow {
            settings.shadowed = true;
        }
        if let Some(image) = &self.image {
            settings.particle_image = Some(image.clone());
        }
        if let Some(selector) = &self.collect {
            settings.accumulation_targets = Some(selector.clone());
        }
        if let Some(band) = self.band {
            settings.accumulation_band_height = band;
        }
        if self.tilt {
            settings.use_device_orientation = true;
        }
        *settings = settings.clone().sanitized();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        logging::init_file_logger(path)?;
    }

    // Load config (missing file means defaults)
    let config_path = match &args.config {
        Some(path) => Some(path.clone()),
        None => AppConfig::default_path()
            .map_err(|e| warn!("{}", e))
            .ok(),
    };
    let mut config = match &config_path {
        Some(path) => AppConfig::load_or_default(path)?,
        None => AppConfig::default(),
    };

    let mut presets = PresetManager::new();
    let mut preset_name = None;
    if let Some(name) = &args.preset {
        let preset = presets
            .find(name)
            .ok_or_else(|| format!("Unknown preset '{}' (have: {})", name, presets.preset_names().join(", ")))?;
        config.settings = preset.settings.clone();
        preset_name = Some(preset.name.clone());
    }
    args.apply_to(&mut config.settings);

    if let Some(name) = &args.delete_preset {
        presets.delete_preset(name)?;
        info!("deleted preset '{}'", name);
    }
    if let Some(name) = &args.save_preset {
        presets.save_preset(Preset::new(
            name.clone(),
            "Saved from the command line",
            config.settings.clone(),
        ))?;
        preset_name = Some(name.clone());
    }
    info!("starting with {} flakes", config.settings.particle_count);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let (canvas_width, canvas_height) = canvas_cells(size.width, size.height, false);
    let surface = TerminalSurface::new(canvas_width, canvas_height, config.scene.clone())
        .with_viewport(args.viewport)
        .with_canvas_support(!args.no_canvas);
    let mut app = App::new(config, presets, surface, Instant::now());
    app.config_path = config_path;
    app.preset_name = preset_name;

    let res = run_app(&mut terminal, &mut app);

    // Cleanup
    app.snowfall.stop(&mut app.surface);
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!("event loop failed: {}", err);
    }
    res.map_err(Into::into)
}

/// Canvas size in cells for a terminal of the given size
fn canvas_cells(width: u16, height: u16, fullscreen: bool) -> (u16, u16) {
    ui::get_canvas_size(Rect::new(0, 0, width, height), fullscreen)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    // Redraw at least this often even with nothing scheduled
    const FRAME_DURATION: Duration = Duration::from_millis(16);

    loop {
        // Render current state
        terminal.draw(|frame| ui::render(frame, app))?;

        // Wait for input until the next tick is due
        let now = Instant::now();
        let timeout = app
            .snowfall
            .scheduler()
            .next_deadline()
            .map_or(FRAME_DURATION, |at| at.saturating_duration_since(now).min(FRAME_DURATION));

        if event::poll(timeout)? {
            let now = Instant::now();
            match event::read()? {
                Event::Key(key) => {
                    // Only process Press events
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    // Handle Ctrl+C
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    match key.code {
                        // System controls
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char(' ') => app.toggle_pause(now),
                        KeyCode::Char('s') | KeyCode::Char('S') => app.toggle_running(now),
                        KeyCode::Char('r') | KeyCode::Char('R') => app.restart(now),
                        KeyCode::Char('v') | KeyCode::Char('V') => {
                            app.toggle_fullscreen();
                            let size = terminal.size()?;
                            let (w, h) = canvas_cells(size.width, size.height, app.fullscreen_mode);
                            app.resize(w, h, now);
                        }
                        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => app.toggle_help(),
                        KeyCode::Char('p') | KeyCode::Char('P') => app.next_preset(now),
                        KeyCode::Char('w') | KeyCode::Char('W') => app.save_config_with_message(),
                        KeyCode::Char('+') | KeyCode::Char('=') => {
                            app.adjust_particle_count(25, now);
                            app.focus = Focus::Count;
                        }
                        KeyCode::Char('-') | KeyCode::Char('_') => {
                            app.adjust_particle_count(-25, now);
                            app.focus = Focus::Count;
                        }
                        KeyCode::Left => app.adjust_tilt(-1.0),
                        KeyCode::Right => app.adjust_tilt(1.0),

                        // Navigation
                        KeyCode::Tab => app.next_focus(),
                        KeyCode::BackTab => app.prev_focus(),
                        KeyCode::Up | KeyCode::Down if !app.show_help => {
                            let up = key.code == KeyCode::Up;
                            if app.focus.is_param() {
                                app.adjust_focused(up, now);
                            } else {
                                let height = terminal.size().map(|s| s.height).unwrap_or_default();
                                let max = ui::CONTROLS_CONTENT_LINES
                                    .saturating_sub(ui::get_controls_visible_lines(height));
                                app.scroll_controls(!up, max);
                            }
                        }
                        KeyCode::Esc if app.show_help => app.toggle_help(),
                        KeyCode::Esc if app.focus.is_param() => app.focus = Focus::Controls,
                        KeyCode::Char('j') | KeyCode::Char('J') if app.show_help => {
                            app.scroll_help(true, ui::HELP_CONTENT_LINES);
                        }
                        KeyCode::Char('k') | KeyCode::Char('K') if app.show_help => {
                            app.scroll_help(false, ui::HELP_CONTENT_LINES);
                        }
                        _ => {}
                    }
                }
                Event::Resize(width, height) => {
                    let (w, h) = canvas_cells(width, height, app.fullscreen_mode);
                    app.resize(w, h, now);
                }
                _ => {}
            }
        }

        // Run whatever is due
        app.tick(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_settings() {
        let args = Args::parse_from([
            "snowfall-tui",
            "-n",
            "120",
            "--color",
            "#cce6ff",
            "--collect",
            "#banner, .ledge",
            "--band",
            "999",
            "--rounded",
            "--tilt",
        ]);
        let mut settings = SnowSettings::default();
        args.apply_to(&mut settings);
        assert_eq!(settings.particle_count, 120);
        assert_eq!(settings.particle_color, ParticleColor::new(0xcc, 0xe6, 0xff));
        assert!(settings.collects());
        assert_eq!(settings.accumulation_band_height, 200);
        assert!(settings.rounded && settings.use_device_orientation);
        assert!(!settings.shadowed);
    }

    #[test]
    fn test_cli_without_flags_keeps_config() {
        let args = Args::parse_from(["snowfall-tui"]);
        let mut settings = SnowSettings {
            particle_count: 77,
            shadowed: true,
            ..Default::default()
        };
        args.apply_to(&mut settings);
        assert_eq!(settings.particle_count, 77);
        assert!(settings.shadowed);
    }

    #[test]
    fn test_bad_selector_is_rejected() {
        assert!(Args::try_parse_from(["snowfall-tui", "--collect", "div .x"]).is_err());
        assert!(Args::try_parse_from(["snowfall-tui", "--color", "#zzz"]).is_err());
    }
}
