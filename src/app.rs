use crate::config::AppConfig;
use crate::error::SnowError;
use crate::presets::PresetManager;
use crate::scheduler::FrameScheduler;
use crate::simulation::TickStats;
use crate::snowfall::Snowfall;
use crate::surface::TerminalSurface;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;

/// Degrees of tilt per arrow key press
const TILT_STEP: f32 = 5.0;
const MAX_TILT: f32 = 60.0;

/// Sidebar selection: one of the editable parameters, the controls box, or
/// nothing
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Focus {
    #[default]
    None,
    Band,
    Count,
    Rounded,
    Shadow,
    Size,
    Speed,
    Tilt,
    Controls,
}

/// Parameters in the order they appear in the sidebar
const PARAMS: [Focus; 7] = [
    Focus::Band,
    Focus::Count,
    Focus::Rounded,
    Focus::Shadow,
    Focus::Size,
    Focus::Speed,
    Focus::Tilt,
];

impl Focus {
    fn param_position(&self) -> Option<usize> {
        PARAMS.iter().position(|p| p == self)
    }

    /// Next parameter, wrapping. From outside the list starts at the top.
    pub fn next(&self) -> Focus {
        match self.param_position() {
            Some(i) => PARAMS[(i + 1) % PARAMS.len()],
            None => PARAMS[0],
        }
    }

    /// Previous parameter, wrapping. From outside the list starts at the bottom.
    pub fn prev(&self) -> Focus {
        match self.param_position() {
            Some(i) => PARAMS[(i + PARAMS.len() - 1) % PARAMS.len()],
            None => PARAMS[PARAMS.len() - 1],
        }
    }

    /// Row of this parameter in the parameters box
    pub fn line_index(&self) -> u16 {
        self.param_position().unwrap_or(0) as u16
    }

    pub fn is_param(&self) -> bool {
        self.param_position().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
    Stopped,
}

impl RunState {
    pub fn name(&self) -> &str {
        match self {
            RunState::Running => "Running",
            RunState::Paused => "Paused",
            RunState::Stopped => "Stopped",
        }
    }
}

/// Main application state
pub struct App {
    pub surface: TerminalSurface,
    pub snowfall: Snowfall<FrameScheduler>,
    pub config: AppConfig,
    /// Where `W` saves to; the default config path when unset
    pub config_path: Option<PathBuf>,
    pub presets: PresetManager,
    pub preset_name: Option<String>,
    pub focus: Focus,
    pub fullscreen_mode: bool,
    pub show_help: bool,
    pub help_scroll: u16,
    pub controls_scroll: u16,
    pub last_stats: TickStats,
    /// One-line message shown in the status box
    pub message: Option<String>,
}

impl App {
    pub fn new(
        config: AppConfig,
        presets: PresetManager,
        surface: TerminalSurface,
        now: Instant,
    ) -> Self {
        let snowfall = Snowfall::with_scheduler(FrameScheduler::new(), config.tick_delay());
        let mut app = Self {
            surface,
            snowfall,
            config,
            config_path: None,
            presets,
            preset_name: None,
            focus: Focus::Controls,
            fullscreen_mode: false,
            show_help: false,
            help_scroll: 0,
            controls_scroll: 0,
            last_stats: TickStats::default(),
            message: None,
        };
        app.restart(now);
        app
    }

    /// Run whatever the driver has due
    pub fn tick(&mut self, now: Instant) {
        if let Some(stats) = self.snowfall.pump(&mut self.surface, now) {
            self.last_stats = stats;
        }
    }

    pub fn run_state(&self) -> RunState {
        if !self.snowfall.is_running() {
            RunState::Stopped
        } else if self.snowfall.is_paused() {
            RunState::Paused
        } else {
            RunState::Running
        }
    }

    /// Handle adjusting the currently focused parameter
    pub fn adjust_focused(&mut self, up: bool, now: Instant) {
        let sign = if up { 1.0 } else { -1.0 };
        let settings = &mut self.config.settings;
        match self.focus {
            Focus::None | Focus::Controls => return,
            Focus::Band => settings.adjust_band_height(sign as i32 * 4),
            Focus::Count => settings.adjust_particle_count(sign as i32 * 25),
            Focus::Rounded => settings.toggle_rounded(),
            Focus::Shadow => settings.toggle_shadowed(),
            Focus::Size => settings.adjust_max_size(sign * 0.5),
            Focus::Speed => settings.adjust_max_speed(sign * 0.5),
            Focus::Tilt => settings.use_device_orientation = !settings.use_device_orientation,
        }
        // Settings are read once per run
        self.restart(now);
    }

    /// Cycle to next focus
    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    /// Navigate to previous parameter (Shift+Tab)
    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Toggle pause state
    pub fn toggle_pause(&mut self, now: Instant) {
        let paused = self.snowfall.is_paused();
        self.snowfall.set_paused(!paused, now);
    }

    /// Stop and clear, or start again when stopped
    pub fn toggle_running(&mut self, now: Instant) {
        if self.snowfall.is_running() {
            self.snowfall.stop(&mut self.surface);
            self.last_stats = TickStats::default();
        } else {
            self.restart(now);
        }
    }

    /// Start from scratch with the current settings
    pub fn restart(&mut self, now: Instant) {
        self.snowfall.start(&mut self.surface, &self.config.settings, now);
        self.last_stats = TickStats::default();
    }

    /// Current tilt reading in degrees. Every restart starts level.
    pub fn tilt(&self) -> f32 {
        self.snowfall.drift().gamma()
    }

    /// Nudge the tilt reading (arrow keys stand in for a device sensor)
    pub fn adjust_tilt(&mut self, delta: f32) {
        if !self.config.settings.use_device_orientation {
            return;
        }
        let tilt = (self.tilt() + delta * TILT_STEP).clamp(-MAX_TILT, MAX_TILT);
        self.snowfall.on_orientation(tilt);
    }

    /// Change the flake count and restart
    pub fn adjust_particle_count(&mut self, delta: i32, now: Instant) {
        self.config.settings.adjust_particle_count(delta);
        self.restart(now);
    }

    /// Switch to the next preset and restart
    pub fn next_preset(&mut self, now: Instant) {
        let Some(preset) = self.presets.next_after(self.preset_name.as_deref()) else {
            return;
        };
        info!("switching to preset '{}'", preset.name);
        self.config.settings = preset.settings.clone();
        self.preset_name = Some(preset.name.clone());
        self.message = Some(format!("Preset: {}", preset.name));
        self.restart(now);
    }

    /// Write the current config (settings and scene) to disk
    pub fn save_config(&mut self) -> Result<PathBuf, SnowError> {
        let path = match &self.config_path {
            Some(path) => path.clone(),
            None => AppConfig::default_path()?,
        };
        self.config.save_to_file(&path)?;
        Ok(path)
    }

    /// Save and report the result in the status box
    pub fn save_config_with_message(&mut self) {
        self.message = Some(match self.save_config() {
            Ok(path) => format!("Saved {}", path.display()),
            Err(e) => {
                warn!("{}", e);
                e.to_string()
            }
        });
    }

    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
    }

    /// Opening the help overlay always starts at the top
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0;
        }
    }

    pub fn scroll_help(&mut self, down: bool, max_scroll: u16) {
        step_scroll(&mut self.help_scroll, down, max_scroll);
    }

    pub fn scroll_controls(&mut self, down: bool, max_scroll: u16) {
        step_scroll(&mut self.controls_scroll, down, max_scroll);
    }

    /// Canvas changed size. Bounds follow now, collection bands once
    /// resizing settles.
    pub fn resize(&mut self, canvas_width: u16, canvas_height: u16, now: Instant) {
        if self.surface.cell_size() == (canvas_width, canvas_height) {
            return;
        }
        self.surface.resize(canvas_width, canvas_height);
        self.snowfall.on_resize(&self.surface, now);
    }
}

fn step_scroll(offset: &mut u16, down: bool, max: u16) {
    *offset = if down {
        offset.saturating_add(1).min(max)
    } else {
        offset.saturating_sub(1)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_scene;
    use crate::scheduler::TICK_DELAY;
    use std::time::Duration;

    fn app(now: Instant) -> App {
        let surface = TerminalSurface::new(80, 30, default_scene());
        App::new(AppConfig::default(), PresetManager::with_dir(None), surface, now)
    }

    #[test]
    fn test_focus_cycle_round_trips() {
        let mut focus = Focus::Band;
        for _ in 0..7 {
            focus = focus.next();
        }
        assert_eq!(focus, Focus::Band);
        assert_eq!(Focus::Band.prev(), Focus::Tilt);
        assert_eq!(Focus::Controls.next(), Focus::Band);
        assert!(!Focus::Controls.is_param());
    }

    #[test]
    fn test_scroll_is_clamped() {
        let t0 = Instant::now();
        let mut app = app(t0);
        app.scroll_controls(false, 3);
        assert_eq!(app.controls_scroll, 0);
        for _ in 0..5 {
            app.scroll_controls(true, 3);
        }
        assert_eq!(app.controls_scroll, 3);

        app.scroll_help(true, 10);
        app.toggle_help();
        assert!(app.show_help);
        assert_eq!(app.help_scroll, 0);
    }

    #[test]
    fn test_starts_running() {
        let t0 = Instant::now();
        let mut app = app(t0);
        assert_eq!(app.run_state(), RunState::Running);
        assert_eq!(app.surface.visual_count(), 35);
        app.tick(t0);
        assert!(app.snowfall.field().is_some_and(|f| f.ticks == 1));
    }

    #[test]
    fn test_stop_and_start() {
        let t0 = Instant::now();
        let mut app = app(t0);
        app.toggle_running(t0);
        assert_eq!(app.run_state(), RunState::Stopped);
        assert_eq!(app.surface.visual_count(), 0);
        assert_eq!(app.snowfall.pending_ticks(), 0);

        app.toggle_running(t0);
        assert_eq!(app.run_state(), RunState::Running);
        assert_eq!(app.surface.visual_count(), 35);
    }

    #[test]
    fn test_pause_toggle() {
        let t0 = Instant::now();
        let mut app = app(t0);
        app.toggle_pause(t0);
        assert_eq!(app.run_state(), RunState::Paused);
        app.tick(t0 + Duration::from_secs(1));
        assert!(app.snowfall.field().is_some_and(|f| f.ticks == 0));
        app.toggle_pause(t0);
        assert_eq!(app.run_state(), RunState::Running);
    }

    #[test]
    fn test_count_change_restarts() {
        let t0 = Instant::now();
        let mut app = app(t0);
        app.adjust_particle_count(65, t0);
        assert_eq!(app.config.settings.particle_count, 100);
        assert_eq!(app.surface.visual_count(), 100);
    }

    #[test]
    fn test_focused_adjustments() {
        let t0 = Instant::now();
        let mut app = app(t0);
        app.focus = Focus::Rounded;
        app.adjust_focused(true, t0);
        assert!(app.config.settings.rounded);

        app.focus = Focus::Controls;
        let before = app.config.settings.clone();
        app.adjust_focused(true, t0);
        assert_eq!(app.config.settings, before);
    }

    #[test]
    fn test_tilt_needs_orientation() {
        let t0 = Instant::now();
        let mut app = app(t0);
        app.adjust_tilt(1.0);
        assert_eq!(app.tilt(), 0.0);

        app.focus = Focus::Tilt;
        app.adjust_focused(true, t0);
        for _ in 0..20 {
            app.adjust_tilt(1.0);
        }
        assert_eq!(app.tilt(), MAX_TILT);
        assert_eq!(app.snowfall.drift().snapshot(), Some(MAX_TILT * 0.1));
    }

    #[test]
    fn test_presets_cycle() {
        let t0 = Instant::now();
        let mut app = app(t0);
        app.next_preset(t0);
        assert_eq!(app.preset_name.as_deref(), Some("Classic"));
        app.next_preset(t0);
        assert_eq!(app.preset_name.as_deref(), Some("Flurry"));
        assert_eq!(app.surface.visual_count(), 250);

        app.next_preset(t0);
        app.next_preset(t0);
        assert_eq!(app.preset_name.as_deref(), Some("Drifts"));
        // 400 flakes plus a canvas per scene box
        assert_eq!(app.surface.visual_count(), 403);
    }

    #[test]
    fn test_save_config_to_chosen_path() {
        let t0 = Instant::now();
        let mut app = app(t0);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        app.config_path = Some(path.clone());
        app.config.settings.particle_count = 12;

        assert_eq!(app.save_config().unwrap(), path);
        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.settings.particle_count, 12);
    }

    #[test]
    fn test_resize_feeds_driver() {
        let t0 = Instant::now();
        let mut app = app(t0);
        app.resize(40, 20, t0);
        assert_eq!(app.surface.cell_size(), (40, 20));
        let field = app.snowfall.field().unwrap();
        assert_eq!((field.bounds.width, field.bounds.height), (80.0, 80.0));

        // Same size is a no-op
        app.resize(40, 20, t0 + TICK_DELAY);
        assert_eq!(app.surface.cell_size(), (40, 20));
    }
}
