use crate::app::{App, Focus, RunState};
use crate::braille;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;
const STATUS_HEIGHT: u16 = 8;
const PARAMS_HEIGHT: u16 = 9;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 40;

/// Number of lines in controls content
pub const CONTROLS_CONTENT_LINES: u16 = CONTROLS.len() as u16;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;
const SCENE_COLOR: Color = Color::DarkGray;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Draw the whole frame: sidebar, snow canvas, help overlay on top
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let canvas = canvas_area(area, app.fullscreen_mode);

    if !app.fullscreen_mode {
        render_sidebar(frame, Rect { width: SIDEBAR_WIDTH.min(area.width), ..area }, app);
    }
    render_canvas(frame, canvas, app);

    if app.show_help {
        render_help_overlay(frame, canvas, app);
    }
}

/// Screen area given to the snow canvas, borders included
fn canvas_area(area: Rect, fullscreen: bool) -> Rect {
    if fullscreen {
        return area;
    }
    let offset = SIDEBAR_WIDTH.min(area.width);
    Rect {
        x: area.x + offset,
        width: area.width - offset,
        ..area
    }
}

/// Canvas size in cells, borders excluded
pub fn get_canvas_size(frame_area: Rect, fullscreen: bool) -> (u16, u16) {
    let canvas = canvas_area(frame_area, fullscreen);
    (canvas.width.saturating_sub(2), canvas.height.saturating_sub(2))
}

/// Number of controls lines visible for a terminal height
pub fn get_controls_visible_lines(terminal_height: u16) -> u16 {
    terminal_height.saturating_sub(STATUS_HEIGHT + PARAMS_HEIGHT + 2)
}

/// Scroll offset that keeps `line` inside a bordered box of `height` rows
fn scroll_to_show(line: u16, content_lines: u16, height: u16) -> u16 {
    let visible = height.saturating_sub(2);
    if visible == 0 || visible >= content_lines || line < visible {
        0
    } else {
        line + 1 - visible
    }
}

/// Box title with a scroll hint when the content overflows
fn scroll_title(
    plain: &'static str,
    hinted: &'static str,
    content_lines: usize,
    height: u16,
) -> &'static str {
    if content_lines as u16 > height.saturating_sub(2) {
        hinted
    } else {
        plain
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::vertical([
        Constraint::Length(STATUS_HEIGHT),
        Constraint::Length(PARAMS_HEIGHT),
        Constraint::Min(6),
    ])
    .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_controls_box(frame, sections[2], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Snowfall ");

    let state = app.run_state();
    let status_color = match state {
        RunState::Running => BORDER_COLOR,
        RunState::Paused => HIGHLIGHT_COLOR,
        RunState::Stopped => Color::Red,
    };

    let (flakes, settled, bands) = app
        .snowfall
        .field()
        .map_or((0, 0, 0), |f| (f.particles.len(), f.marks(), f.targets.len()));

    let tilt = if app.config.settings.use_device_orientation {
        format!("{:+.0}°", app.tilt())
    } else {
        "off".to_string()
    };

    let mut content = vec![
        Line::from(Span::styled(state.name().to_uppercase(), Style::default().fg(status_color))),
        Line::from(Span::styled(format!("Flakes: {}", flakes), Style::default().fg(TEXT_COLOR))),
        Line::from(Span::styled(
            format!("Settled: {} on {}", settled, bands),
            Style::default().fg(TEXT_COLOR),
        )),
        Line::from(Span::styled(format!("Tilt: {}", tilt), Style::default().fg(DIM_TEXT_COLOR))),
        Line::from(Span::styled(
            format!(
                "Tick: +{} ~{} ^{}",
                app.last_stats.settled, app.last_stats.slid, app.last_stats.respawned
            ),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
    ];
    if let Some(message) = &app.message {
        content.push(Line::from(Span::styled(message.as_str(), Style::default().fg(DIM_TEXT_COLOR))));
    }

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let settings = &app.config.settings;
    let on_off = |v: bool| (if v { "on" } else { "off" }).to_string();

    let params = [
        (Focus::Band, "Band", settings.accumulation_band_height.to_string()),
        (Focus::Count, "Count", settings.particle_count.to_string()),
        (Focus::Rounded, "Rounded", on_off(settings.rounded)),
        (Focus::Shadow, "Shadow", on_off(settings.shadowed)),
        (
            Focus::Size,
            "Size",
            format!("{:.1}-{:.1}", settings.min_size, settings.max_size),
        ),
        (
            Focus::Speed,
            "Speed",
            format!("{:.1}-{:.1}", settings.min_speed, settings.max_speed),
        ),
        (Focus::Tilt, "Tilt", on_off(settings.use_device_orientation)),
    ];

    let content: Vec<Line> = params
        .into_iter()
        .map(|(focus, label, value)| {
            let (marker, color) = if app.focus == focus {
                ("> ", HIGHLIGHT_COLOR)
            } else {
                ("  ", TEXT_COLOR)
            };
            Line::from(Span::styled(
                format!("{}{}: {}", marker, label, value),
                Style::default().fg(color),
            ))
        })
        .collect();

    let scroll = scroll_to_show(app.focus.line_index(), content.len() as u16, area.height);
    let paragraph = Paragraph::new(content)
        .block(styled_block(" Parameters "))
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

const CONTROLS: [(&str, &str); 12] = [
    ("Space", "pause/resume"),
    ("S", "stop/start"),
    ("R", "restart"),
    ("←/→", "tilt"),
    ("+/-", "flakes"),
    ("P", "preset"),
    ("W", "save config"),
    ("Tab", "select param"),
    ("↑/↓", "adjust param"),
    ("V", "fullscreen"),
    ("H", "help"),
    ("Q", "quit"),
];

fn render_controls_box(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);
    let preset = app.preset_name.as_deref().unwrap_or("custom");

    let content: Vec<Line> = CONTROLS
        .iter()
        .map(|&(key, desc)| {
            let desc = if key == "P" {
                format!(" {}: {}", desc, preset)
            } else {
                format!(" {}", desc)
            };
            Line::from(vec![
                Span::styled(format!("{:>5}", key), key_style),
                Span::styled(desc, desc_style),
            ])
        })
        .collect();

    let title = scroll_title(" Controls ", " Controls (↑↓) ", content.len(), area.height);
    let paragraph = Paragraph::new(content)
        .block(styled_block(title))
        .scroll((app.controls_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block("");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Scene boxes sit under the snow
    let (cols, rows) = app.surface.cell_size();
    for element in app.surface.scene() {
        let (col, row, width, height) = element.cell_rect(cols, rows);
        if width == 0 || height == 0 || col >= inner.width || row >= inner.height {
            continue;
        }
        let rect = Rect {
            x: inner.x + col,
            y: inner.y + row,
            width: width.min(inner.width.saturating_sub(col)),
            height: height.min(inner.height.saturating_sub(row)),
        };
        let scene_block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Plain)
            .border_style(Style::default().fg(SCENE_COLOR));
        let label = Paragraph::new(element.label.as_str())
            .style(Style::default().fg(DIM_TEXT_COLOR))
            .block(scene_block);
        frame.render_widget(label, rect);
    }

    let cells = braille::render_to_braille(&app.surface, app.snowfall.field(), inner.width, inner.height);
    let buffer = frame.buffer_mut();
    for cell in cells.into_iter().filter(|c| c.x < inner.width && c.y < inner.height) {
        buffer[(inner.x + cell.x, inner.y + cell.y)]
            .set_char(cell.char)
            .set_fg(cell.color);
    }
}

fn render_help_overlay(frame: &mut Frame, canvas: Rect, app: &App) {
    let width = 56.min(canvas.width.saturating_sub(4));
    let height = canvas.height.saturating_sub(4).min(30);
    let help_area = Rect {
        x: canvas.x + (canvas.width - width) / 2,
        y: canvas.y + (canvas.height - height) / 2,
        width,
        height,
    };
    frame.render_widget(Clear, help_area);

    let heading = |text: &'static str| Line::from(Span::styled(text, Style::default().fg(HIGHLIGHT_COLOR)));
    let content = vec![
        Line::from(""),
        Line::from(Span::styled("SNOWFALL", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("Flakes fall with a gentle sideways sway. When collection is on, flakes that land in the band above a scene box settle there and build up drifts."),
        Line::from(""),
        heading("SETTLING:"),
        Line::from("A flake touching the snow below slides one column left or right if there is room, otherwise it stops and marks its cell. Each band starts empty again after a resize."),
        Line::from(""),
        heading("TILT:"),
        Line::from("With Tilt on, ←/→ stand in for a device tilt sensor and push every flake sideways."),
        Line::from(""),
        heading("PARAMETERS:"),
        Line::from("Tab selects a parameter, ↑/↓ changes it. Changes restart the snow."),
        Line::from(""),
        heading("BASIC CONTROLS:"),
        Line::from("Space=Pause, S=Stop/Start, R=Restart, +/-=Flakes, P=Preset, W=Save, V=Fullscreen, Q=Quit"),
        Line::from(""),
    ];

    let title = scroll_title(
        " Help (H to close) ",
        " Help (J/K scroll, H to close) ",
        content.len(),
        height,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}
