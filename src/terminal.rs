// SPDX-License-Identifier: GPL-3.0-only

//! Interactive terminal photobooth
//!
//! Renders the live preview, countdown and composed frame with Unicode
//! half-block characters (two pixels per cell). Exports run on a tokio
//! runtime so the screen keeps updating while a frame is saved.

use crate::app::{Action, ExportJob, Photobooth, ViewState};
use crate::constants::SLOT_COUNT;
use crate::errors::ExportError;
use crate::pipelines::frame::{FrameStyle, FrameTree, PresetId, Rgb, render};
use crate::pipelines::photo::ImageArtifact;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbaImage;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Layout as Split, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Widget, Wrap},
};
use std::io::{self, stdout};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{error, info, warn};

/// Input poll interval (~60 fps redraw)
const POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Run the shell until the user quits
pub fn run(booth: Photobooth) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, booth, &runtime);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// What a key press asks the shell to do
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    Dispatch(Action),
    OpenArtifact,
    Quit,
    /// Consumed by shell-local state
    Handled,
    Ignored,
}

/// Shell-only state: selection and text entry, never part of the session
#[derive(Debug, Default)]
pub struct ShellState {
    pub selected_slot: usize,
    /// Hex being typed for a custom color
    pub color_input: Option<String>,
    pub input_error: Option<String>,
}

impl ShellState {
    /// Map a key to an outcome for the current view
    pub fn handle_key(&mut self, key: KeyEvent, booth: &Photobooth) -> KeyOutcome {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return KeyOutcome::Quit;
        }
        if self.color_input.is_some() {
            return self.handle_color_input(key.code);
        }

        let state = booth.state();
        match (state.view, key.code) {
            (_, KeyCode::Char('q')) => KeyOutcome::Quit,
            (_, KeyCode::Char('x')) if state.notice.is_some() => {
                KeyOutcome::Dispatch(Action::DismissNotice)
            }

            (ViewState::Start, KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('s')) => {
                self.selected_slot = 0;
                KeyOutcome::Dispatch(Action::StartSequence)
            }

            (ViewState::Capturing, KeyCode::Esc) => KeyOutcome::Dispatch(Action::Reset),

            (ViewState::Customizing, KeyCode::Char('l')) => {
                KeyOutcome::Dispatch(Action::SelectLayout(state.layout.next()))
            }
            (ViewState::Customizing, KeyCode::Char('p')) => {
                let preset = match state.style {
                    FrameStyle::Preset { preset } => preset.next(),
                    FrameStyle::Custom(_) => PresetId::ALL[0],
                };
                KeyOutcome::Dispatch(Action::SelectPreset(preset))
            }
            (ViewState::Customizing, KeyCode::Char('c')) => {
                self.color_input = Some(state.custom_color.to_string());
                self.input_error = None;
                KeyOutcome::Handled
            }
            (ViewState::Customizing, KeyCode::Left) => {
                self.selected_slot = self.selected_slot.saturating_sub(1);
                KeyOutcome::Handled
            }
            (ViewState::Customizing, KeyCode::Right) => {
                self.selected_slot = (self.selected_slot + 1).min(state.images.len().saturating_sub(1));
                KeyOutcome::Handled
            }
            (ViewState::Customizing, KeyCode::Char('[')) if self.selected_slot > 0 => {
                let from = self.selected_slot;
                self.selected_slot -= 1;
                KeyOutcome::Dispatch(Action::Reorder {
                    from,
                    to: self.selected_slot,
                })
            }
            (ViewState::Customizing, KeyCode::Char(']'))
                if self.selected_slot + 1 < state.images.len() =>
            {
                let from = self.selected_slot;
                self.selected_slot += 1;
                KeyOutcome::Dispatch(Action::Reorder {
                    from,
                    to: self.selected_slot,
                })
            }
            (ViewState::Customizing, KeyCode::Enter) => KeyOutcome::Dispatch(Action::Confirm),

            (ViewState::Result, KeyCode::Char('d')) => KeyOutcome::Dispatch(Action::Download),
            (ViewState::Result, KeyCode::Char('o')) if state.last_artifact.is_some() => {
                KeyOutcome::OpenArtifact
            }

            (
                ViewState::Customizing | ViewState::Result,
                KeyCode::Esc | KeyCode::Char('r'),
            ) => KeyOutcome::Dispatch(Action::Reset),

            _ => KeyOutcome::Ignored,
        }
    }

    fn handle_color_input(&mut self, code: KeyCode) -> KeyOutcome {
        let Some(input) = self.color_input.as_mut() else {
            return KeyOutcome::Ignored;
        };
        match code {
            KeyCode::Esc => {
                self.color_input = None;
                self.input_error = None;
                KeyOutcome::Handled
            }
            KeyCode::Backspace => {
                input.pop();
                KeyOutcome::Handled
            }
            KeyCode::Char(c) if (c.is_ascii_hexdigit() || c == '#') && input.len() < 7 => {
                input.push(c);
                KeyOutcome::Handled
            }
            KeyCode::Enter => match input.parse::<Rgb>() {
                Ok(color) => {
                    self.color_input = None;
                    self.input_error = None;
                    KeyOutcome::Dispatch(Action::SetCustomColor(color))
                }
                Err(e) => {
                    self.input_error = Some(e.to_string());
                    KeyOutcome::Handled
                }
            },
            _ => KeyOutcome::Ignored,
        }
    }
}

type ExportReceiver = oneshot::Receiver<Result<ImageArtifact, ExportError>>;

fn spawn_export(runtime: &tokio::runtime::Runtime, job: ExportJob) -> ExportReceiver {
    let (sender, receiver) = oneshot::channel();
    runtime.spawn(async move {
        let result = job.run().await;
        if sender.send(result).is_err() {
            warn!("Export finished after the shell closed");
        }
    });
    receiver
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut booth: Photobooth,
    runtime: &tokio::runtime::Runtime,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut shell = ShellState::default();
    let mut preview = FrameCache::default();
    let mut live: Option<RgbaImage> = None;
    let mut pending_export: Option<ExportReceiver> = None;
    let mut last_tick = Instant::now();

    info!("Terminal shell started");

    loop {
        let now = Instant::now();
        booth.tick(now - last_tick);
        last_tick = now;

        if booth.state().view == ViewState::Capturing {
            // Drain to the newest frame
            if let Some(frame) = booth.preview() {
                live = frame.to_image();
            }
        } else {
            live = None;
        }

        if let Some(receiver) = pending_export.as_mut() {
            match receiver.try_recv() {
                Ok(result) => {
                    pending_export = None;
                    booth.dispatch(Action::ExportFinished(result));
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    pending_export = None;
                    booth.dispatch(Action::ExportFinished(Err(ExportError::RenderFailure(
                        "export task stopped".to_string(),
                    ))));
                }
            }
        }

        if matches!(booth.state().view, ViewState::Customizing | ViewState::Result) {
            preview.update(booth.state().frame_tree());
        }

        terminal.draw(|f| draw(f, &booth, &shell, live.as_ref(), preview.image()))?;

        if event::poll(POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match shell.handle_key(key, &booth) {
                KeyOutcome::Quit => break,
                KeyOutcome::Dispatch(action) => {
                    if let Some(job) = booth.dispatch(action) {
                        pending_export = Some(spawn_export(runtime, job));
                    }
                }
                KeyOutcome::OpenArtifact => {
                    if let Some(artifact) = &booth.state().last_artifact
                        && let Err(e) = open::that(&artifact.path)
                    {
                        error!(path = %artifact.path.display(), error = %e, "Failed to open image");
                    }
                }
                KeyOutcome::Handled | KeyOutcome::Ignored => {}
            }
        }
    }

    info!("Terminal shell closed");
    Ok(())
}

/// Rendered frame, redrawn only when the composition changes
#[derive(Default)]
struct FrameCache {
    tree: Option<FrameTree>,
    image: Option<RgbaImage>,
}

impl FrameCache {
    fn update(&mut self, tree: FrameTree) {
        if self.tree.as_ref() == Some(&tree) {
            return;
        }
        self.image = Some(render(&tree, 1));
        self.tree = Some(tree);
    }

    fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }
}

fn draw(f: &mut Frame, booth: &Photobooth, shell: &ShellState, live: Option<&RgbaImage>, frame: Option<&RgbaImage>) {
    let area = f.area();
    let [main, status_area] = Split::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area);
    let state = booth.state();

    match state.view {
        ViewState::Start => draw_start(f, main, booth),
        ViewState::Capturing => {
            f.render_widget(
                HalfBlockImage {
                    image: live,
                    mirror: booth.mirror(),
                    placeholder: "Waiting for camera...",
                },
                main,
            );
            if let Some(n) = state.countdown() {
                draw_countdown(f, main, n);
            }
        }
        ViewState::Customizing | ViewState::Result => {
            let [left, right] =
                Split::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(main);
            f.render_widget(
                HalfBlockImage {
                    image: frame,
                    mirror: false,
                    placeholder: "Rendering...",
                },
                left,
            );
            draw_side_panel(f, right, booth, shell);
        }
    }

    let (message, is_error) = status_line(booth, shell);
    f.render_widget(
        StatusBar {
            message: &message,
            error: is_error,
        },
        status_area,
    );
}

fn draw_start(f: &mut Frame, area: Rect, booth: &Photobooth) {
    let state = booth.state();
    let mut lines = vec![
        Line::from(Span::styled(
            state.view.title(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Four photos, one frame."),
        Line::from("Press Enter to start the countdown."),
    ];
    if let Some(notice) = &state.notice {
        lines.push(Line::from(""));
        let color = if notice.is_error() { Color::Red } else { Color::Green };
        lines.push(Line::from(Span::styled(
            notice.message.clone(),
            Style::default().fg(color),
        )));
        if notice.is_error() {
            lines.push(Line::from("Press Enter to try again."));
        }
    }
    let height = (lines.len() as u16 + 2).min(area.height);
    let panel = centered(area, 60.min(area.width), height);
    f.render_widget(
        Paragraph::new(lines)
            .centered()
            .wrap(Wrap { trim: true })
            .block(Block::bordered()),
        panel,
    );
}

fn draw_countdown(f: &mut Frame, area: Rect, n: u8) {
    let panel = centered(area, 9.min(area.width), 3.min(area.height));
    f.render_widget(Clear, panel);
    f.render_widget(
        Paragraph::new(n.to_string())
            .centered()
            .style(Style::default().add_modifier(Modifier::BOLD))
            .block(Block::bordered()),
        panel,
    );
}

fn draw_side_panel(f: &mut Frame, area: Rect, booth: &Photobooth, shell: &ShellState) {
    let state = booth.state();
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(Span::styled(state.view.title(), bold)),
        Line::from(""),
        Line::from(format!("Layout: {}", state.layout.display_name())),
        Line::from(format!("Style:  {}", state.style.name())),
    ];

    match state.view {
        ViewState::Customizing => {
            let slots: Vec<Span> = (0..state.images.len())
                .map(|i| {
                    let label = format!(" {} ", i + 1);
                    if i == shell.selected_slot {
                        Span::styled(label, Style::default().add_modifier(Modifier::REVERSED))
                    } else {
                        Span::raw(label)
                    }
                })
                .collect();
            let mut slot_line = vec![Span::raw("Photos: ")];
            slot_line.extend(slots);
            lines.push(Line::from(slot_line));
            lines.push(Line::from(""));
            if let Some(input) = &shell.color_input {
                lines.push(Line::from(format!("Custom color: {}_", input)));
                if let Some(err) = &shell.input_error {
                    lines.push(Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))));
                }
                lines.push(Line::from("Enter apply | Esc cancel"));
            } else {
                lines.push(Line::from("l  switch layout"));
                lines.push(Line::from("p  next preset"));
                lines.push(Line::from(format!("c  custom color ({})", state.custom_color)));
                lines.push(Line::from("←/→ select photo, [ ] move it"));
                lines.push(Line::from("Enter  done"));
                lines.push(Line::from("r  start over"));
            }
        }
        ViewState::Result => {
            lines.push(Line::from(""));
            if state.is_downloading {
                lines.push(Line::from(Span::styled("Saving...", Style::default().fg(Color::Yellow))));
            } else {
                lines.push(Line::from("d  download"));
            }
            if let Some(artifact) = &state.last_artifact {
                lines.push(Line::from(format!("o  open {}", artifact.filename)));
            }
            lines.push(Line::from("r  start over"));
        }
        _ => {}
    }

    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::bordered()),
        area,
    );
}

fn status_line(booth: &Photobooth, shell: &ShellState) -> (String, bool) {
    let state = booth.state();
    if let Some(notice) = &state.notice {
        return (format!("{} | 'x' dismiss", notice.message), notice.is_error());
    }
    let message = match state.view {
        ViewState::Start => "Enter start | 'q' quit".to_string(),
        ViewState::Capturing => format!(
            "Photo {}/{} | Esc cancel | 'q' quit",
            (state.capture.session().progress() + 1).min(SLOT_COUNT),
            SLOT_COUNT
        ),
        ViewState::Customizing if shell.color_input.is_some() => {
            "Type a hex color, e.g. #ff88aa".to_string()
        }
        ViewState::Customizing => "Enter confirm | 'r' reset | 'q' quit".to_string(),
        ViewState::Result => "'d' download | 'r' reset | 'q' quit".to_string(),
    };
    (message, false)
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    }
}

/// Image drawn with half-block characters, fitted and centered
struct HalfBlockImage<'a> {
    image: Option<&'a RgbaImage>,
    mirror: bool,
    placeholder: &'a str,
}

impl Widget for HalfBlockImage<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(image) = self.image.filter(|i| i.width() > 0 && i.height() > 0) else {
            let msg = self.placeholder;
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        // Each terminal cell displays 2 vertical pixels
        let aspect = image.width() as f64 / image.height() as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > aspect {
            let h = term_height;
            ((h * aspect) as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            (w as u16, (w / aspect / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;
        let x_scale = image.width() as f64 / display_width as f64;
        let y_scale = image.height() as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let mut src_x = ((tx as f64 * x_scale) as u32).min(image.width() - 1);
                if self.mirror {
                    src_x = image.width() - 1 - src_x;
                }
                let top = ((ty as f64 * 2.0 * y_scale) as u32).min(image.height() - 1);
                let bottom = (((ty as f64 * 2.0 + 1.0) * y_scale) as u32).min(image.height() - 1);

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(to_color(image.get_pixel(src_x, top)));
                    cell.set_bg(to_color(image.get_pixel(src_x, bottom)));
                }
            }
        }
    }
}

fn to_color(pixel: &image::Rgba<u8>) -> Color {
    Color::Rgb(pixel[0], pixel[1], pixel[2])
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
    error: bool,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg = if self.error { Color::Red } else { Color::DarkGray };
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(bg);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(area.x, area.y, text, Style::default().fg(Color::White).bg(bg));
    }
}
