use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use keypace::app::{App, AppState};
use keypace::best_score::BestOutcome;
use keypace::session::{CharStatus, Status};
use keypace::util::format_clock;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

/// Renders whichever screen the app is on.
pub struct AppView<'a> {
    app: &'a App,
}

impl<'a> AppView<'a> {
    pub fn new(app: &'a App) -> Self {
        Self { app }
    }
}

impl Widget for AppView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Length(1), // padding
                Constraint::Length(1), // stats
                Constraint::Length(1), // settings
                Constraint::Length(1), // padding
                Constraint::Min(1),    // body
                Constraint::Length(1), // legend
            ])
            .split(area);

        render_header(self.app, chunks[0], buf);
        render_stats_bar(self.app, chunks[2], buf);
        render_settings(self.app, chunks[3], buf);

        match self.app.state {
            AppState::Typing => render_passage(self.app, chunks[5], buf),
            AppState::Results => render_results(self.app, chunks[5], buf),
        }

        render_legend(self.app, chunks[6], buf);
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let title = Paragraph::new(Span::styled("keypace", bold().fg(Color::Cyan)));
    title.render(halves[0], buf);

    let best = app
        .best_wpm
        .map_or_else(|| "--".to_string(), |wpm| wpm.to_string());
    let best = Paragraph::new(Line::from(vec![
        Span::styled("Personal best: ", Style::default().fg(Color::Gray)),
        Span::styled(format!("{best} WPM"), bold()),
    ]))
    .alignment(Alignment::Right);
    best.render(halves[1], buf);
}

fn render_stats_bar(app: &App, area: Rect, buf: &mut Buffer) {
    let stats = &app.stats;
    let mode = app.session.mode();
    let label = Style::default().fg(Color::Gray);
    let accuracy_style = if stats.accuracy < 100 {
        bold().fg(Color::Red)
    } else {
        bold()
    };

    let line = Paragraph::new(Line::from(vec![
        Span::styled("WPM: ", label),
        Span::styled(stats.wpm.to_string(), bold()),
        Span::raw("   "),
        Span::styled("Accuracy: ", label),
        Span::styled(format!("{}%", stats.accuracy), accuracy_style),
        Span::raw("   "),
        Span::styled("Time: ", label),
        Span::styled(format_clock(stats.display_elapsed_ms, mode), bold()),
    ]))
    .alignment(Alignment::Center);
    line.render(area, buf);
}

fn render_settings(app: &App, area: Rect, buf: &mut Buffer) {
    let label = Style::default().fg(Color::Gray);
    let difficulty = if app.session.passage().is_custom() {
        "Custom".to_string()
    } else {
        app.settings.difficulty.to_string()
    };
    let settings = Paragraph::new(Line::from(vec![
        Span::styled("Difficulty: ", label),
        Span::styled(difficulty, bold()),
        Span::raw("   "),
        Span::styled("Mode: ", label),
        Span::styled(app.settings.mode.to_string(), bold()),
    ]))
    .alignment(Alignment::Center)
    .style(Style::default().add_modifier(Modifier::DIM));
    settings.render(area, buf);
}

fn render_passage(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;

    let green_bold_style = bold().fg(Color::Green);
    let red_bold_style = bold().fg(Color::Red).add_modifier(Modifier::UNDERLINED);
    let dim_bold_style = bold().add_modifier(Modifier::DIM);
    let cursor_style = dim_bold_style
        .add_modifier(Modifier::UNDERLINED)
        .fg(Color::Blue);

    let cursor = session.cursor();
    let spans = session
        .expected()
        .iter()
        .enumerate()
        .map(|(idx, &expected)| {
            let style = if idx == cursor {
                cursor_style
            } else {
                match session.char_status(idx) {
                    CharStatus::Correct => green_bold_style,
                    CharStatus::Incorrect => red_bold_style,
                    CharStatus::Pending => dim_bold_style,
                }
            };
            let symbol = match (session.char_status(idx), expected) {
                (CharStatus::Incorrect, ' ') => "·".to_owned(),
                (_, c) => c.to_string(),
            };
            Span::styled(symbol, style)
        })
        .collect::<Vec<Span>>();

    let prompt_width = session.passage().text.width();
    let fits_on_one_line = prompt_width <= area.width as usize;

    let widget = Paragraph::new(Line::from(spans))
        .alignment(if fits_on_one_line {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: false });

    widget.render(area, buf);
}

/// Title and subtitle for the results screen.
pub fn headline(outcome: Option<BestOutcome>) -> (&'static str, &'static str) {
    match outcome {
        Some(BestOutcome::Baseline { .. }) => (
            "Baseline Established!",
            "You've set a personal best. Can you beat it next time?",
        ),
        Some(BestOutcome::NewBest { .. }) => (
            "High Score Smashed!",
            "Incredible work! You've beaten your personal best. Can you do it again?",
        ),
        _ => (
            "Test Complete!",
            "Solid run. Keep pushing to beat your high score.",
        ),
    }
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let stats = &app.stats;
    let (title, subtitle) = headline(app.outcome);
    let title_style = match app.outcome {
        Some(BestOutcome::NewBest { .. }) => bold().fg(Color::Yellow),
        _ => bold(),
    };

    let accuracy_style = if stats.accuracy < 100 {
        bold().fg(Color::Red)
    } else {
        bold()
    };

    let lines = vec![
        Line::from(Span::styled(title, title_style)),
        Line::from(Span::styled(
            subtitle,
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )),
        Line::default(),
        Line::from(vec![
            Span::raw("WPM: "),
            Span::styled(stats.wpm.to_string(), bold()),
            Span::raw("   Accuracy: "),
            Span::styled(format!("{}%", stats.accuracy), accuracy_style),
            Span::raw("   Characters: "),
            Span::styled(stats.correct_chars.to_string(), bold().fg(Color::Green)),
            Span::raw(" / "),
            Span::styled(stats.incorrect_chars.to_string(), bold().fg(Color::Red)),
        ]),
    ];

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

fn render_legend(app: &App, area: Rect, buf: &mut Buffer) {
    let text = match (app.state, app.session.status()) {
        (AppState::Results, _) => "(r)etry / (n)ew / (d)ifficulty / (m)ode / (esc)ape",
        (AppState::Typing, Status::Idle) => {
            "start typing to begin / (←) restart / (→) new / (esc)ape"
        }
        (AppState::Typing, _) => "(←) restart / (→) new / (esc)ape",
    };

    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(area, buf);
}
