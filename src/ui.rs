pub mod charting;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use crate::app::{App, AppState};
use crate::clock::Clock;
use crate::session::OptionState;
use charting::{to_color, ChartView};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;
const LEGEND_WIDTH: u16 = 28;

fn results_chunks(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Min(4),    // chart + legend
            Constraint::Length(2), // tooltip
            Constraint::Length(1), // stats
            Constraint::Length(1), // mastery / best
            Constraint::Length(1), // padding
            Constraint::Length(1), // keys
        ])
        .split(area)
}

fn chart_and_legend(area: Rect) -> (Rect, Rect) {
    let legend_width = if area.width > LEGEND_WIDTH * 2 {
        LEGEND_WIDTH
    } else {
        0
    };
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(legend_width)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Where the results screen draws the radial chart for a terminal of `area`.
pub fn results_chart_area(area: Rect) -> Rect {
    chart_and_legend(results_chunks(area)[1]).0
}

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Quiz => render_quiz(self, area, buf),
            AppState::Results => render_results(self, area, buf),
        }
    }
}

fn render_quiz<C: Clock>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);
    let italic = Style::default().add_modifier(Modifier::ITALIC);

    let session = app.session();
    let Some(active) = session.current() else {
        return;
    };
    let progress = session.progress();

    let option_lines: Vec<Line> = active
        .question
        .options
        .iter()
        .zip(&active.option_states)
        .enumerate()
        .map(|(i, (option, state))| {
            let style = match state {
                OptionState::Unclicked if active.resolved => dim,
                OptionState::Unclicked => Style::default(),
                OptionState::Correct => bold.fg(Color::Green),
                OptionState::Incorrect => Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::CROSSED_OUT),
            };
            Line::from(vec![
                Span::styled(format!("({}) ", i + 1), dim),
                Span::styled(option.clone(), style),
            ])
        })
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),                         // deck / topic
            Constraint::Length(1),                         // live stats
            Constraint::Length(1),                         // padding
            Constraint::Min(2),                            // question
            Constraint::Length(option_lines.len() as u16), // options
            Constraint::Length(1),                         // points indicator
            Constraint::Length(3),                         // explanation
            Constraint::Length(1),                         // keys
        ])
        .split(area);

    Paragraph::new(Line::from(vec![
        Span::styled(session.test_id().to_string(), bold),
        Span::styled(format!("  {}", active.question.topic), italic),
    ]))
    .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        format!(
            "Points: {}   Streak: {}   Question {}/{}",
            progress.points, progress.streak, progress.done, progress.total
        ),
        Style::default().fg(Color::Cyan),
    ))
    .render(chunks[1], buf);

    Paragraph::new(Span::styled(active.question.text.clone(), bold))
        .wrap(Wrap { trim: true })
        .render(chunks[3], buf);

    Paragraph::new(option_lines).render(chunks[4], buf);

    if let Some(text) = app
        .last_answer()
        .and_then(|a| a.feedback.display_text.as_deref())
    {
        let color = if app.last_answer().is_some_and(|a| a.correct) {
            Color::Green
        } else {
            Color::Red
        };
        Paragraph::new(Span::styled(text.to_string(), bold.fg(color)))
            .alignment(Alignment::Right)
            .render(chunks[5], buf);
    }

    if active.explanation_visible && !active.question.explanation.is_empty() {
        Paragraph::new(Span::styled(active.question.explanation.clone(), italic))
            .wrap(Wrap { trim: true })
            .render(chunks[6], buf);
    }

    let keys = format!(
        "(1-{}) answer / (enter) next / (e)nd early / (d)ark / (esc)ape",
        active.question.options.len()
    );
    Paragraph::new(Span::styled(keys, italic)).render(chunks[7], buf);
}

fn render_results<C: Clock>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let italic = Style::default().add_modifier(Modifier::ITALIC);

    let Some(summary) = app.summary() else {
        return;
    };
    let chunks = results_chunks(area);
    let (chart_area, legend_area) = chart_and_legend(chunks[1]);

    let title = if summary.ended_early {
        format!("{} ended early", summary.test_id)
    } else {
        format!("{} complete", summary.test_id)
    };
    Paragraph::new(Span::styled(title, bold))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    if let Some(chart) = app.chart() {
        ChartView::new(chart.surface().commands()).render(chart_area, buf);

        let legend: Vec<Line> = chart
            .legend()
            .into_iter()
            .map(|item| {
                Line::from(vec![
                    Span::styled("■ ", Style::default().fg(to_color(item.color))),
                    Span::raw(format!("{} — {}/{}", item.label, item.correct, item.total)),
                ])
            })
            .collect();
        Paragraph::new(legend)
            .wrap(Wrap { trim: true })
            .render(legend_area, buf);
    }

    if let Some(tip) = app.tooltip() {
        Paragraph::new(tip.text().lines().map(str::to_string).map(Line::from).collect_vec())
            .alignment(Alignment::Center)
            .render(chunks[2], buf);
    }

    let topics = &summary.topic_aggregate;
    let first_try: u64 = topics.iter().map(|(_, s)| s.first_attempt_correct_count).sum();
    let stats = format!(
        "{} pts   {}/{} questions   {}/{} first try   {}% accuracy",
        summary.total_points,
        summary.completed_count,
        summary.total_count,
        first_try,
        topics.total_count(),
        (topics.weighted_correctness() * 100.0).round()
    );
    Paragraph::new(Span::styled(stats, bold))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    let mut notes = Vec::new();
    if summary.is_mastered() {
        notes.push(Span::styled(
            format!("mastered {}", summary.test_id),
            bold.fg(Color::Green),
        ));
    }
    match app.personal_best() {
        Some(best) if summary.total_points > best => {
            notes.push(Span::styled("new personal best", bold.fg(Color::Yellow)))
        }
        Some(best) => notes.push(Span::styled(format!("best: {best} pts"), italic)),
        None => {}
    }
    let notes = Itertools::intersperse(notes.into_iter(), Span::raw("   ")).collect_vec();
    Paragraph::new(Line::from(notes))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);

    let keys = format!(
        "(r)etry / (b)asis: {} / (d)ark / (esc)ape",
        app.config.chart_basis
    );
    Paragraph::new(Span::styled(keys, italic)).render(chunks[6], buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::Config;
    use crate::question::{Deck, Question, QuestionGroup};
    use crate::session::{SessionConfig, SessionController};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};

    fn deck() -> Deck {
        Deck {
            test_name: "Capitals".into(),
            topics: vec![QuestionGroup {
                topic: "Europe".into(),
                questions: vec![Question {
                    text: "Capital of France?".into(),
                    options: vec!["Paris".into(), "Lyon".into(), "Nice".into()],
                    correct_option: "Paris".into(),
                    explanation: "Paris has been the capital since 987.".into(),
                    topic: String::new(),
                }],
            }],
        }
    }

    fn app() -> App<ManualClock> {
        let session = SessionController::with_seed(SessionConfig::default(), ManualClock::new(), 3);
        App::new(deck(), Config::default(), session).unwrap()
    }

    fn render(app: &App<ManualClock>, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| f.render_widget(app, f.area())).unwrap();
        let buffer = terminal.backend().buffer().clone();
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .join("\n")
    }

    fn wrong_key(app: &App<ManualClock>) -> KeyEvent {
        let correct = app.session().current().unwrap().correct_index;
        let wrong = (correct + 1) % 3;
        KeyEvent::new(
            KeyCode::Char((b'1' + wrong as u8) as char),
            KeyModifiers::NONE,
        )
    }

    #[test]
    fn quiz_screen_shows_question_and_options() {
        let app = app();
        let screen = render(&app, 80, 24);
        assert!(screen.contains("Capitals"));
        assert!(screen.contains("Europe"));
        assert!(screen.contains("Capital of France?"));
        assert!(screen.contains("Paris"));
        assert!(screen.contains("Question 1/1"));
        assert!(screen.contains("(1-3) answer"));
        assert!(!screen.contains("since 987"));
    }

    #[test]
    fn wrong_answer_reveals_explanation_and_penalty() {
        let mut app = app();
        let key = wrong_key(&app);
        app.handle_key(key);

        let screen = render(&app, 80, 24);
        assert!(screen.contains("since 987"));
        assert!(screen.contains("-0 pts"));
    }

    #[test]
    fn results_screen_shows_chart_legend_and_stats() {
        let mut app = app();
        let correct = app.session().current().unwrap().correct_index;
        app.handle_key(KeyEvent::new(
            KeyCode::Char((b'1' + correct as u8) as char),
            KeyModifiers::NONE,
        ));
        app.handle_key(KeyEvent::new(KeyCode::Char('e'), KeyModifiers::NONE));
        app.sync_chart_area(results_chart_area(Rect::new(0, 0, 100, 30)));
        app.set_personal_best(Some(500));

        let screen = render(&app, 100, 30);
        assert!(screen.contains("Capitals ended early"));
        assert!(screen.contains("Europe — 1/1"));
        assert!(screen.contains("115 pts"));
        assert!(screen.contains("best: 500 pts"));
        assert!(screen.contains("(b)asis: correct"));
    }

    #[test]
    fn tiny_terminal_does_not_panic() {
        let mut app = app();
        let _ = render(&app, 10, 4);
        app.handle_key(KeyEvent::new(KeyCode::Char('e'), KeyModifiers::NONE));
        app.sync_chart_area(results_chart_area(Rect::new(0, 0, 10, 4)));
        let _ = render(&app, 10, 4);
    }

    #[test]
    fn chart_area_sits_inside_terminal() {
        let area = Rect::new(0, 0, 120, 40);
        let chart = results_chart_area(area);
        assert!(chart.width > 0 && chart.height > 0);
        assert!(chart.right() <= area.right() - HORIZONTAL_MARGIN);
        assert!(chart.bottom() <= area.bottom());
    }
}
