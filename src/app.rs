use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use tracing::{debug, error};

use crate::chart::{ChartEvent, ChartOptions, RadialChart, RecordingSurface, Theme, Tooltip};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::QuizError;
use crate::question::Deck;
use crate::session::{AnswerOutcome, AnswerResult, Phase, SessionController, SessionSummary};
use crate::ui::charting::{css_point, css_size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Quiz,
    Results,
}

/// What the event loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The session just completed; persist its summary.
    Finished,
    Quit,
}

pub struct App<C: Clock = SystemClock> {
    pub deck: Deck,
    pub config: Config,
    pub state: AppState,
    session: SessionController<C>,
    last_answer: Option<AnswerResult>,
    chart: Option<RadialChart<RecordingSurface>>,
    chart_area: Rect,
    tooltip: Option<Tooltip>,
    dark: bool,
    personal_best: Option<u64>,
}

impl<C: Clock> App<C> {
    /// Start the first session on `deck`. Fails without side effects when the
    /// deck is malformed.
    pub fn new(
        deck: Deck,
        config: Config,
        mut session: SessionController<C>,
    ) -> Result<Self, QuizError> {
        session.start(&deck)?;
        session.present_next();
        let dark = config.dark_mode;

        let mut app = Self {
            deck,
            config,
            state: AppState::Quiz,
            session,
            last_answer: None,
            chart: None,
            chart_area: Rect::default(),
            tooltip: None,
            dark,
            personal_best: None,
        };
        if app.session.phase() == Phase::Complete {
            app.enter_results();
        }
        Ok(app)
    }

    /// Reshuffle and run the same deck again.
    pub fn restart(&mut self) -> Result<(), QuizError> {
        self.session.start(&self.deck)?;
        self.session.present_next();
        self.state = AppState::Quiz;
        self.last_answer = None;
        self.tooltip = None;
        self.chart = None;
        self.personal_best = None;
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        match (self.state, key.code) {
            (_, KeyCode::Esc) | (AppState::Results, KeyCode::Char('q')) => Flow::Quit,
            (_, KeyCode::Char('d')) => {
                self.toggle_theme();
                Flow::Continue
            }
            (AppState::Quiz, KeyCode::Char(c @ '1'..='9')) => {
                let index = c as usize - '1' as usize;
                self.answer(index);
                Flow::Continue
            }
            (AppState::Quiz, KeyCode::Enter | KeyCode::Char(' ')) => {
                // Skip the remaining delay after a correct answer.
                if self.session.pending_advance().is_some() {
                    self.session.present_next();
                    self.last_answer = None;
                }
                self.check_finished()
            }
            (AppState::Quiz, KeyCode::Char('e')) => {
                self.session.end_early();
                self.check_finished()
            }
            (AppState::Results, KeyCode::Char('b')) => {
                self.toggle_basis();
                Flow::Continue
            }
            (AppState::Results, KeyCode::Char('r')) => {
                if let Err(err) = self.restart() {
                    error!(error = %err, "restart failed");
                    return Flow::Quit;
                }
                self.check_finished()
            }
            _ => Flow::Continue,
        }
    }

    fn answer(&mut self, index: usize) {
        match self.session.answer(index) {
            Ok(AnswerOutcome::Answered(result)) => self.last_answer = Some(result),
            Ok(AnswerOutcome::Ignored) => {}
            Err(err) => debug!(error = %err, "answer ignored"),
        }
    }

    /// Drive the auto-advance timer.
    pub fn on_tick(&mut self) -> Flow {
        if self.state == AppState::Quiz && self.session.tick() {
            self.last_answer = None;
            return self.check_finished();
        }
        Flow::Continue
    }

    /// Pointer moved to a terminal cell.
    pub fn on_mouse(&mut self, column: u16, row: u16) {
        let area = self.chart_area;
        let Some(chart) = self.chart.as_mut() else {
            return;
        };

        let inside = column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        self.tooltip = if inside {
            let (x, y) = css_point(area, column, row);
            chart.handle(ChartEvent::PointerMove { x, y })
        } else {
            chart.handle(ChartEvent::PointerLeave)
        };
    }

    /// Keep the chart's surface in step with where the UI will draw it.
    pub fn sync_chart_area(&mut self, area: Rect) {
        if area == self.chart_area {
            return;
        }
        self.chart_area = area;
        if let Some(chart) = self.chart.as_mut() {
            let (w, h) = css_size(area);
            chart.surface_mut().set_css_size(w, h);
            self.tooltip = chart.handle(ChartEvent::Resize);
        }
    }

    pub fn toggle_theme(&mut self) {
        self.dark = !self.dark;
        if let Some(chart) = self.chart.as_mut() {
            self.tooltip = chart.handle(ChartEvent::ThemeChanged(Theme::for_mode(self.dark)));
        }
    }

    /// Switch the chart between overall and first-try correctness.
    pub fn toggle_basis(&mut self) {
        self.config.chart_basis = self.config.chart_basis.toggled();
        if self.state == AppState::Results {
            self.draw_chart();
        }
    }

    fn check_finished(&mut self) -> Flow {
        if self.state == AppState::Quiz && self.session.phase() == Phase::Complete {
            self.enter_results();
            Flow::Finished
        } else {
            Flow::Continue
        }
    }

    fn enter_results(&mut self) {
        self.state = AppState::Results;
        self.last_answer = None;
        self.draw_chart();
    }

    fn draw_chart(&mut self) {
        self.tooltip = None;
        let (w, h) = css_size(self.chart_area);
        self.chart = Some(RadialChart::render(
            RecordingSurface::new(w, h),
            self.session.scoring().topics(),
            ChartOptions {
                theme: Theme::for_mode(self.dark),
                basis: self.config.chart_basis,
                ..ChartOptions::default()
            },
        ));
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        self.session.summary()
    }

    pub fn set_personal_best(&mut self, best: Option<u64>) {
        self.personal_best = best;
    }

    pub fn personal_best(&self) -> Option<u64> {
        self.personal_best
    }

    pub fn session(&self) -> &SessionController<C> {
        &self.session
    }

    pub fn last_answer(&self) -> Option<&AnswerResult> {
        self.last_answer.as_ref()
    }

    pub fn chart(&self) -> Option<&RadialChart<RecordingSurface>> {
        self.chart.as_ref()
    }

    pub fn chart_area(&self) -> Rect {
        self.chart_area
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn is_dark(&self) -> bool {
        self.dark
    }
}
