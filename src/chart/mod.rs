//! Radial per-topic proficiency chart.
//!
//! Each topic is one sector of a ring. A sector's angular width is its share of
//! the total slice weight (volume of correct answers) and its outer radius
//! grows linearly from the inner hole to the maximum radius with the topic's
//! correctness ratio. The renderer only emits [`DrawCommand`]s to a
//! [`Surface`]; adapters decide how to put them on screen.

pub mod color;
pub mod entries;
pub mod geometry;
pub mod surface;

pub use color::{Rgb, Theme};
pub use entries::{compute_entries, ChartBasis, ChartEntry};
pub use geometry::{hit_test, layout, Geometry, Sector};
pub use surface::{DrawCommand, ListenerId, ListenerKind, RecordingSurface, Surface};

use tracing::debug;

use crate::scoring::TopicAggregate;

const HOVER_BRIGHTEN: f64 = 0.18;
const DEFAULT_MIN_SIZE: f64 = 240.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub theme: Theme,
    pub basis: ChartBasis,
    /// Smallest CSS width/height the chart lays itself out in.
    pub min_size: f64,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            basis: ChartBasis::default(),
            min_size: DEFAULT_MIN_SIZE,
        }
    }
}

/// Host events the chart subscribes to.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartEvent {
    PointerMove { x: f64, y: f64 },
    PointerLeave,
    Resize,
    ThemeChanged(Theme),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tooltip {
    pub label: String,
    pub correct: u64,
    pub total: u64,
    pub percent: u32,
}

impl Tooltip {
    pub fn text(&self) -> String {
        format!(
            "{}\n{} / {} correct ({}%)",
            self.label, self.correct, self.total, self.percent
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendItem {
    pub label: String,
    pub correct: u64,
    pub total: u64,
    pub color: Rgb,
}

/// A live chart bound to one surface. Highlight state is per instance.
#[derive(Debug)]
pub struct RadialChart<S: Surface> {
    surface: S,
    options: ChartOptions,
    entries: Vec<ChartEntry>,
    total_weight: f64,
    highlight: Option<usize>,
    listeners: Vec<ListenerId>,
    destroyed: bool,
}

impl<S: Surface> RadialChart<S> {
    /// Attach to `surface`, subscribe to host events and draw the first frame.
    pub fn render(mut surface: S, aggregate: &TopicAggregate, options: ChartOptions) -> Self {
        let listeners = [
            ListenerKind::PointerMove,
            ListenerKind::PointerLeave,
            ListenerKind::Resize,
            ListenerKind::ThemeChange,
        ]
        .into_iter()
        .map(|kind| surface.listen(kind))
        .collect();

        let mut chart = Self {
            surface,
            options,
            entries: Vec::new(),
            total_weight: 0.0,
            highlight: None,
            listeners,
            destroyed: false,
        };
        chart.set_data(aggregate);
        chart.draw();
        chart
    }

    /// Replace the data and redraw with no highlight.
    pub fn update(&mut self, aggregate: &TopicAggregate) {
        if self.destroyed {
            debug!("update on destroyed chart ignored");
            return;
        }
        self.set_data(aggregate);
        self.highlight = None;
        self.draw();
    }

    /// Detach all listeners and clear the surface. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        for id in self.listeners.drain(..) {
            self.surface.unlisten(id);
        }
        self.surface.draw(DrawCommand::Clear);
        self.highlight = None;
        self.destroyed = true;
    }

    /// Feed a host event. Returns the tooltip for the hovered sector, if any.
    pub fn handle(&mut self, event: ChartEvent) -> Option<Tooltip> {
        if self.destroyed {
            return None;
        }
        match event {
            ChartEvent::PointerMove { x, y } => {
                let found = self.hit_test(x, y);
                if found != self.highlight {
                    self.highlight = found;
                    self.draw();
                }
                self.tooltip()
            }
            ChartEvent::PointerLeave => {
                if self.highlight.take().is_some() {
                    self.draw();
                }
                None
            }
            ChartEvent::Resize => {
                self.draw();
                self.tooltip()
            }
            ChartEvent::ThemeChanged(theme) => {
                self.options.theme = theme;
                self.draw();
                self.tooltip()
            }
        }
    }

    /// Sector index under a point in CSS coordinates.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<usize> {
        hit_test(&self.geometry(), &self.entries, self.total_weight, x, y)
    }

    pub fn geometry(&self) -> Geometry {
        let (w, h) = self.surface.css_size();
        Geometry::new(w.max(self.options.min_size), h.max(self.options.min_size))
    }

    pub fn tooltip(&self) -> Option<Tooltip> {
        let e = self.entries.get(self.highlight?)?;
        Some(Tooltip {
            label: e.label.clone(),
            correct: e.correct_count,
            total: e.total_count,
            percent: e.percent(),
        })
    }

    pub fn legend(&self) -> Vec<LegendItem> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| LegendItem {
                label: e.label.clone(),
                correct: e.correct_count,
                total: e.total_count,
                color: self.options.theme.segment(i),
            })
            .collect()
    }

    pub fn entries(&self) -> &[ChartEntry] {
        &self.entries
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlight
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    fn set_data(&mut self, aggregate: &TopicAggregate) {
        self.entries = compute_entries(aggregate, self.options.basis);
        self.total_weight = entries::total_weight(&self.entries);
    }

    fn resize_backing(&mut self) -> Geometry {
        let geometry = self.geometry();
        let dpr = self.surface.device_pixel_ratio();
        let dpr = if dpr > 0.0 { dpr } else { 1.0 };
        self.surface.set_backing_size(
            (geometry.width * dpr).round() as u32,
            (geometry.height * dpr).round() as u32,
            dpr,
        );
        geometry
    }

    fn draw(&mut self) {
        let g = self.resize_backing();
        let theme = &self.options.theme;

        self.surface.draw(DrawCommand::Clear);
        self.surface.draw(DrawCommand::Disc {
            cx: g.cx,
            cy: g.cy,
            radius: (g.inner_radius - 2.0).max(0.0),
            color: theme.surface,
        });

        if self.entries.is_empty() || self.total_weight <= 0.0 {
            self.surface.draw(DrawCommand::Ring {
                cx: g.cx,
                cy: g.cy,
                radius: (g.inner_radius + g.max_radius) / 2.0,
                width: (g.inner_radius * 0.2).max(8.0),
                color: theme.faint,
            });
            return;
        }

        let bump = g.hover_bump();
        let commands: Vec<DrawCommand> = layout(&g, &self.entries, self.total_weight)
            .into_iter()
            .map(|sector| {
                let hovered = self.highlight == Some(sector.index);
                let base = theme.segment(sector.index);
                DrawCommand::Sector {
                    index: sector.index,
                    cx: g.cx,
                    cy: g.cy,
                    inner_radius: g.inner_radius,
                    outer_radius: sector.outer_radius + if hovered { bump } else { 0.0 },
                    start_angle: sector.start_angle,
                    end_angle: sector.end_angle,
                    fill: if hovered { base.brighten(HOVER_BRIGHTEN) } else { base },
                    stroke: theme.faint,
                }
            })
            .collect();
        for command in commands {
            self.surface.draw(command);
        }

        let correct: u64 = self.entries.iter().map(|e| e.correct_count).sum();
        let total: u64 = self.entries.iter().map(|e| e.total_count).sum();
        self.surface.draw(DrawCommand::Text {
            x: g.cx,
            y: g.cy,
            text: format!("{correct}/{total}"),
            size: (g.inner_radius * 0.18).max(14.0),
            color: self.options.theme.text,
        });
    }
}

impl<S: Surface> Drop for RadialChart<S> {
    fn drop(&mut self) {
        self.destroy();
    }
}
