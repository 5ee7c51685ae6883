use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};
use unicode_width::UnicodeWidthStr;

use crate::chart::{geometry::angle_from_top, DrawCommand, Rgb, Sector};

/// CSS units covered by one terminal cell. A cell is drawn as two stacked
/// half blocks, so each half is a square of `CELL_WIDTH`.
pub const CELL_WIDTH: f64 = 8.0;
pub const CELL_HEIGHT: f64 = 16.0;

const HALF_BLOCK: &str = "▀";

/// CSS size of a terminal area.
pub fn css_size(area: Rect) -> (f64, f64) {
    (
        area.width as f64 * CELL_WIDTH,
        area.height as f64 * CELL_HEIGHT,
    )
}

/// CSS coordinates of the centre of a terminal cell inside `area`.
pub fn css_point(area: Rect, column: u16, row: u16) -> (f64, f64) {
    (
        (column.saturating_sub(area.x)) as f64 * CELL_WIDTH + CELL_WIDTH / 2.0,
        (row.saturating_sub(area.y)) as f64 * CELL_HEIGHT + CELL_HEIGHT / 2.0,
    )
}

pub fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Colour of the topmost shape at a CSS point, replaying one frame.
pub fn color_at(commands: &[DrawCommand], x: f64, y: f64) -> Option<Rgb> {
    let mut color = None;
    for command in commands {
        match command {
            DrawCommand::Clear => color = None,
            DrawCommand::Disc {
                cx,
                cy,
                radius,
                color: c,
            } => {
                if (x - cx).hypot(y - cy) <= *radius {
                    color = Some(*c);
                }
            }
            DrawCommand::Ring {
                cx,
                cy,
                radius,
                width,
                color: c,
            } => {
                if ((x - cx).hypot(y - cy) - radius).abs() <= width / 2.0 {
                    color = Some(*c);
                }
            }
            DrawCommand::Sector {
                index,
                cx,
                cy,
                inner_radius,
                outer_radius,
                start_angle,
                end_angle,
                fill,
                ..
            } => {
                let sector = Sector {
                    index: *index,
                    start_angle: *start_angle,
                    end_angle: *end_angle,
                    outer_radius: *outer_radius,
                };
                let (dx, dy) = (x - cx, y - cy);
                if sector.contains(*inner_radius, dx.hypot(dy), angle_from_top(dx, dy)) {
                    color = Some(*fill);
                }
            }
            DrawCommand::Text { .. } => {}
        }
    }
    color
}

/// Rasterises a recorded chart frame into terminal cells.
pub struct ChartView<'a> {
    commands: &'a [DrawCommand],
}

impl<'a> ChartView<'a> {
    pub fn new(commands: &'a [DrawCommand]) -> Self {
        Self { commands }
    }
}

impl Widget for ChartView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for col in 0..area.width {
                let x = col as f64 * CELL_WIDTH + CELL_WIDTH / 2.0;
                let top_y = row as f64 * CELL_HEIGHT + CELL_HEIGHT / 4.0;
                let bottom_y = top_y + CELL_HEIGHT / 2.0;

                let top = color_at(self.commands, x, top_y);
                let bottom = color_at(self.commands, x, bottom_y);
                if top.is_none() && bottom.is_none() {
                    continue;
                }

                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_symbol(HALF_BLOCK);
                    cell.set_style(
                        Style::default()
                            .fg(top.map_or(Color::Reset, to_color))
                            .bg(bottom.map_or(Color::Reset, to_color)),
                    );
                }
            }
        }

        for command in self.commands {
            if let DrawCommand::Text { x, y, text, color, .. } = command {
                let width = text.width() as u16;
                let col = (x / CELL_WIDTH) as u16;
                let row = (y / CELL_HEIGHT) as u16;
                if row >= area.height || width > area.width {
                    continue;
                }
                let start = col.saturating_sub(width / 2).min(area.width - width);
                buf.set_string(
                    area.x + start,
                    area.y + row,
                    text,
                    Style::default().fg(to_color(*color)),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartOptions, RadialChart, RecordingSurface, Theme};
    use crate::scoring::{TopicAggregate, TopicScore};

    #[test]
    fn css_mapping() {
        let area = Rect::new(2, 1, 30, 15);
        assert_eq!(css_size(area), (240.0, 240.0));
        assert_eq!(css_point(area, 2, 1), (4.0, 8.0));
        assert_eq!(css_point(area, 3, 2), (12.0, 24.0));
    }

    #[test]
    fn later_commands_paint_over_earlier() {
        let red = Rgb(255, 0, 0);
        let blue = Rgb(0, 0, 255);
        let commands = vec![
            DrawCommand::Clear,
            DrawCommand::Disc {
                cx: 0.0,
                cy: 0.0,
                radius: 10.0,
                color: red,
            },
            DrawCommand::Disc {
                cx: 0.0,
                cy: 0.0,
                radius: 5.0,
                color: blue,
            },
        ];
        assert_eq!(color_at(&commands, 1.0, 1.0), Some(blue));
        assert_eq!(color_at(&commands, 7.0, 0.0), Some(red));
        assert_eq!(color_at(&commands, 20.0, 0.0), None);
    }

    #[test]
    fn renders_chart_with_centre_label() {
        let agg: TopicAggregate = vec![(
            "A",
            TopicScore {
                correct_count: 3,
                total_count: 4,
                first_attempt_correct_count: 3,
            },
        )]
        .into_iter()
        .collect();
        let area = Rect::new(0, 0, 40, 20);
        let (w, h) = css_size(area);
        let chart = RadialChart::render(
            RecordingSurface::new(w, h),
            &agg,
            ChartOptions::default(),
        );

        let mut buf = Buffer::empty(area);
        ChartView::new(chart.surface().commands()).render(area, &mut buf);

        let text: String = (0..area.width)
            .map(|x| buf[(x, 10)].symbol().to_string())
            .collect();
        assert!(text.contains("3/4"), "{text:?}");

        // Mid-ring, right of centre, is painted in the first palette colour.
        let cell = &buf[(31, 10)];
        assert_eq!(cell.symbol(), HALF_BLOCK);
        assert_eq!(cell.fg, to_color(Theme::light().segment(0)));
    }
}
