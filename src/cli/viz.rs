//! Terminal visualization using braille graphics
//!
//! Scatter plots of classified series, with the fit line overlaid when the
//! plot has one. Each braille character packs a 2x4 grid of dots.

use drawille::Canvas;

use crate::core::classify::{FitLine, PlotSeries, ScatterPoint};

/// Default canvas size in dots
pub const PLOT_WIDTH: u32 = 120;
pub const PLOT_HEIGHT: u32 = 48;

/// Data range covered by a plot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    fn from_points(points: &[(f64, f64, bool)]) -> Option<Self> {
        let (first_x, first_y, _) = *points.first()?;
        let mut b = Bounds {
            min_x: first_x,
            max_x: first_x,
            min_y: first_y,
            max_y: first_y,
        };
        for &(x, y, _) in points {
            b.min_x = b.min_x.min(x);
            b.max_x = b.max_x.max(x);
            b.min_y = b.min_y.min(y);
            b.max_y = b.max_y.max(y);
        }
        Some(b)
    }

    fn contains_y(&self, y: f64) -> bool {
        y >= self.min_y && y <= self.max_y
    }
}

/// Map a value onto `0..pixels`
fn scale(value: f64, min: f64, max: f64, pixels: u32) -> u32 {
    let span = max - min;
    if span <= 0.0 || pixels < 2 {
        return pixels / 2;
    }
    let last = (pixels - 1) as f64;
    ((value - min) / span * last).round().clamp(0.0, last) as u32
}

/// Horizontal position of every point
///
/// Numeric x values are used as-is. Text values (timestamps) are placed by
/// their rank among the distinct texts, which keeps ISO timestamps in time
/// order.
pub fn x_positions(points: &[ScatterPoint]) -> Vec<Option<f64>> {
    let numeric = points.iter().all(|p| p.x.is_null() || p.x.as_f64().is_some());
    if numeric {
        return points.iter().map(|p| p.x.as_f64()).collect();
    }

    let mut labels: Vec<String> = points
        .iter()
        .filter(|p| !p.x.is_null())
        .map(|p| p.x.to_string())
        .collect();
    labels.sort();
    labels.dedup();

    points
        .iter()
        .map(|p| {
            if p.x.is_null() {
                None
            } else {
                labels
                    .binary_search(&p.x.to_string())
                    .ok()
                    .map(|i| i as f64)
            }
        })
        .collect()
}

/// Render a classified series as a braille scatter plot
///
/// Flagged points are drawn as small crosses so they stand out from the
/// single dots of unflagged ones.
pub fn render_scatter(series: &PlotSeries, width: u32, height: u32) -> String {
    let width = width.max(2);
    let height = height.max(4);

    let points: Vec<(f64, f64, bool)> = x_positions(&series.points)
        .into_iter()
        .zip(&series.points)
        .filter_map(|(x, p)| Some((x?, p.y?, p.tag.is_flagged())))
        .collect();

    let mut output = vec![format!("{}:", series.title)];
    let Some(bounds) = Bounds::from_points(&points) else {
        output.push("  (no points)".to_string());
        return output.join("\n");
    };

    let mut canvas = Canvas::new(width, height);
    let to_canvas = |x: f64, y: f64| {
        let px = scale(x, bounds.min_x, bounds.max_x, width);
        let py = height - 1 - scale(y, bounds.min_y, bounds.max_y, height);
        (px, py)
    };

    for &(x, y, flagged) in &points {
        let (px, py) = to_canvas(x, y);
        canvas.set(px, py);
        if flagged {
            canvas.set(px.saturating_sub(1), py);
            canvas.set((px + 1).min(width - 1), py);
            canvas.set(px, py.saturating_sub(1));
            canvas.set(px, (py + 1).min(height - 1));
        }
    }

    if let Some(fit) = &series.fit {
        draw_fit(&mut canvas, fit, &bounds, width, height);
    }

    for line in canvas.frame().lines() {
        output.push(format!("  {}", line));
    }

    let flagged = points.iter().filter(|p| p.2).count();
    output.push(format!(
        "  {}: {:.4} .. {:.4}   {}: {:.4} .. {:.4}",
        series.x_column, bounds.min_x, bounds.max_x, series.y_column, bounds.min_y, bounds.max_y
    ));
    output.push(format!(
        "  {} point(s), {} flagged (drawn as +)",
        points.len(),
        flagged
    ));
    if let Some(fit) = &series.fit {
        output.push(format!(
            "  fit: y = {:.4}x + {:.4}  (mean slope {:.6})",
            fit.custom_slope, fit.mean_intercept, fit.mean_slope
        ));
    }

    output.join("\n")
}

/// Sample the fit line across the x range; dots outside the y range are dropped
fn draw_fit(canvas: &mut Canvas, fit: &FitLine, bounds: &Bounds, width: u32, height: u32) {
    if fit.points.is_empty() {
        return;
    }
    let span = bounds.max_x - bounds.min_x;
    for px in 0..width {
        let x = if width > 1 {
            bounds.min_x + span * px as f64 / (width - 1) as f64
        } else {
            bounds.min_x
        };
        let y = fit.custom_slope * x + fit.mean_intercept;
        if bounds.contains_y(y) {
            let py = height - 1 - scale(y, bounds.min_y, bounds.max_y, height);
            canvas.set(px, py);
        }
    }
}

/// Render a 1D bar showing an observed range against a valid band
///
/// ```text
///   X  valid 478.500 .. 481.500
///   ──────│════[══════]═══│──────
/// ```
pub fn render_band(label: &str, min: f64, max: f64, low: f64, high: f64) -> String {
    const BAR_WIDTH: u32 = 60;

    let margin = (high - low).abs() * 0.1;
    let view_min = low.min(min) - margin;
    let view_max = high.max(max) + margin;
    let pos = |v: f64| scale(v, view_min, view_max, BAR_WIDTH) as usize;

    let mut bar = vec!['─'; BAR_WIDTH as usize];
    let (lo, hi) = (pos(low), pos(high));
    for cell in bar.iter_mut().take(hi + 1).skip(lo) {
        *cell = '═';
    }
    bar[lo] = '│';
    bar[hi] = '│';
    bar[pos(min)] = '[';
    bar[pos(max)] = ']';

    format!(
        "  {}  valid {:.3} .. {:.3}  observed {:.3} .. {:.3}\n  {}",
        label,
        low,
        high,
        min,
        max,
        bar.into_iter().collect::<String>()
    )
}
