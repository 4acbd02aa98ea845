//! Chart rendering
//!
//! Reports describe charts as plain data ([`LineChart`], [`BarChart`]) and
//! hand them to a [`ChartRenderer`]. Missing values stay `None` all the way
//! down: a line simply has no point there and a stack gets no segment.

use super::ReportError;
use plotters::coord::ranged1d::{AsRangedCoord, Ranged, ValueFormatter};
use plotters::prelude::*;
use std::path::Path;

/// One named line; `values[i]` belongs to `categories[i]`
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub series: Vec<Line>,
    pub log_scale: bool,
}

/// One segment layer of a stack
#[derive(Debug, Clone, PartialEq)]
pub struct BarSegment {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

/// Bars drawn side by side in each category, segments piled bottom-up
#[derive(Debug, Clone, PartialEq)]
pub struct BarStack {
    pub label: String,
    pub segments: Vec<BarSegment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub stacks: Vec<BarStack>,
    pub log_scale: bool,
}

/// Turns chart data into an image file
pub trait ChartRenderer {
    fn render_lines(&self, chart: &LineChart, path: &Path) -> Result<(), ReportError>;

    fn render_bars(&self, chart: &BarChart, path: &Path) -> Result<(), ReportError>;
}

fn chart_error<E: std::fmt::Display>(e: E) -> ReportError {
    ReportError::Chart(e.to_string())
}

/// Axis bounds covering every drawable value
fn value_range(values: impl Iterator<Item = f64>, log_scale: bool) -> (f64, f64) {
    let (mut lo, mut hi) = (f64::MAX, f64::MIN);
    for v in values.filter(|v| v.is_finite() && (!log_scale || *v > 0.0)) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if lo > hi {
        return (if log_scale { 0.1 } else { 0.0 }, 1.0);
    }
    if log_scale {
        (lo / 2.0, hi * 2.0)
    } else {
        (0.0, if hi > 0.0 { hi * 1.1 } else { 1.0 })
    }
}

/// SVG charts through plotters
#[derive(Debug, Clone, Copy)]
pub struct SvgRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 640,
        }
    }
}

impl SvgRenderer {
    fn draw_lines<Y>(
        &self,
        chart: &LineChart,
        path: &Path,
        y_range: Y,
    ) -> Result<(), ReportError>
    where
        Y: AsRangedCoord<Value = f64>,
        Y::CoordDescType: Ranged<ValueType = f64> + ValueFormatter<f64>,
    {
        let root = SVGBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let n = chart.categories.len() as i32;
        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 24))
            .margin(16)
            .x_label_area_size(48)
            .y_label_area_size(64)
            .build_cartesian_2d(-1..n, y_range)
            .map_err(chart_error)?;

        let label_at = |x: &i32| {
            usize::try_from(*x)
                .ok()
                .and_then(|i| chart.categories.get(i).cloned())
                .unwrap_or_default()
        };
        ctx.configure_mesh()
            .x_labels((n + 2) as usize)
            .x_label_formatter(&label_at)
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .draw()
            .map_err(chart_error)?;

        for (i, series) in chart.series.iter().enumerate() {
            let color = Palette99::pick(i).to_rgba();
            let points: Vec<(i32, f64)> = series
                .values
                .iter()
                .copied()
                .enumerate()
                .filter_map(|(x, v)| v.map(|v| (x as i32, v)))
                .filter(|(_, v)| !chart.log_scale || *v > 0.0)
                .collect();

            ctx.draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
                .map_err(chart_error)?
                .label(series.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            ctx.draw_series(points.into_iter().map(|p| Circle::new(p, 3, color.filled())))
                .map_err(chart_error)?;
        }

        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
        Ok(())
    }

    fn draw_bars<Y>(
        &self,
        chart: &BarChart,
        path: &Path,
        floor: f64,
        y_range: Y,
    ) -> Result<(), ReportError>
    where
        Y: AsRangedCoord<Value = f64>,
        Y::CoordDescType: Ranged<ValueType = f64> + ValueFormatter<f64>,
    {
        let root = SVGBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        // Each category gets one slot per stack plus a gap slot
        let slots = chart.stacks.len().max(1) as i32 + 1;
        let n = chart.categories.len() as i32;
        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 24))
            .margin(16)
            .x_label_area_size(48)
            .y_label_area_size(64)
            .build_cartesian_2d(0..(n * slots).max(1), y_range)
            .map_err(chart_error)?;

        let label_at = |x: &i32| {
            if x % slots != 0 {
                return String::new();
            }
            usize::try_from(x / slots)
                .ok()
                .and_then(|i| chart.categories.get(i).cloned())
                .unwrap_or_default()
        };
        ctx.configure_mesh()
            .x_labels((n * slots + 1) as usize)
            .x_label_formatter(&label_at)
            .disable_x_mesh()
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .draw()
            .map_err(chart_error)?;

        let mut color_index = 0usize;
        let mut bases: Vec<Vec<f64>> = vec![vec![0.0; chart.categories.len()]; chart.stacks.len()];
        for (s, stack) in chart.stacks.iter().enumerate() {
            for segment in &stack.segments {
                let color = Palette99::pick(color_index).to_rgba();
                color_index += 1;

                let mut bars = Vec::new();
                for (c, value) in segment.values.iter().copied().enumerate() {
                    let Some(value) = value.filter(|v| *v > 0.0) else {
                        continue;
                    };
                    let Some(base) = bases.get_mut(s).and_then(|b| b.get_mut(c)) else {
                        continue;
                    };
                    let bottom = base.max(floor);
                    let top = *base + value;
                    *base = top;

                    let x = c as i32 * slots + s as i32;
                    let mut bar = Rectangle::new([(x, bottom), (x + 1, top)], color.filled());
                    bar.set_margin(0, 0, 2, 2);
                    bars.push(bar);
                }

                ctx.draw_series(bars)
                    .map_err(chart_error)?
                    .label(format!("{} {}", stack.label, segment.label))
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
            }
        }

        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
        Ok(())
    }
}

/// Highest stacked total per category, for the axis bound
fn stacked_totals(chart: &BarChart) -> Vec<f64> {
    chart
        .stacks
        .iter()
        .flat_map(|stack| {
            (0..chart.categories.len()).map(move |c| {
                stack
                    .segments
                    .iter()
                    .filter_map(|segment| segment.values.get(c).copied().flatten())
                    .filter(|v| *v > 0.0)
                    .sum::<f64>()
            })
        })
        .collect()
}

impl ChartRenderer for SvgRenderer {
    fn render_lines(&self, chart: &LineChart, path: &Path) -> Result<(), ReportError> {
        let values = chart.series.iter().flat_map(|s| s.values.iter().flatten().copied());
        let (lo, hi) = value_range(values, chart.log_scale);
        if chart.log_scale {
            self.draw_lines(chart, path, (lo..hi).log_scale())
        } else {
            self.draw_lines(chart, path, lo..hi)
        }
    }

    fn render_bars(&self, chart: &BarChart, path: &Path) -> Result<(), ReportError> {
        let segments = chart
            .stacks
            .iter()
            .flat_map(|s| s.segments.iter())
            .flat_map(|s| s.values.iter().flatten().copied());
        let (lo, _) = value_range(segments, chart.log_scale);
        let (_, hi) = value_range(stacked_totals(chart).into_iter(), chart.log_scale);

        if chart.log_scale {
            self.draw_bars(chart, path, lo, (lo..hi).log_scale())
        } else {
            self.draw_bars(chart, path, 0.0, lo..hi)
        }
    }
}
