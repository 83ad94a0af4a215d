//! SVG documents for scan results.
//!
//! * [`heatmap_document`]: the position × mutant matrix, blue-white-red
//!   between the smallest and largest score, with a colour bar.
//! * [`boxplot_document`]: one horizontal box per position.
//! * [`density_document`]: a density histogram of a score list with a
//!   dashed, labeled marker at every mutation.
use crate::style::{bwr, PlotStyle};
use itertools::{Itertools, MinMaxResult};
use mutscan_core::{ScoreMatrix, AMINO_ACIDS};
use svg::node::element::{Circle, Line, Rectangle, Text};
use svg::Document;

// Statistics ---------------------------------------------------------------------------------

/// Range of the finite values. A single distinct value is widened by 0.5
/// on each side.
pub fn score_range(values: impl IntoIterator<Item = f32>) -> Option<(f64, f64)> {
    match values.into_iter().filter(|v| v.is_finite()).minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v as f64 - 0.5, v as f64 + 0.5)),
        MinMaxResult::MinMax(lo, hi) if lo == hi => Some((lo as f64 - 0.5, hi as f64 + 0.5)),
        MinMaxResult::MinMax(lo, hi) => Some((lo as f64, hi as f64)),
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Tukey box: quartiles, whiskers at the last values within 1.5 IQR.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    pub fn from_values(values: &[f32]) -> Option<Self> {
        let sorted: Vec<f64> = values
            .iter()
            .filter(|v| v.is_finite())
            .map(|v| *v as f64)
            .sorted_by(|a, b| a.total_cmp(b))
            .collect();
        if sorted.is_empty() {
            return None;
        }
        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let (low_fence, high_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);
        let inside = |v: &&f64| **v >= low_fence && **v <= high_fence;
        let whisker_low = sorted.iter().find(inside).copied().unwrap_or(q1);
        let whisker_high = sorted.iter().rev().find(inside).copied().unwrap_or(q3);
        let outliers = sorted
            .iter()
            .filter(|v| !inside(v))
            .copied()
            .collect();
        Some(Self {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }
}

/// Equal-width histogram normalised to unit area.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub start: f64,
    pub bin_width: f64,
    pub densities: Vec<f64>,
}

impl Histogram {
    pub fn new(values: &[f32], bins: usize) -> Option<Self> {
        let (lo, hi) = score_range(values.iter().copied())?;
        let bins = bins.max(1);
        let bin_width = (hi - lo) / bins as f64;
        let mut counts = vec![0usize; bins];
        let mut total = 0usize;
        for v in values.iter().filter(|v| v.is_finite()) {
            let idx = ((*v as f64 - lo) / bin_width).floor() as usize;
            counts[idx.min(bins - 1)] += 1;
            total += 1;
        }
        let densities = counts
            .into_iter()
            .map(|c| c as f64 / (total as f64 * bin_width))
            .collect();
        Some(Self {
            start: lo,
            bin_width,
            densities,
        })
    }

    pub fn end(&self) -> f64 {
        self.start + self.bin_width * self.densities.len() as f64
    }
}

// Helpers ------------------------------------------------------------------------------------

fn text(x: f64, y: f64, content: &str, anchor: &str) -> Text {
    Text::new(content)
        .set("x", x)
        .set("y", y)
        .set("text-anchor", anchor)
        .set("dominant-baseline", "middle")
}

fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Line {
    Line::new()
        .set("x1", x1)
        .set("y1", y1)
        .set("x2", x2)
        .set("y2", y2)
        .set("stroke", "black")
        .set("stroke-width", 1)
}

fn rect(x: f64, y: f64, width: f64, height: f64, fill: &str) -> Rectangle {
    Rectangle::new()
        .set("x", x)
        .set("y", y)
        .set("width", width)
        .set("height", height)
        .set("fill", fill)
}

fn document(width: f64, height: f64, style: &PlotStyle) -> Document {
    Document::new()
        .set("width", width)
        .set("height", height)
        .set("viewBox", (0.0, 0.0, width, height))
        .set("font-family", style.font_family.as_str())
        .set("font-size", style.font_size)
}

/// Linear map of `[lo, hi]` onto `[start, start + length]`.
fn scale(lo: f64, hi: f64, start: f64, length: f64) -> impl Fn(f64) -> f64 {
    move |v| start + (v - lo) / (hi - lo) * length
}

/// Labeled ticks along a horizontal axis at `y`.
fn x_axis(
    doc: Document,
    lo: f64,
    hi: f64,
    x0: f64,
    width: f64,
    y: f64,
    style: &PlotStyle,
) -> Document {
    let x = scale(lo, hi, x0, width);
    let ticks = 5;
    let doc = doc.add(line(x0, y, x0 + width, y));
    (0..=ticks).fold(doc, |doc, i| {
        let v = lo + (hi - lo) * i as f64 / ticks as f64;
        doc.add(line(x(v), y, x(v), y + 4.0)).add(text(
            x(v),
            y + 4.0 + style.font_size,
            &format!("{:.2}", v),
            "middle",
        ))
    })
}

// Documents ----------------------------------------------------------------------------------

pub fn heatmap_document(matrix: &ScoreMatrix, style: &PlotStyle) -> Document {
    let cell = style.cell_size;
    let m = style.margin;
    let font = style.font_size;
    let (lo, hi) = score_range(matrix.rows().iter().flatten().copied()).unwrap_or((0.0, 1.0));
    let colour = |v: f32| bwr((v as f64 - lo) / (hi - lo));

    let grid_w = AMINO_ACIDS.len() as f64 * cell;
    let grid_h = matrix.n_positions() as f64 * cell;
    let bar_y = m + grid_h + cell;
    let bar_h = cell * 0.6;
    let width = 2.0 * m + grid_w;
    let height = bar_y + bar_h + 2.0 * font + m / 2.0;

    let doc = document(width, height, style)
        .add(text(m + grid_w / 2.0, m - 2.0 * font, "Mutant", "middle"))
        .add(
            text(m / 4.0, m + grid_h / 2.0, "Wild type", "middle")
                .set("transform", format!("rotate(-90 {} {})", m / 4.0, m + grid_h / 2.0)),
        );
    let doc = AMINO_ACIDS.chars().enumerate().fold(doc, |doc, (j, aa)| {
        doc.add(text(m + (j as f64 + 0.5) * cell, m - font / 2.0, &aa.to_string(), "middle"))
    });
    let doc = matrix
        .positions()
        .iter()
        .zip(matrix.rows())
        .enumerate()
        .fold(doc, |doc, (i, (label, row))| {
            let y = m + i as f64 * cell;
            let doc = doc.add(text(m - 4.0, y + cell / 2.0, label, "end"));
            row.iter().enumerate().fold(doc, |doc, (j, v)| {
                doc.add(rect(m + j as f64 * cell, y, cell, cell, &colour(*v)))
            })
        });

    // colour bar
    let steps = 100;
    let step_w = grid_w / steps as f64;
    let doc = (0..steps).fold(doc, |doc, i| {
        let t = (i as f64 + 0.5) / steps as f64;
        doc.add(rect(m + i as f64 * step_w, bar_y, step_w, bar_h, &bwr(t)))
    });
    doc.add(text(m, bar_y + bar_h + font, &format!("{:.2}", lo), "start"))
        .add(text(m + grid_w, bar_y + bar_h + font, &format!("{:.2}", hi), "end"))
}

pub fn boxplot_document(matrix: &ScoreMatrix, style: &PlotStyle) -> Document {
    let cell = style.cell_size;
    let m = style.margin;
    let plot_w = style.plot_width;
    let plot_h = matrix.n_positions() as f64 * cell;
    let (lo, hi) = score_range(matrix.rows().iter().flatten().copied()).unwrap_or((0.0, 1.0));
    let x = scale(lo, hi, m, plot_w);

    let width = 2.0 * m + plot_w;
    let height = 2.0 * m + plot_h + 2.0 * style.font_size;
    let doc = document(width, height, style);
    let doc = matrix
        .positions()
        .iter()
        .zip(matrix.rows())
        .enumerate()
        .fold(doc, |doc, (i, (label, row))| {
            let cy = m + (i as f64 + 0.5) * cell;
            let doc = doc.add(text(m - 4.0, cy, label, "end"));
            let Some(stats) = BoxStats::from_values(row) else {
                return doc;
            };
            let half = cell * 0.3;
            let (low, high) = (x(stats.whisker_low), x(stats.whisker_high));
            let (q1, q3, median) = (x(stats.q1), x(stats.q3), x(stats.median));
            let doc = doc
                .add(line(low, cy, q1, cy))
                .add(line(q3, cy, high, cy))
                .add(line(low, cy - half / 2.0, low, cy + half / 2.0))
                .add(line(high, cy - half / 2.0, high, cy + half / 2.0))
                .add(rect(q1, cy - half, q3 - q1, 2.0 * half, "none").set("stroke", "black"))
                .add(line(median, cy - half, median, cy + half).set("stroke", "green"));
            stats.outliers.iter().fold(doc, |doc, v| {
                doc.add(
                    Circle::new()
                        .set("cx", x(*v))
                        .set("cy", cy)
                        .set("r", 2)
                        .set("fill", "none")
                        .set("stroke", "black"),
                )
            })
        });
    x_axis(doc, lo, hi, m, plot_w, m + plot_h, style)
}

pub fn density_document(labels: &[String], scores: &[f32], style: &PlotStyle) -> Document {
    let m = style.margin;
    let (plot_w, plot_h) = (style.plot_width, style.plot_height);
    let width = 2.0 * m + plot_w;
    let height = 2.0 * m + plot_h + 2.0 * style.font_size;
    let bottom = m + plot_h;

    let doc = document(width, height, style)
        .add(text(m + plot_w / 2.0, m / 2.0, "Score density", "middle"))
        .add(text(m + plot_w / 2.0, height - style.font_size, "Scores", "middle"))
        .add(
            text(m / 4.0, m + plot_h / 2.0, "Density", "middle")
                .set("transform", format!("rotate(-90 {} {})", m / 4.0, m + plot_h / 2.0)),
        );
    let Some(histogram) = Histogram::new(scores, style.bins) else {
        return doc;
    };
    let (lo, hi) = (histogram.start, histogram.end());
    let x = scale(lo, hi, m, plot_w);
    let peak = histogram.densities.iter().cloned().fold(0.0, f64::max);
    let y = |d: f64| bottom - if peak > 0.0 { d / peak * plot_h } else { 0.0 };

    let doc = histogram.densities.iter().enumerate().fold(doc, |doc, (i, d)| {
        let x0 = x(lo + i as f64 * histogram.bin_width);
        let x1 = x(lo + (i + 1) as f64 * histogram.bin_width);
        doc.add(
            rect(x0, y(*d), x1 - x0, bottom - y(*d), style.bar_colour.as_str())
                .set("fill-opacity", 0.5),
        )
    });
    let doc = labels
        .iter()
        .zip(scores)
        .filter(|(_, v)| v.is_finite())
        .fold(doc, |doc, (label, v)| {
            let xv = x(*v as f64);
            doc.add(
                line(xv, m, xv, bottom)
                    .set("stroke", style.marker_colour.as_str())
                    .set("stroke-dasharray", "4 3")
                    .set("stroke-opacity", 0.5),
            )
            .add(
                text(xv - 2.0, bottom - 4.0, label, "start")
                    .set("transform", format!("rotate(-90 {} {})", xv - 2.0, bottom - 4.0)),
            )
        });
    x_axis(doc, lo, hi, m, plot_w, bottom, style)
}
