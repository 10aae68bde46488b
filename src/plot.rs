//! Length-per-accession line plot, laid out as SVG and rasterised to PNG.

use std::path::Path;
use std::sync::Arc;

use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg;

use crate::error::KiraError;
use crate::report::ResultTable;

pub const WIDTH: u32 = 1000;
pub const HEIGHT: u32 = 400;

const TICK_FONT: f64 = 8.0;
const LABEL_FONT: f64 = 12.0;
const CHAR_WIDTH: f64 = 0.6;
const TICK_LEN: f64 = 4.0;
const MARKER_RADIUS: f64 = 3.0;
const SERIES_COLOR: &str = "#1f77b4";
const Y_TICK_TARGET: usize = 6;

/// Sorts `table` by length (descending, in place) and saves the plot to `path`.
pub fn plot(table: &mut ResultTable, path: &Path) -> Result<(), KiraError> {
    table.sort_by_length_desc();
    let svg = render_svg(table);
    rasterize(&svg, path)?;
    tracing::debug!(points = table.len(), path = %path.display(), "wrote plot");
    Ok(())
}

struct SvgTag {
    name: &'static str,
    attributes: Vec<(&'static str, String)>,
}

impl SvgTag {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            attributes: Vec::new(),
        }
    }

    fn attr(mut self, key: &'static str, value: impl ToString) -> Self {
        self.attributes.push((key, value.to_string()));
        self
    }

    fn open_tag(&self, self_closing: bool) -> String {
        let attrs = self
            .attributes
            .iter()
            .map(|(k, v)| format!("{k}=\"{}\"", escape_xml(v)))
            .collect::<Vec<_>>()
            .join(" ");
        if self_closing {
            format!("<{} {attrs}/>", self.name)
        } else {
            format!("<{} {attrs}>", self.name)
        }
    }

    fn empty(&self) -> String {
        self.open_tag(true)
    }

    fn with_text(&self, text: &str) -> String {
        format!("{}{}</{}>", self.open_tag(false), escape_xml(text), self.name)
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('\'', "&apos;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[derive(Debug, Clone, Copy)]
struct PlotArea {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
}

impl PlotArea {
    fn width(&self) -> f64 {
        self.right - self.left
    }

    fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Lays out the current row order of `table` as one line-and-marker series.
pub fn render_svg(table: &ResultTable) -> String {
    let lengths: Vec<f64> = table.rows().iter().map(|row| row.length as f64).collect();
    let ticks = y_ticks(&lengths);
    let decimals = tick_decimals(&ticks);
    let tick_labels: Vec<String> = ticks
        .iter()
        .map(|value| format!("{value:.decimals$}"))
        .collect();

    let area = layout(table, &tick_labels);
    let y_min = ticks.first().copied().unwrap_or(0.0);
    let y_max = ticks.last().copied().unwrap_or(1.0);
    let y_span = (y_max - y_min).max(f64::EPSILON);
    let y_pos = |value: f64| area.bottom - (value - y_min) / y_span * area.height();

    let mut svg = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n");
    svg.push_str(
        &SvgTag::new("svg")
            .attr("xmlns", "http://www.w3.org/2000/svg")
            .attr("width", WIDTH)
            .attr("height", HEIGHT)
            .attr("viewBox", format!("0 0 {WIDTH} {HEIGHT}"))
            .open_tag(false),
    );
    svg.push('\n');
    svg.push_str(
        &SvgTag::new("rect")
            .attr("width", WIDTH)
            .attr("height", HEIGHT)
            .attr("fill", "#ffffff")
            .empty(),
    );
    svg.push('\n');

    for (value, label) in ticks.iter().zip(&tick_labels) {
        let y = y_pos(*value);
        svg.push_str(
            &SvgTag::new("line")
                .attr("x1", fmt_coord(area.left - TICK_LEN))
                .attr("y1", fmt_coord(y))
                .attr("x2", fmt_coord(area.left))
                .attr("y2", fmt_coord(y))
                .attr("stroke", "#000000")
                .attr("stroke-width", 1)
                .empty(),
        );
        svg.push('\n');
        svg.push_str(
            &SvgTag::new("text")
                .attr("x", fmt_coord(area.left - TICK_LEN - 2.0))
                .attr("y", fmt_coord(y + TICK_FONT * 0.35))
                .attr("font-family", "sans-serif")
                .attr("font-size", TICK_FONT)
                .attr("text-anchor", "end")
                .with_text(label),
        );
        svg.push('\n');
    }

    let points: Vec<(f64, f64)> = table
        .rows()
        .iter()
        .enumerate()
        .map(|(idx, row)| (x_position(idx, table.len(), &area), y_pos(row.length as f64)))
        .collect();

    for ((x, _), row) in points.iter().zip(table.rows()) {
        svg.push_str(
            &SvgTag::new("line")
                .attr("x1", fmt_coord(*x))
                .attr("y1", fmt_coord(area.bottom))
                .attr("x2", fmt_coord(*x))
                .attr("y2", fmt_coord(area.bottom + TICK_LEN))
                .attr("stroke", "#000000")
                .attr("stroke-width", 1)
                .empty(),
        );
        svg.push('\n');
        let label_y = area.bottom + TICK_LEN + 2.0;
        let label_x = x + TICK_FONT * 0.35;
        svg.push_str(
            &SvgTag::new("text")
                .attr("x", fmt_coord(label_x))
                .attr("y", fmt_coord(label_y))
                .attr("font-family", "sans-serif")
                .attr("font-size", TICK_FONT)
                .attr("text-anchor", "end")
                .attr(
                    "transform",
                    format!("rotate(-90 {} {})", fmt_coord(label_x), fmt_coord(label_y)),
                )
                .with_text(&row.accession),
        );
        svg.push('\n');
    }

    if points.len() > 1 {
        let polyline = points
            .iter()
            .map(|(x, y)| format!("{},{}", fmt_coord(*x), fmt_coord(*y)))
            .collect::<Vec<_>>()
            .join(" ");
        svg.push_str(
            &SvgTag::new("polyline")
                .attr("points", polyline)
                .attr("fill", "none")
                .attr("stroke", SERIES_COLOR)
                .attr("stroke-width", 1.5)
                .empty(),
        );
        svg.push('\n');
    }
    for (x, y) in &points {
        svg.push_str(
            &SvgTag::new("circle")
                .attr("cx", fmt_coord(*x))
                .attr("cy", fmt_coord(*y))
                .attr("r", MARKER_RADIUS)
                .attr("fill", SERIES_COLOR)
                .empty(),
        );
        svg.push('\n');
    }

    svg.push_str(
        &SvgTag::new("rect")
            .attr("x", fmt_coord(area.left))
            .attr("y", fmt_coord(area.top))
            .attr("width", fmt_coord(area.width()))
            .attr("height", fmt_coord(area.height()))
            .attr("fill", "none")
            .attr("stroke", "#000000")
            .attr("stroke-width", 1)
            .empty(),
    );
    svg.push('\n');

    let label_x = LABEL_FONT + 2.0;
    let label_y = area.top + area.height() / 2.0;
    svg.push_str(
        &SvgTag::new("text")
            .attr("x", fmt_coord(label_x))
            .attr("y", fmt_coord(label_y))
            .attr("font-family", "sans-serif")
            .attr("font-size", LABEL_FONT)
            .attr("text-anchor", "middle")
            .attr(
                "transform",
                format!("rotate(-90 {} {})", fmt_coord(label_x), fmt_coord(label_y)),
            )
            .with_text("Length"),
    );
    svg.push_str("\n</svg>\n");
    svg
}

// Margins shrink to fit the longest labels, like a tight layout.
fn layout(table: &ResultTable, tick_labels: &[String]) -> PlotArea {
    let widest_tick = tick_labels.iter().map(|l| l.chars().count()).max().unwrap_or(1);
    let widest_accession = table
        .rows()
        .iter()
        .map(|row| row.accession.chars().count())
        .max()
        .unwrap_or(0);

    let left = LABEL_FONT + 8.0 + widest_tick as f64 * TICK_FONT * CHAR_WIDTH + TICK_LEN + 6.0;
    let bottom_margin = (TICK_LEN + 6.0 + widest_accession as f64 * TICK_FONT * CHAR_WIDTH)
        .min(HEIGHT as f64 / 2.0);
    PlotArea {
        left,
        right: WIDTH as f64 - 10.0,
        top: 10.0,
        bottom: HEIGHT as f64 - bottom_margin,
    }
}

// Categories sit on evenly spaced slots with a 5% inset on each side.
fn x_position(idx: usize, count: usize, area: &PlotArea) -> f64 {
    if count <= 1 {
        return area.left + area.width() / 2.0;
    }
    let inset = area.width() * 0.05;
    let step = (area.width() - 2.0 * inset) / (count - 1) as f64;
    area.left + inset + idx as f64 * step
}

fn y_ticks(values: &[f64]) -> Vec<f64> {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if !lo.is_finite() || !hi.is_finite() {
        (0.0, 1.0)
    } else if lo == hi {
        (lo - 1.0, hi + 1.0)
    } else {
        (lo, hi)
    };
    nice_ticks(lo, hi, Y_TICK_TARGET)
}

/// Evenly spaced 1/2/5×10ⁿ ticks covering `[lo, hi]`; needs `hi > lo`.
pub fn nice_ticks(lo: f64, hi: f64, target: usize) -> Vec<f64> {
    let span = nice_number(hi - lo, false);
    let step = nice_number(span / (target.max(2) - 1) as f64, true);
    let start = (lo / step).floor() * step;
    let end = (hi / step).ceil() * step;
    let count = ((end - start) / step).round() as usize;
    (0..=count).map(|i| start + i as f64 * step).collect()
}

fn nice_number(value: f64, round: bool) -> f64 {
    let exponent = value.log10().floor();
    let magnitude = 10f64.powf(exponent);
    let fraction = value / magnitude;
    let nice = if round {
        if fraction < 1.5 {
            1.0
        } else if fraction < 3.0 {
            2.0
        } else if fraction < 7.0 {
            5.0
        } else {
            10.0
        }
    } else if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn tick_decimals(ticks: &[f64]) -> usize {
    match ticks {
        [first, second, ..] => {
            let step = (second - first).abs();
            if step >= 1.0 {
                0
            } else {
                (-step.log10().floor()).max(0.0) as usize
            }
        }
        _ => 0,
    }
}

fn fmt_coord(value: f64) -> String {
    format!("{value:.2}")
}

// Text elements render as nothing without a font, so the plot loses its labels.
fn has_fonts(fontdb: &usvg::fontdb::Database) -> bool {
    if fontdb.is_empty() {
        tracing::warn!("no system fonts found, plot labels will be missing");
        return false;
    }
    true
}

fn rasterize(svg: &str, path: &Path) -> Result<(), KiraError> {
    let mut fontdb = usvg::fontdb::Database::new();
    fontdb.load_system_fonts();
    has_fonts(&fontdb);
    let mut options = usvg::Options::default();
    options.fontdb = Arc::new(fontdb);

    let tree =
        usvg::Tree::from_str(svg, &options).map_err(|err| KiraError::PlotRender(err.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = Pixmap::new(size.width(), size.height())
        .ok_or_else(|| KiraError::PlotRender("invalid canvas size".to_string()))?;
    pixmap.fill(Color::WHITE);
    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());

    let (width, height) = (pixmap.width(), pixmap.height());
    let image = image::RgbaImage::from_raw(width, height, pixmap.take())
        .ok_or_else(|| KiraError::PlotRender("pixel buffer size mismatch".to_string()))?;
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|err| KiraError::Filesystem(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SequenceRecord;

    fn table(rows: &[(&str, usize)]) -> ResultTable {
        let records: Vec<SequenceRecord> = rows
            .iter()
            .map(|(accession, length)| SequenceRecord {
                accession: accession.to_string(),
                length: *length,
                description: String::new(),
            })
            .collect();
        ResultTable::from_records(&records)
    }

    #[test]
    fn ticks_cover_range() {
        let ticks = nice_ticks(100.0, 200.0, 6);
        assert_eq!(ticks, vec![100.0, 120.0, 140.0, 160.0, 180.0, 200.0]);

        let ticks = nice_ticks(103.0, 197.0, 6);
        assert!(ticks[0] <= 103.0);
        assert!(*ticks.last().unwrap() >= 197.0);
    }

    #[test]
    fn labels_follow_table_order() {
        let svg = render_svg(&table(&[("LONG.1", 300), ("MID.1", 200), ("SHORT.1", 100)]));
        let long = svg.find(">LONG.1<").unwrap();
        let mid = svg.find(">MID.1<").unwrap();
        let short = svg.find(">SHORT.1<").unwrap();
        assert!(long < mid && mid < short);
        assert!(svg.contains("rotate(-90"));
        assert_eq!(svg.matches("<circle").count(), 3);
    }

    #[test]
    fn empty_font_database_is_reported() {
        assert!(!has_fonts(&usvg::fontdb::Database::new()));
    }

    #[test]
    fn single_point_has_marker_only() {
        let svg = render_svg(&table(&[("ONLY.1", 150)]));
        assert!(!svg.contains("<polyline"));
        assert_eq!(svg.matches("<circle").count(), 1);
    }

    #[test]
    fn accessions_are_escaped() {
        let svg = render_svg(&table(&[("A<B>&C", 10)]));
        assert!(svg.contains("A&lt;B&gt;&amp;C"));
    }

    #[test]
    fn plot_sorts_and_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.png");
        let mut data = table(&[("A.1", 120), ("B.1", 180), ("C.1", 150)]);
        plot(&mut data, &path).unwrap();

        let order: Vec<&str> = data.rows().iter().map(|r| r.accession.as_str()).collect();
        assert_eq!(order, vec!["B.1", "C.1", "A.1"]);
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }
}
