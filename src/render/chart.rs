//! Per-batch sensor-difference charts.
//!
//! Two stacked panels — pH over temperature — with independent y-axes and a
//! shared time axis, rendered directly as SVG. An empty series still
//! produces a chart with empty panels, mirroring the empty-result-is-valid
//! rule of the reporting core.

use crate::report::CombinedDiffPoint;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;

const WIDTH: f64 = 1300.0;
const HEIGHT: f64 = 900.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 40.0;
const MARGIN_TOP: f64 = 70.0;
const MARGIN_BOTTOM: f64 = 70.0;
const PANEL_GAP: f64 = 80.0;

/// File name of one batch's chart.
pub fn chart_file_name(batch_id: &str) -> String {
    format!("{batch_id}_sensor_diff.svg")
}

/// Render the combined difference series for one batch and write it to
/// `path`.
pub fn write_diff_chart(batch_id: &str, points: &[CombinedDiffPoint], path: &Path) -> Result<()> {
    let svg = render_svg(batch_id, points);
    std::fs::write(path, svg)
        .with_context(|| format!("failed to write chart {}", path.display()))?;
    Ok(())
}

fn render_svg(batch_id: &str, points: &[CombinedDiffPoint]) -> String {
    let panel_height = (HEIGHT - MARGIN_TOP - MARGIN_BOTTOM - PANEL_GAP) / 2.0;
    let xs: Vec<i64> = points.iter().map(|p| p.date.timestamp()).collect();
    let ph: Vec<f64> = points.iter().map(|p| p.ph_difference).collect();
    let temp: Vec<f64> = points.iter().map(|p| p.temp_difference).collect();

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" \
         viewBox=\"0 0 {WIDTH} {HEIGHT}\" font-family=\"sans-serif\">\n"
    ));
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"34\" text-anchor=\"middle\" font-size=\"22\">\
         Sensor difference for batch {}</text>\n",
        WIDTH / 2.0,
        xml_escape(batch_id)
    ));

    draw_panel(&mut svg, "PH", "PH2 - PH1", &xs, &ph, MARGIN_TOP, panel_height);
    draw_panel(
        &mut svg,
        "Temperature",
        "Temp2 - Temp1",
        &xs,
        &temp,
        MARGIN_TOP + panel_height + PANEL_GAP,
        panel_height,
    );

    svg.push_str("</svg>\n");
    svg
}

fn draw_panel(
    svg: &mut String,
    title: &str,
    y_label: &str,
    xs: &[i64],
    ys: &[f64],
    top: f64,
    height: f64,
) {
    let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let bottom = top + height;

    svg.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"17\">{}</text>\n",
        MARGIN_LEFT + plot_width / 2.0,
        top - 12.0,
        xml_escape(title)
    ));
    svg.push_str(&format!(
        "<rect x=\"{MARGIN_LEFT}\" y=\"{top}\" width=\"{plot_width}\" height=\"{height}\" \
         fill=\"none\" stroke=\"#cccccc\"/>\n"
    ));
    // Rotated family label on the y axis.
    svg.push_str(&format!(
        "<text x=\"{x}\" y=\"{y}\" text-anchor=\"middle\" font-size=\"14\" \
         transform=\"rotate(-90 {x} {y})\">{label}</text>\n",
        x = MARGIN_LEFT - 64.0,
        y = top + height / 2.0,
        label = xml_escape(y_label)
    ));
    svg.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"14\">Datetime</text>\n",
        MARGIN_LEFT + plot_width / 2.0,
        bottom + 40.0
    ));

    if xs.is_empty() {
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"14\" \
             fill=\"#888888\">no data</text>\n",
            MARGIN_LEFT + plot_width / 2.0,
            top + height / 2.0
        ));
        return;
    }

    let x_min = *xs.first().unwrap_or(&0);
    let x_max = *xs.last().unwrap_or(&0);
    let x_span = (x_max - x_min).max(1) as f64;

    let y_min = ys.iter().cloned().fold(f64::INFINITY, f64::min);
    let y_max = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let y_pad = if (y_max - y_min).abs() < f64::EPSILON {
        0.5
    } else {
        (y_max - y_min) * 0.05
    };
    let (y_lo, y_hi) = (y_min - y_pad, y_max + y_pad);
    let y_span = y_hi - y_lo;

    let to_x = |ts: i64| MARGIN_LEFT + (ts - x_min) as f64 / x_span * plot_width;
    let to_y = |v: f64| bottom - (v - y_lo) / y_span * height;

    // Y-axis ticks: low, mid, high.
    for value in [y_lo, (y_lo + y_hi) / 2.0, y_hi] {
        let y = to_y(value);
        svg.push_str(&format!(
            "<line x1=\"{MARGIN_LEFT}\" y1=\"{y}\" x2=\"{}\" y2=\"{y}\" \
             stroke=\"#eeeeee\"/>\n",
            MARGIN_LEFT + plot_width
        ));
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"12\">{value:.3}</text>\n",
            MARGIN_LEFT - 8.0,
            y + 4.0
        ));
    }

    // X-axis ticks: first and last timestamp.
    for (ts, anchor) in [(x_min, "start"), (x_max, "end")] {
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"{anchor}\" font-size=\"12\">{}</text>\n",
            to_x(ts),
            bottom + 20.0,
            fmt_tick(ts)
        ));
    }

    let polyline: Vec<String> = xs
        .iter()
        .zip(ys)
        .map(|(&ts, &v)| format!("{:.1},{:.1}", to_x(ts), to_y(v)))
        .collect();
    svg.push_str(&format!(
        "<polyline fill=\"none\" stroke=\"#1f77b4\" stroke-width=\"1.5\" points=\"{}\"/>\n",
        polyline.join(" ")
    ));
}

fn fmt_tick(epoch: i64) -> String {
    DateTime::<Utc>::from_timestamp(epoch, 0)
        .unwrap_or_else(Utc::now)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

fn xml_escape(raw: &str) -> String {
    raw.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
