use chrono::{DateTime, Duration, Utc};
use plotters::prelude::*;

use crate::dashboard::ChartView;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ChartError {
    #[error("Not enough price data to draw the chart (minimum 2 points required).")]
    NotEnoughData,
    #[error("Failed to render chart: {0}")]
    Render(String),
}

fn render_error<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Render(e.to_string())
}

/// Draws every line of `chart` into an SVG document.
pub fn render_svg(chart: &ChartView, width: u32, height: u32) -> Result<String, ChartError> {
    let points = || chart.lines.iter().flat_map(|line| line.points.iter());

    if points().count() < 2 {
        return Err(ChartError::NotEnoughData);
    }

    let x_min = points().map(|p| p.0).min().ok_or(ChartError::NotEnoughData)?;
    let mut x_max = points().map(|p| p.0).max().ok_or(ChartError::NotEnoughData)?;
    if x_max <= x_min {
        x_max = x_min + Duration::hours(1);
    }

    let min_price = points().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_price = points().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    let spread = (max_price - min_price).max(max_price.abs() * 0.01).max(1e-8);
    let padding = spread * 0.1;
    let y_min = (min_price - padding).max(0.0);
    let y_max = max_price + padding;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 22.0).into_font())
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(render_error)?;

        ctx.configure_mesh()
            .x_desc("Date")
            .y_desc("Price (EUR)")
            .x_label_formatter(&|date: &DateTime<Utc>| date.format("%b %d").to_string())
            .draw()
            .map_err(render_error)?;

        for line in &chart.lines {
            let (r, g, b) = line.color;
            let points = line.points.iter().copied();
            let style = if line.dashed {
                RGBColor(r, g, b).stroke_width(2)
            } else {
                RGBColor(r, g, b).stroke_width(3)
            };

            let anno = if line.dashed {
                ctx.draw_series(DashedLineSeries::new(points, 6, 4, style))
            } else {
                ctx.draw_series(LineSeries::new(points, style))
            }
            .map_err(render_error)?;

            anno.label(line.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }

        ctx.configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(render_error)?;

        root.present().map_err(render_error)?;
    }

    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{ChartLine, GREEN, ORANGE};

    fn line(points: usize, dashed: bool) -> ChartLine {
        let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        ChartLine {
            label: "Bitcoin Price".to_string(),
            color: if dashed { ORANGE } else { GREEN },
            dashed,
            points: (0..points)
                .map(|i| (start + Duration::hours(i as i64), 100.0 + i as f64))
                .collect(),
        }
    }

    fn chart(lines: Vec<ChartLine>) -> ChartView {
        ChartView {
            title: "Bitcoin Price History (Last 30 Days)".to_string(),
            lines,
        }
    }

    #[test]
    fn render_svg_pass_document() {
        let svg = render_svg(&chart(vec![line(24, false), line(10, true)]), 800, 400).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn render_svg_pass_single_timestamp() {
        let svg = render_svg(&chart(vec![line(1, false), line(1, false)]), 800, 400).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn render_svg_fail_not_enough_data() {
        let result = render_svg(&chart(vec![line(1, false)]), 800, 400);
        assert_eq!(result, Err(ChartError::NotEnoughData));
    }

    #[test]
    fn render_svg_fail_no_lines() {
        let result = render_svg(&chart(vec![]), 800, 400);
        assert_eq!(result, Err(ChartError::NotEnoughData));
    }
}
