//! Inline SVG charts for the dashboard and analytics pages.

use crate::domain::emotion::EmotionClass;
use crate::domain::emotion_score::EmotionBucket;
use crate::domain::journal_stats::PnlPoint;

const WIDTH: f64 = 520.0;
const HEIGHT: f64 = 220.0;
const PADDING: f64 = 40.0;

/// Cumulative P&L line chart.
pub fn pnl_curve_svg(curve: &[PnlPoint]) -> String {
    if curve.is_empty() {
        return empty_chart("No trades in range");
    }

    let min_pnl = curve
        .iter()
        .map(|p| p.cumulative_pnl)
        .fold(f64::INFINITY, f64::min)
        .min(0.0);
    let max_pnl = curve
        .iter()
        .map(|p| p.cumulative_pnl)
        .fold(f64::NEG_INFINITY, f64::max)
        .max(0.0);

    let plot_width = WIDTH - 2.0 * PADDING;
    let plot_height = HEIGHT - 2.0 * PADDING;

    let range = max_pnl - min_pnl;
    let scale_y = if range > 0.0 { plot_height / range } else { 1.0 };
    let scale_x = if curve.len() > 1 {
        plot_width / (curve.len() - 1) as f64
    } else {
        0.0
    };

    let points: Vec<String> = curve
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let x = PADDING + i as f64 * scale_x;
            let y = HEIGHT - PADDING - (point.cumulative_pnl - min_pnl) * scale_y;
            format!("{x:.1},{y:.1}")
        })
        .collect();

    let zero_y = HEIGHT - PADDING - (0.0 - min_pnl) * scale_y;

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {WIDTH:.0} {HEIGHT:.0}" width="{WIDTH:.0}" height="{HEIGHT:.0}" role="img" aria-label="Cumulative profit and loss">
  <rect width="{WIDTH:.0}" height="{HEIGHT:.0}" fill="white"/>
  <line x1="{PADDING:.0}" y1="{PADDING:.0}" x2="{PADDING:.0}" y2="{bottom:.0}" stroke="#4a5568" stroke-width="1"/>
  <line x1="{PADDING:.0}" y1="{bottom:.0}" x2="{right:.0}" y2="{bottom:.0}" stroke="#4a5568" stroke-width="1"/>
  <line x1="{PADDING:.0}" y1="{zero_y:.1}" x2="{right:.0}" y2="{zero_y:.1}" stroke="#cbd5e0" stroke-width="1" stroke-dasharray="4 3"/>
  <polyline fill="none" stroke="#3182ce" stroke-width="2" points="{points}"/>
</svg>"##,
        bottom = HEIGHT - PADDING,
        right = WIDTH - PADDING,
        points = points.join(" "),
    )
}

/// Horizontal bar chart of the emotion distribution, colored by class.
pub fn emotion_distribution_svg(distribution: &[EmotionBucket]) -> String {
    if distribution.is_empty() {
        return empty_chart("No emotion tags recorded");
    }

    let bar_height = 18.0;
    let gap = 8.0;
    let label_width = 110.0;
    let chart_height = PADDING + distribution.len() as f64 * (bar_height + gap) + PADDING / 2.0;
    let max_bar = WIDTH - label_width - PADDING - 60.0;

    let mut bars = String::new();
    for (i, bucket) in distribution.iter().enumerate() {
        let y = PADDING + i as f64 * (bar_height + gap);
        let w = (bucket.share_pct / 100.0 * max_bar).max(1.0);
        let fill = match bucket.known.map(|t| t.class()) {
            Some(EmotionClass::Positive) => "#2f855a",
            Some(EmotionClass::Negative) => "#c53030",
            Some(EmotionClass::Neutral) => "#718096",
            None => "#cbd5e0",
        };
        bars.push_str(&format!(
            r##"  <text x="{label_x:.0}" y="{text_y:.1}" text-anchor="end" font-size="12" fill="#2d3748">{tag}</text>
  <rect x="{bar_x:.0}" y="{y:.1}" width="{w:.1}" height="{bar_height:.0}" fill="{fill}"/>
  <text x="{value_x:.1}" y="{text_y:.1}" font-size="12" fill="#4a5568">{share:.1}%</text>
"##,
            label_x = label_width - 8.0,
            bar_x = label_width,
            text_y = y + bar_height - 4.0,
            tag = bucket.tag,
            share = bucket.share_pct,
            value_x = label_width + w + 6.0,
        ));
    }

    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {WIDTH:.0} {chart_height:.0}" width="{WIDTH:.0}" height="{chart_height:.0}" role="img" aria-label="Emotion distribution">
  <rect width="{WIDTH:.0}" height="{chart_height:.0}" fill="white"/>
{bars}</svg>"#,
    )
}

fn empty_chart(message: &str) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {WIDTH:.0} 80" width="{WIDTH:.0}" height="80">
  <rect width="{WIDTH:.0}" height="80" fill="white"/>
  <text x="{center:.0}" y="45" text-anchor="middle" font-size="14" fill="#718096">{message}</text>
</svg>"##,
        center = WIDTH / 2.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(date: &str, pnl: f64) -> PnlPoint {
        PnlPoint {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            cumulative_pnl: pnl,
        }
    }

    #[test]
    fn empty_curve_renders_placeholder() {
        let svg = pnl_curve_svg(&[]);
        assert!(svg.contains("No trades in range"));
    }

    #[test]
    fn curve_renders_polyline() {
        let curve = vec![
            point("2024-01-02", 100.0),
            point("2024-01-03", 50.0),
            point("2024-01-04", 175.0),
        ];
        let svg = pnl_curve_svg(&curve);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<polyline"));
    }

    #[test]
    fn distribution_renders_one_bar_per_bucket() {
        use crate::domain::emotion_score::aggregate;
        use crate::domain::trade::{Side, Trade};

        let trades = vec![Trade {
            id: None,
            symbol: "BHP".into(),
            side: Side::Buy,
            quantity: 1.0,
            entry_price: 1.0,
            exit_price: 1.0,
            pnl: 0.0,
            trade_date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            emotions: vec!["TILT".into(), "DISCIPLINE".into()],
            strategy_id: None,
            notes: String::new(),
        }];
        let svg = emotion_distribution_svg(&aggregate(&trades));
        assert_eq!(svg.matches("<rect x=").count(), 2);
        assert!(svg.contains("TILT"));
        assert!(svg.contains("DISCIPLINE"));
        // Positive and negative classes get their own colors.
        assert!(svg.contains("#2f855a"));
        assert!(svg.contains("#c53030"));
    }

    #[test]
    fn empty_distribution_renders_placeholder() {
        let svg = emotion_distribution_svg(&[]);
        assert!(svg.contains("No emotion tags recorded"));
    }
}
