//! Console rendering of analysis results.

use crate::acquisition::types::Band;
use crate::core::classifier::{EmotionLabel, LabelProbabilities};
use crate::core::insights::BandInsights;
use crate::core::pipeline::Assessment;
use std::fmt::Write;

/// Width of a probability bar in cells.
pub const BAR_CELLS: usize = 20;

/// Running totals shown under each batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTotals {
    pub total_batches: usize,
    pub total_samples: usize,
    pub duration_secs: u64,
}

/// Render one analyzed batch.
pub fn render(assessment: &Assessment, totals: &SessionTotals) -> String {
    let analysis = &assessment.analysis;
    let mut out = String::new();

    let rule = "=".repeat(60);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(
        out,
        "EEG ANALYSIS - {}",
        analysis.timestamp.format("%H:%M:%S")
    );
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(
        out,
        "Current state: {}",
        analysis.dominant_label.as_str().to_uppercase()
    );
    let _ = writeln!(
        out,
        "Consistency:   {:.1}% ({}/{} samples)",
        analysis.consistency * 100.0,
        analysis.dominant_count,
        analysis.batch_size
    );
    let _ = writeln!(out, "Confidence:    {:.1}%", analysis.avg_confidence * 100.0);

    let _ = writeln!(out);
    let _ = writeln!(out, "Probabilities:");
    for (label, p) in sorted_probabilities(&analysis.avg_probabilities) {
        let _ = writeln!(
            out,
            "  {:<8} {} {:.1}%",
            capitalize(label.as_str()),
            bar(p),
            p * 100.0
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Bands:");
    for band in Band::ALL {
        let stat = analysis.band_stats.get(band);
        let _ = writeln!(
            out,
            "  {:<20} {:.3} {}",
            format!("{} ({}):", capitalize(band.name()), band.meaning()),
            stat.avg,
            stat.trend.arrow()
        );
    }

    if !assessment.recommendations.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Recommendations:");
        for rec in &assessment.recommendations {
            let _ = writeln!(out, "  {}", rec.tag());
            for line in rec.advice() {
                let _ = writeln!(out, "    - {line}");
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Session:");
    let _ = writeln!(out, "  Total batches: {}", totals.total_batches);
    let _ = writeln!(out, "  Total samples: {}", totals.total_samples);
    let _ = write!(out, "  Duration:      {}s", totals.duration_secs);

    out
}

/// Render band ranges and ratio readings.
pub fn render_insights(insights: &BandInsights) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Band statistics:");
    for summary in &insights.bands {
        let _ = writeln!(
            out,
            "  {:<6} avg {:.4}  range {:.4} - {:.4}  {}",
            capitalize(summary.band.name()),
            summary.avg,
            summary.min,
            summary.max,
            summary.direction.arrow()
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Ratios:");
    let _ = writeln!(
        out,
        "  Alpha/Beta  {:.3}  {}",
        insights.alpha_beta_ratio,
        insights.arousal.describe()
    );
    let _ = writeln!(
        out,
        "  Theta/Alpha {:.3}  {}",
        insights.theta_alpha_ratio,
        insights.drowsiness.describe()
    );
    let _ = write!(
        out,
        "  Beta/Theta  {:.3}  {}",
        insights.beta_theta_ratio,
        insights.focus.describe()
    );

    out
}

/// Probabilities from most to least likely; ties keep label order.
fn sorted_probabilities(probabilities: &LabelProbabilities) -> Vec<(EmotionLabel, f64)> {
    let mut sorted: Vec<_> = probabilities.iter().collect();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1));
    sorted
}

fn bar(p: f64) -> String {
    let filled = ((p.clamp(0.0, 1.0) * BAR_CELLS as f64) as usize).min(BAR_CELLS);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_CELLS - filled))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::types::RawSample;
    use crate::core::aggregate::{BandStats, BatchAnalysis, Trend};
    use crate::core::recommend::Recommendation;
    use chrono::Utc;

    fn assessment() -> Assessment {
        let mut band_stats = BandStats::from_averages(0.387, 0.312, 0.300);
        band_stats.theta.trend = Trend::Increasing;
        Assessment {
            analysis: BatchAnalysis {
                timestamp: Utc::now(),
                batch_size: 10,
                dominant_label: EmotionLabel::Fatigue,
                dominant_count: 10,
                consistency: 1.0,
                avg_confidence: 0.62,
                avg_probabilities: LabelProbabilities::new(0.08, 0.30, 0.62),
                band_stats,
            },
            recommendations: vec![Recommendation::HighFatigue],
        }
    }

    #[test]
    fn test_bar_widths() {
        assert_eq!(bar(0.0), "░".repeat(20));
        assert_eq!(bar(1.0), "█".repeat(20));
        assert_eq!(bar(0.5).chars().filter(|c| *c == '█').count(), 10);
        assert_eq!(bar(1.7).chars().count(), 20);
    }

    #[test]
    fn test_probabilities_sorted_descending() {
        let sorted = sorted_probabilities(&LabelProbabilities::new(0.08, 0.30, 0.62));
        let labels: Vec<_> = sorted.iter().map(|(l, _)| *l).collect();
        assert_eq!(
            labels,
            vec![EmotionLabel::Fatigue, EmotionLabel::Relax, EmotionLabel::Focus]
        );
    }

    #[test]
    fn test_render_contents() {
        let totals = SessionTotals {
            total_batches: 3,
            total_samples: 30,
            duration_secs: 15,
        };
        let text = render(&assessment(), &totals);

        assert!(text.contains("Current state: FATIGUE"));
        assert!(text.contains("(10/10 samples)"));
        assert!(text.contains("Confidence:    62.0%"));
        assert!(text.contains("high-fatigue: stop and rest"));
        assert!(text.contains("Consider a 15-20 minute power nap"));
        assert!(text.contains("Theta (Drowsiness):"));
        assert!(text.contains("↗"));
        assert!(text.contains("Total samples: 30"));

        let fatigue = text.find("Fatigue").unwrap();
        let focus = text.find("Focus  ").unwrap();
        assert!(fatigue < focus);
    }

    #[test]
    fn test_render_insights() {
        let samples = [
            RawSample::now(0.3830, 0.3279, 0.2891),
            RawSample::now(0.3902, 0.2982, 0.3116),
        ];
        let insights = BandInsights::from_samples(&samples).unwrap();
        let text = render_insights(&insights);

        assert!(text.contains("Alpha/Beta"));
        assert!(text.contains("Relaxed state"));
        assert!(text.contains("Moderate drowsiness"));
    }
}
