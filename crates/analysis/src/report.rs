//! Markdown export of a completed analysis.

use std::fmt::{self, Write};
use pulse_core::{AnalysisId, AnalysisPayload, AnalysisResult, AnalysisStatus, Survey};

use crate::quadrant::Quadrant;
use crate::stats::QuestionStats;

/// Export errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReportError {
    /// Only completed records can be exported
    #[error("analysis {0} is {1}, only completed analyses can be exported")]
    NotCompleted(AnalysisId, AnalysisStatus),

    /// Formatting failed
    #[error("failed to format report: {0}")]
    Format(#[from] fmt::Error),
}

/// Render a completed record, with the statistics table, as Markdown.
pub fn render_markdown_report(
    survey: &Survey,
    stats: &[QuestionStats],
    record: &AnalysisResult,
) -> Result<String, ReportError> {
    let payload = record
        .payload()
        .ok_or(ReportError::NotCompleted(record.id, record.status()))?;

    let mut out = String::new();
    writeln!(out, "# {}", survey.title)?;
    writeln!(out)?;
    writeln!(out, "- Method: {} ({})", record.method.display_name(), record.method)?;
    writeln!(out, "- Generated: {}", record.created_at.format("%Y-%m-%d %H:%M UTC"))?;
    writeln!(out)?;
    writeln!(out, "## Summary")?;
    writeln!(out)?;
    writeln!(out, "{}", record.summary)?;
    writeln!(out)?;

    render_payload(&mut out, payload)?;
    render_stats(&mut out, stats)?;

    Ok(out)
}

fn render_payload(out: &mut String, payload: &AnalysisPayload) -> fmt::Result {
    match payload {
        AnalysisPayload::Comprehensive(report) => {
            writeln!(out, "## Sentiment Index: {}/100", report.sentiment_score)?;
            writeln!(out)?;
            if !report.comprehensive_diagnosis.is_empty() {
                writeln!(out, "## Diagnosis")?;
                writeln!(out)?;
                writeln!(out, "{}", report.comprehensive_diagnosis)?;
                writeln!(out)?;
            }
            bullet_section(out, "Strengths", &report.strengths)?;
            bullet_section(out, "Weaknesses", &report.weaknesses)?;
            bullet_section(out, "Strategic Action Plan", &report.improvement_strategies)?;
            bullet_section(out, "Key Themes", &report.key_themes)?;
            bullet_section(out, "Recommendations", &report.recommendations)?;
        }
        AnalysisPayload::ImportancePerformance(points) => {
            writeln!(out, "## Importance-Performance Matrix")?;
            writeln!(out)?;
            writeln!(out, "| Item | Importance | Performance | Quadrant |")?;
            writeln!(out, "|---|---|---|---|")?;
            for p in points {
                writeln!(
                    out,
                    "| {} | {:.2} | {:.2} | {} |",
                    p.label,
                    p.importance,
                    p.performance,
                    Quadrant::classify(p)
                )?;
            }
            writeln!(out)?;
        }
        AnalysisPayload::StatisticalSpread(rows) => {
            writeln!(out, "## Response Spread")?;
            writeln!(out)?;
            writeln!(out, "| Item | Min | Q1 | Median | Q3 | Max |")?;
            writeln!(out, "|---|---|---|---|---|---|")?;
            for r in rows {
                writeln!(
                    out,
                    "| {} | {} | {} | {} | {} | {} |",
                    r.label, r.min, r.q1, r.median, r.q3, r.max
                )?;
            }
            writeln!(out)?;
        }
        AnalysisPayload::Correspondence(points) => {
            writeln!(out, "## Correspondence Map")?;
            writeln!(out)?;
            writeln!(out, "| Label | Category | X | Y |")?;
            writeln!(out, "|---|---|---|---|")?;
            for p in points {
                writeln!(out, "| {} | {} | {:.2} | {:.2} |", p.label, p.category, p.x, p.y)?;
            }
            writeln!(out)?;
        }
        AnalysisPayload::Demographic(insights) => {
            bullet_section(out, "Respondent Segments", insights)?;
        }
        AnalysisPayload::VisionAlignment(vision) => {
            writeln!(out, "## Vision Alignment: {:.0}/100", vision.alignment_score)?;
            writeln!(out)?;
            writeln!(out, "{}", vision.alignment_summary)?;
            writeln!(out)?;
            bullet_section(out, "Aligned Areas", &vision.aligned_areas)?;
            bullet_section(out, "Gap Areas", &vision.gap_areas)?;
        }
    }
    Ok(())
}

fn bullet_section(out: &mut String, title: &str, items: &[String]) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(out, "## {}", title)?;
    writeln!(out)?;
    for item in items {
        writeln!(out, "- {}", item)?;
    }
    writeln!(out)
}

fn render_stats(out: &mut String, stats: &[QuestionStats]) -> fmt::Result {
    if stats.is_empty() {
        return Ok(());
    }
    writeln!(out, "## Statistics")?;
    writeln!(out)?;
    writeln!(out, "| # | Question | Mean | Std. Dev. | N |")?;
    writeln!(out, "|---|---|---|---|---|")?;
    for s in stats {
        writeln!(
            out,
            "| Q{} | {} | {:.2} | {:.2} | {} |",
            s.index, s.question, s.mean, s.std_dev, s.count
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::compute_stats;
    use pulse_core::{AnalysisMethod, ComprehensiveReport, IpaPoint, Question, SurveyResponse};

    #[test]
    fn test_comprehensive_report() {
        let q = Question::likert("Dining");
        let survey = Survey::new("Campus life", "").with_question(q.clone());
        let responses = vec![SurveyResponse::new(survey.id).with_answer(q.id, 4)];
        let stats = compute_stats(&survey, &responses);
        let record = AnalysisResult::completed(
            "Students are satisfied.",
            AnalysisPayload::Comprehensive(ComprehensiveReport {
                strengths: vec!["Friendly staff".into()],
                sentiment_score: 78,
                ..Default::default()
            }),
        );

        let md = render_markdown_report(&survey, &stats, &record).unwrap();
        assert!(md.starts_with("# Campus life\n"));
        assert!(md.contains("Students are satisfied."));
        assert!(md.contains("## Sentiment Index: 78/100"));
        assert!(md.contains("- Friendly staff"));
        assert!(!md.contains("## Weaknesses"));
        assert!(md.contains("| Q1 | Dining | 4.00 | 0.00 | 1 |"));
    }

    #[test]
    fn test_ipa_table_includes_quadrant() {
        let survey = Survey::new("Campus", "");
        let record = AnalysisResult::completed(
            "",
            AnalysisPayload::ImportancePerformance(vec![IpaPoint {
                label: "Parking".into(),
                importance: 4.0,
                performance: 1.5,
            }]),
        );
        let md = render_markdown_report(&survey, &[], &record).unwrap();
        assert!(md.contains("| Parking | 4.00 | 1.50 | Concentrate Here |"));
    }

    #[test]
    fn test_unfinished_records_cannot_be_exported() {
        let survey = Survey::new("Campus", "");
        let pending = AnalysisResult::pending(AnalysisMethod::Demographic);
        let err = render_markdown_report(&survey, &[], &pending).unwrap_err();
        assert_eq!(err, ReportError::NotCompleted(pending.id, AnalysisStatus::Pending));

        let failed = AnalysisResult::failed(AnalysisMethod::Demographic, "quota");
        assert!(render_markdown_report(&survey, &[], &failed).is_err());
    }
}
