//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

use quizforge_core::model::Difficulty;
use quizforge_core::report::{SessionReport, TierPerformance};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML page from a session report.
pub fn generate_html(report: &SessionReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>quizforge report: session {}</title>\n",
        report.session_id
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>quizforge session report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Session <code>{}</code> | {} answered | {} pending review(s)</p>\n",
        report.session_id, report.total_questions, report.pending_reviews
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Answered</th><th>Correct</th><th>Wrong</th><th>Accuracy</th><th>Avg Time</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td><td>{:.1}s</td></tr></tbody></table>\n",
        report.total_questions,
        report.total_correct,
        report.total_wrong,
        report.overall_accuracy * 100.0,
        report.average_latency_secs,
    ));

    if !report.difficulty_performance.is_empty() {
        html.push_str("<h3>By Difficulty</h3>\n");
        html.push_str("<table class=\"tiers\">\n");
        html.push_str("<thead><tr><th>Tier</th><th>Questions</th><th>Accuracy</th><th>Avg Time</th></tr></thead>\n");
        html.push_str("<tbody>\n");
        for (tier, perf) in &report.difficulty_performance {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{:.1}%</td><td>{:.1}s</td></tr>\n",
                tier,
                perf.total_questions,
                perf.accuracy * 100.0,
                perf.average_latency_secs,
            ));
        }
        html.push_str("</tbody></table>\n");
        html.push_str(&generate_bar_chart(&report.difficulty_performance));
    }

    html.push_str("</section>\n");

    // Hardest questions
    if !report.challenging_questions.is_empty() {
        html.push_str("<section class=\"results\">\n");
        html.push_str("<h2>Most Challenging</h2>\n");
        html.push_str("<table class=\"sortable\" id=\"challenging\">\n");
        html.push_str("<thead><tr>");
        for (col, label) in ["Question", "Difficulty", "Attempts", "Accuracy", "Avg Time"]
            .iter()
            .enumerate()
        {
            html.push_str(&format!("<th data-col=\"{col}\">{label}</th>"));
        }
        html.push_str("</tr></thead>\n");
        html.push_str("<tbody>\n");
        for q in &report.challenging_questions {
            // Rows stay neutral once every attempt was right.
            let class = if q.correct_attempts == q.attempts {
                "recovered"
            } else {
                "missed"
            };
            html.push_str(&format!(
                "<tr class=\"{}\"><td title=\"{}\">{}</td><td>{}</td><td>{}</td><td>{:.1}%</td><td>{:.1}s</td></tr>\n",
                class,
                html_escape(&q.prompt),
                html_escape(&q.id),
                q.difficulty,
                q.attempts,
                q.accuracy * 100.0,
                q.average_latency_secs,
            ));
        }
        html.push_str("</tbody></table>\n");
        html.push_str("</section>\n");
    }

    // Wrong answers
    if !report.wrong_answers.is_empty() {
        html.push_str("<section class=\"wrong\">\n");
        html.push_str("<h2>Wrong Answers</h2>\n");
        for w in &report.wrong_answers {
            html.push_str("<div class=\"card missed\">\n");
            html.push_str(&format!(
                "<p><strong>{}</strong> ({}): {}</p>\n",
                html_escape(&w.question_id),
                w.difficulty,
                html_escape(&w.prompt)
            ));
            html.push_str(&format!(
                "<p>Answered <code>{}</code>, correct was <code>{}</code></p>\n",
                html_escape(&w.submitted_option),
                html_escape(&w.correct_option)
            ));
            if let Some(explanation) = &w.explanation {
                html.push_str(&format!(
                    "<p class=\"meta\">{}</p>\n",
                    html_escape(explanation)
                ));
            }
            html.push_str("</div>\n");
        }
        html.push_str("</section>\n");
    }

    // Value table
    html.push_str("<section class=\"learning\">\n");
    html.push_str("<h2>Learning Progress</h2>\n");
    html.push_str("<table class=\"values\">\n<thead><tr><th>From \\ To</th>");
    for to in Difficulty::ALL {
        html.push_str(&format!("<th>{to}</th>"));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for from in Difficulty::ALL {
        html.push_str(&format!("<tr><th>{from}</th>"));
        let row = report.learning_progress.row(from);
        let learned = row.iter().any(|v| *v != 0.0);
        let best = report.learning_progress.best(from);
        for (to, value) in Difficulty::ALL.into_iter().zip(row) {
            if learned && to == best {
                html.push_str(&format!("<td class=\"best\">{value:.3}</td>"));
            } else {
                html.push_str(&format!("<td>{value:.3}</td>"));
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    if !report.challenging_questions.is_empty() {
        html.push_str("<script>\n");
        html.push_str(JS);
        html.push_str("</script>\n");
    }

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &SessionReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn generate_bar_chart(tiers: &BTreeMap<Difficulty, TierPerformance>) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 120;

    let total_height = tiers.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, (tier, perf)) in tiers.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let score = perf.accuracy;
        let width = (score * max_width as f64) as usize;

        let color = if score >= 0.8 {
            "#22c55e"
        } else if score >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            tier
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            score * 100.0
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --muted: #6b7280; --rule: #e5e7eb; --missed: #fde2e2; --best: #dbeafe; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --muted: #9ca3af; --rule: #374151; --missed: #7f1d1d; --best: #1e3a8a; }
}
body { font-family: system-ui, sans-serif; max-width: 60rem; margin: 0 auto; padding: 2rem; background: var(--bg); color: var(--fg); }
.meta { color: var(--muted); }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border-bottom: 1px solid var(--rule); padding: 0.4rem 0.8rem; text-align: left; }
td { font-variant-numeric: tabular-nums; }
.sortable th { cursor: pointer; user-select: none; }
.sortable th[data-dir="asc"]::after { content: " \25B2"; }
.sortable th[data-dir="desc"]::after { content: " \25BC"; }
tr.missed td:first-child { border-left: 4px solid var(--missed); }
.card { border-left: 4px solid var(--missed); padding: 0.25rem 1rem; margin: 0.75rem 0; }
.values td { text-align: right; }
.values td.best { background: var(--best); font-weight: bold; }
pre { overflow-x: auto; padding: 1rem; background: var(--rule); }
summary { cursor: pointer; }
"#;

// Click a header to sort by that column; click again to flip the order.
// Cells like "40.0%" or "12.3s" sort by their numeric value.
const JS: &str = r#"
(function () {
  const table = document.getElementById('challenging');
  const key = (row, col) => {
    const text = row.cells[col].textContent.trim();
    const n = parseFloat(text);
    return Number.isNaN(n) ? text : n;
  };
  table.querySelectorAll('th[data-col]').forEach(th => {
    th.addEventListener('click', () => {
      const col = Number(th.dataset.col);
      const dir = th.dataset.dir === 'asc' ? 'desc' : 'asc';
      table.querySelectorAll('th[data-col]').forEach(h => delete h.dataset.dir);
      th.dataset.dir = dir;
      const body = table.tBodies[0];
      const rows = Array.from(body.rows);
      rows.sort((a, b) => {
        const x = key(a, col), y = key(b, col);
        const order = x < y ? -1 : x > y ? 1 : 0;
        return dir === 'asc' ? order : -order;
      });
      rows.forEach(r => body.appendChild(r));
    });
  });
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use quizforge_core::policy::{DifficultyPolicy, ValueTable};
    use quizforge_core::report::QuestionPerformance;
    use quizforge_core::tracker::WrongAnswer;

    fn make_test_report() -> SessionReport {
        let options: BTreeMap<String, String> = [("A", "<b>bold</b>"), ("B", "plain")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        SessionReport {
            session_id: uuid::Uuid::nil(),
            total_questions: 2,
            total_correct: 1,
            total_wrong: 1,
            overall_accuracy: 0.5,
            average_latency_secs: 7.5,
            difficulty_performance: BTreeMap::from([(
                Difficulty::Medium,
                TierPerformance {
                    total_questions: 2,
                    accuracy: 0.5,
                    average_latency_secs: 7.5,
                },
            )]),
            challenging_questions: vec![QuestionPerformance {
                id: "tcp-1".into(),
                prompt: "Which layer is TCP?".into(),
                options: options.clone(),
                correct_option: "B".into(),
                difficulty: Difficulty::Medium,
                explanation: None,
                related_topics: vec![],
                related_links: vec![],
                attempts: 1,
                correct_attempts: 0,
                accuracy: 0.0,
                average_latency_secs: 10.0,
            }],
            wrong_answers: vec![WrongAnswer {
                question_id: "tcp-1".into(),
                prompt: "Which layer is <TCP>?".into(),
                submitted_option: "A".into(),
                correct_option: "B".into(),
                options,
                difficulty: Difficulty::Medium,
                latency_secs: 10.0,
                explanation: Some("TCP is a transport protocol & reliable".into()),
            }],
            question_details: vec![],
            pending_reviews: 3,
            learning_progress: ValueTable::new(),
        }
    }

    #[test]
    fn html_report_contains_required_elements() {
        let html = generate_html(&make_test_report());

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("tcp-1"));
        assert!(html.contains("50.0%"));
        assert!(html.contains("<th>Medium</th>"));
        assert!(html.contains("3 pending review(s)"));
        assert!(html.contains("Learning Progress"));
    }

    #[test]
    fn html_report_escapes_user_content() {
        let html = generate_html(&make_test_report());
        assert!(html.contains("Which layer is &lt;TCP&gt;?"));
        assert!(html.contains("transport protocol &amp; reliable"));
        assert!(!html.contains("<TCP>"));
    }

    #[test]
    fn empty_report_skips_optional_sections() {
        let mut report = make_test_report();
        report.difficulty_performance.clear();
        report.challenging_questions.clear();
        report.wrong_answers.clear();

        let html = generate_html(&report);
        assert!(!html.contains("id=\"challenging\""));
        assert!(!html.contains("<script>"));
        assert!(!html.contains("Wrong Answers"));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn row_classes_are_styled() {
        let html = generate_html(&make_test_report());
        assert!(html.contains("<tr class=\"missed\">"));
        assert!(html.contains("<div class=\"card missed\">"));
        for selector in ["tr.missed", ".card", ".values td.best", ".sortable th"] {
            assert!(CSS.contains(selector), "missing style for {selector}");
        }
    }

    #[test]
    fn best_learned_tier_is_highlighted() {
        let mut report = make_test_report();
        assert!(!generate_html(&report).contains("class=\"best\""));

        let mut policy = DifficultyPolicy::new(0.1, 0.5, 0.9);
        policy.update(Difficulty::Easy, Difficulty::Medium, 2.0);
        report.learning_progress = *policy.table();

        let html = generate_html(&report);
        assert_eq!(html.matches("class=\"best\"").count(), 1);
        assert!(html.contains("<td class=\"best\">1.000</td>"));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_test_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.html");

        write_html_report(&report, &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
