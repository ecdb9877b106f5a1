use std::fmt::Write;

use chrono::{DateTime, TimeZone};
use explorer_core::{AppViewModel, CriteriaSet, Facet};

/// Plain-text report of the current view.
pub fn report<Tz>(view: &AppViewModel, criteria: &CriteriaSet, generated: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Effect explorer report ({})",
        generated.format("%Y-%m-%d %H:%M:%S %Z")
    );
    let _ = writeln!(out, "Status: {}", view.status);
    out.push('\n');

    out.push_str("Criteria\n");
    for facet in Facet::ALL {
        let selected = criteria
            .selections(facet)
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "  {}: {}", facet.noun(), selected);
    }
    let _ = writeln!(
        out,
        "  minimum cell size: more than {}",
        criteria.minimum_cell_size
    );
    out.push('\n');

    let _ = writeln!(
        out,
        "Effects selected: {} of {}",
        view.subset_size, view.corpus_size
    );
    if let Some(report) = &view.filter_report {
        let removed = report
            .removed
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(stage, count)| format!("{stage} {count}"))
            .collect::<Vec<_>>();
        if !removed.is_empty() {
            let _ = writeln!(out, "  removed by {}", removed.join(", "));
        }
    }

    match &view.effect {
        Some(effect) => {
            let _ = writeln!(out, "Pooled effect (Cohen's d): {}", effect.value);
            let _ = writeln!(out, "  {}", effect.interval_label());
            let _ = writeln!(
                out,
                "  Probability of superiority: {}%",
                effect.superiority_percent
            );
            let _ = writeln!(out, "  Percent overlap: {}%", effect.overlap_percent);
            let _ = writeln!(out, "  U3: {}%", effect.u3_percent);
        }
        None => out.push_str("Pooled effect: not computed\n"),
    }

    if let Some(error) = &view.error {
        let _ = writeln!(out, "Error: {error}");
    }
    if view.dropped_submissions > 0 {
        let _ = writeln!(
            out,
            "Submissions ignored while the engine was not ready: {}",
            view.dropped_submissions
        );
    }
    out
}

/// One-line progress summary for the terminal.
pub fn status_line(view: &AppViewModel) -> String {
    match (&view.effect, &view.error) {
        (_, Some(error)) => format!("{} | {}", view.status, error),
        (Some(effect), None) => format!(
            "{} | d = {} {} | {} effects",
            view.status,
            effect.value,
            effect.interval_label(),
            view.subset_size
        ),
        (None, None) => view.status.clone(),
    }
}
