// Self-contained HTML report for `gridrecon compare --html`

use gridrecon_recon::model::{AggregatedEntry, ReconResult, SourceValue};

pub(crate) fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const STYLE: &str = "\
body{font-family:-apple-system,Segoe UI,Helvetica,Arial,sans-serif;margin:24px;color:#1d1d1f}\
h1{font-size:20px}h2{font-size:16px;margin-top:28px}\
table{border-collapse:collapse;margin:8px 0;font-size:13px}\
th,td{border:1px solid #d0d0d5;padding:4px 8px;text-align:left}\
th{background:#f2f2f5}td.num{text-align:right;font-variant-numeric:tabular-nums}\
tr.major td{background:#fdecea}td.absent{color:#999}\
.meta{color:#666;font-size:12px}";

pub fn render_html(result: &ReconResult) -> String {
    let mut html = String::new();
    html.push_str("<!doctype html><html><head><meta charset=\"utf-8\" />");
    html.push_str("<title>");
    html.push_str(&escape_html(&result.meta.config_name));
    html.push_str("</title><style>");
    html.push_str(STYLE);
    html.push_str("</style></head><body>");

    html.push_str(&format!(
        "<h1>{}</h1><div class=\"meta\">baseline: {} &middot; sources: {} &middot; tolerance: {} {} &middot; run at {} &middot; engine {}</div>",
        escape_html(&result.meta.config_name),
        escape_html(&result.meta.baseline),
        escape_html(&result.meta.sources.join(", ")),
        result.meta.tolerance.policy,
        result.meta.tolerance.threshold,
        escape_html(&result.meta.run_at),
        escape_html(&result.meta.engine_version),
    ));

    push_summary(&mut html, result);
    push_mismatches(&mut html, result);
    push_missing(&mut html, result);
    push_sections(&mut html, result);

    html.push_str("</body></html>");
    html
}

fn push_summary(html: &mut String, result: &ReconResult) {
    let s = &result.summary;
    html.push_str("<h2>Summary</h2><table><tbody>");
    let rows = [
        ("Keys", s.total_keys),
        ("Shared keys", s.shared_keys),
        ("Comparisons", s.comparisons),
        ("Matched", s.matched),
        ("Mismatches", s.mismatches),
        ("Numeric", s.numeric_mismatches),
        ("Text", s.text_mismatches),
        ("Major", s.major_mismatches),
        ("Duplicate keys", s.duplicates),
    ];
    for (label, n) in rows {
        html.push_str(&format!("<tr><th>{label}</th><td class=\"num\">{n}</td></tr>"));
    }
    for (kind, n) in &s.warning_counts {
        html.push_str(&format!(
            "<tr><th>Warnings ({})</th><td class=\"num\">{n}</td></tr>",
            escape_html(kind)
        ));
    }
    html.push_str("</tbody></table>");

    html.push_str("<table><thead><tr><th>Source</th><th>Records</th><th>Keys</th><th>Missing</th><th>Duplicates</th><th>Warnings</th></tr></thead><tbody>");
    for src in &s.sources {
        html.push_str(&format!(
            "<tr><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>",
            escape_html(&src.name),
            src.records,
            src.keys,
            src.missing,
            src.duplicates,
            src.warnings,
        ));
    }
    html.push_str("</tbody></table>");
}

fn push_mismatches(html: &mut String, result: &ReconResult) {
    html.push_str(&format!("<h2>Mismatches ({})</h2>", result.mismatches.len()));
    if result.mismatches.is_empty() {
        html.push_str("<p>None.</p>");
        return;
    }
    html.push_str("<table><thead><tr><th>Section</th><th>Group</th><th>Channel</th><th>Metric</th><th>Period</th><th>Reference</th><th>Value</th><th>Other</th><th>Value</th><th>Diff</th><th>Kind</th></tr></thead><tbody>");
    for m in &result.mismatches {
        let row_class = if m.major { " class=\"major\"" } else { "" };
        let diff = m.delta.map(|d| d.to_string()).unwrap_or_default();
        html.push_str(&format!(
            "<tr{row_class}><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{} {}</td><td class=\"num\">{}</td><td>{} {}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td>{}</td></tr>",
            escape_html(&m.labels.section),
            escape_html(&m.labels.group_path.join(" / ")),
            escape_html(&m.labels.channel),
            escape_html(&m.labels.metric),
            escape_html(&m.labels.period),
            escape_html(&m.reference.source),
            escape_html(&m.reference.cell),
            escape_html(&m.v1),
            escape_html(&m.other.source),
            escape_html(&m.other.cell),
            escape_html(&m.v2),
            escape_html(&diff),
            m.kind,
        ));
    }
    html.push_str("</tbody></table>");
}

fn push_missing(html: &mut String, result: &ReconResult) {
    html.push_str("<h2>Missing keys</h2>");
    let mut any = false;
    for pair in result.missing.iter().filter(|m| !m.keys.is_empty()) {
        any = true;
        html.push_str(&format!(
            "<h3>In {} but not in {} ({})</h3><ul>",
            escape_html(&pair.present_in),
            escape_html(&pair.absent_from),
            pair.keys.len()
        ));
        for key in &pair.keys {
            html.push_str(&format!("<li>{}</li>", escape_html(&key.to_string())));
        }
        html.push_str("</ul>");
    }
    if !any {
        html.push_str("<p>None.</p>");
    }
}

/// Last source against baseline: absolute and percent change.
fn change(values: &[SourceValue]) -> (String, String) {
    let (Some(base), Some(last)) = (values.first(), values.last()) else {
        return (String::new(), String::new());
    };
    match (base.value_num, last.value_num) {
        (Some(b), Some(l)) if base.present && last.present => {
            let d = l - b;
            let pct = if b != 0.0 {
                format!("{:.2}%", d / b.abs() * 100.0)
            } else {
                String::new()
            };
            (format!("{d:.2}"), pct)
        }
        _ => (String::new(), String::new()),
    }
}

fn push_sections(html: &mut String, result: &ReconResult) {
    let sources = &result.meta.sources;
    let last = sources.last().cloned().unwrap_or_default();

    let mut sections: Vec<(&str, Vec<&AggregatedEntry>)> = Vec::new();
    for entry in &result.entries {
        match sections.iter_mut().find(|(name, _)| *name == entry.labels.section) {
            Some((_, entries)) => entries.push(entry),
            None => sections.push((entry.labels.section.as_str(), vec![entry])),
        }
    }

    for (section, entries) in sections {
        html.push_str(&format!("<h2>{}</h2><table><thead><tr><th>Group</th><th>Channel</th><th>Metric</th><th>Period</th>", escape_html(section)));
        for name in sources {
            html.push_str(&format!("<th>{}</th>", escape_html(name)));
        }
        html.push_str(&format!(
            "<th>&Delta; {last}</th><th>%&Delta; {last}</th></tr></thead><tbody>",
            last = escape_html(&last)
        ));

        for entry in entries {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
                escape_html(&entry.labels.group_path.join(" / ")),
                escape_html(&entry.labels.channel),
                escape_html(&entry.labels.metric),
                escape_html(&entry.labels.period),
            ));
            for value in &entry.values {
                if value.present {
                    html.push_str(&format!("<td class=\"num\">{}</td>", escape_html(&value.value_text)));
                } else {
                    html.push_str("<td class=\"absent\">n/a</td>");
                }
            }
            let (delta, pct) = change(&entry.values);
            html.push_str(&format!("<td class=\"num\">{delta}</td><td class=\"num\">{pct}</td></tr>"));
        }
        html.push_str("</tbody></table>");
    }
}
