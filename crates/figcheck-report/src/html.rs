//! HTML summaries.
//!
//! Two variants are rendered from a [`RunSummary`]:
//!
//! - **html**: one card per test with search, filters and sorting driven by
//!   `extra.js`. Needs the assets written next to it.
//! - **basic-html**: a single self-contained table, no scripts.
//!
//! Cards are ordered by [`status_sort`] (most severe first), ties by
//! identity. Badges flag sub-statuses that contradict the overall status, and
//! only for comparison kinds that some result in the run has a baseline for.
//! Output contains no timestamps, so the same summary renders the same page.

use crate::{RunSummary, Statistics};
use figcheck_core::{ComparisonResult, Status, SubStatus};
use std::fmt::Write;

/// File name of the rich report.
pub const HTML_FILE: &str = "fig_comparison.html";

/// File name of the basic report.
pub const BASIC_HTML_FILE: &str = "fig_comparison_basic.html";

const TITLE: &str = "Image comparison";

/// Sort key for a result: lower is more severe.
///
/// Starts at 50; failed −10, image diff −3, image missing −4, hash diff −1,
/// hash missing −5.
pub fn status_sort(result: &ComparisonResult) -> i32 {
    let mut s = 50;
    if result.status == Status::Failed {
        s -= 10;
    }
    match result.image_status {
        Some(SubStatus::Diff) => s -= 3,
        Some(SubStatus::Missing) => s -= 4,
        _ => {}
    }
    match result.hash_status {
        Some(SubStatus::Diff) => s -= 1,
        Some(SubStatus::Missing) => s -= 5,
        _ => {}
    }
    s
}

/// Escapes text for HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Comparison kinds that carry baselines somewhere in the run.
///
/// A kind nobody has a baseline for is not expected to exist, so its
/// missing status is not worth a badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BaselineKinds {
    /// Some result has a baseline image.
    pub image: bool,
    /// Some result has a baseline hash.
    pub hash: bool,
}

impl BaselineKinds {
    /// Scans a summary.
    pub fn of(summary: &RunSummary) -> Self {
        let mut kinds = Self::default();
        for (_, result) in summary.iter() {
            kinds.image |= result.baseline_image.is_some();
            kinds.hash |= result.baseline_hash.is_some();
        }
        kinds
    }
}

#[derive(Clone, Copy)]
enum Kind {
    Image,
    Hash,
}

impl Kind {
    fn name(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Hash => "hash",
        }
    }

    fn tooltip(self, sub: Option<SubStatus>) -> String {
        let what = match self {
            Self::Image => "Baseline image",
            Self::Hash => "Baseline hash",
        };
        match sub {
            Some(SubStatus::Match) => format!("{what} matches"),
            Some(SubStatus::Diff) => format!("{what} differs"),
            Some(SubStatus::Missing) => format!("{what} not found"),
            Some(SubStatus::Generated) => format!("{what} generated"),
            None => format!("{what} not compared"),
        }
    }
}

fn btn_class(label: &str) -> &'static str {
    match label {
        "passed" | "match" => "success",
        "failed" | "diff" => "danger",
        "skipped" | "missing" => "warning",
        "generated" => "info",
        _ => "secondary",
    }
}

fn sub_label(sub: Option<SubStatus>) -> &'static str {
    sub.map_or("none", |s| s.label())
}

/// Badge condition: missing, or contradicting the overall status.
fn wants_badge(status: Status, sub: Option<SubStatus>) -> bool {
    matches!(
        (status, sub),
        (_, Some(SubStatus::Missing))
            | (Status::Failed, Some(SubStatus::Match))
            | (Status::Passed, Some(SubStatus::Diff))
    )
}

/// `(module, test name)` split at the last `.` outside the parameter brackets.
fn split_key(key: &str) -> (&str, &str) {
    let head_end = key.find('[').unwrap_or(key.len());
    match key[..head_end].rfind('.') {
        Some(i) => (&key[..i], &key[i + 1..]),
        None => ("", key),
    }
}

fn card_id(key: &str) -> String {
    key.replace('.', "-")
}

fn rms_text(result: &ComparisonResult) -> String {
    if result.image_status == Some(SubStatus::Match) {
        "&lt; tolerance".to_string()
    } else {
        result.rms.map_or_else(String::new, |r| format!("{r}"))
    }
}

fn sorted(summary: &RunSummary) -> Vec<(&str, &ComparisonResult)> {
    let mut rows: Vec<_> = summary.iter().collect();
    rows.sort_by(|a, b| status_sort(a.1).cmp(&status_sort(b.1)).then(a.0.cmp(b.0)));
    rows
}

fn img(src: &Option<String>, alt: &str) -> String {
    match src {
        Some(src) => format!(
            r#"<img src="{}" class="card-img" alt="{alt}" loading="lazy">"#,
            escape_html(src)
        ),
        None => String::new(),
    }
}

fn stats_line(stats: &Statistics) -> String {
    format!(
        "{} tests: {} passed, {} failed, {} skipped",
        stats.total, stats.passed, stats.failed, stats.skipped
    )
}

/// Renders the rich report.
pub fn render_html(summary: &RunSummary) -> String {
    let kinds = BaselineKinds::of(summary);
    let stats = summary.statistics();
    let body_class = if kinds.hash { "" } else { "no-hash-test" };

    let mut html = String::new();
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{TITLE}</title>
<link rel="stylesheet" href="styles.css">
</head>
<body class="{body_class}">
<header class="navbar">
<h1>{TITLE}</h1>
<span class="run-stats">{stats}</span>
<input type="search" class="search" placeholder="Search tests" aria-label="Search">
<select id="sortSelect" aria-label="Sort">
<option value="status-asc" selected>Most severe first</option>
<option value="status-desc">Least severe first</option>
<option value="name-asc">Name</option>
<option value="collected-asc">Collected order</option>
</select>
</header>
{filter}
<main id="results">
<div id="noResultsAlert"></div>
<div id="resultslist" class="cards">
"#,
        stats = escape_html(&stats_line(&stats)),
        filter = filter_form(),
    );

    let collected: Vec<&str> = summary.iter().map(|(k, _)| k).collect();
    for (key, result) in sorted(summary) {
        let index = collected.binary_search(&key).unwrap_or(0);
        html.push_str(&card(key, result, index, kinds));
    }

    html.push_str("</div>\n</main>\n<script src=\"extra.js\"></script>\n</body>\n</html>\n");
    html
}

fn filter_form() -> String {
    let mut form = String::from(
        "<form id=\"filterForm\" class=\"filters\">\n<fieldset>\n<legend>Filter</legend>\n",
    );
    let groups = [
        ("overall", ["passed", "failed", "skipped"].as_slice()),
        ("image", ["match", "diff", "missing"].as_slice()),
        ("hash", ["match", "diff", "missing"].as_slice()),
    ];
    for (group, labels) in groups {
        let _ = write!(form, "<div class=\"filter-group filter-{group}\">");
        for label in labels {
            let id = format!("{group}-{label}");
            let _ = write!(
                form,
                r#"<label><input type="checkbox" class="filter" id="{id}"> {group} {label} <span class="badge">0</span></label>"#
            );
        }
        form.push_str("</div>\n");
    }
    form.push_str(
        r#"<div class="filter-condition"><label><input type="radio" name="condition" id="conditionand" checked> all</label> <label><input type="radio" name="condition" id="conditionor"> any</label></div>
<button type="reset" id="resetFilters">Reset</button>
</fieldset>
</form>
"#,
    );
    form
}

fn card(key: &str, result: &ComparisonResult, collected: usize, kinds: BaselineKinds) -> String {
    let id = card_id(key);
    let (module, test_name) = split_key(key);
    let status = result.status.label();
    let classes = format!(
        "overall-{status} image-{} hash-{}",
        sub_label(result.image_status),
        sub_label(result.hash_status)
    );

    let mut badges = String::new();
    for (kind, sub, expected) in [
        (Kind::Image, result.image_status, kinds.image),
        (Kind::Hash, result.hash_status, kinds.hash),
    ] {
        if expected && wants_badge(result.status, sub) {
            let _ = write!(
                badges,
                r#"<span class="badge badge-{btn}" title="{tip}"><img src="{svg}.svg" alt="{svg}"></span>"#,
                btn = btn_class(sub_label(sub)),
                tip = kind.tooltip(sub),
                svg = kind.name(),
            );
        }
    }

    let preview = match (&result.diff_image, &result.result_image) {
        (Some(diff), Some(res)) => format!(
            r#"<div class="overlay"><img src="{}" class="card-img" alt="result image"><img src="{}" class="card-img diff" alt="diff image"></div>"#,
            escape_html(res),
            escape_html(diff)
        ),
        _ => img(&result.result_image, "result image"),
    };

    let mut html = String::new();
    let _ = write!(
        html,
        r#"<article class="result {classes}" id="{id}" data-collected="{collected}" data-status-sort="{sort}" data-name="{name}">
<div class="card-preview">{preview}</div>
<div class="card-body">
<div class="test-name">{test_name}</div>
<div class="module">{module}</div>
<span class="badge badge-{btn}">{upper}</span>{badges}
</div>
<details class="card-details">
<summary>Details</summary>
<pre class="status-msg">{msg}</pre>
<dl>
<dt>Image</dt><dd><span class="badge badge-{image_btn}">{image_tip}</span></dd>
<dt>RMS</dt><dd class="rms-value">{rms}</dd>
<dt>Tolerance</dt><dd>{tolerance}</dd>
<dt class="hash-row">Hash</dt><dd class="hash-row"><span class="badge badge-{hash_btn}">{hash_tip}</span></dd>
<dt class="hash-row">Baseline hash</dt><dd class="hash-row baseline-hash-value">{baseline_hash}</dd>
<dt class="hash-row">Result hash</dt><dd class="hash-row result-hash-value">{result_hash}</dd>
{kernel}</dl>
<div class="image-row">{baseline_img}{diff_img}{result_img}</div>
</details>
</article>
"#,
        sort = status_sort(result),
        name = escape_html(key),
        id = escape_html(&id),
        test_name = escape_html(test_name),
        module = escape_html(module),
        btn = btn_class(status),
        upper = status.to_uppercase(),
        msg = escape_html(&result.status_msg),
        image_btn = btn_class(sub_label(result.image_status)),
        image_tip = Kind::Image.tooltip(result.image_status),
        rms = rms_text(result),
        tolerance = result.tolerance.map_or_else(String::new, |t| t.to_string()),
        hash_btn = btn_class(sub_label(result.hash_status)),
        hash_tip = Kind::Hash.tooltip(result.hash_status),
        baseline_hash = escape_html(result.baseline_hash.as_deref().unwrap_or("")),
        result_hash = escape_html(result.result_hash.as_deref().unwrap_or("")),
        kernel = kernel_rows(result),
        baseline_img = img(&result.baseline_image, "baseline image"),
        diff_img = img(&result.diff_image, "diff image"),
        result_img = img(&result.result_image, "result image"),
    );
    html
}

fn kernel_rows(result: &ComparisonResult) -> String {
    let Some(kernel) = &result.kernel else {
        return String::new();
    };
    let mut rows = format!(
        "<dt class=\"hash-row\">Kernel</dt><dd class=\"hash-row\">{}</dd>\n",
        escape_html(&kernel.kernel)
    );
    if let (Some(d), Some(t)) = (kernel.hamming_distance, kernel.hamming_tolerance) {
        let _ = writeln!(
            rows,
            "<dt class=\"hash-row\">Hamming distance</dt><dd class=\"hash-row\">{d} (tolerance {t})</dd>"
        );
    }
    rows
}

/// Renders the basic, script-free report.
pub fn render_basic_html(summary: &RunSummary) -> String {
    let kinds = BaselineKinds::of(summary);
    let stats = summary.statistics();

    let mut html = String::new();
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{TITLE}</title>
<style>
body {{ font-family: sans-serif; margin: 1.5rem; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #ccc; padding: 0.4rem; vertical-align: top; text-align: left; }}
td img {{ max-width: 200px; }}
pre {{ white-space: pre-wrap; margin: 0; font-size: 0.85em; }}
.passed {{ background: #e6f4ea; }}
.failed {{ background: #fdecea; }}
.skipped {{ background: #fff8e1; }}
</style>
</head>
<body>
<h1>{TITLE}</h1>
<p>{stats}</p>
<table>
<thead><tr><th>Test</th><th>Status</th><th>Image</th>{hash_head}<th>RMS</th><th>Baseline</th><th>Diff</th><th>Result</th><th>Message</th></tr></thead>
<tbody>
"#,
        stats = escape_html(&stats_line(&stats)),
        hash_head = if kinds.hash { "<th>Hash</th>" } else { "" },
    );

    for (key, result) in sorted(summary) {
        let status = result.status.label();
        let hash_cell = if kinds.hash {
            format!("<td>{}</td>", sub_label(result.hash_status))
        } else {
            String::new()
        };
        let _ = writeln!(
            html,
            r#"<tr class="{status}" id="{id}"><td>{name}</td><td>{upper}</td><td>{image}</td>{hash_cell}<td>{rms}</td><td>{baseline}</td><td>{diff}</td><td>{res}</td><td><pre>{msg}</pre></td></tr>"#,
            id = escape_html(&card_id(key)),
            name = escape_html(key),
            upper = status.to_uppercase(),
            image = sub_label(result.image_status),
            rms = rms_text(result),
            baseline = img(&result.baseline_image, "baseline image"),
            diff = img(&result.diff_image, "diff image"),
            res = img(&result.result_image, "result image"),
            msg = escape_html(&result.status_msg),
        );
    }

    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}
