//! HTML for the dashboard pages
//!
//! Self-contained markup with inline CSS. The only script is the sidebar's
//! auto-submit and the slider value readouts.

use super::{FormState, Page};
use crate::dataset::SelectOptions;
use crate::error::{Error, Result};
use crate::predict::{PredictionOutcome, Slider, DOORS_IN_ROUTE_SLIDER, ROUTES_COMPLETED_SLIDER, TIME_SPENT_SLIDER};
use std::fmt::Write;
use std::path::Path;

/// Hard-coded results of the offline clustering run, shown as written
pub const CLUSTER_LINES: [&str; 3] = [
    "Cluster 0 (BLUE):'WOODBEND', 'RUTHERFORD', 'DEVON', 'RABBIT HILL', 'BLACKMUD CREEK', 'GREENFIELD', 'TERWILLEGAR PARK '",
    "Cluster 1 (GREEN):'CRAWFORD PLAINS', 'WILD ROSE', 'SILVER BERRY'",
    "Cluster 2 (RED):['ELLERSLIE', 'WHITEMUD CREEK YSA', 'BEAUMONT', 'RIO VISTA', 'WAINWRIGHT BRANCH', 'LEE RIDGE '",
];

const MAPS_TITLE: &str = "Streamlit App with Embedded My Google Map";

const CLUSTER_SUMMARY: &str = "Clusters consist the neighbourhoods with highest donation bags collected on average. Cluster 0 lies on top and then are Cluster 1 and 2";

/// Permissions granted to the embedded BI report
pub const REPORT_SANDBOX: &str = "allow-storage-access-by-user-activation allow-scripts allow-same-origin allow-popups allow-popups-to-escape-sandbox";

const ABSTRACT: &str = "The Edmonton Food Drive Project aims to automate route assignment and improve pick-up efficiency based on area and donation volume. Use insights from the model to predict future donation patterns and refine strategies for continuous improvement. Enhance communication and coordination between Regional Coordinators, Stake Food Drive Representatives, and Ward Food Drive Representatives to streamline operations.";

const WHAT_IT_DOES: &str = "The Edmonton City Food Drive project focuses on using machine learning to optimize food donation management in Edmonton by analyzing the data collected in 2023 and 2024. It aims to improve drop-off and pick-up efficiency, enhance route planning, and optimize resource allocation for a more effective food drive campaign.";

const SOLUTIONS: &str = "Data Collection Mechanisms and Analysis: Develop a digital system, such as an app or web portal (Google forum) to collect the information about the donations that include, route number, donation count, resources used, and many more in real-time. Use tools like Power BI to analyze data and identify the trends, peak donation times, and high-demand areas. Communication and coordination: Set up a centralized communication platform that allows Regional Coordinators, Stake Food Drive Representatives, and Ward Food Drive Representatives to communicate instantly, share updates, and assign tasks efficiently.Machine Learning and Route Planning Algorithms: The donation process would become more efficient by combining machine learning algorithms to find the optimal drop-off locations and route optimization algorithms for pick-ups based on factors such as donation density, distance, and time constraints. By using these two different algorithms, machine learning can predict the ideal spots for drop-offs and best pick-up routes.";

const CSS: &str = r#"
:root {
    --bg: #f5f5f7;
    --sidebar: #ffffff;
    --border: #d2d2d7;
    --text: #1d1d1f;
    --dim: #86868b;
    --accent: #ff4b4b;
    --ok-bg: #e8f6ec;
    --ok: #1e7b34;
    --err-bg: #fdecea;
    --err: #b3261e;
}
* { box-sizing: border-box; margin: 0; padding: 0; }
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Helvetica Neue', Helvetica, Arial, sans-serif;
    background: var(--bg);
    color: var(--text);
    line-height: 1.6;
    display: flex;
    min-height: 100vh;
}
.sidebar {
    width: 260px;
    background: var(--sidebar);
    border-right: 1px solid var(--border);
    padding: 2rem 1.5rem;
}
.sidebar h1 { font-size: 1.5rem; margin-bottom: 1.25rem; }
.sidebar p { color: var(--dim); font-size: 0.875rem; margin-bottom: 0.5rem; }
.sidebar label { display: block; padding: 0.25rem 0; cursor: pointer; }
main { flex: 1; max-width: 880px; padding: 3rem 2.5rem; }
main h1 { font-size: 2.25rem; margin-bottom: 1rem; }
main h2 { font-size: 1.4rem; margin: 1.75rem 0 0.75rem; }
main p, main li { margin-bottom: 0.75rem; }
.logo { width: 100%; border-radius: 12px; }
.field { margin-bottom: 1.25rem; }
.field label { display: block; font-size: 0.875rem; margin-bottom: 0.35rem; }
.field select, .field input[type=range] { width: 100%; }
.field output { font-weight: 600; color: var(--accent); }
button {
    background: var(--accent);
    color: #fff;
    border: none;
    border-radius: 8px;
    padding: 0.6rem 1.4rem;
    font-size: 1rem;
    cursor: pointer;
}
.alert { margin-top: 1.5rem; padding: 1rem 1.25rem; border-radius: 8px; }
.alert.success { background: var(--ok-bg); color: var(--ok); }
.alert.error { background: var(--err-bg); color: var(--err); }
iframe { border: 0; }
"#;

const SLIDER_SCRIPT: &str = r#"document.querySelectorAll('input[type=range]').forEach(function (el) {
    el.addEventListener('input', function () { el.nextElementSibling.value = el.value; });
});"#;

/// Escape text for element content and attribute values
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap a page body in the document shell and sidebar
pub fn layout(current: Page, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Food Drive App</title>
    <style>{css}</style>
</head>
<body>
{sidebar}
<main>
{body}
</main>
</body>
</html>
"#,
        title = html_escape(current.label()),
        css = CSS,
        sidebar = sidebar(current),
        body = body,
    )
}

fn sidebar(current: Page) -> String {
    let mut radios = String::new();
    for page in Page::ALL {
        let checked = if page == current { " checked" } else { "" };
        let _ = writeln!(
            radios,
            r#"        <label><input type="radio" name="page" value="{slug}"{checked} onchange="this.form.submit()"> {label}</label>"#,
            slug = page.slug(),
            checked = checked,
            label = html_escape(page.label()),
        );
    }
    format!(
        r#"<nav class="sidebar">
    <h1>Food Drive App</h1>
    <form method="get" action="/">
        <p>Select a Page</p>
{radios}        <noscript><button type="submit">Go</button></noscript>
    </form>
</nav>"#,
        radios = radios,
    )
}

/// Dashboard: logo and project summary
pub fn dashboard() -> String {
    format!(
        r#"<img class="logo" src="/assets/logo" alt="Edmonton Food Drive">
<h2>&#x1F4A1; Abstract:</h2>
<p>{abstract_text}</p>
<h2>&#x1F468;&#x1F3FB;&#x200D;&#x1F4BB; What our Project Does?</h2>
<p>{what}</p>
<h2>Solutions</h2>
<p>{solutions}</p>"#,
        abstract_text = html_escape(ABSTRACT),
        what = html_escape(WHAT_IT_DOES),
        solutions = html_escape(SOLUTIONS),
    )
}

/// EDA: the hosted BI report in a sandboxed iframe
pub fn visualizations(report_url: &str) -> String {
    format!(
        r#"<h1>Visualizations</h1>
<p>Visualizations for the Edmonton Food drive 2024</p>
<iframe width="600" height="450" src="{url}" frameborder="0" style="border:0" allowfullscreen sandbox="{sandbox}"></iframe>"#,
        url = html_escape(report_url),
        sandbox = REPORT_SANDBOX,
    )
}

/// Maps: cluster membership and the pre-rendered map, read from disk on each render
pub fn cluster_map(map_path: &Path) -> Result<String> {
    let map_html = std::fs::read_to_string(map_path).map_err(|e| Error::io(map_path, e))?;

    let mut clusters = String::new();
    for line in CLUSTER_LINES {
        let _ = writeln!(clusters, "<p>{}</p>", html_escape(line));
    }

    Ok(format!(
        r#"<h1>{title}</h1>
<p>The map with clusters of neighbourhood:</p>
{clusters}<p>{summary}</p>
<iframe width="600" height="450" scrolling="yes" srcdoc="{map}"></iframe>"#,
        title = MAPS_TITLE,
        clusters = clusters,
        summary = CLUSTER_SUMMARY,
        map = html_escape(&map_html),
    ))
}

fn select(label: &str, name: &str, options: &[String], selected: Option<&str>) -> String {
    // Nothing submitted yet selects the first option
    let selected = selected.or_else(|| options.first().map(String::as_str));
    let mut out = format!(
        "<div class=\"field\">\n    <label for=\"{name}\">{label}</label>\n    <select id=\"{name}\" name=\"{name}\">\n",
        name = name,
        label = html_escape(label),
    );
    for option in options {
        let mark = if Some(option.as_str()) == selected { " selected" } else { "" };
        let _ = writeln!(
            out,
            "        <option value=\"{value}\"{mark}>{value}</option>",
            value = html_escape(option),
            mark = mark,
        );
    }
    out.push_str("    </select>\n</div>\n");
    out
}

fn slider(slider: &Slider, value: i64) -> String {
    format!(
        r#"<div class="field">
    <label for="{name}">{label}</label>
    <input type="range" id="{name}" name="{name}" min="{min}" max="{max}" step="1" value="{value}">
    <output for="{name}">{value}</output>
</div>
"#,
        name = slider.name,
        label = html_escape(slider.label),
        min = slider.range.start(),
        max = slider.range.end(),
        value = value,
    )
}

fn outcome_banner(outcome: &PredictionOutcome) -> String {
    let class = if outcome.is_success() { "success" } else { "error" };
    format!(
        "<div class=\"alert {}\">{}</div>\n",
        class,
        html_escape(&outcome.message())
    )
}

/// ML Modeling: prediction form and the last outcome
pub fn machine_learning_modeling(options: &SelectOptions, form: &FormState) -> String {
    let mut fields = String::new();
    fields.push_str(&select(
        "Neighbourhood",
        "neighbourhood",
        &options.neighbourhoods,
        form.neighbourhood.as_deref(),
    ));
    fields.push_str(&select("Stake", "stake", &options.stakes, form.stake.as_deref()));
    fields.push_str(&select(
        "New Route Number/Name",
        "route",
        &options.routes,
        form.route.as_deref(),
    ));
    fields.push_str(&slider(&ROUTES_COMPLETED_SLIDER, form.routes_completed));
    fields.push_str(&slider(&TIME_SPENT_SLIDER, form.time_spent));
    fields.push_str(&slider(&DOORS_IN_ROUTE_SLIDER, form.doors_in_route));

    let banner = form.outcome.as_ref().map(outcome_banner).unwrap_or_default();

    format!(
        r#"<h1>Machine Learning Modeling</h1>
<p>Enter the details to predict donation bags:</p>
<form method="post" action="/predict">
{fields}<button type="submit">Predict</button>
</form>
{banner}<script>{script}</script>"#,
        fields = fields,
        banner = banner,
        script = SLIDER_SCRIPT,
    )
}

/// Data Collection: link to the external form
pub fn data_collection(form_url: &str) -> String {
    format!(
        r#"<h1>Data Collection</h1>
<p>Please fill out the Google form to contribute to our Food Drive!</p>
<p><a href="{url}" target="_blank" rel="noopener">Fill out the form</a></p>"#,
        url = html_escape(form_url),
    )
}
