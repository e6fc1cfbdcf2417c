use crate::error::{ReportError, Result};
use crate::view::{AlertsView, DataTable, MetricCard, NarrativeSection, ReportView};
use apmon_common::types::HealthStatus;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

const TEMPLATE: &str = include_str!("templates/report.html");

/// HTML report renderer.
pub struct ReportRenderer;

impl ReportRenderer {
    /// Binds `view` into the embedded template.
    pub fn render(view: &ReportView) -> Result<String> {
        let health_class = match view.health {
            HealthStatus::Healthy => "is-ok",
            HealthStatus::Warning => "is-warn",
            HealthStatus::Critical => "is-danger",
        };

        fill(TEMPLATE, |key| {
            Some(match key {
                "application" => view.application.clone(),
                "generated_at" => view.generated_at.clone(),
                "window_days" => view.window_days.to_string(),
                "health_class" => health_class.to_string(),
                "health_label" => view.health.as_str().to_uppercase(),
                "warnings" => warnings_html(&view.warnings),
                "metric_cards" => metric_cards_html(&view.metrics),
                "alerts" => alerts_html(&view.alerts),
                "narratives" => narratives_html(&view.narratives),
                "data_tables" => view.tables.iter().map(table_html).collect(),
                _ => return None,
            })
        })
    }
}

/// Single-pass `{{key}}` substitution. Substituted text is never rescanned.
fn fill<F>(template: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| ReportError::Template(after.chars().take(20).collect()))?;
        let key = after[..end].trim();
        let value = lookup(key).ok_or_else(|| ReportError::Template(key.to_string()))?;
        out.push_str(&value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

fn warnings_html(warnings: &[String]) -> String {
    warnings
        .iter()
        .map(|w| format!("<div class=\"notice is-warn\">{w}</div>"))
        .collect()
}

fn metric_cards_html(cards: &[MetricCard]) -> String {
    cards
        .iter()
        .map(|c| {
            format!(
                "<div class=\"card\"><div class=\"card-label\">{}</div>\
                 <div class=\"card-value\">{}</div>\
                 <div class=\"card-detail\">{}</div></div>",
                c.label,
                c.value,
                html_escape(&c.detail)
            )
        })
        .collect()
}

fn alerts_html(alerts: &AlertsView) -> String {
    let mut html = format!("<p class=\"summary\">{}</p>", html_escape(&alerts.summary));
    if alerts.rows.is_empty() {
        return html;
    }

    html.push_str(
        "<table><thead><tr><th>Name</th><th>Status</th><th>Monitoring schedule</th>\
         <th>Severity</th><th>Description</th></tr></thead><tbody>",
    );
    for row in &alerts.rows {
        html.push_str(&format!(
            "<tr><td><code>{name}</code></td>\
             <td><span class=\"badge {class}\">{status}</span></td>\
             <td>{schedule}</td><td>{severity}</td><td>{description}</td></tr>",
            name = row.name,
            class = row.status_class,
            status = row.status,
            schedule = row.schedule,
            severity = row.severity,
            description = row.description,
        ));
    }
    html.push_str("</tbody></table>");
    html
}

fn narratives_html(sections: &[NarrativeSection]) -> String {
    sections
        .iter()
        .map(|s| {
            format!(
                "<section class=\"narrative\"><h3>{}</h3><div class=\"markdown\">{}</div></section>",
                s.title, s.html
            )
        })
        .collect()
}

fn table_html(table: &DataTable) -> String {
    let mut html = format!("<h3>{}</h3>", table.title);
    if table.total == 0 {
        html.push_str("<p class=\"empty\">No data for this window.</p>");
        return html;
    }
    if table.is_truncated() {
        html.push_str(&format!(
            "<p class=\"note\">Showing {} of {} rows.</p>",
            table.rows.len(),
            table.total
        ));
    }

    html.push_str("<table><thead><tr>");
    for header in table.headers {
        html.push_str(&format!("<th>{header}</th>"));
    }
    html.push_str("</tr></thead><tbody>");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{cell}</td>"));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

/// Converts model-written markdown to HTML.
///
/// Raw HTML in the input is emitted as escaped text and links with
/// script-capable schemes are neutralised.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let scheme = url.trim_start().to_ascii_lowercase();
    if ["javascript:", "vbscript:", "data:"]
        .iter()
        .any(|s| scheme.starts_with(s))
    {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_headings_and_tables() {
        let html = markdown_to_html("## Findings\n\nLatency is **high**.\n\n| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<h2>Findings</h2>"));
        assert!(html.contains("<strong>high</strong>"));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn raw_html_in_markdown_is_escaped() {
        let html = markdown_to_html("Hello <script>alert(1)</script>\n\n<div onclick=\"x\">block</div>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<div onclick"));
    }

    #[test]
    fn script_links_are_neutralised() {
        let html = markdown_to_html("[click](javascript:alert(1)) and [docs](https://learn.microsoft.com)");
        assert!(!html.contains("javascript:"));
        assert!(html.contains("href=\"#\""));
        assert!(html.contains("href=\"https://learn.microsoft.com\""));
    }

    #[test]
    fn fill_does_not_rescan_substituted_text() {
        let out = fill("<p>{{a}}</p><p>{{ b }}</p>", |key| match key {
            "a" => Some("{{b}}".to_string()),
            "b" => Some("two".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(out, "<p>{{b}}</p><p>two</p>");
    }

    #[test]
    fn fill_rejects_unknown_placeholder() {
        let err = fill("{{missing}}", |_| None).unwrap_err();
        assert!(matches!(err, ReportError::Template(key) if key == "missing"));
    }

    #[test]
    fn escape_covers_attribute_quotes() {
        assert_eq!(
            html_escape("<a href=\"x\">Tom's & Jerry</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom&#39;s &amp; Jerry&lt;/a&gt;"
        );
    }
}
