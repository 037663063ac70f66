//! HTML rendering of the landing and results pages.
//!
//! JSON responses serialize [`Page`] directly; this module only covers the
//! human-facing envelope.

use crate::models::columns;
use crate::query::QuerySpec;
use crate::shaper::Page;
use reqwest::Url;

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
table{border-collapse:collapse;font-size:0.85em}\
th,td{border:1px solid #ccc;padding:4px 6px;text-align:left;vertical-align:top}\
th{background:#f3f3f3}nav a{margin-right:1em}";

/// Escapes text for use in element content and quoted attributes.
pub fn escape(text: &str) -> String {
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

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        title = escape(title),
    )
}

/// Link to `route` with `spec` moved to `page`.
fn page_link(route: &str, spec: &QuerySpec, page: usize) -> Option<String> {
    let base = format!("http://localhost{route}");
    let url = Url::parse_with_params(&base, spec.to_pairs(page)).ok()?;
    Some(format!("{}?{}", url.path(), url.query().unwrap_or_default()))
}

/// Neighbouring page numbers, clamped to `1..=total_pages`.
pub fn nav_pages(page: usize, total_pages: usize) -> (usize, usize) {
    let prev = page.saturating_sub(1).max(1);
    let next = page.saturating_add(1).min(total_pages.max(1));
    (prev, next)
}

/// Renders the landing page with a search form.
pub fn index_page(spec: &QuerySpec) -> String {
    let input = |name: &str, label: &str, value: &str| {
        format!(
            "<label>{label} <input name=\"{name}\" value=\"{}\"></label>\n",
            escape(value)
        )
    };

    let mut body = String::from("<h1>Property listings</h1>\n<form action=\"/search\" method=\"get\">\n");
    body.push_str(&input("location", "Location", &spec.search.location));
    body.push_str(&input("listing_type", "Listing type", &spec.search.listing_type));
    body.push_str(&input("past_days", "Past days", &spec.search.past_days.to_string()));
    body.push_str(&input("query", "Search", ""));
    body.push_str(&input("filter_by", "Filter field", ""));
    body.push_str(&input("filter_value", "Filter value", ""));
    body.push_str(&input("sort_by", "Sort by", ""));
    body.push_str(
        "<select name=\"order\"><option value=\"asc\">asc</option>\
         <option value=\"desc\">desc</option></select>\n",
    );
    body.push_str(&input("per_page", "Per page", &spec.per_page.to_string()));
    body.push_str("<input type=\"hidden\" name=\"format\" value=\"html\">\n");
    body.push_str("<button type=\"submit\">Search</button>\n</form>\n");
    body.push_str("<p><a href=\"/scrape?format=html\">Latest listings</a> | ");
    body.push_str("<a href=\"/download\">Download spreadsheet</a></p>\n");

    document("Property listings", &body)
}

/// Renders one page of results for `route`.
pub fn results_page(route: &str, spec: &QuerySpec, page: &Page) -> String {
    let mut body = String::new();
    body.push_str(&format!("<h1>Listings for {}</h1>\n", escape(&spec.search.location)));
    body.push_str(&format!(
        "<p id=\"summary\">Page {} of {} ({} properties)</p>\n",
        page.page, page.total_pages, page.total_properties
    ));

    let names = columns(&page.properties);
    if page.properties.is_empty() {
        body.push_str("<p>No properties found.</p>\n");
    } else {
        body.push_str("<table>\n<thead><tr>");
        for name in &names {
            body.push_str(&format!("<th>{}</th>", escape(name)));
        }
        body.push_str("</tr></thead>\n<tbody>\n");
        for property in &page.properties {
            body.push_str("<tr>");
            for name in &names {
                let cell = property.get(name).map(|v| v.to_string()).unwrap_or_default();
                body.push_str(&format!("<td>{}</td>", escape(&cell)));
            }
            body.push_str("</tr>\n");
        }
        body.push_str("</tbody>\n</table>\n");
    }

    let (prev, next) = nav_pages(page.page, page.total_pages);
    body.push_str("<nav>\n<a href=\"/\">Home</a>\n");
    if let Some(href) = page_link(route, spec, prev) {
        body.push_str(&format!("<a rel=\"prev\" href=\"{}\">Previous</a>\n", escape(&href)));
    }
    if let Some(href) = page_link(route, spec, next) {
        body.push_str(&format!("<a rel=\"next\" href=\"{}\">Next</a>\n", escape(&href)));
    }
    body.push_str("</nav>\n");

    document("Property listings", &body)
}
