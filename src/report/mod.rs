//! Self-contained HTML rendering of the two views.

use crate::models::{LinkedRecord, MajorIndexView, MoverView, Report};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use chrono_tz::US::Eastern;
use std::fmt::Write;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const COLUMNS: [&str; 6] = ["Symbol", "Name", "Price", "Change", "Change %", "Link"];

const STYLE: &str = "\
table {
    border-collapse: collapse;
    width: 100%;
    margin-bottom: 20px;
}
th, td {
    border: 1px solid #dddddd;
    padding: 8px;
    text-align: left;
}
th {
    background-color: #f2f2f2;
}";

/// Current wall-clock time in US Eastern, whatever the host zone.
pub fn eastern_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&Eastern)
}

/// `YYYY-MM-DD HH:MM:SS` in Eastern time.
pub fn format_timestamp(ts: &DateTime<Tz>) -> String {
    ts.with_timezone(&Eastern).format(TIMESTAMP_FORMAT).to_string()
}

pub fn escape_html(s: &str) -> String {
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

fn write_table(html: &mut String, rows: &[LinkedRecord]) {
    html.push_str("<table>\n<thead>\n<tr>");
    for col in COLUMNS {
        let _ = write!(html, "<th>{}</th>", col);
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in rows {
        let r = &row.record;
        html.push_str("<tr>");
        for cell in [&r.symbol, &r.name, &r.price, &r.change, &r.change_percent] {
            let _ = write!(html, "<td>{}</td>", escape_html(cell));
        }
        let link = escape_html(&row.link);
        let _ = write!(html, "<td><a href=\"{link}\">{link}</a></td>");
        html.push_str("</tr>\n");
    }

    html.push_str("</tbody>\n</table>\n");
}

/// Render both views into one HTML document. Pure: the same inputs always
/// give the same bytes.
pub fn render(generated_at: &DateTime<Tz>, majors: &MajorIndexView, movers: &MoverView) -> String {
    let ts = format_timestamp(generated_at);
    let mut html = String::with_capacity(4096);

    html.push_str("<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>World Indices Report - {}</title>", ts);
    let _ = writeln!(html, "<style>\n{}\n</style>", STYLE);
    html.push_str("</head>\n<body>\n<h1>World Indices Report</h1>\n");
    let _ = writeln!(html, "<p>Date and Time (Eastern): {}</p>", ts);

    let _ = writeln!(
        html,
        "<h2>USA Major Indices ({})</h2>",
        escape_html(&majors.symbols.join(", "))
    );
    write_table(&mut html, &majors.rows);

    let _ = writeln!(
        html,
        "<h2>Indices On The Move ({})</h2>",
        escape_html(&format!(
            "> {:?}% or < {:?}%",
            movers.upper_threshold, movers.lower_threshold
        ))
    );
    write_table(&mut html, &movers.rows);

    html.push_str("</body>\n</html>\n");
    html
}

impl Report {
    pub fn build(generated_at: DateTime<Tz>, majors: &MajorIndexView, movers: &MoverView) -> Self {
        let html = render(&generated_at, majors, movers);
        Self { generated_at, html }
    }

    pub fn timestamp(&self) -> String {
        format_timestamp(&self.generated_at)
    }
}
