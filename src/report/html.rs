//! Standalone HTML rendering
//!
//! Wraps the markdown report in a self-contained styled document so it can
//! be opened directly from the output directory. The conversion is a
//! line-oriented scan covering the subset of markdown the report emits:
//! headers, fenced code, inline code, emphasis, lists and tables.

/// Render a complete HTML document around the converted markdown.
pub fn render_document(title: &str, markdown: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Kubernetes Cluster Analysis</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 1200px;
            margin: 0 auto;
            padding: 20px;
            background: #f5f5f5;
        }}
        .container {{
            background: white;
            padding: 40px;
            border-radius: 8px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }}
        h1 {{ color: #2c3e50; border-bottom: 3px solid #3498db; padding-bottom: 10px; }}
        h2 {{ color: #34495e; border-bottom: 2px solid #95a5a6; padding-bottom: 8px; margin-top: 30px; }}
        h3 {{ color: #555; margin-top: 20px; }}
        pre {{
            background: #f8f9fa;
            padding: 15px;
            border-radius: 5px;
            overflow-x: auto;
            border-left: 4px solid #3498db;
        }}
        code {{
            background: #f8f9fa;
            padding: 2px 6px;
            border-radius: 3px;
            font-family: "Courier New", monospace;
        }}
        table {{
            border-collapse: collapse;
            width: 100%;
            margin: 20px 0;
            font-size: 14px;
        }}
        th {{
            background: #3498db;
            color: white;
            padding: 12px;
            text-align: left;
            font-weight: 600;
        }}
        td {{
            padding: 10px 12px;
            border-bottom: 1px solid #ddd;
        }}
        tr:hover {{
            background: #f8f9fa;
        }}
        ul, ol {{
            margin: 10px 0;
            padding-left: 30px;
        }}
        li {{
            margin: 5px 0;
        }}
    </style>
</head>
<body>
    <div class="container">
{body}
    </div>
</body>
</html>"#,
        title = escape(title),
        body = markdown_to_html(markdown)
    )
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Inline markup: code spans first (their content stays literal), then bold.
fn inline_html(line: &str) -> String {
    let mut out = String::new();
    for (i, chunk) in line.split('`').enumerate() {
        if i % 2 == 1 {
            out.push_str("<code>");
            out.push_str(&escape(chunk));
            out.push_str("</code>");
        } else {
            out.push_str(&bold_html(&escape(chunk)));
        }
    }
    out
}

fn bold_html(chunk: &str) -> String {
    let mut out = String::new();
    for (i, part) in chunk.split("**").enumerate() {
        if i % 2 == 1 {
            out.push_str("<strong>");
            out.push_str(part);
            out.push_str("</strong>");
        } else {
            out.push_str(part);
        }
    }
    out
}

/// Line-oriented markdown conversion.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut out = String::new();
    let mut in_code = false;
    let mut in_list = false;
    let mut in_table = false;
    let mut table_header_done = false;

    let close_list = |out: &mut String, in_list: &mut bool| {
        if *in_list {
            out.push_str("</ul>\n");
            *in_list = false;
        }
    };
    let close_table = |out: &mut String, in_table: &mut bool, header_done: &mut bool| {
        if *in_table {
            out.push_str("</table>\n");
            *in_table = false;
            *header_done = false;
        }
    };

    for line in markdown.lines() {
        if line.starts_with("```") {
            if in_code {
                out.push_str("</code></pre>\n");
            } else {
                close_list(&mut out, &mut in_list);
                close_table(&mut out, &mut in_table, &mut table_header_done);
                out.push_str("<pre><code>");
            }
            in_code = !in_code;
            continue;
        }
        if in_code {
            out.push_str(&escape(line));
            out.push('\n');
            continue;
        }

        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("#### ") {
            close_list(&mut out, &mut in_list);
            close_table(&mut out, &mut in_table, &mut table_header_done);
            out.push_str(&format!("<h4>{}</h4>\n", inline_html(rest)));
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("### ") {
            close_list(&mut out, &mut in_list);
            close_table(&mut out, &mut in_table, &mut table_header_done);
            out.push_str(&format!("<h3>{}</h3>\n", inline_html(rest)));
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("## ") {
            close_list(&mut out, &mut in_list);
            close_table(&mut out, &mut in_table, &mut table_header_done);
            out.push_str(&format!("<h2>{}</h2>\n", inline_html(rest)));
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("# ") {
            close_list(&mut out, &mut in_list);
            close_table(&mut out, &mut in_table, &mut table_header_done);
            out.push_str(&format!("<h1>{}</h1>\n", inline_html(rest)));
            continue;
        }

        if trimmed == "---" {
            close_list(&mut out, &mut in_list);
            close_table(&mut out, &mut in_table, &mut table_header_done);
            out.push_str("<hr>\n");
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("- ") {
            close_table(&mut out, &mut in_table, &mut table_header_done);
            if !in_list {
                out.push_str("<ul>\n");
                in_list = true;
            }
            out.push_str(&format!("<li>{}</li>\n", inline_html(rest)));
            continue;
        }

        if trimmed.starts_with('|') {
            close_list(&mut out, &mut in_list);
            // separator row between header and body
            if trimmed.contains("---") {
                continue;
            }
            if !in_table {
                out.push_str("<table>\n");
                in_table = true;
            }
            let cells = trimmed.trim_matches('|').split('|');
            let tag = if table_header_done { "td" } else { "th" };
            out.push_str("<tr>");
            for cell in cells {
                out.push_str(&format!("<{}>{}</{}>", tag, inline_html(cell.trim()), tag));
            }
            out.push_str("</tr>\n");
            table_header_done = true;
            continue;
        }

        close_list(&mut out, &mut in_list);
        close_table(&mut out, &mut in_table, &mut table_header_done);

        if trimmed.is_empty() {
            continue;
        }
        out.push_str(&format!("<p>{}</p>\n", inline_html(trimmed)));
    }

    if in_code {
        out.push_str("</code></pre>\n");
    }
    close_list(&mut out, &mut in_list);
    close_table(&mut out, &mut in_table, &mut table_header_done);

    out
}
