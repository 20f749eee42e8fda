//! Pure encoders: a request in, artifact text out.

use std::fmt::Write as _;

use chrono::{NaiveDate, NaiveDateTime};

use abate_common::format::{date_of, time_of};

use crate::error::ExportResult;
use crate::request::ExportRequest;

/// Product name shown at the top of every printable document.
pub const PRODUCT_NAME: &str = "Sistema de Abatedouro";

const FOOTER: &str = "Sistema de Abatedouro - Relatório gerado automaticamente";

const DOCUMENT_STYLE: &str = "\
@media print { @page { margin: 1cm; size: A4; } }
body { font-family: Arial, sans-serif; margin: 0; padding: 20px; color: #333; }
.header { text-align: center; margin-bottom: 30px; border-bottom: 2px solid #dc2626; padding-bottom: 20px; }
.header h1 { color: #dc2626; margin: 0 0 10px 0; font-size: 24px; }
.header h2 { color: #666; margin: 0 0 10px 0; font-size: 18px; font-weight: normal; }
.header .meta { color: #888; font-size: 12px; }
table { width: 100%; border-collapse: collapse; margin-top: 20px; font-size: 12px; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
th { background-color: #f8f9fa; font-weight: bold; color: #333; }
tr:nth-child(even) { background-color: #f9f9f9; }
.summary { margin-bottom: 20px; padding: 15px; background-color: #f8f9fa; border-radius: 5px; }
.summary h3 { margin: 0 0 10px 0; color: #dc2626; }
.footer { margin-top: 30px; text-align: center; font-size: 10px; color: #888; border-top: 1px solid #ddd; padding-top: 10px; }
";

/// Encode the request as CSV.
///
/// The header row carries the labels as they are; every data cell is
/// quoted. Lines are separated by `\n` with no trailing newline.
pub fn encode_csv(request: &ExportRequest) -> ExportResult<String> {
    request.validate()?;

    let mut lines = Vec::with_capacity(request.rows.len() + 1);
    lines.push(
        request
            .columns
            .iter()
            .map(|c| c.label.as_str())
            .collect::<Vec<_>>()
            .join(","),
    );
    for row in &request.rows {
        let cells: Vec<String> = request
            .columns
            .iter()
            .map(|column| quote_csv(&column.resolve(row)))
            .collect();
        lines.push(cells.join(","));
    }
    Ok(lines.join("\n"))
}

fn quote_csv(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

/// Render the request as a self-contained printable HTML document.
///
/// `generated_at` is the local wall-clock time shown in the header.
pub fn render_document(
    request: &ExportRequest,
    generated_at: &NaiveDateTime,
) -> ExportResult<String> {
    request.validate()?;

    let title = escape_html(request.title());
    let mut html = String::with_capacity(4096 + request.rows.len() * request.columns.len() * 32);

    // Writing into a String cannot fail.
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>\n{DOCUMENT_STYLE}</style>\n</head>\n<body>\n"
    );

    let _ = write!(
        html,
        "<div class=\"header\">\n<h1>{PRODUCT_NAME}</h1>\n<h2>{title}</h2>\n"
    );
    if let Some(subtitle) = request.subtitle.as_deref().filter(|s| !s.is_empty()) {
        let _ = writeln!(html, "<p>{}</p>", escape_html(subtitle));
    }
    let _ = write!(
        html,
        "<div class=\"meta\">Gerado em: {} às {}</div>\n</div>\n",
        date_of(generated_at),
        time_of(generated_at)
    );

    let _ = write!(
        html,
        "<div class=\"summary\">\n<h3>Resumo</h3>\n\
         <p>Total de registros: <strong>{}</strong></p>\n</div>\n",
        request.rows.len()
    );

    html.push_str("<table>\n<thead>\n<tr>");
    for column in &request.columns {
        let _ = write!(html, "<th>{}</th>", escape_html(&column.label));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");
    for row in &request.rows {
        html.push_str("<tr>");
        for column in &request.columns {
            let _ = write!(html, "<td>{}</td>", escape_html(&column.resolve(row)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");

    let _ = write!(
        html,
        "<div class=\"footer\">\n<p>{FOOTER}</p>\n</div>\n</body>\n</html>\n"
    );
    Ok(html)
}

/// Neutralize markup-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// `{stem}-{YYYY-MM-DD}.{extension}`
pub fn artifact_filename(stem: &str, date: NaiveDate, extension: &str) -> String {
    format!("{stem}-{}.{extension}", date.format("%Y-%m-%d"))
}
