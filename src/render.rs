//! HTML views for the interactive surface

use axum::response::Html;

use crate::languages::LanguageSet;
use crate::models::{ExtractionResult, Status, StoredRecord};

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; }
.panel { border-radius: 6px; padding: 0.75rem 1rem; margin: 1rem 0; }
.success { background: #e6f4ea; border: 1px solid #34a853; }
.warning { background: #fef7e0; border: 1px solid #f9ab00; }
.error { background: #fce8e6; border: 1px solid #d93025; }
.metrics { display: flex; gap: 3rem; }
.metric .value { font-size: 1.6rem; }
textarea { width: 100%; height: 12rem; }
table { border-collapse: collapse; width: 100%; }
td, th { border-bottom: 1px solid #ddd; padding: 0.3rem; text-align: left; vertical-align: top; }
"#;

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>{STYLE}</style></head><body>\n<h1>Smart OCR Text Extractor</h1>\n{body}\n\
         <p><a href=\"/\">New upload</a> &middot; <a href=\"/history\">History</a></p>\
         </body></html>\n",
        title = escape(title),
    ))
}

/// Upload form: one image, one advanced-processing toggle
pub fn index_page(languages: &LanguageSet, max_file_size: usize) -> Html<String> {
    let names: Vec<String> = languages.iter().map(|l| escape(&l.name)).collect();
    let body = format!(
        r#"<form action="/extract" method="post" enctype="multipart/form-data">
<p><label>Upload an image (PNG, JPEG, BMP; up to {max_mb} MB)<br>
<input type="file" name="file" accept=".png,.jpg,.jpeg,.bmp,image/png,image/jpeg,image/bmp" required></label></p>
<p><label><input type="checkbox" name="advanced" value="true"> Apply advanced image processing</label></p>
<p><button type="submit">Extract text</button></p>
</form>
<p>Detectable languages: {names}</p>"#,
        max_mb = max_file_size / (1024 * 1024),
        names = names.join(", "),
    );
    layout("Upload", &body)
}

/// Success panel with metrics and text, or a warning/error panel with the message
pub fn result_page(result: &ExtractionResult) -> Html<String> {
    let body = match result.status {
        Status::Success => format!(
            r#"<h2>Extraction Results</h2>
<div class="panel success">{message}</div>
<div class="metrics">
<div class="metric"><div>Detected Language</div><div class="value">{language}</div></div>
<div class="metric"><div>Confidence</div><div class="value">{confidence:.2}%</div></div>
</div>
<h3>Extracted Text</h3>
<textarea readonly>{text}</textarea>"#,
            message = escape(&result.message),
            language = escape(&result.language),
            confidence = result.confidence,
            text = escape(&result.text),
        ),
        Status::Warning | Status::Error => format!(
            r#"<h2>Extraction Results</h2>
<div class="panel {class}">{message}</div>"#,
            class = result.status.as_str(),
            message = escape(&result.message),
        ),
    };
    layout("Extraction Results", &body)
}

pub fn history_page(records: &[StoredRecord]) -> Html<String> {
    if records.is_empty() {
        return layout("History", "<h2>History</h2>\n<p>No extractions recorded yet.</p>");
    }

    let rows: String = records
        .iter()
        .map(|r| {
            format!(
                "<tr class=\"{status}\"><td>{id}</td><td>{date}</td><td>{image}</td>\
                 <td>{language}</td><td>{confidence}</td><td>{status}</td><td>{text}</td></tr>\n",
                id = r.id,
                date = r.processed_date.format("%Y-%m-%d %H:%M:%S"),
                image = escape(&r.image_path),
                language = escape(&r.detected_language),
                confidence = r
                    .confidence
                    .map(|c| format!("{:.2}%", c))
                    .unwrap_or_else(|| "-".to_string()),
                status = r.status,
                text = escape(&preview(&r.extracted_text, 120)),
            )
        })
        .collect();

    let body = format!(
        "<h2>History</h2>\n<table>\n<tr><th>#</th><th>Processed</th><th>Image</th>\
         <th>Language</th><th>Confidence</th><th>Status</th><th>Text</th></tr>\n{rows}</table>"
    );
    layout("History", &body)
}

pub fn error_page(message: &str, code: &str) -> Html<String> {
    let body = format!(
        "<div class=\"panel error\">{}<br><small>{}</small></div>",
        escape(message),
        escape(code)
    );
    layout("Error", &body)
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

fn escape(s: &str) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: Status, text: &str, message: &str) -> ExtractionResult {
        ExtractionResult {
            id: Some(1),
            image_path: "a.png".to_string(),
            text: text.to_string(),
            language: "english".to_string(),
            confidence: 91.237,
            status,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_success_panel_shows_metrics_and_text() {
        let Html(page) = result_page(&result(
            Status::Success,
            "a < b",
            "Text extracted successfully in english",
        ));
        assert!(page.contains("class=\"panel success\""));
        assert!(page.contains("91.24%"));
        assert!(page.contains("a &lt; b"));
        assert!(page.contains("english"));
    }

    #[test]
    fn test_warning_panel_hides_metrics() {
        let Html(page) = result_page(&result(
            Status::Warning,
            "",
            "Text extracted with no result in english",
        ));
        assert!(page.contains("class=\"panel warning\""));
        assert!(!page.contains("Confidence"));
    }

    #[test]
    fn test_escape_and_preview() {
        assert_eq!(escape("<b>\"x\" & 'y'</b>"), "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;");
        assert_eq!(preview("abcdef", 3), "abc…");
        assert_eq!(preview("abc", 3), "abc");
    }
}
