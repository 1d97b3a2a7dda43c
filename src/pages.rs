//! HTML for the form page and the predictions table.

use std::fmt::Write;

use crate::prediction_log::LogTable;

pub const NO_PREDICTIONS: &str = "No predictions yet";

/// Escape HTML special characters
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const STYLE: &str = "body{font-family:sans-serif;max-width:760px;margin:2em auto}\
label{display:block;margin-top:.6em}\
.prediction{color:#14532d;background:#dcfce7;padding:.8em}\
.error{color:#7f1d1d;background:#fee2e2;padding:.8em}\
table.table{border-collapse:collapse}\
table.table td,table.table th{border:1px solid #ccc;padding:.3em .6em}";

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>\n{body}</body>\n</html>\n"
    )
}

fn time_options() -> String {
    ["morning", "afternoon", "evening"]
        .iter()
        .map(|v| {
            let mut label = v.to_string();
            label[..1].make_ascii_uppercase();
            format!("<option value=\"{v}\">{label}</option>")
        })
        .collect()
}

/// The input form, with at most one of `prediction` / `error` shown above it.
pub fn index(prediction: Option<&str>, error: Option<&str>) -> String {
    let mut body = String::new();
    if let Some(p) = prediction {
        let _ = writeln!(body, "<p class=\"prediction\">{}</p>", escape_html(p));
    }
    if let Some(e) = error {
        let _ = writeln!(body, "<p class=\"error\">{}</p>", escape_html(e));
    }
    let _ = write!(
        body,
        "<form method=\"post\" action=\"/\">\n\
         <label>Month <input name=\"month\" type=\"number\" min=\"1\" max=\"12\"></label>\n\
         <label>Day <input name=\"day\" type=\"number\" min=\"1\" max=\"31\"></label>\n\
         <label>Year <input name=\"year\" type=\"number\" min=\"2000\" max=\"2100\"></label>\n\
         <label>Time of day <select name=\"time_of_day\">{}</select></label>\n\
         <label>Temperature (°C) <input name=\"temperature\" type=\"number\" step=\"any\" min=\"-50\" max=\"60\"></label>\n\
         <label>Weather <input name=\"weather\" placeholder=\"Sunny\"></label>\n\
         <label>Holiday <input name=\"holiday\" placeholder=\"Regular Day\"></label>\n\
         <label>University event <input name=\"university_event\" placeholder=\"Regular Day\"></label>\n\
         <p><button type=\"submit\">Predict</button></p>\n\
         </form>\n\
         <p><a href=\"/view_predictions\">View predictions</a> | \
         <a href=\"/download_predictions\">Download predictions</a></p>\n",
        time_options()
    );
    page("Iced Coffee Demand Prediction", &body)
}

pub fn table(table: &LogTable) -> String {
    let mut out = String::from("<table border=\"1\" class=\"dataframe table\">\n<thead>\n<tr>");
    for h in &table.headers {
        let _ = write!(out, "<th>{}</th>", escape_html(h));
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", escape_html(cell));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

/// The log as a table, or a placeholder when there is nothing to show.
pub fn predictions(log: Option<&LogTable>) -> String {
    let body = match log {
        Some(t) if !t.rows.is_empty() => table(t),
        _ => format!("<p>{}</p>\n", NO_PREDICTIONS),
    };
    let body = format!(
        "{}<p><a href=\"/\">Back</a> | <a href=\"/download_predictions\">Download CSV</a></p>\n",
        body
    );
    page("Predictions", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_user_text() {
        let html = index(None, Some("<script>alert('x')</script>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn form_lists_time_of_day_options() {
        let html = index(Some("Predicted iced coffee demand: 1.00 cups"), None);
        assert!(html.contains("<option value=\"afternoon\">Afternoon</option>"));
        assert!(html.contains("class=\"prediction\""));
        assert!(!html.contains("class=\"error\""));
    }

    #[test]
    fn empty_log_shows_placeholder() {
        let empty = LogTable {
            headers: vec!["Timestamp".into()],
            rows: vec![],
        };
        assert!(predictions(Some(&empty)).contains("<p>No predictions yet</p>"));
        assert!(predictions(None).contains("<p>No predictions yet</p>"));

        let one = LogTable {
            headers: vec!["Weather_Condition".into()],
            rows: vec![vec!["Hot & humid".into()]],
        };
        let html = predictions(Some(&one));
        assert!(html.contains("<th>Weather_Condition</th>"));
        assert!(html.contains("<td>Hot &amp; humid</td>"));
    }
}
