use serde_json::Value;

use crate::rows::Record;

/// Renders uniform records as comma-separated text.
///
/// The header comes from the first record's keys; later records are read with
/// the same column order. Every line, header included, ends with `\n`. No
/// records means no output at all.
pub fn to_csv(rows: &[Record]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };
    let columns: Vec<&String> = first.keys().collect();

    let mut out = String::new();
    push_line(&mut out, columns.iter().map(|c| escape_field(c)));
    for row in rows {
        push_line(
            &mut out,
            columns
                .iter()
                .map(|c| escape_field(&render_value(row.get(c.as_str())))),
        );
    }
    out
}

pub fn escape_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

fn push_line(out: &mut String, fields: impl Iterator<Item = String>) {
    let line = fields.collect::<Vec<_>>().join(",");
    out.push_str(&line);
    out.push('\n');
}
