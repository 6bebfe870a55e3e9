//! Human-readable rendering of a completed requirement record.

use std::fmt::Write as _;

use elicit::{FieldId, FieldValue, RequirementRecord};

use super::terminal::{Colorize, is_narrow};

/// Renders every field of `record` under its label, in interview order.
pub fn render(record: &RequirementRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Requirement summary".info());

    let mut in_details = false;
    for field in FieldId::ALL {
        if field.is_development_detail() && !in_details {
            let _ = writeln!(out, "{}", "Development details".dim());
            in_details = true;
        }
        let indent = if field.is_development_detail() { "    " } else { "  " };
        let label = capitalise(field.label());

        match record.get(field) {
            None => {
                let _ = writeln!(out, "{indent}{label}: {}", "(not given)".warning());
            }
            Some(FieldValue::Metrics(items)) => bullets(&mut out, indent, &label, items.iter()),
            Some(FieldValue::List(items)) => bullets(&mut out, indent, &label, items.iter()),
            Some(FieldValue::Text(text)) if is_narrow() => {
                let _ = writeln!(out, "{indent}{label}:\n{indent}  {text}");
            }
            Some(FieldValue::Text(text)) => {
                let _ = writeln!(out, "{indent}{label}: {text}");
            }
            Some(value) => {
                let _ = writeln!(out, "{indent}{label}: {value}");
            }
        }
    }

    out
}

fn bullets<'a>(
    out: &mut String,
    indent: &str,
    label: &str,
    items: impl Iterator<Item = &'a String>,
) {
    let _ = writeln!(out, "{indent}{label}:");
    for item in items {
        let _ = writeln!(out, "{indent}  • {item}");
    }
}

fn capitalise(label: &str) -> String {
    let mut chars = label.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
