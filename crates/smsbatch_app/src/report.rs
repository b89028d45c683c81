use std::fmt::Write;

use smsbatch_core::{BatchViewModel, ItemStatus, SendItem};
use smsbatch_engine::TemplateSummary;

pub fn progress_line(view: &BatchViewModel) -> String {
    let state = if view.running { "Running" } else { "Idle" };
    let current = view
        .cursor
        .map(|index| format!(" | Sending #{}", index + 1))
        .unwrap_or_default();
    format!(
        "{} | Items: {} | Sent: {} | Failed: {} | Left: {}{}",
        state, view.item_count, view.finished_count, view.error_count, view.pending_count, current
    )
}

pub fn render_batch(view: &BatchViewModel) -> String {
    let mut out = String::new();
    for row in &view.rows {
        let status = match row.status {
            ItemStatus::Pending => "pending",
            ItemStatus::Loading => "sending",
            ItemStatus::Finished => "sent",
            ItemStatus::Error => "failed",
        };
        let when = row.send_time.as_deref().unwrap_or("now");
        let _ = write!(
            out,
            "#{:<4} {:<8} {:<19} {}",
            row.index + 1,
            status,
            when,
            row.destinations.join(",")
        );
        if let Some(error) = &row.last_error {
            let _ = write!(out, "  ({error})");
        }
        out.push('\n');
    }
    out.push_str(&progress_line(view));
    out.push('\n');
    out
}

pub fn render_parsed(items: &[SendItem]) -> String {
    let mut out = String::new();
    for (index, item) in items.iter().enumerate() {
        let fields = item
            .field_values
            .iter()
            .map(|field| format!("{}={}", field.name, field.value))
            .collect::<Vec<_>>()
            .join(" ");
        let retries = item
            .max_retries
            .map(|n| format!(" retries={n}"))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "#{:<4} {:<19} {} [{}]{}",
            index + 1,
            item.send_time_literal().as_deref().unwrap_or("now"),
            item.destinations.join(","),
            fields,
            retries
        );
    }
    let destinations: usize = items.iter().map(|item| item.destinations.len()).sum();
    let _ = writeln!(
        out,
        "{} records, {} destinations",
        items.len(),
        destinations
    );
    out
}

pub fn render_templates(templates: &[TemplateSummary]) -> String {
    if templates.is_empty() {
        return "No templates.\n".to_string();
    }
    let mut out = String::new();
    for template in templates {
        let _ = writeln!(out, "{:<8} {:<24} {}", template.id, template.tpl_id, template.name);
    }
    out
}
