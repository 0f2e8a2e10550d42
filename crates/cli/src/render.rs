//! Plain-text rendering of the list view and the price badge.

use std::fmt::Write;

use services::services::{
    locale::Translations,
    quote_poller::{QuoteDisplay, QuoteSnapshot},
    task_list::{TaskFilter, TaskListStore},
};
use strum::IntoEnumIterator;

/// Length of the id prefix shown next to each task.
pub const SHORT_ID_LEN: usize = 8;

pub fn quote_badge(strings: &Translations, snapshot: &QuoteSnapshot) -> String {
    let value = match snapshot.display() {
        QuoteDisplay::Available(quote) => format!("${:.2} {}", quote.price, quote.currency),
        QuoteDisplay::Unavailable => strings.quote_error.to_string(),
        QuoteDisplay::Loading => strings.quote_loading.to_string(),
    };
    format!("{}: {}", strings.quote_label, value)
}

pub fn filter_bar(strings: &Translations, active: TaskFilter) -> String {
    TaskFilter::iter()
        .map(|filter| {
            let label = strings.filter_label(filter);
            if filter == active {
                format!("[{label}]")
            } else {
                format!(" {label} ")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn task_list(strings: &Translations, store: &TaskListStore, filter: TaskFilter) -> String {
    let mut out = String::new();
    let stats = store.stats();
    let _ = writeln!(
        out,
        "{}    {}",
        strings.stats(stats.completed, stats.total),
        filter_bar(strings, filter)
    );
    let _ = writeln!(out);

    let tasks = store.filtered_view(filter);
    if tasks.is_empty() {
        let _ = writeln!(out, "  {}", strings.empty);
    }
    for task in tasks {
        let mark = if task.completed { 'x' } else { ' ' };
        let id: String = task.id.chars().take(SHORT_ID_LEN).collect();
        let _ = writeln!(out, "  [{mark}] {}  ({id})", task.title);
    }
    out
}

/// Full screen: header with brand, price badge and language switch, then the list.
pub fn screen(
    strings: &Translations,
    store: &TaskListStore,
    filter: TaskFilter,
    snapshot: Option<&QuoteSnapshot>,
) -> String {
    let mut out = String::new();
    let _ = write!(out, "● {}", strings.brand);
    if let Some(snapshot) = snapshot {
        let _ = write!(out, "  ·  {}", quote_badge(strings, snapshot));
    }
    let _ = writeln!(out, "  ·  lang: {}", strings.language);
    let _ = writeln!(out, "{}", strings.title);
    let _ = writeln!(out, "{}", strings.subtitle);
    let _ = writeln!(out);
    out.push_str(&task_list(strings, store, filter));
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", strings.footer);
    out
}
