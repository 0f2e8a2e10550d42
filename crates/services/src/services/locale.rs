//! Language selection and the static string tables.

use db::{DBService, models::locale_preference::LocalePreference};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};
use tracing::warn;

use super::task_list::TaskFilter;

/// The two supported interface languages.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Locale {
    Zh,
    #[default]
    En,
}

impl Locale {
    pub fn tag(self) -> &'static str {
        self.into()
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Zh => Self::En,
            Self::En => Self::Zh,
        }
    }

    /// Picks the active language.
    ///
    /// A valid persisted tag wins; otherwise a `zh*` environment hint selects
    /// Chinese; everything else falls back to English.
    pub fn resolve(persisted: Option<&str>, env_hint: Option<&str>) -> Self {
        match persisted {
            Some("zh") => return Self::Zh,
            Some("en") => return Self::En,
            _ => {}
        }
        match env_hint {
            Some(hint) if hint.trim().to_ascii_lowercase().starts_with("zh") => Self::Zh,
            _ => Self::default(),
        }
    }

    /// Resolves from the locale slot and the process environment.
    pub fn load(db: &DBService) -> Self {
        let persisted = LocalePreference::load(db.storage.as_ref());
        Self::resolve(persisted.as_deref(), env_language_hint().as_deref())
    }

    pub fn save(self, db: &DBService) {
        if let Err(e) = LocalePreference::save(db.storage.as_ref(), self.tag()) {
            warn!(error = %e, locale = self.tag(), "Failed to persist locale");
        }
    }

    pub fn strings(self) -> &'static Translations {
        match self {
            Self::Zh => &ZH,
            Self::En => &EN,
        }
    }
}

/// First non-empty value of `LC_ALL`, `LC_MESSAGES`, `LANG`.
pub fn env_language_hint() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .into_iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

/// Per-language labels for the list and quote views.
#[derive(Debug)]
pub struct Translations {
    pub brand: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub input_placeholder: &'static str,
    pub add: &'static str,
    stats_prefix: &'static str,
    pub filter_all: &'static str,
    pub filter_active: &'static str,
    pub filter_completed: &'static str,
    pub clear_completed: &'static str,
    pub empty: &'static str,
    pub remove: &'static str,
    pub footer: &'static str,
    /// Label of the control that switches to the *other* language.
    pub language: &'static str,
    pub quote_label: &'static str,
    pub quote_loading: &'static str,
    pub quote_error: &'static str,
}

impl Translations {
    pub fn stats(&self, completed: usize, total: usize) -> String {
        format!("{} {completed} / {total}", self.stats_prefix)
    }

    pub fn filter_label(&self, filter: TaskFilter) -> &'static str {
        match filter {
            TaskFilter::All => self.filter_all,
            TaskFilter::Active => self.filter_active,
            TaskFilter::Completed => self.filter_completed,
        }
    }
}

static ZH: Translations = Translations {
    brand: "Focus Todo",
    title: "今天要完成哪些事？",
    subtitle: "轻量、清爽、专注的待办清单。所有数据保存在本地。",
    input_placeholder: "写下下一件要做的事…",
    add: "添加任务",
    stats_prefix: "已完成",
    filter_all: "全部",
    filter_active: "进行中",
    filter_completed: "已完成",
    clear_completed: "清除已完成",
    empty: "还没有任务，先写下一个吧。",
    remove: "删除",
    footer: "本地存储 · 无需登录 · 现代极简",
    language: "EN",
    quote_label: "黄金现价",
    quote_loading: "获取中…",
    quote_error: "获取失败",
};

static EN: Translations = Translations {
    brand: "Focus Todo",
    title: "What do you want to finish today?",
    subtitle: "A clean, focused todo list. Everything stays on this machine.",
    input_placeholder: "Write your next task…",
    add: "Add Task",
    stats_prefix: "Completed",
    filter_all: "All",
    filter_active: "Active",
    filter_completed: "Done",
    clear_completed: "Clear Completed",
    empty: "No tasks yet. Add your first one.",
    remove: "Remove",
    footer: "Local storage · No login · Minimal & modern",
    language: "中文",
    quote_label: "Gold",
    quote_loading: "Loading…",
    quote_error: "Unavailable",
};
