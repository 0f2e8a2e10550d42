pub mod config;
pub mod locale;
pub mod quote;
pub mod quote_cache;
pub mod quote_poller;
pub mod task_list;
