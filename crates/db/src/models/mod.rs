pub mod locale_preference;
pub mod task;
