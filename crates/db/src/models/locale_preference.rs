use tracing::warn;

use crate::slot::{SlotStorage, StorageError};

/// Slot holding the user's chosen language tag.
pub const LOCALE_SLOT: &str = "focus-todo-locale";

/// Raw persisted language tag; validation happens in the locale resolver.
pub struct LocalePreference;

impl LocalePreference {
    /// Returns the stored tag, trimmed, or `None` when absent or unreadable.
    pub fn load(storage: &dyn SlotStorage) -> Option<String> {
        match storage.get(LOCALE_SLOT) {
            Ok(value) => value
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read locale slot");
                None
            }
        }
    }

    pub fn save(storage: &dyn SlotStorage, tag: &str) -> Result<(), StorageError> {
        storage.set(LOCALE_SLOT, tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::MemorySlotStorage;

    #[test]
    fn test_roundtrip_and_blank_handling() {
        let storage = MemorySlotStorage::default();
        assert_eq!(LocalePreference::load(&storage), None);

        LocalePreference::save(&storage, "zh").unwrap();
        assert_eq!(LocalePreference::load(&storage).as_deref(), Some("zh"));

        LocalePreference::save(&storage, "  ").unwrap();
        assert_eq!(LocalePreference::load(&storage), None);
    }
}
