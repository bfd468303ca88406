//! Load-time upgrades
//!
//! An upgrade reconciles freshly loaded module state with what the current
//! code expects. Every registered upgrade runs once per load, in
//! registration order, before the document is handed out. Upgrades read
//! `GameData::stored_version()` to decide whether they have work to do.

use super::document::GameData;

pub trait GameDataUpgrade: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn upgrade(&self, data: &mut GameData);
}

impl<F> GameDataUpgrade for F
where
    F: Fn(&mut GameData) + Send + Sync,
{
    fn name(&self) -> &str {
        "closure"
    }

    fn upgrade(&self, data: &mut GameData) {
        self(data)
    }
}
