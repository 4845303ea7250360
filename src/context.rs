use crate::{config::Settings, index::VaultIndex, store::TextStore};

/// Everything an engine operation needs from its environment, threaded
/// through every core function instead of living in a global singleton.
/// Constructed once per user action; the index snapshot it carries is
/// read-only and may be slightly stale, which operations tolerate by
/// failing soft on unresolved references.
#[derive(Clone, Copy)]
pub struct EngineContext<'a> {
    pub settings: &'a Settings,
    pub store: &'a dyn TextStore,
    pub index: &'a VaultIndex,
}

impl<'a> EngineContext<'a> {
    pub fn new(settings: &'a Settings, store: &'a dyn TextStore, index: &'a VaultIndex) -> Self {
        EngineContext {
            settings,
            store,
            index,
        }
    }
}
