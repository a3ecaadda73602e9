use lazy_static::lazy_static;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::collections::HashMap;

// Process-wide record of which maps currently have an active measurement tool.
//
// Only one tool should own a map's double-click-zoom toggle at a time. This is
// a usage constraint: the registry reports contention, it does not refuse it.
pub struct ModuleState {
    // map id -> number of active tools bound to it
    pub active_tools: HashMap<String, usize>,
}

lazy_static! {
    static ref MODULE_STATE: ReentrantMutex<RefCell<ModuleState>> =
        ReentrantMutex::new(RefCell::new(ModuleState::new()));
}

impl ModuleState {
    pub fn new() -> Self {
        ModuleState {
            active_tools: HashMap::new(),
        }
    }

    pub fn with_mut<F, R>(f: F) -> R
    where
        F: FnOnce(&mut ModuleState) -> R,
    {
        let guard = MODULE_STATE.lock();
        let mut borrow = guard.borrow_mut();
        f(&mut borrow)
    }

    #[cfg(test)]
    pub fn with<F, R>(f: F) -> R
    where
        F: FnOnce(&ModuleState) -> R,
    {
        let guard = MODULE_STATE.lock();
        let borrow = guard.borrow();
        f(&borrow)
    }

    /// Record an activation, returning how many tools were already active on the map.
    pub fn claim_map(&mut self, map_id: &str) -> usize {
        let count = self.active_tools.entry(map_id.to_string()).or_insert(0);
        let previous = *count;
        *count += 1;
        previous
    }

    pub fn release_map(&mut self, map_id: &str) {
        if let Some(count) = self.active_tools.get_mut(map_id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.active_tools.remove(map_id);
            }
        }
    }

    #[cfg(test)]
    pub fn active_tool_count(&self, map_id: &str) -> usize {
        self.active_tools.get(map_id).copied().unwrap_or(0)
    }
}
