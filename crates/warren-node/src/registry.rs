//! Maps a message type to the service that owns it.

use std::collections::HashMap;
use std::sync::Arc;

use warren_services::Service;

#[derive(Default)]
pub struct ServiceRegistry {
    by_type: HashMap<u16, Arc<dyn Service>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, service: Arc<dyn Service>) {
        for &t in service.handles() {
            self.by_type.insert(t, service.clone());
        }
    }

    pub fn get(&self, msg_type: u16) -> Option<Arc<dyn Service>> {
        self.by_type.get(&msg_type).cloned()
    }
}
