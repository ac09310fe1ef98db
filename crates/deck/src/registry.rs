//! Ownership bookkeeping: which module owns which key, dial and strip area.
//!
//! Tables are built during registration and only read once the coordinator
//! is running. The per-module failed flag is the one exception: it is
//! written while modules initialise, before the render and listener tasks
//! exist, so plain atomics suffice.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use surface::config::{DIAL_COUNT, KEY_COUNT};
use surface::{DialId, KeyId, Point};

use crate::module::{Module, ModuleHandle, Overlay};
use crate::resources::Resources;

/// One registered module and its grant.
pub struct Entry {
    handle: ModuleHandle,
    module: Arc<dyn Module>,
    resources: Resources,
    failed: AtomicBool,
}

impl Entry {
    /// Registration handle.
    pub fn handle(&self) -> ModuleHandle {
        self.handle
    }

    /// The module itself.
    pub fn module(&self) -> &dyn Module {
        self.module.as_ref()
    }

    /// Module id, for logs.
    pub fn id(&self) -> &str {
        self.module.id()
    }

    /// Grant recorded at registration.
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Whether `init` failed for the current connection.
    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    /// The module's overlay, only while it reports itself active.
    fn active_overlay(&self) -> Option<&dyn Overlay> {
        self.module.overlay().filter(|o| o.is_overlay_active())
    }
}

impl Clone for Entry {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle,
            module: Arc::clone(&self.module),
            resources: self.resources.clone(),
            failed: AtomicBool::new(self.is_failed()),
        }
    }
}

/// Registered modules in registration order plus routing tables.
#[derive(Clone, Default)]
pub struct Registry {
    entries: Vec<Entry>,
    key_owners: [Option<ModuleHandle>; KEY_COUNT],
    dial_owners: [Option<ModuleHandle>; DIAL_COUNT],
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a grant and claim its keys and dials.
    ///
    /// A key or dial already owned by an earlier module is taken over by the
    /// new one; the collision is logged, not rejected.
    pub fn register(&mut self, module: Arc<dyn Module>, resources: Resources) -> ModuleHandle {
        let handle = ModuleHandle(self.entries.len());

        for &key in &resources.keys {
            if let Some(prev) = self.key_owners[key.index()].replace(handle) {
                tracing::warn!(
                    %key,
                    previous = self.entries[prev.0].id(),
                    module = module.id(),
                    "key already granted, later registration wins"
                );
            }
        }
        for &dial in &resources.dials {
            if let Some(prev) = self.dial_owners[dial.index()].replace(handle) {
                tracing::warn!(
                    %dial,
                    previous = self.entries[prev.0].id(),
                    module = module.id(),
                    "dial already granted, later registration wins"
                );
            }
        }

        tracing::debug!(
            module = module.id(),
            %handle,
            keys = resources.keys.len(),
            dials = resources.dials.len(),
            strip = resources.has_strip(),
            "module registered"
        );
        self.entries.push(Entry {
            handle,
            module,
            resources,
            failed: AtomicBool::new(false),
        });
        handle
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for `handle`.
    pub fn get(&self, handle: ModuleHandle) -> Option<&Entry> {
        self.entries.get(handle.0)
    }

    /// All entries in registration order, failed ones included.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Non-failed entries in registration order.
    pub fn live(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| !e.is_failed())
    }

    /// Exclude a module for the rest of the connection.
    pub fn mark_failed(&self, handle: ModuleHandle) {
        if let Some(entry) = self.get(handle) {
            entry.failed.store(true, Ordering::Release);
        }
    }

    /// Clear every failed flag before a new connection initialises modules.
    pub fn reset_failures(&self) {
        for entry in &self.entries {
            entry.failed.store(false, Ordering::Release);
        }
    }

    /// Whether `handle` failed to initialise.
    pub fn is_failed(&self, handle: ModuleHandle) -> bool {
        self.get(handle).is_some_and(Entry::is_failed)
    }

    /// Live owner of `key`, `None` if unowned or the owner failed.
    pub fn key_owner(&self, key: KeyId) -> Option<&Entry> {
        self.key_owners[key.index()]
            .and_then(|h| self.get(h))
            .filter(|e| !e.is_failed())
    }

    /// Live owner of `dial`, `None` if unowned or the owner failed.
    pub fn dial_owner(&self, dial: DialId) -> Option<&Entry> {
        self.dial_owners[dial.index()]
            .and_then(|h| self.get(h))
            .filter(|e| !e.is_failed())
    }

    /// Whether `handle` currently holds `key` in the routing table.
    pub fn holds_key(&self, handle: ModuleHandle, key: KeyId) -> bool {
        self.key_owners[key.index()] == Some(handle)
    }

    /// First live module, in registration order, whose overlay is active.
    pub fn active_overlay(&self) -> Option<(&Entry, &dyn Overlay)> {
        self.live()
            .find_map(|e| e.active_overlay().map(|overlay| (e, overlay)))
    }

    /// Module that should receive a strip gesture anchored at `point`.
    ///
    /// The first live module whose rectangle contains the point wins. If no
    /// rectangle contains it, the first live module with any strip area gets
    /// it.
    pub fn strip_target(&self, point: Point) -> Option<&Entry> {
        self.live()
            .find(|e| e.resources.strip_contains(point))
            .or_else(|| self.live().find(|e| e.resources.has_strip()))
    }
}
