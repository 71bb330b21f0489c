use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::component::Shared;
use crate::error::{ConductorError, Result};
use crate::registry::CapabilityVtable;

/// Type-erased carrier of one constructed controller instance.
pub struct ControllerCell {
    name: &'static str,
    type_id: TypeId,
    instance: Box<dyn Any>,
}

impl ControllerCell {
    pub fn of<C: 'static>(controller: C) -> Self {
        let shared: Shared<C> = Rc::new(RefCell::new(controller));
        Self {
            name: std::any::type_name::<C>(),
            type_id: TypeId::of::<C>(),
            instance: Box::new(shared),
        }
    }

    /// Type name of the carried controller.
    pub fn controller(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[doc(hidden)]
    pub fn __concrete<C: 'static>(&self) -> Shared<C> {
        self.instance
            .downcast_ref::<Shared<C>>()
            .expect("controller cell holds a different concrete type")
            .clone()
    }
}

impl fmt::Debug for ControllerCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ControllerCell({})", self.name)
    }
}

struct RegistryEntry {
    controller: &'static str,
    handle: Box<dyn Any>,
}

impl RegistryEntry {
    fn resolve<C: ?Sized + 'static>(&self) -> Shared<C> {
        self.handle
            .downcast_ref::<Shared<C>>()
            .expect("registry entry holds a different capability")
            .clone()
    }
}

/// Capability registry: one bucket per capability, each holding the
/// implementing instances in construction order. Effectively read-only
/// once the construction stage completes.
#[derive(Default)]
pub struct ControllerHolder {
    buckets: HashMap<TypeId, SmallVec<[RegistryEntry; 2]>>,
}

impl ControllerHolder {
    /// Add an instance under every capability its registration declares.
    pub(crate) fn register(&mut self, cell: &ControllerCell, capabilities: &[CapabilityVtable]) {
        for capability in capabilities {
            let entry = RegistryEntry {
                controller: cell.controller(),
                handle: (capability.cast)(cell),
            };
            self.buckets.entry((capability.id)()).or_default().push(entry);
        }
    }

    pub(crate) fn contains(&self, capability: TypeId) -> bool {
        self.buckets.contains_key(&capability)
    }

    /// First registered instance, without the lookup-miss diagnostic.
    pub(crate) fn first<C: ?Sized + 'static>(&self) -> Option<Shared<C>> {
        self.buckets
            .get(&TypeId::of::<C>())
            .and_then(|bucket| bucket.first())
            .map(RegistryEntry::resolve)
    }

    pub(crate) fn all_of<C: ?Sized + 'static>(&self) -> Vec<Shared<C>> {
        self.buckets
            .get(&TypeId::of::<C>())
            .map(|bucket| bucket.iter().map(RegistryEntry::resolve).collect())
            .unwrap_or_default()
    }

    /// Ordered (controller name, instance) pairs for a capability; used
    /// for the lifecycle snapshots.
    pub(crate) fn entries<C: ?Sized + 'static>(&self) -> Vec<(&'static str, Shared<C>)> {
        self.buckets
            .get(&TypeId::of::<C>())
            .map(|bucket| {
                bucket
                    .iter()
                    .map(|entry| (entry.controller, entry.resolve()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First registered instance of a capability.
    ///
    /// A miss is non-fatal: it is reported as a diagnostic and returned as
    /// [`ConductorError::NotFound`] for the caller to handle.
    pub fn get<C: ?Sized + 'static>(&self) -> Result<Shared<C>> {
        self.first::<C>().ok_or_else(|| {
            tracing::error!(
                capability = std::any::type_name::<C>(),
                "controller wasn't found"
            );
            ConductorError::NotFound {
                capability: std::any::type_name::<C>(),
            }
        })
    }

    /// Every registered instance of a capability, in registration order.
    /// Empty when none registered (reported as a diagnostic only).
    pub fn get_all<C: ?Sized + 'static>(&self) -> Vec<Shared<C>> {
        if !self.contains(TypeId::of::<C>()) {
            tracing::warn!(
                capability = std::any::type_name::<C>(),
                "no controllers registered for capability"
            );
        }
        self.all_of::<C>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Speak {
        fn word(&self) -> &'static str;
    }

    struct Voice {
        word: &'static str,
    }

    impl Speak for Voice {
        fn word(&self) -> &'static str {
            self.word
        }
    }

    fn speak_vtable() -> CapabilityVtable {
        fn id() -> TypeId {
            TypeId::of::<dyn Speak>()
        }
        fn name() -> &'static str {
            std::any::type_name::<dyn Speak>()
        }
        fn cast(cell: &ControllerCell) -> Box<dyn Any> {
            let shared: Shared<dyn Speak> = cell.__concrete::<Voice>();
            Box::new(shared)
        }
        CapabilityVtable { id, name, cast }
    }

    #[test]
    fn get_returns_first_and_get_all_preserves_order() {
        let mut holder = ControllerHolder::default();
        for word in ["alpha", "beta", "gamma"] {
            let cell = ControllerCell::of(Voice { word });
            holder.register(&cell, &[speak_vtable()]);
        }

        let first = holder.get::<dyn Speak>().unwrap();
        assert_eq!(first.borrow().word(), "alpha");

        let words: Vec<_> = holder
            .get_all::<dyn Speak>()
            .iter()
            .map(|v| v.borrow().word())
            .collect();
        assert_eq!(words, ["alpha", "beta", "gamma"]);
    }

    #[test]
    fn lookup_miss_is_reported_not_synthesized() {
        trait Absent {
            fn nothing(&self);
        }

        let holder = ControllerHolder::default();
        assert!(matches!(
            holder.get::<dyn Absent>(),
            Err(ConductorError::NotFound { .. })
        ));
        assert!(holder.get_all::<dyn Absent>().is_empty());
    }
}
