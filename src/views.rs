use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::component::Shared;

/// Keyed lookup for presentation-layer objects: view type plus a numeric
/// slot. Populated by the host before startup; the injector treats it as
/// one more dependency source.
#[derive(Default)]
pub struct ViewHolder {
    buckets: HashMap<TypeId, BTreeMap<usize, Box<dyn Any>>>,
}

impl ViewHolder {
    /// Add a view at the first free slot starting from 0.
    pub fn add<V: 'static>(&mut self, view: V) -> usize {
        self.add_at(view, 0)
    }

    /// Add a view at the requested slot, bumping the slot index upward
    /// while it is occupied. Returns the slot actually used.
    pub fn add_at<V: 'static>(&mut self, view: V, slot: usize) -> usize {
        let bucket = self.buckets.entry(TypeId::of::<V>()).or_default();
        let mut slot = slot;
        while bucket.contains_key(&slot) {
            slot += 1;
        }
        let shared: Shared<V> = Rc::new(RefCell::new(view));
        bucket.insert(slot, Box::new(shared));
        slot
    }

    pub fn get<V: 'static>(&self, slot: usize) -> Option<Shared<V>> {
        self.buckets
            .get(&TypeId::of::<V>())
            .and_then(|bucket| bucket.get(&slot))
            .map(|handle| {
                handle
                    .downcast_ref::<Shared<V>>()
                    .expect("view entry holds a different type")
                    .clone()
            })
    }

    /// All views of a type, in slot order.
    pub fn all<V: 'static>(&self) -> Vec<Shared<V>> {
        match self.buckets.get(&TypeId::of::<V>()) {
            Some(bucket) => bucket
                .values()
                .map(|handle| {
                    handle
                        .downcast_ref::<Shared<V>>()
                        .expect("view entry holds a different type")
                        .clone()
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// Drop every view, e.g. between host scene reloads.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Panel {
        label: &'static str,
    }

    #[test]
    fn slots_bump_on_collision() {
        let mut views = ViewHolder::default();
        assert_eq!(views.add(Panel { label: "a" }), 0);
        assert_eq!(views.add(Panel { label: "b" }), 1);
        // requesting an occupied slot walks upward to the first free one
        assert_eq!(views.add_at(Panel { label: "c" }, 0), 2);
        assert_eq!(views.add_at(Panel { label: "d" }, 10), 10);

        assert_eq!(views.get::<Panel>(0).unwrap().borrow().label, "a");
        assert!(views.get::<Panel>(3).is_none());

        let labels: Vec<_> = views
            .all::<Panel>()
            .iter()
            .map(|v| v.borrow().label)
            .collect();
        assert_eq!(labels, ["a", "b", "c", "d"]);

        views.clear();
        assert!(views.get::<Panel>(0).is_none());
        assert!(views.all::<Panel>().is_empty());
    }
}
