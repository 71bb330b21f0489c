//! Explicit-constraint ordering and deferred-set conflict checks.
//!
//! Both halves are pure list algorithms over lightweight keys; the
//! construction loop in `app` maps registrations in and out.

use std::any::TypeId;

use crate::error::{ConductorError, Result};

#[derive(Clone, Copy, Debug)]
pub(crate) struct OrderKey {
    pub id: TypeId,
    pub name: &'static str,
    pub after: Option<AfterKey>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct AfterKey {
    pub id: TypeId,
    pub name: &'static str,
}

/// Relocate every constrained descriptor to immediately follow its target:
/// remove, then reinsert after the target's current position. Descriptors
/// already relocated are skipped, so only direct precedence is honored.
/// Unconstrained descriptors keep their discovery order.
pub(crate) fn sort_explicit(mut list: Vec<OrderKey>) -> Result<Vec<OrderKey>> {
    let mut moved: Vec<TypeId> = Vec::new();
    let mut i = 0;
    while i < list.len() {
        let current = list[i];
        if moved.contains(&current.id) {
            i += 1;
            continue;
        }
        let Some(after) = current.after else {
            i += 1;
            continue;
        };
        if after.id == current.id {
            tracing::error!(
                controller = current.name,
                "after(..) target must differ from the controller itself"
            );
            return Err(ConductorError::SelfPriority {
                controller: current.name,
            });
        }

        let removed = list.remove(i);
        let Some(target) = list.iter().position(|key| key.id == after.id) else {
            tracing::error!(
                controller = current.name,
                target = after.name,
                "ordering target wasn't found"
            );
            return Err(ConductorError::OrderTargetMissing {
                controller: current.name,
                target: after.name,
            });
        };
        if list[target].after.is_some_and(|a| a.id == current.id) {
            tracing::error!(
                first = current.name,
                second = list[target].name,
                "controllers each requested to run after the other"
            );
            return Err(ConductorError::OrderCycle {
                first: current.name,
                second: list[target].name,
            });
        }

        list.insert(target + 1, removed);
        moved.push(current.id);
        // relocated backward: the element that followed `current` is now at
        // i + 1, so the scan advances; relocated forward: it sits at i.
        if target + 1 <= i {
            i += 1;
        }
    }
    Ok(list)
}

/// A descriptor whose construction was deferred, with the capabilities it
/// provides and the constructor capabilities it still requires.
pub(crate) struct Deferred {
    pub name: &'static str,
    pub provides: Vec<TypeId>,
    pub requires: Vec<TypeId>,
}

/// Reject deferred descriptors that could never construct: a controller
/// requiring a capability it itself provides, or two controllers requiring
/// each other's.
pub(crate) fn check_deferred(deferred: &[Deferred]) -> Result<()> {
    for (index, entry) in deferred.iter().enumerate() {
        if entry
            .provides
            .iter()
            .any(|capability| entry.requires.contains(capability))
        {
            tracing::error!(
                controller = entry.name,
                "controller depends on itself via constructor"
            );
            return Err(ConductorError::SelfDependency {
                controller: entry.name,
            });
        }
        for other in &deferred[index + 1..] {
            let entry_needs_other = other
                .provides
                .iter()
                .any(|capability| entry.requires.contains(capability));
            let other_needs_entry = entry
                .provides
                .iter()
                .any(|capability| other.requires.contains(capability));
            if entry_needs_other && other_needs_entry {
                tracing::error!(
                    controller = entry.name,
                    other = other.name,
                    "controllers have cross dependencies"
                );
                return Err(ConductorError::CrossDependency {
                    controller: entry.name,
                    other: other.name,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;
    struct C;
    struct D;

    fn key<T: 'static>(name: &'static str) -> OrderKey {
        OrderKey {
            id: TypeId::of::<T>(),
            name,
            after: None,
        }
    }

    fn key_after<T: 'static, After: 'static>(name: &'static str, target: &'static str) -> OrderKey {
        OrderKey {
            id: TypeId::of::<T>(),
            name,
            after: Some(AfterKey {
                id: TypeId::of::<After>(),
                name: target,
            }),
        }
    }

    fn names(list: &[OrderKey]) -> Vec<&'static str> {
        list.iter().map(|key| key.name).collect()
    }

    #[test]
    fn unconstrained_order_is_preserved() {
        let sorted =
            sort_explicit(vec![key::<A>("a"), key::<B>("b"), key::<C>("c")]).unwrap();
        assert_eq!(names(&sorted), ["a", "b", "c"]);
    }

    #[test]
    fn constrained_descriptor_follows_its_target() {
        // "a" must follow "c", which sits later in discovery order
        let sorted = sort_explicit(vec![
            key_after::<A, C>("a", "c"),
            key::<B>("b"),
            key::<C>("c"),
            key::<D>("d"),
        ])
        .unwrap();
        assert_eq!(names(&sorted), ["b", "c", "a", "d"]);

        // and backward relocation when the target sits earlier
        let sorted = sort_explicit(vec![
            key::<A>("a"),
            key::<B>("b"),
            key_after::<C, A>("c", "a"),
        ])
        .unwrap();
        assert_eq!(names(&sorted), ["a", "c", "b"]);
    }

    #[test]
    fn unrelated_descriptors_do_not_disturb_a_constraint() {
        let with_extra = sort_explicit(vec![
            key_after::<A, C>("a", "c"),
            key::<B>("b"),
            key::<C>("c"),
            key::<D>("d"),
        ])
        .unwrap();
        let without_extra =
            sort_explicit(vec![key_after::<A, C>("a", "c"), key::<C>("c")]).unwrap();

        let pos = |list: &[OrderKey], name| list.iter().position(|k| k.name == name).unwrap();
        assert!(pos(&with_extra, "c") < pos(&with_extra, "a"));
        assert!(pos(&without_extra, "c") < pos(&without_extra, "a"));
    }

    #[test]
    fn self_priority_is_fatal() {
        let err = sort_explicit(vec![key_after::<A, A>("a", "a")]).unwrap_err();
        assert!(matches!(err, ConductorError::SelfPriority { controller } if controller == "a"));
    }

    #[test]
    fn missing_target_is_fatal() {
        let err = sort_explicit(vec![key_after::<A, B>("a", "b")]).unwrap_err();
        assert!(matches!(err, ConductorError::OrderTargetMissing { .. }));
    }

    #[test]
    fn mutual_constraints_are_fatal() {
        let err = sort_explicit(vec![
            key_after::<A, B>("a", "b"),
            key_after::<B, A>("b", "a"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConductorError::OrderCycle { .. }));
    }

    struct CapX;
    struct CapY;

    #[test]
    fn deferred_self_dependency_is_fatal() {
        let deferred = [Deferred {
            name: "a",
            provides: vec![TypeId::of::<CapX>()],
            requires: vec![TypeId::of::<CapX>()],
        }];
        assert!(matches!(
            check_deferred(&deferred),
            Err(ConductorError::SelfDependency { controller: "a" })
        ));
    }

    #[test]
    fn deferred_cross_dependency_is_fatal() {
        let deferred = [
            Deferred {
                name: "a",
                provides: vec![TypeId::of::<CapX>()],
                requires: vec![TypeId::of::<CapY>()],
            },
            Deferred {
                name: "b",
                provides: vec![TypeId::of::<CapY>()],
                requires: vec![TypeId::of::<CapX>()],
            },
        ];
        assert!(matches!(
            check_deferred(&deferred),
            Err(ConductorError::CrossDependency { .. })
        ));
    }

    #[test]
    fn one_way_deferral_is_allowed() {
        let deferred = [
            Deferred {
                name: "a",
                provides: vec![TypeId::of::<CapX>()],
                requires: vec![],
            },
            Deferred {
                name: "b",
                provides: vec![TypeId::of::<CapY>()],
                requires: vec![TypeId::of::<CapX>()],
            },
        ];
        assert!(check_deferred(&deferred).is_ok());
    }
}
