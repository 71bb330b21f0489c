use std::any::TypeId;
use std::collections::HashMap;
use std::time::Instant;

use crate::component::{Host, Init, Shared, Tick};
use crate::config::AppConfig;
use crate::error::{ConductorError, Result};
use crate::holder::{ControllerCell, ControllerHolder};
use crate::order::{self, AfterKey, Deferred, OrderKey};
use crate::registry::{self, Registration};
use crate::views::ViewHolder;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
    Uninitialized,
    Initializing,
    Running,
}

struct HookEntry<T: ?Sized> {
    controller: &'static str,
    hook: Shared<T>,
}

struct Constructed {
    cell: ControllerCell,
    inject: fn(&ControllerCell, &InjectContext<'_>) -> Result<()>,
}

/// The orchestrator. The host creates one, registers its views, then calls
/// [`start`] once and [`advance`] once per frame signal.
///
/// [`start`]: App::start
/// [`advance`]: App::advance
pub struct App {
    cfg: AppConfig,
    phase: Phase,
    holder: ControllerHolder,
    views: ViewHolder,
    host: Host,
    constructed: Vec<Constructed>,
    inits: Vec<HookEntry<dyn Init>>,
    ticks: Vec<HookEntry<dyn Tick>>,
}

impl App {
    pub fn new(cfg: AppConfig) -> Self {
        Self {
            cfg,
            phase: Phase::Uninitialized,
            holder: ControllerHolder::default(),
            views: ViewHolder::default(),
            host: Host::new(),
            constructed: Vec::new(),
            inits: Vec::new(),
            ticks: Vec::new(),
        }
    }

    /// View registration surface for the host, meaningful before `start`.
    pub fn views_mut(&mut self) -> &mut ViewHolder {
        &mut self.views
    }

    pub fn holder(&self) -> &ControllerHolder {
        &self.holder
    }

    pub fn host(&self) -> Host {
        self.host.clone()
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Run the whole startup sequence against the inventory catalogue:
    /// discovery, ordering, construction, injection, init pass.
    pub fn start(&mut self) -> Result<()> {
        let catalogue = registry::discover();
        self.start_with(&catalogue)
    }

    /// Same as [`start`], against an explicitly supplied catalogue.
    /// Calling it again once startup ran (or failed) is a no-op.
    ///
    /// [`start`]: App::start
    pub fn start_with(&mut self, catalogue: &[&'static Registration]) -> Result<()> {
        if self.phase != Phase::Uninitialized {
            return Ok(());
        }
        self.phase = Phase::Initializing;
        let started_at = Instant::now();
        tracing::debug!(controllers = catalogue.len(), "discovered controllers");

        // explicit ordering over lightweight keys, then back to registrations
        let keys: Vec<OrderKey> = catalogue
            .iter()
            .map(|registration| OrderKey {
                id: (registration.type_id)(),
                name: (registration.type_name)(),
                after: registration.after.as_ref().map(|after| AfterKey {
                    id: (after.id)(),
                    name: (after.name)(),
                }),
            })
            .collect();
        let ordered = order::sort_explicit(keys)?;
        let by_id: HashMap<TypeId, &'static Registration> = catalogue
            .iter()
            .map(|registration| ((registration.type_id)(), *registration))
            .collect();

        // two-phase construction: everything whose constructor capabilities
        // are already registered constructs in place, the rest is deferred
        let mut cx = BuildContext {
            holder: &mut self.holder,
            views: &self.views,
            host: &self.host,
            constructed: &mut self.constructed,
            current: "",
        };
        let mut deferred: Vec<&'static Registration> = Vec::new();
        for key in &ordered {
            let registration = by_id[&key.id];
            let unmet = (registration.dependencies)()
                .iter()
                .any(|dependency| !cx.holder.contains((dependency.id)()));
            if unmet {
                deferred.push(registration);
                continue;
            }
            cx.construct(registration)?;
        }
        if !deferred.is_empty() {
            let checks: Vec<Deferred> = deferred
                .iter()
                .map(|registration| Deferred {
                    name: (registration.type_name)(),
                    provides: (registration.capabilities)()
                        .iter()
                        .map(|capability| (capability.id)())
                        .collect(),
                    requires: (registration.dependencies)()
                        .iter()
                        .map(|dependency| (dependency.id)())
                        .collect(),
                })
                .collect();
            order::check_deferred(&checks)?;
            for registration in deferred {
                cx.construct(registration)?;
            }
        }

        // field injection, once per constructed instance
        let icx = InjectContext {
            holder: &self.holder,
            views: &self.views,
            host: &self.host,
        };
        for constructed in &self.constructed {
            (constructed.inject)(&constructed.cell, &icx)?;
        }
        tracing::debug!(controllers = self.constructed.len(), "injection completed");

        // lifecycle snapshots are taken here and never change afterwards
        self.inits = self
            .holder
            .entries::<dyn Init>()
            .into_iter()
            .map(|(controller, hook)| HookEntry { controller, hook })
            .collect();
        self.ticks = self
            .holder
            .entries::<dyn Tick>()
            .into_iter()
            .map(|(controller, hook)| HookEntry { controller, hook })
            .collect();

        for entry in &self.inits {
            if self.cfg.log_init_sequence {
                tracing::debug!(controller = entry.controller, "init");
            }
            if let Err(source) = entry.hook.borrow_mut().init() {
                tracing::error!(controller = entry.controller, error = %source, "init failed");
                return Err(ConductorError::Init {
                    controller: entry.controller,
                    source: Box::new(source),
                });
            }
        }
        if self.cfg.log_init_sequence {
            tracing::info!("init completed");
        }

        self.host.set_running(true);
        self.phase = Phase::Running;
        if self.cfg.log_startup_timing {
            tracing::info!(
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                controllers = self.constructed.len(),
                "startup completed"
            );
        }
        Ok(())
    }

    /// Run one tick pass over the snapshotted sequence. A no-op until the
    /// init pass has completed. A failing hook aborts the remainder of
    /// this pass only; whether to keep calling `advance` is host policy.
    pub fn advance(&mut self) -> Result<()> {
        if self.phase != Phase::Running {
            return Ok(());
        }
        self.host.advance_frame();
        for entry in &self.ticks {
            if let Err(source) = entry.hook.borrow_mut().tick() {
                tracing::error!(controller = entry.controller, error = %source, "tick loop failed");
                return Err(ConductorError::Tick {
                    controller: entry.controller,
                    source: Box::new(source),
                });
            }
        }
        Ok(())
    }

    /// Escape hatch: construct one more instance of a registered controller
    /// type, outside the managed one-instance-per-type path. The instance
    /// joins the registry under all its capabilities and gets its fields
    /// injected, but instances created after startup are never added to the
    /// already-snapshotted lifecycle sequences.
    pub fn direct_create<C: 'static>(&mut self) -> Result<Shared<C>> {
        let registration = registry::find(TypeId::of::<C>()).ok_or_else(|| {
            tracing::error!(
                controller = std::any::type_name::<C>(),
                "unknown controller type for direct creation"
            );
            ConductorError::UnknownController {
                type_name: std::any::type_name::<C>(),
            }
        })?;

        let first_new = self.constructed.len();
        let mut cx = BuildContext {
            holder: &mut self.holder,
            views: &self.views,
            host: &self.host,
            constructed: &mut self.constructed,
            current: "",
        };
        let index = cx.construct(registration)?;

        let icx = InjectContext {
            holder: &self.holder,
            views: &self.views,
            host: &self.host,
        };
        for constructed in &self.constructed[first_new..] {
            (constructed.inject)(&constructed.cell, &icx)?;
        }
        Ok(self.constructed[index].cell.__concrete::<C>())
    }
}

// unit tests are covered by the integration suite; the pure pieces live in
// `order`, `holder` and `views`

/// Construction-time resolution context handed to controller factories.
pub struct BuildContext<'a> {
    holder: &'a mut ControllerHolder,
    views: &'a ViewHolder,
    host: &'a Host,
    constructed: &'a mut Vec<Constructed>,
    current: &'static str,
}

impl<'a> BuildContext<'a> {
    /// Resolve a constructor capability to its first registered instance.
    pub fn dep<C: ?Sized + 'static>(&self) -> Result<Shared<C>> {
        self.holder.first::<C>().ok_or_else(|| {
            tracing::error!(
                controller = self.current,
                dependency = std::any::type_name::<C>(),
                "dependency wasn't found for constructor"
            );
            ConductorError::DependencyNotFound {
                controller: self.current,
                dependency: std::any::type_name::<C>(),
            }
        })
    }

    /// Resolve a constructor view parameter (slot 0).
    pub fn view<V: 'static>(&self) -> Result<Shared<V>> {
        self.views.get::<V>(0).ok_or_else(|| {
            tracing::error!(
                controller = self.current,
                dependency = std::any::type_name::<V>(),
                "view wasn't found for constructor"
            );
            ConductorError::DependencyNotFound {
                controller: self.current,
                dependency: std::any::type_name::<V>(),
            }
        })
    }

    pub fn host(&self) -> Host {
        self.host.clone()
    }

    /// Constructor-time direct creation, e.g. for load scenarios. The
    /// minted instance joins the registry immediately and is injected by
    /// the normal injection stage.
    pub fn direct_create<C: 'static>(&mut self) -> Result<Shared<C>> {
        let registration = registry::find(TypeId::of::<C>()).ok_or_else(|| {
            tracing::error!(
                controller = std::any::type_name::<C>(),
                "unknown controller type for direct creation"
            );
            ConductorError::UnknownController {
                type_name: std::any::type_name::<C>(),
            }
        })?;
        let index = self.construct(registration)?;
        Ok(self.constructed[index].cell.__concrete::<C>())
    }

    pub(crate) fn construct(&mut self, registration: &'static Registration) -> Result<usize> {
        let previous = self.current;
        self.current = (registration.type_name)();
        let built = (registration.build)(self);
        self.current = previous;
        let cell = built?;
        self.holder.register(&cell, (registration.capabilities)());
        self.constructed.push(Constructed {
            cell,
            inject: registration.inject,
        });
        tracing::debug!(controller = (registration.type_name)(), "constructed");
        Ok(self.constructed.len() - 1)
    }
}

/// Post-construction field resolution context; methods are macro-facing.
pub struct InjectContext<'a> {
    holder: &'a ControllerHolder,
    views: &'a ViewHolder,
    host: &'a Host,
}

impl<'a> InjectContext<'a> {
    #[doc(hidden)]
    pub fn __single<C: ?Sized + 'static>(
        &self,
        controller: &'static str,
        field: &'static str,
    ) -> Result<Shared<C>> {
        self.holder.first::<C>().ok_or_else(|| {
            tracing::error!(
                controller,
                field,
                dependency = std::any::type_name::<C>(),
                "dependency wasn't found for field"
            );
            ConductorError::FieldDependencyNotFound {
                controller,
                field,
                dependency: std::any::type_name::<C>(),
            }
        })
    }

    #[doc(hidden)]
    pub fn __collection<C: ?Sized + 'static>(&self) -> Vec<Shared<C>> {
        self.holder.all_of::<C>()
    }

    #[doc(hidden)]
    pub fn __view<V: 'static>(
        &self,
        controller: &'static str,
        field: &'static str,
    ) -> Result<Shared<V>> {
        self.views.get::<V>(0).ok_or_else(|| {
            tracing::error!(
                controller,
                field,
                dependency = std::any::type_name::<V>(),
                "view wasn't found for field"
            );
            ConductorError::FieldDependencyNotFound {
                controller,
                field,
                dependency: std::any::type_name::<V>(),
            }
        })
    }

    #[doc(hidden)]
    pub fn __views<V: 'static>(&self) -> Vec<Shared<V>> {
        self.views.all::<V>()
    }

    #[doc(hidden)]
    pub fn __host(&self) -> Host {
        self.host.clone()
    }
}
