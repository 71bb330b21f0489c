use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::Result;

/// Shared handle to a controller, a view, or one of their capabilities.
///
/// The whole runtime is single-threaded and synchronous, so instances are
/// reference-counted cells rather than `Arc`s. A controller must not call
/// back into itself through one of its own capabilities while a lifecycle
/// hook is running (the usual `RefCell` discipline).
pub type Shared<T> = Rc<RefCell<T>>;

/// One-time initialization hook, invoked once per controller in resolved
/// construction order before the first tick pass.
pub trait Init {
    fn init(&mut self) -> Result<()>;
}

/// Per-frame update hook, invoked once per controller per [`advance`] call
/// in resolved construction order.
///
/// [`advance`]: crate::app::App::advance
pub trait Tick {
    fn tick(&mut self) -> Result<()>;
}

/// Injected field slot for a single capability, resolved to the first
/// registered implementor after construction completes.
///
/// Declaring a field of this type is the injection annotation; the
/// `#[controller]` macro generates the binding. Binding is first-wins, so
/// re-running injection over the same instance is a no-op.
pub struct Dep<T: ?Sized> {
    slot: OnceCell<Shared<T>>,
}

impl<T: ?Sized> Dep<T> {
    /// The injected instance.
    ///
    /// Panics when read before the startup injection stage has run; no
    /// controller hook executes before that stage completes.
    pub fn get(&self) -> Shared<T> {
        self.slot
            .get()
            .expect("dependency accessed before injection completed")
            .clone()
    }

    #[doc(hidden)]
    pub fn __bind(&self, value: Shared<T>) {
        let _ = self.slot.set(value);
    }
}

impl<T: ?Sized> Default for Dep<T> {
    fn default() -> Self {
        Self {
            slot: OnceCell::new(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Dep<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dep(..)")
    }
}

/// Injected field slot for every registered implementor of a capability,
/// in registration order. An empty collection is a valid resolution.
pub struct Deps<T: ?Sized> {
    slot: OnceCell<Vec<Shared<T>>>,
}

impl<T: ?Sized> Deps<T> {
    pub fn all(&self) -> &[Shared<T>] {
        self.slot.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Shared<T>> {
        self.all().iter()
    }

    pub fn len(&self) -> usize {
        self.all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.all().is_empty()
    }

    #[doc(hidden)]
    pub fn __bind_all(&self, values: Vec<Shared<T>>) {
        let _ = self.slot.set(values);
    }
}

impl<T: ?Sized> Default for Deps<T> {
    fn default() -> Self {
        Self {
            slot: OnceCell::new(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Deps<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deps(..)")
    }
}

/// Injected field slot for a presentation-layer object, resolved from the
/// view holder (slot 0) rather than the controller registry.
pub struct View<T> {
    slot: OnceCell<Shared<T>>,
}

impl<T> View<T> {
    /// The injected view. Panics when read before injection, like
    /// [`Dep::get`].
    pub fn get(&self) -> Shared<T> {
        self.slot
            .get()
            .expect("view accessed before injection completed")
            .clone()
    }

    #[doc(hidden)]
    pub fn __bind(&self, value: Shared<T>) {
        let _ = self.slot.set(value);
    }
}

impl<T> Default for View<T> {
    fn default() -> Self {
        Self {
            slot: OnceCell::new(),
        }
    }
}

impl<T> fmt::Debug for View<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "View(..)")
    }
}

/// Injected field slot for every registered view of a type, in slot order.
pub struct Views<T> {
    slot: OnceCell<Vec<Shared<T>>>,
}

impl<T> Views<T> {
    pub fn all(&self) -> &[Shared<T>] {
        self.slot.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Shared<T>> {
        self.all().iter()
    }

    pub fn len(&self) -> usize {
        self.all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.all().is_empty()
    }

    #[doc(hidden)]
    pub fn __bind_all(&self, values: Vec<Shared<T>>) {
        let _ = self.slot.set(values);
    }
}

impl<T> Default for Views<T> {
    fn default() -> Self {
        Self {
            slot: OnceCell::new(),
        }
    }
}

impl<T> fmt::Debug for Views<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Views(..)")
    }
}

/// Handle on the frame driver itself. Resolves from the orchestrator, not
/// through the registry.
#[derive(Clone, Default)]
pub struct Host {
    state: Rc<RefCell<HostState>>,
}

#[derive(Default)]
struct HostState {
    frame: u64,
    running: bool,
}

impl Host {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of the tick pass currently running, starting at 1; 0 before
    /// the first pass.
    pub fn frame(&self) -> u64 {
        self.state.borrow().frame
    }

    /// True once the init pass has completed.
    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    pub(crate) fn advance_frame(&self) {
        self.state.borrow_mut().frame += 1;
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.state.borrow_mut().running = running;
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Host(frame = {})", self.frame())
    }
}

/// Injected field slot for the [`Host`] handle.
#[derive(Default)]
pub struct HostRef {
    slot: OnceCell<Host>,
}

impl HostRef {
    /// The injected host handle. Panics when read before injection, like
    /// [`Dep::get`].
    pub fn get(&self) -> Host {
        self.slot
            .get()
            .expect("host accessed before injection completed")
            .clone()
    }

    #[doc(hidden)]
    pub fn __bind(&self, host: Host) {
        let _ = self.slot.set(host);
    }
}

impl fmt::Debug for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostRef(..)")
    }
}
