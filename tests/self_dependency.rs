//! A controller requiring a capability it itself provides is a fatal
//! configuration error.

use std::sync::atomic::{AtomicUsize, Ordering};

use conductor::prelude::*;

static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

trait Echo {
    fn echo(&self);
}

#[conductor::controller(implements(Echo), create(Shared<dyn Echo>))]
struct Ouroboros {
    _other: Shared<dyn Echo>,
}

impl Ouroboros {
    fn new(other: Shared<dyn Echo>) -> Self {
        CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
        Self { _other: other }
    }
}

impl Echo for Ouroboros {
    fn echo(&self) {}
}

#[test]
fn constructor_self_dependency_is_fatal() {
    let mut app = App::new(AppConfig::default());
    let err = app.start().unwrap_err();

    assert!(matches!(
        err,
        ConductorError::SelfDependency { controller } if controller.ends_with("Ouroboros")
    ));
    assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 0);
}
