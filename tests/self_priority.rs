//! A controller constrained to run after itself is a fatal configuration
//! error, rejected before anything constructs.

use std::sync::atomic::{AtomicUsize, Ordering};

use conductor::prelude::*;

static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

#[conductor::controller(implements(Init), after(Selfish))]
struct Selfish;

impl Default for Selfish {
    fn default() -> Self {
        CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
        Selfish
    }
}

impl Init for Selfish {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }
}

#[conductor::controller]
struct Witness;

impl Default for Witness {
    fn default() -> Self {
        CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
        Witness
    }
}

#[test]
fn self_priority_aborts_before_construction() {
    let mut app = App::new(AppConfig::default());
    let err = app.start().unwrap_err();

    assert!(matches!(
        err,
        ConductorError::SelfPriority { controller } if controller.ends_with("Selfish")
    ));
    assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 0);
    assert!(!app.is_running());
}
