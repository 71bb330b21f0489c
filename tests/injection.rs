//! Field injection: single capability, possibly-empty collections, views,
//! and the host handle; bindings are idempotent and equivalent startups
//! resolve to the same logical instances.

use std::sync::atomic::{AtomicUsize, Ordering};

use conductor::prelude::*;

static INIT_RUNS: AtomicUsize = AtomicUsize::new(0);

trait Store {
    fn tag(&self) -> &'static str;
}

trait Audio {
    fn channel(&self) -> u8;
}

trait Ghost {
    fn nothing(&self);
}

struct PanelView {
    label: &'static str,
}

#[conductor::controller(implements(Store))]
#[derive(Default)]
struct Vault;

impl Store for Vault {
    fn tag(&self) -> &'static str {
        "vault"
    }
}

#[conductor::controller(implements(Audio))]
#[derive(Default)]
struct AudioLeft;

impl Audio for AudioLeft {
    fn channel(&self) -> u8 {
        0
    }
}

#[conductor::controller(implements(Audio))]
#[derive(Default)]
struct AudioRight;

impl Audio for AudioRight {
    fn channel(&self) -> u8 {
        1
    }
}

#[conductor::controller(implements(Init))]
#[derive(Default)]
struct Listener {
    store: Dep<dyn Store>,
    audios: Deps<dyn Audio>,
    ghosts: Deps<dyn Ghost>,
    panel: View<PanelView>,
    panels: Views<PanelView>,
    host: HostRef,
}

impl Init for Listener {
    fn init(&mut self) -> Result<()> {
        INIT_RUNS.fetch_add(1, Ordering::SeqCst);

        assert_eq!(self.store.get().borrow().tag(), "vault");

        let channels: Vec<_> = self.audios.iter().map(|a| a.borrow().channel()).collect();
        assert_eq!(channels, [0, 1]);

        // an empty collection is a valid resolution, not an error
        assert!(self.ghosts.is_empty());

        assert_eq!(self.panel.get().borrow().label, "main");
        assert_eq!(self.panels.len(), 2);

        // the host handle resolves outside the registry; no tick ran yet
        assert_eq!(self.host.get().frame(), 0);
        assert!(!self.host.get().is_running());
        Ok(())
    }
}

fn started_app() -> App {
    let mut app = App::new(AppConfig::default());
    app.views_mut().add(PanelView { label: "main" });
    app.views_mut().add(PanelView { label: "side" });
    app.start().expect("startup");
    app
}

#[test]
fn injection_resolves_every_slot_kind() {
    let app = started_app();
    assert!(app.is_running());
    assert_eq!(INIT_RUNS.load(Ordering::SeqCst), 1);

    // an equivalent second startup resolves to equivalent instances
    let second = started_app();
    assert_eq!(INIT_RUNS.load(Ordering::SeqCst), 2);
    assert_eq!(
        second.holder().get::<dyn Store>().unwrap().borrow().tag(),
        "vault"
    );
}
