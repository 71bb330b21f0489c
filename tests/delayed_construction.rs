//! A controller whose constructor dependency appears later in discovery
//! order is deferred, then constructed once the dependency registers.

use conductor::prelude::*;

static ORDER: std::sync::Mutex<Vec<&'static str>> = std::sync::Mutex::new(Vec::new());

trait Source {
    fn value(&self) -> u32;
}

// discovery order puts the consumer first, so it must be deferred
#[conductor::controller(implements(Init), create(Shared<dyn Source>))]
struct Consumer {
    source: Shared<dyn Source>,
}

impl Consumer {
    fn new(source: Shared<dyn Source>) -> Self {
        ORDER.lock().unwrap().push("Consumer");
        Self { source }
    }
}

impl Init for Consumer {
    fn init(&mut self) -> Result<()> {
        assert_eq!(self.source.borrow().value(), 42);
        Ok(())
    }
}

#[conductor::controller(implements(Source))]
struct Wellspring;

impl Default for Wellspring {
    fn default() -> Self {
        ORDER.lock().unwrap().push("Wellspring");
        Wellspring
    }
}

impl Source for Wellspring {
    fn value(&self) -> u32 {
        42
    }
}

#[test]
fn deferred_controller_constructs_after_its_dependency() {
    let mut app = App::new(AppConfig::default());
    app.start().expect("startup");
    assert!(app.is_running());

    // the consumer constructed only once the source had registered
    let order = ORDER.lock().unwrap();
    assert_eq!(*order, ["Wellspring", "Consumer"]);

    let source = app.holder().get::<dyn Source>().unwrap();
    assert_eq!(source.borrow().value(), 42);
}
