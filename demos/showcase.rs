//! Single-file walkthrough: a catalogue loader, an input sampler and a
//! presenter wired through capabilities. Shows an explicit after(..)
//! constraint, constructor injection, field injection of a view and the
//! host handle, and a short driven frame loop.

use conductor::prelude::*;

trait Catalog {
    fn titles(&self) -> &[&'static str];
}

trait Pointer {
    fn position(&self) -> (i32, i32);
}

struct StatusPanel {
    line: String,
}

#[conductor::controller(implements(Catalog, Init))]
#[derive(Default)]
struct CatalogLoader {
    titles: Vec<&'static str>,
}

impl Catalog for CatalogLoader {
    fn titles(&self) -> &[&'static str] {
        &self.titles
    }
}

impl Init for CatalogLoader {
    fn init(&mut self) -> Result<()> {
        self.titles = vec!["overture", "interlude", "finale"];
        tracing::info!(count = self.titles.len(), "catalogue loaded");
        Ok(())
    }
}

#[conductor::controller(implements(Pointer, Tick))]
#[derive(Default)]
struct InputSampler {
    x: i32,
    y: i32,
}

impl Pointer for InputSampler {
    fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

impl Tick for InputSampler {
    fn tick(&mut self) -> Result<()> {
        self.x += 3;
        self.y += 1;
        Ok(())
    }
}

#[conductor::controller(
    implements(Init, Tick),
    after(CatalogLoader),
    create(Shared<dyn Catalog>)
)]
struct Presenter {
    catalog: Shared<dyn Catalog>,
    pointer: Dep<dyn Pointer>,
    panel: View<StatusPanel>,
    host: HostRef,
}

impl Presenter {
    fn new(catalog: Shared<dyn Catalog>) -> Self {
        Self {
            catalog,
            pointer: Dep::default(),
            panel: View::default(),
            host: HostRef::default(),
        }
    }
}

impl Init for Presenter {
    fn init(&mut self) -> Result<()> {
        let panel = self.panel.get();
        panel.borrow_mut().line =
            format!("{} titles ready", self.catalog.borrow().titles().len());
        Ok(())
    }
}

impl Tick for Presenter {
    fn tick(&mut self) -> Result<()> {
        let (x, y) = self.pointer.get().borrow().position();
        let panel = self.panel.get();
        panel.borrow_mut().line = format!(
            "frame {}: pointer at ({x}, {y})",
            self.host.get().frame()
        );
        tracing::info!(line = %panel.borrow().line, "panel updated");
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    let mut app = App::new(AppConfig::default());
    app.views_mut().add(StatusPanel {
        line: String::new(),
    });
    app.start()?;

    for _ in 0..3 {
        app.advance()?;
    }
    Ok(())
}
