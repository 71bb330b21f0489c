use conductor::prelude::*;

trait Greet {
    fn hello(&self) -> &'static str;
}

#[conductor::controller(implements(Greet, Init, Tick))]
#[derive(Default)]
struct Greeter {
    greeted: bool,
}

impl Greet for Greeter {
    fn hello(&self) -> &'static str {
        if self.greeted {
            "hello"
        } else {
            "not yet"
        }
    }
}

impl Init for Greeter {
    fn init(&mut self) -> Result<()> {
        self.greeted = true;
        Ok(())
    }
}

impl Tick for Greeter {
    fn tick(&mut self) -> Result<()> {
        Ok(())
    }
}

fn main() {
    let mut app = App::new(AppConfig::default());
    app.start().expect("startup");
    app.advance().expect("tick pass");

    let greeter = app.holder().get::<dyn Greet>().expect("greeter");
    assert_eq!(greeter.borrow().hello(), "hello");
}
