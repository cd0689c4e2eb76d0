use std::convert::Infallible;
use std::error::Error;
use std::sync::Arc;

use wiring::prelude::*;

fn main() {
    let module = AppModule::new("greeter");
    let app = module.app;
    let graph = Graph::from_module(module).unwrap();
    graph.resolve(&app).unwrap().run();
}

struct AppModule {
    app_name: &'static str,
    app: Token<App>,
}

impl AppModule {
    fn new(app_name: &'static str) -> Self {
        Self {
            app_name,
            app: token::named("app"),
        }
    }
}

impl Module for AppModule {
    fn configure(&self, graph: &Graph) -> Result<(), Box<dyn Error + Send + Sync>> {
        let app_name = self.app_name;
        let name = graph.bind(Provider::auto(move || Ok::<_, Infallible>(AppName(app_name))))?;

        let logger = graph.bind(
            graph.manual(
                |name: Arc<AppName>| Ok::<_, Infallible>(ConsoleLogger { app_name: name.0 }),
                [name.erase()],
            )?
            .assignable_to(|logger| logger as Arc<dyn Logger>),
        )?;

        let english = graph.bind(
            Provider::auto(|logger: Arc<dyn Logger>| Ok::<_, Infallible>(EnglishGreeter { logger }))
                .assignable_to(|greeter| greeter as Arc<dyn Greeter>),
        )?;
        let chinese = graph.bind(
            Provider::auto(|logger: Arc<dyn Logger>| Ok::<_, Infallible>(ChineseGreeter { logger }))
                .assignable_to(|greeter| greeter as Arc<dyn Greeter>),
        )?;

        graph.register(
            self.app,
            graph.manual(
                |logger: Arc<dyn Logger>, english: Arc<dyn Greeter>, chinese: Arc<dyn Greeter>| {
                    Ok::<_, Infallible>(App {
                        logger,
                        greeters: vec![english, chinese],
                    })
                },
                [logger.erase(), english.erase(), chinese.erase()],
            )?,
        )?;

        Ok(())
    }
}

struct AppName(&'static str);

trait Logger: Send + Sync + 'static {
    fn log(&self, message: &str);
}

struct ConsoleLogger {
    app_name: &'static str,
}

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        eprintln!("[{}] {}", self.app_name, message);
    }
}

trait Greeter: Send + Sync + 'static {
    fn greet(&self);
}

struct EnglishGreeter {
    logger: Arc<dyn Logger>,
}

impl Greeter for EnglishGreeter {
    fn greet(&self) {
        self.logger.log("Hello World!");
    }
}

struct ChineseGreeter {
    logger: Arc<dyn Logger>,
}

impl Greeter for ChineseGreeter {
    fn greet(&self) {
        self.logger.log("你好世界!");
    }
}

struct App {
    logger: Arc<dyn Logger>,
    greeters: Vec<Arc<dyn Greeter>>,
}

impl App {
    fn run(&self) {
        self.logger.log("Greeting from wiring managed values:");
        for greeter in &self.greeters {
            greeter.greet();
        }
    }
}
