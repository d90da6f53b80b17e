use std::convert::Infallible;
use std::sync::Arc;

use wireup::prelude::*;

fn main() {
    let injector = base_definitions().build_injector().unwrap();
    let report = injector.get::<ReportService>("report_service").unwrap();
    report.run();

    // A second container for the staging environment: it shadows the
    // connection URL and inherits everything else.
    let mut staging = Definitions::draw_from(injector.clone());
    staging
        .register_value("connection_url", String::from("postgres://staging/app"))
        .unwrap();
    staging
        .register_component::<Database>("database", &["connection_url", "log"])
        .unwrap();
    let staging = staging.build_injector().unwrap();
    staging
        .get::<Database>("database")
        .unwrap()
        .query("select 1");

    // Ad-hoc invocation against whatever the container provides.
    let summary = injector
        .invoke(
            |app_name: Arc<String>, db: Arc<Database>| {
                Ok::<_, Infallible>(format!("{app_name} -> {}", db.url))
            },
            &["app_name", "database"],
        )
        .unwrap();
    println!("{summary}");
}

fn base_definitions() -> Definitions {
    let mut definitions = Definitions::new();
    definitions
        .register_value("app_name", String::from("reporting"))
        .unwrap();
    definitions
        .register_value("connection_url", String::from("postgres://prod/app"))
        .unwrap();
    definitions
        .register("log", &["app_name"], |app_name: Arc<String>| {
            Ok::<_, Infallible>(Log { app_name })
        })
        .unwrap();
    definitions
        .register_component::<Database>("database", &["connection_url", "log"])
        .unwrap();
    definitions
        .register_component::<ReportService>("report_service", &["database", "log"])
        .unwrap();
    definitions.alias("report_service", "reports").unwrap();
    definitions
}

struct Log {
    app_name: Arc<String>,
}

impl Log {
    fn write(&self, message: &str) {
        eprintln!("[{}] {}", self.app_name, message);
    }
}

struct Database {
    url: String,
    log: Arc<Log>,
}

impl Database {
    fn query(&self, statement: &str) {
        self.log.write(&format!("{} <- {}", self.url, statement));
    }
}

impl Component for Database {
    type Error = Infallible;

    fn construct(args: &mut Arguments) -> Result<Result<Self, Self::Error>, ResolveError> {
        let url: Arc<String> = args.take()?;
        Ok(Ok(Self {
            url: url.as_ref().clone(),
            log: args.take()?,
        }))
    }
}

struct ReportService {
    database: Arc<Database>,
    log: Arc<Log>,
}

impl ReportService {
    fn run(&self) {
        self.log.write("building daily report");
        self.database.query("select * from events");
    }
}

impl Component for ReportService {
    type Error = Infallible;

    fn construct(args: &mut Arguments) -> Result<Result<Self, Self::Error>, ResolveError> {
        Ok(Ok(Self {
            database: args.take()?,
            log: args.take()?,
        }))
    }
}
