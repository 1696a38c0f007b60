use service_checks::checks::rabbitmq_overview::{run, Config};
use service_checks::http::HttpSource;
use service_checks::{init_logging, safe_run, CheckError, Report};

fn main() {
    init_logging();
    safe_run(do_check).print_and_exit()
}

fn do_check() -> Result<Report, CheckError> {
    let config = Config::load()?;
    let source = HttpSource::new(&config.host, config.port, Some(config.credentials.clone()))?;
    run(&config, &source)
}
