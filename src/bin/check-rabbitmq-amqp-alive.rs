use service_checks::checks::amqp_alive::{error_state, run, Config};
use service_checks::{init_logging, CheckError, Report, Runner};

fn main() {
    init_logging();
    Runner::new()
        .on_error(error_state)
        .safe_run(do_check)
        .print_and_exit()
}

fn do_check() -> Result<Report, CheckError> {
    let config = Config::load()?;
    run(&config)
}
