fn main() {
    dblog_cli::init_tracing();
    let code = dblog_cli::run_cli(std::env::args().collect());
    std::process::exit(code);
}
