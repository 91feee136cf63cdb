fn main() {
    let matches = wcp_cli::commands::wcp_parser().get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(message) = wcp_cli::run(&matches) {
        eprintln!("{}", message);
        std::process::exit(1);
    }
}
