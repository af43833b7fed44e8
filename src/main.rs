fn main() {
    use clap::Parser;
    use fdx2ebook::cli::CliRunError;
    let args = fdx2ebook::cli::Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else if args.quiet {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    if let Err(e) = fdx2ebook::cli::run(&args) {
        match &e {
            CliRunError::InvalidInput(_) => println!("{}", e),
            _ => eprintln!("{}", e),
        }
        if args.verbose {
            for cause in fdx2ebook::cli::causes(&e) {
                eprintln!("  cause: {}", cause);
            }
        }
        std::process::exit(e.exit_code());
    }
}
