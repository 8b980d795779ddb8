fn main() {
    if let Err(err) = knip_reporter::cli::run() {
        knip_reporter::ui::eprintln_error(&err);
        std::process::exit(knip_reporter::exit::exit_code(&err));
    }
}
