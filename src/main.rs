use std::process::exit;

fn main() {
    if let Err(e) = visitlog::app::run_cli() {
        visitlog::output::notice_error(&e);
        exit(1);
    }
}
