use std::io;

fn main() {
    let json = std::env::var("KITTENS_LOG_JSON")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "on" | "yes"))
        .unwrap_or(false);
    if let Err(e) = kittens_service::init_logging(json) {
        eprintln!("WARNING: logging disabled: {}", e);
    }

    let code = kittens_cli::run(std::env::args(), &mut io::stdout(), &mut io::stderr());
    std::process::exit(code);
}
