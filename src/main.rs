//! Lexmerge binary entry point.

fn main() {
    if let Err(err) = lexmerge::cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
