//! Entry point for the `cartosync` command-line interface.
#![forbid(unsafe_code)]

#[expect(clippy::print_stderr, reason = "fatal errors are reported on stderr")]
fn main() {
    if let Err(err) = cartosync_cli::run() {
        eprintln!("cartosync: {err}");
        std::process::exit(1);
    }
}
