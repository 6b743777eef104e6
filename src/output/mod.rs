mod styling;
mod terminal;

use styling::{dim, magenta_bold};
pub use terminal::TerminalSink;

/// Prints the banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("● travis-status"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Travis CI build status for your working branch")
    );
}
