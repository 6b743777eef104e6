use console::style;

/// Styling helpers for terminal output
pub fn bright_yellow(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn bright_green(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn bright_red(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).bright().red()
}

pub fn dim(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn magenta_bold(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

/// Color a rendered status line by the symbol it carries.
pub fn status_line(text: &str) -> console::StyledObject<String> {
    if text.contains('✘') || text.contains('⚠') {
        bright_red(text)
    } else if text.contains('✔') {
        bright_green(text)
    } else if text.contains("building") || text.contains("starting") || text.contains("queued") {
        bright_yellow(text)
    } else {
        dim(text)
    }
}
