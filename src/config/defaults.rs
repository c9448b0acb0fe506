pub(crate) fn default_lines_per_page() -> usize {
    1
}

pub(crate) fn default_font_size() -> u32 {
    14
}

pub(crate) fn default_font_color() -> String {
    "#A8A8A8".to_string()
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}
