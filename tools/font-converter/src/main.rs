//! Tool for converting BDF fonts into the fixed-width [`GlyphTable`][gt] dump format.
//!
//! [gt]: font::table::GlyphTable

use anyhow::Result;

mod cli;

fn main() -> Result<()> {
    let config = cli::get_config();

    env_logger::Builder::new()
        .filter_level(config.log_level)
        .format_timestamp(None)
        .parse_default_env()
        .init();

    font_converter::convert_file(&config.input, &config.output)
}
