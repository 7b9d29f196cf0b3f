//! Output generation: SVG charts and data summaries.

pub mod chart;
pub mod generator;

pub use chart::{render_svg, DEFAULT_SIZE};
pub use generator::{generate_text_summary, write_json_summary};
