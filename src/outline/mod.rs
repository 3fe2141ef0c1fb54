mod assemble;
mod config;
mod normalize;
mod profile;
mod scoring;
mod title;
mod types;

pub use assemble::OutlineClassifier;
pub use config::{ClassifierConfig, DEFAULT_TITLE};
pub use types::{SPAN_FLAG_BOLD, SPAN_FLAG_ITALIC};
