pub mod composer;
pub mod lexicon;
pub mod models;

pub use composer::compose_response;
pub use lexicon::{classify_fallback, FALLBACK_LEXICON, SUICIDAL_IDEATION_PHRASES};
pub use models::*;
