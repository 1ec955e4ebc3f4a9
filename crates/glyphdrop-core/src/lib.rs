use error::GlyphError;

pub mod config;
pub mod error;
pub mod font;
pub mod install;
pub mod preset;
pub mod reload;
pub mod scratch;
pub mod select;

pub type GlyphResult<T> = std::result::Result<T, GlyphError>;
