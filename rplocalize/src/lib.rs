//! Extraction/injection engine for localizing RPG Maker XP/VX/VX
//! Ace/MV/MZ projects: pulls translatable text out of a project's Ruby
//! Marshal or JSON data files, protects embedded escape codes, batches
//! and dispatches it to an external translator, and writes the
//! translated text back in place.

pub mod config;
pub mod error;
pub mod js_tokenizer;
pub mod json_core;
pub mod lore;
pub mod merger;
pub mod note_tag;
pub mod path;
pub mod pipeline;
pub mod placeholder;
pub mod ruby;
pub mod ruby_tokenizer;
pub mod safety;
