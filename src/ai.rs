//! Conversational assistant for nutriscope.
//!
//! The assistant is handed raw menu rows rather than engine output, so it
//! can answer questions the statistics engine does not model.

pub mod client;
pub mod context;

pub use client::NutritionAssistant;
pub use context::build_context;
