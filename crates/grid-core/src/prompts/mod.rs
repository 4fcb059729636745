//! Prompt templates for the GRID assistant.

pub mod grid_persona;

pub use grid_persona::GRID_SYSTEM_INSTRUCTION;
