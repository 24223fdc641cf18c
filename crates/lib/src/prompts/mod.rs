//! # Prompt Template Modules
//!
//! This module organizes the prompt templates used by the `bookmeta` library.

pub mod pdf;
