//! Dioxus hooks for recommendation instances

mod recommendations;

pub use recommendations::*;
