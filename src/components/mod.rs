// src/components/mod.rs
pub mod toolbar;
