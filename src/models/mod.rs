// src/models/mod.rs

pub mod attempt;
pub mod catalog;
pub mod progress;
pub mod project;
pub mod tutor;
