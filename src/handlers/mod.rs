// src/handlers/mod.rs

pub mod admin;
pub mod assessments;
pub mod courses;
pub mod labs;
pub mod projects;
pub mod tutor;
