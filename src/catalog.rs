// src/catalog.rs

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::{
    error::AppError,
    models::catalog::{Course, Lab, Project, Test},
};

/// On-disk layout of the catalog file.
#[derive(Debug, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    courses: Vec<Course>,
    #[serde(default)]
    labs: Vec<Lab>,
    #[serde(default)]
    tests: Vec<Test>,
    #[serde(default)]
    projects: Vec<Project>,
}

/// Read-only course content: courses, labs, tests and projects by id.
#[derive(Debug, Default)]
pub struct Catalog {
    courses: Vec<Course>,
    course_index: HashMap<String, usize>,
    labs: HashMap<String, Lab>,
    tests: HashMap<String, Test>,
    projects: HashMap<String, Project>,
}

impl Catalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::InternalServerError(format!("cannot read catalog {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_json(&raw)?;
        tracing::info!(
            "Catalog loaded from {}: {} courses, {} labs, {} tests, {} projects",
            path.display(),
            catalog.courses.len(),
            catalog.labs.len(),
            catalog.tests.len(),
            catalog.projects.len()
        );
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let file: CatalogFile = serde_json::from_str(raw)
            .map_err(|e| AppError::InternalServerError(format!("invalid catalog: {}", e)))?;
        validate(&file).map_err(|msg| AppError::InternalServerError(format!("invalid catalog: {}", msg)))?;

        let course_index = file
            .courses
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();

        Ok(Self {
            courses: file.courses,
            course_index,
            labs: file.labs.into_iter().map(|l| (l.id.clone(), l)).collect(),
            tests: file.tests.into_iter().map(|t| (t.id.clone(), t)).collect(),
            projects: file.projects.into_iter().map(|p| (p.id.clone(), p)).collect(),
        })
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn course(&self, id: &str) -> Result<&Course, AppError> {
        self.course_index
            .get(id)
            .map(|&i| &self.courses[i])
            .ok_or_else(|| AppError::NotFound(format!("Course '{}' not found", id)))
    }

    pub fn lab(&self, id: &str) -> Result<&Lab, AppError> {
        self.labs
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("Lab '{}' not found", id)))
    }

    pub fn test(&self, id: &str) -> Result<&Test, AppError> {
        self.tests
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("Test '{}' not found", id)))
    }

    pub fn project(&self, id: &str) -> Result<&Project, AppError> {
        self.projects
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("Project '{}' not found", id)))
    }
}

fn validate(file: &CatalogFile) -> Result<(), String> {
    ensure_unique("course", file.courses.iter().map(|c| c.id.as_str()))?;
    ensure_unique("lab", file.labs.iter().map(|l| l.id.as_str()))?;
    ensure_unique("test", file.tests.iter().map(|t| t.id.as_str()))?;
    ensure_unique("project", file.projects.iter().map(|p| p.id.as_str()))?;

    for course in &file.courses {
        ensure_unique(
            &format!("lesson in course '{}'", course.id),
            course.lessons.iter().map(|l| l.id.as_str()),
        )?;
    }

    for test in &file.tests {
        if test.passing_percentage > 100 {
            return Err(format!(
                "test '{}' has passing_percentage {} above 100",
                test.id, test.passing_percentage
            ));
        }
        ensure_unique(
            &format!("question in test '{}'", test.id),
            test.questions.iter().map(|q| q.id.as_str()),
        )?;
        for question in &test.questions {
            if !question.options.iter().any(|o| o.id == question.correct_option_id) {
                return Err(format!(
                    "question '{}' in test '{}' has a correct option that is not one of its options",
                    question.id, test.id
                ));
            }
        }
    }

    Ok(())
}

fn ensure_unique<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<(), String> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(format!("duplicate {} id '{}'", kind, id));
        }
    }
    Ok(())
}
