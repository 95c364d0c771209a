//! ps-project: project file format, validation and plant construction.

pub mod build;
pub mod schema;
pub mod validate;

pub use build::{OutputBinding, Plant, build_plant};
pub use schema::*;
pub use validate::{LATEST_VERSION, ValidationError, validate_project};

use ps_equipment::EquipmentError;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Equipment error: {0}")]
    Equipment(#[from] EquipmentError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn from_yaml_str(content: &str) -> ProjectResult<Project> {
    let project: Project = serde_yaml::from_str(content)?;
    validate_project(&project)?;
    Ok(project)
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<Project> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn save_yaml(path: &std::path::Path, project: &Project) -> ProjectResult<()> {
    validate_project(project)?;
    let content = serde_yaml::to_string(project)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_failures_surface_as_project_errors() {
        let err = serde_json::from_str::<f64>("not a number").unwrap_err();
        let err = ProjectError::from(err);
        assert!(matches!(err, ProjectError::Json(_)));
        assert!(err.to_string().starts_with("JSON error"));
    }
}
