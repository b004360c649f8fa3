use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::error::UserInputError;
use crate::runtime::Runtime;

const SOLUTION_EXTENSIONS: [&str; 3] = ["sln", "slnf", "slnx"];

pub fn is_solution_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOLUTION_EXTENSIONS.contains(&ext))
}

fn is_project_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ext.len() > "proj".len() && ext.ends_with("proj") && !ext.eq_ignore_ascii_case("xproj")
        })
}

/// Turn a command-line path into a project or solution file.
///
/// A directory must contain exactly one solution, or else exactly one project.
#[tracing::instrument(skip(runtime))]
pub fn resolve_project_or_solution<R: Runtime>(runtime: &R, path: &Path) -> Result<PathBuf> {
    if runtime.is_dir(path) {
        let mut entries: Vec<PathBuf> = runtime
            .read_dir(path)?
            .into_iter()
            .filter(|entry| !runtime.is_dir(entry))
            .collect();
        entries.sort();

        let solutions: Vec<&PathBuf> = entries.iter().filter(|p| is_solution_file(p)).collect();
        match solutions.as_slice() {
            [solution] => {
                debug!("Using solution {}", solution.display());
                return Ok((*solution).clone());
            }
            [] => {}
            _ => {
                return Err(UserInputError::new(format!(
                    "Found more than one solution file in {}. Specify which one to use.",
                    path.display()
                ))
                .into());
            }
        }

        let projects: Vec<&PathBuf> = entries.iter().filter(|p| is_project_file(p)).collect();
        return match projects.as_slice() {
            [project] => {
                debug!("Using project {}", project.display());
                Ok((*project).clone())
            }
            [] => Err(UserInputError::new(format!(
                "A project or solution file could not be found in {}. Specify a project or solution file to use.",
                path.display()
            ))
            .into()),
            _ => Err(UserInputError::new(format!(
                "Found more than one project in `{}`. Specify which one to use.",
                path.display()
            ))
            .into()),
        };
    }

    if !runtime.exists(path) {
        return Err(UserInputError::new(format!("File `{}` not found.", path.display())).into());
    }

    Ok(path.to_path_buf())
}
