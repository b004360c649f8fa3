//! Listing the projects of a solution without the SDK.
//!
//! Three formats exist: the classic `.sln` text format, the XML `.slnx`
//! format, and `.slnf` filters that select projects of another solution.

use anyhow::{Context, Result, bail};
use log::debug;
use quick_xml::events::Event;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

#[derive(Debug, Deserialize)]
struct SolutionFilter {
    solution: FilteredSolution,
}

#[derive(Debug, Deserialize)]
struct FilteredSolution {
    path: String,
    #[serde(default)]
    projects: Vec<String>,
}

/// Projects referenced by `solution`, resolved against the solution's directory.
#[tracing::instrument(skip(runtime))]
pub fn list_projects<R: Runtime>(runtime: &R, solution: &Path) -> Result<Vec<PathBuf>> {
    let content = runtime.read_to_string(solution)?;
    let directory = solution.parent().unwrap_or_else(|| Path::new(""));
    let extension = solution
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();

    let (base, relative) = match extension {
        "sln" => (directory.to_path_buf(), parse_sln(&content)),
        "slnx" => (
            directory.to_path_buf(),
            parse_slnx(&content).with_context(|| format!("Failed to parse {}", solution.display()))?,
        ),
        "slnf" => {
            let filter: SolutionFilter = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", solution.display()))?;
            let referenced = directory.join(to_native(&filter.solution.path));
            let base = referenced
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| directory.to_path_buf());
            (base, filter.solution.projects)
        }
        _ => bail!("{} is not a solution file", solution.display()),
    };

    let mut projects: Vec<PathBuf> = Vec::new();
    for path in relative {
        let project = base.join(to_native(&path));
        if is_vcxproj(&project) {
            debug!("Skipping C++ project {}", project.display());
            continue;
        }
        if !projects.contains(&project) {
            projects.push(project);
        }
    }

    debug!("{} lists {} project(s)", solution.display(), projects.len());
    Ok(projects)
}

/// `Project("{type}") = "Name", "relative\path.csproj", "{guid}"`
fn parse_sln(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with("Project("))
        .filter_map(|line| {
            let (_, rhs) = line.split_once('=')?;
            let path = rhs.split(',').nth(1)?.trim().trim_matches('"');
            // Solution folders are listed as projects too
            path.to_ascii_lowercase()
                .ends_with("proj")
                .then(|| path.to_string())
        })
        .collect()
}

/// Every `<Project Path="..."/>`, at any folder depth.
fn parse_slnx(content: &str) -> Result<Vec<String>> {
    let mut reader = quick_xml::Reader::from_str(content);
    let mut paths = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(element) | Event::Empty(element) if element.name().as_ref() == b"Project" => {
                if let Some(attribute) = element.try_get_attribute("Path")? {
                    paths.push(attribute.unescape_value()?.into_owned());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paths)
}

fn to_native(path: &str) -> PathBuf {
    PathBuf::from(path.replace('\\', std::path::MAIN_SEPARATOR_STR))
}

fn is_vcxproj(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("vcxproj"))
}
