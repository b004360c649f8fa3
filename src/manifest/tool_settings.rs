//! Tool settings shipped inside a tool package.
//!
//! The build writes a `DotnetToolSettings.xml` next to the tool's entry
//! point and packs it under `tools/<tfm>/<rid>/`. It names the command and
//! the entry point relative to its own directory.

use anyhow::Result;
use serde::Deserialize;

use super::PackageDescriptor;
use crate::cache::normalize_target;
use crate::error::ManifestError;
use crate::runtime::Runtime;

pub const TOOL_SETTINGS_FILE: &str = "DotnetToolSettings.xml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSettings {
    pub command_name: String,
    /// Package-relative, `/`-separated path of the entry point.
    pub entry_point: String,
    /// How the entry point is launched, e.g. `dotnet` or `executable`.
    pub runner: Option<String>,
}

impl ToolSettings {
    /// Whether the entry point is a managed assembly launched through `dotnet`.
    pub fn runs_through_dotnet(&self) -> bool {
        let runner_is_dotnet = self
            .runner
            .as_deref()
            .is_none_or(|runner| runner.eq_ignore_ascii_case("dotnet"));
        runner_is_dotnet && self.entry_point.to_ascii_lowercase().ends_with(".dll")
    }
}

#[derive(Debug, Deserialize)]
struct DotNetCliTool {
    #[serde(rename = "Commands")]
    commands: Commands,
}

#[derive(Debug, Deserialize)]
struct Commands {
    #[serde(rename = "Command", default)]
    entries: Vec<CommandEntry>,
}

#[derive(Debug, Deserialize)]
struct CommandEntry {
    #[serde(rename = "@Name")]
    name: String,
    #[serde(rename = "@EntryPoint")]
    entry_point: String,
    #[serde(rename = "@Runner", default)]
    runner: Option<String>,
}

/// Find and read the tool settings among the package's files.
#[tracing::instrument(skip(runtime, descriptor), fields(id = %descriptor.id))]
pub fn read_tool_settings<R: Runtime>(
    runtime: &R,
    descriptor: &PackageDescriptor,
) -> Result<ToolSettings> {
    let file = descriptor
        .files
        .iter()
        .find(|file| {
            file.target
                .rsplit('/')
                .next()
                .is_some_and(|name| name.eq_ignore_ascii_case(TOOL_SETTINGS_FILE))
        })
        .ok_or_else(|| ManifestError::ToolSettingsNotFound(descriptor.id.clone()))?;

    let content = runtime.read_to_string(&file.source)?;
    let settings_dir = file.target.rsplit_once('/').map(|(dir, _)| dir);

    let settings = parse(&content, settings_dir).map_err(|reason| ManifestError::Parse {
        path: file.source.clone(),
        reason,
    })?;
    Ok(settings)
}

fn parse(xml: &str, settings_dir: Option<&str>) -> Result<ToolSettings, String> {
    let document: DotNetCliTool = quick_xml::de::from_str(xml).map_err(|e| e.to_string())?;
    let command = document
        .commands
        .entries
        .into_iter()
        .next()
        .ok_or_else(|| "no Command declared".to_string())?;

    let entry_point = match settings_dir {
        Some(dir) => normalize_target(&format!("{}/{}", dir, command.entry_point)),
        None => normalize_target(&command.entry_point),
    };

    Ok(ToolSettings {
        command_name: command.name,
        entry_point,
        runner: command.runner,
    })
}
