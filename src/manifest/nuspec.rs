//! Wire shape of a `.nuspec` document.
//!
//! Only the parts the linker consumes are modelled; serde skips every other
//! element and attribute.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct Nuspec {
    pub metadata: Metadata,
    #[serde(default)]
    pub files: Option<Files>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Metadata {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub development_dependency: Option<String>,
    #[serde(default)]
    pub package_types: Option<PackageTypes>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PackageTypes {
    #[serde(rename = "packageType", default)]
    pub entries: Vec<PackageTypeEntry>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PackageTypeEntry {
    #[serde(rename = "@name")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct Files {
    #[serde(rename = "file", default)]
    pub entries: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
pub(super) struct FileEntry {
    #[serde(rename = "@src")]
    pub src: String,
    #[serde(rename = "@target", default)]
    pub target: Option<String>,
}

impl Nuspec {
    pub fn parse(xml: &str) -> Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(xml)
    }
}
