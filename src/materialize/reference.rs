//! The snippet a developer pastes into a consuming project.

use crate::manifest::{PackageDescriptor, PackageKind};

/// Render the project-file reference for a materialized library package.
///
/// Tools are installed, not referenced, so they get an empty string.
pub fn package_reference(descriptor: &PackageDescriptor) -> String {
    let id = &descriptor.id;
    let version = &descriptor.declared_version;

    match descriptor.kind {
        PackageKind::Library { sdk: true } => format!(
            "<Project Sdk=\"{id}/{version}\">\nor\n<Sdk Name=\"{id}\" Version=\"{version}\" />"
        ),
        PackageKind::Library { sdk: false } => {
            let private_assets = if descriptor.development_dependency {
                " PrivateAssets=\"all\""
            } else {
                ""
            };
            format!("<PackageReference Include=\"{id}\" Version=\"{version}\"{private_assets} />")
        }
        PackageKind::Tool => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(kind: PackageKind, development_dependency: bool) -> PackageDescriptor {
        PackageDescriptor {
            id: "MyPkg".into(),
            version: "1.0.0-beta".into(),
            declared_version: "1.0.0-beta".into(),
            kind,
            development_dependency,
            files: vec![],
        }
    }

    #[test]
    fn test_package_reference() {
        assert_eq!(
            package_reference(&library(PackageKind::Library { sdk: false }, false)),
            r#"<PackageReference Include="MyPkg" Version="1.0.0-beta" />"#
        );
    }

    #[test]
    fn test_development_dependency_gets_private_assets() {
        assert_eq!(
            package_reference(&library(PackageKind::Library { sdk: false }, true)),
            r#"<PackageReference Include="MyPkg" Version="1.0.0-beta" PrivateAssets="all" />"#
        );
    }

    #[test]
    fn test_msbuild_sdk_reference() {
        let snippet = package_reference(&library(PackageKind::Library { sdk: true }, false));
        let lines: Vec<_> = snippet.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"<Project Sdk="MyPkg/1.0.0-beta">"#,
                "or",
                r#"<Sdk Name="MyPkg" Version="1.0.0-beta" />"#,
            ]
        );
    }

    #[test]
    fn test_reference_uses_declared_version() {
        let mut descriptor = library(PackageKind::Library { sdk: false }, false);
        descriptor.version = "1.0.0".into();
        descriptor.declared_version = "1.0".into();
        assert_eq!(
            package_reference(&descriptor),
            r#"<PackageReference Include="MyPkg" Version="1.0" />"#
        );
    }

    #[test]
    fn test_tool_has_no_reference() {
        assert!(package_reference(&library(PackageKind::Tool, false)).is_empty());
    }
}
