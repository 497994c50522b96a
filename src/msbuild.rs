use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::{Document, Node};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::project::{Project, paths};

/// Reports produced outside the build that should travel with the project.
#[derive(Clone, Debug, Default)]
pub struct ProjectReports {
    pub fxcop: Option<String>,
    pub coverage: Option<String>,
}

/// Project type GUID that Visual Studio stamps on MSTest projects.
const TEST_PROJECT_TYPE: &str = "3AC096D0-A1C2-E12C-1390-A8335801FDAB";

/// Build a [`Project`] from the contents of an MSBuild project file.
///
/// `xml` is the text of the file at `build_file_path`; reading it is up to the
/// caller.
pub fn parse_project(build_file_path: &str, xml: &str, reports: ProjectReports) -> Result<Project> {
    let doc = Document::parse(xml)
        .with_context(|| format!("Failed to parse XML in {build_file_path}"))?;

    let root = doc.root_element();
    if root.tag_name().name() != "Project" {
        bail!(
            "{build_file_path}: expected a <Project> root element, found <{}>",
            root.tag_name().name()
        );
    }

    let id = match property(&root, "ProjectGuid") {
        Some(raw) => Uuid::parse_str(raw)
            .with_context(|| format!("{build_file_path}: invalid ProjectGuid `{raw}`"))?,
        None => {
            debug!(build_file = %build_file_path, "no ProjectGuid, deriving one from the path");
            Uuid::new_v5(&Uuid::NAMESPACE_URL, build_file_path.as_bytes())
        }
    };

    let name = property(&root, "AssemblyName")
        .unwrap_or_else(|| paths::file_stem(build_file_path))
        .to_string();

    let base_dir = paths::parent_dir(build_file_path);
    let files: Vec<String> = items(&root, "Compile")
        .flat_map(|include| include.split(';'))
        .map(str::trim)
        .filter(|include| !include.is_empty())
        .filter_map(|include| resolve_include(base_dir, include, build_file_path))
        .collect();

    let is_test = is_test_project(&root);
    debug!(
        build_file = %build_file_path,
        name = %name,
        files = files.len(),
        is_test,
        "parsed project"
    );

    Ok(Project::new(
        name,
        id,
        build_file_path,
        is_test,
        files,
        reports.fxcop,
        reports.coverage,
    ))
}

fn resolve_include(base_dir: &str, include: &str, build_file_path: &str) -> Option<String> {
    if include.contains(['*', '?']) || include.contains("$(") || include.contains("@(") {
        warn!(
            build_file = %build_file_path,
            include,
            "skipping Compile item that needs expansion"
        );
        return None;
    }

    if paths::is_absolute(include) {
        Some(include.to_string())
    } else {
        Some(paths::join(base_dir, include))
    }
}

/// First non-empty value of a property, looked up in every `PropertyGroup`.
fn property<'a>(root: &Node<'a, '_>, name: &str) -> Option<&'a str> {
    root.children()
        .filter(|group| group.has_tag_name("PropertyGroup"))
        .flat_map(|group| group.children())
        .filter(|node| node.is_element() && node.tag_name().name() == name)
        .filter_map(|node| node.text())
        .map(str::trim)
        .find(|text| !text.is_empty())
}

/// `Include` attributes of every item of the given kind, in document order.
fn items<'a>(root: &Node<'a, '_>, kind: &'a str) -> impl Iterator<Item = &'a str> {
    root.children()
        .filter(|group| group.has_tag_name("ItemGroup"))
        .flat_map(|group| group.children())
        .filter(move |node| node.is_element() && node.tag_name().name() == kind)
        .filter_map(|node| node.attribute("Include"))
}

static TEST_FRAMEWORK_RE: Lazy<Regex> = Lazy::new(|| {
    // Reference includes may carry an assembly qualifier: `nunit.framework, Version=...`
    Regex::new(
        r"(?i)^\s*(Microsoft\.VisualStudio\.QualityTools\.UnitTestFramework|MSTest\.TestFramework|xunit(\.core)?|nunit(\.framework)?)\s*(,|$)",
    )
    .expect("regex for test framework references should compile")
});

fn is_test_project(root: &Node<'_, '_>) -> bool {
    if let Some(guids) = property(root, "ProjectTypeGuids") {
        if guids.to_ascii_uppercase().contains(TEST_PROJECT_TYPE) {
            return true;
        }
    }

    if property(root, "IsTestProject").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
        return true;
    }

    items(root, "Reference")
        .chain(items(root, "PackageReference"))
        .any(|include| TEST_FRAMEWORK_RE.is_match(include))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASSIC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project ToolsVersion="12.0" DefaultTargets="Build" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup>
    <ProjectGuid>{DB2E5521-3172-47B9-BA50-864F12E6DFFF}</ProjectGuid>
    <OutputType>Library</OutputType>
    <AssemblyName>Example.Core</AssemblyName>
  </PropertyGroup>
  <ItemGroup>
    <Reference Include="System" />
  </ItemGroup>
  <ItemGroup>
    <Compile Include="Foo.cs" />
    <Compile Include="Properties\AssemblyInfo.cs" />
    <Compile Include="..\Shared\Linked.cs" />
    <Compile Include="C:\Elsewhere\Generated.cs" />
  </ItemGroup>
</Project>"#;

    #[test]
    fn parses_classic_project() {
        let project =
            parse_project(r"C:\Test\Test.csproj", CLASSIC, ProjectReports::default()).unwrap();

        assert_eq!(project.name(), "Example.Core");
        assert_eq!(project.id_as_string(), "DB2E5521-3172-47B9-BA50-864F12E6DFFF");
        assert!(!project.is_test());
        assert_eq!(
            project.files().to_vec(),
            vec![
                r"C:\Test\Foo.cs".to_string(),
                r"C:\Test\Properties\AssemblyInfo.cs".to_string(),
                r"C:\Shared\Linked.cs".to_string(),
                r"C:\Elsewhere\Generated.cs".to_string(),
            ]
        );
        assert_eq!(
            project.files_in_base_dir(),
            vec![
                r"C:\Test\Foo.cs",
                r"C:\Test\Properties\AssemblyInfo.cs",
            ]
        );
        assert_eq!(project.fxcop_report_path(), None);
    }

    #[test]
    fn attaches_reports() {
        let reports = ProjectReports {
            fxcop: Some(r"C:\fxcop-report.xml".to_string()),
            coverage: Some(r"C:\visualstudio-coverage.xml".to_string()),
        };
        let project = parse_project(r"C:\Test\Test.csproj", CLASSIC, reports).unwrap();

        assert_eq!(project.fxcop_report_path(), Some(r"C:\fxcop-report.xml"));
        assert_eq!(
            project.coverage_report_path(),
            Some(r"C:\visualstudio-coverage.xml")
        );
    }

    #[test]
    fn missing_guid_and_name_fall_back_to_path() {
        let xml = r#"<Project Sdk="Microsoft.NET.Sdk"><ItemGroup><Compile Include="A.cs;B.cs" /></ItemGroup></Project>"#;
        let first = parse_project("/src/app/App.csproj", xml, ProjectReports::default()).unwrap();
        let again = parse_project("/src/app/App.csproj", xml, ProjectReports::default()).unwrap();
        let other = parse_project("/src/lib/Lib.csproj", xml, ProjectReports::default()).unwrap();

        assert_eq!(first.name(), "App");
        assert_eq!(first.id(), again.id());
        assert_ne!(first.id(), other.id());
        assert_eq!(
            first.files().to_vec(),
            vec!["/src/app/A.cs".to_string(), "/src/app/B.cs".to_string()]
        );
    }

    #[test]
    fn root_level_build_file_resolves_includes_absolutely() {
        let xml = r#"<Project><ItemGroup><Compile Include="Foo.cs" /></ItemGroup></Project>"#;
        let project = parse_project("/App.csproj", xml, ProjectReports::default()).unwrap();

        assert_eq!(project.base_dir(), "/");
        assert_eq!(project.files().to_vec(), vec!["/Foo.cs".to_string()]);
        assert_eq!(project.files_in_base_dir(), vec!["/Foo.cs"]);
    }

    #[test]
    fn skips_wildcards_and_msbuild_expansions() {
        let xml = r#"<Project>
  <ItemGroup>
    <Compile Include="**\*.cs" />
    <Compile Include="$(SharedDir)\Common.cs" />
    <Compile Include="Kept.cs" />
  </ItemGroup>
</Project>"#;
        let project = parse_project(r"C:\Test\Test.csproj", xml, ProjectReports::default()).unwrap();
        assert_eq!(project.files().to_vec(), vec![r"C:\Test\Kept.cs".to_string()]);
    }

    #[test]
    fn detects_test_projects() {
        let by_type = r#"<Project><PropertyGroup><ProjectTypeGuids>{3ac096d0-a1c2-e12c-1390-a8335801fdab};{FAE04EC0-301F-11D3-BF4B-00C04F79EFBC}</ProjectTypeGuids></PropertyGroup></Project>"#;
        let by_flag = r#"<Project><PropertyGroup><IsTestProject>true</IsTestProject></PropertyGroup></Project>"#;
        let by_reference = r#"<Project><ItemGroup><Reference Include="Microsoft.VisualStudio.QualityTools.UnitTestFramework, Version=10.1.0.0, Culture=neutral" /></ItemGroup></Project>"#;
        let by_package = r#"<Project><ItemGroup><PackageReference Include="xunit" Version="2.4.1" /></ItemGroup></Project>"#;
        let lookalike = r#"<Project><ItemGroup><PackageReference Include="xunitx.Helpers" Version="1.0.0" /></ItemGroup></Project>"#;

        for xml in [by_type, by_flag, by_reference, by_package] {
            let project = parse_project(r"C:\T\T.csproj", xml, ProjectReports::default()).unwrap();
            assert!(project.is_test(), "expected a test project for {xml}");
        }
        let project = parse_project(r"C:\T\T.csproj", lookalike, ProjectReports::default()).unwrap();
        assert!(!project.is_test());
    }

    #[test]
    fn rejects_invalid_input() {
        let err = parse_project(r"C:\T\T.csproj", "<Project>", ProjectReports::default())
            .unwrap_err();
        assert!(err.to_string().contains(r"C:\T\T.csproj"), "got: {err}");

        let err = parse_project(r"C:\T\T.csproj", "<Solution/>", ProjectReports::default())
            .unwrap_err();
        assert!(err.to_string().contains("<Project>"), "got: {err}");

        let bad_guid = r#"<Project><PropertyGroup><ProjectGuid>not-a-guid</ProjectGuid></PropertyGroup></Project>"#;
        let err = parse_project(r"C:\T\T.csproj", bad_guid, ProjectReports::default())
            .unwrap_err();
        assert!(err.to_string().contains("invalid ProjectGuid"), "got: {err}");
    }
}
