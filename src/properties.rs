use crate::project::Project;

/// Accumulates entries in the Java `.properties` format.
#[derive(Debug, Default)]
pub struct PropertiesWriter {
    out: String,
}

impl PropertiesWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(&mut self, key: &str, value: &str) -> &mut Self {
        self.out.push_str(&escape_key(key));
        self.out.push('=');
        self.out.push_str(&escape_value(value));
        self.out.push('\n');
        self
    }

    /// Comma-separated value, one item per continuation line.
    pub fn list<'v>(&mut self, key: &str, values: impl IntoIterator<Item = &'v str>) -> &mut Self {
        let items: Vec<String> = values
            .into_iter()
            .map(|v| format!("  {}", escape_value(v)))
            .collect();
        self.out.push_str(&escape_key(key));
        self.out.push_str("=\\\n");
        self.out.push_str(&items.join(",\\\n"));
        self.out.push('\n');
        self
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Module block for a single project, keys prefixed with its identifier.
pub fn module_properties(project: &Project, project_key: &str) -> String {
    let id = project.id_as_string();
    let key = |suffix: &str| format!("{id}.{suffix}");

    let mut writer = PropertiesWriter::new();
    writer
        .property(&key("sonar.projectKey"), &format!("{project_key}:{id}"))
        .property(&key("sonar.projectName"), project.name())
        .property(&key("sonar.projectBaseDir"), project.base_dir());

    let files = project.files_in_base_dir();
    if !files.is_empty() {
        let list_key = if project.is_test() {
            "sonar.tests"
        } else {
            "sonar.sources"
        };
        writer.list(&key(list_key), files);
    }

    if let Some(report) = project.fxcop_report_path() {
        writer.property(&key("sonar.cs.fxcop.reportPath"), report);
    }
    if let Some(report) = project.coverage_report_path() {
        writer.property(&key("sonar.cs.vscoveragexml.reportPaths"), report);
    }

    writer.finish()
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // leading whitespace would be dropped by readers
            ' ' if i == 0 => out.push_str("\\ "),
            _ => push_latin(&mut out, c),
        }
    }
    out
}

fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            '\\' | ' ' | ':' | '=' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => push_latin(&mut out, c),
        }
    }
    out
}

/// Readers decode `.properties` streams as ISO-8859-1, so anything outside
/// printable ASCII goes out as `\uXXXX` (surrogate pairs above the BMP).
fn push_latin(out: &mut String, c: char) {
    if matches!(c, ' '..='~') {
        out.push(c);
        return;
    }
    let mut units = [0u16; 2];
    for unit in c.encode_utf16(&mut units) {
        out.push_str(&format!("\\u{unit:04X}"));
    }
}
