//! File processing logic for unstatic
//!
//! Files are read and parsed in parallel into one project set, so a fix can
//! rewrite a declaration in whichever unit it lives.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use unstatic_core::{ProjectSet, SourceTree, UnitId};
use unstatic_rules::{fix_all, Diagnostic, RuleRegistry};

use crate::config::Config;

/// Files found on the command line
pub struct CollectedFiles {
    pub files: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
}

/// Expand the given paths into source files, honouring config filters
pub fn collect_files(paths: &[PathBuf], config: &Config) -> CollectedFiles {
    let mut files: Vec<PathBuf> = Vec::new();
    let mut missing: Vec<PathBuf> = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            for entry in walkdir::WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && config.has_extension(e.path()))
            {
                let file_path = entry.path();
                if !config.should_exclude(file_path) {
                    files.push(file_path.to_path_buf());
                }
            }
        } else {
            missing.push(path.clone());
        }
    }

    // Sort for deterministic output
    files.sort();
    files.dedup();

    CollectedFiles { files, missing }
}

/// Outcome of loading one file (for parallel processing)
enum UnitLoad {
    Parsed(SourceTree),
    /// Parse error occurred
    ParseError(String),
    /// Other error occurred
    Error(String),
}

/// Units parsed from disk plus the files that could not be loaded
pub struct LoadedProject {
    pub project: ProjectSet,
    paths: HashMap<UnitId, PathBuf>,
    pub failures: Vec<LoadFailure>,
}

/// A file that could not be loaded
pub struct LoadFailure {
    pub path: PathBuf,
    pub message: String,
}

impl LoadedProject {
    /// Path a unit was loaded from
    pub fn path(&self, unit: &UnitId) -> Option<&Path> {
        self.paths.get(unit).map(PathBuf::as_path)
    }
}

/// Identifier used for a file's unit
pub fn unit_id(path: &Path) -> UnitId {
    UnitId::from(path.display().to_string())
}

/// Read and parse files in parallel
pub fn load_project(files: &[PathBuf]) -> LoadedProject {
    let loads: Vec<UnitLoad> = files.par_iter().map(|path| load_unit(path)).collect();

    let mut units = Vec::new();
    let mut paths = HashMap::new();
    let mut failures = Vec::new();

    for (path, load) in files.iter().zip(loads) {
        match load {
            UnitLoad::Parsed(tree) => {
                let id = unit_id(path);
                paths.insert(id.clone(), path.clone());
                units.push((id, tree));
            }
            UnitLoad::ParseError(message) => failures.push(LoadFailure {
                path: path.clone(),
                message: format!("Parse error, skipping: {}", message),
            }),
            UnitLoad::Error(message) => failures.push(LoadFailure {
                path: path.clone(),
                message,
            }),
        }
    }

    LoadedProject {
        project: units.into_iter().collect(),
        paths,
        failures,
    }
}

fn load_unit(path: &Path) -> UnitLoad {
    let source = match std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))
    {
        Ok(source) => source,
        Err(e) => return UnitLoad::Error(format!("{:#}", e)),
    };

    match unstatic_core::parse(&source) {
        Ok(tree) => UnitLoad::Parsed(tree),
        Err(e) => UnitLoad::ParseError(e.to_string()),
    }
}

/// Detection and fix results for a whole project
pub struct Analysis {
    pub diagnostics: Vec<Diagnostic>,
    pub fixed: ProjectSet,
    pub applied: Vec<&'static str>,
}

impl Analysis {
    /// Diagnostics reported in one unit
    pub fn diagnostics_for<'a>(&'a self, unit: &'a UnitId) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics.iter().filter(move |d| &d.unit == unit)
    }
}

/// Detect diagnostics and compute the fixed project
pub fn analyze(
    project: &ProjectSet,
    registry: &RuleRegistry,
    enabled_rules: &HashSet<String>,
) -> Analysis {
    let diagnostics = registry.check_project(project, enabled_rules);
    let result = fix_all(project, registry, enabled_rules);
    Analysis {
        diagnostics,
        fixed: result.project,
        applied: result.applied,
    }
}

/// A unit whose text differs between two project sets
pub struct UnitChange {
    pub old_source: String,
    pub new_source: String,
}

/// Text of the unit in `after`, if it differs from `before`
pub fn unit_change(before: &ProjectSet, after: &ProjectSet, unit: &UnitId) -> Option<UnitChange> {
    let old = before.get(unit)?;
    let new = after.get(unit)?;
    if old.same_generation(new) {
        return None;
    }
    let old_source = old.text();
    let new_source = new.text();
    (old_source != new_source).then_some(UnitChange {
        old_source,
        new_source,
    })
}

/// Write the processed result to the file
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn enabled() -> HashSet<String> {
        ["unstatic_class".to_string()].into_iter().collect()
    }

    #[test]
    fn test_collect_files_filters_and_excludes() {
        let temp = TempDir::new().unwrap();
        let a = write(temp.path(), "src/A.cs", "class A { }");
        write(temp.path(), "src/readme.md", "# docs");
        write(temp.path(), "obj/Gen.cs", "class G { }");
        write(temp.path(), "src/Form.Designer.cs", "class F { }");
        let missing = temp.path().join("nope");

        let config = Config {
            paths: crate::config::PathsConfig {
                exclude: vec!["obj/".to_string(), "*.Designer.cs".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let collected = collect_files(&[temp.path().to_path_buf(), missing.clone()], &config);
        assert_eq!(collected.files, vec![a]);
        assert_eq!(collected.missing, vec![missing]);
    }

    #[test]
    fn test_load_project_reports_parse_errors() {
        let temp = TempDir::new().unwrap();
        let good = write(temp.path(), "Good.cs", "static class Good { }");
        let bad = write(temp.path(), "Bad.cs", "class Bad {");

        let loaded = load_project(&[bad.clone(), good.clone()]);
        assert_eq!(loaded.project.len(), 1);
        assert_eq!(loaded.path(&unit_id(&good)), Some(good.as_path()));
        assert_eq!(loaded.failures.len(), 1);
        assert_eq!(loaded.failures[0].path, bad);
        assert!(loaded.failures[0].message.starts_with("Parse error, skipping"));
    }

    #[test]
    fn test_analyze_and_write_back() {
        let temp = TempDir::new().unwrap();
        let a = write(
            temp.path(),
            "A.cs",
            "static class A\n{\n    public static void Run() { }\n}\n",
        );
        let b = write(temp.path(), "B.cs", "class B { }\n");

        let loaded = load_project(&[a.clone(), b.clone()]);
        let analysis = analyze(&loaded.project, &RuleRegistry::new(), &enabled());
        assert_eq!(analysis.diagnostics.len(), 1);
        assert_eq!(analysis.applied.len(), 1);

        let unit_a = unit_id(&a);
        assert_eq!(analysis.diagnostics_for(&unit_a).count(), 1);
        let change = unit_change(&loaded.project, &analysis.fixed, &unit_a).unwrap();
        assert_eq!(change.new_source, "class A\n{\n    public void Run() { }\n}\n");
        assert!(unit_change(&loaded.project, &analysis.fixed, &unit_id(&b)).is_none());

        write_file(&a, &change.new_source).unwrap();
        assert_eq!(fs::read_to_string(&a).unwrap(), change.new_source);
    }
}
