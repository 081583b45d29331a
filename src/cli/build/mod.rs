//! Site building orchestration.
//!
//! Build pipeline phases:
//! - **Init** - Clean output and cache when requested
//! - **Collect** - Load content items and hash their files
//! - **Plan** - Diff hashes against the last build, walk the dependency graph
//! - **Compile** - Parallel Sass compilation of outdated entries
//! - **Finalize** - Write changed outputs, record edges, persist state

mod pipeline;

use anyhow::Result;

use crate::{
    config::SiteConfig,
    freshness::compute_dirs_hash,
    log,
    sass::SassError,
    site::{Identifier, load_items},
    utils::plural_count,
};

/// Outcome of one build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Entries compiled successfully, in identifier order.
    pub compiled: Vec<Identifier>,
    /// Entries skipped because nothing they depend on changed.
    pub unchanged: usize,
    /// Outputs actually rewritten (compiled entries whose CSS differed).
    pub written: usize,
    /// Entries that failed to compile.
    pub errors: Vec<(Identifier, SassError)>,
}

impl BuildReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// One-line summary for logs and watch status.
    pub fn summary(&self) -> String {
        if self.compiled.is_empty() && self.errors.is_empty() {
            return format!("{} up to date", plural_count(self.unchanged, "stylesheet"));
        }
        let mut summary = format!(
            "compiled {}, wrote {}",
            plural_count(self.compiled.len(), "stylesheet"),
            plural_count(self.written, "file")
        );
        if !self.errors.is_empty() {
            summary.push_str(&format!(", {}", plural_count(self.errors.len(), "error")));
        }
        summary
    }
}

/// Build every outdated entry stylesheet.
///
/// Pipeline: init -> collect -> plan -> compile -> finalize
pub fn build_site(config: &SiteConfig) -> Result<BuildReport> {
    pipeline::init_build(config)?;

    // Collect
    let items = load_items(&config.build.content);
    let hashes = pipeline::hash_items(&items);
    let load_paths_hash = compute_dirs_hash(&config.sass.load_paths);

    // Plan
    let mut state = pipeline::restore_state(config);
    let mut graph = state.graph();
    let changes = pipeline::detect_changes(&state, &hashes, load_paths_hash);
    pipeline::prune_removed(config, &changes.removed, &mut state, &mut graph);
    let (outdated, unchanged) = pipeline::plan(config, &items, &graph, &changes);

    // Compile
    let results = pipeline::compile_all(config, &items, &outdated);

    // Finalize
    for (id, hash) in hashes {
        state.set_hash(id, hash);
    }
    state.set_load_paths_hash(load_paths_hash);

    let mut report = BuildReport {
        unchanged,
        ..Default::default()
    };
    for compiled in results {
        graph.record(&compiled.id, &compiled.imports);
        match compiled.result {
            Ok(css) => {
                let path = pipeline::output_path(config, &compiled.id);
                if pipeline::write_if_changed(&path, &css)? {
                    crate::debug!("build"; "wrote {}", config.root_relative(&path).display());
                    report.written += 1;
                }
                state.set_failed(compiled.id.clone(), false);
                report.compiled.push(compiled.id);
            }
            Err(e) => {
                state.set_failed(compiled.id.clone(), true);
                report.errors.push((compiled.id, e));
            }
        }
    }
    report.compiled.sort();
    report.errors.sort_by(|a, b| a.0.cmp(&b.0));

    state.set_graph(&graph);
    state.persist(&config.root)?;

    Ok(report)
}

/// Build once and log the outcome, failing when any entry failed.
pub fn build_and_report(config: &SiteConfig) -> Result<BuildReport> {
    let report = build_site(config)?;

    for (id, error) in &report.errors {
        log!("error"; "{}\n{}", id, error);
    }
    log!("build"; "{}", report.summary());

    if !report.is_ok() {
        anyhow::bail!(
            "{} failed to compile",
            plural_count(report.errors.len(), "stylesheet")
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CACHE_DIR;
    use crate::config::test_parse_config;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Project {
        _dir: TempDir,
        root: PathBuf,
        config: SiteConfig,
    }

    impl Project {
        fn new(toml: &str, files: &[(&str, &str)]) -> Self {
            let dir = TempDir::new().unwrap();
            let root = dir.path().canonicalize().unwrap();
            let mut config = test_parse_config(toml);
            config.root = root.clone();
            config.build.content = root.join("content");
            config.build.output = root.join("output");
            fs::create_dir_all(&config.build.content).unwrap();

            let project = Self {
                _dir: dir,
                root,
                config,
            };
            for (rel, body) in files {
                project.write(rel, body);
            }
            project
        }

        fn write(&self, rel: &str, body: &str) {
            let path = self.config.build.content.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }

        /// Create `vendor/` with `files` and register it as a load path.
        fn vendor(&mut self, files: &[(&str, &str)]) -> PathBuf {
            let vendor = self.root.join("vendor");
            fs::create_dir_all(&vendor).unwrap();
            for (rel, body) in files {
                fs::write(vendor.join(rel), body).unwrap();
            }
            self.config.sass.load_paths = vec![vendor.clone()];
            vendor
        }

        fn output(&self, rel: &str) -> PathBuf {
            self.config.build.output.join(rel)
        }

        fn read_output(&self, rel: &str) -> String {
            fs::read_to_string(self.output(rel)).unwrap()
        }

        fn build(&self) -> BuildReport {
            build_site(&self.config).unwrap()
        }
    }

    fn ids(report: &BuildReport) -> Vec<&str> {
        report.compiled.iter().map(Identifier::as_str).collect()
    }

    #[test]
    fn test_build_writes_entries_not_partials() {
        let project = Project::new(
            "",
            &[
                ("a.scss", "@import \"b\";\n.a { color: red; }"),
                ("_b.scss", ".b { color: blue; }"),
            ],
        );

        let report = project.build();

        assert!(report.is_ok());
        assert_eq!(ids(&report), vec!["/a.scss"]);
        assert_eq!(report.written, 1);
        let css = project.read_output("a.css");
        assert!(css.contains(".b"));
        assert!(css.contains(".a"));
        assert!(!project.output("_b.css").exists());
        assert!(project.root.join(CACHE_DIR).join("state.json").is_file());
    }

    #[test]
    fn test_rebuild_after_editing_import() {
        let project = Project::new(
            "",
            &[
                ("a.scss", "@import \"b\";"),
                ("_b.scss", ".b { color: blue; }"),
                ("other.scss", ".other { margin: 0; }"),
            ],
        );
        project.build();

        let second = project.build();
        assert!(second.compiled.is_empty());
        assert_eq!(second.unchanged, 2);

        project.write("_b.scss", ".b { color: green; }");
        let third = project.build();

        assert_eq!(ids(&third), vec!["/a.scss"]);
        assert_eq!(third.unchanged, 1);
        assert!(project.read_output("a.css").contains("green"));
    }

    #[test]
    fn test_transitive_dependency_change() {
        let project = Project::new(
            "",
            &[
                ("a.scss", "@import \"mid\";"),
                ("_mid.scss", "@import \"leaf\";\n.mid { color: $c; }"),
                ("_leaf.scss", "$c: red;"),
            ],
        );
        project.build();

        project.write("_leaf.scss", "$c: blue;");
        let report = project.build();

        assert_eq!(ids(&report), vec!["/a.scss"]);
        assert!(project.read_output("a.css").contains("blue"));
    }

    #[test]
    fn test_failed_entry_is_retried() {
        let project = Project::new("", &[("a.scss", "@import \"missing\";")]);

        let first = project.build();
        assert_eq!(first.errors.len(), 1);
        assert_eq!(first.errors[0].0.as_str(), "/a.scss");
        assert!(!project.output("a.css").exists());

        let second = project.build();
        assert_eq!(second.errors.len(), 1);

        project.write("_missing.scss", ".m { color: red; }");
        let third = project.build();
        assert!(third.is_ok());
        assert!(project.read_output("a.css").contains(".m"));
    }

    #[test]
    fn test_failed_entry_retried_alone() {
        let project = Project::new(
            "",
            &[("a.scss", "@import \"missing\";"), ("other.scss", ".o { margin: 0; }")],
        );
        project.build();

        let second = project.build();
        assert!(second.compiled.is_empty());
        assert_eq!(second.errors.len(), 1);
        assert_eq!(second.unchanged, 1);
    }

    #[test]
    fn test_added_partial_shadows_load_path() {
        let mut project = Project::new("", &[("a.scss", "@import \"b\";")]);
        project.vendor(&[("_b.scss", ".b { color: red; }")]);
        project.build();
        assert!(project.read_output("a.css").contains("red"));

        project.write("_b.scss", ".b { color: green; }");
        let report = project.build();

        assert_eq!(ids(&report), vec!["/a.scss"]);
        assert!(project.read_output("a.css").contains("green"));
    }

    #[test]
    fn test_load_path_edit_rebuilds() {
        let mut project = Project::new(
            "",
            &[("a.scss", "@import \"v\";"), ("other.scss", ".o { margin: 0; }")],
        );
        let vendor = project.vendor(&[("_v.scss", ".v { color: red; }")]);
        project.build();
        assert!(project.build().compiled.is_empty());

        fs::write(vendor.join("_v.scss"), ".v { color: green; }").unwrap();
        let report = project.build();

        assert_eq!(ids(&report), vec!["/a.scss", "/other.scss"]);
        assert!(project.read_output("a.css").contains("green"));
    }

    #[test]
    fn test_added_non_stylesheet_keeps_entries_fresh() {
        let project = Project::new("", &[("a.scss", ".a { color: red; }")]);
        project.build();

        project.write("notes.md", "# notes");
        let report = project.build();

        assert!(report.compiled.is_empty());
        assert_eq!(report.unchanged, 1);
    }

    #[test]
    fn test_missing_output_is_rebuilt() {
        let project = Project::new("", &[("a.scss", ".a { color: red; }")]);
        project.build();
        fs::remove_file(project.output("a.css")).unwrap();

        let report = project.build();

        assert_eq!(ids(&report), vec!["/a.scss"]);
        assert!(project.output("a.css").exists());
    }

    #[test]
    fn test_force_recompiles_without_rewriting() {
        let mut project = Project::new("", &[("a.scss", ".a { color: red; }")]);
        project.build();

        project.config.build.force = true;
        let report = project.build();

        assert_eq!(ids(&report), vec!["/a.scss"]);
        assert_eq!(report.written, 0);
    }

    #[test]
    fn test_removed_entry_output_deleted() {
        let project = Project::new(
            "",
            &[("a.scss", ".a { color: red; }"), ("css/b.scss", ".b { color: red; }")],
        );
        project.build();
        assert!(project.output("css/b.css").exists());

        fs::remove_file(project.config.build.content.join("css/b.scss")).unwrap();
        let report = project.build();

        assert!(report.compiled.is_empty());
        assert!(!project.output("css/b.css").exists());
        assert!(project.output("a.css").exists());
    }

    #[test]
    fn test_configured_entries() {
        let project = Project::new(
            "[build]\nentries = [\"/main.scss\"]",
            &[("main.scss", ".main { color: red; }"), ("extra.scss", ".x { color: red; }")],
        );

        let report = project.build();

        assert_eq!(ids(&report), vec!["/main.scss"]);
        assert!(!project.output("extra.css").exists());
    }

    #[test]
    fn test_clean_removes_stale_output() {
        let mut project = Project::new("", &[("a.scss", ".a { color: red; }")]);
        project.build();
        let stale = project.output("stale.css");
        fs::write(&stale, "").unwrap();

        project.config.build.clean = true;
        let report = project.build();

        assert_eq!(ids(&report), vec!["/a.scss"]);
        assert!(!stale.exists());
        assert!(project.output("a.css").exists());
    }

    #[test]
    fn test_persisted_graph() {
        let project = Project::new(
            "",
            &[("a.scss", "@import \"b\";"), ("_b.scss", ".b { color: blue; }")],
        );
        project.build();

        let graph = crate::cache::BuildState::restore(&project.root).unwrap().graph();
        let users = graph.used_by(&Identifier::new("/_b.scss")).unwrap();
        assert!(users.contains(&Identifier::new("/a.scss")));
    }

    #[test]
    fn test_summary() {
        let report = BuildReport {
            unchanged: 2,
            ..Default::default()
        };
        assert_eq!(report.summary(), "2 stylesheets up to date");

        let report = BuildReport {
            compiled: vec![Identifier::new("/a.scss")],
            written: 1,
            ..Default::default()
        };
        assert_eq!(report.summary(), "compiled 1 stylesheet, wrote 1 file");
    }
}
