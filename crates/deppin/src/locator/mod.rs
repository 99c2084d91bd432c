//! Resolver locator.
//!
//! Given a package and its import path, find the resolver that pins it.
//! The locator walks upward from the package's governing directory, binds
//! every directory it consults to the lockfile found there (or to nothing),
//! and tries the resulting chain in order.
//!
//! Three policies shape the walk:
//!
//! - **nested**: directories below a `vendor` component of the project are
//!   skipped unless `allow-nested-vendor` is set.
//! - **deep**: stepping up out of a `vendor` directory is a hop. Only one
//!   hop is taken unless `allow-deep-vendor` is set.
//! - **external**: directories outside the project root are consulted only
//!   when `allow-external-vendor` permits the import path. A directory that
//!   is both nested and external needs both policies.
//!
//! Bindings are memoized per directory, so each directory is examined at
//! most once per analysis.

mod project;

pub use project::{Project, ProjectCache};

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use deppin_config::Options;
use deppin_graph::{ImportPath, Revision};
use once_cell::sync::OnceCell;
use path_clean::PathClean;
use tracing::trace;

use crate::error::{ResolverRef, Result};
use crate::resolver::{Resolver, UnresolvedResolver};
use crate::toolchain::{Package, is_search_root, vendor_root};

const VENDOR: &str = "vendor";

/// Outcome of locating and consulting resolvers for one import path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// A resolver pinned the import.
    Pinned {
        revision: Revision,
        resolver: ResolverRef,
    },
    /// A resolver knew the import but carried no revision for it.
    NotPinned { resolver: ResolverRef },
    /// Only the unresolved allowlist matched.
    Allowlisted(Revision),
    /// Nothing governs the import.
    NotFound,
}

type Binding = Option<Arc<Resolver>>;

#[derive(Debug)]
pub struct Locator {
    project: Project,
    search_roots: Vec<PathBuf>,
    options: Arc<Options>,
    allowlist: Option<UnresolvedResolver>,
    bindings: DashMap<PathBuf, Arc<OnceCell<Binding>>>,
}

impl Locator {
    pub fn new(project: Project, search_roots: Vec<PathBuf>, options: Arc<Options>) -> Self {
        let allowlist = UnresolvedResolver::from_prefixes(&options.allow_unresolved_prefix);
        Self {
            project,
            search_roots,
            options,
            allowlist,
            bindings: DashMap::new(),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Where the walk for `package` starts: the directory owning its
    /// innermost `vendor` component, or the project root.
    pub fn start_dir(&self, package: &Package) -> PathBuf {
        vendor_root(&package.dir)
            .map(|dir| dir.clean())
            .unwrap_or_else(|| self.project.root.clone())
    }

    /// Directories consulted for `import_path`, in order, starting at
    /// `start`. Pure path arithmetic; nothing is read from disk.
    pub fn walk(&self, start: &Path, import_path: &ImportPath) -> Vec<PathBuf> {
        let start = start.to_path_buf().clean();
        let mut dirs = Vec::new();
        let mut hops = 0usize;

        for dir in start.ancestors() {
            if is_search_root(&self.search_roots, dir) {
                break;
            }
            if dir.file_name().is_some_and(|name| name == VENDOR) {
                hops += 1;
                if hops > 1 && !self.options.allow_deep_vendor {
                    break;
                }
                continue;
            }
            if self.permits(dir, import_path) {
                dirs.push(dir.to_path_buf());
            }
        }
        dirs
    }

    fn permits(&self, dir: &Path, import_path: &ImportPath) -> bool {
        let (nested, external) = match dir.strip_prefix(&self.project.root) {
            Ok(relative) => (has_vendor_component(relative), false),
            Err(_) => (has_vendor_component(dir), true),
        };
        if nested && !self.options.allow_nested_vendor {
            trace!(dir = %dir.display(), "skipping nested vendor directory");
            return false;
        }
        if external && !self.options.permits_external(import_path.as_str()) {
            trace!(dir = %dir.display(), import_path = %import_path, "skipping external directory");
            return false;
        }
        true
    }

    /// The resolver bound to `dir`, loading it on first use. The project
    /// root reuses the lockfile found during project discovery.
    ///
    /// # Errors
    ///
    /// A lockfile that cannot be parsed fails the first lookup that needs it.
    pub fn binding(&self, dir: &Path) -> Result<Binding> {
        let cell = self.bindings.entry(dir.to_path_buf()).or_default().clone();
        let detected = || {
            if dir == self.project.root {
                self.project.lockfile
            } else {
                Resolver::detect(dir)
            }
        };
        cell.get_or_try_init(|| match detected() {
            Some(format) => Resolver::load(dir, format).map(|resolver| Some(Arc::new(resolver))),
            None => Ok(None),
        })
        .cloned()
    }

    /// Number of directories bound so far.
    pub fn bound_dirs(&self) -> usize {
        self.bindings.len()
    }

    /// Resolve `import_path` for `package`.
    pub fn lookup(&self, package: &Package, import_path: &ImportPath) -> Result<Lookup> {
        self.lookup_from(&self.start_dir(package), import_path)
    }

    /// Resolve `import_path` walking up from `start`.
    ///
    /// The first pinned answer wins. A resolver that knows the import
    /// without pinning it is remembered and reported if nothing later pins
    /// it.
    pub fn lookup_from(&self, start: &Path, import_path: &ImportPath) -> Result<Lookup> {
        let mut not_pinned = None;

        for dir in self.walk(start, import_path) {
            let Some(resolver) = self.binding(&dir)? else {
                continue;
            };
            match resolver.resolve(import_path) {
                Some(revision) if revision.is_pinned() => {
                    return Ok(Lookup::Pinned {
                        revision: revision.renamed(import_path.clone()),
                        resolver: resolver.describe(),
                    });
                }
                Some(_) => {
                    not_pinned.get_or_insert_with(|| resolver.describe());
                }
                None => {}
            }
        }

        if let Some(resolver) = not_pinned {
            return Ok(Lookup::NotPinned { resolver });
        }
        Ok(self
            .allowlist
            .as_ref()
            .and_then(|allowlist| allowlist.resolve(import_path))
            .map(Lookup::Allowlisted)
            .unwrap_or(Lookup::NotFound))
    }
}

fn has_vendor_component(path: &Path) -> bool {
    path.components()
        .any(|c| matches!(c, Component::Normal(name) if name == VENDOR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;
    use tempfile::TempDir;

    fn p(s: &str) -> ImportPath {
        ImportPath::new(s).unwrap()
    }

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project(root: &Path) -> Project {
        Project::at(root, &p("example.org/app"), root)
    }

    fn locator(root: &Path, options: Options) -> Locator {
        Locator::new(project(root), Vec::new(), Arc::new(options))
    }

    fn revision_of(lookup: Lookup) -> Option<String> {
        match lookup {
            Lookup::Pinned { revision, .. } => Some(revision.revision),
            _ => None,
        }
    }

    /// `app/` pins `y` in `vendor.conf`; `app/vendor/x` vendors its own `y`.
    fn nested_fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("app");
        write(&app, "vendor.conf", "example.org/y outer-rev\nexample.org/x x-rev\n");
        write(&app, "vendor/example.org/x/x.go", "package x\n");
        write(&app, "vendor/example.org/x/vendor.conf", "example.org/y inner-rev\n");
        write(
            &app,
            "vendor/example.org/x/vendor/example.org/y/y.go",
            "package y\n",
        );
        temp
    }

    #[test]
    fn nested_vendor_is_skipped_by_default() {
        let temp = nested_fixture();
        let app = temp.path().join("app");
        let locator = locator(&app, Options::default());
        let inner = app.join("vendor/example.org/x");

        let lookup = locator.lookup_from(&inner, &p("example.org/y")).unwrap();
        assert_eq!(revision_of(lookup).as_deref(), Some("outer-rev"));
    }

    #[test]
    fn nested_vendor_wins_when_allowed() {
        let temp = nested_fixture();
        let app = temp.path().join("app");
        let options = Options {
            allow_nested_vendor: true,
            ..Options::default()
        };
        let locator = locator(&app, options);
        let inner = app.join("vendor/example.org/x");

        let lookup = locator.lookup_from(&inner, &p("example.org/y")).unwrap();
        assert_eq!(revision_of(lookup).as_deref(), Some("inner-rev"));
    }

    #[test]
    fn start_dir_follows_the_innermost_vendor() {
        let temp = nested_fixture();
        let app = temp.path().join("app");
        let locator = locator(&app, Options::default());

        let mut package = Package::failed(p("example.org/app/vendor/example.org/y"), "");
        package.dir = app.join("vendor/example.org/x/vendor/example.org/y");
        assert_eq!(locator.start_dir(&package), app.join("vendor/example.org/x"));

        package.dir = app.join("cmd");
        assert_eq!(locator.start_dir(&package), app);
    }

    #[test]
    fn deep_walks_need_permission() {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("app");
        write(&app, "vendor.conf", "example.org/z outer-rev\n");
        let deep = app.join("vendor/a/vendor/b");
        fs::create_dir_all(&deep).unwrap();

        let options = Options {
            allow_nested_vendor: true,
            ..Options::default()
        };
        let shallow = locator(&app, options.clone());
        assert!(!shallow.walk(&deep, &p("example.org/z")).contains(&app));
        assert_eq!(
            shallow.lookup_from(&deep, &p("example.org/z")).unwrap(),
            Lookup::NotFound
        );

        let deep_options = Options {
            allow_deep_vendor: true,
            ..options
        };
        let unbounded = locator(&app, deep_options);
        let lookup = unbounded.lookup_from(&deep, &p("example.org/z")).unwrap();
        assert_eq!(revision_of(lookup).as_deref(), Some("outer-rev"));
    }

    #[test]
    fn external_directories_need_permission_and_a_matching_prefix() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Godeps", "example.org/ext shared-rev\n");
        let app = temp.path().join("app");
        fs::create_dir_all(&app).unwrap();

        let closed = locator(&app, Options::default());
        assert_eq!(
            closed.lookup_from(&app, &p("example.org/ext")).unwrap(),
            Lookup::NotFound
        );

        let gated = locator(
            &app,
            Options {
                allow_external_vendor: true,
                allow_external_vendor_prefix: vec!["other.org/".to_string()],
                ..Options::default()
            },
        );
        assert_eq!(
            gated.lookup_from(&app, &p("example.org/ext")).unwrap(),
            Lookup::NotFound
        );

        let open = locator(
            &app,
            Options {
                allow_external_vendor: true,
                allow_external_vendor_prefix: vec!["example.org/".to_string()],
                ..Options::default()
            },
        );
        let lookup = open.lookup_from(&app, &p("example.org/ext")).unwrap();
        assert_eq!(revision_of(lookup).as_deref(), Some("shared-rev"));
    }

    #[test]
    fn nested_external_directories_need_both_permissions() {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("app");
        fs::create_dir_all(&app).unwrap();
        let shared = temp.path().join("shared/vendor/example.org/x");
        write(&shared, "Godeps", "example.org/y shared-rev\n");

        for (nested, external) in [(false, false), (true, false), (false, true), (true, true)] {
            let options = Options {
                allow_nested_vendor: nested,
                allow_external_vendor: external,
                ..Options::default()
            };
            let locator = locator(&app, options);

            let found = locator.walk(&shared, &p("example.org/y")).contains(&shared);
            let lookup = locator.lookup_from(&shared, &p("example.org/y")).unwrap();
            if nested && external {
                assert!(found);
                assert_eq!(revision_of(lookup).as_deref(), Some("shared-rev"));
            } else {
                assert!(!found, "nested={nested} external={external}");
                assert_eq!(lookup, Lookup::NotFound, "nested={nested} external={external}");
            }
        }
    }

    #[test]
    fn project_root_binding_reuses_the_discovered_lockfile() {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("app");
        fs::create_dir_all(&app).unwrap();
        let project = project(&app);
        assert_eq!(project.lockfile, None);

        // Written after discovery, so only a fresh detection would see it.
        write(&app, "vendor.conf", "example.org/lib v1\n");
        let locator = Locator::new(project, Vec::new(), Arc::new(Options::default()));
        assert!(locator.binding(&app).unwrap().is_none());

        let other = temp.path().join("other");
        write(&other, "vendor.conf", "example.org/lib v1\n");
        assert!(locator.binding(&other).unwrap().is_some());
    }

    #[test]
    fn search_roots_bound_the_walk() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Godeps", "example.org/ext shared-rev\n");
        let app = temp.path().join("src/app");
        fs::create_dir_all(&app).unwrap();

        let options = Options {
            allow_external_vendor: true,
            ..Options::default()
        };
        let locator = Locator::new(
            project(&app),
            vec![temp.path().join("src")],
            Arc::new(options),
        );
        assert_eq!(locator.walk(&app, &p("example.org/ext")), vec![app.clone()]);
    }

    #[test]
    fn unpinned_answers_fall_through_to_later_resolvers() {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("app");
        write(&app, "vendor/example.org/lib/lib.go", "package lib\n");
        let locator = locator(&app, Options::default());

        match locator.lookup_from(&app, &p("example.org/lib")).unwrap() {
            Lookup::NotPinned { resolver } => {
                assert_eq!(resolver.format, Some(deppin_config::LockfileFormat::Vendor));
            }
            other => panic!("unexpected lookup: {other:?}"),
        }
    }

    #[test]
    fn allowlist_answers_last() {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("app");
        fs::create_dir_all(&app).unwrap();
        let locator = locator(
            &app,
            Options {
                allow_unresolved_prefix: vec!["internal.corp/".to_string()],
                ..Options::default()
            },
        );

        match locator.lookup_from(&app, &p("internal.corp/secret")).unwrap() {
            Lookup::Allowlisted(revision) => assert!(revision.is_unresolved),
            other => panic!("unexpected lookup: {other:?}"),
        }
        assert_eq!(
            locator.lookup_from(&app, &p("public.org/x")).unwrap(),
            Lookup::NotFound
        );
    }

    #[test]
    fn bindings_are_memoized() {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("app");
        write(&app, "vendor.conf", "example.org/lib v1\n");
        let locator = locator(&app, Options::default());

        assert!(locator.binding(&app).unwrap().is_some());
        fs::remove_file(app.join("vendor.conf")).unwrap();
        assert!(locator.binding(&app).unwrap().is_some());
        assert_eq!(locator.bound_dirs(), 1);
    }

    #[test]
    fn parse_errors_surface_on_first_use() {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("app");
        write(&app, "vendor.conf", "only-a-path\n");
        let locator = locator(&app, Options::default());

        let err = locator.lookup_from(&app, &p("example.org/lib")).unwrap_err();
        assert!(matches!(err, Error::LockfileUnparseable { .. }));
    }
}
