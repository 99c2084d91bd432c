//! Workspace manifest (`go.mod`) resolver with longest-prefix lookup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use deppin_config::LockfileFormat;
use deppin_graph::{ImportPath, Revision, is_path_prefix};

use super::unparseable;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct ModulesResolver {
    path: PathBuf,
    module: Option<ImportPath>,
    requires: BTreeMap<ImportPath, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    None,
    Require,
    Replace,
    Other,
}

struct Replacement {
    old: String,
    old_version: Option<String>,
    new_version: Option<String>,
}

impl ModulesResolver {
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let fail = |line: usize, reason: String| {
            unparseable(LockfileFormat::GoModules, path, format!("line {line}: {reason}"))
        };

        let mut module = None;
        let mut requires: BTreeMap<String, String> = BTreeMap::new();
        let mut replacements = Vec::new();
        let mut block = Block::None;

        for (index, raw) in content.lines().enumerate() {
            let number = index + 1;
            let line = raw.split("//").next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            if block != Block::None {
                if line == ")" {
                    block = Block::None;
                    continue;
                }
                match block {
                    Block::Require => {
                        let (name, version) = parse_require(line).map_err(|r| fail(number, r))?;
                        requires.insert(name, version);
                    }
                    Block::Replace => {
                        replacements.push(parse_replace(line).map_err(|r| fail(number, r))?);
                    }
                    _ => {}
                }
                continue;
            }

            let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let rest = rest.trim();
            match keyword {
                "module" => {
                    let name = unquote(rest);
                    module = Some(
                        ImportPath::new(name)
                            .map_err(|e| fail(number, format!("{e}: '{name}'")))?,
                    );
                }
                "require" | "replace" | "exclude" | "retract" | "tool" | "godebug"
                    if rest == "(" =>
                {
                    block = match keyword {
                        "require" => Block::Require,
                        "replace" => Block::Replace,
                        _ => Block::Other,
                    };
                }
                "require" => {
                    let (name, version) = parse_require(rest).map_err(|r| fail(number, r))?;
                    requires.insert(name, version);
                }
                "replace" => {
                    replacements.push(parse_replace(rest).map_err(|r| fail(number, r))?);
                }
                _ => {}
            }
        }

        if block != Block::None {
            return Err(fail(content.lines().count(), "unterminated block".to_string()));
        }

        for replacement in replacements {
            let Some(version) = requires.get_mut(&replacement.old) else {
                continue;
            };
            if replacement
                .old_version
                .as_ref()
                .is_some_and(|old| old.as_str() != version.as_str())
            {
                continue;
            }
            // Directory replacements carry no version; the required one stays.
            if let Some(new_version) = replacement.new_version {
                *version = new_version;
            }
        }

        let requires = requires
            .into_iter()
            .map(|(name, version)| {
                ImportPath::new(name.as_str())
                    .map(|module| (module, version))
                    .map_err(|e| {
                        unparseable(LockfileFormat::GoModules, path, format!("{e}: '{name}'"))
                    })
            })
            .collect::<Result<_>>()?;

        Ok(Self {
            path: path.to_path_buf(),
            module,
            requires,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `module` line, if any.
    pub fn module(&self) -> Option<&ImportPath> {
        self.module.as_ref()
    }

    /// Resolve through the longest required module path that prefixes
    /// `import_path`.
    pub fn resolve(&self, import_path: &ImportPath) -> Option<Revision> {
        self.requires
            .iter()
            .filter(|(module, _)| is_path_prefix(module.as_str(), import_path.as_str()))
            .max_by(|(a, _), (b, _)| {
                a.as_str()
                    .len()
                    .cmp(&b.as_str().len())
                    .then_with(|| b.cmp(a))
            })
            .map(|(_, version)| Revision::pinned(import_path.clone(), version.clone()))
    }

    pub fn entries(&self) -> Vec<Revision> {
        self.requires
            .iter()
            .map(|(module, version)| Revision::pinned(module.clone(), version.clone()))
            .collect()
    }
}

fn unquote(s: &str) -> &str {
    s.trim().trim_matches('"').trim_matches('`')
}

fn parse_require(line: &str) -> std::result::Result<(String, String), String> {
    let fields: Vec<&str> = line.split_whitespace().map(unquote).collect();
    match fields.as_slice() {
        [name, version] => Ok((name.to_string(), version.to_string())),
        _ => Err(format!("expected '<module> <version>', found '{line}'")),
    }
}

fn parse_replace(line: &str) -> std::result::Result<Replacement, String> {
    let Some((old, new)) = line.split_once("=>") else {
        return Err(format!("expected '<module> => <replacement>', found '{line}'"));
    };
    let old: Vec<&str> = old.split_whitespace().map(unquote).collect();
    let new: Vec<&str> = new.split_whitespace().map(unquote).collect();

    let (old, old_version) = match old.as_slice() {
        [name] => (name.to_string(), None),
        [name, version] => (name.to_string(), Some(version.to_string())),
        _ => return Err(format!("bad replace source in '{line}'")),
    };
    let new_version = match new.as_slice() {
        [_directory] => None,
        [_module, version] => Some(version.to_string()),
        _ => return Err(format!("bad replace target in '{line}'")),
    };

    Ok(Replacement {
        old,
        old_version,
        new_version,
    })
}
