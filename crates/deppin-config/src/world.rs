//! Build-constraint worlds.
//!
//! A world selects which source files participate in a build: an optional
//! OS, an optional architecture and a set of extra tags. The host world has
//! neither OS nor architecture and reflects whatever the build tool sees
//! on the current machine.

use std::fmt;

use deppin_graph::WorldId;

use crate::options::Options;

/// Operating systems visited by `all-tags`.
pub const OS_TAGS: [&str; 11] = [
    "windows",
    "linux",
    "freebsd",
    "android",
    "darwin",
    "dragonfly",
    "nacl",
    "netbsd",
    "openbsd",
    "plan9",
    "solaris",
];

/// Architectures visited by `all-tags`.
pub const ARCH_TAGS: [&str; 20] = [
    "386",
    "amd64",
    "amd64p32",
    "arm",
    "armbe",
    "arm64",
    "arm64be",
    "ppc64",
    "ppc64le",
    "mips",
    "mipsle",
    "mips64",
    "mips64le",
    "mips64p32",
    "mips64p32le",
    "ppc",
    "s390",
    "s390x",
    "sparc",
    "sparc64",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct World {
    pub os: Option<String>,
    pub arch: Option<String>,
    pub tags: Vec<String>,
}

impl World {
    pub fn host(tags: Vec<String>) -> Self {
        Self {
            os: None,
            arch: None,
            tags,
        }
    }

    pub fn for_os(os: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            os: Some(os.into()),
            arch: None,
            tags,
        }
    }

    pub fn for_arch(arch: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            os: None,
            arch: Some(arch.into()),
            tags,
        }
    }

    pub fn is_host(&self) -> bool {
        self.os.is_none() && self.arch.is_none()
    }

    /// Stable identifier, e.g. `host`, `os=linux`, `arch=arm64+netgo`.
    pub fn id(&self) -> WorldId {
        let mut id = match (&self.os, &self.arch) {
            (None, None) => WorldId::HOST.to_string(),
            (Some(os), None) => format!("os={os}"),
            (None, Some(arch)) => format!("arch={arch}"),
            (Some(os), Some(arch)) => format!("os={os},arch={arch}"),
        };
        for tag in &self.tags {
            id.push('+');
            id.push_str(tag);
        }
        WorldId::new(id)
    }

    /// Environment overrides that switch the build tool's platform view.
    pub fn env(&self) -> Vec<(&'static str, String)> {
        let mut env = Vec::new();
        if let Some(os) = &self.os {
            env.push(("GOOS", os.clone()));
        }
        if let Some(arch) = &self.arch {
            env.push(("GOARCH", arch.clone()));
        }
        env
    }
}

impl fmt::Display for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id(), f)
    }
}

/// Expand the configured worlds. The host world is always last.
pub fn expand_worlds(options: &Options) -> Vec<World> {
    let tags = options.tags.clone();
    let mut worlds = Vec::new();

    if options.all_tags {
        worlds.extend(OS_TAGS.iter().map(|os| World::for_os(*os, tags.clone())));
        worlds.extend(ARCH_TAGS.iter().map(|arch| World::for_arch(*arch, tags.clone())));
    }

    worlds.push(World::host(tags));
    worlds
}
