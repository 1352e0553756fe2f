use percent_encoding::percent_decode_str;
use regex::Regex;
use std::sync::LazyLock;

use crate::{
    error::PermissionTableError,
    models::{Role, RoutePermission},
};

const ANY_ROLE: &[Role] = &[Role::Admin, Role::Employer, Role::Employee];

/// ROUTE_PERMISSIONS
///
/// The declarative Permission Table. It is a denylist of protected paths: anything
/// that matches no entry is public. Scan order is declaration order and the first
/// match wins, so more specific entries must come before broader ones.
pub static ROUTE_PERMISSIONS: &[RoutePermission] = &[
    RoutePermission {
        path: "/(dashboard)/admin",
        allowed_roles: &[Role::Admin],
        requires_auth: true,
        redirect_to: Some("/"),
    },
    RoutePermission {
        path: "/competitions/create",
        allowed_roles: &[Role::Employer],
        requires_auth: true,
        redirect_to: Some("/competitions"),
    },
    RoutePermission {
        path: "/competitions/[id]/edit",
        allowed_roles: &[Role::Employer, Role::Admin],
        requires_auth: true,
        redirect_to: Some("/competitions"),
    },
    RoutePermission {
        path: "/competitions/[id]/journey",
        allowed_roles: &[Role::Employee],
        requires_auth: true,
        redirect_to: Some("/competitions"),
    },
    RoutePermission {
        path: "/competitions/[id]/quiz/[quizId]",
        allowed_roles: &[Role::Employee],
        requires_auth: true,
        redirect_to: Some("/competitions"),
    },
    RoutePermission {
        path: "/employer",
        allowed_roles: &[Role::Employer],
        requires_auth: true,
        redirect_to: Some("/"),
    },
    RoutePermission {
        path: "/profile",
        allowed_roles: ANY_ROLE,
        requires_auth: true,
        redirect_to: Some("/"),
    },
    RoutePermission {
        path: "/settings",
        allowed_roles: ANY_ROLE,
        requires_auth: true,
        redirect_to: Some("/"),
    },
];

static GLOBAL_TABLE: LazyLock<PermissionTable> = LazyLock::new(|| {
    PermissionTable::new(ROUTE_PERMISSIONS).expect("built-in permission table is valid")
});

/// A table entry after normalization: group segments stripped, and either a
/// literal prefix or an anchored wildcard regex.
#[derive(Debug)]
struct CompiledPermission {
    entry: &'static RoutePermission,
    prefix: String,
    wildcard: Option<Regex>,
}

impl CompiledPermission {
    fn matches(&self, path: &str) -> bool {
        if let Some(wildcard) = &self.wildcard {
            return wildcard.is_match(path);
        }
        // Boundary check: "/profile" covers "/profile/x" but never "/profiles".
        path == self.prefix
            || path
                .strip_prefix(self.prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// PermissionTable
///
/// Immutable, compiled view over a static list of `RoutePermission`s. Shared by
/// both enforcement points (edge filter and client route guard) so the table
/// and its matching rules exist exactly once.
#[derive(Debug)]
pub struct PermissionTable {
    entries: Vec<CompiledPermission>,
}

impl PermissionTable {
    /// Validates and compiles every entry. Fails if an auth-required entry
    /// allows no roles.
    pub fn new(entries: &'static [RoutePermission]) -> Result<Self, PermissionTableError> {
        let entries = entries
            .iter()
            .map(compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// The process-wide table built from `ROUTE_PERMISSIONS`, compiled on first use.
    pub fn global() -> &'static PermissionTable {
        &GLOBAL_TABLE
    }

    /// resolve
    ///
    /// Returns the first entry whose normalized pattern matches `path`, or `None`
    /// when the path is implicitly public. `path` is normalized first, so
    /// `/profile/`, `//profile` and `/profil%65` all resolve like `/profile`.
    pub fn resolve(&self, path: &str) -> Option<&'static RoutePermission> {
        let path = normalize_path(path);
        self.entries
            .iter()
            .find(|compiled| compiled.matches(&path))
            .map(|compiled| compiled.entry)
    }

    pub fn entries(&self) -> impl Iterator<Item = &'static RoutePermission> + '_ {
        self.entries.iter().map(|compiled| compiled.entry)
    }
}

/// Convenience over the global table.
pub fn resolve(path: &str) -> Option<&'static RoutePermission> {
    PermissionTable::global().resolve(path)
}

/// normalize_path
///
/// Canonical form of a request path as a client router would see it:
/// percent-decoded, repeated `/` collapsed, `.` and `..` segments resolved, and
/// no trailing `/` except on the root.
pub fn normalize_path(path: &str) -> String {
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    format!("/{}", segments.join("/"))
}

fn is_group(segment: &str) -> bool {
    segment.len() > 2 && segment.starts_with('(') && segment.ends_with(')')
}

fn is_dynamic(segment: &str) -> bool {
    segment.len() > 2
        && ((segment.starts_with('[') && segment.ends_with(']'))
            || (segment.starts_with('{') && segment.ends_with('}')))
}

fn compile(entry: &'static RoutePermission) -> Result<CompiledPermission, PermissionTableError> {
    if entry.requires_auth && entry.allowed_roles.is_empty() {
        return Err(PermissionTableError::NoRoles(entry.path));
    }

    let segments: Vec<&str> = entry
        .path
        .split('/')
        .filter(|segment| !segment.is_empty() && !is_group(segment))
        .collect();

    let prefix = format!("/{}", segments.join("/"));

    let wildcard = if segments.iter().any(|segment| is_dynamic(segment)) {
        let body = segments
            .iter()
            .map(|segment| {
                if is_dynamic(segment) {
                    "[^/]+".to_string()
                } else {
                    regex::escape(segment)
                }
            })
            .collect::<Vec<_>>()
            .join("/");
        let regex = Regex::new(&format!("^/{body}$")).map_err(|source| {
            PermissionTableError::Pattern {
                path: entry.path,
                source,
            }
        })?;
        Some(regex)
    } else {
        None
    };

    Ok(CompiledPermission {
        entry,
        prefix,
        wildcard,
    })
}
