//! The console's route table.
//!
//! Mirrors what the browser console exposes: a guest-only login screen at
//! `/`, the authenticated `/home` tree, and redirects kept for old links.

use serde::{Deserialize, Serialize};

use crate::constants::{ENTRY_PATH, HOME_PATH};

/// Access requirements attached to a destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMeta {
    #[serde(default)]
    pub requires_auth: bool,
    #[serde(default)]
    pub requires_guest: bool,
}

impl RouteMeta {
    pub const PUBLIC: Self = Self {
        requires_auth: false,
        requires_guest: false,
    };

    pub const AUTH: Self = Self {
        requires_auth: true,
        requires_guest: false,
    };

    pub const GUEST: Self = Self {
        requires_auth: false,
        requires_guest: true,
    };

    /// Child routes inherit their parent's requirements.
    fn merged(self, child: Self) -> Self {
        Self {
            requires_auth: self.requires_auth || child.requires_auth,
            requires_guest: self.requires_guest || child.requires_guest,
        }
    }
}

/// A resolved navigation target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub meta: RouteMeta,
}

impl Destination {
    pub fn new(path: impl Into<String>, meta: RouteMeta) -> Self {
        Self {
            path: path.into(),
            name: None,
            meta,
        }
    }
}

/// One entry of the table, with parent paths already joined in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub name: Option<String>,
    pub meta: RouteMeta,
    /// Static redirect followed before any guard runs.
    pub redirect: Option<String>,
}

/// Flat list of routes, matched by exact (normalized) path.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

/// Static redirects followed by one resolution before giving up.
const MAX_STATIC_REDIRECTS: usize = 8;

const HOME_CHILDREN: [(&str, &str); 5] = [
    ("dashboard", "Dashboard"),
    ("lotes", "Lotes"),
    ("produtos", "Produtos"),
    ("relatorios", "Relatorios"),
    ("graficos", "Graficos"),
];

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The console's routes.
    pub fn console() -> Self {
        let mut table = Self::new();
        table.add(ENTRY_PATH, Some("Login"), RouteMeta::GUEST, None);
        table.add(
            HOME_PATH,
            Some("Home"),
            RouteMeta::AUTH,
            Some(&format!("{HOME_PATH}/dashboard")),
        );
        for (segment, name) in HOME_CHILDREN {
            table.add_child(HOME_PATH, segment, Some(name), RouteMeta::AUTH);
        }
        for (segment, _) in HOME_CHILDREN {
            table.add(
                &format!("/{segment}"),
                None,
                RouteMeta::PUBLIC,
                Some(&format!("{HOME_PATH}/{segment}")),
            );
        }
        table
    }

    pub fn add(
        &mut self,
        path: &str,
        name: Option<&str>,
        meta: RouteMeta,
        redirect: Option<&str>,
    ) -> &mut Self {
        self.routes.push(Route {
            path: normalize(path),
            name: name.map(str::to_string),
            meta,
            redirect: redirect.map(normalize),
        });
        self
    }

    /// Add `segment` under an existing `parent`, inheriting its meta.
    pub fn add_child(
        &mut self,
        parent: &str,
        segment: &str,
        name: Option<&str>,
        meta: RouteMeta,
    ) -> &mut Self {
        let parent = normalize(parent);
        let parent_meta = self
            .find(&parent)
            .map(|r| r.meta)
            .unwrap_or(RouteMeta::PUBLIC);
        let path = format!("{}/{}", parent.trim_end_matches('/'), segment.trim_matches('/'));
        self.add(&path, name, parent_meta.merged(meta), None)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    fn find(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.path == path)
    }

    /// Resolve a requested path, following static redirects.
    ///
    /// Query strings and fragments are ignored for matching. Unknown paths
    /// and redirect cycles resolve to `None`.
    pub fn resolve(&self, requested: &str) -> Option<Destination> {
        let mut path = normalize(requested);
        for _ in 0..=MAX_STATIC_REDIRECTS {
            let route = self.find(&path)?;
            match &route.redirect {
                Some(next) => path = next.clone(),
                None => {
                    return Some(Destination {
                        path: route.path.clone(),
                        name: route.name.clone(),
                        meta: route.meta,
                    });
                }
            }
        }
        tracing::warn!(path = requested, "Redirect cycle in route table");
        None
    }
}

fn normalize(path: &str) -> String {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        ENTRY_PATH.to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_is_guest_only() {
        let dest = RouteTable::console().resolve("/").unwrap();
        assert_eq!(dest.path, "/");
        assert_eq!(dest.name.as_deref(), Some("Login"));
        assert!(dest.meta.requires_guest);
        assert!(!dest.meta.requires_auth);
    }

    #[test]
    fn test_home_redirects_to_dashboard() {
        let dest = RouteTable::console().resolve("/home").unwrap();
        assert_eq!(dest.path, "/home/dashboard");
        assert!(dest.meta.requires_auth);
    }

    #[test]
    fn test_legacy_paths_redirect_into_home() {
        let table = RouteTable::console();
        for segment in ["dashboard", "lotes", "produtos", "relatorios", "graficos"] {
            let dest = table.resolve(&format!("/{segment}")).unwrap();
            assert_eq!(dest.path, format!("/home/{segment}"));
            assert!(dest.meta.requires_auth);
        }
    }

    #[test]
    fn test_normalization() {
        let table = RouteTable::console();
        assert_eq!(table.resolve("home/lotes/").unwrap().path, "/home/lotes");
        assert_eq!(table.resolve("/home/produtos?page=2").unwrap().path, "/home/produtos");
        assert_eq!(table.resolve("").unwrap().path, "/");
    }

    #[test]
    fn test_unknown_path() {
        assert!(RouteTable::console().resolve("/admin").is_none());
    }

    #[test]
    fn test_redirect_cycle_resolves_to_none() {
        let mut table = RouteTable::new();
        table
            .add("/a", None, RouteMeta::PUBLIC, Some("/b"))
            .add("/b", None, RouteMeta::PUBLIC, Some("/a"));
        assert!(table.resolve("/a").is_none());
    }

    #[test]
    fn test_children_inherit_parent_meta() {
        let mut table = RouteTable::new();
        table.add("/area", None, RouteMeta::AUTH, None);
        table.add_child("/area", "sub", None, RouteMeta::PUBLIC);
        assert!(table.resolve("/area/sub").unwrap().meta.requires_auth);
    }
}
