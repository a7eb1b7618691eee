//! Role-based access control.
//!
//! Roles are looked up by name in the role registry; each grants a set of
//! [`Permission`] tags. Everything here is pure: callers resolve the role row
//! and hand the permission set in. An unknown role resolves to the empty set,
//! so nothing is visible.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::i18n::{self, Language};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    Dashboard,
    Members,
    Classes,
    Finance,
    Departments,
    Reports,
    Settings,
    About,
}

impl Permission {
    pub const ALL: [Permission; 8] = [
        Permission::Dashboard,
        Permission::Members,
        Permission::Classes,
        Permission::Finance,
        Permission::Departments,
        Permission::Reports,
        Permission::Settings,
        Permission::About,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Dashboard => "Dashboard",
            Permission::Members => "Members",
            Permission::Classes => "Classes",
            Permission::Finance => "Finance",
            Permission::Departments => "Departments",
            Permission::Reports => "Reports",
            Permission::Settings => "Settings",
            Permission::About => "About",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("{:?} is not a valid permission", s))
    }
}

/// The permissions granted by one role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }

    /// Parses stored tags, rejecting anything outside the closed set.
    pub fn parse<S: AsRef<str>>(tags: &[S]) -> Result<Self, String> {
        tags.iter()
            .map(|t| t.as_ref().parse::<Permission>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    pub fn to_tags(&self) -> Vec<String> {
        self.iter().map(|p| p.as_str().to_string()).collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Allow/deny for one page. No side effects.
pub fn is_allowed(permissions: &PermissionSet, requested: Permission) -> bool {
    permissions.contains(requested)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavSubItem {
    pub href: &'static str,
    pub label_key: &'static str,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub permission: Permission,
    pub href: &'static str,
    pub label_key: &'static str,
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_items: Vec<NavSubItem>,
}

struct NavSpec {
    permission: Permission,
    href: &'static str,
    label_key: &'static str,
    sub_items: &'static [(&'static str, &'static str)],
}

// Sidebar order. Exactly one entry per permission.
const NAV_CATALOGUE: [NavSpec; 8] = [
    NavSpec { permission: Permission::Dashboard, href: "/dashboard", label_key: "dashboard", sub_items: &[] },
    NavSpec {
        permission: Permission::Members,
        href: "/members",
        label_key: "members",
        sub_items: &[
            ("/members", "allMembers"),
            ("/members/register", "registerMember"),
            ("/members/transfers", "memberTransfers"),
        ],
    },
    NavSpec { permission: Permission::Classes, href: "/classes", label_key: "classes", sub_items: &[] },
    NavSpec { permission: Permission::Finance, href: "/finance", label_key: "finance", sub_items: &[] },
    NavSpec { permission: Permission::Departments, href: "/departments", label_key: "departments", sub_items: &[] },
    NavSpec { permission: Permission::Reports, href: "/reports", label_key: "reports", sub_items: &[] },
    NavSpec { permission: Permission::About, href: "/about", label_key: "aboutUs", sub_items: &[] },
    NavSpec { permission: Permission::Settings, href: "/settings", label_key: "settings", sub_items: &[] },
];

/// Ordered sidebar entries for a permission set, labelled in `lang`.
pub fn navigation(permissions: &PermissionSet, lang: Language) -> Vec<NavEntry> {
    NAV_CATALOGUE
        .iter()
        .filter(|item| is_allowed(permissions, item.permission))
        .map(|item| NavEntry {
            permission: item.permission,
            href: item.href,
            label_key: item.label_key,
            label: i18n::translate(lang, item.label_key).to_string(),
            sub_items: item
                .sub_items
                .iter()
                .map(|&(href, key)| NavSubItem {
                    href,
                    label_key: key,
                    label: i18n::translate(lang, key).to_string(),
                })
                .collect(),
        })
        .collect()
}

/// Which members/classes a user may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "classes", rename_all = "snake_case")]
pub enum DataScope {
    All,
    Classes(BTreeSet<String>),
}

impl DataScope {
    /// Class-scoped roles see only their assigned classes; an empty
    /// assignment sees nothing.
    pub fn for_user(class_scoped: bool, assigned_classes: &[String]) -> Self {
        if class_scoped {
            DataScope::Classes(assigned_classes.iter().cloned().collect())
        } else {
            DataScope::All
        }
    }

    pub fn admits(&self, grade: &str) -> bool {
        match self {
            DataScope::All => true,
            DataScope::Classes(classes) => classes.contains(grade),
        }
    }
}
