// Suite and case identity

use std::path::{Component, Path, PathBuf};

/// Named collection of test cases loaded from one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite {
    pub name: String,
    pub path: PathBuf,
}

impl Suite {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Dotted package derived from the directory the suite lives in.
    ///
    /// `tests/api/users.yaml` becomes `tests.api`. Root, `.` and `..`
    /// components are dropped.
    pub fn package_name(&self) -> String {
        let dir = self.path.parent().unwrap_or_else(|| Path::new(""));
        dir.components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Package-qualified suite name, e.g. `tests.api.Users`
    pub fn full_name(&self) -> String {
        let package = self.package_name();
        if package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", package, self.name)
        }
    }
}

/// Single test unit within a suite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    pub name: String,
}

impl Case {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name_from_nested_path() {
        let suite = Suite::new("Users", "tests/api/users.yaml");
        assert_eq!(suite.package_name(), "tests.api");
        assert_eq!(suite.full_name(), "tests.api.Users");
    }

    #[test]
    fn test_package_name_skips_relative_and_root_components() {
        let suite = Suite::new("Users", "./../tests/api/users.yaml");
        assert_eq!(suite.package_name(), "tests.api");

        let suite = Suite::new("Users", "/srv/tests/users.yaml");
        assert_eq!(suite.package_name(), "srv.tests");
    }

    #[test]
    fn test_full_name_without_package() {
        let suite = Suite::new("Smoke", "smoke.yaml");
        assert_eq!(suite.package_name(), "");
        assert_eq!(suite.full_name(), "Smoke");
    }
}
