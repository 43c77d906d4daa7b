// svctail - platform/catalog.rs
//
// Service catalog: the services.toml file that declares which services and
// groups exist, how each is launched and where its run log lives. It is the
// name lookup behind `SelectionLookup`.
//
// Example:
//
//   log_dir = "logs"              # default run-log directory
//
//   [[service]]
//   name = "api"
//   launch = "cargo run -p api"   # absent or empty: never launched
//   log = "/var/log/api.log"      # default: <log_dir>/<name>.log
//
//   [[group]]
//   name = "backend"
//   groups = ["storage"]
//   services = ["api"]
//
// Services and groups share one namespace. Relative paths resolve against the
// directory containing services.toml. All validation happens at load time so
// that resolving a selection later can only fail on an unknown name.

use crate::core::model::{GroupDescriptor, ServiceDescriptor, ServiceOrGroup};
use crate::core::resolve::SelectionLookup;
use crate::util::constants;
use crate::util::error::{CatalogError, ResolutionError};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

// =============================================================================
// On-disk structures
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCatalog {
    log_dir: Option<String>,
    #[serde(rename = "service")]
    services: Vec<RawService>,
    #[serde(rename = "group")]
    groups: Vec<RawGroup>,
}

#[derive(Debug, Deserialize)]
struct RawService {
    #[serde(default)]
    name: String,
    launch: Option<String>,
    log: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    #[serde(default)]
    name: String,
    #[serde(default)]
    groups: Vec<String>,
    #[serde(default)]
    services: Vec<String>,
}

// =============================================================================
// ServiceCatalog
// =============================================================================

/// Validated catalog with every group expanded into its full tree.
#[derive(Debug, Default)]
pub struct ServiceCatalog {
    services: HashMap<String, ServiceDescriptor>,
    groups: HashMap<String, GroupDescriptor>,
}

impl ServiceCatalog {
    /// Load and validate a services.toml file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let catalog = Self::parse(&content, path)?;

        tracing::info!(
            path = %path.display(),
            services = catalog.services.len(),
            groups = catalog.groups.len(),
            "Service catalog loaded"
        );
        Ok(catalog)
    }

    /// Parse catalog text. `path` is used for error messages and to resolve
    /// relative log paths.
    pub fn parse(content: &str, path: &Path) -> Result<Self, CatalogError> {
        let raw: RawCatalog = toml::from_str(content).map_err(|e| CatalogError::TomlParse {
            path: path.to_path_buf(),
            source: e,
        })?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let log_dir = match raw.log_dir.as_deref() {
            Some(dir) if !dir.is_empty() => base_dir.join(dir),
            _ => base_dir.to_path_buf(),
        };

        let mut seen: HashSet<&str> = HashSet::new();
        for (index, service) in raw.services.iter().enumerate() {
            if service.name.trim().is_empty() {
                return Err(CatalogError::MissingName { index });
            }
            if !seen.insert(service.name.as_str()) {
                return Err(CatalogError::DuplicateName {
                    name: service.name.clone(),
                });
            }
        }
        for (index, group) in raw.groups.iter().enumerate() {
            if group.name.trim().is_empty() {
                return Err(CatalogError::MissingName {
                    index: raw.services.len() + index,
                });
            }
            if !seen.insert(group.name.as_str()) {
                return Err(CatalogError::DuplicateName {
                    name: group.name.clone(),
                });
            }
        }

        let services: HashMap<String, ServiceDescriptor> = raw
            .services
            .iter()
            .map(|s| {
                let run_log = match s.log.as_deref() {
                    Some(log) if !log.is_empty() => base_dir.join(log),
                    _ => log_dir.join(format!("{}.{}", s.name, constants::RUN_LOG_EXTENSION)),
                };
                let descriptor = ServiceDescriptor {
                    name: s.name.clone(),
                    launch_command: s.launch.clone().filter(|cmd| !cmd.trim().is_empty()),
                    run_log,
                };
                (s.name.clone(), descriptor)
            })
            .collect();

        let raw_groups: HashMap<&str, &RawGroup> =
            raw.groups.iter().map(|g| (g.name.as_str(), g)).collect();

        let mut groups = HashMap::with_capacity(raw_groups.len());
        for group in &raw.groups {
            let mut visiting = Vec::new();
            let tree = expand_group(group, &raw_groups, &services, &mut visiting)?;
            groups.insert(group.name.clone(), tree);
        }

        Ok(Self { services, groups })
    }

    /// Look up a single name.
    pub fn lookup(&self, name: &str) -> Option<ServiceOrGroup> {
        if let Some(service) = self.services.get(name) {
            return Some(ServiceOrGroup::Service(service.clone()));
        }
        self.groups
            .get(name)
            .map(|group| ServiceOrGroup::Group(group.clone()))
    }
}

impl SelectionLookup for ServiceCatalog {
    fn resolve_selection(&self, names: &[String]) -> Result<Vec<ServiceOrGroup>, ResolutionError> {
        names
            .iter()
            .map(|name| {
                self.lookup(name)
                    .ok_or_else(|| ResolutionError::UnknownName { name: name.clone() })
            })
            .collect()
    }
}

/// Expand `group` into a descriptor tree, rejecting unknown members and
/// cycles. `visiting` holds the chain of groups currently being expanded.
fn expand_group(
    group: &RawGroup,
    raw_groups: &HashMap<&str, &RawGroup>,
    services: &HashMap<String, ServiceDescriptor>,
    visiting: &mut Vec<String>,
) -> Result<GroupDescriptor, CatalogError> {
    if visiting.iter().any(|name| name == &group.name) {
        return Err(CatalogError::GroupCycle {
            group: group.name.clone(),
        });
    }
    visiting.push(group.name.clone());

    let mut nested = Vec::with_capacity(group.groups.len());
    for member in &group.groups {
        let child = raw_groups
            .get(member.as_str())
            .ok_or_else(|| CatalogError::UnknownMember {
                group: group.name.clone(),
                member: member.clone(),
            })?;
        nested.push(expand_group(child, raw_groups, services, visiting)?);
    }

    let mut direct = Vec::with_capacity(group.services.len());
    for member in &group.services {
        let service = services
            .get(member)
            .ok_or_else(|| CatalogError::UnknownMember {
                group: group.name.clone(),
                member: member.clone(),
            })?;
        direct.push(service.clone());
    }

    visiting.pop();

    Ok(GroupDescriptor {
        name: group.name.clone(),
        groups: nested,
        services: direct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolve::resolve_sources;
    use std::path::PathBuf;

    const CATALOG: &str = r#"
        log_dir = "logs"

        [[service]]
        name = "S1"
        launch = "./s1"

        [[service]]
        name = "S2"
        launch = "./s2"
        log = "/var/log/s2.log"

        [[service]]
        name = "docs"

        [[group]]
        name = "H"
        services = ["S1"]

        [[group]]
        name = "G"
        groups = ["H"]
        services = ["S2", "docs"]
    "#;

    fn catalog() -> ServiceCatalog {
        ServiceCatalog::parse(CATALOG, Path::new("/etc/svctail/services.toml")).unwrap()
    }

    fn service(catalog: &ServiceCatalog, name: &str) -> ServiceDescriptor {
        match catalog.lookup(name) {
            Some(ServiceOrGroup::Service(service)) => service,
            other => panic!("expected service {name}, got {other:?}"),
        }
    }

    fn group(catalog: &ServiceCatalog, name: &str) -> GroupDescriptor {
        match catalog.lookup(name) {
            Some(ServiceOrGroup::Group(group)) => group,
            other => panic!("expected group {name}, got {other:?}"),
        }
    }

    #[test]
    fn test_run_log_paths() {
        let catalog = catalog();
        assert_eq!(
            service(&catalog, "S1").run_log,
            PathBuf::from("/etc/svctail/logs/S1.log")
        );
        assert_eq!(
            service(&catalog, "S2").run_log,
            PathBuf::from("/var/log/s2.log")
        );
        assert!(!service(&catalog, "docs").has_launch_command());
    }

    #[test]
    fn test_group_resolves_to_nested_then_direct_sources() {
        let catalog = catalog();
        let selection = catalog.resolve_selection(&["G".to_string()]).unwrap();
        let sources = resolve_sources(&selection);
        let names: Vec<_> = sources.iter().map(|s| s.service_name.as_str()).collect();
        assert_eq!(names, ["S1", "S2"]);
    }

    #[test]
    fn test_unknown_name_fails_resolution() {
        let result = catalog().resolve_selection(&["S1".to_string(), "nope".to_string()]);
        match result {
            Err(ResolutionError::UnknownName { name }) => assert_eq!(name, "nope"),
            other => panic!("expected UnknownName, got {other:?}"),
        }
    }

    #[test]
    fn test_group_lookup_holds_expanded_tree() {
        let catalog = catalog();
        let g = group(&catalog, "G");
        assert_eq!(g.groups.len(), 1);
        assert_eq!(g.groups[0].name, "H");
        let direct: Vec<_> = g.services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(direct, ["S2", "docs"]);
    }

    #[test]
    fn test_duplicate_name_across_kinds() {
        let content = r#"
            [[service]]
            name = "api"
            [[group]]
            name = "api"
        "#;
        let result = ServiceCatalog::parse(content, Path::new("services.toml"));
        assert!(matches!(result, Err(CatalogError::DuplicateName { .. })));
    }

    #[test]
    fn test_unknown_member() {
        let content = r#"
            [[group]]
            name = "g"
            services = ["ghost"]
        "#;
        match ServiceCatalog::parse(content, Path::new("services.toml")) {
            Err(CatalogError::UnknownMember { group, member }) => {
                assert_eq!(group, "g");
                assert_eq!(member, "ghost");
            }
            other => panic!("expected UnknownMember, got {other:?}"),
        }
    }

    #[test]
    fn test_group_cycle_is_rejected() {
        let content = r#"
            [[group]]
            name = "a"
            groups = ["b"]
            [[group]]
            name = "b"
            groups = ["a"]
        "#;
        let result = ServiceCatalog::parse(content, Path::new("services.toml"));
        assert!(matches!(result, Err(CatalogError::GroupCycle { .. })));
    }

    #[test]
    fn test_shared_subgroup_is_not_a_cycle() {
        let content = r#"
            [[service]]
            name = "db"
            launch = "./db"
            [[group]]
            name = "storage"
            services = ["db"]
            [[group]]
            name = "left"
            groups = ["storage"]
            [[group]]
            name = "all"
            groups = ["left", "storage"]
        "#;
        let catalog = ServiceCatalog::parse(content, Path::new("services.toml")).unwrap();
        let all = group(&catalog, "all");
        assert_eq!(all.groups.len(), 2);
    }

    #[test]
    fn test_invalid_toml() {
        let result = ServiceCatalog::parse("[[service]\nname=", Path::new("services.toml"));
        assert!(matches!(result, Err(CatalogError::TomlParse { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ServiceCatalog::load(&dir.path().join("services.toml"));
        assert!(matches!(result, Err(CatalogError::Io { .. })));
    }
}
