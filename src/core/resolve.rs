// svctail - core/resolve.rs
//
// Source resolution: flattens a selection of services and (nested) groups
// into the ordered list of run logs to read. Pure; the name lookup itself is
// an external collaborator behind the `SelectionLookup` trait.

use crate::core::model::{GroupDescriptor, LogSource, ServiceDescriptor, ServiceOrGroup};
use crate::util::error::ResolutionError;

/// Turns user-supplied names into services and groups.
///
/// Implemented by the service catalog; tests provide in-memory lookups.
pub trait SelectionLookup {
    /// Resolve every name, preserving order. Fails on the first name that
    /// matches neither a service nor a group.
    fn resolve_selection(&self, names: &[String]) -> Result<Vec<ServiceOrGroup>, ResolutionError>;
}

/// Flatten `selection` into log sources.
///
/// Groups contribute their nested groups first (depth-first, in listed
/// order), then their direct services. Services without a launch command
/// contribute nothing. The resulting order is the scan order, which decides
/// tie-breaking in the historical merge and the start order of followers.
pub fn resolve_sources(selection: &[ServiceOrGroup]) -> Vec<LogSource> {
    let mut sources = Vec::new();
    for item in selection {
        match item {
            ServiceOrGroup::Service(service) => push_service(service, &mut sources),
            ServiceOrGroup::Group(group) => push_group(group, &mut sources),
        }
    }
    sources
}

fn push_group(group: &GroupDescriptor, sources: &mut Vec<LogSource>) {
    for nested in &group.groups {
        push_group(nested, sources);
    }
    for service in &group.services {
        push_service(service, sources);
    }
}

fn push_service(service: &ServiceDescriptor, sources: &mut Vec<LogSource>) {
    if !service.has_launch_command() {
        tracing::debug!(service = %service.name, "No launch command, skipping");
        return;
    }
    sources.push(LogSource::new(
        service.name.clone(),
        service.run_log_path().to_path_buf(),
    ));
}

/// Count every service reachable from `selection`, launchable or not.
///
/// Only used to decide whether presentation labels each line with its
/// service name.
pub fn count_services(selection: &[ServiceOrGroup]) -> usize {
    fn count_group(group: &GroupDescriptor) -> usize {
        group.services.len() + group.groups.iter().map(count_group).sum::<usize>()
    }

    selection
        .iter()
        .map(|item| match item {
            ServiceOrGroup::Service(_) => 1,
            ServiceOrGroup::Group(group) => count_group(group),
        })
        .sum()
}
