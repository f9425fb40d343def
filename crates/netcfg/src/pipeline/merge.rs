use crate::util::deep_update;
use crate::value::{Object, ObjectExt, Value};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Merge project entries sharing a `projectId`
///
/// The first occurrence fixes the position, later ones are deep-merged into it. Entries without a `projectId`
/// are dropped.
pub fn merge_duplicate_projects(projects: &[Value]) -> Vec<Value> {
    let mut merged: IndexMap<String, Object> = IndexMap::new();

    for project in projects {
        let Some(project) = project.as_object() else {
            tracing::warn!("dropping project entry that is not an object");
            continue;
        };
        let Some(project_id) = project.str_field("projectId") else {
            tracing::warn!("dropping project entry without 'projectId'");
            continue;
        };

        match merged.get_mut(project_id) {
            Some(existing) => {
                tracing::debug!(project_id, "merging duplicate project definition");
                deep_update(existing, project);
            }
            None => {
                merged.insert(project_id.to_string(), project.clone());
            }
        }
    }

    merged.into_values().map(Value::Object).collect()
}

/// Every distinct `type` declared in any category list of any project
pub fn discover_resource_types(config: &Object) -> BTreeSet<String> {
    super::projects(config)
        .flat_map(|project| project.values())
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|item| item.as_object()?.str_field("type"))
        .map(str::to_owned)
        .collect()
}
