use super::{projects, Pipeline};
use crate::catalog::ConnectivityMode;
use crate::value::{Object, ObjectExt, Value};
use std::collections::BTreeSet;

/// Tags of a consumer, given either as a list or as `{items: [...]}`
fn consumer_tags(consumer: &Object) -> BTreeSet<String> {
    let tags: &[Value] = match consumer.get("tags") {
        Some(Value::Array(tags)) => tags.as_slice(),
        Some(Value::Object(tags)) => tags.list("items"),
        _ => &[],
    };

    tags.iter()
        .filter_map(Value::as_str)
        .map(str::to_owned)
        .collect()
}

fn string_set(values: &[Value]) -> BTreeSet<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_owned)
        .collect()
}

impl Pipeline<'_> {
    /// Fill `settings.ipConfiguration.pscConfig.allowedConsumerProjects` of psc producers
    ///
    /// A producer allows every project owning a consumer that shares at least one tag with the producer's
    /// `allowedConsumersTags`. Existing entries are kept; the list is sorted.
    #[tracing::instrument(level = "info", skip_all)]
    pub fn populate_psc_allow_lists(&self, config: &Object) -> Object {
        tracing::info!("populating psc allow-lists from consumer tags");

        let tagged_consumers: Vec<(String, BTreeSet<String>)> = projects(config)
            .filter_map(|project| Some((project.str_field("projectId")?, project)))
            .flat_map(|(project_id, project)| {
                project
                    .objects("consumers")
                    .map(consumer_tags)
                    .filter(|tags| !tags.is_empty())
                    .map(move |tags| (project_id.to_string(), tags))
            })
            .collect();

        let mut populated = config.clone();
        if tagged_consumers.is_empty() {
            return populated;
        }

        for project in populated.objects_mut("projects") {
            for producer in project.objects_mut("producers") {
                if self.catalog.connectivity_mode(producer) != Some(ConnectivityMode::Psc) {
                    continue;
                }

                let allowed_tags = string_set(producer.list("allowedConsumersTags"));
                if allowed_tags.is_empty() {
                    continue;
                }

                let psc_config = producer
                    .object_entry("settings")
                    .object_entry("ipConfiguration")
                    .object_entry("pscConfig");

                let mut allowed_projects = string_set(psc_config.list("allowedConsumerProjects"));
                allowed_projects.extend(
                    tagged_consumers
                        .iter()
                        .filter(|(_, tags)| !tags.is_disjoint(&allowed_tags))
                        .map(|(project_id, _)| project_id.clone()),
                );

                tracing::debug!(?allowed_projects, "psc allow-list");
                psc_config.insert(
                    "allowedConsumerProjects".to_string(),
                    allowed_projects.into_iter().collect::<Vec<_>>().into(),
                );
            }
        }

        populated
    }
}
