use super::Pipeline;
use crate::value::{Object, ObjectExt, Value};
use indexmap::IndexMap;

impl Pipeline<'_> {
    /// Move inline child resources (e.g. a vpc's `subnets`) into top-level categories of their project
    ///
    /// Children get the catalog's nested type and, for subnetworks, the parent's name as `network`. A vpc that
    /// declares subnets no longer auto-creates them.
    #[tracing::instrument(level = "info", skip_all)]
    pub fn extract_nested(&mut self, config: &Object) -> Object {
        tracing::info!("processing nested resources");

        let catalog = self.catalog;
        let mut extracted_config = config.clone();

        for project in extracted_config.objects_mut("projects") {
            let mut extracted: IndexMap<String, Vec<Value>> = IndexMap::new();

            for resources in project.values_mut() {
                let Value::Array(resources) = resources else {
                    continue;
                };

                for resource in resources.iter_mut().filter_map(Value::as_object_mut) {
                    let Some(resource_type) = resource.str_field("type").map(str::to_owned) else {
                        continue;
                    };

                    for (list_key, nested_type) in catalog.nested_resources(&resource_type) {
                        let Some(children) = resource.shift_remove(list_key) else {
                            continue;
                        };

                        let parent_name = resource.get("name").cloned().unwrap_or_default();
                        tracing::info!(
                            parent = ?parent_name,
                            list_key,
                            "extracting nested resources"
                        );

                        if resource_type == "vpc" {
                            resource.insert("autoCreateSubnetworks".to_string(), false.into());
                        }

                        let Value::Array(children) = children else {
                            tracing::warn!(
                                list_key,
                                "nested resources are not a list, dropping them"
                            );
                            continue;
                        };

                        for child in children {
                            let Value::Object(mut child) = child else {
                                continue;
                            };

                            child.insert("type".to_string(), nested_type.into());
                            if nested_type == "subnetwork" {
                                child.insert("network".to_string(), parent_name.clone());
                            }

                            extracted
                                .entry(list_key.to_string())
                                .or_default()
                                .push(Value::Object(self.types.instantiate(child)));
                        }
                    }
                }
            }

            for (category, resources) in extracted {
                project.array_entry(&category).extend(resources);
            }
        }

        extracted_config
    }
}
