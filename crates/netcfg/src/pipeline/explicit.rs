use super::{Pipeline, PROJECT_METADATA_KEYS};
use crate::util::instance_name;
use crate::value::{Object, ObjectExt, Value};

impl Pipeline<'_> {
    /// Expand every declared resource into its final instances
    ///
    /// `count: N` yields N instances named `<prefix>-<name>-<i>-<suffix>`, a single instance drops the index.
    /// Items without a name are dropped, items without a type are kept but not layered.
    #[tracing::instrument(level = "info", skip_all)]
    pub fn instantiate_explicit(&mut self, config: &Object) -> Object {
        tracing::info!("processing explicit resources");

        let mut processed = config.clone();
        let prefix = config.str_field("namePrefix").unwrap_or_default().to_owned();
        let suffix = config.str_field("nameSuffix").unwrap_or_default().to_owned();

        for project in processed.objects_mut("projects") {
            for (category, resources) in project.iter_mut() {
                if PROJECT_METADATA_KEYS.contains(&category.as_str()) {
                    continue;
                }
                let Value::Array(items) = resources else {
                    continue;
                };

                let declared = std::mem::take(items);
                for item in declared {
                    let Value::Object(item) = item else {
                        tracing::warn!(category, "dropping resource entry that is not an object");
                        continue;
                    };

                    items.extend(
                        self.expand(item, &prefix, &suffix)
                            .into_iter()
                            .map(Value::Object),
                    );
                }
            }
        }

        processed
    }

    fn expand(&mut self, item: Object, prefix: &str, suffix: &str) -> Vec<Object> {
        let Some(base_name) = item
            .get("name")
            .and_then(Value::to_scalar_string)
            .filter(|name| !name.is_empty())
        else {
            tracing::warn!(
                resource_type = item.str_field("type"),
                "dropping resource without 'name'"
            );
            return vec![];
        };

        let count = item
            .get("count")
            .and_then(Value::as_i64)
            .filter(|count| *count > 0)
            .unwrap_or(1) as usize;

        (1..=count)
            .map(|index| {
                let mut instance = item.clone();
                instance.shift_remove("count");
                instance.insert(
                    "name".to_string(),
                    instance_name(prefix, &base_name, suffix, index, count).into(),
                );
                self.instantiate(instance)
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use crate::pipeline::test::{object, orchestrator};
    use crate::value::{ObjectExt, Value};
    use crate::value;
    use pretty_assertions::assert_eq;

    fn names(config: &crate::value::Object, category: &str) -> Vec<String> {
        crate::pipeline::projects(config)
            .flat_map(|project| project.objects(category))
            .filter_map(|resource| resource.str_field("name").map(str::to_owned))
            .collect()
    }

    #[test]
    fn count_expands_into_distinct_names() {
        let orchestrator = orchestrator();
        let mut pipeline = orchestrator.pipeline();
        let config = object(value!({
            "projects": [{
                "projectId": "p1",
                "producers": [{"type": "cloudsql", "name": "db", "count": 3, "tier": "small"}]
            }]
        }));
        pipeline.load_types(&config);

        let processed = pipeline.instantiate_explicit(&config);
        assert_eq!(names(&processed, "producers"), vec!["db-1", "db-2", "db-3"]);

        let project = crate::pipeline::projects(&processed).next().unwrap();
        for producer in project.objects("producers") {
            assert_eq!(producer.get("count"), None);
            assert_eq!(producer["tier"], value!("small"));
        }
    }

    #[test]
    fn prefix_and_suffix_are_applied() {
        let orchestrator = orchestrator();
        let config = object(value!({
            "namePrefix": "Acme",
            "nameSuffix": "prod",
            "projects": [{"projectId": "p1", "vpc": [{"type": "vpc", "name": "Core_Net"}]}]
        }));

        let processed = orchestrator.pipeline().instantiate_explicit(&config);
        assert_eq!(names(&processed, "vpc"), vec!["acme-core-net-prod"]);
    }

    #[test]
    fn invalid_count_is_one() {
        let orchestrator = orchestrator();
        let config = object(value!({
            "projects": [{"projectId": "p1", "vpc": [
                {"type": "vpc", "name": "zero", "count": 0},
                {"type": "vpc", "name": "text", "count": "2"},
                {"type": "vpc", "name": "neg", "count": -4}
            ]}]
        }));

        let processed = orchestrator.pipeline().instantiate_explicit(&config);
        assert_eq!(names(&processed, "vpc"), vec!["zero", "text", "neg"]);
    }

    #[test]
    fn unnamed_dropped_untyped_kept() {
        let orchestrator = orchestrator();
        let config = object(value!({
            "projects": [{"projectId": "p1", "consumers": [
                {"type": "gce"},
                {"name": "Legacy Box", "zone": "a"},
                "garbage"
            ]}]
        }));

        let processed = orchestrator.pipeline().instantiate_explicit(&config);
        let project = crate::pipeline::projects(&processed).next().unwrap();
        assert_eq!(
            project["consumers"],
            value!([{"name": "legacy-box", "zone": "a"}])
        );
    }

    #[test]
    fn metadata_keys_are_left_alone() {
        let orchestrator = orchestrator();
        let config = object(value!({
            "projects": [{
                "projectId": "p1",
                "description": ["not", "a", "category"],
                "labels": {"team": "net"}
            }]
        }));

        let processed = orchestrator.pipeline().instantiate_explicit(&config);
        assert_eq!(processed, config);
        assert!(matches!(processed.get("projects"), Some(Value::Array(_))));
    }
}
