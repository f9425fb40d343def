//! Resources implied by flags on declared resources
//!
//! | trigger                              | derived                                   | placed in            |
//! |--------------------------------------|-------------------------------------------|----------------------|
//! | vpc `createNat: true`                | `router` `router-<vpc>-nat`               | vpc project          |
//! | producer `createRequiredFwRules`     | `firewall_rule` `fw-allow-<producer>`     | network project      |
//! | producer in psc mode                 | `address` + `forwardingrule`              | subnet project       |
//! | producer in scp mode                 | `createScpPolicy` on the subnet's vpc     | (in place)           |
//!
//! Lookups run against the input tree, results are applied to a copy. A rule whose network, subnet or
//! `pscSettings` can not be found is skipped for that producer only.
use super::locate::{find_network, find_subnet};
use super::{projects, psc_settings, Pipeline};
use crate::catalog::ConnectivityMode;
use crate::util::{sanitize_resource_name, MAX_RESOURCE_NAME_LENGTH};
use crate::value::{Object, ObjectExt, Value};
use indexmap::IndexMap;

/// Derived resources by target project and category, in derivation order
#[derive(Debug, Default)]
struct Derived {
    by_project: IndexMap<String, IndexMap<String, Vec<Object>>>,
}

impl Derived {
    fn push(&mut self, project_id: &str, category: &str, resource: Object) {
        self.by_project
            .entry(project_id.to_string())
            .or_default()
            .entry(category.to_string())
            .or_default()
            .push(resource);
    }
}

/// A vpc (by position) that needs a service connection policy for `subnet`
#[derive(Debug)]
struct ScpTarget {
    project: usize,
    vpc: usize,
    subnet: String,
}

fn derived_name(idea: String) -> Value {
    sanitize_resource_name(&idea, MAX_RESOURCE_NAME_LENGTH).into()
}

fn resource<const N: usize>(pairs: [(&'static str, Value); N]) -> Object {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

impl Pipeline<'_> {
    #[tracing::instrument(level = "info", skip_all)]
    pub fn derive_implicit(&mut self, config: &Object) -> Object {
        tracing::info!("deriving implicit resources");

        let mut derived_config = config.clone();
        let mut derived = Derived::default();

        for project in projects(config) {
            self.derive_nat_routers(config, project, &mut derived);
            for producer in project.objects("producers") {
                self.derive_firewall_rule(config, producer, &mut derived);
                self.derive_psc_endpoint(config, producer, &mut derived);
            }
        }

        tracing::info!("checking for service connection policy requirements");
        for target in self.scp_targets(config) {
            let Some(vpc) = derived_config
                .objects_mut("projects")
                .nth(target.project)
                .and_then(|project| project.objects_mut("vpc").nth(target.vpc))
            else {
                continue;
            };

            tracing::info!(
                vpc = vpc.str_field("name"),
                subnet = %target.subnet,
                "enabling service connection policy"
            );
            vpc.insert("createScpPolicy".to_string(), true.into());
            let subnets = vpc.array_entry("subnetsForScpPolicy");
            if !subnets.iter().any(|s| s.as_str() == Some(target.subnet.as_str())) {
                subnets.push(target.subnet.into());
            }
        }

        if !derived.by_project.is_empty() {
            tracing::info!("merging derived resources into configuration");
        }
        for (project_id, categories) in derived.by_project {
            let Some(project) = derived_config
                .objects_mut("projects")
                .find(|project| project.str_field("projectId") == Some(project_id.as_str()))
            else {
                continue;
            };

            for (category, resources) in categories {
                let count = resources.len();
                let resources: Vec<Value> = resources
                    .into_iter()
                    .map(|resource| Value::Object(self.types.instantiate(resource)))
                    .collect();
                project.array_entry(&category).extend(resources);
                tracing::info!(count, %category, %project_id, "added derived resources");
            }
        }

        derived_config
    }

    fn router_region(&self, config: &Object) -> Value {
        config
            .str_field("defaultRegion")
            .or(self.default_region)
            .into()
    }

    fn derive_nat_routers(&self, config: &Object, project: &Object, derived: &mut Derived) {
        let Some(project_id) = project.str_field("projectId") else {
            return;
        };

        for vpc in project.objects("vpc").filter(|vpc| vpc.flag("createNat")) {
            let Some(vpc_name) = vpc.str_field("name") else {
                continue;
            };

            derived.push(
                project_id,
                "routers",
                resource([
                    ("type", "router".into()),
                    ("name", derived_name(format!("router-{vpc_name}-nat"))),
                    (
                        "network",
                        format!("projects/{project_id}/global/networks/{vpc_name}").into(),
                    ),
                    ("region", self.router_region(config)),
                ]),
            );
        }
    }

    fn derive_firewall_rule(&self, config: &Object, producer: &Object, derived: &mut Derived) {
        if !producer.flag("createRequiredFwRules") {
            return;
        }
        let producer_name = producer.str_field("name").unwrap_or_default();

        let network = producer
            .str_field("networkForFirewall")
            .or_else(|| producer.str_field("network"))
            .or_else(|| {
                if self.catalog.connectivity_mode(producer) != Some(ConnectivityMode::Psc) {
                    return None;
                }
                psc_settings(config)?.str_field("networkForPsc")
            });
        let Some(network) = network else {
            tracing::debug!(producer = producer_name, "no network for firewall rule");
            return;
        };

        let Some(location) = find_network(config, network) else {
            tracing::debug!(producer = producer_name, network, "firewall network not found");
            return;
        };

        tracing::info!(
            producer = producer_name,
            network = %location.path,
            "deriving firewall rule"
        );
        derived.push(
            &location.project_id,
            "firewalls",
            resource([
                ("type", "firewall_rule".into()),
                ("name", derived_name(format!("fw-allow-{producer_name}"))),
                ("network", location.path.into()),
                (
                    "targetTags",
                    Value::Array(producer.list("allowedConsumersTags").to_vec()),
                ),
            ]),
        );
    }

    fn derive_psc_endpoint(&self, config: &Object, producer: &Object, derived: &mut Derived) {
        if self.catalog.connectivity_mode(producer) != Some(ConnectivityMode::Psc) {
            return;
        }
        let producer_name = producer.str_field("name").unwrap_or_default();

        let global = psc_settings(config);
        let network = producer
            .str_field("network")
            .or_else(|| global?.str_field("networkForPsc"));
        let subnet = producer
            .str_field("subnet")
            .or_else(|| global?.str_field("subnetForPsc"));
        let (Some(network), Some(subnet)) = (network, subnet) else {
            tracing::debug!(producer = producer_name, "no network/subnet for psc endpoint");
            return;
        };

        let (Some(subnet_location), Some(network_location)) = (
            find_subnet(config, subnet, network),
            find_network(config, network),
        ) else {
            tracing::debug!(
                producer = producer_name,
                network,
                subnet,
                "psc network or subnet not found"
            );
            return;
        };

        let address_name = derived_name(format!("addr-{producer_name}-psc"));
        let region: Value = subnet_location.region.into();
        let subnet_path: Value = subnet_location.path.into();

        derived.push(
            &subnet_location.project_id,
            "addresses",
            resource([
                ("type", "address".into()),
                ("name", address_name.clone()),
                ("region", region.clone()),
                ("subnetwork", subnet_path.clone()),
            ]),
        );
        derived.push(
            &subnet_location.project_id,
            "forwardingRules",
            resource([
                ("type", "forwardingrule".into()),
                ("name", derived_name(format!("fwrule-{producer_name}-psc"))),
                ("region", region),
                ("network", network_location.path.into()),
                ("subnetwork", subnet_path),
                ("IPAddress", address_name),
                ("targetProducerName", producer_name.into()),
            ]),
        );
    }

    /// Vpcs owning the subnets of scp producers
    ///
    /// The subnet is looked up by name in the flat `subnets` lists; its `network` must name a vpc of the same
    /// project.
    fn scp_targets(&self, config: &Object) -> Vec<ScpTarget> {
        let mut targets = vec![];

        let scp_producers = projects(config)
            .flat_map(|project| project.objects("producers"))
            .filter(|producer| {
                self.catalog.connectivity_mode(producer) == Some(ConnectivityMode::Scp)
            });

        for producer in scp_producers {
            let Some(subnet_name) = producer.str_field("subnet") else {
                tracing::debug!(
                    producer = producer.str_field("name"),
                    "scp producer without subnet"
                );
                continue;
            };

            let owner = projects(config).enumerate().find_map(|(index, project)| {
                project
                    .objects("subnets")
                    .find(|subnet| subnet.str_field("name") == Some(subnet_name))
                    .map(|subnet| (index, project, subnet))
            });
            let Some((project_index, project, subnet)) = owner else {
                continue;
            };
            let Some(network) = subnet.str_field("network") else {
                continue;
            };

            if let Some(vpc_index) = project
                .objects("vpc")
                .position(|vpc| vpc.str_field("name") == Some(network))
            {
                targets.push(ScpTarget {
                    project: project_index,
                    vpc: vpc_index,
                    subnet: subnet_name.to_string(),
                });
            }
        }

        targets
    }
}
