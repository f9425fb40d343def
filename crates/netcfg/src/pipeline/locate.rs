//! Finding networks and subnets by short name across all projects
use super::projects;
use crate::value::{Object, ObjectExt, Value};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NetworkLocation {
    pub project_id: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SubnetLocation {
    pub project_id: String,
    pub region: String,
    pub path: String,
}

/// First vpc named `network` in any project
pub(crate) fn find_network(config: &Object, network: &str) -> Option<NetworkLocation> {
    for project in projects(config) {
        let Some(vpc) = project
            .objects("vpc")
            .find(|vpc| vpc.str_field("name") == Some(network))
        else {
            continue;
        };

        let project_id = project.str_field("projectId")?;
        let path = vpc
            .str_field("selfLink")
            .map(str::to_owned)
            .unwrap_or_else(|| format!("projects/{project_id}/global/networks/{network}"));

        return Some(NetworkLocation {
            project_id: project_id.to_string(),
            path,
        });
    }

    None
}

/// One way of finding a subnet inside a single project
pub(crate) trait SubnetLocator {
    fn locate<'p>(&self, project: &'p Object, subnet: &str, network: &str) -> Option<&'p Object>;
}

/// `subnets`/`subnetworks` still embedded in the vpc named `network`
pub(crate) struct NestedSubnetLocator;

impl SubnetLocator for NestedSubnetLocator {
    fn locate<'p>(&self, project: &'p Object, subnet: &str, network: &str) -> Option<&'p Object> {
        project
            .objects("vpc")
            .filter(|vpc| vpc.str_field("name") == Some(network))
            .flat_map(|vpc| ["subnets", "subnetworks"].map(|key| vpc.objects(key)))
            .flatten()
            .find(|candidate| candidate.str_field("name") == Some(subnet))
    }
}

/// The project's flat `subnets` list, matching the name and a `network` containing `network`
pub(crate) struct FlatSubnetLocator;

impl SubnetLocator for FlatSubnetLocator {
    fn locate<'p>(&self, project: &'p Object, subnet: &str, network: &str) -> Option<&'p Object> {
        project.objects("subnets").find(|candidate| {
            candidate.str_field("name") == Some(subnet)
                && candidate
                    .get("network")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .contains(network)
        })
    }
}

/// Tried in order, per project
pub(crate) const SUBNET_LOCATORS: &[&dyn SubnetLocator] =
    &[&NestedSubnetLocator, &FlatSubnetLocator];

/// First subnet found by any locator, walking projects in order
///
/// The first hit decides: a subnet without region (or in a project without id) yields `None` even when a later
/// project would have a complete match.
pub(crate) fn find_subnet(config: &Object, subnet: &str, network: &str) -> Option<SubnetLocation> {
    for project in projects(config) {
        let Some(found) = SUBNET_LOCATORS
            .iter()
            .find_map(|locator| locator.locate(project, subnet, network))
        else {
            continue;
        };

        let project_id = project.str_field("projectId")?;
        let region = found.str_field("region")?;
        return Some(SubnetLocation {
            project_id: project_id.to_string(),
            region: region.to_string(),
            path: format!("projects/{project_id}/regions/{region}/subnetworks/{subnet}"),
        });
    }

    None
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::pipeline::test::object;
    use crate::value;
    use pretty_assertions::assert_eq;

    fn config() -> Object {
        object(value!({
            "projects": [
                {
                    "projectId": "host",
                    "vpc": [
                        {
                            "name": "vpc-a",
                            "subnets": [{"name": "nested-sub", "region": "europe-west1"}]
                        },
                        {"name": "vpc-b", "selfLink": "projects/host/global/networks/vpc-b-custom"}
                    ],
                    "subnets": [
                        {
                            "name": "flat-sub",
                            "region": "us-east1",
                            "network": "projects/host/global/networks/vpc-a"
                        },
                        {"name": "other-net", "region": "us-east1", "network": "vpc-b"}
                    ]
                },
                {
                    "projectId": "svc",
                    "subnets": [{"name": "other-net", "region": "asia-east1", "network": "vpc-a"}]
                }
            ]
        }))
    }

    #[test]
    fn network_paths() {
        let config = config();
        assert_eq!(
            find_network(&config, "vpc-a"),
            Some(NetworkLocation {
                project_id: "host".to_string(),
                path: "projects/host/global/networks/vpc-a".to_string()
            })
        );
        assert_eq!(
            find_network(&config, "vpc-b").map(|n| n.path),
            Some("projects/host/global/networks/vpc-b-custom".to_string())
        );
        assert_eq!(find_network(&config, "vpc-x"), None);
    }

    #[test]
    fn nested_subnet_is_found_first() {
        let config = config();
        assert_eq!(
            find_subnet(&config, "nested-sub", "vpc-a"),
            Some(SubnetLocation {
                project_id: "host".to_string(),
                region: "europe-west1".to_string(),
                path: "projects/host/regions/europe-west1/subnetworks/nested-sub".to_string()
            })
        );
    }

    #[test]
    fn flat_subnet_requires_network_match() {
        let config = config();
        assert_eq!(
            find_subnet(&config, "flat-sub", "vpc-a").map(|s| s.region),
            Some("us-east1".to_string())
        );

        // same name in "host" belongs to vpc-b, the match is in "svc"
        assert_eq!(
            find_subnet(&config, "other-net", "vpc-a").map(|s| s.project_id),
            Some("svc".to_string())
        );
        assert_eq!(find_subnet(&config, "flat-sub", "vpc-b"), None);
    }

    #[test]
    fn locators_individually() {
        let config = config();
        let host = projects(&config).next().unwrap();

        assert!(NestedSubnetLocator.locate(host, "nested-sub", "vpc-a").is_some());
        assert!(NestedSubnetLocator.locate(host, "flat-sub", "vpc-a").is_none());
        assert!(FlatSubnetLocator.locate(host, "flat-sub", "vpc-a").is_some());
        assert!(FlatSubnetLocator.locate(host, "nested-sub", "vpc-a").is_none());
    }
}
