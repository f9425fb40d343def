//! # netcfg - network configuration generator
//!
//! Expands a short, hand-written *basic config* describing cloud networking (projects, VPCs, subnets, service
//! producers and consumers) into a *complete config*: every resource fully populated, uniquely named and linked to
//! the resources it references by full URI.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `netcfg` works internally.
//!
//! ### Inputs
//!
//! Three things besides the basic config itself, usually found below a spec root (see [settings::Settings]):
//!
//! - the resource type catalog ([catalog::ResourceTypeCatalog], `supported_resources.json`): per type the names of
//!   its schema and defaults files, its nested resource lists, its reference fields, its URI template and the
//!   connectivity modes it supports
//! - one schema per type ([sources::SchemaSource])
//! - one defaults file per type ([sources::DefaultsSource])
//!
//! Only the catalog is required. A missing schema or defaults file just means the type gets no placeholders or no
//! defaults.
//!
//! ### Terms
//!
//! A basic config looks like this:
//! ```yaml
//! namePrefix: acme
//! projects:
//!   - projectId: host-project      # metadata
//!     pscSettings:                 # metadata
//!       networkForPsc: vpc-a
//!       subnetForPsc: psc-subnet
//!     vpc:                         # a category: list of resources
//!       - type: vpc                # resource type, a key into the catalog
//!         name: vpc-a
//!         createNat: true          # a flag, triggers a derived router
//!         subnets:                 # nested resources, moved to the project during generation
//!           - name: psc-subnet
//!             region: europe-west1
//!     producers:
//!       - type: cloudsql
//!         name: db
//!         network: vpc-a           # a reference field, replaced by the vpc's URI
//! ```
//!
//! ### Values
//!
//! Configs are trees of [value::Value]. Objects keep insertion order so the output is stable and follows the order
//! of the input and of the layering below. [value::Value] is (de)serialized with [serde], so json, yaml and hcl
//! ([documents]) all work the same way.
//!
//! ### Generation
//!
//! see [pipeline::Orchestrator::generate]
//!
//! Every phase takes a tree and returns a new one. The input is never touched.
//!
//! 1. **merge**: entries sharing a `projectId` are deep merged, later entries win
//! 2. **explicit**: every resource is layered (writable schema properties as `null` < defaults < user values),
//!    `count` is expanded into numbered instances and names get `namePrefix`/`nameSuffix` and are sanitized
//! 3. **nested**: lists named in the catalog's `nestedResources` (e.g. a vpc's `subnets`) are moved out of their
//!    parent into a project category of the same name
//! 4. **allow-list**: PSC producers with `allowedConsumersTags` get the projects of all matching tagged consumers
//! 5. **derive**: flags and connectivity modes turn into extra resources (NAT routers, firewall rules, PSC addresses
//!    and forwarding rules, service connection policies)
//! 6. **resolve**: every instance with a rendered URI template gets a `selfLink`, then every short name in a
//!    reference field is replaced with the URI of the resource carrying that name
//!
//! Problems with single resources never abort generation. They are logged (via [tracing]) and show up as missing
//! or incomplete data in the output.
//!
//! ### Output
//!
//! The complete config is written as `<name>-complete.json` (or yaml) by [documents::write_complete_config].
//!
pub mod catalog;
pub mod documents;
pub mod pipeline;
pub mod settings;
pub mod sources;
pub mod uri_template;
pub mod util;
pub mod value;
mod visit;
