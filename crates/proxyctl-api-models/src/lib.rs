#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared request/response documents for the proxy admin REST API.
//!
//! The admin API speaks a JSON:API-flavoured resource model: scalar
//! configuration lives under `data.attributes.parameters`, references
//! between objects live under `data.relationships`. These types are the
//! single source of truth for the wire shapes the CLI emits, so the
//! payload builders stay pure and testable without an HTTP stack.

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Common service parameters that the remote accepts for runtime
/// modification. Advisory only: the list is rendered into help text and
/// never enforced before a request is sent, the server remains the
/// source of truth and rejects unknown keys itself.
///
/// Kept as a constant table rather than logic so it can be swapped for a
/// server-provided list once the API grows an introspection endpoint;
/// until then it can drift from the server's actual vocabulary.
pub const SERVICE_PARAMS: &[&str] = &[
    "user",
    "passwd",
    "enable_root_user",
    "max_connections",
    "connection_timeout",
    "auth_all_servers",
    "optimize_wildcard",
    "strip_db_esc",
    "localhost_match_wildcard_host",
    "max_slave_connections",
    "max_slave_replication_lag",
    "retain_last_statements",
];

/// Top-level process parameters that the remote accepts for runtime
/// modification. Same advisory status and drift caveat as
/// [`SERVICE_PARAMS`].
pub const MAXSCALE_PARAMS: &[&str] = &[
    "auth_connect_timeout",
    "auth_read_timeout",
    "auth_write_timeout",
    "admin_auth",
    "admin_log_auth_failures",
    "passive",
    "ms_timestamp",
    "skip_permission_checks",
    "query_retries",
    "query_retry_timeout",
    "retain_last_statements",
    "dump_last_statements",
];

/// Categories of addressable objects in the admin REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// Backend database servers.
    Servers,
    /// Cluster monitors.
    Monitors,
    /// Routing services.
    Services,
    /// The proxy process itself.
    Maxscale,
    /// The process log configuration.
    Logs,
    /// Network admin users.
    InetUsers,
}

impl ObjectType {
    /// Wire value used in the document `type` member.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Servers => "servers",
            Self::Monitors => "monitors",
            Self::Services => "services",
            Self::Maxscale => "maxscale",
            Self::Logs => "logs",
            Self::InetUsers => "inet-users",
        }
    }
}

/// Reference to a single addressable object: the object category plus
/// its name where the category is named (the process and its logs are
/// singletons and carry no name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A backend server by name.
    Server(String),
    /// A monitor by name.
    Monitor(String),
    /// A service by name.
    Service(String),
    /// The proxy process singleton.
    Maxscale,
    /// The log configuration singleton.
    Logs,
    /// A network admin user by name.
    InetUser(String),
}

impl Target {
    /// Object category of this target.
    #[must_use]
    pub const fn object_type(&self) -> ObjectType {
        match self {
            Self::Server(_) => ObjectType::Servers,
            Self::Monitor(_) => ObjectType::Monitors,
            Self::Service(_) => ObjectType::Services,
            Self::Maxscale => ObjectType::Maxscale,
            Self::Logs => ObjectType::Logs,
            Self::InetUser(_) => ObjectType::InetUsers,
        }
    }

    /// Object name, where the category has one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Server(id) | Self::Monitor(id) | Self::Service(id) | Self::InetUser(id) => {
                Some(id.as_str())
            }
            Self::Maxscale | Self::Logs => None,
        }
    }

    /// REST resource path for this target, relative to the API root.
    ///
    /// Callers must reject empty names before constructing a target;
    /// this mapping is otherwise total and deterministic.
    #[must_use]
    pub fn resource_path(&self) -> String {
        match self {
            Self::Server(id) => format!("servers/{id}"),
            Self::Monitor(id) => format!("monitors/{id}"),
            Self::Service(id) => format!("services/{id}"),
            Self::Maxscale => "maxscale".to_string(),
            Self::Logs => "maxscale/logs".to_string(),
            Self::InetUser(id) => format!("users/inet/{id}"),
        }
    }
}

/// PATCH document updating exactly one runtime parameter of a target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterPatch {
    /// The resource object carrying the update.
    pub data: ParameterPatchData,
}

/// Resource object inside a [`ParameterPatch`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterPatchData {
    /// Object name; absent for the singleton targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Object category wire value.
    #[serde(rename = "type")]
    pub object_type: &'static str,
    /// Attribute container holding the single parameter.
    pub attributes: ParameterPatchAttributes,
}

/// Attribute member of a [`ParameterPatch`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterPatchAttributes {
    /// Exactly one `<key>: <value>` entry.
    pub parameters: Map<String, Value>,
}

impl ParameterPatch {
    /// Builds the update document for `target`, setting `key` to
    /// `value` under `data.attributes.parameters`.
    ///
    /// `key` is treated as a single path segment: dots are not split
    /// into nested objects. `value` is passed through as given; no
    /// client-side type coercion happens here, the remote validates and
    /// coerces (or rejects) the value.
    #[must_use]
    pub fn new(target: &Target, key: &str, value: Value) -> Self {
        let mut parameters = Map::new();
        parameters.insert(key.to_string(), value);
        Self {
            data: ParameterPatchData {
                id: target.id().map(str::to_string),
                object_type: target.object_type().as_str(),
                attributes: ParameterPatchAttributes { parameters },
            },
        }
    }
}

/// Ordered filter chain of a service, as a relationship value.
///
/// The remote API distinguishes "no filters" (JSON `null`) from an
/// empty list, so the empty case is an explicit variant instead of an
/// empty `Vec` that callers would have to remember to special-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChain {
    /// Remove every filter from the service.
    NoFilters,
    /// Replace the chain with these filters, in execution order.
    Ordered(Vec<String>),
}

impl FilterChain {
    /// Normalizes a CLI argument list: an empty list means "remove all
    /// filters", anything else is the new chain in the given order.
    /// Duplicate names pass through verbatim; the remote decides what
    /// they mean.
    #[must_use]
    pub fn from_names(names: Vec<String>) -> Self {
        if names.is_empty() {
            Self::NoFilters
        } else {
            Self::Ordered(names)
        }
    }
}

impl Serialize for FilterChain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::NoFilters => serializer.serialize_none(),
            Self::Ordered(names) => {
                let mut seq = serializer.serialize_seq(Some(names.len()))?;
                for name in names {
                    seq.serialize_element(&FilterRef {
                        id: name,
                        object_type: "filters",
                    })?;
                }
                seq.end()
            }
        }
    }
}

#[derive(Serialize)]
struct FilterRef<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    object_type: &'static str,
}

/// PATCH document replacing the filter relationship of a service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterRelationshipPatch {
    /// The service resource object carrying the relationship.
    pub data: FilterRelationshipData,
}

/// Resource object inside a [`FilterRelationshipPatch`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterRelationshipData {
    /// Service name.
    pub id: String,
    /// Always `services`.
    #[serde(rename = "type")]
    pub object_type: &'static str,
    /// Relationship container.
    pub relationships: FilterRelationships,
}

/// Relationship member naming the filter chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterRelationships {
    /// The filter relationship being replaced.
    pub filters: FilterRelationship,
}

/// Relationship value wrapper: `data` is `null` or an ordered list of
/// filter references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterRelationship {
    /// The chain itself.
    pub data: FilterChain,
}

impl FilterRelationshipPatch {
    /// Builds the relationship-replacement document for `service`.
    #[must_use]
    pub fn new(service: &str, chain: FilterChain) -> Self {
        Self {
            data: FilterRelationshipData {
                id: service.to_string(),
                object_type: ObjectType::Services.as_str(),
                relationships: FilterRelationships {
                    filters: FilterRelationship { data: chain },
                },
            },
        }
    }
}

/// POST document recreating a network admin user. The admin API has no
/// partial-update verb for users, so a password change is a fetch,
/// delete, recreate lifecycle and the `account` role must be carried
/// over from the fetched object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InetUserDocument {
    /// The user resource object.
    pub data: InetUserData,
}

/// Resource object inside an [`InetUserDocument`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InetUserData {
    /// User name.
    pub id: String,
    /// Always `inet`.
    #[serde(rename = "type")]
    pub object_type: &'static str,
    /// Credential and role attributes.
    pub attributes: InetUserAttributes,
}

/// Attributes of a network admin user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InetUserAttributes {
    /// The new password.
    pub password: String,
    /// Account role preserved across the recreate (e.g. `admin`).
    pub account: String,
}

impl InetUserDocument {
    /// Builds the recreation document for `name`, merging the new
    /// password with the account role captured before deletion.
    #[must_use]
    pub fn new(name: &str, password: &str, account: &str) -> Self {
        Self {
            data: InetUserData {
                id: name.to_string(),
                object_type: "inet",
                attributes: InetUserAttributes {
                    password: password.to_string(),
                    account: account.to_string(),
                },
            },
        }
    }
}

/// Fetched representation of a network admin user, reduced to the
/// members the password-change sequence needs.
#[derive(Debug, Clone, Deserialize)]
pub struct InetUserResource {
    /// The user resource object.
    pub data: InetUserResourceData,
}

/// Resource object inside an [`InetUserResource`].
#[derive(Debug, Clone, Deserialize)]
pub struct InetUserResourceData {
    /// User name.
    pub id: String,
    /// Role attributes.
    pub attributes: InetUserResourceAttributes,
}

/// Attributes of a fetched network admin user.
#[derive(Debug, Clone, Deserialize)]
pub struct InetUserResourceAttributes {
    /// Account role (e.g. `admin` or `basic`).
    pub account: String,
}

/// Error document returned by the admin API on failed requests:
/// `{"errors":[{"detail": "..."}]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// One entry per reported error.
    #[serde(default)]
    pub errors: Vec<ApiErrorObject>,
}

/// Single error object inside an [`ApiErrorBody`].
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorObject {
    /// Human-readable description of the failure.
    #[serde(default)]
    pub detail: Option<String>,
}

impl ApiErrorBody {
    /// First non-empty `detail`, if the server provided one.
    #[must_use]
    pub fn first_detail(&self) -> Option<&str> {
        self.errors
            .iter()
            .filter_map(|error| error.detail.as_deref())
            .find(|detail| !detail.trim().is_empty())
    }
}
