//! Authentication and authorisation configuration.
use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// Authentication and authorisation configuration.
///
/// Interceptors are installed in a fixed order: blocked headers, robot secret,
/// HTTP Basic and finally federated Bearer assertions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthConf {
    /// Reject requests carrying any of these headers.
    #[serde(default)]
    pub blocked_headers: Vec<BlockedHeaderConf>,

    /// Redirect browsers to these pages on access denied.
    #[serde(default)]
    pub denial: Option<DenialConf>,

    /// Authenticate Bearer assertions with the sandbox identity provider.
    #[serde(default)]
    pub federated: Option<FederatedConf>,

    /// Authenticate robots presenting a shared secret.
    #[serde(default)]
    pub robot: Option<RobotConf>,

    /// Route level access rules, the first matching rule applies.
    #[serde(default)]
    pub routes: Vec<RouteConf>,

    /// Principal that authenticates with any password.
    #[serde(default)]
    pub special_principal: Option<SpecialPrincipalConf>,

    /// Users that authenticate with HTTP Basic.
    #[serde(default)]
    pub users: Vec<UserConf>,
}

/// Reject requests carrying a header set to a specific value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedHeaderConf {
    /// Name of the header to check.
    pub header: String,

    /// Message returned to rejected clients.
    #[serde(default = "BlockedHeaderConf::default_message")]
    pub message: String,

    /// Header value that causes requests to be rejected (case insensitive).
    pub value: String,
}

impl BlockedHeaderConf {
    fn default_message() -> String {
        "request blocked".into()
    }
}

/// Browser redirect locations for denied requests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenialConf {
    /// Location to redirect authenticated callers that are not allowed to.
    pub denied: String,

    /// Location to redirect anonymous callers to.
    pub login: String,
}

/// Sandbox identity provider and post-verification policy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FederatedConf {
    /// Only accept identities with emails in these domains (all domains if empty).
    #[serde(default)]
    pub allowed_domains: Vec<String>,

    /// Known assertions and the claims they carry.
    #[serde(default)]
    pub assertions: BTreeMap<String, AssertionConf>,

    /// Capabilities granted to all federated identities.
    #[serde(default)]
    pub default_capabilities: Vec<String>,
}

/// Claims carried by a sandbox assertion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionConf {
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub email: String,
    pub subject: String,
}

/// Robots authenticating with a shared secret header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotConf {
    /// Status code returned for wrong secrets.
    #[serde(default = "RobotConf::default_failure_status")]
    pub failure_status: u16,

    /// Header robots present their secret with.
    #[serde(default = "RobotConf::default_header")]
    pub header: String,

    /// Secret robots must present.
    pub secret: String,
}

impl RobotConf {
    fn default_failure_status() -> u16 {
        403
    }

    fn default_header() -> String {
        "x-robot-secret".into()
    }
}

/// Requirement callers must satisfy to access matching routes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConf {
    /// Route pattern, such as `/admin`, `/*` or `/css/**`.
    pub pattern: String,

    /// Requirement callers must satisfy.
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub require: RequireConf,
}

/// Declarative [`Requirement`](portcullis_auth::access::Requirement) definition.
///
/// Unit requirements are plain strings (`permit-all`) while the others are
/// single key maps (`capability: admin`, `not: {capability: robot}`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequireConf {
    All(Vec<RequireConf>),
    Any(Vec<RequireConf>),
    AnyCapability(Vec<String>),
    Authenticated,
    Capability(String),
    DenyAll,
    Not(Box<RequireConf>),
    PermitAll,
}

/// Principal that always authenticates, whatever password is presented.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialPrincipalConf {
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub username: String,
}

/// User that authenticates with a password.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConf {
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub locked: bool,
    pub password: String,
    pub username: String,
}
