//! Envoy static routing document (`envoy.yaml`).
//!
//! One listener on the gateway port dispatches by path prefix. Rules are
//! emitted most specific first and end with a `/` catch-all; only enabled
//! services get rules or clusters.

use crate::GENERATED_HEADER;
use crate::error::GenerateError;
use apuforge_kernel::{ActiveConfiguration, ServiceKind};
use serde::Serialize;

pub const FILE_NAME: &str = "envoy.yaml";

const HCM_TYPE: &str =
    "type.googleapis.com/envoy.extensions.filters.network.http_connection_manager.v3.HttpConnectionManager";
const ROUTER_TYPE: &str = "type.googleapis.com/envoy.extensions.filters.http.router.v3.Router";
const CONNECT_TIMEOUT: &str = "5s";

/// One path-prefix rule in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub prefix: &'static str,
    pub service: ServiceKind,
    pub timeout_secs: u64,
}

/// Ordered routing rules for the enabled services.
///
/// Model listing, health and the catch-all go to the primary service (chat
/// when enabled).
pub fn route_rules(active: &ActiveConfiguration) -> Result<Vec<RouteRule>, GenerateError> {
    let primary = active
        .primary_service()
        .ok_or(GenerateError::NoEnabledServices)?
        .kind();
    let t = &active.gateway().timeouts;

    let candidates = [
        ("/v1/embeddings", ServiceKind::Embedding, t.embeddings),
        ("/v1/rerank", ServiceKind::Reranking, t.rerank),
        ("/v1/chat/completions", ServiceKind::Chat, t.chat),
        ("/v1/completions", ServiceKind::Chat, t.completions),
        ("/v1/models", primary, t.models),
        ("/health", primary, t.health),
        ("/", primary, t.chat),
    ];

    Ok(candidates
        .into_iter()
        .filter(|(_, service, _)| active.is_enabled(*service))
        .map(|(prefix, service, timeout_secs)| RouteRule {
            prefix,
            service,
            timeout_secs,
        })
        .collect())
}

#[derive(Serialize)]
struct EnvoyConfig {
    admin: Admin,
    static_resources: StaticResources,
}

#[derive(Serialize)]
struct Admin {
    address: Address,
}

#[derive(Serialize)]
struct Address {
    socket_address: SocketAddress,
}

#[derive(Serialize)]
struct SocketAddress {
    address: String,
    port_value: u16,
}

impl Address {
    fn new(address: &str, port_value: u16) -> Self {
        Self {
            socket_address: SocketAddress {
                address: address.to_string(),
                port_value,
            },
        }
    }
}

#[derive(Serialize)]
struct StaticResources {
    listeners: Vec<Listener>,
    clusters: Vec<Cluster>,
}

#[derive(Serialize)]
struct Listener {
    name: String,
    address: Address,
    filter_chains: Vec<FilterChain>,
}

#[derive(Serialize)]
struct FilterChain {
    filters: Vec<NetworkFilter>,
}

#[derive(Serialize)]
struct NetworkFilter {
    name: String,
    typed_config: HttpConnectionManager,
}

#[derive(Serialize)]
struct HttpConnectionManager {
    #[serde(rename = "@type")]
    type_url: String,
    stat_prefix: String,
    route_config: RouteConfig,
    http_filters: Vec<HttpFilter>,
}

#[derive(Serialize)]
struct RouteConfig {
    name: String,
    virtual_hosts: Vec<VirtualHost>,
}

#[derive(Serialize)]
struct VirtualHost {
    name: String,
    domains: Vec<String>,
    routes: Vec<Route>,
}

#[derive(Serialize)]
struct Route {
    #[serde(rename = "match")]
    matcher: PrefixMatch,
    route: RouteAction,
}

#[derive(Serialize)]
struct PrefixMatch {
    prefix: String,
}

#[derive(Serialize)]
struct RouteAction {
    cluster: String,
    timeout: String,
}

#[derive(Serialize)]
struct HttpFilter {
    name: String,
    typed_config: TypedConfig,
}

#[derive(Serialize)]
struct TypedConfig {
    #[serde(rename = "@type")]
    type_url: String,
}

#[derive(Serialize)]
struct Cluster {
    name: String,
    connect_timeout: String,
    #[serde(rename = "type")]
    discovery: String,
    lb_policy: String,
    load_assignment: LoadAssignment,
}

#[derive(Serialize)]
struct LoadAssignment {
    cluster_name: String,
    endpoints: Vec<LocalityEndpoints>,
}

#[derive(Serialize)]
struct LocalityEndpoints {
    lb_endpoints: Vec<LbEndpoint>,
}

#[derive(Serialize)]
struct LbEndpoint {
    endpoint: Endpoint,
}

#[derive(Serialize)]
struct Endpoint {
    address: Address,
}

fn cluster(active: &ActiveConfiguration, kind: ServiceKind) -> Cluster {
    let name = kind.cluster_name();
    Cluster {
        name: name.clone(),
        connect_timeout: CONNECT_TIMEOUT.to_string(),
        discovery: "STATIC".to_string(),
        lb_policy: "ROUND_ROBIN".to_string(),
        load_assignment: LoadAssignment {
            cluster_name: name,
            endpoints: vec![LocalityEndpoints {
                lb_endpoints: vec![LbEndpoint {
                    endpoint: Endpoint {
                        address: Address::new(
                            &active.gateway().service_host,
                            active.binding(kind).port(),
                        ),
                    },
                }],
            }],
        },
    }
}

pub fn render(active: &ActiveConfiguration) -> Result<String, GenerateError> {
    let gateway = active.gateway();
    let routes = route_rules(active)?
        .into_iter()
        .map(|rule| Route {
            matcher: PrefixMatch {
                prefix: rule.prefix.to_string(),
            },
            route: RouteAction {
                cluster: rule.service.cluster_name(),
                timeout: format!("{}s", rule.timeout_secs),
            },
        })
        .collect();

    let doc = EnvoyConfig {
        admin: Admin {
            address: Address::new(&gateway.service_host, gateway.admin_port),
        },
        static_resources: StaticResources {
            listeners: vec![Listener {
                name: "llm_gateway".to_string(),
                address: Address::new(&gateway.bind_address, gateway.listen_port),
                filter_chains: vec![FilterChain {
                    filters: vec![NetworkFilter {
                        name: "envoy.filters.network.http_connection_manager".to_string(),
                        typed_config: HttpConnectionManager {
                            type_url: HCM_TYPE.to_string(),
                            stat_prefix: "llm_gateway".to_string(),
                            route_config: RouteConfig {
                                name: "llm_routes".to_string(),
                                virtual_hosts: vec![VirtualHost {
                                    name: "llm".to_string(),
                                    domains: vec!["*".to_string()],
                                    routes,
                                }],
                            },
                            http_filters: vec![HttpFilter {
                                name: "envoy.filters.http.router".to_string(),
                                typed_config: TypedConfig {
                                    type_url: ROUTER_TYPE.to_string(),
                                },
                            }],
                        },
                    }],
                }],
            }],
            clusters: active
                .enabled_services()
                .into_iter()
                .map(|b| cluster(active, b.kind()))
                .collect(),
        },
    };

    let body = serde_yaml::to_string(&doc)?;
    Ok(format!("# {GENERATED_HEADER}\n{body}"))
}
