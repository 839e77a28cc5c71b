//! Static description of services and their methods.
//!
//! The IDL compiler emits one contract type per service and one marker
//! type per RPC. The client walks the method table once at construction
//! to build its endpoint map, and each call is typed end to end through
//! its marker.

use courier_protocol::WireStruct;

use crate::reply::ReplyStruct;

/// One RPC in a service's method table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpec {
    /// Wire name of the method, as it appears in the endpoint path
    pub name: &'static str,
    /// Whether the caller waits for a reply. One-way methods stay in
    /// the table but are never bound to an endpoint.
    pub two_way: bool,
}

impl MethodSpec {
    pub const fn two_way(name: &'static str) -> Self {
        Self {
            name,
            two_way: true,
        }
    }

    pub const fn one_way(name: &'static str) -> Self {
        Self {
            name,
            two_way: false,
        }
    }
}

/// A service as declared in the IDL: its wire name and method table.
pub trait ServiceContract: 'static {
    /// Unqualified service name, for example `Calculator`
    const SERVICE: &'static str;
    /// Every method the service declares
    const METHODS: &'static [MethodSpec];
}

/// One callable RPC, tying its argument and reply types to the service
/// that declares it.
pub trait Method {
    type Service: ServiceContract;
    /// Wire name, matching an entry in the service's method table
    const NAME: &'static str;
    /// Argument struct sent as the request body
    type Args: WireStruct;
    /// Result envelope decoded from the response body
    type Reply: ReplyStruct;
}
