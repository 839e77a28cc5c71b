//! HTTP dispatch for RPC calls

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use courier_protocol::{to_bytes, Encoding};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::contract::{Method, ServiceContract};
use crate::error::{classify, Error, Result};
use crate::reply::{decode_fault, decode_reply, ReplyStruct};

/// `User-Agent` sent with every request
pub const USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"));

/// HTTP client for one RPC service.
///
/// Construction builds the endpoint table once: every two-way method in
/// the contract is bound to `{base}/{service}/{method}`, with the
/// service name namespace-qualified when the configuration carries a
/// namespace. One-way methods stay unbound, and invoking one fails
/// with [`Error::NotBound`] before anything is sent.
///
/// The client is cheap to clone and safe to share. Clones share the
/// connection pool and the connection limiter: at most `max_connections`
/// calls hold a connection at once, and calls beyond the cap wait for a
/// slot.
pub struct RpcClient<S: ServiceContract> {
    client: Client,
    permits: Arc<Semaphore>,
    endpoints: HashMap<&'static str, String>,
    encoding: Encoding,
    timeout: Duration,
    _service: PhantomData<S>,
}

impl<S: ServiceContract> Clone for RpcClient<S> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            permits: Arc::clone(&self.permits),
            endpoints: self.endpoints.clone(),
            encoding: self.encoding,
            timeout: self.timeout,
            _service: PhantomData,
        }
    }
}

impl<S: ServiceContract> RpcClient<S> {
    /// Create a client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.max_connections)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        let base = config.base_url.trim_end_matches('/');
        let service = config.qualified_service(S::SERVICE);
        let endpoints = S::METHODS
            .iter()
            .filter(|m| m.two_way)
            .map(|m| (m.name, format!("{base}/{service}/{}", m.name)))
            .collect();

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(config.max_connections)),
            endpoints,
            encoding: config.encoding,
            timeout: config.timeout,
            _service: PhantomData,
        })
    }

    /// Bound endpoint URL for a method, if it has one
    pub fn endpoint(&self, rpc: &str) -> Option<&str> {
        self.endpoints.get(rpc).map(String::as_str)
    }

    /// Invoke one RPC: encode the arguments, POST them to the method's
    /// endpoint, and interpret the response by status.
    ///
    /// Exactly HTTP 200 resolves through the method's result envelope,
    /// which may still surface a declared exception. Any other status,
    /// other 2xx codes included, carries a fault struct describing the
    /// out-of-band failure. The response body's encoding follows the
    /// response `Content-Type` header, independent of what the request
    /// was encoded with.
    pub async fn call<M>(
        &self,
        args: &M::Args,
    ) -> Result<<M::Reply as ReplyStruct>::Ok, <M::Reply as ReplyStruct>::Exception>
    where
        M: Method<Service = S>,
    {
        let url = self
            .endpoints
            .get(M::NAME)
            .ok_or(Error::NotBound { rpc: M::NAME })?;

        let body = to_bytes(args, self.encoding)?;
        debug!(
            "rpc {} -> {} ({} bytes, {:?})",
            M::NAME,
            url,
            body.len(),
            self.encoding
        );

        // One permit per in-flight call, released when the call returns.
        let _permit = self
            .permits
            .acquire()
            .await
            .expect("connection limiter is never closed");

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, self.encoding.content_type())
            .body(body)
            .send()
            .await
            .map_err(|e| classify(M::NAME, url, self.timeout, e))?;

        let status = response.status();
        let reply_encoding = Encoding::from_content_type(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );
        let body = response
            .bytes()
            .await
            .map_err(|e| classify(M::NAME, url, self.timeout, e))?;

        if status == StatusCode::OK {
            decode_reply::<M::Reply>(M::NAME, &body, reply_encoding)
        } else {
            warn!("rpc {} failed out of band with HTTP {}", M::NAME, status);
            Err(Error::Fault(decode_fault(M::NAME, &body, reply_encoding)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::MethodSpec;
    use crate::error::NoException;
    use crate::reply::ReplyField;
    use courier_protocol::{CodecError, FieldType, ProtocolReader, ProtocolWriter, WireStruct};

    struct Echo;

    impl ServiceContract for Echo {
        const SERVICE: &'static str = "Echo";
        const METHODS: &'static [MethodSpec] =
            &[MethodSpec::two_way("say"), MethodSpec::one_way("note")];
    }

    struct Tally;

    impl Method for Tally {
        type Service = Echo;
        const NAME: &'static str = "say";
        type Args = TallyArgs;
        type Reply = TallyReply;
    }

    /// Argument struct whose count only encodes when it fits an i32
    struct TallyArgs {
        count: u64,
    }

    impl WireStruct for TallyArgs {
        fn write(&self, writer: &mut dyn ProtocolWriter) -> courier_protocol::Result<()> {
            let count =
                i32::try_from(self.count).map_err(|_| CodecError::OutOfRange("count"))?;
            writer.write_struct_begin()?;
            writer.write_field_begin(1, FieldType::I32)?;
            writer.write_i32(count)?;
            writer.write_field_end()?;
            writer.write_stop()?;
            writer.write_struct_end()
        }

        fn read(reader: &mut dyn ProtocolReader) -> courier_protocol::Result<Self> {
            let mut count = 0;
            reader.read_struct_begin()?;
            while let Some((id, ftype)) = reader.read_field_begin()? {
                match (id, ftype) {
                    (1, FieldType::I32) => count = reader.read_i32()? as u64,
                    (_, other) => reader.skip(other)?,
                }
                reader.read_field_end()?;
            }
            reader.read_struct_end()?;
            Ok(TallyArgs { count })
        }
    }

    struct TallyReply;

    impl ReplyStruct for TallyReply {
        type Ok = ();
        type Exception = NoException;

        fn read_field(
            _id: i16,
            _ftype: FieldType,
            _reader: &mut dyn ProtocolReader,
        ) -> courier_protocol::Result<Option<ReplyField<(), NoException>>> {
            Ok(None)
        }

        fn void() -> Option<()> {
            Some(())
        }
    }

    #[test]
    fn endpoint_table_binds_only_two_way_methods() {
        let config = ClientConfig::builder()
            .base_url("http://rpc.test:9280/")
            .namespace("demo")
            .build();
        let client: RpcClient<Echo> = RpcClient::with_config(config).unwrap();
        assert_eq!(
            client.endpoint("say"),
            Some("http://rpc.test:9280/demo.Echo/say")
        );
        assert_eq!(client.endpoint("note"), None);
        assert_eq!(client.endpoint("missing"), None);
    }

    #[test]
    fn service_name_is_unqualified_without_a_namespace() {
        let config = ClientConfig::builder()
            .base_url("http://rpc.test:9280")
            .build();
        let client: RpcClient<Echo> = RpcClient::with_config(config).unwrap();
        assert_eq!(client.endpoint("say"), Some("http://rpc.test:9280/Echo/say"));
    }

    #[test]
    fn user_agent_names_the_library() {
        assert!(USER_AGENT.starts_with("courier/"));
    }

    #[test]
    fn connection_cap_sizes_the_limiter() {
        let config = ClientConfig::builder().max_connections(3).build();
        let client: RpcClient<Echo> = RpcClient::with_config(config).unwrap();
        assert_eq!(client.permits.available_permits(), 3);
    }

    /// Arguments that fail to encode surface before anything is sent;
    /// reaching the network here would fail as a connection error instead.
    #[tokio::test]
    async fn unencodable_arguments_fail_before_dispatch() {
        let config = ClientConfig::builder().base_url("http://127.0.0.1:1").build();
        let client: RpcClient<Echo> = RpcClient::with_config(config).unwrap();
        let err = client
            .call::<Tally>(&TallyArgs { count: u64::MAX })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Encode(CodecError::OutOfRange("count"))
        ));
    }
}
