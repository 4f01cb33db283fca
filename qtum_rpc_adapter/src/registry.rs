//! Method registry: maps a JSON-RPC method name to its handler and dispatches
//! requests. Grounded on spec §4.c and the REDESIGN FLAGS note to model
//! handlers as "an open registry of values implementing a two-method
//! capability" rather than the teacher's closed `Web3Rpc` provider enum.

use crate::errors::{AdapterError, AdapterResult};
use crate::handlers::HandlerContext;
use crate::jsonrpc::JsonRpcRequest;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// one Ethereum JSON-RPC method. Implementors translate the request into one
/// or more upstream Qtum calls and re-encode the result.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    fn method(&self) -> &'static str;

    async fn invoke(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value>;
}

/// built once at startup, then immutable; `dispatch` never mutates it.
pub struct MethodRegistry {
    handlers: HashMap<&'static str, Box<dyn MethodHandler>>,
}

#[derive(Default)]
pub struct MethodRegistryBuilder {
    handlers: HashMap<&'static str, Box<dyn MethodHandler>>,
}

impl MethodRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// fails if `handler.method()` is already registered.
    pub fn register(mut self, handler: Box<dyn MethodHandler>) -> AdapterResult<Self> {
        let method = handler.method();
        if self.handlers.contains_key(method) {
            return Err(AdapterError::Internal(format!(
                "method {method} registered twice"
            )));
        }
        self.handlers.insert(method, handler);
        Ok(self)
    }

    pub fn build(self) -> MethodRegistry {
        MethodRegistry {
            handlers: self.handlers,
        }
    }
}

impl MethodRegistry {
    pub fn builder() -> MethodRegistryBuilder {
        MethodRegistryBuilder::new()
    }

    pub fn is_registered(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    pub async fn dispatch(&self, ctx: &HandlerContext, req: &JsonRpcRequest) -> AdapterResult<Value> {
        match self.handlers.get(req.method.as_str()) {
            Some(handler) => handler.invoke(ctx, req).await,
            None => Err(AdapterError::MethodNotFound(req.method.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonrpc::JsonRpcId;
    use serde_json::value::RawValue;

    struct Echo;

    #[async_trait]
    impl MethodHandler for Echo {
        fn method(&self) -> &'static str {
            "test_echo"
        }

        async fn invoke(&self, _ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
            Ok(Value::String("echo".into()))
        }
    }

    struct EchoAgain;

    #[async_trait]
    impl MethodHandler for EchoAgain {
        fn method(&self) -> &'static str {
            "test_echo"
        }

        async fn invoke(&self, _ctx: &HandlerContext, _req: &JsonRpcRequest) -> AdapterResult<Value> {
            Ok(Value::String("echo-again".into()))
        }
    }

    fn dummy_id() -> JsonRpcId {
        RawValue::from_string("1".to_string()).unwrap()
    }

    #[test]
    fn duplicate_registration_rejected() {
        let result = MethodRegistry::builder()
            .register(Box::new(Echo))
            .unwrap()
            .register(Box::new(EchoAgain));

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn dispatch_unknown_method_returns_method_not_found() {
        let registry = MethodRegistry::builder().build();
        let ctx = HandlerContext::for_test();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: dummy_id(),
            method: "eth_foo".into(),
            params: Some(Value::Array(vec![])),
        };

        let err = registry.dispatch(&ctx, &req).await.unwrap_err();
        assert_eq!(err.to_string(), "method not found: eth_foo");
    }

    #[tokio::test]
    async fn dispatch_routes_to_registered_handler() {
        let registry = MethodRegistry::builder()
            .register(Box::new(Echo))
            .unwrap()
            .build();
        let ctx = HandlerContext::for_test();
        let req = JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: dummy_id(),
            method: "test_echo".into(),
            params: None,
        };

        let result = registry.dispatch(&ctx, &req).await.unwrap();
        assert_eq!(result, Value::String("echo".into()));
    }
}
