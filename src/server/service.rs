//! Service method tables.
//!
//! Dispatch never uses runtime type introspection: each service is an
//! explicit table mapping (method name, ordered parameter-type descriptors)
//! to an invocable handler, built once at registration time through
//! [`ServiceBuilder`]. Descriptors are plain strings chosen by the service
//! author (`"String"`, `"i64"`, ...) and matched by exact equality against
//! the descriptors a request carries.
//!
//! # Example
//!
//! ```
//! use wirecall::server::Service;
//!
//! let service = Service::builder()
//!     .method("hello", &["String"], |(name,): (String,)| async move {
//!         Ok(format!("Hello, {}!", name))
//!     })
//!     .build();
//!
//! assert!(service.resolve("hello", &["String".to_string()]).is_some());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Boxed future returned by method handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Failure raised by a service method. Its message travels back to the
/// caller in a code-500 response; it never breaks the connection.
#[derive(Debug, Clone)]
pub struct ServiceError(String);

impl ServiceError {
    /// Create a service error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ServiceError {}

impl From<String> for ServiceError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for ServiceError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// An invocable method entry.
pub trait MethodHandler: Send + Sync + 'static {
    /// Invoke with the request's ordered argument values.
    fn invoke(&self, parameters: Vec<Value>) -> BoxFuture<'static, Result<Value, ServiceError>>;
}

/// Wrapper that deserializes the argument array before calling the handler
/// and serializes its result afterwards.
struct TypedMethod<F, A, Fut> {
    handler: F,
    _marker: PhantomData<fn(A) -> Fut>,
}

impl<F, A, R, Fut> MethodHandler for TypedMethod<F, A, Fut>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    A: DeserializeOwned + Send + 'static,
    R: Serialize + 'static,
    Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
{
    fn invoke(&self, parameters: Vec<Value>) -> BoxFuture<'static, Result<Value, ServiceError>> {
        // A zero-arg method deserializes its `()` from null; anything else
        // takes its argument tuple from the array.
        let args_value = if parameters.is_empty() {
            Value::Null
        } else {
            Value::Array(parameters)
        };
        let args: A = match serde_json::from_value(args_value) {
            Ok(args) => args,
            Err(e) => {
                return Box::pin(async move {
                    Err(ServiceError::new(format!("invalid arguments: {}", e)))
                })
            }
        };

        let fut = (self.handler)(args);
        Box::pin(async move {
            match fut.await {
                Ok(result) => serde_json::to_value(result)
                    .map_err(|e| ServiceError::new(format!("result serialization failed: {}", e))),
                Err(e) => Err(e),
            }
        })
    }
}

/// Lookup key: method name plus ordered parameter-type descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MethodKey {
    name: String,
    parameter_types: Vec<String>,
}

/// A registered service: its method table.
pub struct Service {
    methods: HashMap<MethodKey, Box<dyn MethodHandler>>,
}

impl Service {
    /// Start building a service.
    pub fn builder() -> ServiceBuilder {
        ServiceBuilder {
            methods: HashMap::new(),
        }
    }

    /// Resolve a method by exact name and signature match.
    pub fn resolve(&self, name: &str, parameter_types: &[String]) -> Option<&dyn MethodHandler> {
        let key = MethodKey {
            name: name.to_string(),
            parameter_types: parameter_types.to_vec(),
        };
        self.methods.get(&key).map(|handler| handler.as_ref())
    }

    /// Number of registered methods.
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("methods", &self.methods.len())
            .finish()
    }
}

/// Builder assembling a service's method table.
pub struct ServiceBuilder {
    methods: HashMap<MethodKey, Box<dyn MethodHandler>>,
}

impl ServiceBuilder {
    /// Register a method under a name and parameter-type signature.
    ///
    /// The handler takes its arguments as a tuple matching the descriptors
    /// in order (`(String,)` for one argument, `()` for none) and returns a
    /// serializable result or a [`ServiceError`].
    pub fn method<F, A, R, Fut>(mut self, name: &str, parameter_types: &[&str], handler: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        A: DeserializeOwned + Send + 'static,
        R: Serialize + 'static,
        Fut: Future<Output = Result<R, ServiceError>> + Send + 'static,
    {
        let key = MethodKey {
            name: name.to_string(),
            parameter_types: parameter_types.iter().map(|t| t.to_string()).collect(),
        };
        self.methods.insert(
            key,
            Box::new(TypedMethod {
                handler,
                _marker: PhantomData,
            }),
        );
        self
    }

    /// Finish building.
    pub fn build(self) -> Service {
        Service {
            methods: self.methods,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn greeter() -> Service {
        Service::builder()
            .method("hello", &["String"], |(name,): (String,)| async move {
                Ok(format!("Hello, {}!", name))
            })
            .method("add", &["i64", "i64"], |(a, b): (i64, i64)| async move {
                Ok(a + b)
            })
            .method("ping", &[], |_: ()| async { Ok("pong".to_string()) })
            .build()
    }

    #[test]
    fn test_resolve_exact_signature() {
        let service = greeter();
        assert!(service.resolve("hello", &["String".to_string()]).is_some());
        assert!(service
            .resolve("add", &["i64".to_string(), "i64".to_string()])
            .is_some());
        assert_eq!(service.method_count(), 3);
    }

    #[test]
    fn test_resolve_mismatch_is_absent() {
        let service = greeter();
        // Wrong name, wrong arity, wrong descriptor.
        assert!(service.resolve("goodbye", &["String".to_string()]).is_none());
        assert!(service.resolve("hello", &[]).is_none());
        assert!(service.resolve("hello", &["i64".to_string()]).is_none());
    }

    #[tokio::test]
    async fn test_invoke_single_argument() {
        let service = greeter();
        let handler = service.resolve("hello", &["String".to_string()]).unwrap();

        let result = handler.invoke(vec![json!("Ada")]).await.unwrap();
        assert_eq!(result, json!("Hello, Ada!"));
    }

    #[tokio::test]
    async fn test_invoke_two_arguments() {
        let service = greeter();
        let handler = service
            .resolve("add", &["i64".to_string(), "i64".to_string()])
            .unwrap();

        let result = handler.invoke(vec![json!(2), json!(3)]).await.unwrap();
        assert_eq!(result, json!(5));
    }

    #[tokio::test]
    async fn test_invoke_zero_arguments() {
        let service = greeter();
        let handler = service.resolve("ping", &[]).unwrap();

        let result = handler.invoke(vec![]).await.unwrap();
        assert_eq!(result, json!("pong"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_fail_invocation() {
        let service = greeter();
        let handler = service.resolve("hello", &["String".to_string()]).unwrap();

        let err = handler.invoke(vec![json!(42)]).await.unwrap_err();
        assert!(err.message().contains("invalid arguments"));
    }

    #[tokio::test]
    async fn test_handler_error_carries_message() {
        let service = Service::builder()
            .method("fail", &["String"], |(_,): (String,)| async move {
                Err::<String, _>(ServiceError::new("intentional failure"))
            })
            .build();
        let handler = service.resolve("fail", &["String".to_string()]).unwrap();

        let err = handler.invoke(vec![json!("x")]).await.unwrap_err();
        assert_eq!(err.message(), "intentional failure");
    }

    #[test]
    fn test_duplicate_registration_last_wins() {
        let service = Service::builder()
            .method("hello", &["String"], |(_,): (String,)| async move {
                Ok("first".to_string())
            })
            .method("hello", &["String"], |(_,): (String,)| async move {
                Ok("second".to_string())
            })
            .build();
        assert_eq!(service.method_count(), 1);
    }
}
