//! Controller classes and the registry routes resolve against.
//!
//! A route names its handler as `Class#method`. Instead of looking the method up by
//! reflection, every class is registered up front as a [`ControllerClass`] holding its
//! named [`ControllerMethod`]s, and invocation is a table lookup.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::controller::{Controller, ControllerSettings};
use crate::error::MetalError;
use crate::request::RequestContext;
use crate::router::HandlerDescriptor;

pub trait ControllerMethod: Send + Sync {
    fn invoke(&self, controller: &mut Controller) -> Result<Value, MetalError>;
}

/// a [`ControllerMethod`] backed by a closure
pub struct FnMethod<F, T> {
    f: F,
    _phantom: PhantomData<fn() -> T>,
}

impl<F, T> FnMethod<F, T>
where
    F: Fn(&mut Controller) -> Result<T, MetalError> + Send + Sync,
    T: Serialize,
{
    fn new(f: F) -> Self {
        Self { f, _phantom: PhantomData }
    }
}

/// Wraps a closure as a controller method; its output is serialized into the response body.
///
/// ```
/// use metal_web::handler::method_fn;
/// use metal_web::validation::Declarations;
/// use metal_web::Controller;
///
/// let ping = method_fn(|controller: &mut Controller| {
///     controller.validate(&Declarations::new())?;
///     Ok("pong")
/// });
/// # let _ = ping;
/// ```
pub fn method_fn<F, T>(f: F) -> FnMethod<F, T>
where
    F: Fn(&mut Controller) -> Result<T, MetalError> + Send + Sync,
    T: Serialize,
{
    FnMethod::new(f)
}

impl<F, T> ControllerMethod for FnMethod<F, T>
where
    F: Fn(&mut Controller) -> Result<T, MetalError> + Send + Sync,
    T: Serialize,
{
    fn invoke(&self, controller: &mut Controller) -> Result<Value, MetalError> {
        let output = (self.f)(controller)?;
        Ok(serde_json::to_value(output)?)
    }
}

impl<F, T> fmt::Debug for FnMethod<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMethod").finish_non_exhaustive()
    }
}

type Initializer = dyn Fn(&mut Controller) -> Result<(), MetalError> + Send + Sync;

/// A named set of controller methods plus an optional initializer run on construction.
pub struct ControllerClass {
    name: String,
    methods: HashMap<String, Box<dyn ControllerMethod>>,
    initializer: Option<Box<Initializer>>,
}

impl ControllerClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), methods: HashMap::new(), initializer: None }
    }

    #[must_use]
    pub fn method<M: ControllerMethod + 'static>(mut self, name: impl Into<String>, method: M) -> Self {
        self.methods.insert(name.into(), Box::new(method));
        self
    }

    /// Runs `initializer` every time the class is instantiated for a request; an error
    /// fails the instantiation.
    #[must_use]
    pub fn initializer<F>(mut self, initializer: F) -> Self
    where
        F: Fn(&mut Controller) -> Result<(), MetalError> + Send + Sync + 'static,
    {
        self.initializer = Some(Box::new(initializer));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn get_method(&self, name: &str) -> Option<&dyn ControllerMethod> {
        self.methods.get(name).map(|method| &**method)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    fn initialize(&self, controller: &mut Controller) -> Result<(), MetalError> {
        match &self.initializer {
            Some(initializer) => initializer(controller),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ControllerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods = self.method_names().collect::<Vec<_>>();
        methods.sort_unstable();

        f.debug_struct("ControllerClass")
            .field("name", &self.name)
            .field("methods", &methods)
            .field("initializer", &self.initializer.is_some())
            .finish()
    }
}

/// All controller classes known to the application, by name.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    classes: HashMap<String, Arc<ControllerClass>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `class`, replacing a class of the same name.
    #[must_use]
    pub fn class(mut self, class: ControllerClass) -> Self {
        self.register(class);
        self
    }

    pub fn register(&mut self, class: ControllerClass) -> &mut Self {
        self.classes.insert(class.name().to_string(), Arc::new(class));
        self
    }

    pub fn get(&self, class: &str) -> Option<&Arc<ControllerClass>> {
        self.classes.get(class)
    }

    pub fn contains(&self, class: &str, method: &str) -> bool {
        self.get(class).is_some_and(|class| class.has_method(method))
    }

    /// Checks that `class#method` names a registered method.
    pub fn check(&self, class: &str, method: &str) -> Result<(), MetalError> {
        match self.get(class) {
            None => Err(MetalError::router_config(format!("controller `{class}` is not registered"))),
            Some(registered) if !registered.has_method(method) => Err(MetalError::router_config(format!(
                "controller `{class}` has no method `{method}`"
            ))),
            Some(_) => Ok(()),
        }
    }

    /// Builds the controller a resolved route points at.
    pub fn instantiate(
        &self,
        descriptor: &HandlerDescriptor,
        request: RequestContext,
        settings: Arc<ControllerSettings>,
    ) -> Result<Controller, MetalError> {
        let class_name = descriptor.class();
        let class = self.get(class_name).ok_or_else(|| {
            MetalError::router_config(format!(
                "Error instantiating matched controller: {class_name}; controller is not registered"
            ))
        })?;

        let mut controller = Controller::new(Arc::clone(class), request, settings);
        class.initialize(&mut controller).map_err(|e| {
            MetalError::router_config(format!("Error instantiating matched controller: {class_name}; {e}"))
        })?;

        Ok(controller)
    }
}

#[cfg(test)]
mod tests {
    use http::Method;
    use metal_http::protocol::{HeaderBag, RequestHead};
    use serde_json::json;

    use super::*;
    use crate::error::ApiError;
    use crate::params::Params;
    use crate::validation::Declarations;

    fn request() -> RequestContext {
        RequestContext::new(RequestHead::new(Method::GET, "/", HeaderBag::new()), Params::new())
    }

    fn registry() -> HandlerRegistry {
        HandlerRegistry::new()
            .class(ControllerClass::new("Ping").method(
                "ping",
                method_fn(|controller: &mut Controller| {
                    controller.validate(&Declarations::new())?;
                    Ok(json!({"pong": true}))
                }),
            ))
            .class(
                ControllerClass::new("Locked")
                    .method("get", method_fn(|_: &mut Controller| Ok(1)))
                    .initializer(|_| Err(ApiError::service_unavailable("database is down").into())),
            )
    }

    #[test]
    fn lookup() {
        let registry = registry();

        assert!(registry.contains("Ping", "ping"));
        assert!(!registry.contains("Ping", "pong"));
        assert!(!registry.contains("Pong", "ping"));

        assert!(registry.check("Ping", "ping").is_ok());
        assert_eq!(registry.check("Ping", "pong").unwrap_err().to_string(), "controller `Ping` has no method `pong`");
        assert_eq!(registry.check("Pong", "ping").unwrap_err().to_string(), "controller `Pong` is not registered");
    }

    #[test]
    fn invoke_serializes_output() {
        let registry = registry();
        let descriptor = HandlerDescriptor::parse("Ping#ping", Params::new());

        let mut controller = registry.instantiate(&descriptor, request(), Arc::default()).unwrap();
        let method = registry.get("Ping").unwrap().get_method("ping").unwrap();

        assert_eq!(method.invoke(&mut controller).unwrap(), json!({"pong": true}));
    }

    #[test]
    fn unknown_class() {
        let descriptor = HandlerDescriptor::parse("Pong#ping", Params::new());

        let e = registry().instantiate(&descriptor, request(), Arc::default()).unwrap_err();

        assert!(matches!(e, MetalError::RouterConfig { .. }));
        assert_eq!(e.to_string(), "Error instantiating matched controller: Pong; controller is not registered");
    }

    #[test]
    fn failing_initializer() {
        let descriptor = HandlerDescriptor::parse("Locked#get", Params::new());

        let e = registry().instantiate(&descriptor, request(), Arc::default()).unwrap_err();

        assert_eq!(e.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.to_string(), "Error instantiating matched controller: Locked; database is down");
    }

    #[test]
    fn debug_lists_methods() {
        let debug = format!("{:?}", registry().get("Locked").unwrap());
        assert_eq!(debug, r#"ControllerClass { name: "Locked", methods: ["get"], initializer: true }"#);
    }
}
