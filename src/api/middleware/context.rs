use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use std::{
    future::{ready, Future, Ready},
    pin::Pin,
    rc::Rc,
};

/// Identity context for a request. Phase-1 runs without auth: a dev context
/// is injected unconditionally, with the tenant overridable per request via
/// the `x-tenant-id` header.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub tenant_id: String,
    pub user_id: String,
    pub role: String,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            tenant_id: "tenant-A".to_string(),
            user_id: "dev-user".to_string(),
            role: "admin".to_string(),
        }
    }
}

impl FromRequest for RequestContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(req
            .extensions()
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default()))
    }
}

pub struct TenantContext;

impl<S, B> Transform<S, ServiceRequest> for TenantContext
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TenantContextMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TenantContextMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct TenantContextMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for TenantContextMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        let tenant_id = req
            .headers()
            .get("x-tenant-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "tenant-A".to_string());

        req.extensions_mut().insert(RequestContext {
            tenant_id,
            ..RequestContext::default()
        });

        Box::pin(async move {
            let res = srv.call(req).await?;
            Ok(res)
        })
    }
}
