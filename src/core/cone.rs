use crate::adapters::http::ReqwestTransport;
use crate::core::coords::{looks_like_name, normalize_position};
use crate::core::http::{try_query, QuerySettings};
use crate::core::query_loop::{query_loop, FailurePolicy};
use crate::core::votable::{decode_votable, DecodeResult};
use crate::domain::model::{
    ConeParams, CoordsInput, PositionInput, RadiusInput, ServiceDescriptor, ServiceInput,
};
use crate::domain::ports::{NameResolver, Transport};
use crate::domain::table::Table;
use crate::utils::error::{ConeError, Result};
use crate::utils::validation::{validate_radius, validate_url};
use std::sync::Arc;

pub const DEFAULT_MAX_SERVICES: usize = 10;

/// Cone-search client. Holds the HTTP transport, the timeout/retry budget,
/// the batch failure policy and an optional object-name resolver; every
/// query goes through one of these.
#[derive(Clone)]
pub struct ConeSearch {
    transport: Arc<dyn Transport>,
    settings: QuerySettings,
    policy: FailurePolicy,
    max_services: usize,
    resolver: Option<Arc<dyn NameResolver>>,
}

impl std::fmt::Debug for ConeSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConeSearch")
            .field("settings", &self.settings)
            .field("policy", &self.policy)
            .field("max_services", &self.max_services)
            .field("resolves_names", &self.resolver.is_some())
            .finish()
    }
}

impl Default for ConeSearch {
    fn default() -> Self {
        Self::new(QuerySettings::default())
    }
}

impl ConeSearch {
    pub fn new(settings: QuerySettings) -> Self {
        Self::with_transport(ReqwestTransport::new(), settings)
    }

    pub fn with_transport(transport: impl Transport + 'static, settings: QuerySettings) -> Self {
        Self {
            transport: Arc::new(transport),
            settings,
            policy: FailurePolicy::default(),
            max_services: DEFAULT_MAX_SERVICES,
            resolver: None,
        }
    }

    /// Text positions starting with a letter (`"M31"`, `"NGC 1068"`) are
    /// looked up with `resolver` before the batch is planned.
    pub fn with_name_resolver(mut self, resolver: impl NameResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_services(mut self, max_services: usize) -> Self {
        self.max_services = max_services;
        self
    }

    pub fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Expands coordinates and radii into one parameter set per position.
    ///
    /// A single radius is broadcast; a radius list must match the positions
    /// one to one. Every position is resolved here so a bad one fails the
    /// whole call before anything is sent.
    pub fn plan(coords: CoordsInput, radius: RadiusInput) -> Result<Vec<ConeParams>> {
        let positions = coords.into_list();
        if positions.is_empty() {
            return Err(ConeError::usage("no coordinates given"));
        }

        let radii = match radius {
            RadiusInput::Single(r) => vec![r; positions.len()],
            RadiusInput::PerPosition(radii) => {
                if radii.len() != positions.len() {
                    return Err(ConeError::usage(format!(
                        "give either a single radius or one radius per position: got {} radii for {} positions",
                        radii.len(),
                        positions.len()
                    )));
                }
                radii
            }
        };

        positions
            .into_iter()
            .zip(radii)
            .map(|(position, radius)| -> Result<ConeParams> {
                validate_radius(radius)?;
                let resolved = normalize_position(&position)?;
                Ok(ConeParams {
                    position: PositionInput::Resolved(resolved),
                    radius,
                })
            })
            .collect()
    }

    /// Cone search against one service for one or many positions.
    pub async fn query(
        &self,
        service: impl Into<ServiceInput>,
        coords: impl Into<CoordsInput>,
        radius: impl Into<RadiusInput>,
    ) -> Result<Table> {
        let service = checked_descriptor(service.into())?;
        let coords = self.resolve_names(coords.into()).await?;
        let params = Self::plan(coords, radius.into())?;

        tracing::info!(
            "🔭 Cone search on {} for {} position(s)",
            service.label(),
            params.len()
        );
        self.run_batch(service, params).await
    }

    /// Runs the same batch against every service in order and stacks
    /// everything into one table.
    pub async fn query_services(
        &self,
        services: Vec<ServiceInput>,
        coords: impl Into<CoordsInput>,
        radius: impl Into<RadiusInput>,
    ) -> Result<Table> {
        if services.is_empty() {
            return Err(ConeError::usage("no services given"));
        }
        if services.len() > self.max_services {
            return Err(ConeError::usage(format!(
                "asked to query {} services but max_services is {}; raise max_services to query more",
                services.len(),
                self.max_services
            )));
        }

        let services = services
            .into_iter()
            .map(checked_descriptor)
            .collect::<Result<Vec<_>>>()?;
        let coords = self.resolve_names(coords.into()).await?;
        let params = Self::plan(coords, radius.into())?;

        tracing::info!(
            "🔭 Cone search on {} service(s) for {} position(s)",
            services.len(),
            params.len()
        );
        query_loop(services, self.policy, move |service| {
            self.run_batch(service, params.clone())
        })
        .await
    }

    /// Swaps object names for resolved positions. Without a resolver the
    /// input is returned untouched and names fail later as bad coordinates.
    async fn resolve_names(&self, coords: CoordsInput) -> Result<CoordsInput> {
        let Some(resolver) = &self.resolver else {
            return Ok(coords);
        };

        let mut positions = Vec::new();
        for position in coords.into_list() {
            positions.push(match position {
                PositionInput::Text(text) if looks_like_name(&text) => {
                    let resolved = resolver.resolve(&text).await?;
                    tracing::info!(
                        "🔎 '{}' resolved to RA {} Dec {}",
                        text.trim(),
                        resolved.ra_deg(),
                        resolved.dec_deg()
                    );
                    PositionInput::Resolved(resolved)
                }
                other => other,
            });
        }
        Ok(CoordsInput::List(positions))
    }

    async fn run_batch(&self, service: ServiceDescriptor, params: Vec<ConeParams>) -> Result<Table> {
        let service = &service;
        query_loop(params, self.policy, move |p| self.one_cone_search(service, p)).await
    }

    /// One position, one radius, one table.
    pub async fn one_cone_search(&self, service: &ServiceDescriptor, params: ConeParams) -> Result<Table> {
        Ok(self.one_cone_search_decoded(service, params).await?.into_table())
    }

    /// Like [`one_cone_search`](Self::one_cone_search) but keeps apart a
    /// response that decoded to zero rows and one that did not decode at all.
    pub async fn one_cone_search_decoded(
        &self,
        service: &ServiceDescriptor,
        params: ConeParams,
    ) -> Result<DecodeResult> {
        let position = normalize_position(&params.position)?;
        validate_radius(params.radius)?;

        let query = [
            ("RA", position.ra_deg().to_string()),
            ("DEC", position.dec_deg().to_string()),
            ("SR", params.radius.to_string()),
        ];

        let response = try_query(self.transport.as_ref(), service, &query, &self.settings).await?;
        Ok(decode_votable(&response))
    }
}

fn checked_descriptor(service: ServiceInput) -> Result<ServiceDescriptor> {
    let descriptor = service.into_descriptor();
    validate_url("access_url", &descriptor.access_url).map_err(|e| ConeError::usage(e.to_string()))?;
    Ok(descriptor)
}
