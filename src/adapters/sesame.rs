use crate::adapters::http::ReqwestTransport;
use crate::core::http::{try_query, QuerySettings};
use crate::domain::model::{ServiceDescriptor, SkyPosition};
use crate::domain::ports::{NameResolver, Transport};
use crate::utils::error::{ConeError, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::sync::Arc;
use url::Url;

/// CDS Sesame, XML output, SIMBAD then NED then VizieR.
pub const DEFAULT_SESAME_URL: &str = "https://cds.unistra.fr/cgi-bin/nph-sesame/-ox/SNV";

/// [`NameResolver`] backed by the CDS Sesame service. The object name is
/// sent as the whole query string, e.g. `.../nph-sesame/-ox/SNV?M31`.
#[derive(Clone)]
pub struct SesameResolver {
    transport: Arc<dyn Transport>,
    base_url: String,
    settings: QuerySettings,
}

impl std::fmt::Debug for SesameResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SesameResolver")
            .field("base_url", &self.base_url)
            .field("settings", &self.settings)
            .finish()
    }
}

impl SesameResolver {
    pub fn new(base_url: impl Into<String>, settings: QuerySettings) -> Self {
        Self::with_transport(ReqwestTransport::new(), base_url, settings)
    }

    pub fn with_transport(
        transport: impl Transport + 'static,
        base_url: impl Into<String>,
        settings: QuerySettings,
    ) -> Self {
        Self {
            transport: Arc::new(transport),
            base_url: base_url.into(),
            settings,
        }
    }

    fn lookup_url(&self, name: &str) -> Result<String> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ConeError::usage(format!("invalid name resolver URL '{}': {}", self.base_url, e)))?;
        url.set_query(Some(name));
        Ok(url.into())
    }
}

#[async_trait]
impl NameResolver for SesameResolver {
    async fn resolve(&self, name: &str) -> Result<SkyPosition> {
        let name = name.trim();
        let service = ServiceDescriptor {
            short_name: Some("sesame".to_string()),
            ..ServiceDescriptor::new(self.lookup_url(name)?)
        };

        tracing::debug!("🔎 Resolving '{}' via {}", name, self.base_url);
        let response = try_query(self.transport.as_ref(), &service, &[], &self.settings).await?;

        let (ra, dec) = parse_sesame(&response.body_text()).map_err(|reason| ConeError::NameResolution {
            name: name.to_string(),
            reason,
        })?;
        SkyPosition::new(ra, dec).map_err(|e| ConeError::NameResolution {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }
}

/// First `jradeg`/`jdedeg` pair of a Sesame XML answer, in degrees.
fn parse_sesame(xml: &str) -> std::result::Result<(f64, f64), String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut current: Option<Vec<u8>> = None;
    let mut ra: Option<f64> = None;
    let mut dec: Option<f64> = None;
    let mut info: Vec<String> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => current = Some(e.local_name().as_ref().to_vec()),
            Ok(Event::End(_)) => current = None,
            Ok(Event::Text(ref t)) => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                let text = text.trim();
                match current.as_deref() {
                    Some(b"jradeg") if ra.is_none() => {
                        ra = Some(text.parse().map_err(|_| format!("bad jradeg '{}'", text))?);
                    }
                    Some(b"jdedeg") if dec.is_none() => {
                        dec = Some(text.parse().map_err(|_| format!("bad jdedeg '{}'", text))?);
                    }
                    Some(b"INFO") => info.push(text.to_string()),
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("unreadable resolver answer: {}", e)),
            _ => {}
        }
        if let (Some(ra), Some(dec)) = (ra, dec) {
            return Ok((ra, dec));
        }
        buf.clear();
    }

    Err(match info.first() {
        Some(message) => format!("not found ({})", message.trim_matches('*').trim()),
        None => "not found".to_string(),
    })
}
