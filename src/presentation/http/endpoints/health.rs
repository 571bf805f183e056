use poem_openapi::{OpenApi, payload::PlainText};

use crate::presentation::http::endpoints::root::{Endpoints, EndpointsTags};

#[OpenApi]
impl Endpoints {
    /// Liveness probe. Checked by the cron scheduler before it triggers the
    /// dispatch routes; no auth and no database access.
    #[oai(path = "/health", method = "get", tag = EndpointsTags::Health)]
    pub async fn health(&self) -> PlainText<&'static str> {
        PlainText("salon-growth ok")
    }
}
