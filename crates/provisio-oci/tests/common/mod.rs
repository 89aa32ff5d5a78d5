use std::sync::Arc;

use provisio_oci::{AnonymousSigner, Clients, ConfigurationProvider};
use tracing_subscriber::EnvFilter;
use wiremock::MockServer;

/// Route library logs through the test harness; `RUST_LOG` picks the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// Unsigned clients for every service family, pointed at the mock server
#[allow(dead_code)]
pub fn clients(server: &MockServer) -> Arc<Clients> {
    init_tracing();
    let provider = ConfigurationProvider::new("us-ashburn-1").with_endpoint(server.uri());
    Arc::new(Clients::with_signer(provider, Arc::new(AnonymousSigner)).unwrap())
}
