mod supabase_auth_tests;

use aa_shared::BackendConfig;
use wiremock::MockServer;

pub(super) fn config(server: &MockServer) -> BackendConfig {
    BackendConfig {
        url: server.uri(),
        anon_key: "anon-key".to_string(),
        ..Default::default()
    }
}
