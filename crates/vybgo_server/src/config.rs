use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

/// Credentials for the Supabase PostgREST backend. Both values must be
/// present together; a lone one is treated as misconfiguration.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_role_key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub jwt_secret: String,
    pub fcm_server_api_key: Option<String>,
    pub supabase: Option<SupabaseConfig>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("PORT", "3000"),
            jwt_secret: require("JWT_SECRET"),
            fcm_server_api_key: maybe("FCM_SERVER_API_KEY"),
            supabase: load_supabase(),
        }
    }
}

fn maybe(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn require(key: &str) -> String {
    maybe(key)
        .map_or_else(
            || {
                warn!("Required environment variable {key} is not set");
                Err(())
            },
            Ok,
        )
        .expect("Environment misconfigured!")
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    maybe(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn load_supabase() -> Option<SupabaseConfig> {
    match (maybe("SUPABASE_URL"), maybe("SUPABASE_SERVICE_ROLE_KEY")) {
        (Some(url), Some(service_role_key)) => Some(SupabaseConfig {
            url,
            service_role_key,
        }),
        (None, None) => None,
        _ => {
            warn!("SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY must be set together, ignoring");
            None
        }
    }
}
