use std::env;
use tracing::warn;

pub const DEFAULT_DOCTOR_ROLE: &str = "Dentist";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    /// Role name a directory user must hold to be offered as a doctor.
    pub doctor_role_name: String,
    /// When false, entries flagged `is_available = false` no longer block new ones.
    pub overlap_includes_unavailable: bool,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            doctor_role_name: env::var("DOCTOR_ROLE_NAME")
                .unwrap_or_else(|_| DEFAULT_DOCTOR_ROLE.to_string()),
            overlap_includes_unavailable: parse_flag(
                "SCHEDULE_OVERLAP_INCLUDES_UNAVAILABLE",
                env::var("SCHEDULE_OVERLAP_INCLUDES_UNAVAILABLE").ok(),
                true,
            ),
            port: match env::var("PORT") {
                Ok(raw) => raw.parse().unwrap_or_else(|_| {
                    warn!("PORT is not a valid port number ({}), using {}", raw, DEFAULT_PORT);
                    DEFAULT_PORT
                }),
                Err(_) => DEFAULT_PORT,
            },
        };
        
        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }
        
        config
    }
    
    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() 
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_jwt_secret: String::new(),
            doctor_role_name: DEFAULT_DOCTOR_ROLE.to_string(),
            overlap_includes_unavailable: true,
            port: DEFAULT_PORT,
        }
    }
}

fn parse_flag(name: &str, raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        None | Some("") => default,
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        Some(other) => {
            warn!("{} has unrecognised value '{}', using {}", name, other, default);
            default
        }
    }
}
