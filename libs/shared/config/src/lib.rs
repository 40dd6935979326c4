use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub server_port: u16,
    pub booking: BookingPolicyConfig,
}

/// Raw booking policy knobs. The appointment cell turns these into its rule set.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingPolicyConfig {
    pub min_lead_minutes: i64,
    pub opening_hour: u32,
    pub closing_hour: u32,
    pub cancellation_window_hours: i64,
    pub require_availability_window: bool,
    pub enforce_cancellation_window: bool,
    pub clinic_utc_offset_minutes: i32,
}

impl Default for BookingPolicyConfig {
    fn default() -> Self {
        Self {
            min_lead_minutes: 10,
            opening_hour: 8,
            closing_hour: 20,
            cancellation_window_hours: 24,
            require_availability_window: true,
            enforce_cancellation_window: true,
            clinic_utc_offset_minutes: 0,
        }
    }
}

impl BookingPolicyConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            min_lead_minutes: parse_or("BOOKING_MIN_LEAD_MINUTES", defaults.min_lead_minutes),
            opening_hour: parse_or("BOOKING_OPENING_HOUR", defaults.opening_hour),
            closing_hour: parse_or("BOOKING_CLOSING_HOUR", defaults.closing_hour),
            cancellation_window_hours: parse_or(
                "BOOKING_CANCELLATION_WINDOW_HOURS",
                defaults.cancellation_window_hours,
            ),
            require_availability_window: parse_or(
                "BOOKING_REQUIRE_AVAILABILITY",
                defaults.require_availability_window,
            ),
            enforce_cancellation_window: parse_or(
                "BOOKING_ENFORCE_CANCELLATION_WINDOW",
                defaults.enforce_cancellation_window,
            ),
            clinic_utc_offset_minutes: parse_or(
                "CLINIC_UTC_OFFSET_MINUTES",
                defaults.clinic_utc_offset_minutes,
            ),
        }
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {:?}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
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
            server_port: parse_or("SERVER_PORT", 3000),
            booking: BookingPolicyConfig::from_env(),
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
