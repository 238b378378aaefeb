//! Shared constants and invariants

pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
pub const DEFAULT_TOKEN_TTL_LEEWAY_SECS: i64 = 40;
pub const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

pub const GCE_ENDPOINT_TOKEN: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token?recursive=true";
pub const GCE_METADATA_FLAVOR_HEADER: &str = "metadata-flavor";
pub const GCE_METADATA_FLAVOR: &str = "Google";

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub const GRANT_TYPE_REFRESH_TOKEN: &str = "refresh_token";
pub const GRANT_TYPE_JWT_BEARER: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

// Credentials discovery
pub const ENV_APPLICATION_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const ENV_CLOUDSDK_CONFIG: &str = "CLOUDSDK_CONFIG";
pub const ENV_APPDATA: &str = "APPDATA";
pub const ENV_SYSTEM_DRIVE: &str = "SystemDrive";
pub const DEFAULT_SYSTEM_DRIVE: &str = "C:";
pub const ADC_FILE_NAME: &str = "application_default_credentials.json";

pub const GCP_GENERIC_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
