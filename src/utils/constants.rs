//! Shared constants and invariants

pub const DEFAULT_SAFETY_MARGIN_SECS: u64 = 60;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 1;

// CyberArk endpoints
pub const IDENTITY_DOMAIN: &str = "id.cyberark.cloud";
pub const PLATFORM_TOKEN_PATH: &str = "/oauth2/platformtoken";
pub const PRIVILEGE_CLOUD_DOMAIN: &str = "privilegecloud.cyberark.cloud";
pub const PRIVILEGE_CLOUD_API_PATH: &str = "/PasswordVault/API";

// Environment variables
pub const ENV_IDENTITY_TENANT_ID: &str = "CYBERARK_IDENTITY_TENANT_ID";
pub const ENV_CLIENT_ID: &str = "CYBERARK_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "CYBERARK_CLIENT_SECRET";
pub const ENV_TIMEOUT: &str = "CYBERARK_TIMEOUT";
pub const ENV_SUBDOMAIN: &str = "CYBERARK_SUBDOMAIN";
pub const ENV_IDENTITY_URL: &str = "CYBERARK_IDENTITY_URL";
pub const ENV_API_URL: &str = "CYBERARK_API_URL";
