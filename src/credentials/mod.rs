//! Credentials discovery.
//!
//! Locates the application-default credentials descriptor and parses it into a
//! [`CredentialDescriptor`]. Resolution order:
//!
//! 1. an explicit [`CredentialSource`] handed in by the caller
//! 2. the path in `GOOGLE_APPLICATION_CREDENTIALS`
//! 3. the gcloud SDK well-known path (`CLOUDSDK_CONFIG`, `~/.config/gcloud`,
//!    `%APPDATA%\gcloud` or `%SystemDrive%\gcloud`)
//!
//! An empty descriptor means "no local credentials": the token facade then falls
//! back to the platform metadata service.

use std::fmt;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::utils::constants::{
    ADC_FILE_NAME, DEFAULT_SYSTEM_DRIVE, ENV_APPDATA, ENV_APPLICATION_CREDENTIALS,
    ENV_CLOUDSDK_CONFIG, ENV_SYSTEM_DRIVE,
};

/// Where the credentials descriptor comes from when the caller names it.
pub enum CredentialSource {
    Path(PathBuf),
    /// In-memory descriptor, e.g. a secret mounted into the process some other way
    Reader(Box<dyn Read + Send>),
}

impl CredentialSource {
    pub fn from_json(contents: impl Into<String>) -> Self {
        CredentialSource::Reader(Box::new(std::io::Cursor::new(contents.into().into_bytes())))
    }
}

impl From<PathBuf> for CredentialSource {
    fn from(path: PathBuf) -> Self {
        CredentialSource::Path(path)
    }
}

impl From<&Path> for CredentialSource {
    fn from(path: &Path) -> Self {
        CredentialSource::Path(path.to_path_buf())
    }
}

impl From<&str> for CredentialSource {
    fn from(path: &str) -> Self {
        CredentialSource::Path(PathBuf::from(path))
    }
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            CredentialSource::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// Snapshot of the environment variables consulted during discovery.
///
/// Captured once at construction so discovery stays a pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub application_credentials: Option<String>,
    pub cloudsdk_config: Option<String>,
    pub app_data: Option<String>,
    pub system_drive: Option<String>,
    pub home_dir: Option<PathBuf>,
    pub windows: bool,
}

impl Environment {
    pub fn from_process() -> Self {
        Self {
            application_credentials: non_empty_var(ENV_APPLICATION_CREDENTIALS),
            cloudsdk_config: std::env::var(ENV_CLOUDSDK_CONFIG).ok(),
            app_data: std::env::var(ENV_APPDATA).ok(),
            system_drive: std::env::var(ENV_SYSTEM_DRIVE).ok(),
            home_dir: dirs::home_dir(),
            windows: cfg!(windows),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Closed set of supported descriptor types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialType {
    AuthorizedUser,
    GceMetadata,
    ServiceAccount,
}

impl CredentialType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialType::AuthorizedUser => "authorized_user",
            CredentialType::GceMetadata => "gce_metadata",
            CredentialType::ServiceAccount => "service_account",
        }
    }
}

impl std::str::FromStr for CredentialType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "authorized_user" => Ok(CredentialType::AuthorizedUser),
            "gce_metadata" => Ok(CredentialType::GceMetadata),
            "service_account" => Ok(CredentialType::ServiceAccount),
            other => Err(Error::Config(format!("'{other}' is not a valid credential type"))),
        }
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed key-value content of a credentials file. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CredentialDescriptor {
    fields: Map<String, Value>,
}

impl CredentialDescriptor {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Required string field, reported as a configuration error when absent.
    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.get_str(key).ok_or_else(|| {
            Error::Config(format!("credentials descriptor is missing required field '{key}'"))
        })
    }

    /// Empty descriptors mean ambient identity.
    pub fn credential_type(&self) -> Result<CredentialType> {
        if self.is_empty() {
            return Ok(CredentialType::GceMetadata);
        }
        self.get_str("type")
            .ok_or_else(|| Error::Config("credentials descriptor has no 'type' field".to_string()))?
            .parse()
    }
}

/// Well-known gcloud SDK location of the application-default credentials.
///
/// Returns the path and whether it counts as explicitly configured: only a
/// non-empty `CLOUDSDK_CONFIG` does.
pub fn well_known_path(env: &Environment) -> (PathBuf, bool) {
    let sdk_path = if let Some(config_dir) = &env.cloudsdk_config {
        PathBuf::from(config_dir)
    } else if !env.windows {
        env.home_dir.clone().unwrap_or_default().join(".config").join("gcloud")
    } else if let Some(app_data) = &env.app_data {
        PathBuf::from(app_data).join("gcloud")
    } else {
        let drive = env.system_drive.as_deref().unwrap_or(DEFAULT_SYSTEM_DRIVE);
        PathBuf::from(format!("{drive}\\gcloud"))
    };
    let explicit = env.cloudsdk_config.as_deref().is_some_and(|dir| !dir.is_empty());
    (sdk_path.join(ADC_FILE_NAME), explicit)
}

/// Resolve and read the credentials descriptor.
///
/// Missing files only fail when their location was set explicitly; every other
/// read or parse failure degrades to an empty descriptor.
pub fn load_descriptor(source: Option<CredentialSource>, env: &Environment) -> Result<CredentialDescriptor> {
    let (source, explicit) = match source {
        Some(source) => (source, true),
        None => match &env.application_credentials {
            Some(path) => (CredentialSource::Path(PathBuf::from(path)), true),
            None => {
                let (path, explicit) = well_known_path(env);
                (CredentialSource::Path(path), explicit)
            }
        },
    };

    match source {
        CredentialSource::Path(path) => match std::fs::read(&path) {
            Ok(bytes) => Ok(parse_or_empty(&bytes, &path.display().to_string())),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                if explicit {
                    return Err(Error::NotFound { path });
                }
                debug!(path = %path.display(), "no credentials file, using ambient identity");
                Ok(CredentialDescriptor::default())
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "credentials file unreadable, using ambient identity");
                Ok(CredentialDescriptor::default())
            }
        },
        CredentialSource::Reader(mut reader) => {
            let mut bytes = Vec::new();
            if let Err(err) = reader.read_to_end(&mut bytes) {
                warn!(error = %err, "credentials stream unreadable, using ambient identity");
                return Ok(CredentialDescriptor::default());
            }
            Ok(parse_or_empty(&bytes, "<in-memory>"))
        }
    }
}

fn parse_or_empty(bytes: &[u8], origin: &str) -> CredentialDescriptor {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(fields)) => CredentialDescriptor::new(fields),
        Ok(_) => {
            warn!(origin, "credentials descriptor is not a JSON object, using ambient identity");
            CredentialDescriptor::default()
        }
        Err(err) => {
            warn!(origin, error = %err, "credentials descriptor is not valid JSON, using ambient identity");
            CredentialDescriptor::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posix_env() -> Environment {
        Environment { home_dir: Some(PathBuf::from("/home/dev")), ..Default::default() }
    }

    #[test]
    fn well_known_path_posix_home() {
        let (path, explicit) = well_known_path(&posix_env());
        assert_eq!(path, PathBuf::from("/home/dev/.config/gcloud/application_default_credentials.json"));
        assert!(!explicit);
    }

    #[test]
    fn well_known_path_cloudsdk_override_is_explicit() {
        let env = Environment { cloudsdk_config: Some("/tmp/".into()), ..posix_env() };
        let (path, explicit) = well_known_path(&env);
        assert_eq!(path, PathBuf::from("/tmp/application_default_credentials.json"));
        assert!(explicit);
    }

    #[test]
    fn empty_cloudsdk_override_is_not_explicit() {
        let env = Environment { cloudsdk_config: Some(String::new()), ..posix_env() };
        let (path, explicit) = well_known_path(&env);
        assert_eq!(path, PathBuf::from(ADC_FILE_NAME));
        assert!(!explicit);

        let descriptor = load_descriptor(None, &env).unwrap();
        assert!(descriptor.is_empty());
    }

    #[test]
    fn well_known_path_windows_app_data_then_system_drive() {
        let env = Environment { windows: true, app_data: Some("/tmp/app_data/".into()), ..Default::default() };
        let (path, explicit) = well_known_path(&env);
        assert_eq!(path, PathBuf::from("/tmp/app_data/gcloud/application_default_credentials.json"));
        assert!(!explicit);

        let env = Environment { windows: true, ..Default::default() };
        let (path, _) = well_known_path(&env);
        assert_eq!(path, PathBuf::from("C:\\gcloud").join(ADC_FILE_NAME));

        let env = Environment { windows: true, system_drive: Some("D:".into()), ..Default::default() };
        let (path, _) = well_known_path(&env);
        assert_eq!(path, PathBuf::from("D:\\gcloud").join(ADC_FILE_NAME));
    }

    #[test]
    fn credential_type_parsing() {
        assert_eq!("service_account".parse::<CredentialType>().unwrap(), CredentialType::ServiceAccount);
        let err = "new_type".parse::<CredentialType>().unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: 'new_type' is not a valid credential type");
        assert_eq!(CredentialDescriptor::default().credential_type().unwrap(), CredentialType::GceMetadata);
    }

    #[test]
    fn in_memory_garbage_falls_back_to_empty() {
        let descriptor = load_descriptor(Some(CredentialSource::from_json("{not json")), &posix_env()).unwrap();
        assert!(descriptor.is_empty());

        let descriptor = load_descriptor(Some(CredentialSource::from_json("[1, 2]")), &posix_env()).unwrap();
        assert!(descriptor.is_empty());
    }
}
