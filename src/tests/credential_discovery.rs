#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use serial_test::serial;
    use tempfile::{tempdir, NamedTempFile};

    use crate::auth::GcpToken;
    use crate::credentials::{load_descriptor, CredentialSource, CredentialType, Environment};
    use crate::error::Error;
    use crate::tests::common::{bare_environment, build_reqwest_client, AUTHORIZED_USER_JSON};
    use crate::utils::constants::{ADC_FILE_NAME, ENV_APPLICATION_CREDENTIALS, ENV_CLOUDSDK_CONFIG};

    #[test]
    fn explicit_missing_file_is_not_found() {
        let err = GcpToken::builder(build_reqwest_client())
            .credentials("/nonexistent/credentials.json")
            .environment(bare_environment())
            .build()
            .unwrap_err();
        match err {
            Error::NotFound { path } => assert_eq!(path, PathBuf::from("/nonexistent/credentials.json")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn env_credentials_path_counts_as_explicit() {
        let env = Environment {
            application_credentials: Some("/nonexistent/from-env.json".into()),
            ..bare_environment()
        };
        let err = load_descriptor(None, &env).unwrap_err();
        assert!(matches!(err, Error::NotFound { ref path } if path == &PathBuf::from("/nonexistent/from-env.json")));
    }

    #[test]
    fn cloudsdk_override_without_file_is_not_found() {
        let dir = tempdir().unwrap();
        let env = Environment { cloudsdk_config: Some(dir.path().display().to_string()), ..bare_environment() };
        match load_descriptor(None, &env) {
            Err(Error::NotFound { path }) => assert_eq!(path, dir.path().join(ADC_FILE_NAME)),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_well_known_file_means_ambient_identity() {
        let descriptor = load_descriptor(None, &bare_environment()).unwrap();
        assert!(descriptor.is_empty());
        assert_eq!(descriptor.credential_type().unwrap(), CredentialType::GceMetadata);
    }

    #[test]
    fn well_known_file_under_home_is_discovered() {
        let home = tempdir().unwrap();
        let gcloud_dir = home.path().join(".config").join("gcloud");
        std::fs::create_dir_all(&gcloud_dir).unwrap();
        std::fs::write(gcloud_dir.join(ADC_FILE_NAME), AUTHORIZED_USER_JSON).unwrap();

        let env = Environment { home_dir: Some(home.path().to_path_buf()), ..Default::default() };
        let descriptor = load_descriptor(None, &env).unwrap();
        assert_eq!(descriptor.credential_type().unwrap(), CredentialType::AuthorizedUser);
        assert_eq!(descriptor.get_str("client_id"), Some("123456.apps.googleusercontent.com"));
    }

    #[test]
    fn windows_app_data_location_is_discovered() {
        let app_data = tempdir().unwrap();
        let gcloud_dir = app_data.path().join("gcloud");
        std::fs::create_dir_all(&gcloud_dir).unwrap();
        std::fs::write(gcloud_dir.join(ADC_FILE_NAME), AUTHORIZED_USER_JSON).unwrap();

        let env = Environment {
            windows: true,
            app_data: Some(app_data.path().display().to_string()),
            ..Default::default()
        };
        let descriptor = load_descriptor(None, &env).unwrap();
        assert_eq!(descriptor.credential_type().unwrap(), CredentialType::AuthorizedUser);
    }

    #[test]
    fn unparsable_file_falls_back_to_metadata() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "this is not json").unwrap();

        let session = GcpToken::builder(build_reqwest_client())
            .credentials(file.path())
            .environment(bare_environment())
            .build()
            .unwrap();
        assert_eq!(session.credential_type(), CredentialType::GceMetadata);
    }

    #[test]
    fn explicit_source_wins_over_environment() {
        let env = Environment {
            application_credentials: Some("/nonexistent/from-env.json".into()),
            ..bare_environment()
        };
        let descriptor = load_descriptor(Some(CredentialSource::from_json(AUTHORIZED_USER_JSON)), &env).unwrap();
        assert_eq!(descriptor.credential_type().unwrap(), CredentialType::AuthorizedUser);
    }

    #[test]
    #[serial]
    fn process_environment_is_read_at_construction() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(AUTHORIZED_USER_JSON.as_bytes()).unwrap();

        std::env::set_var(ENV_APPLICATION_CREDENTIALS, file.path());
        std::env::remove_var(ENV_CLOUDSDK_CONFIG);
        let built = GcpToken::new(build_reqwest_client());
        std::env::remove_var(ENV_APPLICATION_CREDENTIALS);

        assert_eq!(built.unwrap().credential_type(), CredentialType::AuthorizedUser);
    }

    #[test]
    #[serial]
    fn empty_env_credentials_path_is_ignored() {
        std::env::set_var(ENV_APPLICATION_CREDENTIALS, "");
        let env = Environment::from_process();
        std::env::remove_var(ENV_APPLICATION_CREDENTIALS);

        assert!(env.application_credentials.is_none());
    }
}
