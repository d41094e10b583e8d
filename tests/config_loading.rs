//! Configuration resolution tests.
//!
//! Every test pins all CloudGuard environment variables so the developer's
//! own `~/.config/cloudguard` files and shell exports never leak in.

use std::fs;
use std::path::{Path, PathBuf};

use cloudguard::config::paths::{
    ENV_CLOUDGUARD_API_KEY, ENV_CLOUDGUARD_API_SECRET, ENV_CLOUDGUARD_CONFIG,
    ENV_CLOUDGUARD_CREDENTIALS, ENV_CLOUDGUARD_REGION,
};
use cloudguard::{CloudGuardError, Config, Credentials, ExposeSecret, Region};
use serial_test::serial;
use tempfile::TempDir;

/// Run `f` with the config/credentials paths pointing into `dir` and every
/// other CloudGuard variable unset unless overridden.
fn with_cloudguard_env<R>(
    dir: &Path,
    overrides: &[(&str, &str)],
    f: impl FnOnce() -> R,
) -> R {
    let config = dir.join("config").to_string_lossy().into_owned();
    let credentials = dir.join("credentials").to_string_lossy().into_owned();

    let vars: Vec<(&str, Option<String>)> = [
        (ENV_CLOUDGUARD_CONFIG, Some(config)),
        (ENV_CLOUDGUARD_CREDENTIALS, Some(credentials)),
        (ENV_CLOUDGUARD_API_KEY, None),
        (ENV_CLOUDGUARD_API_SECRET, None),
        (ENV_CLOUDGUARD_REGION, None),
    ]
    .into_iter()
    .map(|(name, default)| {
        let value = overrides
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string());
        (name, value.or(default))
    })
    .collect();

    temp_env::with_vars(vars, f)
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
#[serial]
fn test_load_from_env_only() {
    let dir = TempDir::new().unwrap();

    with_cloudguard_env(
        dir.path(),
        &[
            (ENV_CLOUDGUARD_API_KEY, "abc"),
            (ENV_CLOUDGUARD_API_SECRET, "xyz"),
            (ENV_CLOUDGUARD_REGION, "eu1"),
        ],
        || {
            let config = Config::load().unwrap();

            let api = config.credentials.api.as_ref().unwrap();
            assert_eq!(api.key, "abc");
            assert_eq!(api.secret().unwrap().expose_secret(), "xyz");

            let region = config.region().unwrap();
            assert_eq!(region.code(), "eu1");
            assert_eq!(region.api(), "https://api.eu1.dome9.com/");
        },
    );
}

#[test]
#[serial]
fn test_load_from_files_only() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "config", "[default]\nregion = ap2\n");
    write_file(
        dir.path(),
        "credentials",
        "[default]\napi_key = file-key\napi_secret = file-secret\n",
    );

    with_cloudguard_env(dir.path(), &[], || {
        let config = Config::load().unwrap();

        assert_eq!(config.region().unwrap().name(), "Australia");
        let api = config.credentials.api.as_ref().unwrap();
        assert_eq!(api.key, "file-key");
        assert_eq!(api.secret().unwrap().expose_secret(), "file-secret");
    });
}

#[test]
#[serial]
fn test_env_overrides_files() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "config", "[default]\nregion = us\n");
    write_file(
        dir.path(),
        "credentials",
        "[default]\napi_key = file-key\napi_secret = file-secret\n",
    );

    with_cloudguard_env(
        dir.path(),
        &[
            (ENV_CLOUDGUARD_API_KEY, "env-key"),
            (ENV_CLOUDGUARD_API_SECRET, "env-secret"),
            (ENV_CLOUDGUARD_REGION, "cace1"),
        ],
        || {
            let config = Config::load().unwrap();

            assert_eq!(config.region().unwrap().code(), "cace1");
            let api = config.credentials.api.as_ref().unwrap();
            assert_eq!(api.key, "env-key");
            assert_eq!(api.secret().unwrap().expose_secret(), "env-secret");
        },
    );
}

#[test]
#[serial]
fn test_explicit_assignment_overrides_env() {
    let dir = TempDir::new().unwrap();

    with_cloudguard_env(dir.path(), &[(ENV_CLOUDGUARD_REGION, "eu1")], || {
        let mut config = Config::load().unwrap();
        config.set_region("ap1").unwrap();
        assert_eq!(config.region().unwrap().name(), "Singapore");
    });
}

#[test]
#[serial]
fn test_env_key_without_secret() {
    let dir = TempDir::new().unwrap();

    with_cloudguard_env(dir.path(), &[(ENV_CLOUDGUARD_API_KEY, "abc")], || {
        let credentials = Credentials::load_from_env();
        let api = credentials.api.as_ref().unwrap();
        assert_eq!(api.key, "abc");
        assert!(api.secret().is_none());
    });
}

#[test]
#[serial]
fn test_env_secret_without_key_is_ignored() {
    let dir = TempDir::new().unwrap();

    with_cloudguard_env(dir.path(), &[(ENV_CLOUDGUARD_API_SECRET, "xyz")], || {
        assert!(Credentials::load_from_env().is_empty());
    });
}

#[test]
#[serial]
fn test_missing_files_are_not_fatal() {
    let dir = TempDir::new().unwrap();

    with_cloudguard_env(dir.path(), &[], || {
        let config = Config::load().unwrap();
        assert!(config.region().is_none());
        assert!(config.credentials.is_empty());
    });

    let missing = dir.path().join("does-not-exist");
    assert!(Config::load_from_file(Some(&missing))
        .unwrap()
        .region()
        .is_none());
    assert!(Credentials::load_from_file(Some(&missing))
        .unwrap()
        .is_empty());
}

#[test]
fn test_malformed_config_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "config", "region = eu1\nnot an ini file\n");

    let err = Config::load_from_file(Some(&path)).unwrap_err();
    match err {
        CloudGuardError::ConfigParse { path: ref p, .. } => assert_eq!(p, &path),
        other => panic!("expected ConfigParse, got {other:?}"),
    }
}

#[test]
fn test_malformed_credentials_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "credentials", "[default\napi_key = abc\n");

    let err = Credentials::load_from_file(Some(&path)).unwrap_err();
    assert!(matches!(err, CloudGuardError::ConfigParse { path: ref p, .. } if *p == path));
    assert!(err.to_string().contains(&*path.to_string_lossy()));
}

#[test]
#[serial]
fn test_malformed_file_propagates_through_load() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "config", "[default]\nregion\n");

    with_cloudguard_env(dir.path(), &[(ENV_CLOUDGUARD_REGION, "eu1")], || {
        assert!(matches!(
            Config::load(),
            Err(CloudGuardError::ConfigParse { .. })
        ));
    });
}

#[test]
#[serial]
fn test_unknown_region_in_env_propagates() {
    let dir = TempDir::new().unwrap();

    with_cloudguard_env(dir.path(), &[(ENV_CLOUDGUARD_REGION, "zz9")], || {
        match Config::load() {
            Err(CloudGuardError::UnknownRegion(region)) => assert_eq!(region, "zz9"),
            other => panic!("expected UnknownRegion, got {other:?}"),
        }
    });
}

#[test]
fn test_unknown_region_in_file_propagates() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "config", "[default]\nregion = mars\n");

    assert!(matches!(
        Config::load_from_file(Some(&path)),
        Err(CloudGuardError::UnknownRegion(_))
    ));
}

#[test]
#[serial]
fn test_explicit_path_beats_env_override() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "config", "[default]\nregion = us\n");
    let explicit = write_file(dir.path(), "explicit", "[default]\nregion = ap3\n");

    with_cloudguard_env(dir.path(), &[], || {
        let from_env_path = Config::load_from_file(None).unwrap();
        assert_eq!(from_env_path.region().unwrap().code(), "us");

        let from_explicit = Config::load_from_file(Some(&explicit)).unwrap();
        assert_eq!(from_explicit.region().unwrap().code(), "ap3");
    });
}

#[cfg(unix)]
#[test]
#[serial]
fn test_non_unicode_env_region_is_ignored() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "config", "[default]\nregion = ap1\n");

    with_cloudguard_env(dir.path(), &[], || {
        temp_env::with_var(
            ENV_CLOUDGUARD_REGION,
            Some(OsStr::from_bytes(b"eu\xff1")),
            || {
                let config = Config::load().unwrap();
                assert_eq!(config.region().unwrap().code(), "ap1");
            },
        );
    });
}

#[test]
fn test_commented_header_and_inherited_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "credentials",
        "[DEFAULT]\napi_secret = shared-secret\n\n[default] ; work account\napi_key = abc\n",
    );

    let credentials = Credentials::load_from_file(Some(&path)).unwrap();
    let api = credentials.api.as_ref().unwrap();
    assert_eq!(api.key, "abc");
    assert_eq!(api.secret().unwrap().expose_secret(), "shared-secret");
}

#[test]
fn test_non_default_sections_are_ignored() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "config",
        "[staging]\nregion = us\n\n[default]\nregion = eu1\n",
    );

    let config = Config::load_from_file(Some(&path)).unwrap();
    assert_eq!(config.region().unwrap().code(), "eu1");
}

#[test]
fn test_region_codes_round_trip() {
    let expected = [
        ("ap1", "https://api.ap1.dome9.com/"),
        ("ap2", "https://api.ap2.dome9.com/"),
        ("ap3", "https://api.ap3.dome9.com/"),
        ("cace1", "https://api.cace1.dome9.com/"),
        ("eu1", "https://api.eu1.dome9.com/"),
        ("us", "https://api.dome9.com/"),
    ];

    for (code, api) in expected {
        let mut config = Config::new();
        config.set_region(code).unwrap();

        let region = config.region().unwrap();
        assert_eq!(region.code(), code.to_lowercase());
        assert_eq!(region.api(), api);
        assert_eq!(Region::lookup(code).unwrap(), region);
    }
}

#[test]
fn test_config_display_never_shows_secret() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        dir.path(),
        "credentials",
        "[default]\napi_key = visible-key\napi_secret = hidden-secret\n",
    );

    let credentials = Credentials::load_from_file(Some(&path)).unwrap();
    let config = Config::new().with_credentials(credentials.clone());

    for text in [
        credentials.to_string(),
        format!("{credentials:?}"),
        config.to_string(),
        format!("{config:?}"),
    ] {
        assert!(text.contains("visible-key"));
        assert!(!text.contains("hidden-secret"));
    }
}
