use sprig_config::{
    errors::SprigConfigError, get_config_from_file, get_config_from_str,
    get_configuration, SprigOptions,
};
use std::{fs::File, io::Write, path::Path};
use tempfile::NamedTempFile;

const CONFIG_CONTENT_OK: &str = r##"
[package]
name = "demo"

[sprig]
root-selector = "#shell"
base-path = "/app"
default-layout = "main"
auto-update = false
max-redirects = 3
"##;

const CONFIG_CONTENT_ERR: &str = r#"
[sprig]
- invalid toml -
"#;

const CONFIG_CONTENT_COMMENTED: &str = r##"
[sprig] # app shell
outlet-selector = "section .outlet"
max-stack-depth = 4

[sprig.extra]
ignored = true

[tail]
root-selector = "#wrong"
"##;

const UNSET: [(&str, Option<&str>); 10] = [
    ("SPRIG_ROOT_SELECTOR", None),
    ("SPRIG_BASE_PATH", None),
    ("SPRIG_DEFAULT_LAYOUT", None),
    ("SPRIG_SHADOW_DOM", None),
    ("SPRIG_AUTO_UPDATE", None),
    ("SPRIG_TRANSITION_CLASS", None),
    ("SPRIG_DEFAULT_EFFECT", None),
    ("SPRIG_MAX_REDIRECTS", None),
    ("SPRIG_OUTLET_SELECTOR", None),
    ("SPRIG_MAX_STACK_DEPTH", None),
];

fn write_tmp(content: &str) -> NamedTempFile {
    let tmp = NamedTempFile::new().unwrap();
    {
        let mut output = File::create(&tmp).unwrap();
        write!(output, "{content}").unwrap();
    }
    tmp
}

#[test]
fn config_from_str_ok() {
    let config =
        temp_env::with_vars(UNSET, || get_config_from_str(CONFIG_CONTENT_OK))
            .unwrap();

    assert_eq!(config.root_selector, "#shell");
    assert_eq!(config.base_path.as_deref(), Some("/app"));
    assert_eq!(config.default_layout.as_deref(), Some("main"));
    assert!(!config.auto_update);
    assert_eq!(config.max_redirects, 3);
    // untouched keys keep their defaults
    assert_eq!(config.transition_class, "sprig-transition");
    assert_eq!(config.outlet_selector, "[data-outlet]");
}

#[test]
fn env_overrides_file_values() {
    let mut vars = UNSET.to_vec();
    vars[0] = ("SPRIG_ROOT_SELECTOR", Some("#from-env"));
    let config =
        temp_env::with_vars(vars, || get_config_from_str(CONFIG_CONTENT_OK))
            .unwrap();
    assert_eq!(config.root_selector, "#from-env");
    assert_eq!(config.base_path.as_deref(), Some("/app"));
}

#[test]
fn section_header_may_carry_a_comment() {
    let config = temp_env::with_vars(UNSET, || {
        get_config_from_str(CONFIG_CONTENT_COMMENTED)
    })
    .unwrap();

    assert_eq!(config.outlet_selector, "section .outlet");
    assert_eq!(config.max_stack_depth, 4);
    assert_eq!(config.root_selector, "#app");
}

#[test]
fn env_fills_keys_missing_from_the_file() {
    let mut vars = UNSET.to_vec();
    vars[9] = ("SPRIG_MAX_STACK_DEPTH", Some("2"));
    vars[6] = ("SPRIG_DEFAULT_EFFECT", Some("fade"));
    let config =
        temp_env::with_vars(vars, || get_config_from_str(CONFIG_CONTENT_OK))
            .unwrap();

    assert_eq!(config.max_stack_depth, 2);
    assert_eq!(config.default_effect.as_deref(), Some("fade"));
    assert_eq!(config.root_selector, "#shell");
}

#[test]
fn missing_section_is_reported() {
    let err = temp_env::with_vars(UNSET, || {
        get_config_from_str("[package]\nname = \"demo\"\n")
    })
    .unwrap_err();
    assert!(matches!(err, SprigConfigError::ConfigSectionNotFound));

    let err = temp_env::with_vars(UNSET, || {
        get_config_from_str("[other]\nsprig = 1\n")
    })
    .unwrap_err();
    assert!(matches!(err, SprigConfigError::ConfigSectionNotFound));
}

#[test]
fn config_from_file_ok() {
    let tmp = write_tmp(CONFIG_CONTENT_OK);
    let path: &Path = tmp.as_ref();
    let config =
        temp_env::with_vars(UNSET, || get_config_from_file(path)).unwrap();
    assert_eq!(config.root_selector, "#shell");
}

#[test]
fn config_from_invalid_file() {
    let tmp = write_tmp(CONFIG_CONTENT_ERR);
    let path: &Path = tmp.as_ref();
    let path_s = path.to_string_lossy().to_string();
    assert!(get_configuration(Some(&path_s)).is_err());
}

#[test]
fn config_from_missing_file() {
    let err = get_config_from_file("/definitely/not/here/Sprig.toml")
        .unwrap_err();
    assert!(matches!(err, SprigConfigError::ConfigNotFound(_)));
}

#[test]
fn config_without_path_reads_env() {
    let mut vars = UNSET.to_vec();
    vars[1] = ("SPRIG_BASE_PATH", Some("/env"));
    let config =
        temp_env::with_vars(vars, || get_configuration(None)).unwrap();
    assert_eq!(config.base_path.as_deref(), Some("/env"));
    assert_eq!(config, SprigOptions::builder().base_path("/env").build());
}
