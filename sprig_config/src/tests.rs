use crate::{
    env_parse_w_default, env_w_default, env_wo_default, SprigOptions,
};
use crate::errors::SprigConfigError;

#[test]
fn defaults() {
    let options = SprigOptions::default();
    assert_eq!(options.root_selector, "#app");
    assert_eq!(options.base_path, None);
    assert!(options.auto_update);
    assert!(!options.shadow_dom);
    assert_eq!(options.transition_class, "sprig-transition");
    assert_eq!(options.max_redirects, 16);
    assert_eq!(options.outlet_selector, "[data-outlet]");
    assert_eq!(options.max_stack_depth, 10);
}

#[test]
fn env_w_default_test() {
    temp_env::with_var("SPRIG_CONFIG_ENV_TEST", Some("custom"), || {
        assert_eq!(
            env_w_default("SPRIG_CONFIG_ENV_TEST", "default").unwrap(),
            String::from("custom")
        );
    });

    temp_env::with_var_unset("SPRIG_CONFIG_ENV_TEST", || {
        assert_eq!(
            env_w_default("SPRIG_CONFIG_ENV_TEST", "default").unwrap(),
            String::from("default")
        );
    });
}

#[test]
fn env_wo_default_test() {
    temp_env::with_var("SPRIG_CONFIG_ENV_TEST", Some("custom"), || {
        assert_eq!(
            env_wo_default("SPRIG_CONFIG_ENV_TEST").unwrap(),
            Some(String::from("custom"))
        );
    });

    temp_env::with_var_unset("SPRIG_CONFIG_ENV_TEST", || {
        assert_eq!(env_wo_default("SPRIG_CONFIG_ENV_TEST").unwrap(), None);
    });
}

#[test]
fn env_parse_rejects_garbage() {
    temp_env::with_var("SPRIG_CONFIG_PARSE_TEST", Some("maybe"), || {
        let err = env_parse_w_default("SPRIG_CONFIG_PARSE_TEST", true)
            .unwrap_err();
        assert!(matches!(err, SprigConfigError::EnvError { .. }));
    });
}

#[test]
fn try_from_env_test() {
    let config = temp_env::with_vars(
        [
            ("SPRIG_ROOT_SELECTOR", Some("#root")),
            ("SPRIG_BASE_PATH", Some("/app")),
            ("SPRIG_DEFAULT_LAYOUT", Some("main")),
            ("SPRIG_SHADOW_DOM", Some("true")),
            ("SPRIG_AUTO_UPDATE", Some("false")),
            ("SPRIG_TRANSITION_CLASS", Some("fade")),
            ("SPRIG_DEFAULT_EFFECT", Some("slide")),
            ("SPRIG_MAX_REDIRECTS", Some("4")),
            ("SPRIG_OUTLET_SELECTOR", Some("main")),
            ("SPRIG_MAX_STACK_DEPTH", Some("3")),
        ],
        || SprigOptions::try_from_env().unwrap(),
    );

    assert_eq!(config.root_selector, "#root");
    assert_eq!(config.base_path.as_deref(), Some("/app"));
    assert_eq!(config.default_layout.as_deref(), Some("main"));
    assert!(config.shadow_dom);
    assert!(!config.auto_update);
    assert_eq!(config.transition_class, "fade");
    assert_eq!(config.default_effect.as_deref(), Some("slide"));
    assert_eq!(config.max_redirects, 4);
    assert_eq!(config.outlet_selector, "main");
    assert_eq!(config.max_stack_depth, 3);
}
