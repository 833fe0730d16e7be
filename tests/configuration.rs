use chirpy::configuration::get_configuration;

// Single test in this binary: it mutates the process environment.
#[test]
fn configuration_is_read_from_app_prefixed_environment() {
    std::env::set_var("APP_JWT__SECRET", "secret-from-environment");
    std::env::set_var("APP_JWT__ACCESS_TOKEN_EXPIRY", "900");
    std::env::set_var("APP_APPLICATION__HOST", "0.0.0.0");
    std::env::set_var("APP_APPLICATION__PORT", "8123");

    let settings = get_configuration().expect("Failed to read configuration from environment");

    assert_eq!(settings.jwt.secret, "secret-from-environment");
    assert_eq!(settings.jwt.access_token_expiry, 900);
    assert_eq!(settings.application.host, "0.0.0.0");
    assert_eq!(settings.application.port, 8123);
    assert!(settings.validate().is_ok());
}
