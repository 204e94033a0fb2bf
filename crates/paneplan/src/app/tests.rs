use super::*;

#[test]
fn test_cli_build() {
    let app = build_cli();
    assert_eq!(app.get_name(), "paneplan");
}

#[test]
fn test_cli_list_command() {
    let matches = build_cli().try_get_matches_from(vec!["paneplan", "list"]);
    assert!(matches.is_ok());
    assert!(matches.unwrap().subcommand_matches("list").is_some());
}

#[test]
fn test_cli_validate_preset_is_optional() {
    let matches = build_cli()
        .try_get_matches_from(vec!["paneplan", "validate"])
        .unwrap();
    let validate = matches.subcommand_matches("validate").unwrap();
    assert!(validate.get_one::<String>("preset").is_none());

    let matches = build_cli()
        .try_get_matches_from(vec!["paneplan", "validate", "dev"])
        .unwrap();
    let validate = matches.subcommand_matches("validate").unwrap();
    assert_eq!(validate.get_one::<String>("preset").unwrap(), "dev");
}

#[test]
fn test_cli_apply_flags() {
    let matches = build_cli()
        .try_get_matches_from(vec![
            "paneplan",
            "apply",
            "dev",
            "--dry-run",
            "--backend",
            "wezterm",
            "--window-mode",
            "current-window",
            "--window-name",
            "work",
            "--yes",
        ])
        .unwrap();
    let apply = matches.subcommand_matches("apply").unwrap();
    assert_eq!(apply.get_one::<String>("preset").unwrap(), "dev");
    assert!(apply.get_flag("dry-run"));
    assert!(apply.get_flag("yes"));
    assert_eq!(apply.get_one::<String>("backend").unwrap(), "wezterm");
    assert_eq!(
        apply.get_one::<String>("window-mode").unwrap(),
        "current-window"
    );
    assert_eq!(apply.get_one::<String>("window-name").unwrap(), "work");
}

#[test]
fn test_cli_apply_requires_preset() {
    let matches = build_cli().try_get_matches_from(vec!["paneplan", "apply"]);
    assert!(matches.is_err());
}

#[test]
fn test_cli_apply_rejects_unknown_backend() {
    let matches =
        build_cli().try_get_matches_from(vec!["paneplan", "apply", "dev", "--backend", "screen"]);
    assert!(matches.is_err());
}

#[test]
fn test_cli_global_flags_after_subcommand() {
    let matches = build_cli()
        .try_get_matches_from(vec!["paneplan", "list", "-v", "--config", "/tmp/p.toml"])
        .unwrap();
    assert!(matches.get_flag("verbose"));
    assert_eq!(
        matches
            .get_one::<std::path::PathBuf>("config")
            .unwrap()
            .to_str(),
        Some("/tmp/p.toml")
    );
}

#[test]
fn test_cli_requires_subcommand() {
    let matches = build_cli().try_get_matches_from(vec!["paneplan"]);
    assert!(matches.is_err());
}
