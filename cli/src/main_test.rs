mod tests {
    use crate::*;

    #[test]
    fn test_sanitize_path_allows_simple_relative() {
        let p = sanitize_path("trees/a.json").expect("relative path should be allowed");
        assert_eq!(p, PathBuf::from("trees/a.json"));
    }

    #[test]
    fn test_sanitize_path_rejects_parent_dir() {
        let err = sanitize_path("trees/../a.json").unwrap_err();
        assert!(err.to_string().contains("Parent directory components"));
    }

    #[test]
    fn test_cli_args_run_defaults_to_interpret() {
        let args = CliArgs::try_parse_from(["skem", "run", "a.json"]).expect("should parse");
        match args.command {
            Commands::Run { file, mode } => {
                assert_eq!(file, PathBuf::from("a.json"));
                assert_eq!(mode, ModeArg::Interpret);
            }
            other => panic!("expected run command, got {:?}", other),
        }
        assert!(!args.no_elide);
    }

    #[test]
    fn test_cli_args_global_flags() {
        let args = CliArgs::try_parse_from(["skem", "disasm", "a.yaml", "--no-elide", "--config", "skem.toml"])
            .expect("should parse");
        assert!(args.no_elide);
        assert_eq!(args.config.as_deref(), Some(Path::new("skem.toml")));
        assert!(matches!(args.command, Commands::Disasm { .. }));
    }

    #[test]
    fn test_cli_args_rejects_unknown_mode() {
        assert!(CliArgs::try_parse_from(["skem", "run", "a.json", "--mode", "fast"]).is_err());
        let args = CliArgs::try_parse_from(["skem", "run", "a.json", "--mode", "both"]).expect("should parse");
        assert!(matches!(args.command, Commands::Run { mode: ModeArg::Both, .. }));
    }

    #[test]
    fn test_no_elide_overrides_config() {
        let options = session_options(None, true).unwrap();
        assert!(!options.branch_elision);
        assert_eq!(ExecMode::from(ModeArg::Compile), ExecMode::Compile);
    }
}
