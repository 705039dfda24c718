//! Clap command definition.

use clap::{Arg, ArgAction, Command};

/// Default number of events per batch
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Build the `djson` command.
pub fn build_cli() -> Command {
    Command::new("djson")
        .about("Encode events as djson and ship them to the monitoring agent")
        .arg(
            Arg::new("input")
                .help("Event file to read (default: stdin)")
                .index(1),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Path of djson.toml"),
        )
        .arg(
            Arg::new("socket")
                .long("socket")
                .short('s')
                .help("Agent socket path (overrides djson_socket)"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .help("Input encoding")
                .value_parser(["json", "msgpack"])
                .default_value("json"),
        )
        .arg(
            Arg::new("batch-size")
                .long("batch-size")
                .help("Events handed to the output per batch")
                .value_parser(clap::value_parser!(usize))
                .default_value("256"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Print framed items to stdout instead of sending")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("print-default-config")
                .long("print-default-config")
                .help("Print a commented default djson.toml and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("init-config")
                .long("init-config")
                .help("Write a default config file at the given path if missing, then exit")
                .value_name("PATH"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let m = build_cli().try_get_matches_from(["djson"]).unwrap();
        assert_eq!(m.get_one::<String>("format").map(String::as_str), Some("json"));
        assert_eq!(m.get_one::<usize>("batch-size"), Some(&DEFAULT_BATCH_SIZE));
        assert!(!m.get_flag("dry-run"));
        assert!(m.get_one::<String>("input").is_none());
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(build_cli()
            .try_get_matches_from(["djson", "--format", "xml"])
            .is_err());
    }

    #[test]
    fn test_full_invocation() {
        let m = build_cli()
            .try_get_matches_from([
                "djson", "-c", "djson.toml", "-s", "/tmp/s", "--dry-run", "events.ndjson",
            ])
            .unwrap();
        assert_eq!(m.get_one::<String>("config").unwrap(), "djson.toml");
        assert_eq!(m.get_one::<String>("socket").unwrap(), "/tmp/s");
        assert_eq!(m.get_one::<String>("input").unwrap(), "events.ndjson");
        assert!(m.get_flag("dry-run"));
    }
}
