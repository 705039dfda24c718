//! End-to-end tests through the public `djson` API

use djson::{
    DjsonOutput, EventTime, MemoryTransport, OutputConfig, Record, SchemaRegistry, Value,
    MAX_RECORD_SIZE,
};
use std::sync::Arc;

fn output(config: OutputConfig) -> (DjsonOutput, Arc<MemoryTransport>) {
    let transport = Arc::new(MemoryTransport::new());
    let out = DjsonOutput::new(config, transport.clone()).unwrap();
    (out, transport)
}

#[test]
fn first_record_in_fresh_registry() {
    let (out, transport) = output(OutputConfig::default());
    out.handle_record("t", EventTime::EPOCH, Record::new().with("n", 1))
        .unwrap();
    assert_eq!(transport.payloads(), vec![r#"1,[["n","FT_INT64"]],[1]"#]);
}

#[test]
fn config_file_drives_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("djson.toml");
    std::fs::write(
        &path,
        r#"
tag_regex_patterns = ['^mdsd\.syslog', '^mdsd\.ext_syslog\.\w+']
emit_timestamp_name = "emittime"
convert_hash_to_json = true
"#,
    )
    .unwrap();

    let (out, transport) = output(OutputConfig::from_file(&path).unwrap());
    let record = Record::new()
        .with("msg", "disk full")
        .with("ctx", Value::Map(vec![("dev".into(), "sda".into())]));
    out.handle_record("mdsd.ext_syslog.local1.err", EventTime::new(50, 1), record)
        .unwrap();

    let sent = &transport.messages()[0];
    assert_eq!(sent.source, "mdsd.ext_syslog.local1");
    assert_eq!(
        sent.payload,
        r#"1,[2,["msg","FT_STRING"],["ctx","FT_STRING"],["emittime","FT_TIME"]],["disk full","{\"dev\":\"sda\"}",[50,1]]"#
    );

    let frame = sent.frame();
    let (len, body) = frame.split_once('\n').unwrap();
    assert_eq!(len.parse::<usize>().unwrap(), body.len());
    let parsed: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(parsed[0], "mdsd.ext_syslog.local1");
    assert_eq!(parsed[1], 1);
}

#[test]
fn oversized_record_dropped_at_ceiling() {
    let (out, transport) = output(OutputConfig {
        max_record_size: MAX_RECORD_SIZE * 4,
        ..OutputConfig::default()
    });

    let big = Record::new().with("blob", "x".repeat(MAX_RECORD_SIZE));
    let small = Record::new().with("blob", "x".repeat(16));
    let summary = out
        .write_batch(vec![
            ("t".to_string(), EventTime::EPOCH, big),
            ("t".to_string(), EventTime::EPOCH, small),
        ])
        .unwrap();

    assert_eq!((summary.sent, summary.dropped), (1, 1));
    assert_eq!(transport.len(), 1);
}

#[test]
fn registries_are_independent() {
    let a = SchemaRegistry::new();
    let b = SchemaRegistry::new();
    a.get_schema(&Record::new().with("x", 1));
    let entry = b.get_schema(&Record::new().with("y", true));
    assert_eq!(entry.id(), 1);
    assert_eq!(a.len(), 1);
}
