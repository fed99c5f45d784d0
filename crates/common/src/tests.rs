use super::*;
use std::io;

#[test]
fn config_defaults_are_sane() {
    let cfg = Config::default();
    assert_eq!(cfg.scheme, "grpc");
    assert_eq!(cfg.busy_timeout(), Duration::from_secs(5));
    assert!(cfg.seed_user.is_none());
    assert_eq!(cfg.auth_db_path(), PathBuf::from("./data/auth.db"));
}

#[test]
fn builder_matches_defaults() {
    let built = Config::builder().build();
    let default = Config::default();
    assert_eq!(built.data_dir, default.data_dir);
    assert_eq!(built.scheme, default.scheme);
    assert_eq!(built.busy_timeout_ms, default.busy_timeout_ms);
}

#[test]
fn gateway_error_formats_cleanly() {
    let err = GatewayError::IndexNotFound("orders_name_idx".into());
    assert_eq!(format!("{err}"), "index 'orders_name_idx' not found");
    assert_eq!(
        GatewayError::AuthenticationFailed.to_string(),
        "authentication failed"
    );
}

#[test]
fn io_error_becomes_storage_unavailable() {
    let e = io::Error::other("disk full");
    let err: GatewayError = e.into();
    assert!(matches!(err, GatewayError::StorageUnavailable(msg) if msg.contains("disk full")));
}

#[test]
fn credential_debug_redacts_password() {
    let cred = Credential::new("alice", "secret1");
    let rendered = format!("{cred:?}");
    assert!(rendered.contains("alice"));
    assert!(!rendered.contains("secret1"));
}

#[test]
fn record_batch_len_tracks_rows() {
    let rb = RecordBatch {
        columns: vec!["id".into()],
        rows: vec![RowMap::from([("id".to_string(), "1".to_string())])],
        next_cursor: Some("1".into()),
    };
    assert_eq!(rb.len(), 1);
    assert!(!rb.is_empty());
    assert!(RecordBatch::default().is_empty());
}
