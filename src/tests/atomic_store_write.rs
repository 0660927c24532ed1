#[cfg(test)]
mod tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use tempfile::tempdir;

    use crate::cache::token::TokenRecord;
    use crate::cache::token_store::TokenStore;

    #[tokio::test]
    async fn save_replaces_file_with_private_permissions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/data/tokens.json");
        let store = TokenStore::new(&path);
        let created = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap();

        store.save(&[TokenRecord::new("token-value-123".into(), created, 1800)]).await.unwrap();
        store.save(&[]).await.unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "[]");
        let mode = fs::metadata(&path).expect("meta").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "permissions mismatch (expected 0600)");

        // no temp file left behind
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("tokens.json")]);
    }

    #[tokio::test]
    async fn stale_world_readable_temp_file_is_not_reused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let tmp = dir.path().join("tokens.json.tmp");
        fs::write(&tmp, "leftover from a crashed writer").unwrap();
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o644)).unwrap();
        let created = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap();

        TokenStore::new(&path)
            .save(&[TokenRecord::new("secret-token".into(), created, 1800)])
            .await
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert!(!tmp.exists());
        assert!(fs::read_to_string(&path).unwrap().contains("secret-token"));
    }

    #[tokio::test]
    async fn document_layout_matches_store_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let created = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap();

        TokenStore::new(&path)
            .save(&[TokenRecord::new("abc".into(), created, 1800)])
            .await
            .unwrap();

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            doc,
            serde_json::json!([{
                "token": "abc",
                "expiresAt": "2099-01-01T00:30:00.000Z",
                "createdAt": "2099-01-01T00:00:00.000Z",
                "ttl": 1800
            }])
        );
    }
}
