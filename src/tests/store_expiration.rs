#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use crate::cache::token::TokenRecord;
    use crate::cache::token_store::{partition_by_expiry, TokenStore};
    use crate::error::PoolError;
    use crate::helpers::time::now_utc;
    use crate::tests::common::{manager, record_aged, ScriptedIssuer};

    #[tokio::test]
    async fn absent_store_reads_as_empty_status() {
        let dir = tempdir().unwrap();
        let pool = manager(ScriptedIssuer::new(), &dir.path().join("missing/tokens.json"));

        let status = pool.read_valid().await.unwrap();

        assert_eq!((status.total, status.valid, status.expired), (0, 0, 0));
        assert!(status.tokens.is_empty());
    }

    #[tokio::test]
    async fn status_partitions_past_and_future() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let past = record_aged("past", 3600, 1800);
        let future = record_aged("future", 0, 1800);
        TokenStore::new(&path).save(&[past, future.clone()]).await.unwrap();

        let pool = manager(ScriptedIssuer::new(), &path);
        let before = std::fs::read_to_string(&path).unwrap();
        let status = pool.read_valid().await.unwrap();

        assert_eq!((status.total, status.valid, status.expired), (2, 1, 1));
        assert_eq!(status.tokens, vec![future]);
        // reading never prunes
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn persist_prunes_expired_and_appends_new_last() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let old_valid = record_aged("old-valid", 60, 1800);
        let expired = record_aged("expired", 7200, 1800);
        let later_valid = record_aged("later-valid", 30, 1800);
        TokenStore::new(&path)
            .save(&[old_valid.clone(), expired, later_valid.clone()])
            .await
            .unwrap();

        let pool = manager(ScriptedIssuer::new(), &path);
        let fresh = record_aged("fresh", 0, 1800);
        let merged = pool.persist(vec![fresh.clone()]).await.unwrap();

        assert_eq!(merged, vec![old_valid, later_valid, fresh]);
        assert_eq!(TokenStore::new(&path).load().await.unwrap(), merged);
    }

    #[tokio::test]
    async fn persist_of_nothing_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let pool = manager(ScriptedIssuer::new(), &path);
        pool.persist(vec![record_aged("a", 0, 1800), record_aged("b", 0, 3600)])
            .await
            .unwrap();

        pool.persist(vec![]).await.unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        pool.persist(vec![]).await.unwrap();
        let second = std::fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn expiring_exactly_now_counts_as_expired() {
        let now = now_utc();
        let record = TokenRecord {
            token: "edge".into(),
            expires_at: now,
            created_at: now,
            ttl: 0,
        };
        let (valid, expired) = partition_by_expiry(vec![record], now);
        assert!(valid.is_empty());
        assert_eq!(expired.len(), 1);
    }

    #[tokio::test]
    async fn corrupt_store_is_surfaced_not_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, "{ not json").unwrap();
        let pool = manager(ScriptedIssuer::new(), &path);

        assert!(matches!(pool.read_valid().await, Err(PoolError::StoreRead { .. })));
        let err = pool.persist(vec![record_aged("new", 0, 1800)]).await.unwrap_err();
        assert_eq!(err.kind(), "store_read_error");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[tokio::test]
    async fn blank_store_reads_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, "\n").unwrap();

        assert!(TokenStore::new(&path).load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reads_store_written_by_other_tools() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(
            &path,
            r#"[{"token":"t","expiresAt":"2099-01-01T00:30:00+00:00","createdAt":"2099-01-01T00:00:00Z","ttl":1800}]"#,
        )
        .unwrap();

        let tokens = TokenStore::new(&path).load().await.unwrap();

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].ttl, 1800);
        assert!(tokens[0].is_valid_at(now_utc()));
    }
}
