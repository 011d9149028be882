#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::config::AppConfig;

    #[test]
    fn embedded_defaults_deserialize() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.server.environment, "development");
        assert!(cfg.is_development());
        assert_eq!(cfg.rate_limit.max_requests, 100);
        assert_eq!(cfg.rate_limit.window_seconds, 900);
        assert_eq!(cfg.uploads.max_file_size_bytes, 5 * 1024 * 1024);
        assert_eq!(cfg.cors.frontend_origin, "http://localhost:3000");
    }

    #[test]
    fn uploads_dir_depends_on_environment_when_unset() {
        let mut cfg = AppConfig::default();
        cfg.uploads.dir = String::new();

        cfg.server.environment = "development".into();
        assert_eq!(cfg.uploads_dir(), PathBuf::from("uploads"));

        cfg.server.environment = "production".into();
        assert_eq!(cfg.uploads_dir(), PathBuf::from("/tmp/uploads"));
    }

    #[test]
    fn explicit_uploads_dir_wins() {
        let mut cfg = AppConfig::default();
        cfg.uploads.dir = "/srv/uploads".into();
        cfg.server.environment = "production".into();
        assert_eq!(cfg.uploads_dir(), PathBuf::from("/srv/uploads"));
    }

    #[test]
    fn sqlite_parent_dir_is_created() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("nested/dir/app.db");
        let url = format!("sqlite://{}", db_path.display());

        crate::config::ensure_sqlite_parent_dir(&url).unwrap();
        assert!(db_path.parent().unwrap().is_dir());
    }
}
