use std::path::PathBuf;

/// Default bucket for swing media.
pub const DEFAULT_BUCKET: &str = "vos-media";

/// Default public URL prefix for objects in [`DEFAULT_BUCKET`].
pub const DEFAULT_S3_PUBLIC_URL: &str = "https://vos-media.nyc3.digitaloceanspaces.com/";

/// Which backend holds media.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    S3,
}

impl StorageBackend {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Self::Local),
            "s3" => Some(Self::S3),
            _ => None,
        }
    }
}

/// S3-compatible backend settings.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (DigitalOcean Spaces, MinIO, LocalStack).
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub public_url: String,
    /// Static credentials. When absent the default AWS provider chain is used.
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Apply the `public-read` canned ACL to written objects.
    pub public_read: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.into(),
            region: "nyc3".into(),
            endpoint_url: None,
            force_path_style: false,
            public_url: DEFAULT_S3_PUBLIC_URL.into(),
            access_key_id: None,
            secret_access_key: None,
            public_read: true,
        }
    }
}

/// Media storage configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub local_root: PathBuf,
    pub local_public_url: String,
    pub s3: S3Config,
}

impl StorageConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                                          |
    /// |----------------------------|--------------------------------------------------|
    /// | `STORAGE_BACKEND`          | `local`                                          |
    /// | `LOCAL_STORAGE_ROOT`       | `storage/media`                                  |
    /// | `LOCAL_STORAGE_PUBLIC_URL` | `http://localhost:3000/media/`                   |
    /// | `S3_BUCKET`                | `vos-media`                                      |
    /// | `S3_REGION`                | `nyc3`                                           |
    /// | `S3_ENDPOINT_URL`          | unset                                            |
    /// | `S3_FORCE_PATH_STYLE`      | `false`                                          |
    /// | `S3_PUBLIC_URL`            | `https://vos-media.nyc3.digitaloceanspaces.com/` |
    /// | `S3_ACCESS_KEY_ID`         | unset                                            |
    /// | `S3_SECRET_ACCESS_KEY`     | unset                                            |
    /// | `S3_PUBLIC_READ`           | `true`                                           |
    pub fn from_env() -> Self {
        let backend_name = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".into());
        let backend = StorageBackend::from_name(&backend_name)
            .unwrap_or_else(|| panic!("STORAGE_BACKEND must be 'local' or 's3', got '{backend_name}'"));

        let defaults = S3Config::default();
        let s3 = S3Config {
            bucket: std::env::var("S3_BUCKET").unwrap_or(defaults.bucket),
            region: std::env::var("S3_REGION").unwrap_or(defaults.region),
            endpoint_url: std::env::var("S3_ENDPOINT_URL").ok().filter(|s| !s.is_empty()),
            force_path_style: parse_bool("S3_FORCE_PATH_STYLE", false),
            public_url: std::env::var("S3_PUBLIC_URL").unwrap_or(defaults.public_url),
            access_key_id: std::env::var("S3_ACCESS_KEY_ID").ok().filter(|s| !s.is_empty()),
            secret_access_key: std::env::var("S3_SECRET_ACCESS_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            public_read: parse_bool("S3_PUBLIC_READ", true),
        };

        Self {
            backend,
            local_root: std::env::var("LOCAL_STORAGE_ROOT")
                .unwrap_or_else(|_| "storage/media".into())
                .into(),
            local_public_url: std::env::var("LOCAL_STORAGE_PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000/media/".into()),
            s3,
        }
    }
}

fn parse_bool(var: &str, default: bool) -> bool {
    match std::env::var(var) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            other => panic!("{var} must be a boolean, got '{other}'"),
        },
        Err(_) => default,
    }
}
