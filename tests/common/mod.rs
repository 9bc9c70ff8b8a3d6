#![allow(dead_code)]

pub mod fixture {
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    use spa_server::config::{
        AuthConfig, CacheConfig, CompressionConfig, Config, FilesConfig, LoggingConfig,
        PerformanceConfig, ServerConfig,
    };

    pub const INDEX_HTML: &str =
        "<!doctype html><html><head><title>app</title></head><body><div id=\"root\"></div></body></html>";
    pub const EXAMPLE_HTML: &str = "<html><body>example</body></html>";

    /// Large enough to cross the default 1024 byte compression threshold
    pub fn vite_svg() -> String {
        let path = "<path d=\"M29.883 6.146L16.56 29.968a.78.78 0 0 1-1.36.008L1.586 6.148\"/>";
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\">{}</svg>",
            path.repeat(30)
        )
    }

    /// A built SPA: index, an extra page, an icon and a nested asset
    pub fn dist() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("index.html"), INDEX_HTML).unwrap();
        fs::write(root.join("example.html"), EXAMPLE_HTML).unwrap();
        fs::write(root.join("vite.svg"), vite_svg()).unwrap();
        fs::create_dir_all(root.join("assets")).unwrap();
        fs::write(root.join("assets/app.js"), "console.log('app');").unwrap();
        dir
    }

    pub fn config(root: &Path) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                workers: None,
            },
            files: FilesConfig {
                directory: root.to_path_buf(),
                spa_mode: true,
            },
            compression: CompressionConfig {
                gzip: true,
                brotli: true,
                threshold: 1024,
            },
            cache: CacheConfig {
                enabled: true,
                byte_budget: 50 * 1024,
                max_age: 604_800,
                no_store_paths: vec!["example.html".to_string()],
            },
            auth: AuthConfig::default(),
            logging: LoggingConfig {
                access_log: false,
                access_log_format: "combined".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                keep_alive: false,
                connection_timeout: 5,
                max_connections: None,
            },
        }
    }
}

pub mod client {
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::{Request, Response};
    use std::net::SocketAddr;
    use std::sync::Arc;

    use spa_server::config::AppState;
    use spa_server::handler::handle_request;

    pub fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    pub async fn get(state: &Arc<AppState>, uri: &str) -> Response<Full<Bytes>> {
        request(state, Request::get(uri).body(()).unwrap()).await
    }

    pub async fn request(state: &Arc<AppState>, req: Request<()>) -> Response<Full<Bytes>> {
        handle_request(req, Arc::clone(state), peer()).await.unwrap()
    }

    pub async fn body(resp: Response<Full<Bytes>>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    pub fn header<'a>(resp: &'a Response<Full<Bytes>>, name: &str) -> Option<&'a str> {
        resp.headers().get(name).and_then(|v| v.to_str().ok())
    }
}
