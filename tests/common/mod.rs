#![allow(dead_code)]

pub mod temp_files {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::{SystemTime, UNIX_EPOCH};

    // Global counter and lock for thread-safe temporary file creation
    static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);
    static TEMP_LOCK: Mutex<()> = Mutex::new(());

    /// Creates a temporary manifest with a unique name
    pub fn create_temp_manifest(content: &str, ext: &str) -> PathBuf {
        let _lock = TEMP_LOCK.lock().unwrap();
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::SeqCst);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();

        let path = std::env::temp_dir().join(format!(
            "segrouter_test_{}_{}_{}.{}",
            std::process::id(),
            counter,
            nanos,
            ext
        ));

        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn create_temp_toml(content: &str) -> PathBuf {
        create_temp_manifest(content, "toml")
    }

    pub fn create_temp_yaml(content: &str) -> PathBuf {
        create_temp_manifest(content, "yaml")
    }

    pub fn create_temp_json(content: &str) -> PathBuf {
        create_temp_manifest(content, "json")
    }

    /// Cleanup temporary files (best effort)
    pub fn cleanup_temp_files(paths: &[PathBuf]) {
        for path in paths {
            let _ = std::fs::remove_file(path);
        }
    }
}

pub mod handlers {
    use segrouter::dispatcher::{handler, Handler, HandlerResponse};
    use serde_json::json;

    /// Handler answering `{"handler": name, "params": {...}}`
    pub fn echo(name: &'static str) -> Handler {
        handler(move |req| {
            HandlerResponse::json(200, json!({ "handler": name, "params": req.params }))
        })
    }

    /// Fallback answering 404
    pub fn not_found() -> Handler {
        handler(|req| HandlerResponse::error(404, &format!("no route for {}", req.path)))
    }
}
