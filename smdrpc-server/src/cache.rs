//! File cache for the SMD document
//!
//! Generating the service description walks every registered method, so a
//! deployment may write it once and serve the file afterwards. The
//! functions here never fail loudly: problems are logged and reported as
//! `false` or `None`.

use crate::Server;
use std::fs;
use std::path::Path;

/// Write the server's SMD document to `path`
///
/// Returns `false` when the parent directory is missing or the write fails.
pub fn save_smd(path: impl AsRef<Path>, server: &Server) -> bool {
    let path = path.as_ref();

    let parent_exists = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.is_dir(),
        _ => true,
    };
    if !parent_exists {
        tracing::warn!(path = %path.display(), "SMD cache directory does not exist");
        return false;
    }

    let document = server.service_map().to_json();
    if document.is_empty() {
        return false;
    }

    match fs::write(path, document) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "SMD cached");
            true
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write SMD cache");
            false
        }
    }
}

/// Read a cached SMD document
pub fn get_smd(path: impl AsRef<Path>) -> Option<String> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(document) => Some(document),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "SMD cache miss");
            None
        }
    }
}

/// Remove a cached SMD document
pub fn delete_smd(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    if !path.is_file() {
        return false;
    }
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to delete SMD cache");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::from_fn;
    use crate::method::Method;
    use crate::signature::{MethodSignature, ParamSignature};
    use serde_json::{json, Value};

    fn server() -> Server {
        let mut server = Server::new();
        server.set_target("/rpc");
        server
            .add_function(Method::new(
                MethodSignature::new("echo").param(ParamSignature::new("value", "string")),
                from_fn(|args| async move { Ok(Value::Array(args)) }),
            ))
            .unwrap();
        server
    }

    #[test]
    fn test_save_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smd.json");

        assert!(save_smd(&path, &server()));
        let document: Value = serde_json::from_str(&get_smd(&path).unwrap()).unwrap();
        assert_eq!(document["target"], json!("/rpc"));
        assert_eq!(document["services"]["echo"]["parameters"][0]["name"], json!("value"));

        assert!(delete_smd(&path));
        assert!(get_smd(&path).is_none());
        assert!(!delete_smd(&path));
    }

    #[test]
    fn test_save_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("smd.json");
        assert!(!save_smd(&path, &server()));
    }

    #[test]
    fn test_get_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(get_smd(dir.path().join("nothing.json")).is_none());
    }

    #[test]
    fn test_delete_directory_refused() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!delete_smd(dir.path()));
    }
}
