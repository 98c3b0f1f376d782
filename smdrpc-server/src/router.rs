//! Method table
//!
//! Maps method names to [`Method`]s. The table is `Arc`-backed: clones are
//! cheap snapshots, and registration copies the map only while a snapshot
//! is shared.

use crate::method::Method;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct Router {
    methods: Arc<HashMap<String, Method>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a method, replacing any method of the same name
    pub fn register(&mut self, method: Method) -> Option<Method> {
        let methods = Arc::make_mut(&mut self.methods);
        methods.insert(method.name().to_string(), method)
    }

    pub fn get(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered methods ordered by name
    pub fn methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.methods.values().cloned().collect();
        methods.sort_by(|a, b| a.name().cmp(b.name()));
        methods
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::from_fn;
    use crate::signature::MethodSignature;
    use serde_json::json;

    fn method(name: &str, reply: i64) -> Method {
        Method::new(
            MethodSignature::new(name),
            from_fn(move |_| async move { Ok(json!(reply)) }),
        )
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let mut router = Router::new();
        assert!(router.register(method("foo", 1)).is_none());
        assert!(router.register(method("foo", 2)).is_some());
        assert_eq!(router.len(), 1);

        let handler = router.get("foo").unwrap().handler();
        assert_eq!(handler.handle(vec![]).await.unwrap(), json!(2));
    }

    #[test]
    fn test_methods_sorted() {
        let mut router = Router::new();
        router.register(method("zeta", 0));
        router.register(method("alpha", 0));
        router.register(method("mid", 0));

        let names: Vec<String> = router.methods().iter().map(|m| m.name().to_string()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_clone_is_snapshot() {
        let mut router = Router::new();
        router.register(method("one", 1));
        let snapshot = router.clone();
        router.register(method("two", 2));

        assert!(!snapshot.has_method("two"));
        assert!(router.has_method("two"));
        assert!(!Router::new().has_method("one"));
        assert!(Router::new().is_empty());
    }
}
