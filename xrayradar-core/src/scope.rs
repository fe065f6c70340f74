use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::protocol::{Breadcrumb, Contexts, Map, Request, User, Value};

const DEFAULT_MAX_BREADCRUMBS: usize = 100;

/// A partial update of the ambient context.
///
/// Fields that are `None` (or empty maps) leave the corresponding slot
/// unchanged; `tags` and `extra` are merged into the existing mappings while
/// the other fields replace their slot.  This is what seeds the
/// environment/release/server_name scalars at client construction and what a
/// per-capture override applies to the capture's scope clone.
#[derive(Debug, Default, Clone)]
pub struct ContextUpdate {
    /// Replaces the user slot when set.
    pub user: Option<User>,
    /// Replaces the request slot when set.
    pub request: Option<Request>,
    /// Merged into the existing tags.
    pub tags: Map<String, String>,
    /// Merged into the existing extra values.
    pub extra: Map<String, Value>,
    /// Replaces the environment when set.
    pub environment: Option<String>,
    /// Replaces the release when set.
    pub release: Option<String>,
    /// Replaces the server name when set.
    pub server_name: Option<String>,
}

/// Holds contextual data for events.
///
/// The scope stores data that is locally relevant to an event: the recorded
/// breadcrumbs and the user/request/tags/extra context slots.  It is cheap
/// to clone; the clone is fully independent of the original (copy-on-write),
/// which is how per-capture overlays are built without touching the shared
/// scope.
///
/// The breadcrumb buffer is bounded: appending beyond `max_breadcrumbs`
/// evicts the oldest entries first.
#[derive(Clone)]
pub struct Scope {
    pub(crate) breadcrumbs: Arc<VecDeque<Breadcrumb>>,
    pub(crate) contexts: Arc<Contexts>,
    pub(crate) max_breadcrumbs: usize,
}

impl Default for Scope {
    fn default() -> Scope {
        Scope {
            breadcrumbs: Default::default(),
            contexts: Default::default(),
            max_breadcrumbs: DEFAULT_MAX_BREADCRUMBS,
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("breadcrumbs", &self.breadcrumbs.len())
            .field("contexts", &self.contexts)
            .field("max_breadcrumbs", &self.max_breadcrumbs)
            .finish()
    }
}

impl Scope {
    /// Creates an empty scope.
    pub fn new() -> Scope {
        Default::default()
    }

    /// The maximum number of breadcrumbs this scope retains.
    pub fn max_breadcrumbs(&self) -> usize {
        self.max_breadcrumbs
    }

    /// Reconfigures the breadcrumb bound, evicting oldest entries if the
    /// buffer is already over the new bound.
    pub fn set_max_breadcrumbs(&mut self, max_breadcrumbs: usize) {
        self.max_breadcrumbs = max_breadcrumbs;
        if self.breadcrumbs.len() > max_breadcrumbs {
            let breadcrumbs = Arc::make_mut(&mut self.breadcrumbs);
            while breadcrumbs.len() > max_breadcrumbs {
                breadcrumbs.pop_front();
            }
        }
    }

    /// Records a breadcrumb, evicting the oldest entries beyond the bound.
    pub fn add_breadcrumb(&mut self, breadcrumb: Breadcrumb) {
        let max_breadcrumbs = self.max_breadcrumbs;
        let breadcrumbs = Arc::make_mut(&mut self.breadcrumbs);
        breadcrumbs.push_back(breadcrumb);
        while breadcrumbs.len() > max_breadcrumbs {
            breadcrumbs.pop_front();
        }
    }

    /// Deletes current breadcrumbs from the scope.
    pub fn clear_breadcrumbs(&mut self) {
        self.breadcrumbs = Default::default();
    }

    /// Returns a snapshot copy of the recorded breadcrumbs, oldest first.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.breadcrumbs.iter().cloned().collect()
    }

    /// Sets the user for the scope.  `None` clears the slot.
    pub fn set_user(&mut self, user: Option<User>) {
        Arc::make_mut(&mut self.contexts).user = user;
    }

    /// Sets the request for the scope.  `None` clears the slot.
    pub fn set_request(&mut self, request: Option<Request>) {
        Arc::make_mut(&mut self.contexts).request = request;
    }

    /// Sets a tag to a specific value.
    pub fn set_tag<V: ToString>(&mut self, key: &str, value: V) {
        Arc::make_mut(&mut self.contexts)
            .tags
            .insert(key.to_string(), value.to_string());
    }

    /// Removes a tag.
    ///
    /// If the tag is not set, does nothing.
    pub fn remove_tag(&mut self, key: &str) {
        Arc::make_mut(&mut self.contexts).tags.remove(key);
    }

    /// Sets an extra to a specific value.
    pub fn set_extra(&mut self, key: &str, value: Value) {
        Arc::make_mut(&mut self.contexts)
            .extra
            .insert(key.to_string(), value);
    }

    /// Sets a context for a key.
    ///
    /// `"user"` and `"request"` route into the dedicated slots; every other
    /// key is stored under `extra[key]`.  A value that does not fit the
    /// typed slot is preserved under `extra[key]` instead of being lost.
    pub fn set_context(&mut self, key: &str, data: Map<String, Value>) {
        let contexts = Arc::make_mut(&mut self.contexts);
        let value = Value::Object(data.into_iter().collect());
        match key {
            "user" => match serde_json::from_value::<User>(value.clone()) {
                Ok(user) => contexts.user = Some(user),
                Err(_) => {
                    contexts.extra.insert(key.to_string(), value);
                }
            },
            "request" => match serde_json::from_value::<Request>(value.clone()) {
                Ok(request) => contexts.request = Some(request),
                Err(_) => {
                    contexts.extra.insert(key.to_string(), value);
                }
            },
            _ => {
                contexts.extra.insert(key.to_string(), value);
            }
        }
    }

    /// Returns a snapshot copy of the context slots.
    pub fn contexts(&self) -> Contexts {
        (*self.contexts).clone()
    }

    /// Applies a partial context update to the scope.
    ///
    /// `tags`/`extra` are merged, everything else replaces its slot when
    /// present in the update.
    pub fn apply_context_update(&mut self, update: &ContextUpdate) {
        let contexts = Arc::make_mut(&mut self.contexts);
        if let Some(user) = &update.user {
            contexts.user = Some(user.clone());
        }
        if let Some(request) = &update.request {
            contexts.request = Some(request.clone());
        }
        contexts.tags.extend(
            update
                .tags
                .iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned())),
        );
        contexts.extra.extend(
            update
                .extra
                .iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned())),
        );
        if let Some(environment) = &update.environment {
            contexts.environment = Some(environment.clone());
        }
        if let Some(release) = &update.release {
            contexts.release = Some(release.clone());
        }
        if let Some(server_name) = &update.server_name {
            contexts.server_name = Some(server_name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crumb(message: &str) -> Breadcrumb {
        Breadcrumb {
            message: message.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_breadcrumb_bound() {
        let mut scope = Scope::new();
        scope.set_max_breadcrumbs(2);
        scope.add_breadcrumb(crumb("one"));
        scope.add_breadcrumb(crumb("two"));
        scope.add_breadcrumb(crumb("three"));
        let crumbs = scope.breadcrumbs();
        assert_eq!(crumbs.len(), 2);
        assert_eq!(crumbs[0].message, "two");
        assert_eq!(crumbs[1].message, "three");
    }

    #[test]
    fn test_breadcrumb_bound_never_exceeded() {
        let mut scope = Scope::new();
        scope.set_max_breadcrumbs(5);
        for i in 0..250 {
            scope.add_breadcrumb(crumb(&format!("crumb {}", i)));
            assert!(scope.breadcrumbs().len() <= 5);
        }
    }

    #[test]
    fn test_clear_breadcrumbs() {
        let mut scope = Scope::new();
        scope.add_breadcrumb(crumb("a"));
        scope.add_breadcrumb(crumb("b"));
        scope.clear_breadcrumbs();
        assert!(scope.breadcrumbs().is_empty());
    }

    #[test]
    fn test_clone_isolation() {
        let mut scope = Scope::new();
        scope.set_tag("shared", "yes");
        scope.add_breadcrumb(crumb("original"));

        let mut clone = scope.clone();
        clone.set_tag("clone-only", "yes");
        clone.add_breadcrumb(crumb("cloned"));
        clone.set_user(Some(User {
            id: Some("u1".into()),
            ..Default::default()
        }));

        assert!(!scope.contexts().tags.contains_key("clone-only"));
        assert!(scope.contexts().user.is_none());
        assert_eq!(scope.breadcrumbs().len(), 1);
        assert_eq!(clone.breadcrumbs().len(), 2);

        scope.set_tag("source-only", "yes");
        assert!(!clone.contexts().tags.contains_key("source-only"));
    }

    #[test]
    fn test_set_user_none_clears() {
        let mut scope = Scope::new();
        scope.set_user(Some(User {
            id: Some("u1".into()),
            ..Default::default()
        }));
        assert!(scope.contexts().user.is_some());
        scope.set_user(None);
        assert!(scope.contexts().user.is_none());
    }

    #[test]
    fn test_set_context_routing() {
        let mut scope = Scope::new();

        let mut user = Map::new();
        user.insert("id".to_string(), Value::from("u1"));
        scope.set_context("user", user);
        assert_eq!(scope.contexts().user.unwrap().id.as_deref(), Some("u1"));

        let mut request = Map::new();
        request.insert("url".to_string(), Value::from("/checkout"));
        scope.set_context("request", request);
        assert_eq!(
            scope.contexts().request.unwrap().url.as_deref(),
            Some("/checkout")
        );

        let mut custom = Map::new();
        custom.insert("foo".to_string(), Value::from("bar"));
        scope.set_context("custom", custom);
        assert_eq!(
            scope.contexts().extra["custom"],
            serde_json::json!({"foo": "bar"})
        );
    }

    #[test]
    fn test_set_context_bad_shape_lands_in_extra() {
        let mut scope = Scope::new();
        let mut user = Map::new();
        user.insert("id".to_string(), Value::from(42));
        scope.set_context("user", user);
        assert!(scope.contexts().user.is_none());
        assert_eq!(scope.contexts().extra["user"], serde_json::json!({"id": 42}));
    }

    #[test]
    fn test_apply_context_update_merges_maps() {
        let mut scope = Scope::new();
        scope.set_tag("kept", "1");
        scope.set_extra("kept", Value::from(1));

        let mut update = ContextUpdate {
            environment: Some("staging".into()),
            ..Default::default()
        };
        update.tags.insert("added".into(), "2".into());
        update.extra.insert("added".into(), Value::from(2));
        scope.apply_context_update(&update);

        let contexts = scope.contexts();
        assert_eq!(contexts.tags.len(), 2);
        assert_eq!(contexts.extra.len(), 2);
        assert_eq!(contexts.environment.as_deref(), Some("staging"));
        assert!(contexts.release.is_none());
    }
}
