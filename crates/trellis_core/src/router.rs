//! Router seam
//!
//! Stack panels register route callbacks through the [`Router`] trait. The
//! tree owns at most one router; [`ComponentTree::navigate`] changes the
//! current path and runs every matching handler.
//!
//! [`PathRouter`] is a small path matcher: segments compare literally, and a
//! segment starting with `:` matches any single segment.

use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::error::{Result, TreeError};
use crate::tree::ComponentTree;

/// Callback run when its route matches the current path
pub type RouteHandler = Rc<dyn Fn(&mut ComponentTree) -> Result<()>>;

/// Box a closure as a [`RouteHandler`]
pub fn route_handler(f: impl Fn(&mut ComponentTree) -> Result<()> + 'static) -> RouteHandler {
    Rc::new(f)
}

/// Maps paths to handlers
pub trait Router {
    /// Register a handler for a route pattern
    fn on(&mut self, route: &str, handler: RouteHandler);

    /// Handlers matching the current path, in registration order
    fn resolve(&self) -> Vec<RouteHandler>;

    /// Change the current path without running handlers
    fn navigate(&mut self, path: &str);

    fn current(&self) -> Option<&str>;
}

struct Route {
    pattern: String,
    handler: RouteHandler,
}

/// Segment-matching router
#[derive(Default)]
pub struct PathRouter {
    routes: Vec<Route>,
    current: Option<String>,
}

impl fmt::Debug for PathRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathRouter")
            .field(
                "routes",
                &self.routes.iter().map(|r| r.pattern.as_str()).collect::<Vec<_>>(),
            )
            .field("current", &self.current)
            .finish()
    }
}

impl PathRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn segments(path: &str) -> SmallVec<[&str; 8]> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Whether `path` matches a route `pattern`
pub fn route_matches(pattern: &str, path: &str) -> bool {
    let pattern = segments(pattern);
    let path = segments(path);
    pattern.len() == path.len()
        && pattern
            .iter()
            .zip(path.iter())
            .all(|(p, s)| p.starts_with(':') || p == s)
}

impl Router for PathRouter {
    fn on(&mut self, route: &str, handler: RouteHandler) {
        tracing::debug!(route, "registered route");
        self.routes.push(Route {
            pattern: route.to_string(),
            handler,
        });
    }

    fn resolve(&self) -> Vec<RouteHandler> {
        let Some(current) = self.current.as_deref() else {
            return Vec::new();
        };
        self.routes
            .iter()
            .filter(|route| route_matches(&route.pattern, current))
            .map(|route| Rc::clone(&route.handler))
            .collect()
    }

    fn navigate(&mut self, path: &str) {
        self.current = Some(path.to_string());
    }

    fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

impl ComponentTree {
    /// Install the router, replacing any previous one
    pub fn set_router(&mut self, router: impl Router + 'static) {
        self.router = Some(Box::new(router));
    }

    pub fn router(&self) -> Option<&dyn Router> {
        self.router.as_deref()
    }

    fn require_router(&mut self) -> Result<&mut Box<dyn Router>> {
        self.router
            .as_mut()
            .ok_or_else(|| TreeError::Router("no router installed".into()))
    }

    /// Register a route handler with the installed router
    pub fn register_route(&mut self, route: &str, handler: RouteHandler) -> Result<()> {
        self.require_router()?.on(route, handler);
        Ok(())
    }

    /// Change the current path and run the matching handlers
    pub fn navigate(&mut self, path: &str) -> Result<()> {
        self.require_router()?.navigate(path);
        tracing::debug!(path, "navigated");
        self.resolve_routes()
    }

    /// Run the handlers matching the current path
    pub fn resolve_routes(&mut self) -> Result<()> {
        let handlers = self.require_router()?.resolve();
        for handler in handlers {
            handler(self)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::RecordingPatcher;
    use crate::widget::Widget;

    #[test]
    fn test_route_matching() {
        assert!(route_matches("/users/:id", "/users/42"));
        assert!(route_matches("/users/", "/users"));
        assert!(!route_matches("/users/:id", "/users"));
        assert!(!route_matches("/users/:id", "/posts/42"));
        assert!(route_matches("/", ""));
    }

    #[test]
    fn test_navigate_runs_matching_handlers() {
        let mut tree = ComponentTree::new(RecordingPatcher::new());
        tree.set_router(PathRouter::new());
        let label = tree.create(Widget::new("span"));

        tree.register_route(
            "/greet/:name",
            route_handler(move |tree| tree.update::<Widget, _>(label, |w| w.set_text("hi"))),
        )
        .unwrap();

        tree.navigate("/other").unwrap();
        assert_eq!(tree.get::<Widget>(label).unwrap().text(), None);

        tree.navigate("/greet/bob").unwrap();
        assert_eq!(tree.get::<Widget>(label).unwrap().text(), Some("hi"));
        assert_eq!(tree.router().unwrap().current(), Some("/greet/bob"));
    }

    #[test]
    fn test_missing_router_is_an_error() {
        let mut tree = ComponentTree::new(RecordingPatcher::new());
        assert!(matches!(tree.navigate("/"), Err(TreeError::Router(_))));
    }
}
