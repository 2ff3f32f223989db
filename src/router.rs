//! Routing tree construction.
//!
//! A [`Router`] is a handle to one node of the tree. Registration walks
//! downward from that node, one child per path segment, and hands back a
//! handle to the last node it reached, so groups are just handles to deeper
//! nodes:
//!
//! ```rust
//! use ruta::{Context, Router, handlers};
//!
//! # fn main() -> Result<(), ruta::Error> {
//! let api = Router::new("/api");
//! let customers = api.group("/customer", handlers![])?;
//! customers.get("", |ctx: &mut Context| ctx.send("all customers"))?;
//! customers.get("/:id", |ctx: &mut Context| {
//!     let reply = format!("customer {}", ctx.param("id").unwrap_or_default());
//!     ctx.send(reply);
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! Handles are cheap to clone and share the node they point at, so
//! middleware added through one handle is seen through every other. The tree
//! is single-threaded while it is being built; [`Application::build`]
//! freezes it into an immutable tree for serving.
//!
//! [`Application::build`]: crate::Application::build

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::segment::{self, Segment};
use crate::tree::Node;

pub(crate) struct Draft {
    method: Method,
    segment: Segment,
    middleware: Vec<BoxedHandler>,
    endpoint: HashMap<Method, Vec<BoxedHandler>>,
    exact: HashMap<String, HashMap<Method, Router>>,
    regex: HashMap<Method, Router>,
    wildcard: HashMap<Method, Router>,
}

/// A handle to one node of the routing tree under construction.
#[derive(Clone)]
pub struct Router {
    node: Rc<RefCell<Draft>>,
}

impl Router {
    /// A detached router for the literal prefix `path`, to be mounted with
    /// [`hook`](Self::hook). A multi-segment prefix such as `/api/v1` is
    /// mounted as a chain of literal nodes.
    pub fn new(path: &str) -> Self {
        let prefix = path.strip_prefix('/').unwrap_or(path);
        Self::node(Method::Any, Segment::Exact(prefix.to_owned()))
    }

    fn node(method: Method, segment: Segment) -> Self {
        Self {
            node: Rc::new(RefCell::new(Draft {
                method,
                segment,
                middleware: Vec::new(),
                endpoint: HashMap::new(),
                exact: HashMap::new(),
                regex: HashMap::new(),
                wildcard: HashMap::new(),
            })),
        }
    }

    /// Registers `handlers` for `method` at `path` below this node and
    /// returns the node the path ends on.
    ///
    /// The handlers run in order, but only for requests whose path ends on
    /// that node; earlier ones act as route-level middleware by calling
    /// [`Context::next`](crate::Context::next).
    ///
    /// An empty `path` (or `/`) walks no segments, so the handlers land on
    /// this node itself under `method`. That is how a group answers for its
    /// own prefix.
    ///
    /// A `#` segment that does not compile fails the whole registration with
    /// [`Error::InvalidPattern`] and leaves the tree untouched.
    pub fn add(
        &self,
        method: Method,
        path: &str,
        handlers: impl IntoIterator<Item = BoxedHandler>,
    ) -> Result<Router, Error> {
        let segments = segment::split(path)
            .map(|raw| {
                Segment::parse(raw).map_err(|source| Error::InvalidPattern {
                    path: path.to_owned(),
                    pattern: raw.trim_start_matches('#').to_owned(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut node = self.clone();
        for segment in segments {
            node = node.child(method, segment);
        }
        let handlers: Vec<BoxedHandler> = handlers.into_iter().collect();
        if !handlers.is_empty() {
            node.node.borrow_mut().endpoint.entry(method).or_default().extend(handlers);
        }
        debug!(%method, path, "route registered");
        Ok(node)
    }

    /// Returns the child for `segment` under `method`, creating it if needed.
    ///
    /// An existing child with the same key is reused. A regex or wildcard
    /// child with a different pattern replaces the earlier one.
    fn child(&self, method: Method, segment: Segment) -> Router {
        let mut draft = self.node.borrow_mut();
        let slot = match &segment {
            Segment::Exact(literal) => draft.exact.entry(literal.clone()).or_default(),
            Segment::Regex(_) => &mut draft.regex,
            Segment::Wildcard(_) => &mut draft.wildcard,
        };
        if let Some(existing) = slot.get(&method) {
            // Literal slots are keyed by their text, and after a self-mount
            // the slot may hold this very node, which is already borrowed.
            if matches!(segment, Segment::Exact(_)) {
                return existing.clone();
            }
            let current = existing.node.borrow().segment.pattern().to_owned();
            if current == segment.pattern() {
                return existing.clone();
            }
            warn!(
                %method,
                replaced = %current,
                by = %segment.pattern(),
                "only one regex and one wildcard child per method; replacing"
            );
        }
        let child = Router::node(method, segment);
        slot.insert(method, child.clone());
        child
    }

    pub fn get(&self, path: &str, handler: impl Handler) -> Result<Router, Error> {
        self.get_with(path, [handler.into_boxed_handler()])
    }

    pub fn post(&self, path: &str, handler: impl Handler) -> Result<Router, Error> {
        self.post_with(path, [handler.into_boxed_handler()])
    }

    pub fn put(&self, path: &str, handler: impl Handler) -> Result<Router, Error> {
        self.put_with(path, [handler.into_boxed_handler()])
    }

    pub fn patch(&self, path: &str, handler: impl Handler) -> Result<Router, Error> {
        self.patch_with(path, [handler.into_boxed_handler()])
    }

    pub fn delete(&self, path: &str, handler: impl Handler) -> Result<Router, Error> {
        self.delete_with(path, [handler.into_boxed_handler()])
    }

    /// [`get`](Self::get) with a whole handler chain, usually built with
    /// [`handlers!`](crate::handlers).
    ///
    /// ```rust
    /// use ruta::{Context, Router, handlers};
    ///
    /// fn authorise(ctx: &mut Context) {
    ///     if ctx.header("authorization").is_some() {
    ///         ctx.next();
    ///     } else {
    ///         ctx.set_status(401u16);
    ///         ctx.send("unauthorised");
    ///     }
    /// }
    ///
    /// # fn main() -> Result<(), ruta::Error> {
    /// let api = Router::new("/api");
    /// api.get_with("/me", handlers![authorise, |ctx: &mut Context| ctx.send("me")])?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_with(
        &self,
        path: &str,
        handlers: impl IntoIterator<Item = BoxedHandler>,
    ) -> Result<Router, Error> {
        self.add(Method::Get, path, handlers)
    }

    pub fn post_with(
        &self,
        path: &str,
        handlers: impl IntoIterator<Item = BoxedHandler>,
    ) -> Result<Router, Error> {
        self.add(Method::Post, path, handlers)
    }

    pub fn put_with(
        &self,
        path: &str,
        handlers: impl IntoIterator<Item = BoxedHandler>,
    ) -> Result<Router, Error> {
        self.add(Method::Put, path, handlers)
    }

    pub fn patch_with(
        &self,
        path: &str,
        handlers: impl IntoIterator<Item = BoxedHandler>,
    ) -> Result<Router, Error> {
        self.add(Method::Patch, path, handlers)
    }

    pub fn delete_with(
        &self,
        path: &str,
        handlers: impl IntoIterator<Item = BoxedHandler>,
    ) -> Result<Router, Error> {
        self.add(Method::Delete, path, handlers)
    }

    /// Registers `path` for every method and returns its node, so routes and
    /// middleware can be attached beneath it.
    ///
    /// `handlers` become middleware of that node, ahead of anything added
    /// later with [`wrap`](Self::wrap). Pass `handlers![]` for none.
    pub fn group(
        &self,
        path: &str,
        handlers: impl IntoIterator<Item = BoxedHandler>,
    ) -> Result<Router, Error> {
        let node = self.add(Method::Any, path, Vec::new())?;
        node.node.borrow_mut().middleware.extend(handlers);
        Ok(node)
    }

    /// Appends middleware to this node. It runs for every request whose
    /// traversal passes through here, ahead of anything deeper in the tree.
    pub fn wrap(&self, handler: impl Handler) -> &Self {
        self.node.borrow_mut().middleware.push(handler.into_boxed_handler());
        self
    }

    /// Mounts independently built routers below this node, each under its
    /// own prefix and method. A later mount with the same prefix replaces
    /// the earlier one.
    pub fn hook(&self, routers: &[&Router]) -> &Self {
        for router in routers {
            let (method, prefix) = {
                let draft = router.node.borrow();
                (draft.method, draft.segment.pattern().to_owned())
            };
            let mut parts: Vec<&str> = prefix.split('/').collect();
            let last = parts.pop().unwrap_or_default();
            let mut parent = self.clone();
            for part in parts {
                parent = parent.child(method, Segment::Exact(part.to_owned()));
            }
            parent.node.borrow_mut().exact
                .entry(last.to_owned())
                .or_default()
                .insert(method, (*router).clone());
            debug!(%method, %prefix, "router mounted");
        }
        self
    }

    /// Freezes this node and everything below it.
    ///
    /// `ancestors` holds the nodes on the path from the root, so a router
    /// hooked into itself is reported rather than followed forever.
    pub(crate) fn freeze(&self, ancestors: &mut Vec<*const RefCell<Draft>>) -> Result<Node, Error> {
        let ptr = Rc::as_ptr(&self.node);
        let draft = self.node.borrow();
        if ancestors.contains(&ptr) {
            return Err(Error::CyclicMount(draft.segment.pattern().to_owned()));
        }
        ancestors.push(ptr);

        let mut exact = HashMap::with_capacity(draft.exact.len());
        for (literal, by_method) in &draft.exact {
            let mut frozen = HashMap::with_capacity(by_method.len());
            for (method, child) in by_method {
                frozen.insert(*method, child.freeze(ancestors)?);
            }
            exact.insert(literal.clone(), frozen);
        }
        let regex = freeze_all(&draft.regex, ancestors)?;
        let wildcard = freeze_all(&draft.wildcard, ancestors)?;

        ancestors.pop();
        Ok(Node {
            segment: draft.segment.clone(),
            middleware: draft.middleware.clone(),
            endpoint: draft.endpoint.clone(),
            exact,
            regex,
            wildcard,
        })
    }
}

fn freeze_all(
    children: &HashMap<Method, Router>,
    ancestors: &mut Vec<*const RefCell<Draft>>,
) -> Result<HashMap<Method, Node>, Error> {
    children.iter()
        .map(|(method, child)| Ok((*method, child.freeze(ancestors)?)))
        .collect()
}
