//! The frozen routing tree and request traversal.
//!
//! Lookup at each segment tries, in order, and stops at the first hit:
//!
//! 1. exact literal for the request method
//! 2. exact literal for `ANY`
//! 3. regex child for the request method, then for `ANY`
//! 4. wildcard child for the request method, then for `ANY`
//!
//! Each node passed contributes its middleware to the chain. The node the
//! path ends on contributes its endpoint handlers for the request method,
//! or failing that its `ANY` handlers; if it has neither, or some segment
//! found no child at all, a 404 handler closes the chain instead.

use std::collections::HashMap;

use tracing::trace;

use crate::context::Context;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::segment::{self, Segment};
use crate::status::Status;

/// One immutable node. Shared read-only by every request.
pub(crate) struct Node {
    pub(crate) segment: Segment,
    pub(crate) middleware: Vec<BoxedHandler>,
    pub(crate) endpoint: HashMap<Method, Vec<BoxedHandler>>,
    pub(crate) exact: HashMap<String, HashMap<Method, Node>>,
    pub(crate) regex: HashMap<Method, Node>,
    pub(crate) wildcard: HashMap<Method, Node>,
}

impl Node {
    /// Assembles `ctx`'s chain and binds its path parameters. Runs nothing.
    pub(crate) fn find(&self, ctx: &mut Context) {
        let path = ctx.path.clone();
        ctx.extend_chain(&self.middleware);

        let mut node = self;
        for value in segment::split(&path) {
            match node.child(ctx.method, value, &mut ctx.params) {
                Some(child) => {
                    ctx.extend_chain(&child.middleware);
                    node = child;
                }
                None => {
                    trace!(method = %ctx.method, %path, segment = value, "no route");
                    ctx.push_handler(not_found.into_boxed_handler());
                    return;
                }
            }
        }

        match node.endpoint.get(&ctx.method).or_else(|| node.endpoint.get(&Method::Any)) {
            Some(handlers) => ctx.extend_chain(handlers),
            None => {
                trace!(method = %ctx.method, %path, "path ends on a node without handlers");
                ctx.push_handler(not_found.into_boxed_handler());
            }
        }
    }

    fn child(
        &self,
        method: Method,
        value: &str,
        params: &mut HashMap<String, String>,
    ) -> Option<&Node> {
        if let Some(by_method) = self.exact.get(value) {
            if let Some(child) = by_method.get(&method).or_else(|| by_method.get(&Method::Any)) {
                return Some(child);
            }
        }

        for child in [self.regex.get(&method), self.regex.get(&Method::Any)].into_iter().flatten() {
            if let Segment::Regex(pattern) = &child.segment {
                if pattern.capture(value, params) {
                    return Some(child);
                }
            }
        }

        let child = self.wildcard.get(&method).or_else(|| self.wildcard.get(&Method::Any))?;
        params.insert(child.segment.pattern().to_owned(), value.to_owned());
        Some(child)
    }
}

fn not_found(ctx: &mut Context) {
    ctx.set_status(Status::NotFound);
    ctx.send("Not Found");
}
