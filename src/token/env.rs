//! Context threaded through a parse

use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use tracing::{event, Level};

use super::Token;
use crate::encoding::Encoding;
use crate::graph::ParseState;

/// Observer invoked after every attempt of a token, with the committed
/// state or `None` on refusal.
pub type CallbackFn = Rc<dyn Fn(&Token, Option<&ParseState>, &Encoding)>;

/// Observers notified as tokens are attempted.
///
/// Callbacks only observe; they cannot alter the outcome of a parse.
#[derive(Clone, Default)]
pub struct Callbacks {
    generic: Option<CallbackFn>,
    per_token: Vec<(Token, CallbackFn)>,
}

impl Callbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifies `callback` after every token attempt.
    #[must_use]
    pub fn on_every(self, callback: impl Fn(&Token, Option<&ParseState>, &Encoding) + 'static) -> Self {
        Self {
            generic: Some(Rc::new(callback)),
            ..self
        }
    }

    /// Notifies `callback` after every attempt of `token` only.
    #[must_use]
    pub fn on_token(
        mut self,
        token: &Token,
        callback: impl Fn(&Token, Option<&ParseState>, &Encoding) + 'static,
    ) -> Self {
        self.per_token.push((token.clone(), Rc::new(callback)));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generic.is_none() && self.per_token.is_empty()
    }

    fn notify(&self, token: &Token, outcome: Option<&ParseState>, encoding: &Encoding) {
        if let Some(callback) = &self.generic {
            callback(token, outcome, encoding);
        }
        self.per_token
            .iter()
            .filter(|(target, _)| target.ptr_eq(token))
            .for_each(|(_, callback)| callback(token, outcome, encoding));
    }
}

impl Debug for Callbacks {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("generic", &self.generic.is_some())
            .field("per_token", &self.per_token.len())
            .finish()
    }
}

struct Shared {
    callbacks: Callbacks,
    registry: HashMap<Rc<str>, Token>,
}

/// Scope, encoding, callbacks and named definitions of a parse.
///
/// Cloning is cheap: everything but the scope and encoding is shared.
#[derive(Clone)]
pub struct Environment {
    scope: Rc<str>,
    encoding: Encoding,
    shared: Rc<Shared>,
}

impl Environment {
    /// Root environment with the given default encoding.
    ///
    /// Named tokens reachable from `roots` (without following references)
    /// become resolvable by name; when two share a name the first one
    /// found wins.
    #[must_use]
    pub fn new<'a>(encoding: Encoding, callbacks: Callbacks, roots: impl IntoIterator<Item = &'a Token>) -> Self {
        Self {
            scope: Rc::from(""),
            encoding,
            shared: Rc::new(Shared {
                callbacks,
                registry: build_registry(roots),
            }),
        }
    }

    /// Dotted path of the enclosing named tokens.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Environment for the body of `token`: its name appended to the scope
    /// and its encoding override, if any, in effect.
    pub(crate) fn enter(&self, token: &Token) -> Self {
        let scope = match (self.scope.is_empty(), token.name().is_empty()) {
            (_, true) => self.scope.clone(),
            (true, false) => Rc::from(token.name()),
            (false, false) => Rc::from(format!("{}.{}", self.scope, token.name())),
        };
        Self {
            scope,
            encoding: token.encoding().unwrap_or(self.encoding),
            shared: self.shared.clone(),
        }
    }

    /// Token for `name`: the innermost open branch defined by a token of
    /// that name, else the named definition collected at the start.
    #[must_use]
    pub fn resolve(&self, name: &str, state: &ParseState) -> Option<Token> {
        state
            .graph()
            .lookup_definition(name)
            .or_else(|| self.shared.registry.get(name).cloned())
    }

    pub(crate) fn handle_callbacks(&self, token: &Token, outcome: Option<&ParseState>) {
        self.shared.callbacks.notify(token, outcome, &self.encoding);
    }
}

impl Debug for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("scope", &self.scope)
            .field("encoding", &self.encoding)
            .field("callbacks", &self.shared.callbacks)
            .field("definitions", &self.shared.registry.len())
            .finish()
    }
}

fn build_registry<'a>(roots: impl IntoIterator<Item = &'a Token>) -> HashMap<Rc<str>, Token> {
    let mut registry: HashMap<Rc<str>, Token> = HashMap::new();
    let mut visited: HashSet<usize> = HashSet::new();
    let mut pending: Vec<Token> = roots.into_iter().cloned().collect();
    pending.reverse();
    while let Some(token) = pending.pop() {
        if !visited.insert(token.addr()) {
            continue;
        }
        if !token.name().is_empty() && !matches!(token.kind(), super::TokenKind::Ref(_)) {
            if let Some(existing) = registry.get(token.name()) {
                if !existing.ptr_eq(&token) {
                    event!(Level::DEBUG, name = token.name(), "duplicate definition name, keeping first");
                }
            } else {
                registry.insert(Rc::from(token.name()), token.clone());
            }
        }
        let mut children = token.children();
        children.reverse();
        pending.extend(children);
    }
    registry
}
