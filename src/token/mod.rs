//! Grammar combinators and the engine that runs them
//!
//! A [`Token`] is an immutable node of a grammar. Parsing a token against
//! a [`ParseState`] either *commits*, returning a new state with the cursor
//! advanced and the graph extended, or *refuses*, returning `Ok(None)` and
//! leaving the caller's state exactly as it was. Refusal is how choices
//! and repetitions make decisions; `Err` is reserved for broken grammars
//! and broken invariants and is never swallowed by any combinator.
//!
//! # Layout
//!
//! * [`TokenKind`] enumerates the combinators. Composite kinds run inside
//!   a branch of the graph, opened and closed in one place ([`within_branch`]);
//!   each kind contributes only its step function, found in [`field`],
//!   [`composite`], [`repeat`], [`filter`] and [`relocate`].
//! * [`env`] holds the [`Environment`] threaded through a parse: the
//!   current name scope, the active encoding, callbacks and the table of
//!   named definitions used by token references.
//!
//! # Identity
//!
//! Tokens compare by identity. Two separately constructed tokens with the
//! same parameters are distinct definitions, which is what lets the graph
//! tell repeated anonymous fields apart.

pub mod composite;
pub mod env;
pub mod field;
pub mod filter;
pub mod relocate;
pub mod repeat;

use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

use tracing::{event, Level};

use crate::encoding::Encoding;
use crate::error::ArgumentError;
use crate::expression::{Expression, ValueExpression};
use crate::graph::ParseState;
use crate::parse::error::ParseResult;

pub use env::{CallbackFn, Callbacks, Environment};

/// The combinators a [`Token`] can be.
#[derive(Clone)]
pub enum TokenKind {
    /// Fixed-size field: reads `size` bytes as one value.
    Def {
        size: ValueExpression,
        predicate: Option<Expression>,
    },
    /// All tokens, in order.
    Seq(Vec<Token>),
    /// The first token that commits.
    Cho(Vec<Token>),
    /// `body` as many times as it commits, checking `condition` (if any)
    /// before every iteration.
    Rep {
        body: Token,
        condition: Option<Expression>,
    },
    /// `body` exactly `count` times.
    RepN { body: Token, count: ValueExpression },
    /// Records a counter `i` for `i` in `1..=max` and parses `body` after
    /// it, keeping the first counter `body` commits for.
    Range { body: Token, max: ValueExpression },
    /// Grows a value from `initial` by `step` bytes until `terminator`
    /// commits right after it, or `max` is exceeded.
    Until {
        initial: ValueExpression,
        step: ValueExpression,
        max: Option<ValueExpression>,
        terminator: Token,
    },
    /// `body`, only if `predicate` holds beforehand.
    Pre { body: Token, predicate: Expression },
    /// `body`, only if `predicate` holds afterwards.
    Post { body: Token, predicate: Expression },
    /// `body` at every offset `offsets` yields; the cursor is restored after.
    Sub { body: Token, offsets: ValueExpression },
    /// The definition named here, resolved at parse time.
    Ref(Rc<str>),
    /// `body` over the bytes of every value `data` yields.
    Tie { body: Token, data: ValueExpression },
}

impl TokenKind {
    fn label(&self) -> &'static str {
        match self {
            TokenKind::Def { .. } => "Def",
            TokenKind::Seq(_) => "Seq",
            TokenKind::Cho(_) => "Cho",
            TokenKind::Rep { condition: None, .. } => "Rep",
            TokenKind::Rep { condition: Some(_), .. } => "While",
            TokenKind::RepN { .. } => "RepN",
            TokenKind::Range { .. } => "Range",
            TokenKind::Until { .. } => "Until",
            TokenKind::Pre { .. } => "Pre",
            TokenKind::Post { .. } => "Post",
            TokenKind::Sub { .. } => "Sub",
            TokenKind::Ref(_) => "TokenRef",
            TokenKind::Tie { .. } => "Tie",
        }
    }
}

struct TokenInner {
    name: Rc<str>,
    encoding: Option<Encoding>,
    kind: TokenKind,
}

/// Shared handle on an immutable grammar node.
#[derive(Clone)]
pub struct Token(Rc<TokenInner>);

impl Token {
    /// Constructs a token, validating the arity rules of its kind.
    ///
    /// # Errors
    ///
    /// Sequences and choices need at least two tokens, and token
    /// references a non-empty name; violations are reported as
    /// [`ArgumentError`]s.
    pub fn new(name: impl Into<Rc<str>>, encoding: Option<Encoding>, kind: TokenKind) -> ParseResult<Self> {
        match &kind {
            TokenKind::Seq(tokens) | TokenKind::Cho(tokens) if tokens.len() < 2 => {
                return Err(ArgumentError::TooFewTokens {
                    kind: kind.label(),
                    found: tokens.len(),
                }
                .into())
            }
            TokenKind::Ref(target) if target.is_empty() => return Err(ArgumentError::EmptyReference.into()),
            _ => {}
        }
        Ok(Self::new_unchecked(name, encoding, kind))
    }

    /// Constructs a token whose kind is valid by construction.
    pub(crate) fn new_unchecked(name: impl Into<Rc<str>>, encoding: Option<Encoding>, kind: TokenKind) -> Self {
        Self(Rc::new(TokenInner {
            name: name.into(),
            encoding,
            kind,
        }))
    }

    /// Sequence of `first`, `second` and then `rest`.
    #[must_use]
    pub fn sequence(name: impl Into<Rc<str>>, first: Token, second: Token, rest: impl IntoIterator<Item = Token>) -> Self {
        let mut tokens = vec![first, second];
        tokens.extend(rest);
        Self::new_unchecked(name, None, TokenKind::Seq(tokens))
    }

    /// Choice between `first`, `second` and then `rest`, in that order.
    #[must_use]
    pub fn choice(name: impl Into<Rc<str>>, first: Token, second: Token, rest: impl IntoIterator<Item = Token>) -> Self {
        let mut tokens = vec![first, second];
        tokens.extend(rest);
        Self::new_unchecked(name, None, TokenKind::Cho(tokens))
    }

    /// Same token with an encoding override for itself and its children.
    ///
    /// The result is a new definition, distinct from `self`.
    #[must_use]
    pub fn with_encoding(self, encoding: Encoding) -> Self {
        let (name, kind) = match Rc::try_unwrap(self.0) {
            Ok(inner) => (inner.name, inner.kind),
            Err(shared) => (shared.name.clone(), shared.kind.clone()),
        };
        Self::new_unchecked(name, Some(encoding), kind)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[must_use]
    pub fn encoding(&self) -> Option<Encoding> {
        self.0.encoding
    }

    #[must_use]
    pub fn kind(&self) -> &TokenKind {
        &self.0.kind
    }

    /// Returns `true` if `self` and `other` are the same definition.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Token) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    /// Returns `true` for repetitions, which keep an iteration counter.
    #[must_use]
    pub fn is_iterable(&self) -> bool {
        matches!(self.kind(), TokenKind::Rep { .. } | TokenKind::RepN { .. })
    }

    /// Tokens directly contained in this one. References have none.
    #[must_use]
    pub fn children(&self) -> Vec<Token> {
        match self.kind() {
            TokenKind::Def { .. } | TokenKind::Ref(_) => Vec::new(),
            TokenKind::Seq(tokens) | TokenKind::Cho(tokens) => tokens.clone(),
            TokenKind::Rep { body, .. }
            | TokenKind::RepN { body, .. }
            | TokenKind::Range { body, .. }
            | TokenKind::Pre { body, .. }
            | TokenKind::Post { body, .. }
            | TokenKind::Sub { body, .. }
            | TokenKind::Tie { body, .. } => vec![body.clone()],
            TokenKind::Until { terminator, .. } => vec![terminator.clone()],
        }
    }

    /// Parses this token at the cursor of `state`.
    ///
    /// Returns the committed state, or `None` if the token refuses; on
    /// refusal nothing observable has changed.
    ///
    /// # Errors
    ///
    /// Propagates argument and invariant errors from any token or
    /// expression reached during the attempt.
    pub fn parse(&self, env: &Environment, state: &ParseState) -> ParseResult<Option<ParseState>> {
        let env = env.enter(self);
        event!(Level::TRACE, token = %self, scope = env.scope(), offset = state.offset(), "attempt");
        let outcome = self.parse_impl(&env, state)?;
        match &outcome {
            Some(next) => event!(Level::TRACE, token = %self, offset = next.offset(), "committed"),
            None => event!(Level::TRACE, token = %self, offset = state.offset(), "refused"),
        }
        env.handle_callbacks(self, outcome.as_ref());
        Ok(outcome)
    }

    fn parse_impl(&self, env: &Environment, state: &ParseState) -> ParseResult<Option<ParseState>> {
        match self.kind() {
            TokenKind::Def { size, predicate } => field::parse_def(self, size, predicate.as_ref(), env, state),
            TokenKind::Seq(tokens) => within_branch(self, state, |opened| composite::parse_seq(tokens, env, opened)),
            TokenKind::Cho(tokens) => within_branch(self, state, |opened| composite::parse_cho(tokens, env, opened)),
            TokenKind::Rep { body, condition } => {
                within_branch(self, state, |opened| repeat::parse_rep(body, condition.as_ref(), env, opened))
            }
            TokenKind::RepN { body, count } => repeat::parse_repn(self, body, count, env, state),
            TokenKind::Range { body, max } => repeat::parse_range(self, body, max, env, state),
            TokenKind::Until {
                initial,
                step,
                max,
                terminator,
            } => repeat::parse_until(self, initial, step, max.as_ref(), terminator, env, state),
            TokenKind::Pre { body, predicate } => filter::parse_pre(body, predicate, env, state),
            TokenKind::Post { body, predicate } => filter::parse_post(body, predicate, env, state),
            TokenKind::Sub { body, offsets } => relocate::parse_sub(self, body, offsets, env, state),
            TokenKind::Ref(target) => relocate::parse_ref(target, env, state),
            TokenKind::Tie { body, data } => relocate::parse_tie(self, body, data, env, state),
        }
    }

    /// The token this one stands for once references are followed.
    ///
    /// Returns `None` for a reference that cannot be resolved.
    #[must_use]
    pub fn canonical(&self, env: &Environment, state: &ParseState) -> Option<Token> {
        let mut current = self.clone();
        let mut seen: Vec<Token> = Vec::new();
        while let TokenKind::Ref(target) = current.kind() {
            if seen.iter().any(|t| t.ptr_eq(&current)) {
                return None;
            }
            let next = env.resolve(target, state)?;
            seen.push(current);
            current = next;
        }
        Some(current)
    }
}

/// Runs `step` inside a branch opened for `token`, committing the branch
/// if the step commits. On refusal the opened branch is simply dropped:
/// the caller still holds the state from before it was opened.
pub(crate) fn within_branch(
    token: &Token,
    state: &ParseState,
    step: impl FnOnce(&ParseState) -> ParseResult<Option<ParseState>>,
) -> ParseResult<Option<ParseState>> {
    let opened = state.open_branch(token);
    match step(&opened)? {
        Some(done) => done.close_branch(token).map(Some),
        None => Ok(None),
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Token {}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            TokenKind::Ref(target) => write!(f, "TokenRef({})", target),
            kind => write!(f, "{}({})", kind.label(), self.name()),
        }
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
