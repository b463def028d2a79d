//! Report fragment model
//!
//! A [`ReportFragment`] is the immutable record of one performed step. Once a
//! fragment leaves the recorder it is never edited again.

use chrono::{DateTime, Utc};
use screenplay_format::Value;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique fragment identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FragmentId(pub Ulid);

impl FragmentId {
    /// Generate new fragment ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for FragmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FragmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Report vocabulary of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Preconditions ("was able to")
    Setup,

    /// Actions ("attempts to")
    Action,

    /// Queries ("asks for")
    Question,

    /// Expectations ("should")
    Assertion,
}

impl StepKind {
    /// Phrase used when narrating this kind of step
    #[must_use]
    pub fn phrase(&self) -> &'static str {
        match self {
            Self::Setup => "was able to",
            Self::Action => "attempts to",
            Self::Question => "asks for",
            Self::Assertion => "should",
        }
    }
}

/// How a step ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Completed without error
    Passed,

    /// Completed with an error
    Failed {
        /// Error description
        reason: String,
    },

    /// Interrupted before completion
    Canceled,
}

impl Outcome {
    /// Create failed outcome
    #[inline]
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Whether the step ran to completion
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !matches!(self, Self::Canceled)
    }

    /// Whether the step passed
    #[inline]
    #[must_use]
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Narration template plus its ordered arguments
///
/// Templates reference the actor as `{actor}` and arguments by position as
/// `{0}`, `{1}`, ... Literal braces are written `{{` and `}}`.
#[derive(Debug, Clone)]
pub struct Narration {
    template: String,
    arguments: Vec<Value>,
}

impl Narration {
    /// Create narration without arguments
    #[inline]
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            arguments: Vec::new(),
        }
    }

    /// Append an argument
    #[inline]
    #[must_use]
    pub fn with(mut self, argument: impl Into<Value>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    /// Narration used when a performable supplies none
    ///
    /// Produces `"{actor} <verb> <name>."`.
    #[must_use]
    pub fn fallback(verb: &str, performable: &str) -> Self {
        let escaped = performable.replace('{', "{{").replace('}', "}}");
        Self::new(format!("{{actor}} {verb} {escaped}."))
    }

    /// Template text
    #[inline]
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Ordered arguments
    #[inline]
    #[must_use]
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }
}

/// Immutable record of one performed step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFragment {
    id: FragmentId,
    actor: String,
    kind: StepKind,
    template: String,
    arguments: Vec<String>,
    text: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    outcome: Outcome,
    children: Vec<ReportFragment>,
}

impl ReportFragment {
    /// Fragment ID
    #[inline]
    #[must_use]
    pub fn id(&self) -> FragmentId {
        self.id
    }

    /// Name of the actor who performed the step
    #[inline]
    #[must_use]
    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Step vocabulary
    #[inline]
    #[must_use]
    pub fn kind(&self) -> StepKind {
        self.kind
    }

    /// Narration template
    #[inline]
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Formatted arguments, in template order
    #[inline]
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Rendered narration
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Start timestamp
    #[inline]
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Finish timestamp
    #[inline]
    #[must_use]
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// Outcome
    #[inline]
    #[must_use]
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Fragments of steps performed inside this one, in invocation order
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[ReportFragment] {
        &self.children
    }

    /// Depth of the fragment tree rooted here (a leaf has depth 1)
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Self::depth).max().unwrap_or(0)
    }

    /// Pre-order walk over this fragment and all descendants
    #[must_use]
    pub fn walk(&self) -> Vec<&ReportFragment> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}

/// Frame under construction; becomes a [`ReportFragment`] when closed
#[derive(Debug)]
pub(crate) struct OpenFrame {
    pub(crate) id: FragmentId,
    pub(crate) parent: Option<FragmentId>,
    pub(crate) seq: u64,
    actor: String,
    kind: StepKind,
    template: String,
    arguments: Vec<String>,
    text: String,
    started_at: DateTime<Utc>,
    children: Vec<(u64, ReportFragment)>,
}

impl OpenFrame {
    pub(crate) fn new(
        actor: String,
        kind: StepKind,
        template: String,
        arguments: Vec<String>,
        text: String,
    ) -> Self {
        Self {
            id: FragmentId::new(),
            parent: None,
            seq: 0,
            actor,
            kind,
            template,
            arguments,
            text,
            started_at: Utc::now(),
            children: Vec::new(),
        }
    }

    /// Attach a finished child, keeping children in the order they opened
    pub(crate) fn attach(&mut self, seq: u64, fragment: ReportFragment) {
        let at = self.children.partition_point(|(s, _)| *s < seq);
        self.children.insert(at, (seq, fragment));
    }

    pub(crate) fn finish(self, outcome: Outcome) -> ReportFragment {
        ReportFragment {
            id: self.id,
            actor: self.actor,
            kind: self.kind,
            template: self.template,
            arguments: self.arguments,
            text: self.text,
            started_at: self.started_at,
            finished_at: Utc::now(),
            outcome,
            children: self.children.into_iter().map(|(_, child)| child).collect(),
        }
    }
}
