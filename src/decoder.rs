//! Streaming decoder: rebuilds a value tree from XML parse events
//!
//! The decoder is a push-driven state machine. Every open element owns one
//! [`Frame`] on a stack; a frame starts out as a scalar `Property` and is
//! reclassified to `Dictionary` the moment its first child element closes
//! under it. The transition is one-way. Within a dictionary, a second child
//! closing under an already-seen name promotes that entry to a
//! [`Value::Sequence`] — the only signal the event stream carries that an
//! element repeats.

use indexmap::IndexMap;

use crate::error::{Error, ErrorKind, Result};
use crate::event::Event;
use crate::value::{Mapping, Sequence, Value};

/// How scalar character data is treated when a frame closes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WhitespacePolicy {
    /// Trim leading/trailing whitespace from scalar text
    #[default]
    Trim,
    /// Keep raw text exactly as received
    Preserve,
}

/// How non-whitespace text under a structural frame is treated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MixedContentPolicy {
    /// Raise a malformed-input error
    #[default]
    Fail,
    /// Drop the stray text
    Ignore,
}

/// Configuration for the decoder
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pub whitespace: WhitespacePolicy,
    pub mixed_content: MixedContentPolicy,
    /// Maximum nesting depth (0 means unlimited)
    pub max_depth: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            whitespace: WhitespacePolicy::default(),
            mixed_content: MixedContentPolicy::default(),
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

impl Config {
    /// Create a new config with the given policies and the default depth limit
    pub const fn new(whitespace: WhitespacePolicy, mixed_content: MixedContentPolicy) -> Self {
        Self {
            whitespace,
            mixed_content,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Create a config with no depth limit
    pub const fn unlimited() -> Self {
        Self {
            whitespace: WhitespacePolicy::Trim,
            mixed_content: MixedContentPolicy::Fail,
            max_depth: 0,
        }
    }

    pub const DEFAULT_MAX_DEPTH: u16 = 128;
}

/// What a frame has proven itself to be so far
///
/// Reclassification replaces the whole kind value, so no text buffer or
/// child list can linger across the transition.
#[derive(Debug)]
enum FrameKind {
    /// Scalar until proven otherwise
    Property { text: String, saw_text: bool },
    /// Holds child elements; entries may independently become sequences
    Dictionary { entries: IndexMap<String, Value> },
}

/// In-progress state for one open element
#[derive(Debug)]
struct Frame {
    name: String,
    kind: FrameKind,
}

impl Frame {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FrameKind::Property {
                text: String::new(),
                saw_text: false,
            },
        }
    }

    /// Convert a closed frame into its value
    fn into_value(self, whitespace: WhitespacePolicy) -> Value {
        match self.kind {
            FrameKind::Property { text, saw_text } => {
                if !saw_text {
                    Value::Empty
                } else {
                    match whitespace {
                        WhitespacePolicy::Trim => Value::Text(text.trim().to_string()),
                        WhitespacePolicy::Preserve => Value::Text(text),
                    }
                }
            }
            FrameKind::Dictionary { entries } => Value::Mapping(Mapping::from(entries)),
        }
    }
}

/// Session state: `Failed` is terminal, `Complete` holds the finished tree
/// so `finish()` can repeat its answer without re-deriving it.
#[derive(Debug)]
enum State {
    NotStarted,
    InProgress,
    Complete(Value),
    Failed(Error),
}

/// Event-driven XML decoder
///
/// One instance serves one parse session. After a successful [`finish`] the
/// decoder is consumed; call [`reset`] to reuse it for a fresh document.
///
/// [`finish`]: Decoder::finish
/// [`reset`]: Decoder::reset
#[derive(Debug)]
pub struct Decoder {
    config: Config,
    stack: Vec<Frame>,
    /// Root value parked between the root's end-element and `finish()`
    root: Option<Value>,
    state: State,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Create a decoder with default configuration
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a decoder with custom configuration
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            stack: Vec::new(),
            root: None,
            state: State::NotStarted,
        }
    }

    /// Feed an opening tag
    ///
    /// Attributes are accepted to match the event source interface but are
    /// not folded into the result tree.
    pub fn start_element(
        &mut self,
        name: &str,
        _attributes: &IndexMap<String, String>,
    ) -> Result<()> {
        self.check_active()?;
        if self.stack.is_empty() && self.root.is_some() {
            return Err(self.fail(ErrorKind::EventAfterFinish));
        }

        let max = self.config.max_depth;
        if max > 0 && self.stack.len() >= usize::from(max) {
            return Err(self.fail(ErrorKind::MaxDepthExceeded { max }));
        }

        if matches!(self.state, State::NotStarted) {
            self.state = State::InProgress;
        }
        self.stack.push(Frame::new(name));
        Ok(())
    }

    /// Feed character data
    ///
    /// Whitespace-only text is always safe: it never reclassifies a frame
    /// and is dropped outside scalar context. Non-whitespace text under a
    /// dictionary frame is mixed content and follows the configured policy.
    pub fn characters(&mut self, text: &str) -> Result<()> {
        self.check_active()?;

        let Some(frame) = self.stack.last_mut() else {
            if text.trim().is_empty() {
                return Ok(());
            }
            let kind = if self.root.is_some() {
                ErrorKind::EventAfterFinish
            } else {
                ErrorKind::EventBeforeStart
            };
            return Err(self.fail(kind));
        };

        match &mut frame.kind {
            FrameKind::Property { text: buf, saw_text } => {
                buf.push_str(text);
                *saw_text = true;
            }
            FrameKind::Dictionary { .. } => {
                if !text.trim().is_empty()
                    && self.config.mixed_content == MixedContentPolicy::Fail
                {
                    let element = frame.name.clone();
                    return Err(self.fail(ErrorKind::MixedContent { element }));
                }
            }
        }
        Ok(())
    }

    /// Feed a closing tag
    ///
    /// Pops the top frame, converts it to a value, and merges the value into
    /// the parent frame. Closing the root frame parks the result for
    /// [`finish`](Decoder::finish).
    pub fn end_element(&mut self, name: &str) -> Result<()> {
        self.check_active()?;

        match self.stack.last() {
            None => {
                let kind = if self.root.is_some() {
                    ErrorKind::EventAfterFinish
                } else {
                    ErrorKind::EventBeforeStart
                };
                return Err(self.fail(kind));
            }
            Some(frame) if frame.name != name => {
                let expected = frame.name.clone();
                return Err(self.fail(ErrorKind::UnbalancedTags {
                    expected,
                    found: format!("</{name}>"),
                }));
            }
            Some(_) => {}
        }

        // Checked non-empty above
        let Some(frame) = self.stack.pop() else {
            return Err(self.fail(ErrorKind::EventBeforeStart));
        };
        let value = frame.into_value(self.config.whitespace);

        // A parent still buffering non-whitespace text is mixed content
        let mixed_violation = match self.stack.last() {
            Some(Frame {
                name: parent_name,
                kind: FrameKind::Property { text, saw_text },
            }) if *saw_text
                && !text.trim().is_empty()
                && self.config.mixed_content == MixedContentPolicy::Fail =>
            {
                Some(parent_name.clone())
            }
            _ => None,
        };
        if let Some(element) = mixed_violation {
            return Err(self.fail(ErrorKind::MixedContent { element }));
        }

        let Some(parent) = self.stack.last_mut() else {
            self.root = Some(value);
            return Ok(());
        };

        // First child: the parent stops being a scalar for good
        if matches!(parent.kind, FrameKind::Property { .. }) {
            parent.kind = FrameKind::Dictionary {
                entries: IndexMap::new(),
            };
        }

        if let FrameKind::Dictionary { entries } = &mut parent.kind {
            match entries.get_mut(name) {
                Some(Value::Sequence(seq)) => seq.push(value),
                Some(existing) => {
                    // Second occurrence of the name: promote the entry
                    let prior = std::mem::take(existing);
                    *existing = Value::Sequence(Sequence::from(vec![prior, value]));
                }
                None => {
                    entries.insert(name.to_string(), value);
                }
            }
        }
        Ok(())
    }

    /// Complete the session and hand over the result tree
    ///
    /// The root element's own tag name is discarded; for a document with
    /// children the result is always a [`Value::Mapping`] of the root's
    /// content. Idempotent after success: repeat calls return the same tree.
    pub fn finish(&mut self) -> Result<Value> {
        match &self.state {
            State::Failed(err) => return Err(err.clone()),
            State::Complete(value) => return Ok(value.clone()),
            State::NotStarted => {
                return Err(self.fail(ErrorKind::EmptyDocument));
            }
            State::InProgress => {}
        }

        if let Some(frame) = self.stack.last() {
            let expected = frame.name.clone();
            return Err(self.fail(ErrorKind::UnbalancedTags {
                expected,
                found: "end of document".to_string(),
            }));
        }

        match self.root.take() {
            Some(value) => {
                self.state = State::Complete(value.clone());
                Ok(value)
            }
            None => Err(self.fail(ErrorKind::EmptyDocument)),
        }
    }

    /// Dispatch one event to the matching push method
    pub fn push_event(&mut self, event: &Event) -> Result<()> {
        match event {
            Event::StartElement { name, attributes } => self.start_element(name, attributes),
            Event::Characters(text) => self.characters(text),
            Event::EndElement(name) => self.end_element(name),
        }
    }

    /// Decode a complete event sequence and finish
    pub fn decode<'a, I>(&mut self, events: I) -> Result<Value>
    where
        I: IntoIterator<Item = &'a Event>,
    {
        for event in events {
            self.push_event(event)?;
        }
        self.finish()
    }

    /// Clear all session state so the decoder can parse a fresh document
    pub fn reset(&mut self) {
        self.stack.clear();
        self.root = None;
        self.state = State::NotStarted;
    }

    /// Reject events in terminal states; failures are sticky
    fn check_active(&mut self) -> Result<()> {
        match &self.state {
            State::Failed(err) => Err(err.clone()),
            State::Complete(_) => Err(Error::unpositioned(ErrorKind::EventAfterFinish)),
            State::NotStarted | State::InProgress => Ok(()),
        }
    }

    /// Record the first failure and reject everything after it
    fn fail(&mut self, kind: ErrorKind) -> Error {
        let err = Error::unpositioned(kind);
        if !matches!(self.state, State::Failed(_)) {
            self.state = State::Failed(err.clone());
        }
        err
    }
}
