use crate::{AttemptError, EchoReply, Outcome, Unreachable};

/// Receives the outcome of every attempt of a run, synchronously and in order.
///
/// Each handler defaults to a no-op, so implementors only override what they care about.
/// Exactly one of `on_reply`, `on_unreachable` and `on_error` is called per attempt, through
/// [`OutcomeSink::on_outcome`].
pub trait OutcomeSink {
    fn on_reply(&mut self, reply: EchoReply) {
        let _ = reply;
    }

    fn on_unreachable(&mut self, unreachable: Unreachable) {
        let _ = unreachable;
    }

    fn on_error(&mut self, error: AttemptError) {
        let _ = error;
    }

    fn on_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Reply(reply) => self.on_reply(reply),
            Outcome::Unreachable(unreachable) => self.on_unreachable(unreachable),
            Outcome::TransportError(error) => self.on_error(error),
        }
    }
}

/// Collects outcomes in attempt order.
impl OutcomeSink for Vec<Outcome> {
    fn on_outcome(&mut self, outcome: Outcome) {
        self.push(outcome);
    }
}

type Handler<'a, T> = Option<Box<dyn FnMut(T) + 'a>>;

/// Closure based [`OutcomeSink`]; unset handlers ignore their outcome.
#[derive(Default)]
pub struct Handlers<'a> {
    reply: Handler<'a, EchoReply>,
    unreachable: Handler<'a, Unreachable>,
    error: Handler<'a, AttemptError>,
}

impl<'a> Handlers<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn reply(mut self, handler: impl FnMut(EchoReply) + 'a) -> Self {
        self.reply = Some(Box::new(handler));
        self
    }

    #[must_use]
    pub fn unreachable(mut self, handler: impl FnMut(Unreachable) + 'a) -> Self {
        self.unreachable = Some(Box::new(handler));
        self
    }

    #[must_use]
    pub fn error(mut self, handler: impl FnMut(AttemptError) + 'a) -> Self {
        self.error = Some(Box::new(handler));
        self
    }
}

impl OutcomeSink for Handlers<'_> {
    fn on_reply(&mut self, reply: EchoReply) {
        if let Some(handler) = self.reply.as_mut() {
            handler(reply);
        }
    }

    fn on_unreachable(&mut self, unreachable: Unreachable) {
        if let Some(handler) = self.unreachable.as_mut() {
            handler(unreachable);
        }
    }

    fn on_error(&mut self, error: AttemptError) {
        if let Some(handler) = self.error.as_mut() {
            handler(error);
        }
    }
}
