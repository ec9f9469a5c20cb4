//! Signals passed from the before-action hook back to the request pipeline.

use crate::error::LoadError;

/// A response an error hook can attach to a halt: a rendered page or a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub location: Option<String>,
    pub body: String,
}

impl Response {
    pub fn html(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            location: None,
            body: body.into(),
        }
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        Self {
            status: 302,
            location: Some(location.into()),
            body: String::new(),
        }
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

/// Why an action was not run, and what to answer with.
#[derive(Debug, Clone, PartialEq)]
pub struct Halt {
    pub error: LoadError,
    pub response: Option<Response>,
}

impl Halt {
    pub fn new(error: LoadError) -> Self {
        Self {
            error,
            response: None,
        }
    }

    pub fn with_response(mut self, response: Response) -> Self {
        self.response = Some(response);
        self
    }

    /// The attached response's status, or the error's conventional status.
    pub fn status(&self) -> u16 {
        self.response
            .as_ref()
            .map_or_else(|| self.error.status(), |r| r.status)
    }
}

/// Result of the before-action hook.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Continue,
    Halt(Halt),
}

impl Flow {
    pub fn halt(error: LoadError) -> Self {
        Self::Halt(Halt::new(error))
    }

    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }
}

/// Result of running an action through the model-loading pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome<R> {
    Ran(R),
    Halted(Halt),
}

impl<R> ActionOutcome<R> {
    pub fn ran(self) -> Option<R> {
        match self {
            Self::Ran(value) => Some(value),
            Self::Halted(_) => None,
        }
    }

    pub fn halted(&self) -> Option<&Halt> {
        match self {
            Self::Ran(_) => None,
            Self::Halted(halt) => Some(halt),
        }
    }
}
