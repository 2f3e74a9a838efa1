//! The closed table of protected events and their provider descriptors.

use std::fmt;
use std::str::FromStr;

use crate::error::{ProtectionError, ProtectionResult};

/// A user action the risk provider knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    LoginAttempted,
    LoginSucceeded,
    LoginFailed,
    RegistrationAttempted,
    RegistrationSucceeded,
    RegistrationFailed,
    ContentCreated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    Login,
    Registration,
    Custom,
}

impl EventCategory {
    /// Provider wire literal (`$login`, ...).
    pub fn as_wire(&self) -> &'static str {
        match self {
            EventCategory::Login => "$login",
            EventCategory::Registration => "$registration",
            EventCategory::Custom => "$custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventStage {
    Attempted,
    Succeeded,
    Failed,
}

impl EventStage {
    pub fn as_wire(&self) -> &'static str {
        match self {
            EventStage::Attempted => "$attempted",
            EventStage::Succeeded => "$succeeded",
            EventStage::Failed => "$failed",
        }
    }
}

/// The (category, stage, label) triple an event maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDescriptor {
    pub category: EventCategory,
    pub stage: Option<EventStage>,
    pub label: Option<&'static str>,
}

impl Event {
    pub const ALL: [Event; 7] = [
        Event::LoginAttempted,
        Event::LoginSucceeded,
        Event::LoginFailed,
        Event::RegistrationAttempted,
        Event::RegistrationSucceeded,
        Event::RegistrationFailed,
        Event::ContentCreated,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Event::LoginAttempted => "login.attempted",
            Event::LoginSucceeded => "login.succeeded",
            Event::LoginFailed => "login.failed",
            Event::RegistrationAttempted => "registration.attempted",
            Event::RegistrationSucceeded => "registration.succeeded",
            Event::RegistrationFailed => "registration.failed",
            Event::ContentCreated => "content.created",
        }
    }

    pub fn descriptor(&self) -> EventDescriptor {
        use EventCategory::*;
        use EventStage::*;

        let (category, stage, label) = match self {
            Event::LoginAttempted => (Login, Some(Attempted), None),
            Event::LoginSucceeded => (Login, Some(Succeeded), None),
            Event::LoginFailed => (Login, Some(Failed), None),
            Event::RegistrationAttempted => (Registration, Some(Attempted), None),
            Event::RegistrationSucceeded => (Registration, Some(Succeeded), None),
            Event::RegistrationFailed => (Registration, Some(Failed), None),
            Event::ContentCreated => (Custom, None, Some("Created a post")),
        };
        EventDescriptor {
            category,
            stage,
            label,
        }
    }

    /// Look up an event by its dotted name. Unknown names are a programming
    /// error and fail before anything touches the network.
    pub fn parse(name: &str) -> ProtectionResult<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|event| event.name() == name)
            .ok_or_else(|| ProtectionError::UnknownEvent(name.to_string()))
    }

    /// The sibling event in the same category at `stage`, if the table has one.
    pub fn at_stage(&self, stage: EventStage) -> Option<Event> {
        let category = self.descriptor().category;
        Self::ALL.iter().copied().find(|event| {
            let descriptor = event.descriptor();
            descriptor.category == category && descriptor.stage == Some(stage)
        })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Event {
    type Err = ProtectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Event::parse(s)
    }
}
