use chrono::{DateTime, SecondsFormat, Utc};

/// The acting identity for a protected action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Set only once the account is activated.
    pub registered_at: Option<DateTime<Utc>>,
}

impl Actor {
    pub fn new(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
            registered_at: None,
        }
    }

    pub fn activated_at(mut self, at: DateTime<Utc>) -> Self {
        self.registered_at = Some(at);
        self
    }

    pub fn is_activated(&self) -> bool {
        self.registered_at.is_some()
    }

    /// Registration timestamp in the provider's ISO-8601 form.
    pub fn registered_at_iso8601(&self) -> Option<String> {
        self.registered_at
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

/// Who a feedback notification is about. Attempts often happen before a
/// user record exists, so a bare email is enough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Actor(Actor),
    Email(String),
}

impl Subject {
    pub fn email(&self) -> &str {
        match self {
            Subject::Actor(actor) => &actor.email,
            Subject::Email(email) => email,
        }
    }
}

impl From<Actor> for Subject {
    fn from(actor: Actor) -> Self {
        Subject::Actor(actor)
    }
}

impl From<&Actor> for Subject {
    fn from(actor: &Actor) -> Self {
        Subject::Actor(actor.clone())
    }
}

impl From<&str> for Subject {
    fn from(email: &str) -> Self {
        Subject::Email(email.to_string())
    }
}

impl From<String> for Subject {
    fn from(email: String) -> Self {
        Subject::Email(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn unactivated_actor_has_no_timestamp() {
        let actor = Actor::new("42", "mgray@example.com", "Mike Gray");
        assert!(!actor.is_activated());
        assert_eq!(actor.registered_at_iso8601(), None);
    }

    #[test]
    fn registration_timestamp_is_second_precision_utc() {
        let at = Utc.with_ymd_and_hms(2012, 12, 2, 0, 30, 8).unwrap();
        let actor = Actor::new("42", "mgray@example.com", "Mike Gray").activated_at(at);
        assert_eq!(
            actor.registered_at_iso8601().as_deref(),
            Some("2012-12-02T00:30:08Z")
        );
    }

    #[test]
    fn subject_email_from_either_form() {
        let actor = Actor::new("1", "a@example.com", "A");
        assert_eq!(Subject::from(&actor).email(), "a@example.com");
        assert_eq!(Subject::from("b@example.com").email(), "b@example.com");
    }
}
