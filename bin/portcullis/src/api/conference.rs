//! Conference listing guarded at operation and field level.
use std::fmt::Display;
use std::fmt::Formatter;

use once_cell::sync::Lazy;

use portcullis_auth::access::AccessDenied;
use portcullis_auth::access::AuthorizeFields;
use portcullis_auth::access::FieldGuard;
use portcullis_auth::access::OperationGuard;
use portcullis_auth::access::Requirement;
use portcullis_context::Context;

/// Only geoguessers get to know where conferences take place.
static VENUE_GUARD: Lazy<FieldGuard<Option<String>>> =
    Lazy::new(|| FieldGuard::or_default("conference.venue", Requirement::capability("geoguesser")));

/// A conference and, for some callers, where it happened.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Conference {
    pub name: String,
    pub venue: Option<String>,
}

impl Conference {
    fn new(name: &str, venue: &str) -> Conference {
        Conference {
            name: name.into(),
            venue: Some(venue.into()),
        }
    }
}

impl AuthorizeFields for Conference {
    fn authorize_fields(mut self, context: &Context) -> Self {
        self.venue = VENUE_GUARD.apply(context, self.venue);
        self
    }
}

impl Display for Conference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.venue {
            None => write!(f, "{}", self.name),
            Some(venue) => write!(f, "{} ({})", self.name, venue),
        }
    }
}

/// Lists conferences for admins whose name contains an `a`.
pub struct ConferenceService {
    conferences: Vec<Conference>,
    guard: OperationGuard<Vec<Conference>>,
}

impl ConferenceService {
    /// Conferences visible to the [`Context`]'s caller.
    pub fn conferences(&self, context: &Context) -> Result<Vec<Conference>, AccessDenied> {
        let conferences = self.guard.invoke(context, || self.conferences.clone())?;
        Ok(conferences.authorize_fields(context))
    }
}

impl Default for ConferenceService {
    fn default() -> Self {
        let requirement = Requirement::capability("admin").and(Requirement::principal(
            "name-contains-a",
            |principal| principal.name().contains('a'),
        ));
        ConferenceService {
            conferences: vec![
                Conference::new("VoxxedDays Zürich", "Sihlcity Arena Cinema"),
                Conference::new("VoxxedDays Luxembourg", "Casino 2000"),
                Conference::new("RivieraDev", "SKEMA Business School"),
                Conference::new("SpringOne", "The Venitian"),
                Conference::new("Swiss Cloud Native Day", "Mt Gurten"),
                Conference::new("Devoxx Belgium", "Kinepolis"),
                Conference::new("J-Fall", "Pathé Ede"),
            ],
            guard: OperationGuard::new("conferences.list", requirement),
        }
    }
}
