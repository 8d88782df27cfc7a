//! The domain types for organization events.

use time::Date;

use crate::{Error, database_id::DatabaseId, listing::Filterable};

/// A scheduled organization event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// The event's row ID.
    pub id: DatabaseId,
    /// The event's display name.
    pub name: String,
    /// Where the event takes place.
    pub location: String,
    /// Free-text details about the event.
    pub description: String,
    /// The day the event takes place.
    pub date: Date,
}

impl Filterable for Event {
    fn matches_search(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(term)
            || self.location.to_lowercase().contains(term)
            || self.description.to_lowercase().contains(term)
    }

    fn date(&self) -> Option<Date> {
        Some(self.date)
    }
}

/// A validated event that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub(crate) name: String,
    pub(crate) location: String,
    pub(crate) description: String,
    pub(crate) date: Date,
}

impl NewEvent {
    /// Validate the fields for a new event.
    ///
    /// Unlike ledger entries, events may be dated in the future since most of
    /// them are.
    ///
    /// # Errors
    /// Returns [Error::EmptyField] if the name or location is blank.
    pub fn build(name: &str, location: &str, description: &str, date: Date) -> Result<Self, Error> {
        let name = name.trim();
        let location = location.trim();

        if name.is_empty() {
            return Err(Error::EmptyField("Name"));
        }
        if location.is_empty() {
            return Err(Error::EmptyField("Location"));
        }

        Ok(Self {
            name: name.to_owned(),
            location: location.to_owned(),
            description: description.trim().to_owned(),
            date,
        })
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{Error, listing::Filterable};

    use super::{Event, NewEvent};

    #[test]
    fn build_trims_and_accepts_future_dates() {
        let event = NewEvent::build(
            "  Spring Fest  ",
            "Quad",
            "Annual showcase",
            date!(2099 - 06 - 01),
        )
        .unwrap();

        assert_eq!(event.name, "Spring Fest");
        assert_eq!(event.date, date!(2099 - 06 - 01));
    }

    #[test]
    fn build_rejects_blank_name() {
        let result = NewEvent::build("  ", "Quad", "", date!(2024 - 06 - 01));

        assert_eq!(result, Err(Error::EmptyField("Name")));
    }

    #[test]
    fn build_rejects_blank_location() {
        let result = NewEvent::build("Spring Fest", "", "", date!(2024 - 06 - 01));

        assert_eq!(result, Err(Error::EmptyField("Location")));
    }

    #[test]
    fn search_covers_name_location_and_description() {
        let event = Event {
            id: 1,
            name: "Spring Fest".to_owned(),
            location: "Main Quad".to_owned(),
            description: "Annual showcase with food stalls".to_owned(),
            date: date!(2024 - 06 - 01),
        };

        assert!(event.matches_search("spring"));
        assert!(event.matches_search("quad"));
        assert!(event.matches_search("stalls"));
        assert!(!event.matches_search("winter"));
    }
}
