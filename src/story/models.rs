//! Core story domain types.

use time::Date;

use crate::{Error, database_id::DatabaseId, listing::Filterable, member::MemberId};

/// Where a story is in the approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryStatus {
    /// Submitted and waiting for an officer's review.
    Pending,
    /// Approved for the public landing page.
    Approved,
    /// Rejected by an officer.
    Rejected,
}

impl StoryStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            StoryStatus::Pending => "pending",
            StoryStatus::Approved => "approved",
            StoryStatus::Rejected => "rejected",
        }
    }

    pub(crate) fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(StoryStatus::Pending),
            "approved" => Some(StoryStatus::Approved),
            "rejected" => Some(StoryStatus::Rejected),
            _ => None,
        }
    }
}

/// A story a member has submitted for the public landing page.
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    /// The story's ID in the application database.
    pub id: DatabaseId,
    /// The member who submitted the story.
    pub member_id: MemberId,
    /// The story's headline.
    pub title: String,
    /// The story text.
    pub body: String,
    /// Where the story is in the approval workflow.
    pub status: StoryStatus,
    /// The local date the story was submitted.
    pub submitted_at: Date,
}

/// A pending story joined with its author's name, for the review queue.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingStory {
    /// The story's ID in the application database.
    pub id: DatabaseId,
    /// The story's headline.
    pub title: String,
    /// The story text.
    pub body: String,
    /// The submitting member's display name.
    pub author_name: String,
    /// The local date the story was submitted.
    pub submitted_at: Date,
}

impl Filterable for PendingStory {
    fn matches_search(&self, term: &str) -> bool {
        self.title.to_lowercase().contains(term)
            || self.body.to_lowercase().contains(term)
            || self.author_name.to_lowercase().contains(term)
    }

    fn date(&self) -> Option<Date> {
        Some(self.submitted_at)
    }
}

/// The validated fields for a story that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStory {
    pub(crate) member_id: MemberId,
    pub(crate) title: String,
    pub(crate) body: String,
    pub(crate) submitted_at: Date,
}

impl NewStory {
    /// Validate the fields for a new story.
    ///
    /// # Errors
    /// Returns an [Error::EmptyField] if the title or body is blank.
    pub fn build(
        member_id: MemberId,
        title: &str,
        body: &str,
        submitted_at: Date,
    ) -> Result<Self, Error> {
        let title = title.trim();
        let body = body.trim();

        if title.is_empty() {
            return Err(Error::EmptyField("Title"));
        }

        if body.is_empty() {
            return Err(Error::EmptyField("Story"));
        }

        Ok(Self {
            member_id,
            title: title.to_owned(),
            body: body.to_owned(),
            submitted_at,
        })
    }
}

#[cfg(test)]
mod new_story_tests {
    use time::macros::date;

    use crate::{Error, member::MemberId};

    use super::{NewStory, StoryStatus};

    #[test]
    fn build_trims_fields() {
        let story = NewStory::build(
            MemberId::new(1),
            "  Region Win  ",
            "  We placed first.  ",
            date!(2024 - 06 - 01),
        )
        .unwrap();

        assert_eq!(story.title, "Region Win");
        assert_eq!(story.body, "We placed first.");
    }

    #[test]
    fn build_rejects_blank_title() {
        let result = NewStory::build(MemberId::new(1), " ", "Body", date!(2024 - 06 - 01));

        assert_eq!(result, Err(Error::EmptyField("Title")));
    }

    #[test]
    fn build_rejects_blank_body() {
        let result = NewStory::build(MemberId::new(1), "Title", "  ", date!(2024 - 06 - 01));

        assert_eq!(result, Err(Error::EmptyField("Story")));
    }

    #[test]
    fn status_round_trips_through_string() {
        for status in [
            StoryStatus::Pending,
            StoryStatus::Approved,
            StoryStatus::Rejected,
        ] {
            assert_eq!(StoryStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn from_str_rejects_unknown_status() {
        assert_eq!(StoryStatus::from_str("draft"), None);
    }
}
