//! Database operations for stories.

use rusqlite::{Connection, Row, types::Type};

use crate::{
    Error,
    database_id::DatabaseId,
    member::MemberId,
    story::models::{NewStory, PendingStory, Story, StoryStatus},
};

/// Create the story table.
pub fn create_story_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE story (
            id INTEGER PRIMARY KEY,
            member_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            status TEXT NOT NULL,
            submitted_at TEXT NOT NULL
        );

        CREATE INDEX idx_story_status ON story(status);",
    )?;

    Ok(())
}

/// Insert a validated story into the database. New stories start pending.
pub fn create_story(story: NewStory, connection: &Connection) -> Result<Story, Error> {
    let story = connection
        .prepare(
            "INSERT INTO story (member_id, title, body, status, submitted_at)
            VALUES (?1, ?2, ?3, 'pending', ?4)
            RETURNING id, member_id, title, body, status, submitted_at",
        )?
        .query_row(
            (
                story.member_id.as_i64(),
                &story.title,
                &story.body,
                story.submitted_at,
            ),
            map_story_row,
        )?;

    Ok(story)
}

/// Retrieve one member's stories, most recently submitted first.
pub fn get_stories_by_member(
    member_id: MemberId,
    connection: &Connection,
) -> Result<Vec<Story>, Error> {
    connection
        .prepare(
            "SELECT id, member_id, title, body, status, submitted_at
            FROM story WHERE member_id = :member_id
            ORDER BY submitted_at DESC, id DESC",
        )?
        .query_map(&[(":member_id", &member_id.as_i64())], map_story_row)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Retrieve the pending stories with their authors' names, oldest first so
/// the queue is reviewed in submission order.
///
/// Stories whose author has been removed are omitted by the join.
pub fn get_pending_stories(connection: &Connection) -> Result<Vec<PendingStory>, Error> {
    connection
        .prepare(
            "SELECT story.id, story.title, story.body, member.full_name, story.submitted_at
            FROM story
            INNER JOIN member ON member.id = story.member_id
            WHERE story.status = 'pending'
            ORDER BY story.submitted_at ASC, story.id ASC",
        )?
        .query_map([], |row| {
            Ok(PendingStory {
                id: row.get(0)?,
                title: row.get(1)?,
                body: row.get(2)?,
                author_name: row.get(3)?,
                submitted_at: row.get(4)?,
            })
        })?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Retrieve up to `limit` approved stories, most recently submitted first.
pub fn get_approved_stories(limit: u32, connection: &Connection) -> Result<Vec<Story>, Error> {
    connection
        .prepare(
            "SELECT id, member_id, title, body, status, submitted_at
            FROM story WHERE status = 'approved'
            ORDER BY submitted_at DESC, id DESC
            LIMIT :limit",
        )?
        .query_map(&[(":limit", &limit)], map_story_row)?
        .map(|row| row.map_err(Error::from))
        .collect()
}

/// Set the status of the story with `story_id`.
///
/// The review workflow is a direct status update: approving or rejecting a
/// story only rewrites this column.
///
/// # Errors
/// Returns:
/// - [Error::UpdateMissingStory] if `story_id` does not refer to a story,
/// - [Error::SqlError] if there is some other SQL error.
pub fn set_story_status(
    story_id: DatabaseId,
    status: StoryStatus,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_updated = connection.execute(
        "UPDATE story SET status = ?1 WHERE id = ?2",
        (status.as_str(), story_id),
    )?;

    if rows_updated == 0 {
        return Err(Error::UpdateMissingStory);
    }

    Ok(())
}

fn map_story_row(row: &Row) -> Result<Story, rusqlite::Error> {
    let status: String = row.get(4)?;
    let status = StoryStatus::from_str(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Text,
            format!("unknown story status {status:?}").into(),
        )
    })?;

    Ok(Story {
        id: row.get(0)?,
        member_id: MemberId::new(row.get(1)?),
        title: row.get(2)?,
        body: row.get(3)?,
        status,
        submitted_at: row.get(5)?,
    })
}

#[cfg(test)]
mod story_query_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        member::{MemberId, PasswordHash, Role, create_member, create_member_table},
        story::models::{NewStory, StoryStatus},
    };

    use super::{
        create_story, create_story_table, get_approved_stories, get_pending_stories,
        get_stories_by_member, set_story_status,
    };

    fn get_test_connection() -> (Connection, MemberId) {
        let connection = Connection::open_in_memory().unwrap();
        create_member_table(&connection).unwrap();
        create_story_table(&connection).unwrap();

        let member = create_member(
            "anna@test.org",
            PasswordHash::new_unchecked("hunter2"),
            "Anna",
            "Brass",
            Role::Member,
            &connection,
        )
        .unwrap();

        (connection, member.id)
    }

    fn submit(
        member_id: MemberId,
        title: &str,
        date: time::Date,
        connection: &Connection,
    ) -> i64 {
        create_story(
            NewStory::build(member_id, title, "body", date).unwrap(),
            connection,
        )
        .unwrap()
        .id
    }

    #[test]
    fn new_stories_start_pending() {
        let (connection, member_id) = get_test_connection();

        let story = create_story(
            NewStory::build(member_id, "Region Win", "We placed first.", date!(2024 - 06 - 01))
                .unwrap(),
            &connection,
        )
        .unwrap();

        assert_eq!(story.status, StoryStatus::Pending);
        assert_eq!(story.member_id, member_id);
    }

    #[test]
    fn stories_by_member_are_most_recent_first() {
        let (connection, member_id) = get_test_connection();
        submit(member_id, "Old", date!(2024 - 01 - 01), &connection);
        submit(member_id, "New", date!(2024 - 06 - 01), &connection);

        let stories = get_stories_by_member(member_id, &connection).unwrap();

        let titles: Vec<&str> = stories.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Old"]);
    }

    #[test]
    fn pending_queue_is_oldest_first_with_author_names() {
        let (connection, member_id) = get_test_connection();
        submit(member_id, "Second", date!(2024 - 06 - 01), &connection);
        submit(member_id, "First", date!(2024 - 01 - 01), &connection);

        let pending = get_pending_stories(&connection).unwrap();

        let titles: Vec<&str> = pending.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert_eq!(pending[0].author_name, "Anna");
    }

    #[test]
    fn reviewed_stories_leave_the_pending_queue() {
        let (connection, member_id) = get_test_connection();
        let approved = submit(member_id, "Approved", date!(2024 - 06 - 01), &connection);
        let rejected = submit(member_id, "Rejected", date!(2024 - 06 - 02), &connection);
        submit(member_id, "Pending", date!(2024 - 06 - 03), &connection);

        set_story_status(approved, StoryStatus::Approved, &connection).unwrap();
        set_story_status(rejected, StoryStatus::Rejected, &connection).unwrap();

        let pending = get_pending_stories(&connection).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "Pending");
    }

    #[test]
    fn approved_stories_are_limited_and_most_recent_first() {
        let (connection, member_id) = get_test_connection();
        for (title, date) in [
            ("Oldest", date!(2024 - 01 - 01)),
            ("Middle", date!(2024 - 02 - 01)),
            ("Newest", date!(2024 - 03 - 01)),
        ] {
            let id = submit(member_id, title, date, &connection);
            set_story_status(id, StoryStatus::Approved, &connection).unwrap();
        }

        let stories = get_approved_stories(2, &connection).unwrap();

        let titles: Vec<&str> = stories.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Newest", "Middle"]);
    }

    #[test]
    fn set_status_on_missing_story_fails() {
        let (connection, _) = get_test_connection();

        let result = set_story_status(42, StoryStatus::Approved, &connection);

        assert!(matches!(result, Err(Error::UpdateMissingStory)));
    }
}
