//! The page showing the signed-in member's own submitted stories.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_ROW_STYLE, base,
    },
    member::Member,
    navigation::NavBar,
    story::{
        db::get_stories_by_member,
        models::{Story, StoryStatus},
    },
};

/// The state needed for a member's own stories page.
#[derive(Debug, Clone)]
pub struct MyStoriesState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for MyStoriesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn status_cell(status: StoryStatus) -> Markup {
    html!(
        @match status {
            StoryStatus::Approved => { span class=(BADGE_STYLE) { "Approved" } }
            StoryStatus::Pending => { "Pending" }
            StoryStatus::Rejected => {
                span class="text-red-600 dark:text-red-500" { "Rejected" }
            }
        }
    )
}

fn my_stories_view(stories: &[Story], viewer: &Member) -> Markup {
    let nav_bar = NavBar::new(endpoints::MY_STORIES_VIEW, viewer.role).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 lg:max-w-5xl lg:w-full lg:mx-auto"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "My Stories" }

                    a href=(endpoints::NEW_STORY_VIEW) class=(LINK_STYLE) { "Submit Story" }
                }

                section class="dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Title" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Submitted" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                            }
                        }

                        tbody
                        {
                            @for story in stories {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (story.title) }
                                    td class=(TABLE_CELL_STYLE) { (story.submitted_at) }
                                    td class=(TABLE_CELL_STYLE) { (status_cell(story.status)) }
                                }
                            }

                            @if stories.is_empty() {
                                tr
                                {
                                    td
                                        colspan="3"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "You have not submitted any stories yet."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("My Stories", &[], &content)
}

/// Render the signed-in member's stories, most recently submitted first.
pub async fn get_my_stories_page(
    State(state): State<MyStoriesState>,
    viewer: Extension<Member>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let stories = get_stories_by_member(viewer.id, &connection).inspect_err(|error| {
        tracing::error!("Failed to retrieve stories for member {}: {error}", viewer.id)
    })?;
    drop(connection);

    Ok(my_stories_view(&stories, &viewer.0).into_response())
}

#[cfg(test)]
mod my_stories_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        member::{Member, PasswordHash, Role, create_member, create_member_table},
        story::{
            db::{create_story, create_story_table, set_story_status},
            models::{NewStory, StoryStatus},
        },
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::{MyStoriesState, get_my_stories_page};

    fn get_test_state() -> (MyStoriesState, Member) {
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

        let approved = create_story(
            NewStory::build(member.id, "Region Win", "We placed first.", date!(2024 - 06 - 01))
                .unwrap(),
            &connection,
        )
        .unwrap();
        set_story_status(approved.id, StoryStatus::Approved, &connection).unwrap();

        create_story(
            NewStory::build(member.id, "Bake Sale", "We raised $400.", date!(2024 - 07 - 01))
                .unwrap(),
            &connection,
        )
        .unwrap();

        let state = MyStoriesState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        (state, member)
    }

    #[tokio::test]
    async fn my_stories_lists_own_stories_with_status() {
        let (state, member) = get_test_state();

        let response = get_my_stories_page(State(state), Extension(member))
            .await
            .expect("Could not render my stories page");
        let document = parse_html_document(response).await;

        assert_valid_html(&document);
        let text = document.root_element().text().collect::<String>();
        assert!(text.contains("Region Win"), "got {text:?}");
        assert!(text.contains("Approved"), "got {text:?}");
        assert!(text.contains("Bake Sale"), "got {text:?}");
        assert!(text.contains("Pending"), "got {text:?}");
    }

    #[tokio::test]
    async fn no_stories_shows_empty_state() {
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
        let state = MyStoriesState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_my_stories_page(State(state), Extension(member))
            .await
            .expect("Could not render my stories page");
        let document = parse_html_document(response).await;

        let text = document.root_element().text().collect::<String>();
        assert!(
            text.contains("You have not submitted any stories yet."),
            "got {text:?}"
        );
    }
}
