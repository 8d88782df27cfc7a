//! Member stories and the officer approval workflow.

mod db;
mod mine;
mod models;
mod review;
mod submit;

pub use mine::{MyStoriesState, get_my_stories_page};
pub use models::{NewStory, PendingStory, Story, StoryStatus};
pub use review::{
    ReviewStoriesState, approve_story_endpoint, get_review_stories_page, reject_story_endpoint,
};
pub use submit::{StoryForm, SubmitStoryState, get_new_story_page, submit_story_endpoint};

pub(crate) use db::{create_story, create_story_table, get_approved_stories, set_story_status};
