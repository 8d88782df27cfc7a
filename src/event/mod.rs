//! Organization events: scheduling, listing, and editing.

mod create;
mod db;
mod delete;
mod edit;
mod list;
mod models;

pub use create::{CreateEventState, EventForm, create_event_endpoint, get_new_event_page};
pub use db::{
    create_event, create_event_table, delete_event, get_all_events, get_event_by_id,
    get_event_names, get_upcoming_events, update_event,
};
pub use delete::{DeleteEventState, delete_event_endpoint};
pub use edit::{EditEventState, get_edit_event_page, update_event_endpoint};
pub use list::{EventsPageState, get_events_page};
pub use models::{Event, NewEvent};
