//! Dialog/form state of a CRUD admin page.

mod state_machine;

pub use state_machine::{PageAction, PageEvent, PageMode, PageState, PageStateMachine};
