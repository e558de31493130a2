//! Domain repositories
//!
//! Each repository wraps the record store with validation, id assignment,
//! and its search/filter predicates. Every operation reloads the whole
//! collection, mutates it in memory, and rewrites the file.

mod contacts;
mod conversations;
mod events;
mod notes;
mod todos;

pub use contacts::ContactsRepo;
pub use conversations::ConversationsRepo;
pub use events::EventsRepo;
pub use notes::NotesRepo;
pub use todos::{CompleteOutcome, TodosRepo};
