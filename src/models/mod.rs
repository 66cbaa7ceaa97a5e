mod checklist;
mod checklist_item;
pub mod timestamp;
mod user;

pub use checklist::{Checklist, ChecklistFields, ChecklistPatch, ChecklistWithItems};
pub use checklist_item::{BulkItemsRequest, BulkItemsResponse, ChecklistItem, ItemFields, ItemSpec};
pub use user::{LoginRequest, NewUser, SessionResponse, SignupRequest, User, UserProfile};
