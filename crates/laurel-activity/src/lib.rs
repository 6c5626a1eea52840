pub mod records;
pub mod source;

pub use records::{
    ActivityRecord, Assignment, DriveDirection, DriveRecord, PostRecord, WorkItemRecord,
};
pub use source::{ActivitySource, MemoryActivityLog, MemoryDirectory, UserDirectory, UserProfile};
