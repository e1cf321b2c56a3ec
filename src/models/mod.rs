pub mod activity;
pub mod file;
pub mod project;
pub mod scan;
pub mod task;

pub use activity::{ActivityLogEntry, ActivityReport, ActivitySummary};
pub use file::FileRecord;
pub use project::{NewProject, NewRoot, Project, ProjectDetail, ProjectFilter, ProjectRoot};
pub use scan::{RootScanSummary, ScanAllSummary, ScanError, ScanSummary};
pub use task::{
    NewCategory, NewTask, Task, TaskCategory, TaskComment, TaskDetail, TaskFilter, TaskPriority,
    TaskStatus, TaskUpdate,
};
