//! Browser-side half of the complaint desk: the session cache every page
//! consults on load, the offline mock login, the HTTP client for the real
//! server, and the record lists the pages keep in local storage.

mod local_store;
mod session;
mod mock;
mod api;
mod records;
mod notify;

pub use local_store::{keys, read_json, read_json_list, write_json, FileLocalStore, LocalStore, LocalStoreError, MemoryLocalStore};
pub use session::{Page, Route, SessionCache};
pub use mock::{MockAuthClient, MOCK_DELAY, MOCK_TOKEN};
pub use api::{ApiClient, ApiError, LoggedIn, TokenIdentity};
pub use records::{
    ActivityLog, Complaint, ComplaintStatus, DashboardStats, Feedback, MonthTally, NewComplaint, RecordError, Records,
    UserProfile, RECENT_LIMIT, TREND_MONTHS,
};
pub use notify::{resolution_notice, Notification, NotificationKind};
