pub mod ids;
pub mod logging;

pub use ids::new_record_id;
pub use logging::EventLog;

pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
