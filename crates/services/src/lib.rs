pub mod capture;
pub mod dispatch;
pub mod history;
pub mod storage;
