//! Reusable test harnesses


pub use session::SessionStoreTestSuite;
