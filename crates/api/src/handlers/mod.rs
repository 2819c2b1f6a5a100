pub mod lessons;
pub mod locker;
