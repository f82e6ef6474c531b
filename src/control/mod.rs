//! Control module: speed profiles handed to the trajectory tracker
pub mod stop_profile;

pub use self::stop_profile::StopProfileGenerator;
