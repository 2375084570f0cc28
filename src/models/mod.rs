pub mod bin;
pub mod collection;
pub mod complaint;
pub mod impact;
pub mod payout;
pub mod roster;
pub mod session;
