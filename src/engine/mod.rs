pub mod alerts;
pub mod complaints;
pub mod impact;
pub mod ledger;
pub mod revenue;
pub mod roster;
pub mod simulation;
