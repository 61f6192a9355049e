pub mod planning_handlers;
pub mod trip_handlers;
