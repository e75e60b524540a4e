mod lobby_tests;
mod persistence_tests;
mod seat_tests;
mod sweep_tests;
mod timer_tests;
