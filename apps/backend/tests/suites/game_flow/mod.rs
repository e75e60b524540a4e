mod blow_tests;
mod game_over_tests;
mod play_tests;
