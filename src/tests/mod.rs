pub mod utils;

mod dispatch_tests;
