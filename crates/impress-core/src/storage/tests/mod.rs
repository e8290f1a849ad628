pub mod store_tests;
pub mod table_tests;
