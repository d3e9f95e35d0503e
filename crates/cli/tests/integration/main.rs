mod common;
mod forge_tests;
mod housekeeping_tests;
mod index_tests;
