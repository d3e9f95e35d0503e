mod detect_tests;
mod forge_tests;
mod registry_tests;
