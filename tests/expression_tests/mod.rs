mod functions_test;
mod language_test;
mod property_test;
