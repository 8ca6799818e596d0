mod health_tests;
mod pipeline_tests;
