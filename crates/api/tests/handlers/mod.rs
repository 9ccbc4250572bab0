mod events_test;
mod middleware_test;
