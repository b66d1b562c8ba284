mod common;

mod scheduling;
