mod common;

mod checklist;
mod properties;
